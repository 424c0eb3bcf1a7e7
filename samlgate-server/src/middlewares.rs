use axum::{extract::Request, middleware::Next, response::Response};
use http::{HeaderName, HeaderValue};
use tower_http::trace::MakeSpan;
use tracing::{Level, Span};

use samlgate_slo::{errors, Result};

pub(crate) const TRACE_ID: HeaderName = HeaderName::from_static("x-trace-id");

/// Propagate the caller's `X-Trace-Id`, or mint one, onto both the request
/// and the response.
pub(crate) async fn trace(mut request: Request, next: Next) -> Result<Response> {
    let trace_id = match request.headers().get(TRACE_ID) {
        Some(v) => v.clone(),
        None => {
            let v = HeaderValue::from_str(
                &uuid::Uuid::new_v4().hyphenated().to_string(),
            )
            .map_err(errors::any)?;
            request.headers_mut().insert(TRACE_ID, v.clone());
            v
        }
    };
    let mut response = next.run(request).await;
    response.headers_mut().insert(TRACE_ID, trace_id);
    Ok(response)
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct MakeSpanWithTrace {
    level: Level,
}

impl MakeSpanWithTrace {
    pub(crate) fn new() -> Self {
        Self {
            level: Level::DEBUG,
        }
    }

    pub(crate) fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }
}

impl<B> MakeSpan<B> for MakeSpanWithTrace {
    fn make_span(&mut self, request: &http::Request<B>) -> Span {
        let trace_id = request
            .headers()
            .get(TRACE_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        macro_rules! make_span {
            ($level:expr) => {
                tracing::span!(
                    $level,
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    trace_id = %trace_id,
                )
            };
        }

        match self.level {
            Level::ERROR => make_span!(Level::ERROR),
            Level::WARN => make_span!(Level::WARN),
            Level::INFO => make_span!(Level::INFO),
            Level::DEBUG => make_span!(Level::DEBUG),
            _ => make_span!(Level::TRACE),
        }
    }
}
