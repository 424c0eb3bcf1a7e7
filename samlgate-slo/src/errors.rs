use std::{error::Error as StdError, fmt};

use backtrace::Backtrace;
use http::StatusCode;
use serde_json::Value;
use thiserror::Error;

pub trait ErrorCode: StdError + 'static {
    fn code(&self) -> (StatusCode, &'static str);
}

#[derive(Error, Debug)]
pub enum Code {
    #[error(transparent)]
    Any(#[from] anyhow::Error),
    #[error("Not found. {0}")]
    NotFound(String),
    /// The verifier rejected a structurally valid profile.
    #[error("The SAML profile was rejected")]
    Unauthorized(Option<Value>),
    #[error("Please recheck the request.see: {0}")]
    Validates(#[source] validator::ValidationErrors),
    #[error("Please recheck the request.see: {0}")]
    BadRequest(String),
    /// The SAML library could not process a message or build a URL.
    #[error("SAML protocol error. {0}")]
    Protocol(#[source] anyhow::Error),
    #[error("{0}")]
    Configuration(String),
    /// The verifier itself failed, as opposed to rejecting the profile.
    #[error("Profile verification failed. {0}")]
    Verifier(#[source] anyhow::Error),
}

impl ErrorCode for Code {
    fn code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Any(_) => (StatusCode::INTERNAL_SERVER_ERROR, "1010001"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "1010002"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "1010003"),
            Self::Validates(_) => (StatusCode::UNPROCESSABLE_ENTITY, "1010004"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "1010006"),
            Self::Protocol(_) => (StatusCode::INTERNAL_SERVER_ERROR, "1010007"),
            Self::Configuration(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "1010008")
            }
            Self::Verifier(_) => (StatusCode::INTERNAL_SERVER_ERROR, "1010009"),
        }
    }
}

pub struct WithBacktrace {
    source: Code,
    backtrace: Backtrace,
}

impl WithBacktrace {
    pub fn code(&self) -> &Code {
        &self.source
    }
}

impl fmt::Debug for WithBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WithBacktrace")
            .field("source", &self.source)
            .field("backtrace", &self.backtrace)
            .finish()
    }
}

impl fmt::Display for WithBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl StdError for WithBacktrace {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.source)
    }
}

impl From<Code> for WithBacktrace {
    fn from(code: Code) -> Self {
        WithBacktrace {
            source: code,
            backtrace: Backtrace::new(),
        }
    }
}

impl From<WithBacktrace> for Code {
    fn from(value: WithBacktrace) -> Self {
        value.source
    }
}

impl PartialEq for WithBacktrace {
    fn eq(&self, other: &Self) -> bool {
        let (_, src_code) = self.source.code();
        let (_, dst_code) = other.source.code();
        src_code == dst_code
    }
}

#[inline]
pub fn any<E: StdError>(err: E) -> WithBacktrace {
    WithBacktrace::from(Code::Any(anyhow::anyhow!("{}", err.to_string())))
}

#[inline]
pub fn anyhow(err: anyhow::Error) -> WithBacktrace {
    WithBacktrace::from(Code::Any(err))
}

#[inline]
pub fn not_found<S: ToString + ?Sized>(err: &S) -> WithBacktrace {
    WithBacktrace::from(Code::NotFound(err.to_string()))
}

#[inline]
pub fn bad_request<S: ToString + ?Sized>(err: &S) -> WithBacktrace {
    WithBacktrace::from(Code::BadRequest(err.to_string()))
}

#[inline]
pub fn unauthorized(info: Option<Value>) -> WithBacktrace {
    WithBacktrace::from(Code::Unauthorized(info))
}

#[inline]
pub fn protocol(err: anyhow::Error) -> WithBacktrace {
    WithBacktrace::from(Code::Protocol(err))
}

#[inline]
pub fn configuration<S: ToString + ?Sized>(err: &S) -> WithBacktrace {
    WithBacktrace::from(Code::Configuration(err.to_string()))
}

#[inline]
pub fn verifier(err: anyhow::Error) -> WithBacktrace {
    WithBacktrace::from(Code::Verifier(err))
}

#[cfg(feature = "axum-resp")]
mod axum {
    use axum::response::IntoResponse;
    use serde_json::json;

    use super::{Code, ErrorCode};

    impl IntoResponse for super::WithBacktrace {
        fn into_response(self) -> axum::response::Response {
            let (status_code, code) = self.source.code();

            let mut payload = json!({
                "code": code,
                "message": self.to_string(),
            });
            match &self.source {
                Code::Unauthorized(info) => {
                    // client-class, not a system error
                    tracing::warn!(code, "{}", self);
                    if let Some(info) = info {
                        payload["info"] = info.clone();
                    }
                }
                _ if status_code.is_server_error() => {
                    tracing::error!("{:?}", self);
                }
                _ => tracing::info!(code, "{}", self),
            }

            (status_code, axum::Json(payload)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn error_kinds_map_to_status() {
        let (status, code) = protocol(anyhow::anyhow!("signature mismatch"))
            .code()
            .code();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "1010007");

        let (status, _) = unauthorized(None).code().code();
        assert!(status.is_client_error());

        let (status, _) =
            verifier(anyhow::anyhow!("directory offline")).code().code();
        assert!(status.is_server_error());
    }

    #[test]
    fn configuration_message_is_verbatim() {
        let err = configuration("no operation");
        assert_eq!(err.to_string(), "no operation");
        assert!(matches!(Code::from(err), Code::Configuration(_)));
    }

    #[test]
    fn protocol_keeps_cause() {
        let err = protocol(anyhow::anyhow!("signature mismatch"));
        assert!(err.to_string().contains("signature mismatch"));
        match Code::from(err) {
            Code::Protocol(cause) => {
                assert_eq!(cause.to_string(), "signature mismatch")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn equality_compares_kind_only() {
        assert_eq!(
            unauthorized(Some(json!("domain not allowed"))),
            unauthorized(None)
        );
        assert_ne!(
            protocol(anyhow::anyhow!("a")),
            verifier(anyhow::anyhow!("a"))
        );
    }

    #[cfg(feature = "axum-resp")]
    #[tokio::test]
    async fn unauthorized_response_carries_info() {
        use ::axum::response::IntoResponse;

        let resp = unauthorized(Some(json!({"reason": "domain"})))
            .into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body = ::axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["code"], "1010003");
        assert_eq!(body["info"]["reason"], "domain");
    }
}
