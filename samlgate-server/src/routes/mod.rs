use axum::{middleware, response::IntoResponse, Router};
use http::Uri;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    trace::{DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::Level;

use samlgate_auth::Verifier;
use samlgate_connect::SamlProtocol;
use samlgate_slo::errors;

use crate::{
    controllers::saml,
    middlewares::{self, MakeSpanWithTrace},
    AppState,
};

#[derive(Debug, Clone, Copy)]
pub struct AppRouter;

impl AppRouter {
    pub fn build<P, V>(state: AppState<P, V>) -> Router
    where
        P: SamlProtocol + 'static,
        V: Verifier + 'static,
        V::Principal: Serialize,
    {
        Router::new()
            .merge(saml::new_router(state))
            .layer(
                ServiceBuilder::new().layer(
                    TraceLayer::new_for_http()
                        .make_span_with(
                            MakeSpanWithTrace::new().level(Level::INFO),
                        )
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(LatencyUnit::Millis),
                        ),
                ),
            )
            .layer(middleware::from_fn(middlewares::trace))
            .fallback(Self::not_found)
    }

    async fn not_found(uri: Uri) -> impl IntoResponse {
        errors::not_found(&format!("no route for {}", uri))
    }
}
