//! Fertility cycle tracking backend: registration with OTP verification,
//! cycle prediction, and localized fertility insights.

use std::sync::Arc;

use axum::{http::HeaderValue, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod ai;
pub mod auth;
pub mod config;
pub mod error;
pub mod insights;
pub mod models;
pub mod notify;
pub mod prediction;
pub mod routes;
pub mod store;
pub mod translations;

pub use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn store::Store>,
    pub config: Arc<Config>,
    pub otp_sender: Arc<dyn notify::OtpSender>,
    /// `None` when no generative text provider is configured.
    pub generator: Option<Arc<dyn ai::TextGenerator>>,
}

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors.allowed_origins);

    Router::new()
        .merge(routes::auth::routes())
        .merge(routes::users::routes())
        .merge(routes::cycle::routes())
        .merge(routes::insights::routes())
        .merge(routes::chat::routes())
        .route("/health", get(|| async { "✅ Backend up" }))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin {:?}", o);
                None
            }
        })
        .collect();

    layer.allow_origin(origins)
}
