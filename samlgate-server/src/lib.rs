//! An axum plugin serving SAML Web Browser SSO.
//!
//! [`AppRouter::build`] registers three routes: `GET {path}` starts a login
//! (or logout), `POST {path_callback}` receives what the IdP posts back and
//! `GET {path_logout}` drops the local session.

mod app;
pub mod config;
mod controllers;
mod middlewares;
mod routes;
pub mod session;
mod valid;

pub use app::{App, AppState};
pub use config::{load, PluginConfig};
pub use routes::AppRouter;
pub use session::{CookieConfig, SessionHandle, SessionStore};
