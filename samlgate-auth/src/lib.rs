//! Authentication dispatch for SAML Web Browser SSO.
//!
//! A [`Dispatcher`] classifies one inbound [`AuthExchange`], calls the SAML
//! protocol library and a caller supplied [`Verifier`], and yields exactly
//! one [`Outcome`] or error per exchange.

pub mod dispatch;
pub mod exchange;
pub mod operation;
pub mod verify;

pub use dispatch::{Dispatcher, Outcome};
pub use exchange::{AuthExchange, Classified, Session};
pub use operation::{Fallback, OperationConfig};
pub use verify::{verify_fn, Identity, Verdict, Verifier, VerifyFn};
