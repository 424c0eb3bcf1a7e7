use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

const LOGIN_REQUEST: &str = "login-request";
const LOGOUT_REQUEST: &str = "logout-request";

/// Fallback is the operation performed when an exchange carries no SAML
/// payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Fallback {
    /// Redirect to the IdP to start a login.
    LoginRequest,
    /// Redirect to the IdP to start a logout.
    LogoutRequest,
}

impl Fallback {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoginRequest => LOGIN_REQUEST,
            Self::LogoutRequest => LOGOUT_REQUEST,
        }
    }
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Fallback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            LOGIN_REQUEST => Ok(Self::LoginRequest),
            LOGOUT_REQUEST => Ok(Self::LogoutRequest),
            _ => Err(format!("unrecognized SAML fallback operation `{s}`")),
        }
    }
}

/// OperationConfig is resolved once at setup and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationConfig {
    /// `None` makes every payload-less exchange fail with a configuration
    /// error.
    pub fallback: Option<Fallback>,
    /// Where the success handler sends the browser after a login.
    pub redirect_to: String,
}

impl OperationConfig {
    pub fn new<S: Into<String>>(
        fallback: Option<Fallback>,
        redirect_to: S,
    ) -> Self {
        Self {
            fallback,
            redirect_to: redirect_to.into(),
        }
    }
}

impl Default for OperationConfig {
    fn default() -> Self {
        Self::new(Some(Fallback::LoginRequest), "/")
    }
}
