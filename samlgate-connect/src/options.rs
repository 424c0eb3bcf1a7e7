use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// IdpOptions configures the connection to the identity provider.
///
/// Apart from the redirect-binding endpoints these values are passed through
/// to the post validator untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdpOptions {
    /// IdP single sign-on URL.
    pub entry_point: String,
    /// IdP single logout URL, defaults to `entry_point`.
    pub logout_url: Option<String>,
    /// SP entity ID.
    pub issuer: String,
    /// Assertion Consumer Service URL the IdP posts back to.
    pub callback_url: Option<String>,
    /// NameID format to request.
    /// e.g. "urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress"
    pub identifier_format: Option<String>,
    /// IdP signing certificate (PEM).
    pub cert: Option<String>,
}

impl IdpOptions {
    pub fn validate(&self) -> Result<()> {
        if self.entry_point.is_empty() {
            return Err(anyhow!("IdP entry_point is required"));
        }
        if self.issuer.is_empty() {
            return Err(anyhow!("SP issuer is required"));
        }
        Ok(())
    }

    pub fn logout_url(&self) -> &str {
        self.logout_url.as_deref().unwrap_or(&self.entry_point)
    }
}
