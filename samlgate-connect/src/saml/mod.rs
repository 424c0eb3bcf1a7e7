mod binding;
mod client;

use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::{
    form::SamlForm,
    profile::{Profile, Subject},
};

pub use binding::RedirectBinding;
pub use client::SamlClient;

/// RequestContext carries what the protocol library may read from the
/// inbound request besides the posted form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// RelayState to round-trip through the IdP.
    pub relay_state: Option<String>,
    /// The currently logged in user, needed to initiate a logout.
    pub subject: Option<Subject>,
}

/// Validation is the result of a successfully validated posted message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    pub profile: Option<Profile>,
    /// The message completes a logout rather than a login.
    pub logged_out: bool,
}

impl Validation {
    pub fn login(profile: Profile) -> Self {
        Self {
            profile: Some(profile),
            logged_out: false,
        }
    }

    pub fn logout(profile: Option<Profile>) -> Self {
        Self {
            profile,
            logged_out: true,
        }
    }
}

/// SamlProtocol is the SAML library as seen by the dispatcher. It is
/// shared by all in-flight exchanges, so implementations must not keep
/// per-request state.
///
/// See: <https://docs.oasis-open.org/security/saml/v2.0/saml-bindings-2.0-os.pdf>
#[automock]
#[async_trait]
pub trait SamlProtocol: Send + Sync {
    /// Decode and verify a posted SAMLResponse. A LogoutResponse yields
    /// `logged_out` with no profile.
    async fn validate_post_response(&self, form: &SamlForm)
        -> Result<Validation>;

    /// Decode and verify a posted SAMLRequest (an IdP initiated
    /// LogoutRequest). The returned profile describes the request so it can
    /// be answered.
    async fn validate_post_request(&self, form: &SamlForm)
        -> Result<Validation>;

    /// The IdP URL starting a login.
    async fn authorize_url(&self, ctx: &RequestContext) -> Result<String>;

    /// The IdP URL starting a logout for `ctx.subject`.
    async fn logout_url(&self, ctx: &RequestContext) -> Result<String>;

    /// The IdP URL answering `logout_request`.
    async fn logout_response_url(
        &self,
        ctx: &RequestContext,
        logout_request: &Profile,
    ) -> Result<String>;
}

/// PostValidator decodes, verifies signatures on, and maps attributes from
/// messages posted with the HTTP POST binding.
///
/// "3.5 HTTP POST Binding"
#[automock]
#[async_trait]
pub trait PostValidator: Send + Sync {
    async fn validate_post_response(&self, form: &SamlForm)
        -> Result<Validation>;

    async fn validate_post_request(&self, form: &SamlForm)
        -> Result<Validation>;
}
