use std::{fmt, future::Future, marker::PhantomData};

use async_trait::async_trait;
use samlgate_connect::{Profile, RequestContext};
use serde_json::Value;

/// Verdict is the verifier's decision about a validated profile.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict<P> {
    /// The profile maps to `principal`.
    Accept { principal: P, info: Option<Value> },
    /// The profile is well formed but not allowed in.
    Reject { info: Option<Value> },
    /// Send the browser elsewhere instead of authenticating.
    Redirect(String),
}

impl<P> Verdict<P> {
    pub fn accept(principal: P) -> Self {
        Self::Accept {
            principal,
            info: None,
        }
    }

    pub fn reject<I: Into<Value>>(info: I) -> Self {
        Self::Reject {
            info: Some(info.into()),
        }
    }
}

/// Verifier maps a validated SAML profile to an application principal.
///
/// It is invoked at most once per exchange, and only for a profile the
/// protocol library validated as a login.
#[async_trait]
pub trait Verifier: Send + Sync {
    type Principal: Send + 'static;

    async fn verify(
        &self,
        ctx: &RequestContext,
        profile: &Profile,
    ) -> anyhow::Result<Verdict<Self::Principal>>;
}

/// Identity accepts every profile as its own principal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity;

#[async_trait]
impl Verifier for Identity {
    type Principal = Profile;

    async fn verify(
        &self,
        _ctx: &RequestContext,
        profile: &Profile,
    ) -> anyhow::Result<Verdict<Profile>> {
        Ok(Verdict::accept(profile.clone()))
    }
}

pub struct VerifyFn<F, P> {
    f: F,
    _principal: PhantomData<fn() -> P>,
}

impl<F, P> fmt::Debug for VerifyFn<F, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifyFn").finish_non_exhaustive()
    }
}

/// Build a [`Verifier`] from an async function of the profile.
///
/// ```
/// use samlgate_auth::{verify_fn, Verdict};
///
/// let verifier = verify_fn(|profile| async move {
///     if profile.attribute("role") == Some("admin") {
///         Ok(Verdict::accept(profile.name_id))
///     } else {
///         Ok(Verdict::reject("admins only"))
///     }
/// });
/// # let _ = verifier;
/// ```
pub fn verify_fn<F, Fut, P>(f: F) -> VerifyFn<F, P>
where
    F: Fn(Profile) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Verdict<P>>> + Send + 'static,
    P: Send + 'static,
{
    VerifyFn {
        f,
        _principal: PhantomData,
    }
}

#[async_trait]
impl<F, Fut, P> Verifier for VerifyFn<F, P>
where
    F: Fn(Profile) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Verdict<P>>> + Send + 'static,
    P: Send + 'static,
{
    type Principal = P;

    async fn verify(
        &self,
        _ctx: &RequestContext,
        profile: &Profile,
    ) -> anyhow::Result<Verdict<P>> {
        (self.f)(profile.clone()).await
    }
}
