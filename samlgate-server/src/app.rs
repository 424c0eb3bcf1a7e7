use std::{fmt, ops::Deref, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::info;

use samlgate_auth::{Dispatcher, Verifier};
use samlgate_connect::{PostValidator, RedirectBinding, SamlClient, SamlProtocol};
use samlgate_slo::errors;

use crate::{session::SessionStore, PluginConfig};

#[derive(Debug)]
pub struct App<P, V> {
    pub config: PluginConfig,
    pub dispatcher: Dispatcher<P, V>,
    pub sessions: SessionStore,
}

impl<P, V> App<P, V>
where
    P: SamlProtocol,
    V: Verifier,
{
    pub fn new(config: PluginConfig, protocol: P, verifier: V) -> Result<Self> {
        info!("initializing SAML plugin...");
        let sessions = SessionStore::from_config(&config)
            .context("could not initialize the session store")?;
        let dispatcher =
            Dispatcher::new(protocol, verifier, config.operation_config());
        info!(
            path = %config.path,
            callback = %config.callback_path(),
            logout = %config.path_logout,
            "SAML plugin successfully initialized!"
        );
        Ok(Self {
            config,
            dispatcher,
            sessions,
        })
    }
}

impl<T, V> App<SamlClient<T>, V>
where
    T: PostValidator,
    V: Verifier,
{
    /// Build the plugin on the redirect binding configured in `[idp]`,
    /// leaving posted message verification to `validator`.
    pub fn with_validator(
        config: PluginConfig,
        validator: T,
        verifier: V,
    ) -> Result<Self> {
        let binding = RedirectBinding::new(config.idp.clone())
            .context("invalid IdP options")?;
        Self::new(config, SamlClient::new(binding, validator), verifier)
    }
}

pub struct AppState<P, V>(pub Arc<App<P, V>>);

impl<P, V> AppState<P, V> {
    pub fn new(app: App<P, V>) -> Self {
        Self(Arc::new(app))
    }
}

impl<P, V> Clone for AppState<P, V> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<P, V> fmt::Debug for AppState<P, V>
where
    App<P, V>: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AppState").field(&self.0).finish()
    }
}

// deref so you can still access the inner fields easily
impl<P, V> Deref for AppState<P, V> {
    type Target = App<P, V>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S, P, V> FromRequestParts<S> for AppState<P, V>
where
    Self: FromRef<S>,
    S: Send + Sync,
    P: SamlProtocol + 'static,
    V: Verifier + 'static,
{
    type Rejection = errors::WithBacktrace;
    async fn from_request_parts(
        _: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::from_ref(state))
    }
}
