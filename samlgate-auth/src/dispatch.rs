use anyhow::anyhow;
use samlgate_connect::{Profile, RequestContext, SamlProtocol, Validation};
use samlgate_slo::{errors, Result};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::{
    exchange::{AuthExchange, Classified, Session},
    operation::OperationConfig,
    verify::{Verdict, Verifier},
};

/// Outcome is the single terminal result of a successful dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<P> {
    /// Send the browser to this URL.
    Redirect(String),
    /// The verifier accepted the profile.
    Authenticated { principal: P, info: Option<Value> },
    /// The IdP confirmed a logout and there is nothing to answer.
    LoggedOut,
}

#[derive(Debug)]
pub struct Dispatcher<P, V> {
    protocol: P,
    verifier: V,
    config: OperationConfig,
}

impl<P, V> Dispatcher<P, V>
where
    P: SamlProtocol,
    V: Verifier,
{
    pub fn new(protocol: P, verifier: V, config: OperationConfig) -> Self {
        Self {
            protocol,
            verifier,
            config,
        }
    }

    pub fn config(&self) -> &OperationConfig {
        &self.config
    }

    pub fn protocol(&self) -> &P {
        &self.protocol
    }

    /// Dispatch one exchange. Every call ends in exactly one outcome or
    /// error; the session is only touched when the IdP signals a logout.
    pub async fn dispatch<S>(
        &self,
        exchange: &mut AuthExchange<'_, S>,
    ) -> Result<Outcome<V::Principal>>
    where
        S: Session + ?Sized,
    {
        let validation = match exchange.classify(self.config.fallback) {
            Classified::ResponseReceived(form) => {
                debug!("Validating posted SAMLResponse");
                self.protocol
                    .validate_post_response(form)
                    .await
                    .map_err(errors::protocol)?
            }
            Classified::RequestReceived(form) => {
                debug!("Validating posted SAMLRequest");
                self.protocol
                    .validate_post_request(form)
                    .await
                    .map_err(errors::protocol)?
            }
            Classified::LoginInit => {
                let url = self
                    .protocol
                    .authorize_url(exchange.context())
                    .await
                    .map_err(errors::protocol)?;
                return Ok(Outcome::Redirect(url));
            }
            Classified::LogoutInit => {
                let url = self
                    .protocol
                    .logout_url(exchange.context())
                    .await
                    .map_err(errors::protocol)?;
                return Ok(Outcome::Redirect(url));
            }
            Classified::Unconfigured => {
                error!("No SAML payload and no fallback operation");
                return Err(errors::configuration("no operation"));
            }
        };
        self.complete(exchange, validation).await
    }

    async fn complete<S>(
        &self,
        exchange: &mut AuthExchange<'_, S>,
        validation: Validation,
    ) -> Result<Outcome<V::Principal>>
    where
        S: Session + ?Sized,
    {
        if validation.logged_out {
            exchange.clear_session();
            let Some(logout_request) = validation.profile else {
                info!("SAML logout completed");
                return Ok(Outcome::LoggedOut);
            };
            debug!(name_id = %logout_request.name_id, "Answering SAML LogoutRequest");
            let url = self
                .protocol
                .logout_response_url(exchange.context(), &logout_request)
                .await
                .map_err(errors::protocol)?;
            return Ok(Outcome::Redirect(url));
        }

        let profile = validation.profile.ok_or_else(|| {
            errors::protocol(anyhow!("validated login carried no profile"))
        })?;
        self.verify(exchange.context(), &profile).await
    }

    async fn verify(
        &self,
        ctx: &RequestContext,
        profile: &Profile,
    ) -> Result<Outcome<V::Principal>> {
        match self.verifier.verify(ctx, profile).await {
            Ok(Verdict::Accept { principal, info }) => {
                info!(name_id = %profile.name_id, "SAML profile accepted");
                Ok(Outcome::Authenticated { principal, info })
            }
            Ok(Verdict::Reject { info }) => {
                warn!(name_id = %profile.name_id, "SAML profile rejected");
                Err(errors::unauthorized(info))
            }
            Ok(Verdict::Redirect(url)) => Ok(Outcome::Redirect(url)),
            Err(err) => Err(errors::verifier(err)),
        }
    }
}
