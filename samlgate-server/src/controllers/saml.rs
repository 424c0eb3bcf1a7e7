use axum::{
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use http::{
    header::{LOCATION, SET_COOKIE},
    HeaderMap, HeaderValue, StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use samlgate_auth::{AuthExchange, Outcome, Session, Verifier};
use samlgate_connect::{SamlForm, SamlProtocol};
use samlgate_slo::{errors, Result};

use crate::{
    app::App, session::SessionHandle, valid::Valid, AppState, PluginConfig,
};

pub(crate) fn new_router<P, V>(state: AppState<P, V>) -> Router
where
    P: SamlProtocol + 'static,
    V: Verifier + 'static,
    V::Principal: Serialize,
{
    let path = state.config.path.clone();
    let callback = state.config.callback_path().to_owned();
    let logout = state.config.path_logout.clone();
    Router::new()
        .route(&path, get(login::<P, V>))
        .route(&callback, post(callback_handle::<P, V>))
        .route(&logout, get(logout_handle::<P, V>))
        .with_state(state)
}

/// "3.4.3 RelayState": the value MUST NOT exceed 80 bytes.
#[derive(Debug, Default, Deserialize, Validate)]
struct LoginQuery {
    #[serde(rename = "RelayState")]
    #[validate(length(max = 80))]
    relay_state: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
struct CallbackForm {
    #[serde(rename = "SAMLResponse")]
    saml_response: Option<String>,
    #[serde(rename = "SAMLRequest")]
    saml_request: Option<String>,
    #[serde(rename = "RelayState")]
    #[validate(length(max = 80))]
    relay_state: Option<String>,
}

impl From<CallbackForm> for SamlForm {
    fn from(form: CallbackForm) -> Self {
        Self {
            saml_response: form.saml_response,
            saml_request: form.saml_request,
            relay_state: form.relay_state,
        }
    }
}

/// Start a login, or a logout under the `logout-request` fallback.
async fn login<P, V>(
    app: AppState<P, V>,
    headers: HeaderMap,
    Valid(query): Valid<LoginQuery>,
) -> Result<Response>
where
    P: SamlProtocol,
    V: Verifier,
    V::Principal: Serialize,
{
    let mut session = app.sessions.open(&headers)?;
    let subject = session.subject();
    let mut exchange = AuthExchange::new(&mut session)
        .with_relay_state(query.relay_state)
        .with_subject(subject);
    let result = app.dispatcher.dispatch(&mut exchange).await;
    finish(&app, session, result)
}

/// Receive a message the IdP posted back.
async fn callback_handle<P, V>(
    app: AppState<P, V>,
    headers: HeaderMap,
    Valid(Form(form)): Valid<Form<CallbackForm>>,
) -> Result<Response>
where
    P: SamlProtocol,
    V: Verifier,
    V::Principal: Serialize,
{
    let mut session = app.sessions.open(&headers)?;
    let subject = session.subject();
    let mut exchange = AuthExchange::new(&mut session)
        .with_form(form.into())
        .with_subject(subject);
    let result = app.dispatcher.dispatch(&mut exchange).await;
    finish(&app, session, result)
}

/// Drop the local session without telling the IdP.
async fn logout_handle<P, V>(
    app: AppState<P, V>,
    headers: HeaderMap,
) -> Result<Response>
where
    P: SamlProtocol,
    V: Verifier,
    V::Principal: Serialize,
{
    let mut session = app.sessions.open(&headers)?;
    session.clear();
    info!("Local session cleared");
    finish(&app, session, Ok(Outcome::Redirect(String::from("/"))))
}

/// Render the dispatch result and attach the session cookie. The cookie is
/// written on failures too, so a cleared session is never left behind.
fn finish<P, V>(
    app: &App<P, V>,
    mut session: SessionHandle,
    result: Result<Outcome<V::Principal>>,
) -> Result<Response>
where
    V: Verifier,
    V::Principal: Serialize,
{
    let mut response = result
        .and_then(|outcome| respond(&app.config, &mut session, outcome))
        .unwrap_or_else(IntoResponse::into_response);
    if let Some(cookie) = app.sessions.commit(session)? {
        response.headers_mut().append(
            SET_COOKIE,
            HeaderValue::from_str(&cookie).map_err(errors::any)?,
        );
    }
    Ok(response)
}

fn respond<T: Serialize>(
    config: &PluginConfig,
    session: &mut SessionHandle,
    outcome: Outcome<T>,
) -> Result<Response> {
    match outcome {
        Outcome::Redirect(url) => found(&url),
        Outcome::Authenticated { principal, info } => {
            let principal =
                serde_json::to_value(principal).map_err(errors::any)?;
            session.login(principal, info);
            found(&config.redirect_to)
        }
        Outcome::LoggedOut => Ok(StatusCode::OK.into_response()),
    }
}

fn found(location: &str) -> Result<Response> {
    let location = HeaderValue::from_str(location).map_err(errors::any)?;
    Ok((StatusCode::FOUND, [(LOCATION, location)]).into_response())
}
