use std::fmt;

use samlgate_connect::{RequestContext, SamlForm, Subject};

use crate::operation::Fallback;

/// Session is the caller's session abstraction. The dispatcher only ever
/// clears it, and only when the IdP signals a completed logout.
pub trait Session: Send {
    fn clear(&mut self);
}

/// Classified names the SAML operation an exchange is carrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classified<'a> {
    ResponseReceived(&'a SamlForm),
    RequestReceived(&'a SamlForm),
    LoginInit,
    LogoutInit,
    /// No payload and no fallback operation.
    Unconfigured,
}

/// AuthExchange is the unit of work handed to the dispatcher: an optional
/// posted form, what the protocol library may read from the request, and
/// the caller's session.
pub struct AuthExchange<'a, S: ?Sized> {
    form: Option<SamlForm>,
    context: RequestContext,
    session: &'a mut S,
}

impl<'a, S> AuthExchange<'a, S>
where
    S: Session + ?Sized,
{
    pub fn new(session: &'a mut S) -> Self {
        Self {
            form: None,
            context: RequestContext::default(),
            session,
        }
    }

    /// Attach the posted form. Its RelayState is kept unless one was set
    /// already.
    pub fn with_form(mut self, form: SamlForm) -> Self {
        if self.context.relay_state.is_none() {
            self.context.relay_state = form.relay_state.clone();
        }
        self.form = Some(form);
        self
    }

    pub fn with_relay_state(mut self, relay_state: Option<String>) -> Self {
        self.context.relay_state = relay_state;
        self
    }

    pub fn with_subject(mut self, subject: Option<Subject>) -> Self {
        self.context.subject = subject;
        self
    }

    pub fn form(&self) -> Option<&SamlForm> {
        self.form.as_ref()
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// Response payload wins over request payload, which wins over the
    /// fallback operation.
    pub fn classify(&self, fallback: Option<Fallback>) -> Classified<'_> {
        if let Some(form) = &self.form {
            if form.saml_response().is_some() {
                return Classified::ResponseReceived(form);
            }
            if form.saml_request().is_some() {
                return Classified::RequestReceived(form);
            }
        }
        match fallback {
            Some(Fallback::LoginRequest) => Classified::LoginInit,
            Some(Fallback::LogoutRequest) => Classified::LogoutInit,
            None => Classified::Unconfigured,
        }
    }

    pub(crate) fn clear_session(&mut self) {
        self.session.clear();
    }
}

impl<S: ?Sized> fmt::Debug for AuthExchange<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthExchange")
            .field("form", &self.form)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Cookie {
        cleared: bool,
    }

    impl Session for Cookie {
        fn clear(&mut self) {
            self.cleared = true;
        }
    }

    #[test]
    fn classify_priority() {
        let mut session = Cookie::default();
        let both = SamlForm {
            saml_response: Some("cmVzcG9uc2U=".to_owned()),
            saml_request: Some("cmVxdWVzdA==".to_owned()),
            relay_state: None,
        };
        let exchange = AuthExchange::new(&mut session).with_form(both);
        assert!(matches!(
            exchange.classify(None),
            Classified::ResponseReceived(_)
        ));

        let mut session = Cookie::default();
        let exchange = AuthExchange::new(&mut session)
            .with_form(SamlForm::request("cmVxdWVzdA=="));
        assert!(matches!(
            exchange.classify(Some(Fallback::LoginRequest)),
            Classified::RequestReceived(_)
        ));
    }

    #[test]
    fn classify_without_payload() {
        let mut session = Cookie::default();
        let exchange =
            AuthExchange::new(&mut session).with_form(SamlForm::default());
        assert_eq!(
            exchange.classify(Some(Fallback::LoginRequest)),
            Classified::LoginInit
        );
        assert_eq!(
            exchange.classify(Some(Fallback::LogoutRequest)),
            Classified::LogoutInit
        );
        assert_eq!(exchange.classify(None), Classified::Unconfigured);
    }

    #[test]
    fn relay_state_from_form() {
        let mut session = Cookie::default();
        let form = SamlForm {
            relay_state: Some("/reports".to_owned()),
            ..SamlForm::response("cmVzcG9uc2U=")
        };
        let exchange = AuthExchange::new(&mut session).with_form(form);
        assert_eq!(exchange.context().relay_state.as_deref(), Some("/reports"));

        let mut session = Cookie::default();
        let exchange = AuthExchange::new(&mut session)
            .with_relay_state(Some("/explicit".to_owned()))
            .with_form(SamlForm {
                relay_state: Some("/reports".to_owned()),
                ..Default::default()
            });
        assert_eq!(exchange.context().relay_state.as_deref(), Some("/explicit"));
    }

    #[test]
    fn clear_reaches_session() {
        let mut session = Cookie::default();
        let mut exchange = AuthExchange::new(&mut session);
        exchange.clear_session();
        drop(exchange);
        assert!(session.cleared);
    }
}
