use std::io::Write;

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use tracing::debug;

use super::RequestContext;
use crate::{options::IdpOptions, profile::Profile};

const NS_PROTOCOL: &str = "urn:oasis:names:tc:SAML:2.0:protocol";
const NS_ASSERTION: &str = "urn:oasis:names:tc:SAML:2.0:assertion";
const HTTP_POST_BINDING: &str =
    "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST";
const STATUS_SUCCESS: &str = "urn:oasis:names:tc:SAML:2.0:status:Success";

/// RedirectBinding builds the messages the service provider sends to the IdP
/// with the HTTP Redirect binding.
///
/// "3.4 HTTP Redirect Binding"
#[derive(Debug, Clone)]
pub struct RedirectBinding {
    options: IdpOptions,
}

impl RedirectBinding {
    pub fn new(options: IdpOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &IdpOptions {
        &self.options
    }

    /// Create an AuthnRequest and return the redirect URL to the IdP.
    pub fn authorize_url(&self, ctx: &RequestContext) -> Result<String> {
        let destination = &self.options.entry_point;
        let mut xml = format!(
            r#"<samlp:AuthnRequest xmlns:samlp="{}" xmlns:saml="{}" ID="{}" Version="2.0" IssueInstant="{}" Destination="{}" ProtocolBinding="{}""#,
            NS_PROTOCOL,
            NS_ASSERTION,
            request_id(),
            issue_instant(),
            escape(destination),
            HTTP_POST_BINDING,
        );
        if let Some(callback_url) = &self.options.callback_url {
            xml.push_str(&format!(
                r#" AssertionConsumerServiceURL="{}""#,
                escape(callback_url)
            ));
        }
        xml.push('>');
        xml.push_str(&self.issuer());
        if let Some(format) = &self.options.identifier_format {
            xml.push_str(&format!(
                r#"<samlp:NameIDPolicy Format="{}" AllowCreate="true"/>"#,
                escape(format)
            ));
        }
        xml.push_str("</samlp:AuthnRequest>");

        let url = redirect_url(
            destination,
            "SAMLRequest",
            &xml,
            ctx.relay_state.as_deref(),
        )?;
        debug!(url = %url, "Created SAML AuthnRequest redirect");
        Ok(url)
    }

    /// Create a LogoutRequest for the context's subject.
    pub fn logout_url(&self, ctx: &RequestContext) -> Result<String> {
        let subject = ctx
            .subject
            .as_ref()
            .ok_or_else(|| anyhow!("no logged in subject to log out"))?;
        let destination = self.options.logout_url();

        let mut xml = format!(
            r#"<samlp:LogoutRequest xmlns:samlp="{}" xmlns:saml="{}" ID="{}" Version="2.0" IssueInstant="{}" Destination="{}">"#,
            NS_PROTOCOL,
            NS_ASSERTION,
            request_id(),
            issue_instant(),
            escape(destination),
        );
        xml.push_str(&self.issuer());
        match &subject.name_id_format {
            Some(format) => xml.push_str(&format!(
                r#"<saml:NameID Format="{}">{}</saml:NameID>"#,
                escape(format),
                escape(&subject.name_id)
            )),
            None => xml.push_str(&format!(
                "<saml:NameID>{}</saml:NameID>",
                escape(&subject.name_id)
            )),
        }
        if let Some(session_index) = &subject.session_index {
            xml.push_str(&format!(
                "<samlp:SessionIndex>{}</samlp:SessionIndex>",
                escape(session_index)
            ));
        }
        xml.push_str("</samlp:LogoutRequest>");

        let url = redirect_url(
            destination,
            "SAMLRequest",
            &xml,
            ctx.relay_state.as_deref(),
        )?;
        debug!(name_id = %subject.name_id, "Created SAML LogoutRequest redirect");
        Ok(url)
    }

    /// Create a successful LogoutResponse answering `logout_request`.
    pub fn logout_response_url(
        &self,
        ctx: &RequestContext,
        logout_request: &Profile,
    ) -> Result<String> {
        let in_response_to = logout_request
            .id
            .as_deref()
            .ok_or_else(|| anyhow!("logout request carried no ID"))?;
        let destination = self.options.logout_url();

        let mut xml = format!(
            r#"<samlp:LogoutResponse xmlns:samlp="{}" xmlns:saml="{}" ID="{}" Version="2.0" IssueInstant="{}" Destination="{}" InResponseTo="{}">"#,
            NS_PROTOCOL,
            NS_ASSERTION,
            request_id(),
            issue_instant(),
            escape(destination),
            escape(in_response_to),
        );
        xml.push_str(&self.issuer());
        xml.push_str(&format!(
            r#"<samlp:Status><samlp:StatusCode Value="{}"/></samlp:Status>"#,
            STATUS_SUCCESS
        ));
        xml.push_str("</samlp:LogoutResponse>");

        let url = redirect_url(
            destination,
            "SAMLResponse",
            &xml,
            ctx.relay_state.as_deref(),
        )?;
        debug!(in_response_to, "Created SAML LogoutResponse redirect");
        Ok(url)
    }

    fn issuer(&self) -> String {
        format!("<saml:Issuer>{}</saml:Issuer>", escape(&self.options.issuer))
    }
}

fn request_id() -> String {
    format!("_{}", uuid::Uuid::new_v4().simple())
}

fn issue_instant() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn redirect_url(
    target: &str,
    key: &str,
    xml: &str,
    relay_state: Option<&str>,
) -> Result<String> {
    let encoded = deflate_and_encode(xml)?;
    let mut params = vec![(key, encoded.as_str())];
    if let Some(state) = relay_state {
        params.push(("RelayState", state));
    }
    let query = serde_urlencoded::to_string(&params)
        .context("could not encode redirect query")?;

    let mut url = target.to_owned();
    if target.contains('?') {
        url.push('&');
    } else {
        url.push('?');
    }
    url.push_str(&query);
    Ok(url)
}

/// Deflate and base64 encode for SAML redirect binding.
fn deflate_and_encode(xml: &str) -> Result<String> {
    let mut encoder = flate2::write::DeflateEncoder::new(
        Vec::new(),
        flate2::Compression::default(),
    );
    encoder.write_all(xml.as_bytes())?;
    let compressed = encoder.finish()?;
    Ok(BASE64.encode(compressed))
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, io::Read};

    use super::*;
    use crate::profile::Subject;

    fn test_options() -> IdpOptions {
        IdpOptions {
            entry_point: "https://idp.example.com/sso".to_owned(),
            logout_url: Some("https://idp.example.com/slo?tenant=1".to_owned()),
            issuer: "https://sp.example.com".to_owned(),
            callback_url: Some("https://sp.example.com/saml".to_owned()),
            identifier_format: Some(
                "urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress"
                    .to_owned(),
            ),
            ..Default::default()
        }
    }

    fn decode(url: &str, key: &str) -> (String, HashMap<String, String>) {
        let (_, query) = url.split_once('?').unwrap();
        let params: HashMap<String, String> =
            serde_urlencoded::from_str(query).unwrap();
        let compressed = BASE64.decode(&params[key]).unwrap();
        let mut xml = String::new();
        flate2::read::DeflateDecoder::new(compressed.as_slice())
            .read_to_string(&mut xml)
            .unwrap();
        (xml, params)
    }

    #[test]
    fn binding_requires_entry_point() {
        assert!(RedirectBinding::new(IdpOptions::default()).is_err());
        assert!(RedirectBinding::new(test_options()).is_ok());
    }

    #[test]
    fn authorize_url() {
        let binding = RedirectBinding::new(test_options()).unwrap();
        let url = binding
            .authorize_url(&RequestContext {
                relay_state: Some("/dashboard".to_owned()),
                subject: None,
            })
            .unwrap();
        assert!(url.starts_with("https://idp.example.com/sso?SAMLRequest="));

        let (xml, params) = decode(&url, "SAMLRequest");
        assert_eq!(params["RelayState"], "/dashboard");
        assert!(xml.starts_with("<samlp:AuthnRequest"));
        assert!(xml.contains(
            r#"AssertionConsumerServiceURL="https://sp.example.com/saml""#
        ));
        assert!(xml.contains(
            "<saml:Issuer>https://sp.example.com</saml:Issuer>"
        ));
        assert!(xml.contains("nameid-format:emailAddress"));
    }

    #[test]
    fn logout_url_requires_subject() {
        let binding = RedirectBinding::new(test_options()).unwrap();
        assert!(binding.logout_url(&RequestContext::default()).is_err());

        let url = binding
            .logout_url(&RequestContext {
                relay_state: None,
                subject: Some(Subject {
                    name_id: "a&b@example.com".to_owned(),
                    name_id_format: None,
                    session_index: Some("_idx1".to_owned()),
                }),
            })
            .unwrap();
        assert!(url.starts_with("https://idp.example.com/slo?tenant=1&"));

        let (xml, params) = decode(&url, "SAMLRequest");
        assert!(!params.contains_key("RelayState"));
        assert!(xml.contains("<saml:NameID>a&amp;b@example.com</saml:NameID>"));
        assert!(xml.contains("<samlp:SessionIndex>_idx1</samlp:SessionIndex>"));
    }

    #[test]
    fn logout_response_answers_request_id() {
        let binding = RedirectBinding::new(test_options()).unwrap();
        let mut request = Profile::new("a@b.com");
        assert!(binding
            .logout_response_url(&RequestContext::default(), &request)
            .is_err());

        request.id = Some("_req42".to_owned());
        let url = binding
            .logout_response_url(&RequestContext::default(), &request)
            .unwrap();
        let (xml, _) = decode(&url, "SAMLResponse");
        assert!(xml.contains(r#"InResponseTo="_req42""#));
        assert!(xml.contains(STATUS_SUCCESS));
    }
}
