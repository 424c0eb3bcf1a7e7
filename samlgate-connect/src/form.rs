use serde::{Deserialize, Serialize};

/// SamlForm is the body the IdP posts back to the callback path
/// (HTTP POST binding).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SamlForm {
    #[serde(rename = "SAMLResponse", skip_serializing_if = "Option::is_none")]
    pub saml_response: Option<String>,
    #[serde(rename = "SAMLRequest", skip_serializing_if = "Option::is_none")]
    pub saml_request: Option<String>,
    #[serde(rename = "RelayState", skip_serializing_if = "Option::is_none")]
    pub relay_state: Option<String>,
}

impl SamlForm {
    pub fn response<S: Into<String>>(payload: S) -> Self {
        Self {
            saml_response: Some(payload.into()),
            ..Default::default()
        }
    }

    pub fn request<S: Into<String>>(payload: S) -> Self {
        Self {
            saml_request: Some(payload.into()),
            ..Default::default()
        }
    }

    /// An empty field counts as absent.
    pub fn saml_response(&self) -> Option<&str> {
        self.saml_response.as_deref().filter(|v| !v.is_empty())
    }

    pub fn saml_request(&self) -> Option<&str> {
        self.saml_request.as_deref().filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_urlencoded_body() {
        let form: SamlForm = serde_urlencoded::from_str(
            "SAMLResponse=PHNhbWw%2BPC9zYW1sPg%3D%3D&RelayState=%2Fhome",
        )
        .unwrap();
        assert_eq!(form.saml_response(), Some("PHNhbWw+PC9zYW1sPg=="));
        assert_eq!(form.saml_request(), None);
        assert_eq!(form.relay_state.as_deref(), Some("/home"));
    }

    #[test]
    fn empty_fields_are_absent() {
        let form: SamlForm =
            serde_urlencoded::from_str("SAMLResponse=&SAMLRequest=abc")
                .unwrap();
        assert_eq!(form.saml_response(), None);
        assert_eq!(form.saml_request(), Some("abc"));
    }
}
