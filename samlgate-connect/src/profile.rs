use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single SAML attribute. Most attributes carry one value, but SAML
/// allows several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Single(String),
    Multiple(Vec<String>),
}

impl AttributeValue {
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Single(v) => Some(v.as_str()),
            Self::Multiple(values) => values.first().map(|v| v.as_str()),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        Self::Single(v.to_owned())
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(v: Vec<String>) -> Self {
        Self::Multiple(v)
    }
}

/// Profile represents the attributes asserted by the IdP in a validated
/// SAML message.
///
/// A profile is produced by the protocol library inside one validation call,
/// lent to the verifier and dropped afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// ID of the validated message, answered with `InResponseTo` when the
    /// message was a LogoutRequest.
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(rename = "nameID")]
    pub name_id: String,
    #[serde(
        rename = "nameIDFormat",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub name_id_format: Option<String>,
    #[serde(
        rename = "sessionIndex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub session_index: Option<String>,
    #[serde(flatten)]
    pub attributes: HashMap<String, AttributeValue>,
}

impl Profile {
    pub fn new<S: Into<String>>(name_id: S) -> Self {
        Self {
            name_id: name_id.into(),
            ..Default::default()
        }
    }

    /// Get the first value of an attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(|v| v.first())
    }

    pub fn subject(&self) -> Subject {
        Subject {
            name_id: self.name_id.clone(),
            name_id_format: self.name_id_format.clone(),
            session_index: self.session_index.clone(),
        }
    }
}

/// Subject identifies the currently logged in user to the IdP when the
/// service provider initiates a logout.
///
/// It deserializes from any principal carrying `nameID` and, optionally,
/// `nameIDFormat` and `sessionIndex`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    #[serde(rename = "nameID")]
    pub name_id: String,
    #[serde(rename = "nameIDFormat", default)]
    pub name_id_format: Option<String>,
    #[serde(rename = "sessionIndex", default)]
    pub session_index: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn attributes_flatten_into_profile() {
        let mut profile = Profile::new("a@b.com");
        profile.session_index = Some("_idx1".to_owned());
        profile.attributes.insert("email".to_owned(), "a@b.com".into());
        profile.attributes.insert(
            "groups".to_owned(),
            vec!["admin".to_owned(), "users".to_owned()].into(),
        );

        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["nameID"], "a@b.com");
        assert_eq!(value["sessionIndex"], "_idx1");
        assert_eq!(value["groups"], json!(["admin", "users"]));
        assert!(value.get("ID").is_none());

        let back: Profile = serde_json::from_value(value).unwrap();
        assert_eq!(back, profile);
        assert_eq!(back.attribute("groups"), Some("admin"));
        assert_eq!(back.attribute("missing"), None);
    }

    #[test]
    fn subject_from_arbitrary_principal() {
        let principal = json!({
            "nameID": "a@b.com",
            "sessionIndex": "_idx1",
            "displayName": "A",
            "roles": ["admin"],
        });
        let subject: Subject = serde_json::from_value(principal).unwrap();
        assert_eq!(subject.name_id, "a@b.com");
        assert_eq!(subject.session_index.as_deref(), Some("_idx1"));
        assert_eq!(subject.name_id_format, None);

        assert!(serde_json::from_value::<Subject>(json!({"id": 7})).is_err());
    }
}
