pub mod form;
pub mod options;
pub mod profile;
pub mod saml;

pub use form::SamlForm;
pub use options::IdpOptions;
pub use profile::{AttributeValue, Profile, Subject};
pub use saml::{
    MockPostValidator, MockSamlProtocol, PostValidator, RedirectBinding,
    RequestContext, SamlClient, SamlProtocol, Validation,
};
