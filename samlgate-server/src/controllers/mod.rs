pub(crate) mod saml;
