use anyhow::Result;
use async_trait::async_trait;

use super::{
    PostValidator, RedirectBinding, RequestContext, SamlProtocol, Validation,
};
use crate::{form::SamlForm, profile::Profile};

/// SamlClient answers redirect-binding operations itself and leaves posted
/// message verification to a [`PostValidator`].
#[derive(Debug)]
pub struct SamlClient<V> {
    binding: RedirectBinding,
    validator: V,
}

impl<V> SamlClient<V> {
    pub fn new(binding: RedirectBinding, validator: V) -> Self {
        Self { binding, validator }
    }

    pub fn binding(&self) -> &RedirectBinding {
        &self.binding
    }
}

#[async_trait]
impl<V> SamlProtocol for SamlClient<V>
where
    V: PostValidator,
{
    async fn validate_post_response(
        &self,
        form: &SamlForm,
    ) -> Result<Validation> {
        self.validator.validate_post_response(form).await
    }

    async fn validate_post_request(
        &self,
        form: &SamlForm,
    ) -> Result<Validation> {
        self.validator.validate_post_request(form).await
    }

    async fn authorize_url(&self, ctx: &RequestContext) -> Result<String> {
        self.binding.authorize_url(ctx)
    }

    async fn logout_url(&self, ctx: &RequestContext) -> Result<String> {
        self.binding.logout_url(ctx)
    }

    async fn logout_response_url(
        &self,
        ctx: &RequestContext,
        logout_request: &Profile,
    ) -> Result<String> {
        self.binding.logout_response_url(ctx, logout_request)
    }
}
