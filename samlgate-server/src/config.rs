use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use samlgate_auth::{Fallback, OperationConfig};
use samlgate_connect::IdpOptions;

#[derive(Parser, Debug, Clone, Deserialize, Validate)]
#[command(name = "samlgate")]
#[command(author, version, about, long_about = None)]
pub struct PluginConfig {
    /// Initiates a login (or logout) with the IdP.
    #[clap(long, env = "SAML_PATH")]
    #[arg(default_value_t = default_path())]
    #[serde(default = "default_path")]
    #[validate(custom(function = "absolute_path"))]
    pub path: String,
    /// Receives the IdP's posted messages. Defaults to `path`.
    #[clap(long, env = "SAML_PATH_CALLBACK")]
    #[serde(default)]
    #[validate(custom(function = "absolute_path"))]
    pub path_callback: Option<String>,
    #[clap(long, env = "SAML_PATH_LOGOUT")]
    #[arg(default_value_t = default_path_logout())]
    #[serde(default = "default_path_logout")]
    #[validate(custom(function = "absolute_path"))]
    pub path_logout: String,
    #[clap(long, env = "SAML_REDIRECT_TO")]
    #[arg(default_value_t = default_redirect_to())]
    #[serde(default = "default_redirect_to")]
    pub redirect_to: String,
    #[clap(long, env = "SAML_FALLBACK")]
    #[arg(default_value = "login-request")]
    #[serde(default = "default_fallback")]
    pub saml_fallback: Option<Fallback>,
    #[clap(long, env = "SAML_SESSION_COOKIE")]
    #[arg(default_value_t = default_session_cookie())]
    #[serde(default = "default_session_cookie")]
    #[validate(length(min = 1))]
    pub session_cookie: String,
    /// Session lifetime in seconds.
    #[clap(long, env = "SAML_SESSION_TTL")]
    #[arg(default_value_t = 3600)]
    #[serde(default = "default_session_ttl")]
    #[validate(range(min = 1))]
    pub session_ttl: i64,
    #[clap(long, env = "SAML_CACHE_SIZE")]
    #[arg(default_value_t = 512)]
    #[serde(default = "default_cache_size")]
    #[validate(range(min = 1))]
    pub cache_size: usize,
    #[clap(long, env = "SAML_COOKIE_SECURE")]
    #[arg(default_value_t = false)]
    #[serde(default)]
    pub cookie_secure: bool,
    #[clap(skip)]
    #[serde(default)]
    pub idp: IdpOptions,
}

impl PluginConfig {
    pub fn callback_path(&self) -> &str {
        self.path_callback.as_deref().unwrap_or(&self.path)
    }

    pub fn operation_config(&self) -> OperationConfig {
        OperationConfig::new(self.saml_fallback, self.redirect_to.clone())
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            path_callback: None,
            path_logout: default_path_logout(),
            redirect_to: default_redirect_to(),
            saml_fallback: default_fallback(),
            session_cookie: default_session_cookie(),
            session_ttl: default_session_ttl(),
            cache_size: default_cache_size(),
            cookie_secure: false,
            idp: IdpOptions::default(),
        }
    }
}

fn default_path() -> String {
    String::from("/saml")
}

fn default_path_logout() -> String {
    String::from("/logout")
}

fn default_redirect_to() -> String {
    String::from("/")
}

fn default_fallback() -> Option<Fallback> {
    Some(Fallback::LoginRequest)
}

fn default_session_cookie() -> String {
    String::from("saml_session")
}

fn default_session_ttl() -> i64 {
    3600
}

fn default_cache_size() -> usize {
    512
}

fn absolute_path(path: &str) -> Result<(), ValidationError> {
    if path.starts_with('/') {
        Ok(())
    } else {
        Err(ValidationError::new("path must start with `/`"))
    }
}

pub fn load(cfg: &str) -> Result<PluginConfig> {
    let content =
        fs::read_to_string(cfg).context("could not read config file")?;
    let config: PluginConfig =
        toml::from_str(&content).context("could not parse config file")?;
    config.validate().context("invalid config file")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PluginConfig::default();
        assert_eq!(config.callback_path(), "/saml");
        assert_eq!(config.path_logout, "/logout");
        assert_eq!(
            config.operation_config(),
            OperationConfig::new(Some(Fallback::LoginRequest), "/")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_args() {
        let config = PluginConfig::try_parse_from([
            "samlgate",
            "--path",
            "/sso",
            "--path-callback",
            "/sso/acs",
            "--saml-fallback",
            "logout-request",
        ])
        .unwrap();
        assert_eq!(config.path, "/sso");
        assert_eq!(config.callback_path(), "/sso/acs");
        assert_eq!(config.saml_fallback, Some(Fallback::LogoutRequest));
        assert_eq!(config.session_ttl, 3600);

        assert!(PluginConfig::try_parse_from([
            "samlgate",
            "--saml-fallback",
            "getAuthorizeUrl",
        ])
        .is_err());
    }

    #[test]
    fn load_toml() {
        let path = std::env::temp_dir()
            .join(format!("samlgate-{}.toml", uuid::Uuid::new_v4()));
        fs::write(
            &path,
            r#"
path = "/auth/saml"
redirect_to = "/home"
saml_fallback = "logout-request"
session_ttl = 60

[idp]
entry_point = "https://idp.example.com/sso"
issuer = "https://sp.example.com"
"#,
        )
        .unwrap();

        let config = load(path.to_str().unwrap()).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(config.path, "/auth/saml");
        assert_eq!(config.callback_path(), "/auth/saml");
        assert_eq!(config.path_logout, "/logout");
        assert_eq!(config.saml_fallback, Some(Fallback::LogoutRequest));
        assert_eq!(config.session_ttl, 60);
        assert_eq!(config.cache_size, 512);
        assert_eq!(config.idp.entry_point, "https://idp.example.com/sso");
    }

    #[test]
    fn relative_paths_are_invalid() {
        let config = PluginConfig {
            path_callback: Some("callback".to_owned()),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PluginConfig {
            session_ttl: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
