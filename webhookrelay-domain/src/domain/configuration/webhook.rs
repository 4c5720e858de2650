use crate::{InternalError, RelayError};
use envconfig::Envconfig;
use serde::{Deserialize, Deserializer, Serialize};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};
use strum::{AsRefStr, EnumString};

#[derive(
    Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize, EnumString, AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum RequestMethod {
    #[default]
    Post,
    Get,
}

impl Display for RequestMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

/// The webhook settings one dispatch runs against.
///
/// Deserializes from the persisted settings record
/// `{enabled, request_method, webhook_url, custom_body}`; absent or null
/// fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default, deserialize_with = "null_as_default")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub webhook_url: String,
    #[serde(
        rename = "request_method",
        default,
        deserialize_with = "method_or_default"
    )]
    pub method: RequestMethod,
    #[serde(
        rename = "custom_body",
        default,
        deserialize_with = "null_as_default"
    )]
    pub custom_body_template: String,
}

impl WebhookConfig {
    pub fn new(webhook_url: impl Into<String>, method: RequestMethod) -> Self {
        Self {
            enabled: true,
            webhook_url: webhook_url.into(),
            method,
            custom_body_template: String::new(),
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.custom_body_template = template.into();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// A dispatch only fires when the relay is enabled and has somewhere to send.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.webhook_url.is_empty()
    }

    pub fn template(&self) -> Option<&str> {
        if self.custom_body_template.is_empty() {
            None
        } else {
            Some(&self.custom_body_template)
        }
    }

    pub fn from_json(settings: &str) -> Result<Self, RelayError> {
        serde_json::from_str(settings).map_err(|e| {
            InternalError::configuration_error(
                &format!("Invalid webhook settings: {e}"),
                Some("settings"),
            )
        })
    }
}

impl Display for WebhookConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "WEBHOOK_ENABLED: {}", self.enabled)?;
        writeln!(f, "WEBHOOK_URL: {}", redact_url(&self.webhook_url))?;
        writeln!(f, "WEBHOOK_REQUEST_METHOD: {}", self.method)?;
        writeln!(
            f,
            "WEBHOOK_CUSTOM_BODY: {}",
            if self.custom_body_template.is_empty() {
                "<none>"
            } else {
                "****"
            }
        )
    }
}

/// Hides userinfo and query strings, which is where webhook URLs carry secrets.
fn redact_url(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(mut parsed) => {
            if !parsed.username().is_empty() || parsed.password().is_some() {
                let _ = parsed.set_username("****");
                let _ = parsed.set_password(None);
            }
            if parsed.query().is_some() {
                parsed.set_query(Some("****"));
            }
            parsed.to_string()
        }
        Err(_) if url.is_empty() => String::new(),
        Err(_) => "****".to_string(),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn method_or_default<'de, D>(deserializer: D) -> Result<RequestMethod, D::Error>
where
    D: Deserializer<'de>,
{
    let method = Option::<String>::deserialize(deserializer)?;
    match method.as_deref().map(str::trim) {
        None | Some("") => Ok(RequestMethod::default()),
        Some(method) => RequestMethod::from_str(method).map_err(serde::de::Error::custom),
    }
}

/// Webhook settings sourced from the environment.
///
/// When `WEBHOOK_SETTINGS_PATH` is set the settings file takes over and the
/// remaining variables are ignored.
#[derive(Envconfig, Clone)] // Intentionally no Debug so the URL is not printed
pub struct WebhookSettingsConfig {
    #[envconfig(from = "WEBHOOK_ENABLED", default = "false")]
    pub enabled: bool,
    #[envconfig(from = "WEBHOOK_URL", default = "")]
    pub webhook_url: String,
    #[envconfig(from = "WEBHOOK_REQUEST_METHOD", default = "POST")]
    pub method: RequestMethod,
    #[envconfig(from = "WEBHOOK_CUSTOM_BODY", default = "")]
    pub custom_body: String,
    #[envconfig(from = "WEBHOOK_SETTINGS_PATH")]
    pub settings_path: Option<String>,
}

impl From<&WebhookSettingsConfig> for WebhookConfig {
    fn from(settings: &WebhookSettingsConfig) -> Self {
        WebhookConfig {
            enabled: settings.enabled,
            webhook_url: settings.webhook_url.clone(),
            method: settings.method,
            custom_body_template: settings.custom_body.clone(),
        }
    }
}

impl Display for WebhookSettingsConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.settings_path {
            Some(path) => writeln!(f, "WEBHOOK_SETTINGS_PATH: {path}"),
            None => write!(f, "{}", WebhookConfig::from(self)),
        }
    }
}
