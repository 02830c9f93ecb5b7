//! Transport connection options, validated per provider.
//!
//! Every provider has its own option schema; [`TransportOptions::validate`]
//! enforces it before a factory is allowed to build a transport, so invalid
//! credentials or connection settings fail as configuration errors rather
//! than provider errors. Secrets are held behind `secrecy` so they never
//! leak through `Debug` output.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::errors::{MailerError, MailerResult};
use crate::transport::Provider;

/// Default SMTP submission port.
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// SMTP credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpAuth {
    /// Login user.
    pub user: String,
    /// Login password.
    pub pass: SecretString,
}

/// Connection options for the SMTP transport.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpOptions {
    /// Server hostname.
    pub host: String,
    /// Server port.
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// Use implicit TLS.
    #[serde(default)]
    pub secure: bool,
    /// Optional credentials.
    #[serde(default)]
    pub auth: Option<SmtpAuth>,
}

fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

impl SmtpOptions {
    /// Creates options for a host with the default submission port.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SMTP_PORT,
            secure: false,
            auth: None,
        }
    }

    /// Sets the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enables implicit TLS.
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Sets login credentials.
    pub fn credentials(mut self, user: impl Into<String>, pass: impl Into<String>) -> Self {
        self.auth = Some(SmtpAuth {
            user: user.into(),
            pass: SecretString::new(pass.into()),
        });
        self
    }

    fn validate(&self) -> MailerResult<()> {
        if self.host.is_empty() {
            return Err(MailerError::configuration("smtp host must not be empty"));
        }
        if let Some(auth) = &self.auth {
            if auth.user.is_empty() || auth.pass.expose_secret().is_empty() {
                return Err(MailerError::configuration(
                    "smtp auth requires both user and pass",
                ));
            }
        }
        Ok(())
    }
}

/// Connection options for the Mandrill transport.
#[derive(Debug, Clone, Deserialize)]
pub struct MandrillOptions {
    /// API key.
    pub api_key: SecretString,
}

impl MandrillOptions {
    /// Creates options from an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
        }
    }

    fn validate(&self) -> MailerResult<()> {
        if self.api_key.expose_secret().is_empty() {
            return Err(MailerError::configuration(
                "mandrill api key must not be empty",
            ));
        }
        Ok(())
    }
}

/// Connection options for the Mailjet transport.
#[derive(Debug, Clone, Deserialize)]
pub struct MailjetOptions {
    /// Public API key.
    pub api_key_public: String,
    /// Private API key.
    pub api_key_private: SecretString,
}

impl MailjetOptions {
    /// Creates options from the public/private key pair.
    pub fn new(public: impl Into<String>, private: impl Into<String>) -> Self {
        Self {
            api_key_public: public.into(),
            api_key_private: SecretString::new(private.into()),
        }
    }

    fn validate(&self) -> MailerResult<()> {
        if self.api_key_public.is_empty() || self.api_key_private.expose_secret().is_empty() {
            return Err(MailerError::configuration(
                "mailjet requires both public and private api keys",
            ));
        }
        Ok(())
    }
}

/// Provider-keyed transport options.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportOptions {
    /// SMTP connection options.
    Smtp(SmtpOptions),
    /// Mandrill API options.
    Mandrill(MandrillOptions),
    /// Mailjet API options.
    Mailjet(MailjetOptions),
}

impl TransportOptions {
    /// Returns the provider these options target.
    pub fn provider(&self) -> Provider {
        match self {
            TransportOptions::Smtp(_) => Provider::Smtp,
            TransportOptions::Mandrill(_) => Provider::Mandrill,
            TransportOptions::Mailjet(_) => Provider::Mailjet,
        }
    }

    /// Validates the options against their provider schema.
    pub fn validate(&self) -> MailerResult<()> {
        match self {
            TransportOptions::Smtp(options) => options.validate(),
            TransportOptions::Mandrill(options) => options.validate(),
            TransportOptions::Mailjet(options) => options.validate(),
        }
    }

    /// Validates the options and confirms they target `provider`.
    pub fn validate_for(&self, provider: Provider) -> MailerResult<()> {
        if self.provider() != provider {
            return Err(MailerError::configuration(format!(
                "options target [{}] but the payload targets [{provider}]",
                self.provider()
            )));
        }
        self.validate()
    }
}
