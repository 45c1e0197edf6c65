//! Configuration types for the Daraja client

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Environment variable holding the gateway environment (`sandbox` or `production`)
pub const ENV_MPESA_ENV: &str = "MPESA_ENV";
/// Environment variable holding the app consumer key
pub const ENV_CONSUMER_KEY: &str = "MPESA_CONSUMER_KEY";
/// Environment variable holding the app consumer secret
pub const ENV_CONSUMER_SECRET: &str = "MPESA_CONSUMER_SECRET";
/// Environment variable holding the merchant shortcode
pub const ENV_SHORTCODE: &str = "MPESA_SHORTCODE";
/// Environment variable holding the STK passkey
pub const ENV_PASSKEY: &str = "MPESA_PASSKEY";
/// Environment variable holding the initiator name
pub const ENV_INITIATOR_NAME: &str = "MPESA_INITIATOR_NAME";
/// Environment variable holding the initiator password
pub const ENV_INITIATOR_PASSWORD: &str = "MPESA_INITIATOR_PASSWORD";
/// Environment variable holding the gateway certificate directory
pub const ENV_CERTIFICATE_DIR: &str = "MPESA_CERTIFICATE_DIR";

/// Gateway environment selecting the API host and certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Safaricom sandbox
    Sandbox,
    /// Live gateway
    Production,
}

impl Environment {
    /// Base URL of the gateway for this environment
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Sandbox => "https://sandbox.safaricom.co.ke",
            Environment::Production => "https://api.safaricom.co.ke",
        }
    }

    /// File name of the gateway's public certificate for this environment
    pub fn certificate_file(&self) -> &'static str {
        match self {
            Environment::Sandbox => "sandbox.cer",
            Environment::Production => "production.cer",
        }
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_uppercase().as_str() {
            "SANDBOX" => Ok(Environment::Sandbox),
            "PRODUCTION" => Ok(Environment::Production),
            other => Err(Error::Config(format!("unknown environment: {}", other))),
        }
    }
}

/// Callback, result and timeout URLs, one slot per operation family
///
/// Every field is optional at load time; an operation that needs a URL which
/// is not configured fails with [`Error::Config`] before any network call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallbackUrls {
    /// STK push result callback
    pub stk_callback: Option<String>,
    /// C2B validation endpoint
    pub stk_validation: Option<String>,
    /// C2B confirmation endpoint
    pub stk_confirmation: Option<String>,
    /// Account balance result
    pub balance_result: Option<String>,
    /// Account balance queue timeout
    pub balance_timeout: Option<String>,
    /// Transaction status result
    pub transaction_status_result: Option<String>,
    /// Transaction status queue timeout
    pub transaction_status_timeout: Option<String>,
    /// B2C result
    pub b2c_result: Option<String>,
    /// B2C queue timeout
    pub b2c_timeout: Option<String>,
    /// B2B result
    pub b2b_result: Option<String>,
    /// B2B queue timeout
    pub b2b_timeout: Option<String>,
    /// Reversal result
    pub reversal_result: Option<String>,
    /// Reversal queue timeout
    pub reversal_timeout: Option<String>,
    /// Tax remittance result
    pub tax_remittance_result: Option<String>,
    /// Tax remittance queue timeout
    pub tax_remittance_timeout: Option<String>,
    /// Bill manager opt-in callback
    pub bill_optin_callback: Option<String>,
}

impl CallbackUrls {
    /// Load callback URLs from `MPESA_*_URL` environment variables
    pub fn from_env() -> Self {
        Self {
            stk_callback: optional_env("MPESA_STK_CALLBACK_URL"),
            stk_validation: optional_env("MPESA_STK_VALIDATION_URL"),
            stk_confirmation: optional_env("MPESA_STK_CONFIRMATION_URL"),
            balance_result: optional_env("MPESA_BALANCE_RESULT_URL"),
            balance_timeout: optional_env("MPESA_BALANCE_TIMEOUT_URL"),
            transaction_status_result: optional_env("MPESA_TRANSACTION_STATUS_RESULT_URL"),
            transaction_status_timeout: optional_env("MPESA_TRANSACTION_STATUS_TIMEOUT_URL"),
            b2c_result: optional_env("MPESA_B2C_RESULT_URL"),
            b2c_timeout: optional_env("MPESA_B2C_TIMEOUT_URL"),
            b2b_result: optional_env("MPESA_B2B_RESULT_URL"),
            b2b_timeout: optional_env("MPESA_B2B_TIMEOUT_URL"),
            reversal_result: optional_env("MPESA_REVERSAL_RESULT_URL"),
            reversal_timeout: optional_env("MPESA_REVERSAL_TIMEOUT_URL"),
            tax_remittance_result: optional_env("MPESA_TAX_REMITTANCE_RESULT_URL"),
            tax_remittance_timeout: optional_env("MPESA_TAX_REMITTANCE_TIMEOUT_URL"),
            bill_optin_callback: optional_env("MPESA_BILL_OPTIN_CALLBACK_URL"),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MpesaConfig {
    /// Gateway environment (sandbox or production)
    pub environment: Environment,
    /// App consumer key for token issuance
    pub consumer_key: String,
    /// App consumer secret for token issuance
    pub consumer_secret: String,
    /// Merchant shortcode
    pub shortcode: String,
    /// Initiator name for privileged operations
    #[serde(default)]
    pub initiator_name: String,
    /// Initiator password, encrypted into the security credential
    #[serde(default)]
    pub initiator_password: String,
    /// STK push passkey
    #[serde(default)]
    pub stk_passkey: String,
    /// Directory holding `sandbox.cer` / `production.cer`
    #[serde(default = "default_certificate_dir")]
    pub certificate_dir: PathBuf,
    /// Per-operation callback URLs
    #[serde(default)]
    pub urls: CallbackUrls,
}

impl MpesaConfig {
    /// Load configuration from `MPESA_*` environment variables
    ///
    /// The consumer key/secret and shortcode are required; everything else is
    /// optional and checked when the operation that needs it is invoked.
    pub fn from_env() -> Result<Self, Error> {
        let environment = match env::var(ENV_MPESA_ENV) {
            Ok(value) => value.parse()?,
            Err(_) => Environment::Sandbox,
        };

        Ok(Self {
            environment,
            consumer_key: require_env(ENV_CONSUMER_KEY)?,
            consumer_secret: require_env(ENV_CONSUMER_SECRET)?,
            shortcode: require_env(ENV_SHORTCODE)?,
            initiator_name: env::var(ENV_INITIATOR_NAME).unwrap_or_default(),
            initiator_password: env::var(ENV_INITIATOR_PASSWORD).unwrap_or_default(),
            stk_passkey: env::var(ENV_PASSKEY).unwrap_or_default(),
            certificate_dir: env::var(ENV_CERTIFICATE_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_certificate_dir()),
            urls: CallbackUrls::from_env(),
        })
    }
}

fn default_certificate_dir() -> PathBuf {
    PathBuf::from("certificates")
}

fn require_env(name: &str) -> Result<String, Error> {
    env::var(name).map_err(|_| Error::Config(format!("{} is not set", name)))
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_base_url() {
        assert_eq!(
            Environment::Sandbox.base_url(),
            "https://sandbox.safaricom.co.ke"
        );
        assert_eq!(
            Environment::Production.base_url(),
            "https://api.safaricom.co.ke"
        );
    }

    #[test]
    fn test_environment_from_str() {
        assert_eq!(
            "sandbox".parse::<Environment>().unwrap(),
            Environment::Sandbox
        );
        assert_eq!(
            "PRODUCTION".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_certificate_file() {
        assert_eq!(Environment::Sandbox.certificate_file(), "sandbox.cer");
        assert_eq!(Environment::Production.certificate_file(), "production.cer");
    }
}
