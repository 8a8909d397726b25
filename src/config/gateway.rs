//! Payment gateway credentials and endpoint configuration.
//!
//! The gateway client is stateless; everything it needs lives here. Shop id
//! and secret key come from environment variables, the API base URL has a
//! production default that can be overridden for staging or test doubles.

use crate::errors::{Error, Result};

/// Default YooKassa API base URL
pub const DEFAULT_API_URL: &str = "https://api.yookassa.ru/v3";

/// Where the gateway redirects the payer after checkout. The bot has no web
/// frontend, so the default points back at Telegram.
pub const DEFAULT_RETURN_URL: &str = "https://t.me";

/// Credentials and endpoint for the payment gateway
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Shop identifier issued by the gateway
    pub shop_id: String,
    /// Secret API key issued by the gateway
    pub secret_key: String,
    /// API base URL, without a trailing slash
    pub api_url: String,
    /// Redirect target for the gateway's hosted confirmation page
    pub return_url: String,
}

impl GatewayConfig {
    /// Creates a config with the production API URL.
    #[must_use]
    pub fn new(shop_id: String, secret_key: String) -> Self {
        Self {
            shop_id,
            secret_key,
            api_url: DEFAULT_API_URL.to_string(),
            return_url: DEFAULT_RETURN_URL.to_string(),
        }
    }

    /// Loads credentials from `YOOKASSA_SHOP_ID` / `YOOKASSA_SECRET_KEY`,
    /// with an optional `YOOKASSA_API_URL` override.
    pub fn from_env() -> Result<Self> {
        let shop_id = std::env::var("YOOKASSA_SHOP_ID").map_err(|_| Error::Config {
            message: "YOOKASSA_SHOP_ID is not set".to_string(),
        })?;
        let secret_key = std::env::var("YOOKASSA_SECRET_KEY").map_err(|_| Error::Config {
            message: "YOOKASSA_SECRET_KEY is not set".to_string(),
        })?;
        let api_url =
            std::env::var("YOOKASSA_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let return_url =
            std::env::var("YOOKASSA_RETURN_URL").unwrap_or_else(|_| DEFAULT_RETURN_URL.to_string());

        Ok(Self {
            shop_id,
            secret_key,
            api_url,
            return_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_production_url() {
        let config = GatewayConfig::new("shop".to_string(), "secret".to_string());
        assert_eq!(config.shop_id, "shop");
        assert_eq!(config.secret_key, "secret");
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }
}
