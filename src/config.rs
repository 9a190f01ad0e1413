//! Connection settings for the store.

use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::{Client, config::Credentials};
use serde::Deserialize;
use std::env;

const CREDENTIALS_PROVIDER: &str = "dynamodb-store";

/// Region, endpoint, credentials and table prefix.
///
/// Unset fields fall back to the SDK's default provider chain.
///
/// ```rust,no_run
/// use dynamodb_store::config::Config;
///
/// # async fn example() {
/// let config = Config::from_env();
/// let client = config.load().await;
/// # }
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Region name, e.g. `eu-west-1`.
    pub region: Option<String>,
    /// Endpoint override, e.g. a local emulator.
    pub endpoint_url: Option<String>,
    /// Static access key id.
    pub access_key_id: Option<String>,
    /// Static secret access key.
    pub secret_access_key: Option<String>,
    /// Session token for temporary credentials.
    pub session_token: Option<String>,
    /// Prefix prepended to every table name.
    pub table_prefix: String,
}

impl Config {
    /// Read the settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read the settings through `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());
        Self {
            region: get("DYNAMODB_REGION").or_else(|| get("AWS_REGION")),
            endpoint_url: get("DYNAMODB_ENDPOINT_URL"),
            access_key_id: get("AWS_ACCESS_KEY_ID"),
            secret_access_key: get("AWS_SECRET_ACCESS_KEY"),
            session_token: get("AWS_SESSION_TOKEN"),
            table_prefix: get("DYNAMODB_TABLE_PREFIX").unwrap_or_default(),
        }
    }

    /// Static credentials, when both key halves are set.
    pub fn credentials(&self) -> Option<Credentials> {
        let (Some(access_key_id), Some(secret_access_key)) =
            (&self.access_key_id, &self.secret_access_key)
        else {
            return None;
        };
        Some(Credentials::new(
            access_key_id,
            secret_access_key,
            self.session_token.clone(),
            None,
            CREDENTIALS_PROVIDER,
        ))
    }

    /// Build a client.
    pub async fn load(&self) -> Client {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint_url) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }
        if let Some(credentials) = self.credentials() {
            loader = loader.credentials_provider(credentials);
        }
        Client::new(&loader.load().await)
    }
}
