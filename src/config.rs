use std::{fs::File, io::BufReader, path::Path};

use serde::Deserialize;

use crate::errors::Result;

pub const DEFAULT_CREATED_BY: &str = "IsraelHiking.osm.org.il";

fn default_created_by() -> String {
    DEFAULT_CREATED_BY.to_string()
}

/// Application-wide OSM settings, shared by every user session.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct OsmConfiguration {
    /// Site address, e.g. `https://www.openstreetmap.org`.
    pub base_address: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    /// Value of the `created_by` tag on new changesets.
    #[serde(default = "default_created_by")]
    pub created_by: String,
    /// Global timeout for a single request. No timeout when absent.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

/// Access token of one authenticated user.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenAndSecret {
    pub token: String,
    pub token_secret: String,
}

/// Everything the OAuth1 signer needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token: String,
    pub token_secret: String,
}

impl Credentials {
    pub fn new(config: &OsmConfiguration, token: &TokenAndSecret) -> Self {
        Credentials {
            consumer_key: config.consumer_key.clone(),
            consumer_secret: config.consumer_secret.clone(),
            token: token.token.clone(),
            token_secret: token.token_secret.clone(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration file read by the command line tool.
#[derive(Deserialize, Debug, Clone)]
pub struct UserConfig {
    pub osm: OsmConfiguration,
    #[serde(default)]
    pub session: TokenAndSecret,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

pub fn load_config(path: &Path) -> Result<UserConfig> {
    let file = File::open(path)?;
    let config = serde_json::from_reader(BufReader::new(file))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_optional_fields_get_defaults() {
        let config: UserConfig = serde_json::from_str(
            r#"{
                "osm": {
                    "base_address": "https://www.openstreetmap.org",
                    "consumer_key": "key",
                    "consumer_secret": "secret"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.osm.created_by, DEFAULT_CREATED_BY);
        assert_eq!(config.osm.timeout_seconds, None);
        assert_eq!(config.session, TokenAndSecret::default());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn credentials_combine_consumer_and_token() {
        let config = OsmConfiguration {
            base_address: "https://api.example.org".to_string(),
            consumer_key: "ck".to_string(),
            consumer_secret: "cs".to_string(),
            created_by: default_created_by(),
            timeout_seconds: Some(30),
        };
        let token = TokenAndSecret {
            token: "t".to_string(),
            token_secret: "ts".to_string(),
        };
        let credentials = Credentials::new(&config, &token);
        assert_eq!(credentials.consumer_key, "ck");
        assert_eq!(credentials.token_secret, "ts");
    }
}
