use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context};
use mongodb::options::Credential;

use crate::fixtures::{COLLECTION_NAME, DB_NAME};
use crate::seeder::SeedMode;

#[derive(Debug, Clone)]
pub struct Config {
    pub mongo_uri: String,
    /// Kept out of `mongo_uri` so reserved characters need no escaping.
    pub credential: Option<Credential>,
    pub db_name: String,
    pub collection_name: String,
    pub seed_mode: SeedMode,
    pub connect_attempts: u32,
    pub retry_delay: Duration,
    pub verify: bool,
    pub dry_run: bool,
}

impl Config {
    pub fn from_env() -> Result<Config, anyhow::Error> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mongo_uri = match lookup("MONGO_URI") {
            Some(uri) => {
                if !uri.starts_with("mongodb://") && !uri.starts_with("mongodb+srv://") {
                    return Err(anyhow!(
                        "Invalid value for MONGO_URI: {} (expected a mongodb:// or mongodb+srv:// connection string)",
                        uri
                    ));
                }
                uri
            }
            None => {
                let host_name = lookup("MONGO_HOST").unwrap_or_else(|| "localhost".to_string());
                let port: u16 = parse_or(&lookup, "MONGO_PORT", 27017)?;
                format!("mongodb://{}:{}", host_name, port)
            }
        };

        // applied on top of MONGO_URI as well
        let credential = match (lookup("MONGO_USERNAME"), lookup("MONGO_PASSWORD")) {
            (Some(user_name), Some(password)) => {
                let mut credential = Credential::default();
                credential.username = Some(user_name);
                credential.password = Some(password);
                Some(credential)
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(anyhow!("MONGO_USERNAME and MONGO_PASSWORD must be set together"));
            }
            (None, None) => None,
        };

        let connect_attempts: u32 = parse_or(&lookup, "CONNECT_ATTEMPTS", 5)?;
        if connect_attempts == 0 {
            return Err(anyhow!("CONNECT_ATTEMPTS must be at least 1"));
        }

        Ok(Config {
            mongo_uri,
            credential,
            db_name: lookup("MONGO_DBNAME").unwrap_or_else(|| DB_NAME.to_string()),
            collection_name: lookup("MONGO_COLLECTION").unwrap_or_else(|| COLLECTION_NAME.to_string()),
            seed_mode: parse_or(&lookup, "SEED_MODE", SeedMode::default())?,
            connect_attempts,
            retry_delay: Duration::from_secs(parse_or(&lookup, "CONNECT_RETRY_SECS", 5)?),
            verify: parse_or(&lookup, "SEED_VERIFY", true)?,
            dry_run: parse_or(&lookup, "SEED_DRY_RUN", false)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("{}", e))
            .with_context(|| format!("Invalid value for {}: {}", key, value)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.mongo_uri, "mongodb://localhost:27017");
        assert_eq!(config.db_name, "diabete_notes_db");
        assert_eq!(config.collection_name, "notes");
        assert!(config.credential.is_none());
        assert_eq!(config.seed_mode, SeedMode::Reseed);
        assert_eq!(config.connect_attempts, 5);
        assert_eq!(config.retry_delay, Duration::from_secs(5));
        assert!(config.verify);
        assert!(!config.dry_run);
    }

    #[test]
    fn builds_uri_from_parts() {
        let config = config(&[
            ("MONGO_HOST", "mongo"),
            ("MONGO_PORT", "27018"),
            ("MONGO_USERNAME", "root"),
            ("MONGO_PASSWORD", "secret"),
        ])
        .unwrap();
        assert_eq!(config.mongo_uri, "mongodb://mongo:27018");

        let credential = config.credential.unwrap();
        assert_eq!(credential.username.as_deref(), Some("root"));
        assert_eq!(credential.password.as_deref(), Some("secret"));
    }

    #[test]
    fn reserved_characters_stay_out_of_the_uri() {
        let config = config(&[("MONGO_USERNAME", "root"), ("MONGO_PASSWORD", "p@ss:w/rd?#")]).unwrap();
        assert_eq!(config.mongo_uri, "mongodb://localhost:27017");
        assert_eq!(config.credential.unwrap().password.as_deref(), Some("p@ss:w/rd?#"));
    }

    #[test]
    fn rejects_uri_without_mongodb_scheme() {
        let err = config(&[("MONGO_URI", "not-a-mongo-uri")]).unwrap_err();
        assert!(err.to_string().contains("MONGO_URI"));
        assert!(config(&[("MONGO_URI", "mongodb+srv://cluster.example.net")]).is_ok());
    }

    #[test]
    fn explicit_uri_wins() {
        let config = config(&[("MONGO_URI", "mongodb://db:1234"), ("MONGO_HOST", "ignored")]).unwrap();
        assert_eq!(config.mongo_uri, "mongodb://db:1234");
    }

    #[test]
    fn rejects_bad_values() {
        let err = config(&[("MONGO_PORT", "abc")]).unwrap_err();
        assert!(err.to_string().contains("MONGO_PORT"));

        assert!(config(&[("SEED_MODE", "upsert")]).is_err());
        assert!(config(&[("CONNECT_ATTEMPTS", "0")]).is_err());
        assert!(config(&[("MONGO_USERNAME", "root")]).is_err());
        assert!(config(&[("SEED_DRY_RUN", "yes")]).is_err());
    }

    #[test]
    fn reads_mode_and_flags() {
        let config = config(&[("SEED_MODE", "append"), ("SEED_VERIFY", "false"), ("SEED_DRY_RUN", "true")]).unwrap();
        assert_eq!(config.seed_mode, SeedMode::Append);
        assert!(!config.verify);
        assert!(config.dry_run);
    }
}
