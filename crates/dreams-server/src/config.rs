use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Json,
    Sqlite,
    Memory,
}

impl StoreKind {
    fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => bail!("DREAMS_STORE must be json, sqlite or memory, got '{}'", other),
        }
    }

    fn default_path(self) -> &'static str {
        match self {
            Self::Sqlite => "dreams.db",
            Self::Json | Self::Memory => "dreams.json",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub addr: SocketAddr,
    pub store: StoreKind,
    pub data_path: PathBuf,
}

impl Config {
    /// Reads `DREAMS_*` variables. Call after `dotenvy::dotenv()`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let jwt_secret = var("DREAMS_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("DREAMS_JWT_SECRET is unset or still a placeholder");
        }

        let host = var("DREAMS_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = var("DREAMS_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("DREAMS_PORT is not a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", host, port))?;

        let store = match var("DREAMS_STORE") {
            Some(raw) => StoreKind::parse(&raw)?,
            None => StoreKind::Json,
        };
        let data_path = var("DREAMS_DATA_PATH")
            .unwrap_or_else(|| store.default_path().into())
            .into();

        Ok(Self {
            jwt_secret,
            addr,
            store,
            data_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(&[("DREAMS_JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.store, StoreKind::Json);
        assert_eq!(config.data_path, PathBuf::from("dreams.json"));
    }

    #[test]
    fn placeholder_secret_is_refused() {
        assert!(load(&[]).is_err());
        assert!(load(&[("DREAMS_JWT_SECRET", "dev-secret-change-me")]).is_err());
    }

    #[test]
    fn store_selection() {
        let config = load(&[
            ("DREAMS_JWT_SECRET", "s3cret"),
            ("DREAMS_STORE", "SQLite"),
            ("DREAMS_PORT", "8080"),
        ])
        .unwrap();
        assert_eq!(config.store, StoreKind::Sqlite);
        assert_eq!(config.data_path, PathBuf::from("dreams.db"));
        assert_eq!(config.addr.port(), 8080);

        assert!(load(&[("DREAMS_JWT_SECRET", "s3cret"), ("DREAMS_STORE", "redis")]).is_err());
        assert!(load(&[("DREAMS_JWT_SECRET", "s3cret"), ("DREAMS_PORT", "http")]).is_err());
    }
}
