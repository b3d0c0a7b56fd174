use std::time::Duration;

/// Where customer records are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// PostgreSQL reached through `database_url`.
    Postgres {
        database_url: String,
        max_connections: u32,
    },
    /// Process memory; contents are lost on restart.
    Memory,
}

impl StoreBackend {
    pub fn name(&self) -> &'static str {
        match self {
            StoreBackend::Postgres { .. } => "postgres",
            StoreBackend::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreBackend,
    pub port: u16,
    pub body_limit_bytes: usize,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        match &config.store {
            StoreBackend::Postgres {
                database_url,
                max_connections,
            } => {
                tracing::debug!(
                    "Database URL: {}... (pool size {})",
                    database_url.chars().take(20).collect::<String>(),
                    max_connections
                );
            }
            StoreBackend::Memory => tracing::warn!("Using in-memory customer store"),
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// Builds the configuration from any key lookup, validating each value.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = match lookup("CUSTOMER_STORE")
            .unwrap_or_else(|| "postgres".to_string())
            .trim()
            .to_lowercase()
            .as_str()
        {
            "memory" => StoreBackend::Memory,
            "postgres" | "postgresql" => StoreBackend::Postgres {
                database_url: lookup("DB_URL")
                    .or_else(|| lookup("DATABASE_URL"))
                    .ok_or_else(|| {
                        anyhow::anyhow!("DB_URL or DATABASE_URL environment variable required")
                    })
                    .and_then(|url| {
                        if url.trim().is_empty() {
                            anyhow::bail!("DB_URL cannot be empty");
                        }
                        if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                            anyhow::bail!("DB_URL must start with postgresql:// or postgres://");
                        }
                        Ok(url)
                    })?,
                max_connections: lookup("DB_MAX_CONNECTIONS")
                    .unwrap_or_else(|| "10".to_string())
                    .parse()
                    .ok()
                    .filter(|n: &u32| *n >= 1)
                    .ok_or_else(|| {
                        anyhow::anyhow!("DB_MAX_CONNECTIONS must be a positive number")
                    })?,
            },
            other => anyhow::bail!("CUSTOMER_STORE must be postgres or memory, got {}", other),
        };

        Ok(Self {
            store,
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            body_limit_bytes: lookup("BODY_LIMIT_BYTES")
                .unwrap_or_else(|| "1048576".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("BODY_LIMIT_BYTES must be a number of bytes"))?,
            request_timeout: lookup("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|| "30".to_string())
                .parse()
                .ok()
                .filter(|secs: &u64| *secs >= 1)
                .map(Duration::from_secs)
                .ok_or_else(|| anyhow::anyhow!("REQUEST_TIMEOUT_SECS must be a positive number"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_postgres_url() {
        let config =
            Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/customers")]))
                .unwrap();
        assert_eq!(
            config.store,
            StoreBackend::Postgres {
                database_url: "postgres://localhost/customers".into(),
                max_connections: 10,
            }
        );
        assert_eq!(config.port, 8080);
        assert_eq!(config.body_limit_bytes, 1024 * 1024);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_postgres_requires_url() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
        assert!(Config::from_lookup(lookup(&[("DB_URL", "mysql://localhost/db")])).is_err());
    }

    #[test]
    fn test_memory_store_needs_no_url() {
        let config =
            Config::from_lookup(lookup(&[("CUSTOMER_STORE", "Memory"), ("PORT", "3000")]))
                .unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_rejects_invalid_numbers() {
        let base = [("CUSTOMER_STORE", "memory")];
        assert!(Config::from_lookup(lookup(&[base[0], ("PORT", "70000")])).is_err());
        assert!(Config::from_lookup(lookup(&[base[0], ("REQUEST_TIMEOUT_SECS", "0")])).is_err());
        assert!(Config::from_lookup(lookup(&[("CUSTOMER_STORE", "sqlite")])).is_err());
        assert!(Config::from_lookup(lookup(&[
            ("DB_URL", "postgres://localhost/db"),
            ("DB_MAX_CONNECTIONS", "0")
        ]))
        .is_err());
    }
}
