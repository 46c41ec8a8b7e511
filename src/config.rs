use anyhow::Context;
use serde::Deserialize;

/// Longest accepted access-token lifetime.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 366;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// `None` selects the in-process store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt = JwtConfig {
            secret: non_empty("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: non_empty("JWT_ISSUER").unwrap_or_else(|| "sweetshop".into()),
            audience: non_empty("JWT_AUDIENCE").unwrap_or_else(|| "sweetshop-users".into()),
            ttl_minutes: non_empty("JWT_TTL_MINUTES")
                .map(|v| v.parse::<i64>())
                .transpose()
                .context("JWT_TTL_MINUTES must be an integer")?
                .unwrap_or(60 * 24),
        };
        anyhow::ensure!(jwt.ttl_minutes > 0, "JWT_TTL_MINUTES must be positive");
        anyhow::ensure!(
            jwt.ttl_minutes <= MAX_TTL_MINUTES,
            "JWT_TTL_MINUTES must be at most {MAX_TTL_MINUTES} (one year)"
        );

        let db_max_connections = non_empty("DB_MAX_CONNECTIONS")
            .map(|v| v.parse::<u32>())
            .transpose()
            .context("DB_MAX_CONNECTIONS must be an integer")?
            .unwrap_or(10);

        let port = non_empty("APP_PORT")
            .map(|v| v.parse::<u16>())
            .transpose()
            .context("APP_PORT must be a port number")?
            .unwrap_or(3000);

        let cors_allowed_origins = non_empty("CORS_ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            database_url: non_empty("DATABASE_URL"),
            db_max_connections,
            jwt,
            host: non_empty("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            cors_allowed_origins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let cfg = AppConfig::from_lookup(lookup(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(cfg.jwt.secret, "s3cret");
        assert_eq!(cfg.jwt.issuer, "sweetshop");
        assert_eq!(cfg.jwt.audience, "sweetshop-users");
        assert_eq!(cfg.jwt.ttl_minutes, 1440);
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.db_max_connections, 10);
        assert!(cfg.database_url.is_none());
        assert!(cfg.cors_allowed_origins.is_empty());
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn parses_overrides() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("JWT_SECRET", "k"),
            ("JWT_TTL_MINUTES", "15"),
            ("APP_PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/sweets"),
            (
                "CORS_ALLOWED_ORIGINS",
                "http://localhost:5173, https://shop.example.com,",
            ),
        ]))
        .unwrap();
        assert_eq!(cfg.jwt.ttl_minutes, 15);
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/sweets"));
        assert_eq!(
            cfg.cors_allowed_origins,
            vec!["http://localhost:5173", "https://shop.example.com"]
        );
    }

    #[test]
    fn rejects_garbage_numbers() {
        assert!(AppConfig::from_lookup(lookup(&[("JWT_SECRET", "k"), ("APP_PORT", "http")])).is_err());
        assert!(
            AppConfig::from_lookup(lookup(&[("JWT_SECRET", "k"), ("JWT_TTL_MINUTES", "0")])).is_err()
        );
    }

    #[test]
    fn ttl_is_capped_at_one_year() {
        let at_cap = MAX_TTL_MINUTES.to_string();
        let cfg = AppConfig::from_lookup(lookup(&[
            ("JWT_SECRET", "k"),
            ("JWT_TTL_MINUTES", at_cap.as_str()),
        ]))
        .unwrap();
        assert_eq!(cfg.jwt.ttl_minutes, MAX_TTL_MINUTES);

        let over = (MAX_TTL_MINUTES + 1).to_string();
        let err = AppConfig::from_lookup(lookup(&[
            ("JWT_SECRET", "k"),
            ("JWT_TTL_MINUTES", over.as_str()),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("JWT_TTL_MINUTES"));

        assert!(AppConfig::from_lookup(lookup(&[
            ("JWT_SECRET", "k"),
            ("JWT_TTL_MINUTES", "1000000000000000"),
        ]))
        .is_err());
    }
}
