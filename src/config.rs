use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

/// Longest token lifetime the server will accept.
pub const MAX_JWT_TTL_HOURS: i64 = 24 * 365;

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_hours: i64,
}

// Keep the secret out of logs.
impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("ttl_hours", &self.ttl_hours)
            .finish()
    }
}

/// Argon2 work factor.
#[derive(Debug, Clone)]
pub struct HashConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub db_query_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub jwt: JwtConfig,
    pub hash: HashConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> anyhow::Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{key} must be set"))
        };

        let defaults = HashConfig::default();
        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            ttl_hours: parse_or(&lookup, "JWT_TTL_HOURS", 72)?,
        };
        anyhow::ensure!(
            (1..=MAX_JWT_TTL_HOURS).contains(&jwt.ttl_hours),
            "JWT_TTL_HOURS must be between 1 and {MAX_JWT_TTL_HOURS}"
        );

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "APP_PORT", 8080)?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            db_query_timeout_secs: parse_or(&lookup, "DB_QUERY_TIMEOUT_SECS", 5)?,
            request_timeout_secs: parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?,
            jwt,
            hash: HashConfig {
                memory_kib: parse_or(&lookup, "ARGON2_MEMORY_KIB", defaults.memory_kib)?,
                iterations: parse_or(&lookup, "ARGON2_ITERATIONS", defaults.iterations)?,
                parallelism: parse_or(&lookup, "ARGON2_PARALLELISM", defaults.parallelism)?,
            },
        })
    }

    pub fn db_query_timeout(&self) -> Duration {
        Duration::from_secs(self.db_query_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_keys_missing() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/users"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .expect("config should load");

        assert_eq!(cfg.jwt.ttl_hours, 72);
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.db_max_connections, 10);
        assert_eq!(cfg.hash.memory_kib, 19 * 1024);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")]))
            .unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn invalid_number_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("APP_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("APP_PORT"));
    }

    #[test]
    fn ttl_outside_accepted_range_is_an_error() {
        for ttl in ["0", "-5", "8761", "9223372036854775807"] {
            let err = AppConfig::from_lookup(lookup_from(&[
                ("DATABASE_URL", "postgres://x"),
                ("JWT_SECRET", "s"),
                ("JWT_TTL_HOURS", ttl),
            ]))
            .unwrap_err();
            assert!(err.to_string().contains("JWT_TTL_HOURS"), "ttl {ttl}: {err}");
        }
    }

    #[test]
    fn year_long_ttl_is_accepted() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("JWT_TTL_HOURS", "8760"),
        ]))
        .unwrap();
        assert_eq!(cfg.jwt.ttl_hours, MAX_JWT_TTL_HOURS);
    }

    #[test]
    fn debug_output_hides_secret() {
        let jwt = JwtConfig {
            secret: "top-secret-value".into(),
            ttl_hours: 72,
        };
        assert!(!format!("{jwt:?}").contains("top-secret-value"));
    }
}
