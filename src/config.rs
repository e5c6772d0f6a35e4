use serde::Deserialize;
use time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub refresh_ttl_days: i64,
    pub reset_ttl_minutes: i64,
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "taskboard".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "taskboard-users".into()),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 15),
        };
        Ok(Self {
            database_url,
            jwt,
            refresh_ttl_days: env_parse("REFRESH_TTL_DAYS", 7),
            reset_ttl_minutes: env_parse("RESET_TTL_MINUTES", 60),
            rate_limit_max: env_parse("RATE_LIMIT_MAX", 100),
            rate_limit_window_secs: env_parse("RATE_LIMIT_WINDOW_SECS", 60),
        })
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::days(self.refresh_ttl_days)
    }

    pub fn reset_ttl(&self) -> Duration {
        Duration::minutes(self.reset_ttl_minutes)
    }
}
