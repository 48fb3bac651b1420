use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub seed_demo_users: bool,
    pub jwt: JwtConfig,
}

/// Seven days.
pub const DEFAULT_TTL_MINUTES: i64 = 60 * 24 * 7;
/// One year.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

/// Parses `JWT_TTL_MINUTES`; unset means the default.
pub fn parse_ttl_minutes(raw: Option<&str>) -> anyhow::Result<i64> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_TTL_MINUTES);
    };
    let minutes: i64 = raw
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("JWT_TTL_MINUTES={raw:?}: {e}"))?;
    if !(1..=MAX_TTL_MINUTES).contains(&minutes) {
        anyhow::bail!("JWT_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}, got {minutes}");
    }
    Ok(minutes)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let port = std::env::var("APP_PORT")
            .or_else(|_| std::env::var("PORT"))
            .ok()
            .map(|v| v.parse::<u16>())
            .transpose()?
            .unwrap_or(5000);
        let seed_demo_users = std::env::var("SEED_DEMO_USERS")
            .ok()
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(environment == "development");
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            ttl_minutes: parse_ttl_minutes(std::env::var("JWT_TTL_MINUTES").ok().as_deref())?,
        };
        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            environment,
            seed_demo_users,
            jwt,
        })
    }

    /// Config with a fixed secret and no demo data.
    pub fn for_tests(secret: &str) -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            environment: "test".into(),
            seed_demo_users: false,
            jwt: JwtConfig {
                secret: secret.into(),
                ttl_minutes: DEFAULT_TTL_MINUTES,
            },
        }
    }
}
