use anyhow::Context;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_ACCESS_TOKEN_SECS: u64 = 900;
const DEFAULT_REFRESH_TOKEN_SECS: u64 = 432_000;
const DEFAULT_BCRYPT_COST: u32 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: String,
    pub database_url: Option<String>,
    pub request_timeout: Duration,
    pub auth: AuthConfig,
    pub seed_user: Option<SeedUser>,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret_key: String,
    pub access_token_duration: Duration,
    pub refresh_token_duration: Duration,
    pub bcrypt_cost: u32,
}

// Keeps the signing key out of logs.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret_key", &"<redacted>")
            .field("access_token_duration", &self.access_token_duration)
            .field("refresh_token_duration", &self.refresh_token_duration)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

/// Account created at startup when it does not exist yet.
#[derive(Clone)]
pub struct SeedUser {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for SeedUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedUser")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let server_port = env::var("SERVER_PORT").unwrap_or_else(|_| "3000".into());
        let database_url = env::var("DATABASE_URL").ok();
        let request_timeout =
            Duration::from_secs(parse_var("REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?);

        let jwt_secret_key =
            env::var("JWT_SECRET_KEY").context("JWT_SECRET_KEY must be set")?;
        if jwt_secret_key.trim().is_empty() {
            anyhow::bail!("JWT_SECRET_KEY must not be empty");
        }
        let auth = AuthConfig {
            jwt_secret_key,
            access_token_duration: Duration::from_secs(parse_var(
                "ACCESS_TOKEN_DURATION",
                DEFAULT_ACCESS_TOKEN_SECS,
            )?),
            refresh_token_duration: Duration::from_secs(parse_var(
                "REFRESH_TOKEN_DURATION",
                DEFAULT_REFRESH_TOKEN_SECS,
            )?),
            bcrypt_cost: parse_var("BCRYPT_COST", DEFAULT_BCRYPT_COST)?,
        };

        let seed_user = match (env::var("SEED_USERNAME"), env::var("SEED_PASSWORD")) {
            (Ok(username), Ok(password)) if !username.is_empty() && !password.is_empty() => {
                Some(SeedUser { username, password })
            }
            _ => None,
        };

        Ok(Self {
            server_port,
            database_url,
            request_timeout,
            auth,
            seed_user,
        })
    }
}

impl AuthConfig {
    pub fn new(jwt_secret_key: impl Into<String>) -> Self {
        Self {
            jwt_secret_key: jwt_secret_key.into(),
            access_token_duration: Duration::from_secs(DEFAULT_ACCESS_TOKEN_SECS),
            refresh_token_duration: Duration::from_secs(DEFAULT_REFRESH_TOKEN_SECS),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }
}

fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_secrets() {
        let auth = AuthConfig::new("super-secret-signing-key");
        let printed = format!("{auth:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("bcrypt_cost"));

        let seed = SeedUser {
            username: "admin".into(),
            password: "hunter2".into(),
        };
        assert!(!format!("{seed:?}").contains("hunter2"));
    }

    #[test]
    fn auth_defaults_match_documented_durations() {
        let auth = AuthConfig::new("k");
        assert_eq!(auth.access_token_duration, Duration::from_secs(900));
        assert_eq!(auth.refresh_token_duration, Duration::from_secs(432_000));
        assert_eq!(auth.bcrypt_cost, 10);
    }
}
