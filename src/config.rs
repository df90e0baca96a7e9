use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    /// Base URL embedded in password-reset links.
    pub public_url: String,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let public_url =
            std::env::var("PUBLIC_URL").unwrap_or_else(|_| "http://localhost:8080".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(90 * 24 * 60),
        };
        let mail = MailConfig {
            endpoint: std::env::var("MAIL_ENDPOINT").context("MAIL_ENDPOINT must be set")?,
            username: std::env::var("MAIL_USERNAME").context("MAIL_USERNAME must be set")?,
            password: std::env::var("MAIL_PASSWORD").context("MAIL_PASSWORD must be set")?,
            from: std::env::var("MAIL_FROM")
                .unwrap_or_else(|_| "Tourbook <noreply@tourbook.dev>".into()),
        };
        Ok(Self {
            database_url,
            public_url,
            jwt,
            mail,
        })
    }
}
