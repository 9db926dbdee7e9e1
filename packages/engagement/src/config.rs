use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Views at which an entity triggers the admin notification, unless
/// overridden by `VIEW_THRESHOLD`.
pub const DEFAULT_VIEW_THRESHOLD: i64 = 100;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_login: String,
    pub smtp_password: String,
    /// `From` address on outbound mail. Defaults to the SMTP login.
    pub mail_sender: String,
    /// Admin address that receives threshold notifications.
    pub notify_recipient: String,
    pub view_threshold: i64,
    pub smtp_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let smtp_login = env::var("SMTP_LOGIN").context("SMTP_LOGIN must be set")?;

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            smtp_host: env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
            smtp_port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .context("SMTP_PORT must be a valid port number")?,
            smtp_password: env::var("SMTP_PASSWORD").context("SMTP_PASSWORD must be set")?,
            mail_sender: env::var("MAIL_SENDER").unwrap_or_else(|_| smtp_login.clone()),
            notify_recipient: env::var("NOTIFY_RECIPIENT")
                .context("NOTIFY_RECIPIENT must be set")?,
            view_threshold: env::var("VIEW_THRESHOLD")
                .unwrap_or_else(|_| DEFAULT_VIEW_THRESHOLD.to_string())
                .parse()
                .context("VIEW_THRESHOLD must be a valid integer")?,
            smtp_timeout_secs: env::var("SMTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("SMTP_TIMEOUT_SECS must be a valid integer")?,
            smtp_login,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_applies_defaults() {
        env::set_var("DATABASE_URL", "postgres://localhost/engagement_test");
        env::set_var("SMTP_LOGIN", "admin@example.org");
        env::set_var("SMTP_PASSWORD", "secret");
        env::set_var("NOTIFY_RECIPIENT", "alerts@example.org");

        let config = Config::from_env().unwrap();
        assert_eq!(config.smtp_host, "smtp.gmail.com");
        assert_eq!(config.smtp_port, 587);
        assert_eq!(config.mail_sender, "admin@example.org");
        assert_eq!(config.view_threshold, DEFAULT_VIEW_THRESHOLD);
        assert_eq!(config.smtp_timeout_secs, 5);
    }
}
