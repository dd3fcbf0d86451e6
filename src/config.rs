use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailTransportKind {
    Resend,
    Smtp,
    Log,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub transport: MailTransportKind,
    pub resend_api_key: Option<String>,
    pub from_email: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
}

/// Admin account created at startup when no user owns `email` yet.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_maxage: i64,
    pub port: u16,
    pub frontend_url: String,
    pub mail: MailConfig,
    pub default_instructor_password: Option<String>,
    pub admin: Option<AdminBootstrap>,
}

impl Config {
    pub fn init() -> Result<Config, ConfigError> {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let storage_backend = match var("STORAGE_BACKEND").as_deref() {
            None | Some("postgres") => StorageBackend::Postgres,
            Some("memory") => StorageBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "STORAGE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let database_url = var("DATABASE_URL");
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let jwt_secret = var("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let jwt_maxage = parse_or("JWT_MAXAGE", var("JWT_MAXAGE"), 1440_i64)?;
        let port = parse_or("PORT", var("PORT"), 3000_u16)?;
        let frontend_url = var("FRONTEND_URL")
            .unwrap_or_else(|| "http://localhost:5173".to_string())
            .trim_end_matches('/')
            .to_string();

        let resend_api_key = var("RESEND_API_KEY");
        let transport = match var("MAIL_TRANSPORT").as_deref() {
            Some("resend") => MailTransportKind::Resend,
            Some("smtp") => MailTransportKind::Smtp,
            Some("log") => MailTransportKind::Log,
            None if resend_api_key.is_some() => MailTransportKind::Resend,
            None => MailTransportKind::Log,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "MAIL_TRANSPORT",
                    value: other.to_string(),
                })
            }
        };
        if transport == MailTransportKind::Resend && resend_api_key.is_none() {
            return Err(ConfigError::Missing("RESEND_API_KEY"));
        }

        let mail = MailConfig {
            transport,
            resend_api_key,
            from_email: var("RESEND_FROM_EMAIL")
                .unwrap_or_else(|| "SeuInstrutor <noreply@seuinstrutor.com.br>".to_string()),
            smtp_host: var("SMTP_HOST").unwrap_or_else(|| "localhost".to_string()),
            smtp_port: parse_or("SMTP_PORT", var("SMTP_PORT"), 587_u16)?,
            smtp_username: var("SMTP_USERNAME").unwrap_or_default(),
            smtp_password: var("SMTP_PASSWORD").unwrap_or_default(),
        };

        let admin = match (var("ADMIN_EMAIL"), var("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminBootstrap {
                email: email.trim().to_lowercase(),
                password,
                name: var("ADMIN_NAME").unwrap_or_else(|| "Administrador".to_string()),
            }),
            _ => None,
        };

        Ok(Config {
            storage_backend,
            database_url,
            jwt_secret,
            jwt_maxage,
            port,
            frontend_url,
            mail,
            default_instructor_password: var("DEFAULT_INSTRUCTOR_PASSWORD"),
            admin,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
