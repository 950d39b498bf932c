use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub welcome_enabled: bool,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Unset means the in-memory user store is used.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = var("DATABASE_URL").filter(|v| !v.trim().is_empty());
        let port = match var("APP_PORT") {
            Some(v) => v
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("invalid APP_PORT {:?}: {}", v, e))?,
            None => 8080,
        };
        let mail = MailConfig {
            welcome_enabled: var("WELCOME_EMAIL")
                .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "off" | "no"))
                .unwrap_or(true),
            from: var("MAIL_FROM")
                .unwrap_or_else(|| "\"TriagentDesk\" <noreply@triagentdesk.local>".into()),
        };
        Ok(Self {
            database_url,
            db_max_connections: var("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            mail,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
