use crate::config::AppConfig;
use crate::db;
use crate::mail::{LogMailer, Mailer};
use crate::profile::{
    repo::{InMemoryUserStore, PgUserStore, UserStore},
    services::ProfileService,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub profiles: ProfileService,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = match &config.database_url {
            Some(url) => {
                let pool = db::connect(url, config.db_max_connections).await?;
                db::migrate(&pool).await?;
                Arc::new(PgUserStore::new(pool)) as Arc<dyn UserStore>
            }
            None => {
                tracing::warn!("DATABASE_URL not set; profiles are kept in memory");
                Arc::new(InMemoryUserStore::new()) as Arc<dyn UserStore>
            }
        };

        let mailer = Arc::new(LogMailer) as Arc<dyn Mailer>;
        Ok(Self::from_parts(config, store, mailer))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn UserStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            config,
            profiles: ProfileService::new(store),
            mailer,
        }
    }

    #[cfg(test)]
    pub fn fake(store: Arc<dyn UserStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self::fake_with_mail(
            store,
            mailer,
            crate::config::MailConfig {
                welcome_enabled: true,
                from: "test@triagentdesk.local".into(),
            },
        )
    }

    #[cfg(test)]
    pub fn fake_with_mail(
        store: Arc<dyn UserStore>,
        mailer: Arc<dyn Mailer>,
        mail: crate::config::MailConfig,
    ) -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            db_max_connections: 1,
            host: "127.0.0.1".into(),
            port: 0,
            mail,
        });
        Self::from_parts(config, store, mailer)
    }
}
