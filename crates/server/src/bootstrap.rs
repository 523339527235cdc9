use std::sync::Arc;

use storefront_assistant::{ChatCompletionsClient, LlmClient, ShoppingAssistant};
use storefront_core::config::{AppConfig, ConfigError, LoadOptions};
use storefront_core::ranking::RankingEngine;
use storefront_core::signals::SignalExtractor;
use storefront_db::{connect_with_config, migrations, DbPool, SqlCatalogRepository};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub engine: RankingEngine,
    pub assistant: Arc<ShoppingAssistant>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("assistant initialization failed: {0}")]
    Assistant(String),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let engine = RankingEngine::with_config(
        Arc::new(SqlCatalogRepository::new(db_pool.clone())),
        config.ranking,
        SignalExtractor::new(config.signals.clone()),
    );

    let llm = ChatCompletionsClient::from_config(&config.llm)
        .map_err(|error| BootstrapError::Assistant(error.to_string()))?
        .map(|client| Arc::new(client) as Arc<dyn LlmClient>);
    info!(
        event_name = "system.bootstrap.assistant_ready",
        correlation_id = "bootstrap",
        llm_provider = ?config.llm.provider,
        llm_enabled = llm.is_some(),
        "shopping assistant initialized"
    );

    let assistant = ShoppingAssistant::new(engine.clone(), llm)
        .map_err(|error| BootstrapError::Assistant(error.to_string()))?;

    Ok(Application { config, db_pool, engine, assistant: Arc::new(assistant) })
}
