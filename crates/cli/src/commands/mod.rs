pub mod config;
pub mod migrate;
pub mod recommend;
pub mod search;
pub mod seed;

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use storefront_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use storefront_core::errors::RankingError;
use storefront_core::ranking::{RankingEngine, RankingPass};
use storefront_core::signals::SignalExtractor;
use storefront_db::{connect_with_config, migrations, DbPool, SqlCatalogRepository};
use tokio::runtime::Runtime;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

/// Failure tuple threaded through a command's async block: class, message, exit code.
pub(crate) type CommandFailure = (&'static str, String, u8);

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data(command, message, None)
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    /// Success carrying `data`, or a `serialization` failure when it cannot
    /// be encoded.
    pub fn success_with_payload<T: Serialize>(
        command: &str,
        message: impl Into<String>,
        data: &T,
    ) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => Self::success_with_data(command, message, Some(value)),
            Err(error) => Self::failure(
                command,
                "serialization",
                format!("failed to encode command output: {error}"),
                9,
            ),
        }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

pub(crate) fn load_config(
    command: &str,
    overrides: ConfigOverrides,
) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions { overrides, ..LoadOptions::default() }).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        )
    })
}

pub(crate) fn build_runtime(command: &str) -> Result<Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            3,
        )
    })
}

/// Connects and brings the schema up to date.
pub(crate) async fn open_catalog(config: &AppConfig) -> Result<DbPool, CommandFailure> {
    let pool = connect_with_config(&config.database)
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
    migrations::run_pending(&pool).await.map_err(|error| ("migration", error.to_string(), 5u8))?;
    Ok(pool)
}

pub(crate) fn ranking_engine(config: &AppConfig, pool: &DbPool) -> RankingEngine {
    RankingEngine::with_config(
        Arc::new(SqlCatalogRepository::new(pool.clone())),
        config.ranking,
        SignalExtractor::new(config.signals.clone()),
    )
}

pub(crate) fn ranking_failure(error: RankingError) -> CommandFailure {
    match error {
        RankingError::Domain(error) => ("invalid_input", error.to_string(), 7),
        RankingError::Loader(error) => ("ranking", error.to_string(), 8),
    }
}

pub(crate) fn pass_label(pass: RankingPass) -> String {
    serde_json::to_value(pass)
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{pass:?}"))
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::CommandResult;

    #[test]
    fn success_payload_omits_missing_data() {
        let result = CommandResult::success("migrate", "applied pending migrations");
        let payload: Value = serde_json::from_str(&result.output).expect("json");

        assert_eq!(result.exit_code, 0);
        assert_eq!(payload["status"], "ok");
        assert!(payload.get("data").is_none());
        assert_eq!(payload["error_class"], Value::Null);
    }

    #[test]
    fn failure_payload_carries_class_and_code() {
        let result = CommandResult::failure("search", "invalid_input", "query text is required", 7);
        let payload: Value = serde_json::from_str(&result.output).expect("json");

        assert_eq!(result.exit_code, 7);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "invalid_input");
    }

    #[test]
    fn unencodable_payload_becomes_a_failure() {
        struct Unencodable;

        impl serde::Serialize for Unencodable {
            fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("non-finite score"))
            }
        }

        let result = CommandResult::success_with_payload("recommend", "ok", &Unencodable);
        let payload: Value = serde_json::from_str(&result.output).expect("json");

        assert_eq!(result.exit_code, 9);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "serialization");
        assert!(payload["message"].as_str().unwrap_or_default().contains("non-finite score"));
    }

    #[test]
    fn data_is_embedded_verbatim() {
        let result = CommandResult::success_with_data("search", "ok", Some(json!({"pass": "strict"})));
        let payload: Value = serde_json::from_str(&result.output).expect("json");

        assert_eq!(payload["data"]["pass"], "strict");
    }
}
