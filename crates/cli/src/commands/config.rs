use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use storefront_core::config::{AppConfig, LoadOptions};
use toml::Value;

/// Where a rendered value came from, resolved lazily per key.
struct SourceResolver {
    file_path: Option<PathBuf>,
    file_doc: Option<Value>,
}

impl SourceResolver {
    fn detect() -> Self {
        let file_path = detect_config_path();
        let file_doc = load_config_file_doc(file_path.as_deref());
        Self { file_path, file_doc }
    }

    fn source(&self, key_path: &str, env_keys: &[&str]) -> String {
        if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
            return format!("env ({env_key})");
        }

        if let Some(doc) = &self.file_doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .file_path
                    .as_deref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

struct Row<'a> {
    key: &'a str,
    value: String,
    env_keys: &'static [&'static str],
}

fn row<'a>(key: &'a str, value: String, env_keys: &'static [&'static str]) -> Row<'a> {
    Row { key, value, env_keys }
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };
    render(&config, &SourceResolver::detect())
}

fn render(config: &AppConfig, sources: &SourceResolver) -> String {
    let limits = &config.ranking.limits;
    let api_key = if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" };

    let mut rows = vec![
        row("database.url", config.database.url.clone(), &["STOREFRONT_DATABASE_URL"]),
        row(
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["STOREFRONT_DATABASE_MAX_CONNECTIONS"],
        ),
        row(
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["STOREFRONT_DATABASE_TIMEOUT_SECS"],
        ),
        row("llm.provider", format!("{:?}", config.llm.provider), &["STOREFRONT_LLM_PROVIDER"]),
        row("llm.model", config.llm.model.clone(), &["STOREFRONT_LLM_MODEL"]),
        row(
            "llm.base_url",
            config.llm.base_url.clone().unwrap_or_else(|| "<unset>".to_string()),
            &["STOREFRONT_LLM_BASE_URL"],
        ),
        row("llm.api_key", api_key.to_string(), &["STOREFRONT_LLM_API_KEY"]),
        row("llm.max_retries", config.llm.max_retries.to_string(), &["STOREFRONT_LLM_MAX_RETRIES"]),
        row(
            "server.bind_address",
            config.server.bind_address.clone(),
            &["STOREFRONT_SERVER_BIND_ADDRESS"],
        ),
        row("server.port", config.server.port.to_string(), &["STOREFRONT_SERVER_PORT"]),
        row(
            "logging.level",
            config.logging.level.clone(),
            &["STOREFRONT_LOGGING_LEVEL", "STOREFRONT_LOG_LEVEL"],
        ),
        row(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["STOREFRONT_LOGGING_FORMAT", "STOREFRONT_LOG_FORMAT"],
        ),
        row(
            "ranking.limits.candidate_limit",
            limits.candidate_limit.to_string(),
            &["STOREFRONT_RANKING_CANDIDATE_LIMIT"],
        ),
        row(
            "ranking.limits.result_limit",
            limits.result_limit.to_string(),
            &["STOREFRONT_RANKING_RESULT_LIMIT"],
        ),
        row(
            "ranking.limits.cold_start_limit",
            limits.cold_start_limit.to_string(),
            &["STOREFRONT_RANKING_COLD_START_LIMIT"],
        ),
        row(
            "ranking.limits.recommendation_pool_limit",
            limits.recommendation_pool_limit.to_string(),
            &["STOREFRONT_RANKING_RECOMMENDATION_POOL_LIMIT"],
        ),
    ];

    let weight_keys: Vec<(String, f64)> = config
        .ranking
        .weights
        .all()
        .into_iter()
        .map(|(name, value)| (format!("ranking.weights.{name}"), value))
        .collect();
    for (key, value) in &weight_keys {
        rows.push(row(key, value.to_string(), &[]));
    }

    rows.push(row(
        "signals.stop_words",
        format!("{} words", config.signals.stop_words.len()),
        &[],
    ));
    rows.push(row("signals.vibe_terms", config.signals.vibe_terms.join(", "), &[]));

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(
        rows.into_iter()
            .map(|row| render_line(row.key, &row.value, sources.source(row.key, row.env_keys))),
    );
    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    ["storefront.toml", "config/storefront.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
