use storefront_core::config::ConfigOverrides;

use crate::commands::{
    build_runtime, load_config, open_catalog, pass_label, ranking_engine, ranking_failure,
    CommandResult,
};

pub fn run(query: &str, limit: Option<usize>) -> CommandResult {
    let overrides = ConfigOverrides { result_limit: limit, ..ConfigOverrides::default() };
    let config = match load_config("search", overrides) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime("search") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_catalog(&config).await?;
        let ranked = ranking_engine(&config, &pool).search(query).await;
        pool.close().await;
        ranked.map_err(ranking_failure)
    });

    match result {
        Ok(shortlist) => {
            let message = if shortlist.had_results {
                format!(
                    "{} product(s) matched on the {} pass",
                    shortlist.len(),
                    pass_label(shortlist.pass)
                )
            } else {
                "no products matched".to_string()
            };
            CommandResult::success_with_payload("search", message, &shortlist)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("search", error_class, message, exit_code)
        }
    }
}
