use storefront_core::config::ConfigOverrides;
use storefront_core::UserId;

use crate::commands::{
    build_runtime, load_config, open_catalog, pass_label, ranking_engine, ranking_failure,
    CommandResult,
};

pub fn run(user_id: &str, limit: Option<usize>) -> CommandResult {
    let overrides = ConfigOverrides { result_limit: limit, ..ConfigOverrides::default() };
    let mut config = match load_config("recommend", overrides) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    // --limit bounds the cold-start list as well as the hybrid one.
    if let Some(limit) = limit {
        let limits = &mut config.ranking.limits;
        limits.cold_start_limit = limit.min(limits.recommendation_pool_limit);
    }
    let runtime = match build_runtime("recommend") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let user = UserId::new(user_id.trim());
    let result = runtime.block_on(async {
        let pool = open_catalog(&config).await?;
        let ranked = ranking_engine(&config, &pool).recommend(&user).await;
        pool.close().await;
        ranked.map_err(ranking_failure)
    });

    match result {
        Ok(shortlist) => CommandResult::success_with_payload(
            "recommend",
            format!(
                "{} recommendation(s) for {} from the {} pass",
                shortlist.len(),
                user.0,
                pass_label(shortlist.pass)
            ),
            &shortlist,
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("recommend", error_class, message, exit_code)
        }
    }
}
