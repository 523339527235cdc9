use storefront_core::config::ConfigOverrides;

use crate::commands::{build_runtime, load_config, open_catalog, CommandResult};

pub fn run() -> CommandResult {
    let config = match load_config("migrate", ConfigOverrides::default()) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime("migrate") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_catalog(&config).await?;
        pool.close().await;
        Ok::<(), crate::commands::CommandFailure>(())
    });

    match result {
        Ok(()) => CommandResult::success("migrate", "applied pending migrations"),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
    }
}
