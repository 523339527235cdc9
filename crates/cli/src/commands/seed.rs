use storefront_core::config::ConfigOverrides;
use storefront_db::{DemoSeedDataset, SeedResult};

use crate::commands::{build_runtime, load_config, open_catalog, CommandFailure, CommandResult};

pub fn run() -> CommandResult {
    let config = match load_config("seed", ConfigOverrides::default()) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_catalog(&config).await?;

        let seeded = DemoSeedDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = DemoSeedDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let failed: Vec<&str> = verification
            .checks
            .iter()
            .filter_map(|check| (!check.passed).then_some(check.name.as_str()))
            .collect();
        let run_result: Result<SeedResult, CommandFailure> = if failed.is_empty() {
            Ok(seeded)
        } else {
            Err(("seed_verification", verification_message(&failed), 6u8))
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(seeded) => CommandResult::success(
            "seed",
            format!(
                "demo catalog ready: {} products, {} orders, {} order lines",
                seeded.products, seeded.orders, seeded.order_items
            ),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn verification_message(failed_checks: &[&str]) -> String {
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}
