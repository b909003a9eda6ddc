//! Seed command.

use crate::cli::SeedArgs;
use crate::commands::verify::verify_artifact;
use crate::orchestrator::{SeedOutcome, SeedRun};
use crate::output::{info, print_summary, print_user_failures, success, warning};
use crate::CliConfig;

/// Seeds the fixtures and writes the artifact.
pub async fn run_seed(args: SeedArgs, mut config: CliConfig) -> crate::CliResult<()> {
    if let Some(output) = args.output {
        config.output_path = output;
    }
    if let Some(count) = args.user_count {
        config.provider.user_count = count;
    }
    let timeout = config.provider.request_timeout;

    let mut run = SeedRun::new(config)?;
    let settings = &run.context().config.provider;
    info(&format!(
        "Seeding realm '{}' on {} ({}) with {} users",
        settings.perf_realm,
        settings.kind.display_name(),
        settings.base_url,
        settings.user_count
    ));

    let outcome = run.run().await?;
    report(&outcome);

    if args.verify {
        verify_artifact(&outcome.artifact_path, timeout).await?;
    }
    Ok(())
}

fn report(outcome: &SeedOutcome) {
    let users = &outcome.users;
    if users.is_complete() {
        success(&format!("Created {} users", users.created.len()));
    } else {
        warning(&format!(
            "Users: {} created / {} failed",
            users.created.len(),
            users.failures.len()
        ));
        print_user_failures(users);
    }

    print_summary(&outcome.bundle);
    success(&format!(
        "Configuration written to {}",
        outcome.artifact_path.display()
    ));
    info(&format!(
        "Run the load tests with: set -a && source {} && set +a && k6 run k6/scenarios/token_client_credentials.js",
        outcome.artifact_path.display()
    ));
}
