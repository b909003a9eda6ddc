//! Cleanup command.

use crate::cli::CleanupArgs;
use crate::orchestrator::CleanupRun;
use crate::output::{confirm, info, success, warning};
use crate::CliConfig;

/// Deletes the performance realm after confirmation.
pub async fn run_cleanup(args: CleanupArgs, config: CliConfig) -> crate::CliResult<()> {
    let realm = config.provider.perf_realm.clone();
    let backend = config.provider.kind.display_name();

    if !args.force
        && !confirm(&format!(
            "Delete realm '{realm}' and all of its clients and users on {backend}?"
        ))?
    {
        warning("Operation cancelled");
        return Ok(());
    }

    let mut run = CleanupRun::new(config)?;
    info(&format!(
        "Cleaning up realm '{realm}' on {} ({})",
        backend,
        run.context().config.provider.base_url
    ));
    run.run().await?;

    success(&format!("Realm '{realm}' removed"));
    Ok(())
}
