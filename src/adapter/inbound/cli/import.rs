//! Handler for the `import` command.

use crate::adapter::inbound::cli::command::ImportArgs;
use crate::adapter::inbound::cli::output;
use crate::adapter::inbound::cli::run::Services;
use crate::domain::UserId;
use crate::error::Result;

/// Execute `import`.
pub async fn execute(services: &Services, owner: UserId, args: ImportArgs) -> Result<()> {
    let summary = services.importer.import_file(owner, &args.file).await?;

    output::payload("import", &summary, |summary| {
        output::success(&format!("imported {}", args.file.display()));
        output::field("Stock trades", summary.stock_trades);
        output::field("Option trades", summary.option_trades);
        output::field("Skipped rows", summary.skipped);
    });
    // the JSON payload already carries the skipped count
    if summary.skipped > 0 && !output::is_json() {
        output::warning(&format!(
            "{} rows could not be interpreted and were skipped",
            summary.skipped
        ));
    }
    Ok(())
}
