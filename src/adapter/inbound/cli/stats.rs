//! Handler for the `stats` command.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::adapter::inbound::cli::output;
use crate::adapter::inbound::cli::run::Services;
use crate::domain::{PortfolioStats, UserId};
use crate::error::Result;

#[derive(Serialize)]
struct StatsView {
    #[serde(flatten)]
    stats: PortfolioStats,
    win_rate: Decimal,
    profit_factor: Decimal,
}

/// Execute `stats`.
pub async fn execute(services: &Services, owner: UserId) -> Result<()> {
    let stats = services.stats.summarize(owner).await?;
    let view = StatsView {
        win_rate: stats.win_rate(),
        profit_factor: stats.profit_factor(),
        stats,
    };

    output::payload("stats", &view, |view| {
        output::section("Open positions");
        output::field("Stock lots", view.stats.stock_count);
        output::field("Options", view.stats.option_count);

        output::section("Realized");
        output::field("Closed", view.stats.closed_count);
        output::field("Total P/L", view.stats.total_pl);
        output::field("Gains", view.stats.total_gains);
        output::field("Losses", view.stats.total_losses);
        output::field("Wins", view.stats.win_count);
        output::field("Losses (#)", view.stats.loss_count);
        output::field("Win rate", format!("{:.1}%", view.win_rate));
        output::field("Profit factor", format!("{:.2}", view.profit_factor));
    });
    Ok(())
}
