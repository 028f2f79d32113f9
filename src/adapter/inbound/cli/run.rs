//! CLI dispatch: wires the parsed command to services over the SQLite
//! store.

use std::path::Path;
use std::sync::Arc;

use crate::adapter::inbound::cli::command::{Cli, Commands};
use crate::adapter::inbound::cli::{config, history, import, ledger, output, positions, stats};
use crate::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations};
use crate::adapter::outbound::SqliteLedgerStore;
use crate::config::Config;
use crate::domain::UserId;
use crate::error::Result;
use crate::service::{
    CloseResolver, ImportReconciler, LedgerEditor, LotMerger, MutationLocks, OptionOpener,
    StatsService,
};

/// Services wired over one store, shared by the command handlers.
pub struct Services {
    pub store: Arc<SqliteLedgerStore>,
    pub merger: LotMerger<SqliteLedgerStore>,
    pub opener: OptionOpener<SqliteLedgerStore>,
    pub resolver: CloseResolver<SqliteLedgerStore>,
    pub editor: LedgerEditor<SqliteLedgerStore>,
    pub importer: ImportReconciler<SqliteLedgerStore>,
    pub stats: StatsService<SqliteLedgerStore>,
}

impl Services {
    fn new(store: Arc<SqliteLedgerStore>) -> Self {
        let locks = Arc::new(MutationLocks::new());
        Self {
            merger: LotMerger::new(Arc::clone(&store), Arc::clone(&locks)),
            opener: OptionOpener::new(Arc::clone(&store), Arc::clone(&locks)),
            resolver: CloseResolver::new(Arc::clone(&store), Arc::clone(&locks)),
            editor: LedgerEditor::new(Arc::clone(&store), Arc::clone(&locks)),
            importer: ImportReconciler::new(Arc::clone(&store), Arc::clone(&locks)),
            stats: StatsService::new(Arc::clone(&store)),
            store,
        }
    }
}

/// Execute the parsed CLI invocation.
pub async fn run(cli: Cli) -> Result<()> {
    // Config management never touches the database.
    if let Commands::Config(command) = &cli.command {
        return config::execute(&cli.config, command);
    }

    let config = Config::load_or_default(&cli.config)?;
    config.init_logging();

    let db_path = cli
        .db
        .clone()
        .unwrap_or_else(|| config.database.path.clone());
    let services = open_services(&db_path)?;
    let owner = UserId::new(cli.user);

    match cli.command {
        Commands::Buy(args) => ledger::execute_buy(&services, owner, args).await,
        Commands::Sell(args) => ledger::execute_sell(&services, owner, args).await,
        Commands::Open(args) => ledger::execute_open(&services, owner, args).await,
        Commands::Close(args) => ledger::execute_close(&services, owner, args).await,
        Commands::Positions(command) => positions::execute(&services, owner, command).await,
        Commands::History(command) => history::execute(&services, owner, command).await,
        Commands::Import(args) => import::execute(&services, owner, args).await,
        Commands::Stats => stats::execute(&services, owner).await,
        Commands::Config(_) => unreachable!("handled above"),
    }
}

fn open_services(db_path: &Path) -> Result<Services> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let pool = create_pool(&db_path.to_string_lossy())?;
    run_migrations(&pool)?;
    let store = Arc::new(SqliteLedgerStore::new(pool));
    Ok(Services::new(store))
}

/// Today's date in the local timezone, the default for trade dates.
pub fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

/// Report an error the way the CLI surfaces failures, and return the exit
/// code.
pub fn report_error(error: &crate::error::Error) -> i32 {
    output::error(&error.to_string());
    1
}
