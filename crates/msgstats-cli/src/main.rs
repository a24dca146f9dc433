mod accounts;
mod stats;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::accounts::AccountsCommands;

#[derive(Debug, Parser)]
#[command(name = "msgstats-cli")]
#[command(about = "msgstats command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Run one refresh cycle over every active account
    Refresh,
    /// Print the current stats snapshot of every active account
    Stats,
    /// Manage registered accounts
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = msgstats_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let pool_config = msgstats_db::PoolConfig::from_app_config(&config);
    let pool = msgstats_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Migrate => {
            let applied = msgstats_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Refresh => stats::run_refresh(&pool, &config).await?,
        Commands::Stats => stats::run_stats(&pool).await?,
        Commands::Accounts { command } => match command {
            AccountsCommands::List => accounts::run_accounts_list(&pool).await?,
            AccountsCommands::Add {
                provider_type,
                name,
                credentials,
            } => accounts::run_accounts_add(&pool, &provider_type, &name, &credentials).await?,
            AccountsCommands::Deactivate { id } => {
                accounts::run_accounts_deactivate(&pool, id).await?;
            }
            AccountsCommands::Import { file } => {
                let path = file.unwrap_or_else(|| config.accounts_path.clone());
                accounts::run_accounts_import(&pool, &path).await?;
            }
        },
    }

    Ok(())
}

/// Format an optional timestamp for display, returning a dash when `None`.
fn fmt_time(value: Option<chrono::DateTime<chrono::Utc>>) -> String {
    value.map_or_else(
        || "\u{2014}".to_string(),
        |t| t.format("%Y-%m-%d %H:%M").to_string(),
    )
}
