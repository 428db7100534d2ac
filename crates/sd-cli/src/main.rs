//! Operational CLI for the service-desk core.
//!
//! This binary is intentionally thin: env bootstrap, tracing setup, and a
//! handful of DB maintenance commands. The order workflow itself is driven
//! by whatever presentation layer consumes `sd-workflow`.

use anyhow::Result;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use sd_db::NewUser;
use sd_schemas::Role;

#[derive(Parser)]
#[command(name = "sd")]
#[command(about = "Service-desk operational CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Create one dispatcher and one master for bring-up
    SeedUsers {
        #[arg(long)]
        dispatcher: String,
        #[arg(long)]
        master: String,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    /// Connectivity + schema presence probe
    Status,

    /// Apply SQL migrations
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present; production injects env vars directly.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Db { cmd } => match cmd {
            DbCmd::Status => {
                let pool = sd_db::connect_from_env().await?;
                let st = sd_db::status(&pool).await?;
                println!("ok={} orders_table={}", st.ok, st.has_orders_table);
            }
            DbCmd::Migrate => {
                let pool = sd_db::connect_from_env().await?;
                sd_db::migrate(&pool).await?;
                println!("migrations applied");
            }
        },

        Commands::SeedUsers { dispatcher, master } => {
            let pool = sd_db::connect_from_env().await?;

            let disp = NewUser {
                user_id: Uuid::new_v4(),
                username: dispatcher,
                full_name: String::new(),
                role: Role::Dispatcher,
                active: true,
            };
            let mast = NewUser {
                user_id: Uuid::new_v4(),
                username: master,
                full_name: String::new(),
                role: Role::Master,
                active: true,
            };
            sd_db::insert_user(&pool, &disp).await?;
            sd_db::insert_user(&pool, &mast).await?;

            println!("dispatcher {} -> {}", disp.username, disp.user_id);
            println!("master     {} -> {}", mast.username, mast.user_id);
        }
    }

    Ok(())
}
