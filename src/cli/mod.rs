mod args;
pub mod render;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, ConfigOverrides, DataSourceMode};
use crate::services::fixtures::MOCK_CUSTOMER_ID;
use crate::services::{Aggregator, NessieClient, Transport};

pub use args::{CreateAccountArgs, CreateCustomerArgs, LocateArgs, SendArgs};

/// Account balances, cards and transactions from the Nessie banking API
#[derive(Parser)]
#[command(name = "nessie-wallet")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Data source
    #[arg(long, global = true, value_enum, env = "NESSIE_MODE")]
    mode: Option<DataSourceMode>,

    /// Nessie API key (live mode)
    #[arg(long, global = true, env = "NESSIE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Nessie base URL
    #[arg(long, global = true, env = "NESSIE_BASE_URL")]
    base_url: Option<String>,

    /// Config file (default: ~/.nessie-wallet/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show accounts, cards and transactions (default)
    Show {
        /// Customer ID (live mode)
        #[arg(long, env = "NESSIE_CUSTOMER_ID")]
        customer: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show totals only
    Summary {
        /// Customer ID (live mode)
        #[arg(long, env = "NESSIE_CUSTOMER_ID")]
        customer: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List customers (live mode)
    Customers {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List ATMs, optionally within --rad miles of --lat/--lng (live mode)
    Atms(LocateArgs),

    /// List bank branches, optionally within --rad miles of --lat/--lng (live mode)
    Branches(LocateArgs),

    /// Create a customer (live mode)
    CreateCustomer(CreateCustomerArgs),

    /// Open an account for a customer (live mode)
    CreateAccount(CreateAccountArgs),

    /// Send money to another account (live mode)
    Send(SendArgs),
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        init_tracing(self.verbose);

        let config = self.load_config()?;
        let aggregator = Aggregator::from_config(&config)?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime")?;

        let command = self.command.unwrap_or(Commands::Show {
            customer: None,
            json: false,
        });
        let mut stdout = std::io::stdout().lock();
        runtime.block_on(execute(command, &aggregator, &mut stdout))
    }

    fn load_config(&self) -> anyhow::Result<AppConfig> {
        let config = AppConfig::load(self.config.as_deref()).context("Failed to load config")?;
        Ok(config.with_overrides(ConfigOverrides {
            mode: self.mode,
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
        }))
    }
}

/// Log to stderr so `--json` output stays clean. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("nessie_wallet={}", level)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn customer_for(mode: DataSourceMode, customer: Option<String>) -> anyhow::Result<String> {
    match mode {
        DataSourceMode::Mock => Ok(customer.unwrap_or_else(|| MOCK_CUSTOMER_ID.to_string())),
        DataSourceMode::Live => {
            customer.context("live mode needs --customer (or NESSIE_CUSTOMER_ID)")
        }
    }
}

fn live_client<T: Transport>(aggregator: &Aggregator<T>) -> anyhow::Result<&NessieClient<T>> {
    aggregator
        .client()
        .context("this command needs --mode live")
}

fn print_json<W: Write, S: serde::Serialize>(out: &mut W, value: &S) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

async fn execute<T: Transport, W: Write>(
    command: Commands,
    aggregator: &Aggregator<T>,
    out: &mut W,
) -> anyhow::Result<()> {
    match command {
        Commands::Show { customer, json } => {
            let customer = customer_for(aggregator.mode(), customer)?;
            let snapshot = aggregator.refresh(&customer).await?;
            if json {
                print_json(out, &*snapshot)
            } else {
                write!(out, "{}", render::render_snapshot(&snapshot))?;
                Ok(())
            }
        }
        Commands::Summary { customer, json } => {
            let customer = customer_for(aggregator.mode(), customer)?;
            let summary = aggregator.refresh(&customer).await?.summary();
            if json {
                print_json(out, &summary)
            } else {
                write!(out, "{}", render::render_summary(&summary))?;
                Ok(())
            }
        }
        Commands::Customers { json } => {
            let customers = live_client(aggregator)?.list_customers().await?;
            if json {
                print_json(out, &customers)
            } else {
                write!(out, "{}", render::render_customers(&customers))?;
                Ok(())
            }
        }
        Commands::Atms(args) => {
            let atms = live_client(aggregator)?.list_atms(args.filter()?).await?;
            if args.json {
                print_json(out, &atms)
            } else {
                write!(out, "{}", render::render_atms(&atms))?;
                Ok(())
            }
        }
        Commands::Branches(args) => {
            let branches = live_client(aggregator)?
                .list_branches(args.filter()?)
                .await?;
            if args.json {
                print_json(out, &branches)
            } else {
                write!(out, "{}", render::render_branches(&branches))?;
                Ok(())
            }
        }
        Commands::CreateCustomer(args) => {
            let created = live_client(aggregator)?
                .create_customer(&args.into())
                .await?;
            writeln!(out, "Created customer {} ({})", created.full_name(), created.id)?;
            Ok(())
        }
        Commands::CreateAccount(args) => {
            let created = live_client(aggregator)?
                .create_account(&args.customer, &args.to_request())
                .await?;
            writeln!(out, "Created account {} ({})", created.nickname, created.id)?;
            Ok(())
        }
        Commands::Send(args) => {
            let created = aggregator.quick_send(&args.into()).await?;
            writeln!(
                out,
                "Sent {} to {} ({}, {})",
                render::format_amount(created.amount, crate::types::DEFAULT_CURRENCY),
                created.payee_id.as_deref().unwrap_or("?"),
                created.id,
                created.status.as_str()
            )?;
            Ok(())
        }
    }
}
