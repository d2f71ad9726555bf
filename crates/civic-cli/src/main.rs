//! civic - command-line client for the civic issue service
//!
//! Every command runs through the issue coordinator, so what is printed is
//! exactly what the client-side views hold after the service answered.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use civic_core::{Category, ListParams, Priority, Status};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "civic")]
#[command(about = "Report and follow civic issues")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/civic/config.toml)
    #[arg(long, global = true, env = "CIVIC_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the public issue feed
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// List issues you reported
    Mine {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Show issue details
    Show {
        /// Issue ID
        id: String,
    },

    /// Report a new issue
    Create {
        /// Issue title
        title: String,

        /// What is wrong
        #[arg(short, long)]
        description: String,

        /// Category (water, electricity, road, garbage, flood, drainage)
        #[arg(short, long)]
        category: Category,

        /// Street address
        #[arg(long)]
        address: String,

        /// District
        #[arg(long)]
        district: String,

        /// Latitude
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        /// Longitude
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Priority (low, medium, high, critical)
        #[arg(short, long, default_value = "medium")]
        priority: Priority,
    },

    /// Edit an issue you reported
    Update {
        /// Issue ID
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete an issue you reported
    Delete {
        /// Issue ID
        id: String,
    },

    /// Confirm someone else's issue is genuine
    Verify {
        /// Issue ID
        id: String,

        /// Skip the local eligibility check and let the service decide
        #[arg(long)]
        force: bool,
    },

    /// Mark an issue you reported as solved
    Close {
        /// Issue ID
        id: String,
    },

    /// List issue categories known to the service
    Categories,

    /// List districts known to the service
    Districts,

    /// Show or initialise configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Print the config file location
    Path,
    /// Write a commented default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct PageArgs {
    /// Page number
    #[arg(long, default_value = "1")]
    page: u32,

    /// Page size (defaults to page_limit from config)
    #[arg(long)]
    limit: Option<u32>,
}

#[derive(Args)]
struct FilterArgs {
    #[command(flatten)]
    page: PageArgs,

    /// Filter by category
    #[arg(short, long)]
    category: Option<Category>,

    /// Filter by district
    #[arg(long)]
    district: Option<String>,

    /// Filter by status
    #[arg(short, long)]
    status: Option<Status>,

    /// Filter by priority
    #[arg(short, long)]
    priority: Option<Priority>,

    /// Only crisis-flagged issues
    #[arg(long)]
    crisis: bool,
}

impl PageArgs {
    fn params(&self) -> ListParams {
        ListParams {
            page: Some(self.page),
            limit: self.limit,
            ..ListParams::default()
        }
    }
}

impl FilterArgs {
    fn params(self) -> ListParams {
        ListParams {
            category: self.category,
            district: self.district,
            status: self.status,
            priority: self.priority,
            is_crisis: self.crisis.then_some(true),
            ..self.page.params()
        }
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let ctx = commands::Context::load(cli.config, cli.json)?;

    match cli.command {
        Commands::List { filter } => commands::list(&ctx, filter.params()).await,
        Commands::Mine { page } => commands::mine(&ctx, page.params()).await,
        Commands::Show { id } => commands::show(&ctx, &id).await,
        Commands::Create {
            title,
            description,
            category,
            address,
            district,
            lat,
            lon,
            priority,
        } => {
            let draft = civic_core::IssueDraft {
                title,
                description,
                category,
                location: civic_core::Location {
                    address,
                    district,
                    coordinates: vec![lat, lon],
                },
                priority,
            };
            commands::create(&ctx, draft).await
        }
        Commands::Update {
            id,
            title,
            description,
        } => {
            let patch = civic_core::IssuePatch {
                title,
                description,
                images: None,
            };
            commands::update(&ctx, &id, patch).await
        }
        Commands::Delete { id } => commands::delete(&ctx, &id).await,
        Commands::Verify { id, force } => commands::verify(&ctx, &id, force).await,
        Commands::Close { id } => commands::close(&ctx, &id).await,
        Commands::Categories => commands::categories(&ctx).await,
        Commands::Districts => commands::districts(&ctx).await,
        Commands::Config { command } => match command {
            Some(ConfigCommands::Show) | None => commands::config_show(&ctx),
            Some(ConfigCommands::Path) => commands::config_path(&ctx),
            Some(ConfigCommands::Init { force }) => commands::config_init(&ctx, force),
        },
    }
}
