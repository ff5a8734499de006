use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod commands;
mod config;
mod session;

use app::App;
use commands::{AuthCommand, CategoryCommand, ConfigCommand, DishCommand};
use config::Config;

#[derive(Parser)]
#[command(name = "instaurant")]
#[command(version)]
#[command(about = "Manage a restaurant menu's categories and dishes", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign up, sign in and out
    Auth(AuthCommand),

    /// Manage menu categories
    Category(CategoryCommand),

    /// Manage the dishes of a category
    Dish(DishCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;
    init_tracing(&config, cli.verbose);

    match cli.command {
        Some(Commands::Auth(cmd)) => {
            let app = App::open(&config)?;
            cmd.run(&app, &config).await?;
        }
        Some(Commands::Category(cmd)) => {
            let app = App::open(&config)?;
            cmd.run(&app).await?;
        }
        Some(Commands::Dish(cmd)) => {
            let app = App::open(&config)?;
            cmd.run(&app).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

fn init_tracing(config: &Config, verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("instaurant=debug,instaurant_core=debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level.value))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
