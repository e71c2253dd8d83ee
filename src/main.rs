mod assistant;
mod cli;
mod config;
mod errors;
mod gemini_client;
mod portfolio;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use eyre::Result;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::cli::chat::widget::ChatWidget;
use crate::cli::chat::{print_projects, ChatContext};
use crate::config::{AssistantConfig, Overrides};
use crate::gemini_client::GeminiClient;
use crate::portfolio::PortfolioContext;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Gemini API key (defaults to GEMINI_API_KEY, then API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Gemini model to chat with
    #[arg(long, global = true)]
    model: Option<String>,

    /// Portfolio JSON file to use instead of the bundled one
    #[arg(short, long, global = true)]
    portfolio: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the assistant and chat interactively
    Chat,
    /// Ask a single question and print the answer
    Ask {
        /// Question to send to the assistant
        #[arg(short, long)]
        input: String,
    },
    /// Print the portfolio context the assistant is grounded in
    Context,
    /// List the showcased projects
    Projects,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = AssistantConfig::resolve(Overrides {
        api_key: cli.api_key,
        model: cli.model,
        portfolio: cli.portfolio,
    });
    debug!("Resolved configuration: {:?}", config);

    let portfolio = Arc::new(config.load_portfolio()?);
    let context = Arc::new(PortfolioContext::build(&portfolio));

    let input = match cli.command.unwrap_or(Commands::Chat) {
        Commands::Context => {
            println!("{}", context);
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Projects => {
            print_projects(&mut io::stdout(), &portfolio)?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Ask { input } => Some(input),
        Commands::Chat => None,
    };

    info!("Starting portfolio assistant for {}", context.subject());

    let service = GeminiClient::new(config.model.clone(), config.base_url.clone());
    let widget = ChatWidget::new(&context, config.api_key.as_deref(), &service);

    let interactive = input.is_none();
    let mut chat_context = ChatContext::new(
        Box::new(io::stdout()),
        input,
        interactive,
        widget,
        portfolio,
        context,
    )?;
    chat_context.run().await
}
