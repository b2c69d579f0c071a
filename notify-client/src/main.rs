use anyhow::Result;
use bridge::feed::SseFeed;
use bridge::{NotificationBridge, Session};
use clap::{Parser, Subcommand};
use colored::*;
use std::sync::Arc;

mod api_client;
mod output;
mod scenarios;
mod terminal;

use api_client::ApiClient;
use output::print_test_summary;
use terminal::TerminalSurface;

#[derive(Parser)]
#[command(name = "notify-client")]
#[command(about = "Realtime notification client")]
struct Cli {
    /// Base URL of the backend (e.g., http://localhost:4000)
    #[arg(long, env = "NOTIFY_BASE_URL", default_value = "http://localhost:4000")]
    base_url: String,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Mount a bridge and print alerts until Ctrl-C
    Listen {
        /// Signed-in user. Without one the bridge stays inactive
        #[arg(long)]
        user_id: Option<String>,
    },
    /// Insert one notification
    Send {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        body: String,
    },
    /// Run end-to-end checks against the backend
    Scenario {
        /// Recipient for test inserts. A random id is used when omitted
        #[arg(long)]
        user_id: Option<String>,

        #[arg(long, value_enum, default_value = "all")]
        scenario: ScenarioChoice,
    },
}

#[derive(clap::ValueEnum, Clone)]
enum ScenarioChoice {
    /// Mount without a session
    NoSession,
    /// Two inserts, two ordered alerts, silence after unmount
    DeliveryOrder,
    /// Run all scenarios
    All,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }

    let api_client = ApiClient::new(reqwest::Client::new(), cli.base_url.clone());

    match cli.command {
        Command::Listen { user_id } => listen(&api_client, user_id).await,
        Command::Send {
            user_id,
            title,
            body,
        } => {
            let notification = api_client
                .create_notification(&user_id, &title, &body)
                .await?;
            println!(
                "{} Notification created (ID: {})",
                "✓".green(),
                notification["id"].as_str().unwrap_or("unknown")
            );
            Ok(())
        }
        Command::Scenario { user_id, scenario } => {
            let user_id = user_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            run_scenarios(&api_client, &user_id, scenario).await
        }
    }
}

async fn listen(api_client: &ApiClient, user_id: Option<String>) -> Result<()> {
    let bridge = NotificationBridge::new(
        Arc::new(SseFeed::new(api_client.base_url())),
        Arc::new(TerminalSurface::new()),
    );

    let session = user_id.map(Session::new);
    let mut handle = bridge.mount(session);

    let state = handle.settled().await;
    println!("{} Bridge {:?}. Press Ctrl-C to stop", "→".blue(), state);

    tokio::signal::ctrl_c().await?;

    handle.unmount().await?;
    println!("{} Unmounted", "✓".green());
    Ok(())
}

async fn run_scenarios(
    api_client: &ApiClient,
    user_id: &str,
    scenario: ScenarioChoice,
) -> Result<()> {
    println!("{}", "=== SETUP PHASE ===".bright_white().bold());

    println!("{} Checking backend at {}...", "→".blue(), api_client.base_url());
    api_client.health().await?;
    println!("{} Backend healthy", "✓".green());

    println!("\n{}", "=== TEST PHASE ===".bright_white().bold());

    let mut results = Vec::new();

    match scenario {
        ScenarioChoice::NoSession => {
            results.push(scenarios::test_no_session(api_client).await?);
        }
        ScenarioChoice::DeliveryOrder => {
            results.push(scenarios::test_delivery_order(api_client, user_id).await?);
        }
        ScenarioChoice::All => {
            results.push(scenarios::test_no_session(api_client).await?);
            results.push(scenarios::test_delivery_order(api_client, user_id).await?);
        }
    }

    print_test_summary(&results);

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}
