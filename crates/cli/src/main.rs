use anyhow::Context;
use clap::Parser;
use portfel_core::auth::Credential;
use portfel_core::config::Settings;
use portfel_core::decode::{self, DecodeError};
use portfel_core::invest::{BrokerageApi, InvestClient};
use portfel_core::report::{self, PortfolioSummary};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// One exit code per fatal failure class.
const EXIT_USAGE: i32 = 1;
const EXIT_CREDENTIAL: i32 = 2;
const EXIT_ACCOUNTS: i32 = 3;
const EXIT_PORTFOLIO: i32 = 4;
const EXIT_WRITE: i32 = 5;

#[derive(Debug, Parser)]
#[command(name = "portfel", about = "Portfolio report generator for the invest API")]
struct Args {
    /// Output report file path (truncated if it already exists).
    output: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // No network calls happen before this check.
    let Some(output) = args.output else {
        eprintln!("Invalid filename");
        std::process::exit(EXIT_USAGE);
    };

    let settings = Settings::from_env();

    let credential = match Credential::load(&settings.token_path) {
        Ok(credential) => credential,
        Err(err) => fail(EXIT_CREDENTIAL, "credential", err),
    };

    // Client construction is part of setup, not the accounts stage.
    let client = match InvestClient::from_settings(&settings, &credential) {
        Ok(client) => client,
        Err(err) => fail(EXIT_CREDENTIAL, "client", err),
    };

    let account_id = match lookup_account(&client).await {
        Ok(account_id) => account_id,
        Err(err) => fail(EXIT_ACCOUNTS, "accounts", err),
    };
    tracing::info!(%account_id, "selected brokerage account");

    let (portfolio, summary) = match fetch_portfolio(&client, &account_id).await {
        Ok(pair) => pair,
        Err(err) => fail(EXIT_PORTFOLIO, "portfolio", err),
    };

    let mut file = match std::fs::File::create(&output)
        .with_context(|| format!("failed to open report file {}", output.display()))
    {
        Ok(file) => file,
        Err(err) => fail(EXIT_WRITE, "open", err),
    };

    match report::write_report(&client, &portfolio, &summary, &mut file).await {
        Ok(totals) => {
            tracing::info!(
                gained = totals.gained,
                lost = totals.lost,
                path = %output.display(),
                "report written"
            );
        }
        Err(err) => {
            // A malformed position is a portfolio problem; anything else
            // here is a write problem.
            let code = if err.downcast_ref::<DecodeError>().is_some() {
                EXIT_PORTFOLIO
            } else {
                EXIT_WRITE
            };
            fail(code, "report", err);
        }
    }
}

async fn lookup_account(client: &InvestClient) -> anyhow::Result<String> {
    let accounts = client.get_accounts().await?;
    let account_id = decode::select_account_id(&accounts)?;
    Ok(account_id)
}

async fn fetch_portfolio(
    client: &InvestClient,
    account_id: &str,
) -> anyhow::Result<(serde_json::Value, PortfolioSummary)> {
    let portfolio = client.get_portfolio(account_id).await?;
    let summary = PortfolioSummary::from_portfolio(&portfolio)?;
    Ok((portfolio, summary))
}

fn fail(code: i32, stage: &str, err: anyhow::Error) -> ! {
    tracing::error!(stage, error = %format!("{err:#}"), "portfolio report failed");
    std::process::exit(code);
}
