mod errors;

use checkout::{
    logging::init_logging, status::button_for, Checkout, CheckoutConfig, CheckoutConfigBuilder,
    CheckoutForm, PaymentDisplay,
};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, process::ExitCode};
use tokio::io::{AsyncBufReadExt, BufReader};
use types::{
    destination::{ResolvedDestination, ValidationState},
    errors::PayError,
    payment::Payment,
    amount::format_units,
    token::{catalog, find_token},
};

use crate::errors::CliError;

const ENV_API_KEY: &str = "PAY_API_KEY";

#[derive(Parser)]
#[command(name = "paylink")]
#[command(about = "Create hosted payment links for an address or ENS name.")]
#[command(version = "0.1.0")]
struct Cli {
    /// Config file, or a directory holding config.yaml
    #[arg(short, long, global = true)]
    config: Option<String>,
    /// Directory for the daily rolling log file
    #[arg(short, long, global = true)]
    log_file: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write a config file with default settings to the --output path
    Setup {
        #[arg(short, long)]
        output: Option<String>,
        #[arg(long)]
        api_base: Option<String>,
        #[arg(long)]
        rpc_url: Option<String>,
        #[arg(long)]
        token: Option<String>,
    },
    /// List the tokens a payment can settle in
    Tokens,
    /// Resolve an address or ENS name the way the checkout form does
    Resolve { input: String },
    /// Create a payment and print its checkout link
    Create {
        #[arg(short, long)]
        destination: String,
        #[arg(short, long)]
        amount: String,
        #[arg(short = 'k', long)]
        api_key: Option<String>,
        #[arg(short, long)]
        token: Option<String>,
        /// Read widget status strings from stdin until the payment settles
        #[arg(short, long)]
        watch: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Setup {
            output,
            api_base,
            rpc_url,
            token,
        } => {
            let path = setup_config(output.or(cli.config), api_base, rpc_url, token)?;
            println!("Config has been saved to {}", path.display());
        }
        Commands::Tokens => {
            for line in token_lines()? {
                println!("{}", line);
            }
        }
        Commands::Resolve { input } => {
            let checkout = load_checkout(cli.config, cli.log_file)?;
            let resolved = checkout.resolve_destination(&input).await;
            println!("{}", describe_destination(&resolved));
        }
        Commands::Create {
            destination,
            amount,
            api_key,
            token,
            watch,
        } => {
            let checkout = load_checkout(cli.config, cli.log_file)?;
            let api_key = match resolve_api_key(api_key, |key| dotenvy::var(key).ok()) {
                Some(key) => key,
                None => prompt_api_key()?,
            };

            let mut form = checkout.new_form()?;
            if let Some(symbol) = token {
                form.set_token(find_token(&symbol)?)?;
            }
            fill_form(&checkout, &mut form, &api_key, &destination, &amount).await?;

            let payment = checkout.submit(&mut form).await?;
            println!("Payment id: {}", payment.id);
            if let Some(amount) = amount_line(&form) {
                println!("Amount: {}", amount);
            }
            println!("Pay at: {}", payment.url);

            if watch {
                watch_status(&checkout, payment).await?;
            }
        }
    };

    Ok(())
}

fn load_checkout(config: Option<String>, log_file: Option<String>) -> Result<Checkout, CliError> {
    let config = CheckoutConfig::get_config(config)?;

    let log_dir = log_file.map(PathBuf::from).or_else(|| config.log_file_path.clone());
    init_logging(log_dir.as_deref())?;

    Ok(Checkout::from_config(config)?)
}

fn setup_config(
    output: Option<String>,
    api_base: Option<String>,
    rpc_url: Option<String>,
    token: Option<String>,
) -> Result<PathBuf, PayError> {
    let path = CheckoutConfig::get_config_file_path(output)?;

    let mut builder = CheckoutConfigBuilder::new().config_file_path(path.clone());
    if let Some(api_base) = api_base {
        builder = builder.api_base(api_base);
    }
    if let Some(rpc_url) = rpc_url {
        builder = builder.rpc_url(rpc_url);
    }
    if let Some(token) = token {
        builder = builder.default_token(token);
    }

    builder.build()?.save_to_file()?;
    Ok(path)
}

fn token_lines() -> Result<Vec<String>, PayError> {
    Ok(catalog()?
        .into_iter()
        .map(|token| {
            format!(
                "{:<18} {:<22} chain {:<9} {}",
                token.symbol, token.display_name, token.chain_id, token.token_address
            )
        })
        .collect())
}

fn describe_destination(resolved: &ResolvedDestination) -> String {
    match (resolved.state, resolved.address) {
        (ValidationState::Valid, Some(address)) => format!("valid {}", address),
        (ValidationState::Error, _) => "error: not a valid address or name".to_string(),
        _ => "pending".to_string(),
    }
}

fn amount_line(form: &CheckoutForm) -> Option<String> {
    let token = form.token();
    let amount = form.amount()?;
    Some(format!(
        "{} {}",
        format_units(amount, token.decimal_places),
        token.display_name
    ))
}

/// Flag first, then the environment. Empty values count as absent.
fn resolve_api_key<F>(flag: Option<String>, lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    flag.filter(|key| !key.is_empty())
        .or_else(|| lookup(ENV_API_KEY).filter(|key| !key.is_empty()))
}

fn prompt_api_key() -> Result<String, CliError> {
    Ok(rpassword::prompt_password("Enter API key: ")?)
}

async fn fill_form(
    checkout: &Checkout,
    form: &mut CheckoutForm,
    api_key: &str,
    destination: &str,
    amount: &str,
) -> Result<(), PayError> {
    form.set_api_key(api_key)?;
    form.set_quantity(amount)?;
    checkout.commit_destination(form, destination).await?;

    if form.destination().state == ValidationState::Error {
        return Err(PayError::Validation(format!(
            "{} is not a valid address or name",
            destination
        )));
    }
    Ok(())
}

async fn watch_status(checkout: &Checkout, payment: Payment) -> Result<(), CliError> {
    let feed = checkout.status_feed().clone();
    let mut display = PaymentDisplay::for_payment(payment.clone());

    let printer = feed.on_status_change(&payment.id, |status| {
        println!("{:?}: {}", status, button_for(&status).label);
    });

    let mut settled = false;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let status = feed.publish(&payment.id, line.trim());
        display.apply_status(status.clone());
        if status.is_terminal() {
            settled = true;
            break;
        }
    }

    // The printer only ends by itself once it has seen a terminal status.
    if settled {
        printer
            .await
            .map_err(|e| CliError::Watch(e.to_string()))?;
    } else {
        printer.abort();
    }
    println!("Final state: {:?}", display.state());
    Ok(())
}
