//! FreeTag CLI - Main entry point

use clap::{Args, Parser, Subcommand, ValueEnum};
use freetag_cli::commands::{self, DonationInput};
use freetag_cli::{AppConfig, AppContext};
use freetag_compliance::KycPolicy;
use freetag_core::Asset;
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::Instrument;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "freetag")]
#[command(about = "FreeTag - donations, conversion and KYC checks", long_about = None)]
struct Cli {
    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory path (overrides the config file)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Use built-in static rates instead of the backend
    #[arg(long)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show exchange rates quoted in a currency
    Rates {
        /// Quote currency
        #[arg(default_value = "ZAR")]
        target: Asset,
        /// Keep polling for this many seconds
        #[arg(long)]
        watch: Option<u64>,
    },

    /// Convert an amount between an asset and a currency
    Convert {
        /// Amount as typed (e.g. "100.50")
        amount: String,
        #[arg(long, default_value = "USDT")]
        from: Asset,
        #[arg(long, default_value = "ZAR")]
        to: Asset,
        /// Treat the amount as `to` currency and compute the `from` asset received
        #[arg(long)]
        inverse: bool,
    },

    /// Check whether an amount needs identity verification
    Kyc {
        amount: Decimal,
        #[arg(default_value = "ZAR")]
        asset: Asset,
        #[arg(long, value_enum, default_value_t = PolicyArg::Advisory)]
        policy: PolicyArg,
    },

    /// Store a bearer token
    Login {
        token: String,
        /// Account type chosen at login (user, beneficiary, philanthropist)
        #[arg(long)]
        role: Option<String>,
    },

    /// Show the current session and landing route
    Whoami,

    /// Clear the session
    Logout,

    /// Extract a tag code from a QR payload
    Scan { payload: String },

    /// Donate to a tag or organization
    Donate {
        #[command(flatten)]
        form: DonationArgs,
        /// Only show the quote
        #[arg(long)]
        preview: bool,
    },

    /// Buy USDT with ZAR
    Buy { amount_zar: Decimal },

    /// Sell USDT for ZAR
    Sell { amount_usdt: Decimal },

    /// Manage the saved donation draft
    Draft {
        #[command(subcommand)]
        action: DraftAction,
    },
}

#[derive(Subcommand)]
enum DraftAction {
    /// Show the saved draft
    Show,
    /// Save a draft without submitting
    Save {
        #[command(flatten)]
        form: DonationArgs,
    },
    /// Discard the saved draft
    Clear,
}

#[derive(Args)]
struct DonationArgs {
    /// Tag code or organization
    #[arg(long)]
    tag: String,
    #[arg(long)]
    amount: String,
    #[arg(long, default_value = "ZAR")]
    currency: Asset,
    /// Pay with this crypto asset instead of a bank transfer
    #[arg(long)]
    crypto: Option<Asset>,
    #[arg(long, default_value = "ZA")]
    country: String,
    /// Accept the donation terms
    #[arg(long)]
    accept_terms: bool,
    #[arg(long)]
    receipt_name: Option<String>,
    #[arg(long)]
    receipt_email: Option<String>,
}

impl From<DonationArgs> for DonationInput {
    fn from(args: DonationArgs) -> Self {
        DonationInput {
            tag: args.tag,
            amount: args.amount,
            currency: args.currency,
            crypto: args.crypto,
            country: args.country,
            accept_terms: args.accept_terms,
            receipt_name: args.receipt_name,
            receipt_email: args.receipt_email,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Advisory,
    HardBlock,
}

impl From<PolicyArg> for KycPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Advisory => KycPolicy::Advisory,
            PolicyArg::HardBlock => KycPolicy::HardBlock,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(data) = cli.data {
        config.data_dir = data;
    }

    let ctx = AppContext::new(config, cli.offline)?;

    let correlation_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!("command", correlation_id = %correlation_id);

    run(&ctx, cli.command).instrument(span).await
}

async fn run(ctx: &AppContext, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Rates { target, watch } => commands::rates(ctx, &target, watch).await,
        Commands::Convert {
            amount,
            from,
            to,
            inverse,
        } => commands::convert(ctx, &amount, &from, &to, inverse).await,
        Commands::Kyc {
            amount,
            asset,
            policy,
        } => commands::kyc(ctx, amount, &asset, policy.into()).await,
        Commands::Login { token, role } => commands::login(ctx, &token, role.as_deref()).await,
        Commands::Whoami => commands::whoami(ctx).await,
        Commands::Logout => commands::logout(ctx).await,
        Commands::Scan { payload } => commands::scan(&payload),
        Commands::Donate { form, preview } => {
            let form = DonationInput::from(form).into_form();
            commands::donate(ctx, form, preview).await
        }
        Commands::Buy { amount_zar } => commands::buy(ctx, amount_zar).await,
        Commands::Sell { amount_usdt } => commands::sell(ctx, amount_usdt).await,
        Commands::Draft { action } => match action {
            DraftAction::Show => commands::draft_show(ctx),
            DraftAction::Save { form } => {
                commands::draft_save(ctx, DonationInput::from(form).into_form())
            }
            DraftAction::Clear => commands::draft_clear(ctx),
        },
    }
}
