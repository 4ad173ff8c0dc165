//! Ambient: CLI harness (§4.N).
//!
//! A thin `clap`-based binary wiring `Orchestrator::mock` — the in-memory
//! provider, rule-based classifier, and fixture tools — and driving
//! `handle_turn` once per `--message`, or once per stdin line when no
//! message is given. Every external collaborator is scoped out by §1, so
//! this is the closest thing to an end-to-end smoke test the repo ships.

use std::io::BufRead;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use convo_domain::{Channel, Language, TurnInput};
use convo_orchestrator::Orchestrator;

/// Drive the turn orchestrator against an in-memory mock stack.
#[derive(Debug, Parser)]
#[command(name = "convo", version, about)]
struct Cli {
    /// Single message to send; reads lines from stdin when omitted.
    #[arg(long)]
    message: Option<String>,

    /// Business id to attribute the turn to.
    #[arg(long, default_value = "biz1")]
    business_id: String,

    /// Channel user id the turn is attributed to (drives session continuity).
    #[arg(long, default_value = "cli-user")]
    channel_user_id: String,

    /// Channel the turn arrives on.
    #[arg(long, value_enum, default_value = "whatsapp")]
    channel: CliChannel,

    /// Reply language.
    #[arg(long, value_enum, default_value = "en")]
    language: CliLanguage,

    /// Run without persisting session/transcript state.
    #[arg(long)]
    dry_run: bool,

    /// Directory to store session/transcript state under.
    #[arg(long, default_value = "./convo-state")]
    state_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliChannel {
    Phone,
    ChatWidget,
    Whatsapp,
    Email,
}

impl From<CliChannel> for Channel {
    fn from(c: CliChannel) -> Self {
        match c {
            CliChannel::Phone => Channel::Phone,
            CliChannel::ChatWidget => Channel::ChatWidget,
            CliChannel::Whatsapp => Channel::Whatsapp,
            CliChannel::Email => Channel::Email,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliLanguage {
    Tr,
    En,
}

impl From<CliLanguage> for Language {
    fn from(l: CliLanguage) -> Self {
        match l {
            CliLanguage::Tr => Language::Tr,
            CliLanguage::En => Language::En,
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,convo_orchestrator=debug")))
        .json()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let orchestrator = Orchestrator::mock(&cli.state_dir)?;

    let mut message_id_counter = 0u64;
    let mut next_message_id = || {
        message_id_counter += 1;
        format!("cli-{message_id_counter}")
    };

    if let Some(message) = &cli.message {
        run_one_turn(&orchestrator, &cli, message, next_message_id()).await?;
        return Ok(());
    }

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        run_one_turn(&orchestrator, &cli, &line, next_message_id()).await?;
    }

    Ok(())
}

async fn run_one_turn(orchestrator: &Orchestrator, cli: &Cli, text: &str, message_id: String) -> anyhow::Result<()> {
    let input = TurnInput {
        channel: cli.channel.into(),
        business_id: cli.business_id.clone(),
        channel_user_id: cli.channel_user_id.clone(),
        session_id: None,
        message_id,
        text: text.to_string(),
        language: cli.language.into(),
        timezone: "UTC".to_string(),
        metadata: Default::default(),
        dry_run: cli.dry_run,
    };

    let result = convo_orchestrator::handle_turn(orchestrator, input).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
