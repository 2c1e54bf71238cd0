//! Loresmith Engine - command-line entry point.
//!
//! ```text
//! loresmith-engine apply <campaign-id> <file|->   apply a GOD_MODE directive
//! loresmith-engine turn <campaign-id> <file|->    apply a narrator response's state block
//! loresmith-engine show <campaign-id>             print the stored state document
//! ```

use std::str::FromStr;

use anyhow::{bail, Context};
use loresmith_domain::CampaignId;
use loresmith_engine::infrastructure::ports::StateStore;
use loresmith_engine::infrastructure::settings::EngineSettings;
use loresmith_engine::use_cases::is_directive;
use loresmith_engine::App;
use tokio::io::AsyncReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: loresmith-engine <apply|turn|show> <campaign-id> [file|-]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root.
    load_dotenv_from_repo_root();

    // Initialize logging (stderr, so stdout carries only results)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loresmith_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, campaign) = match args.as_slice() {
        [command, campaign, ..] => (command.as_str(), campaign.as_str()),
        _ => bail!(USAGE),
    };
    let campaign_id = CampaignId::from_str(campaign)
        .with_context(|| format!("invalid campaign id: {campaign}"))?;

    let settings = EngineSettings::from_env();
    tracing::debug!(state_dir = %settings.state_dir.display(), "Loaded engine settings");
    let app = App::with_file_store(settings);

    match command {
        "apply" => {
            let text = read_input(args.get(2)).await?;
            let outcome = app
                .use_cases
                .state
                .apply_directive
                .execute(campaign_id, &text)
                .await?;
            println!("{}", outcome.summary_text());
        }
        "turn" => {
            let text = read_input(args.get(2)).await?;
            if is_directive(&text) {
                bail!("input is a GOD_MODE directive, use `apply` instead\n{USAGE}");
            }
            let (outcome, _) = app
                .use_cases
                .state
                .apply_turn
                .execute_response(campaign_id, &text)
                .await?;
            println!("{}", outcome.reconciliation.summary.to_text());
            let combat = &outcome.reconciliation.combat;
            if !combat.is_empty() {
                println!("Combat cleanup: {}", serde_json::to_string(combat)?);
            }
            for repair in &outcome.reconciliation.ledger_repairs {
                println!("Mission ledger: {}", serde_json::to_string(repair)?);
            }
        }
        "show" => {
            let state = app.store.load(campaign_id).await?.unwrap_or_default();
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        other => bail!("unknown command `{other}`\n{USAGE}"),
    }

    Ok(())
}

/// Read a file path, or stdin for `-` / no argument.
async fn read_input(source: Option<&String>) -> anyhow::Result<String> {
    match source.map(String::as_str) {
        None | Some("-") => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("failed to read stdin")?;
            Ok(text)
        }
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {path}")),
    }
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
