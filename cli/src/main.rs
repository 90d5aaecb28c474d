mod atomic_write;
mod config;
mod logging;
mod verify;

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::CommandFactory;
use clap::FromArgMatches;
use clap::Parser;
use keyprompt_tui::ApiKeyInput;
use keyprompt_tui::ApiKeyInputStyles;
use keyprompt_tui::ApiKeyPromptOutcome;
use keyprompt_tui::ArboardClipboard;
use keyprompt_tui::PasteConfig;
use keyprompt_tui::PasteCoordinator;

use crate::config::ConfigStore;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Prompt for a provider API key in the terminal and store it in the global config"
)]
struct Cli {
    /// Provider display name, e.g. `OpenAI`. Also selects `{PROVIDER}_API_KEY`.
    #[arg(long, env = "KEYPROMPT_PROVIDER", default_value = "OpenAI")]
    provider: String,

    /// Config file to read paste settings from and write the key to.
    ///
    /// Defaults to `~/.keyprompt/config.toml`.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// How recently focus must have been confirmed for a shortcut paste to query the clipboard.
    #[arg(long, value_name = "MS")]
    focus_freshness_ms: Option<u64>,

    /// Deadline for a single clipboard read.
    #[arg(long, value_name = "MS")]
    clipboard_timeout_ms: Option<u64>,

    /// Log file. Defaults to `~/.keyprompt/log/keyprompt.log`.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Log at debug level unless `KEYPROMPT_LOG` or `RUST_LOG` says otherwise.
    #[arg(short, long)]
    verbose: bool,

    /// Prompt even when a key for the provider is already stored in the config file.
    #[arg(long)]
    reconfigure: bool,
}

/// Where an already-available key for the provider comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ExistingKey {
    Env(String),
    Config,
}

/// Check `{PROVIDER}_API_KEY` and then the stored config key. The environment always wins; the
/// config file is skipped with `--reconfigure`. Key values are never returned.
fn find_existing_key(
    cli: &Cli,
    store: &ConfigStore,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Option<ExistingKey>> {
    let env_var = keyprompt_tui::provider_env_var(&cli.provider);
    if env(&env_var).is_some_and(|key| !key.trim().is_empty()) {
        return Ok(Some(ExistingKey::Env(env_var)));
    }
    if cli.reconfigure {
        return Ok(None);
    }
    let stored = store
        .provider_api_key(&config::provider_id(&cli.provider))
        .context("read stored api key")?;
    Ok(stored.map(|_| ExistingKey::Config))
}

impl Cli {
    fn apply_paste_overrides(&self, mut config: PasteConfig) -> PasteConfig {
        if let Some(ms) = self.focus_freshness_ms.filter(|ms| *ms > 0) {
            config.focus_freshness = Duration::from_millis(ms);
        }
        if let Some(ms) = self.clipboard_timeout_ms.filter(|ms| *ms > 0) {
            config.clipboard_timeout = Duration::from_millis(ms);
        }
        config
    }
}

fn parse_cli() -> Cli {
    let matches = Cli::command()
        .version(keyprompt_tui::KEYPROMPT_VERSION)
        .get_matches();
    Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit())
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = parse_cli();
    let home = dirs::home_dir();

    let log_path = cli
        .log_file
        .clone()
        .or_else(|| home.as_deref().map(logging::default_log_path));
    if let Some(log_path) = log_path
        && let Err(err) = logging::init_file_logging(&log_path, cli.verbose)
    {
        eprintln!("warning: failed to initialize logging: {err:#}");
    }

    let store = match &cli.config {
        Some(path) => ConfigStore::new(path.clone()),
        None => ConfigStore::new_default()?,
    };

    match find_existing_key(&cli, &store, |name| std::env::var(name).ok())? {
        Some(ExistingKey::Env(env_var)) => {
            tracing::info!(env_var = %env_var, "api key provided by environment; skipping prompt");
            println!("{env_var} is set; nothing to do.");
            return Ok(());
        }
        Some(ExistingKey::Config) => {
            let config_display = display_path(store.path(), home.as_deref());
            tracing::info!("api key already stored; skipping prompt");
            println!(
                "{} API key already stored in {config_display}; pass --reconfigure to replace it.",
                cli.provider
            );
            return Ok(());
        }
        None => {}
    }

    let paste_config = store.paste_config().unwrap_or_else(|err| {
        tracing::warn!("failed to read paste settings, using defaults: {err:#}");
        PasteConfig::default()
    });
    let paste_config = cli.apply_paste_overrides(paste_config);
    tracing::debug!(
        focus_freshness_ms = paste_config.focus_freshness.as_millis(),
        clipboard_timeout_ms = paste_config.clipboard_timeout.as_millis(),
        "starting api key prompt"
    );

    let coordinator = PasteCoordinator::new(Arc::new(ArboardClipboard), paste_config);
    let mut input = ApiKeyInput::new(coordinator);
    input.set_provider_name(cli.provider.clone());

    let config_display = display_path(store.path(), home.as_deref());
    let outcome = keyprompt_tui::run_api_key_prompt(
        &mut input,
        &ApiKeyInputStyles::default(),
        Some(&config_display),
        |key| async move { verify::looks_like_api_key(&key) },
    )
    .await
    .context("run api key prompt")?;

    match outcome {
        ApiKeyPromptOutcome::Verified(key) => {
            let provider_id = config::provider_id(&cli.provider);
            store
                .set_provider_api_key(&provider_id, &key)
                .with_context(|| format!("save api key to {config_display}"))?;
            tracing::info!(provider = %provider_id, "api key saved");
            println!("{} API key saved to {config_display}", cli.provider);
        }
        ApiKeyPromptOutcome::Cancelled => {
            tracing::info!("api key prompt cancelled");
        }
    }
    Ok(())
}

/// `~`-relative rendering of `path` when it lives under the home directory.
fn display_path(path: &Path, home: Option<&Path>) -> String {
    match home.and_then(|home| path.strip_prefix(home).ok()) {
        Some(relative) => Path::new("~").join(relative).display().to_string(),
        None => path.display().to_string(),
    }
}
