use std::{process::ExitCode, time::Duration};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use inquire::{CustomType, InquireError, Password, PasswordDisplayMode, Text};
use tracing::info;
use weatherapp_core::{
    Config, ResultState, StateWatcher, WeatherController, WeatherPayload, provider_from_config,
};

use crate::render::{TIMEOUT_MESSAGE, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherapp", version, about = "Current weather for any location")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the WeatherAPI.com API key and display settings.
    Configure,

    /// Show current weather for a location.
    Show {
        /// Location name, postcode, or "lat,lon".
        location: String,

        /// Seconds to wait before giving up on the display; defaults to config.
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Search locations one after another until an empty entry or Esc.
    Interactive,
}

/// How following a single fetch ended, from the display's point of view.
#[derive(Debug, Clone, PartialEq)]
enum Settled {
    State(ResultState<WeatherPayload>),
    TimedOut,
    Closed,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        match self.command {
            Command::Configure => configure().await,
            Command::Show { location, timeout } => show(location, timeout).await,
            Command::Interactive => interactive().await,
        }
    }
}

async fn configure() -> anyhow::Result<ExitCode> {
    let mut config = Config::load()?;
    let current_timeout = config.loading_timeout_secs;

    let (api_key, timeout) = tokio::task::spawn_blocking(move || {
        let api_key = Password::new("WeatherAPI.com API key:")
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()?;
        let timeout = CustomType::<u64>::new("Loading timeout in seconds:")
            .with_default(current_timeout)
            .prompt()?;
        Ok::<_, InquireError>((api_key, timeout))
    })
    .await
    .context("Configuration prompt panicked")??;

    config.set_api_key(api_key.trim().to_string());
    config.loading_timeout_secs = timeout;

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(ExitCode::SUCCESS)
}

async fn show(location: String, timeout: Option<u64>) -> anyhow::Result<ExitCode> {
    let config = Config::load()?;
    let loading_timeout = timeout.map(Duration::from_secs).unwrap_or(config.loading_timeout());

    let controller = controller_from(&config)?;
    let mut watcher = controller.subscribe();

    controller.fetch(location);
    let settled = follow(&mut watcher, loading_timeout).await;
    controller.shutdown();

    Ok(match settled {
        Settled::State(ResultState::Success(_)) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

async fn interactive() -> anyhow::Result<ExitCode> {
    let config = Config::load()?;
    let controller = controller_from(&config)?;
    let mut watcher = controller.subscribe();

    loop {
        let Some(query) = prompt_location().await? else {
            break;
        };
        controller.fetch(query);

        if follow(&mut watcher, config.loading_timeout()).await == Settled::Closed {
            break;
        }
        println!();
    }

    controller.shutdown();
    Ok(ExitCode::SUCCESS)
}

fn controller_from(config: &Config) -> anyhow::Result<WeatherController> {
    let provider = provider_from_config(config)?;
    info!(options = ?config.controller_options(), "starting controller");
    Ok(WeatherController::new(provider, config.controller_options()))
}

/// `None` when the user leaves the search box empty or presses Esc/Ctrl-C.
async fn prompt_location() -> anyhow::Result<Option<String>> {
    let answer = tokio::task::spawn_blocking(|| {
        Text::new("Search for any location:")
            .with_help_message("Enter an empty line or press Esc to quit")
            .prompt_skippable()
    })
    .await
    .context("Location prompt panicked")?;

    match answer {
        Ok(Some(query)) if !query.trim().is_empty() => Ok(Some(query)),
        Ok(_) | Err(InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Print every state the watcher reports until a terminal state arrives or
/// the loading display times out. Timing out leaves the fetch running.
async fn follow(watcher: &mut StateWatcher<WeatherPayload>, loading_timeout: Duration) -> Settled {
    let deadline = tokio::time::sleep(loading_timeout);
    tokio::pin!(deadline);

    let mut snapshot = watcher.latest();
    loop {
        if let Some(text) = render(&snapshot) {
            println!("{text}");
        }
        if let Some(state) = snapshot.filter(ResultState::is_terminal) {
            return Settled::State(state);
        }

        snapshot = tokio::select! {
            changed = watcher.changed() => match changed {
                Some(snapshot) => snapshot,
                None => return Settled::Closed,
            },
            _ = &mut deadline => {
                println!("{TIMEOUT_MESSAGE}");
                return Settled::TimedOut;
            }
        };
    }
}
