// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parley - chat-context assembler for a group-messaging bot.
//!
//! This is the binary entry point. It replays recorded transcripts through the
//! thread builder and exposes the token-budget helpers for inspection.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod replay;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use parley_config::ParleyConfig;
use parley_context::{TokenizerRegistry, normalize_model, resolve_budget};

/// Parley - chat-context assembler for a group-messaging bot.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Assemble the thread for a recorded JSON transcript and print the payload.
    Replay {
        /// Path to the transcript.
        path: PathBuf,
    },
    /// Print the token budget for a model.
    Limit {
        model: String,
    },
    /// Count the tokens of a text under a model's tokenizer.
    Count {
        model: String,
        text: String,
    },
    /// Print the validated effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match cli.config {
        Some(ref path) => parley_config::load_and_validate_path(path),
        None => parley_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            parley_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.bot.log_level);

    match cli.command {
        Some(Commands::Replay { path }) => run_replay(config, &path).await,
        Some(Commands::Limit { model }) => {
            println!("{} {}", normalize_model(&model), resolve_budget(&model, None));
        }
        Some(Commands::Count { model, text }) => run_count(&config, &model, &text),
        Some(Commands::Config) => print_config(&config),
        None => {
            println!("parley: use --help for available commands");
        }
    }
}

async fn run_replay(config: ParleyConfig, path: &std::path::Path) {
    let transcript = match replay::load_transcript(path).await {
        Ok(transcript) => transcript,
        Err(e) => fail(&e),
    };
    match replay::replay(config, transcript).await {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{json}"),
            Err(e) => fail(&e),
        },
        Err(e) => fail(&e),
    }
}

fn run_count(config: &ParleyConfig, model: &str, text: &str) {
    let registry = TokenizerRegistry::new();
    match registry.counter_for(model, config.context.image_token_cost) {
        Ok(counter) => println!("{}", counter.count(text)),
        Err(e) => fail(&e),
    }
}

fn print_config(config: &ParleyConfig) {
    match toml::to_string_pretty(config) {
        Ok(rendered) => print!("{rendered}"),
        Err(e) => fail(&e),
    }
}

fn fail(error: &dyn std::fmt::Display) -> ! {
    eprintln!("parley: {error}");
    std::process::exit(1);
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("parley={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = parley_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.bot.name, "parley");
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["parley", "count", "gpt-4", "hello world"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Count { ref model, ref text }) if model == "gpt-4" && text == "hello world"
        ));

        let cli = Cli::try_parse_from(["parley", "replay", "t.json", "--config", "p.toml"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("p.toml")));
        assert!(matches!(cli.command, Some(Commands::Replay { .. })));
    }

    #[test]
    fn effective_config_renders_as_toml() {
        let rendered = toml::to_string_pretty(&ParleyConfig::default()).unwrap();
        assert!(rendered.contains("[context]"));
        assert!(rendered.contains("backread_limit = 10"));
    }
}
