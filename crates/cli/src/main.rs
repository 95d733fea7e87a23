//! ZoneWatch CLI — the main entry point.
//!
//! Commands:
//! - `serve`    — Start the HTTP gateway and chat page
//! - `init`     — Build every zone index and report cache state
//! - `ask`      — One question through the dispatch agent
//! - `chat`     — Interactive chat session
//! - `upload`   — Copy zone reports into the data directory
//! - `listen`   — Record (or read) audio and transcribe it
//! - `speak`    — Synthesize speech to MP3 and play it
//! - `announce` — Draft a targeted announcement
//! - `predict`  — Predict incidents from zone densities
//! - `doctor`   — Diagnose configuration and connectivity

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "zonewatch",
    about = "ZoneWatch — zone safety chat over crowd reports",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Build zone indexes before accepting requests
        #[arg(long)]
        init: bool,
    },

    /// Build (or load cached) indexes for every zone report
    Init,

    /// Ask a single question
    Ask {
        question: String,

        /// Print the reasoning trace
        #[arg(long)]
        trace: bool,
    },

    /// Interactive chat with the dispatch agent
    Chat,

    /// Copy zone report files (`<zone>.txt`) into the data directory
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Transcribe speech from the microphone or a WAV file
    Listen {
        /// Transcribe this file instead of recording
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Recording length in seconds
        #[arg(short, long)]
        seconds: Option<u64>,
    },

    /// Synthesize speech and play it
    Speak {
        /// Text to speak (defaults to the zone classifier introduction)
        #[arg(short, long)]
        text: Option<String>,

        /// Where to write the MP3
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only write the file
        #[arg(long)]
        no_play: bool,
    },

    /// Draft a targeted announcement
    Announce {
        #[arg(long)]
        zone: String,

        /// Audience, e.g. "families with children"
        #[arg(long = "group")]
        user_group: String,

        /// What the audience needs right now
        #[arg(long = "needs")]
        real_time_needs: String,
    },

    /// Predict incidents from current zone densities
    Predict {
        /// Zone density as ZONE=VALUE, VALUE between 0 and 1 (repeatable)
        #[arg(short, long = "density", required = true)]
        densities: Vec<String>,

        /// Historical notes passed to the model
        #[arg(long, default_value = "")]
        history: String,
    },

    /// Diagnose configuration, credentials and provider reachability
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port, init } => commands::serve::run(port, init).await?,
        Commands::Init => commands::init::run().await?,
        Commands::Ask { question, trace } => commands::ask::run(&question, trace).await?,
        Commands::Chat => commands::chat::run().await?,
        Commands::Upload { files } => commands::upload::run(&files).await?,
        Commands::Listen { file, seconds } => commands::listen::run(file, seconds).await?,
        Commands::Speak { text, output, no_play } => {
            commands::speak::run(text, output, no_play).await?
        }
        Commands::Announce {
            zone,
            user_group,
            real_time_needs,
        } => commands::announce::run(zone, user_group, real_time_needs).await?,
        Commands::Predict { densities, history } => {
            commands::predict::run(&densities, history).await?
        }
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listen_only_transcribes() {
        let cli = Cli::try_parse_from(["zonewatch", "listen", "--file", "q.wav"]).unwrap();
        assert!(matches!(cli.command, Commands::Listen { file: Some(_), seconds: None }));
        assert!(Cli::try_parse_from(["zonewatch", "listen", "--ask"]).is_err());
    }

    #[test]
    fn predict_needs_a_density() {
        assert!(Cli::try_parse_from(["zonewatch", "predict"]).is_err());
        let cli = Cli::try_parse_from(["zonewatch", "predict", "-d", "north=0.4"]).unwrap();
        assert!(matches!(cli.command, Commands::Predict { ref densities, .. } if densities == &["north=0.4"]));
    }
}
