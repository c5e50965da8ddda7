use clap::{Parser, Subcommand, ValueEnum};
use reelmark_common::VideoKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reelmark")]
#[command(author, version, about = "Video streaming backend with per-profile watch progress")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create a viewer profile
    CreateProfile {
        /// Display name
        name: String,
    },

    /// Issue a session token for a profile
    IssueToken {
        /// Profile ID
        profile_id: String,
    },

    /// Record an uploaded video file
    RegisterVideo {
        #[arg(long, value_enum)]
        kind: KindArg,

        /// Path of the file on disk
        #[arg(long)]
        path: PathBuf,

        /// Duration in milliseconds
        #[arg(long)]
        duration_ms: u64,

        /// Owning profile ID (defaults to the default profile)
        #[arg(long)]
        owner: Option<String>,

        /// Title (defaults to the file name)
        #[arg(long)]
        title: Option<String>,
    },

    /// Create an empty series
    CreateSeries {
        title: String,

        /// Owning profile ID (defaults to the default profile)
        #[arg(long)]
        owner: Option<String>,
    },

    /// Append an episode video to a series
    AddEpisode {
        #[arg(long)]
        series: String,

        /// Episode video ID
        #[arg(long)]
        video: String,

        #[arg(long)]
        season: u32,

        #[arg(long)]
        episode: u32,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Movie,
    Episode,
}

impl From<KindArg> for VideoKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Movie => VideoKind::Movie,
            KindArg::Episode => VideoKind::Episode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_register_video() {
        let cli = Cli::try_parse_from([
            "reelmark",
            "register-video",
            "--kind",
            "episode",
            "--path",
            "/media/s01e01.mp4",
            "--duration-ms",
            "1200000",
        ])
        .unwrap();
        match cli.command {
            Commands::RegisterVideo {
                kind, duration_ms, ..
            } => {
                assert_eq!(VideoKind::from(kind), VideoKind::Episode);
                assert_eq!(duration_ms, 1_200_000);
            }
            _ => panic!("wrong command"),
        }
    }
}
