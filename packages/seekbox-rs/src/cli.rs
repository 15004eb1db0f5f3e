//! Command line arguments backing the `seekbox` binary.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use seekbox_rs::{DetectionMode, SearchMode, TargetKind};

#[derive(Parser, Debug)]
#[command(
  name = "seekbox",
  about = "Detect faces and objects in an image and search the web for similar content",
  version
)]
pub struct Args {
  /// JSON configuration file
  #[arg(long, short = 'c', global = true)]
  pub config: Option<PathBuf>,

  /// Base URL of the detection API (overrides config and environment)
  #[arg(long, global = true)]
  pub api_url: Option<String>,

  /// Log filter used when RUST_LOG is unset
  #[arg(long, default_value = "info", global = true)]
  pub log_level: String,

  #[command(subcommand)]
  pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Print version information
  Version,
  /// Detect faces and/or objects and print the overlay boxes as JSON
  Detect {
    /// Image URL or data:image/...;base64 payload
    #[arg(long, short = 'i')]
    image: String,

    /// What to detect
    #[arg(long, short = 'm', value_enum)]
    mode: Option<DetectionMode>,

    /// Rendered image width in pixels
    #[arg(long, short = 'w')]
    width: Option<f64>,

    /// Account whose entry count is bumped when faces are found
    #[arg(long)]
    actor: Option<String>,
  },
  /// Detect, then reverse-search the selected box
  Search {
    /// Image URL or data:image/...;base64 payload
    #[arg(long, short = 'i')]
    image: String,

    /// Kind of box to search
    #[arg(long, short = 'k', value_enum, default_value = "object")]
    kind: TargetKind,

    /// Zero-based index of the box among boxes of that kind
    #[arg(long, short = 'n', default_value = "0")]
    index: usize,

    /// Crop to the box before searching, or search the full image
    #[arg(long, value_enum)]
    search_mode: Option<SearchMode>,

    /// Rendered image width in pixels
    #[arg(long, short = 'w')]
    width: Option<f64>,
  },
  /// Text image search
  Lookup {
    /// Query string to search for
    query: String,
  },
}
