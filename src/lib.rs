//! Playlist Downloader CLI Library
//!
//! This library provides functionality for downloading the playlists of a music
//! streaming account to local audio files. It includes modules for the OAuth
//! callback server, CLI operations, configuration, credential management, the
//! remote service client, playlist filtering, path templates and playlist files.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints for the local OAuth callback server
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `download` - Track downloads, path templates and M3U output
//! - `filter` - `field:pattern` playlist filters
//! - `management` - Credential persistence and token lifecycle
//! - `server` - Local HTTP server for OAuth callbacks
//! - `service` - Music streaming service client
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers

use std::sync::atomic::{AtomicBool, Ordering};

pub mod api;
pub mod cli;
pub mod config;
pub mod download;
pub mod filter;
pub mod management;
pub mod server;
pub mod service;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Uses a boxed dynamic error trait object with Send + Sync bounds so errors
/// from the service client, the filesystem and configuration can be bubbled
/// up to the command layer with `?`.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

static QUIET: AtomicBool = AtomicBool::new(false);

/// Silences `info!` and `success!` output for the rest of the process.
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Prints an informational message with a blue bullet point.
///
/// Status output: suppressed when quiet mode is enabled via [`set_quiet`].
///
/// # Example
///
/// ```
/// use plgrab::info;
///
/// let playlists = vec!["Workout", "Chill"];
/// info!("Downloading {} playlists", playlists.len());
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    if !$crate::is_quiet() {
      use colored::Colorize;
      println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
    }
  })
}

/// Prints a success message with a green checkmark.
///
/// Status output: suppressed when quiet mode is enabled via [`set_quiet`].
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    if !$crate::is_quiet() {
      use colored::Colorize;
      println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
    }
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Terminates the process with exit code 1. Only used from the command layer
/// for errors where recovery is not possible. Never silenced by quiet mode.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable issues such as a single track failing to download.
/// Never silenced by quiet mode.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
