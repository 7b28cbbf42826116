//! # CLI Module
//!
//! Command implementations behind the `plgrab` binary. Argument parsing lives in
//! `main.rs`; each function here receives already normalized options.
//!
//! ## Commands
//!
//! - [`download`] - Logs in, lists and filters playlists, then either prints
//!   them (dry run) or downloads their tracks
//! - [`auth`] - Browser login that always stores the credential
//! - [`logout`] - Removes a stored credential
//!
//! [`login`] is shared by `download` and reuses a stored credential when one
//! exists. [`run`] is the part of `download` after login and works against
//! any [`crate::service::MusicService`].
//!
//! ## Usage Patterns
//!
//! ```bash
//! plgrab auth                                  # store the default credential
//! plgrab -d                                    # list all playlists
//! plgrab -f name:workout -f owner:me -a ~/Music
//! plgrab -m m3u8 "~/Music/%albumartist%/%album%/%track2% %title%"
//! ```

mod auth;
mod download;

pub use auth::auth;
pub use auth::login;
pub use auth::logout;
pub use download::RunOptions;
pub use download::RunReport;
pub use download::download;
pub use download::playlist_table;
pub use download::run;

use tracing_subscriber::EnvFilter;

/// Installs the log subscriber for `--log`.
///
/// Logs the crate at debug level, only warnings in quiet mode. `RUST_LOG`
/// takes precedence when set.
pub fn init_logging(quiet: bool) {
    let level = if quiet { "warn" } else { "plgrab=debug" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
