use std::path::PathBuf;

use clap::{
    ArgAction, CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use plgrab::{
    Res, cli, config,
    config::ServiceConfig,
    download::m3u::PlaylistFormat,
    error,
    filter::{self, Filter},
    warning,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
  args_conflicts_with_subcommands = true // download options don't mix with `auth` etc.
)]
struct Cli {
    #[clap(flatten)]
    download: DownloadArgs,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Log in through the browser and store the credential
    Auth(CredentialOptions),

    /// Remove a stored credential
    Logout(CredentialOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct DownloadArgs {
    /// Output directory or path template, e.g. "Music/%artist%/%album%/%track2% %title%".
    /// Defaults to the current directory
    output: Option<PathBuf>,

    /// Credential file name to use/create
    #[clap(short, long, default_value = "oauth")]
    cred: String,

    /// Save credentials for future use. Tokens are stored in plain text
    #[clap(short, long)]
    save: bool,

    /// Enable API client logging
    #[clap(short, long)]
    log: bool,

    /// Output the list of playlists that would be downloaded
    #[clap(short, long)]
    dry_run: bool,

    /// Don't output status messages. With --log only warnings are logged,
    /// with --dry-run the playlist list is still printed
    #[clap(short, long)]
    quiet: bool,

    /// Write a playlist file with relative paths per playlist. The format is
    /// given as `--m3u=m3u8`; a bare `-m` writes m3u
    #[clap(
        short,
        long,
        value_enum,
        value_name = "FORMAT",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "m3u"
    )]
    m3u: Option<PlaylistFormat>,

    /// Filter playlists by field:pattern pair (e.g. "name:Workout"). Fields are
    /// id, name, description and owner. Playlists can match any filter criteria.
    /// This option can be set multiple times
    #[clap(
        short,
        long = "filter",
        value_name = "FILTER",
        value_parser = filter::parse_filter,
        action = ArgAction::Append,
        num_args = 1
    )]
    filters: Vec<Filter>,

    /// Playlists must match all filter criteria
    #[clap(short, long)]
    all: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CredentialOptions {
    /// Credential file name
    #[clap(short, long, default_value = "oauth")]
    cred: String,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

async fn run(cli: Cli) -> Res<()> {
    match cli.command {
        Some(Command::Auth(opt)) => cli::auth(&ServiceConfig::from_env()?, &opt.cred).await,
        Some(Command::Logout(opt)) => cli::logout(&opt.cred).await,
        Some(Command::Completions(opt)) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
        None => {
            let args = cli.download;
            cli::download(cli::RunOptions {
                output: args.output,
                cred: args.cred,
                save: args.save,
                log: args.log,
                dry_run: args.dry_run,
                quiet: args.quiet,
                playlist_format: args.m3u,
                filters: args.filters,
                all: args.all,
            })
            .await
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        warning!("Cannot load environment file. Err: {}", e);
    }

    let cli = Cli::parse();

    tokio::select! {
        result = run(cli) => {
            if let Err(e) = result {
                error!("{}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\n\nExiting");
            std::process::exit(1);
        }
    }
}
