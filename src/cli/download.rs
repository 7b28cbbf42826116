use std::path::PathBuf;

use tabled::Table;

use crate::{
    Res,
    cli::{init_logging, login},
    config::ServiceConfig,
    download::{self, DownloadOptions, DownloadSummary, m3u::PlaylistFormat},
    filter::{self, Filter, FilterMode},
    info,
    service::{HttpMusicService, MusicService},
    success,
    types::{Playlist, PlaylistTableRow},
    warning,
};

/// Normalized options of a download run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub output: Option<PathBuf>,
    pub cred: String,
    pub save: bool,
    pub log: bool,
    pub dry_run: bool,
    pub quiet: bool,
    pub playlist_format: Option<PlaylistFormat>,
    pub filters: Vec<Filter>,
    pub all: bool,
}

/// What a run did after filtering the playlists.
#[derive(Debug, Clone, PartialEq)]
pub enum RunReport {
    NothingToDownload,
    /// Dry run, the playlists that would have been downloaded.
    Listed(Vec<Playlist>),
    Downloaded(DownloadSummary),
}

pub async fn download(options: RunOptions) -> Res<()> {
    crate::set_quiet(options.quiet);
    if options.log {
        init_logging(options.quiet);
    }

    let output = match &options.output {
        Some(output) => output.clone(),
        None => std::env::current_dir()?,
    };

    let config = ServiceConfig::from_env()?;
    let tokens = login(&config, &options.cred, options.save).await?;
    let service = HttpMusicService::new(config, tokens);

    run(&service, &options, output).await?;
    Ok(())
}

/// Lists and filters the playlists of `service`, then prints or downloads
/// them into `output`. The session is closed whether or not that succeeds.
pub async fn run(
    service: &dyn MusicService,
    options: &RunOptions,
    output: PathBuf,
) -> Res<RunReport> {
    let report = process(service, options, output).await;

    if let Err(e) = service.logout().await {
        warning!("Logout failed: {}", e);
    }

    let report = report?;
    info!("All done!");
    Ok(report)
}

async fn process(
    service: &dyn MusicService,
    options: &RunOptions,
    output: PathBuf,
) -> Res<RunReport> {
    let mode = FilterMode::from_all_flag(options.all);
    let playlists = filter::list_playlists(service, &options.filters, mode).await?;

    if playlists.is_empty() {
        println!("\nNo playlists to download");
        return Ok(RunReport::NothingToDownload);
    }

    if options.dry_run {
        info!("Found {} playlists to download", playlists.len());
        println!("\nPlaylists to download:\n");
        println!("{}", playlist_table(&playlists));
        return Ok(RunReport::Listed(playlists));
    }

    info!("Downloading {} playlists", playlists.len());
    let download_options = DownloadOptions {
        output,
        playlist_format: options.playlist_format,
    };
    let summary = download::download_playlists(service, &playlists, &download_options).await;
    success!(
        "{} tracks downloaded, {} already present, {} failed",
        summary.downloaded,
        summary.skipped,
        summary.failed
    );

    Ok(RunReport::Downloaded(summary))
}

/// Dry run output. Printed regardless of quiet mode.
pub fn playlist_table(playlists: &[Playlist]) -> String {
    let rows: Vec<PlaylistTableRow> = playlists.iter().map(PlaylistTableRow::from).collect();
    Table::new(rows).to_string()
}
