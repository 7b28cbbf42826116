//! # Download Module
//!
//! Writes the tracks of the selected playlists to disk.
//!
//! Playlists are processed one after another, tracks in playlist order. Every
//! track's file path comes from the [`template::OutputTemplate`]; a file that
//! already exists is left untouched. Audio is streamed into a `.part` file next
//! to the target and renamed once complete, so an interrupted run never leaves
//! a truncated file under the final name.
//!
//! A track that fails is reported and skipped; the rest of the playlist is
//! still downloaded. With a [`m3u::PlaylistFormat`] set, a playlist file with
//! paths relative to the template root is written after each playlist.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    time::Duration,
};

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    info,
    service::{MusicService, ServiceError},
    success,
    types::{Playlist, Track},
    utils, warning,
};

pub mod m3u;
pub mod template;

use m3u::{M3uEntry, PlaylistFormat};
use template::OutputTemplate;

#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Output directory or path template.
    pub output: PathBuf,
    /// Playlist file to write per playlist, if any.
    pub playlist_format: Option<PlaylistFormat>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl DownloadSummary {
    fn add(&mut self, other: DownloadSummary) {
        self.downloaded += other.downloaded;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOutcome {
    Downloaded(u64),
    Skipped,
}

/// Downloads every playlist in `playlists`.
///
/// A playlist whose track listing can't be fetched is reported and skipped.
pub async fn download_playlists(
    service: &dyn MusicService,
    playlists: &[Playlist],
    options: &DownloadOptions,
) -> DownloadSummary {
    let template = OutputTemplate::new(&options.output);
    let mut total = DownloadSummary::default();

    for playlist in playlists {
        match download_playlist(service, playlist, &template, options.playlist_format).await {
            Ok(summary) => total.add(summary),
            Err(e) => warning!("Failed to fetch tracks of playlist {}: {}", playlist.name, e),
        }
    }

    total
}

pub async fn download_playlist(
    service: &dyn MusicService,
    playlist: &Playlist,
    template: &OutputTemplate,
    playlist_format: Option<PlaylistFormat>,
) -> Result<DownloadSummary, ServiceError> {
    let tracks = service.playlist_tracks(playlist).await?;
    info!(
        "Downloading playlist {} by {} ({} tracks)",
        playlist.name,
        playlist.owner_name(),
        tracks.len()
    );

    let pb = progress_bar(tracks.len() as u64);
    let mut summary = DownloadSummary::default();
    let mut entries = Vec::new();

    for track in &tracks {
        let path = template.path_for(track);
        pb.set_message(track.name.clone());

        match download_track(service, track, &path).await {
            Ok(outcome) => {
                match outcome {
                    TrackOutcome::Downloaded(bytes) => {
                        tracing::debug!("wrote {} bytes to {}", bytes, path.display());
                        summary.downloaded += 1;
                    }
                    TrackOutcome::Skipped => summary.skipped += 1,
                }
                entries.push(m3u_entry(template.root(), track, &path));
            }
            Err(e) => {
                summary.failed += 1;
                pb.suspend(|| warning!("Failed to download {}: {}", display_title(track), e));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    if let Some(format) = playlist_format {
        let m3u_path = m3u::playlist_file_path(template.root(), &playlist.name, format);
        match m3u::write(&m3u_path, &entries).await {
            Ok(()) => info!("Wrote playlist file {}", m3u_path.display()),
            Err(e) => warning!("Failed to write {}: {}", m3u_path.display(), e),
        }
    }

    success!(
        "{}: {} downloaded, {} already present, {} failed",
        playlist.name,
        summary.downloaded,
        summary.skipped,
        summary.failed
    );

    Ok(summary)
}

/// Downloads `track` to `path` unless a file is already there.
pub async fn download_track(
    service: &dyn MusicService,
    track: &Track,
    path: &Path,
) -> Result<TrackOutcome, ServiceError> {
    if async_fs::metadata(path).await.is_ok() {
        return Ok(TrackOutcome::Skipped);
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            async_fs::create_dir_all(parent).await?;
        }
    }

    let part_path = part_path(path);
    let result = {
        let mut file = async_fs::File::create(&part_path).await?;
        service.stream_to(track, &mut file).await
    };

    match result {
        Ok(bytes) => {
            async_fs::rename(&part_path, path).await?;
            Ok(TrackOutcome::Downloaded(bytes))
        }
        Err(e) => {
            let _ = async_fs::remove_file(&part_path).await;
            Err(e)
        }
    }
}

fn part_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

fn display_title(track: &Track) -> String {
    match track.artist() {
        Some(artist) => format!("{} - {}", artist, track.name),
        None => track.name.clone(),
    }
}

fn m3u_entry(root: &Path, track: &Track, path: &Path) -> M3uEntry {
    M3uEntry {
        path: m3u::relative_entry_path(root, path),
        duration_secs: utils::duration_secs(track.duration_ms),
        title: display_title(track),
    }
}

fn progress_bar(len: u64) -> ProgressBar {
    if crate::is_quiet() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} [{bar:30.blue}] {pos}/{len} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .progress_chars("=> "),
    );
    pb
}
