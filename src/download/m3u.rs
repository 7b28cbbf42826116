//! Extended M3U playlist files.

use std::path::{Component, Path, PathBuf};

use clap::ValueEnum;

use crate::utils;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlaylistFormat {
    M3u,
    M3u8,
}

impl PlaylistFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            PlaylistFormat::M3u => "m3u",
            PlaylistFormat::M3u8 => "m3u8",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct M3uEntry {
    /// Path relative to the playlist file, `/`-separated.
    pub path: String,
    pub duration_secs: u64,
    /// Display title, `artist - title`.
    pub title: String,
}

/// Renders an extended M3U document. An empty playlist still gets the header.
pub fn render(entries: &[M3uEntry]) -> String {
    let mut content = String::from("#EXTM3U\n");
    for entry in entries {
        content.push_str(&format!(
            "#EXTINF:{},{}\n",
            entry.duration_secs,
            single_line(&entry.title)
        ));
        content.push_str(&entry.path);
        content.push('\n');
    }
    content
}

// a line break in a title would start a new entry
fn single_line(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Location of the playlist file for `playlist_name` inside `root`.
pub fn playlist_file_path(root: &Path, playlist_name: &str, format: PlaylistFormat) -> PathBuf {
    root.join(format!(
        "{}.{}",
        utils::sanitize_component(playlist_name),
        format.extension()
    ))
}

/// Path of `track_path` relative to `root` with `/` separators.
///
/// A path outside of `root` is written as is.
pub fn relative_entry_path(root: &Path, track_path: &Path) -> String {
    let Ok(relative) = track_path.strip_prefix(root) else {
        return track_path.to_string_lossy().into_owned();
    };

    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

pub async fn write(path: &Path, entries: &[M3uEntry]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            async_fs::create_dir_all(parent).await?;
        }
    }
    async_fs::write(path, render(entries)).await
}
