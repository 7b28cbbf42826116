//! Output path templates.
//!
//! A template is a path with `%field%` placeholders, e.g.
//! `Music/%albumartist%/%album%/%track2% %title%`. Substituted values are
//! sanitized so track metadata can never add or escape path components.

use std::path::{Component, Path, PathBuf};

use crate::{types::Track, utils};

pub const DEFAULT_TEMPLATE: &str = "%artist% - %title%";
pub const AUDIO_EXTENSION: &str = "mp3";

pub const PLACEHOLDERS: [&str; 9] = [
    "%artist%",
    "%albumartist%",
    "%album%",
    "%title%",
    "%genre%",
    "%date%",
    "%track%",
    "%track2%",
    "%disc%",
];

pub fn has_placeholder(s: &str) -> bool {
    PLACEHOLDERS.iter().any(|p| s.contains(p))
}

/// Resolved output location: a fixed root directory plus the templated
/// components below it.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTemplate {
    root: PathBuf,
    components: Vec<String>,
}

impl OutputTemplate {
    /// Interprets the `OUTPUT` argument.
    ///
    /// With placeholders, the leading components without placeholders form the
    /// root and the rest is the template, `..` included. Without placeholders
    /// `output` is a directory and [`DEFAULT_TEMPLATE`] names the files inside it.
    pub fn new(output: &Path) -> Self {
        if !has_placeholder(&output.to_string_lossy()) {
            return Self {
                root: output.to_path_buf(),
                components: vec![DEFAULT_TEMPLATE.to_string()],
            };
        }

        let mut root = PathBuf::new();
        let mut components = Vec::new();
        for component in output.components() {
            let part = component.as_os_str().to_string_lossy();
            let templated = has_placeholder(&part);
            if components.is_empty() && !templated {
                root.push(component);
            } else {
                match component {
                    Component::Normal(_) | Component::ParentDir => {
                        components.push(part.into_owned())
                    }
                    _ => {}
                }
            }
        }

        Self { root, components }
    }

    /// Directory that contains every generated path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path of `track`, including the audio extension.
    pub fn path_for(&self, track: &Track) -> PathBuf {
        let mut path = self.root.clone();
        let last = self.components.len().saturating_sub(1);

        for (i, component) in self.components.iter().enumerate() {
            let expanded = expand(component, track);
            if i == last {
                path.push(format!("{}.{}", expanded, AUDIO_EXTENSION));
            } else {
                path.push(expanded);
            }
        }

        path
    }
}

/// Replaces the placeholders of a single path component.
///
/// A placeholder without a value for `track` is kept as written.
pub fn expand(component: &str, track: &Track) -> String {
    let mut expanded = String::with_capacity(component.len());
    let mut rest = component;

    while let Some(start) = rest.find('%') {
        expanded.push_str(&rest[..start]);
        let tail = &rest[start..];
        match PLACEHOLDERS.iter().find(|p| tail.starts_with(**p)) {
            Some(placeholder) => {
                match value_of(placeholder, track) {
                    Some(value) => expanded.push_str(&utils::sanitize_component(&value)),
                    None => expanded.push_str(placeholder),
                }
                rest = &tail[placeholder.len()..];
            }
            None => {
                expanded.push('%');
                rest = &tail[1..];
            }
        }
    }

    expanded.push_str(rest);
    expanded
}

fn value_of(placeholder: &str, track: &Track) -> Option<String> {
    let album = track.album.as_ref();
    match placeholder {
        "%artist%" => track.artist(),
        "%albumartist%" => track.album_artist().or_else(|| track.artist()),
        "%album%" => album.map(|a| a.name.clone()).filter(|n| !n.is_empty()),
        "%title%" => Some(track.name.clone()),
        "%genre%" => album.and_then(|a| a.genres.first().cloned()),
        "%date%" => album.and_then(|a| a.release_date.clone()),
        "%track%" => track.track_number.map(|n| n.to_string()),
        "%track2%" => track.track_number.map(|n| format!("{:02}", n)),
        "%disc%" => track.disc_number.map(|n| n.to_string()),
        _ => None,
    }
}
