//! `field:pattern` filters applied to the account's playlists.
//!
//! A filter names a playlist field and a regular expression. Patterns are
//! searched case-insensitively anywhere in the field value. Filters are parsed
//! by clap through [`parse_filter`], so a malformed filter is reported as a
//! usage error before anything talks to the service.

use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::{
    service::{MusicService, ServiceError},
    types::Playlist,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistField {
    Id,
    Name,
    Description,
    Owner,
}

impl PlaylistField {
    fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "description" => Some(Self::Description),
            "owner" | "ownername" => Some(Self::Owner),
            _ => None,
        }
    }

    fn value<'p>(&self, playlist: &'p Playlist) -> Option<&'p str> {
        match self {
            Self::Id => Some(&playlist.id),
            Self::Name => Some(&playlist.name),
            Self::Description => playlist.description.as_deref(),
            Self::Owner => Some(playlist.owner_name()),
        }
    }
}

impl fmt::Display for PlaylistField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Description => "description",
            Self::Owner => "owner",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone)]
pub struct Filter {
    pub field: PlaylistField,
    pattern: Regex,
}

impl Filter {
    pub fn new(field: PlaylistField, pattern: &str) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self { field, pattern })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// An absent field never matches.
    pub fn matches(&self, playlist: &Playlist) -> bool {
        self.field
            .value(playlist)
            .is_some_and(|value| self.pattern.is_match(value))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.pattern.as_str())
    }
}

/// clap value parser for `FIELD:PATTERN`.
///
/// Splits on the first `:` so patterns may contain colons themselves.
pub fn parse_filter(s: &str) -> Result<Filter, String> {
    let Some((field, pattern)) = s.split_once(':') else {
        return Err(format!(
            "invalid filter '{}': expected FIELD:PATTERN (e.g. \"name:Workout\")",
            s
        ));
    };

    let field = PlaylistField::from_name(field).ok_or_else(|| {
        format!(
            "unknown filter field '{}': expected one of id, name, description, owner",
            field
        )
    })?;

    Filter::new(field, pattern).map_err(|e| format!("invalid pattern '{}': {}", pattern, e))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// A playlist is kept when at least one filter matches.
    #[default]
    Any,
    /// A playlist is kept only when every filter matches.
    All,
}

impl FilterMode {
    pub fn from_all_flag(all: bool) -> Self {
        if all { Self::All } else { Self::Any }
    }
}

pub fn matches(playlist: &Playlist, filters: &[Filter], mode: FilterMode) -> bool {
    if filters.is_empty() {
        return true;
    }

    match mode {
        FilterMode::Any => filters.iter().any(|f| f.matches(playlist)),
        FilterMode::All => filters.iter().all(|f| f.matches(playlist)),
    }
}

/// Keeps the playlists accepted by `filters`, preserving their order.
pub fn apply(playlists: Vec<Playlist>, filters: &[Filter], mode: FilterMode) -> Vec<Playlist> {
    playlists
        .into_iter()
        .filter(|p| matches(p, filters, mode))
        .collect()
}

/// Fetches the account's playlists and keeps those accepted by `filters`.
pub async fn list_playlists(
    service: &dyn MusicService,
    filters: &[Filter],
    mode: FilterMode,
) -> Result<Vec<Playlist>, ServiceError> {
    let playlists = service.playlists().await?;
    tracing::debug!("account has {} playlists", playlists.len());
    Ok(apply(playlists, filters, mode))
}
