//! Source media assets.

use serde::{Deserialize, Serialize};

/// Kind of source media an asset holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    Video,
    Audio,
    Image,
    Font,
}

/// A piece of source media that one or more strips reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Unique asset identifier.
    pub id: String,

    /// Display name, including the file extension.
    pub name: String,

    /// Media kind.
    #[serde(rename = "type")]
    pub kind: AssetKind,

    /// Source path of the media file.
    #[serde(default)]
    pub path: String,

    /// Set once decodable metadata is available. Never persisted.
    #[serde(skip)]
    pub valid: bool,
}

impl Asset {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: AssetKind,
        path: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            path: path.into(),
            valid: false,
        }
    }

    /// Extension of the display name including the leading dot, or `""`.
    pub fn extension(&self) -> &str {
        file_extension(&self.name)
    }

    /// Whether the asset carries time-based media that the encoder extracts.
    pub fn is_playable(&self) -> bool {
        matches!(self.kind, AssetKind::Video | AssetKind::Audio)
    }
}

/// Extension of `name` including the leading dot, or `""` when there is none.
pub fn file_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => &name[idx..],
        _ => "",
    }
}
