//! Plain strip descriptions.
//!
//! These are the persisted/exported form of timeline strips. The runtime
//! strip types in `stripcast-strips` are built from them and export back
//! to them.

use serde::{Deserialize, Serialize};

/// A position in scene space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Variant tag of a strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StripKind {
    Video,
    Audio,
    Image,
    Text,
}

impl StripKind {
    /// Tag written to the `type` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            StripKind::Video => "Video",
            StripKind::Audio => "Audio",
            StripKind::Image => "Image",
            StripKind::Text => "Text3D",
        }
    }
}

impl std::fmt::Display for StripKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields every strip carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StripBase {
    /// Strip identity. Generated on construction when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Timeline start in seconds. May be negative.
    pub start: f64,

    /// Duration on the timeline in seconds.
    pub length: f64,

    /// Z/mix order; higher layers draw on top.
    #[serde(default)]
    pub layer: i32,

    /// Referenced asset id, or empty.
    #[serde(default)]
    pub asset_id: String,

    /// Source path of the referenced asset, or empty. Informational only.
    #[serde(default)]
    pub src: String,
}

impl StripBase {
    pub fn new(start: f64, length: f64, layer: i32) -> Self {
        Self {
            id: None,
            start,
            length,
            layer,
            asset_id: String::new(),
            src: String::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_asset(mut self, asset_id: impl Into<String>, src: impl Into<String>) -> Self {
        self.asset_id = asset_id.into();
        self.src = src.into();
        self
    }

    pub fn end(&self) -> f64 {
        self.start + self.length
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStripDescription {
    #[serde(flatten)]
    pub base: StripBase,

    #[serde(default)]
    pub position: Vector3,

    /// Seconds skipped at the head of the source media.
    #[serde(default)]
    pub video_offset: f64,

    /// Display scale relative to the native size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioStripDescription {
    #[serde(flatten)]
    pub base: StripBase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStripDescription {
    #[serde(flatten)]
    pub base: StripBase,

    #[serde(default)]
    pub position: Vector3,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStripDescription {
    #[serde(flatten)]
    pub base: StripBase,

    #[serde(default)]
    pub position: Vector3,

    #[serde(default)]
    pub text: String,

    #[serde(default = "default_font_size")]
    pub font_size: f64,

    #[serde(default = "default_text_color")]
    pub color: String,
}

fn default_font_size() -> f64 {
    48.0
}

fn default_text_color() -> String {
    "#ffffff".to_string()
}

/// Persisted description of one strip, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StripDescription {
    Video(VideoStripDescription),
    Audio(AudioStripDescription),
    Image(ImageStripDescription),
    #[serde(rename = "Text3D", alias = "Text")]
    Text(TextStripDescription),
}

impl StripDescription {
    pub fn kind(&self) -> StripKind {
        match self {
            StripDescription::Video(_) => StripKind::Video,
            StripDescription::Audio(_) => StripKind::Audio,
            StripDescription::Image(_) => StripKind::Image,
            StripDescription::Text(_) => StripKind::Text,
        }
    }

    pub fn base(&self) -> &StripBase {
        match self {
            StripDescription::Video(d) => &d.base,
            StripDescription::Audio(d) => &d.base,
            StripDescription::Image(d) => &d.base,
            StripDescription::Text(d) => &d.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut StripBase {
        match self {
            StripDescription::Video(d) => &mut d.base,
            StripDescription::Audio(d) => &mut d.base,
            StripDescription::Image(d) => &mut d.base,
            StripDescription::Text(d) => &mut d.base,
        }
    }

    /// Referenced asset id, if any.
    pub fn asset_id(&self) -> Option<&str> {
        let id = self.base().asset_id.as_str();
        (!id.is_empty()).then_some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_description_uses_camel_case() {
        let desc = StripDescription::Video(VideoStripDescription {
            base: StripBase::new(1.0, 4.0, 2)
                .with_id("v1")
                .with_asset("asset-1", "/media/a.mp4"),
            position: Vector3::new(10.0, -5.0, 0.0),
            video_offset: 0.5,
            percent: None,
        });
        let value = serde_json::to_value(&desc).unwrap();
        assert_eq!(value["type"], "Video");
        assert_eq!(value["videoOffset"], 0.5);
        assert_eq!(value["assetId"], "asset-1");
        assert_eq!(value["id"], "v1");
        assert!(value.get("percent").is_none());

        let parsed: StripDescription = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, desc);
    }

    #[test]
    fn test_text_accepts_legacy_tag() {
        let json = r#"{"type":"Text","start":0,"length":2,"layer":1,"text":"hi"}"#;
        let parsed: StripDescription = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.kind(), StripKind::Text);
        let value = serde_json::to_value(&parsed).unwrap();
        assert_eq!(value["type"], "Text3D");
        assert_eq!(value["fontSize"], 48.0);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let json = r#"{"type":"Hologram","start":0,"length":2,"layer":1}"#;
        assert!(serde_json::from_str::<StripDescription>(json).is_err());
    }

    #[test]
    fn test_asset_id_empty_is_none() {
        let desc = StripDescription::Audio(AudioStripDescription {
            base: StripBase::new(0.0, 1.0, 0),
        });
        assert_eq!(desc.asset_id(), None);
        assert_eq!(desc.base().end(), 1.0);
    }
}
