//! Encoder-facing view of media-bearing strips.

use stripcast_project_model::asset::Asset;
use stripcast_project_model::strip::StripKind;

/// A media-bearing strip as the encoder sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeSource {
    pub strip_id: String,
    pub kind: StripKind,
    pub asset: Asset,
    /// Timeline start in seconds. Negative starts are trimmed at encode time.
    pub start: f64,
    pub length: f64,
    /// Seconds skipped at the head of the source. Zero for audio strips.
    pub video_offset: f64,
    /// `false` only when the media is known to carry no audio stream.
    pub has_audio: bool,
}

impl EncodeSource {
    /// Scratch file name of the extracted intermediate: `<strip id><ext>`.
    pub fn file_name(&self) -> String {
        format!("{}{}", self.strip_id, self.asset.extension())
    }

    pub fn is_video(&self) -> bool {
        self.kind == StripKind::Video
    }
}
