//! Engine argument construction.
//!
//! Pure functions from encode settings and media sources to engine
//! argument lists. Identical inputs always produce identical plans.

use serde::Serialize;
use stripcast_common::clock::frame_count;
use stripcast_common::config::EncodingDefaults;
use stripcast_strips::source::EncodeSource;

/// Scratch name of the raw capture.
pub const CAPTURE_FILE_NAME: &str = "_capture.y4m";

/// Scratch name of the final deliverable.
pub const OUTPUT_FILE_NAME: &str = "out.mp4";

/// Timeline and codec parameters of one encode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodeSettings {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub duration: f64,
    pub video_codec: String,
    pub pixel_format: String,
    pub audio_codec: String,
}

impl EncodeSettings {
    pub fn new(width: u32, height: u32, fps: f64, duration: f64) -> Self {
        Self::with_codecs(width, height, fps, duration, &EncodingDefaults::default())
    }

    pub fn with_codecs(
        width: u32,
        height: u32,
        fps: f64,
        duration: f64,
        codecs: &EncodingDefaults,
    ) -> Self {
        Self {
            width,
            height,
            fps,
            duration,
            video_codec: codecs.video_codec.clone(),
            pixel_format: codecs.pixel_format.clone(),
            audio_codec: codecs.audio_codec.clone(),
        }
    }

    pub fn frames(&self) -> u64 {
        frame_count(self.duration, self.fps)
    }

    /// Output length in seconds: whole frames at the timeline rate.
    pub fn output_secs(&self) -> f64 {
        self.frames() as f64 / self.fps
    }

    fn size_arg(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// One asset-preparation invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparationStep {
    pub strip_id: String,
    /// Scratch copy of the asset, `<assetId><ext>`.
    pub asset_file: String,
    /// Extracted intermediate, `<stripId><ext>`.
    pub output_file: String,
    pub args: Vec<String>,
}

/// Every engine invocation for one encode, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodePlan {
    pub preparation: Vec<PreparationStep>,
    pub main: Vec<String>,
}

impl EncodePlan {
    pub fn new(settings: &EncodeSettings, sources: &[EncodeSource]) -> Self {
        Self {
            preparation: sources.iter().map(preparation_step).collect(),
            main: main_args(settings, sources),
        }
    }

    /// Shell-style rendering of every invocation, one per line.
    pub fn command_lines(&self, program: &str) -> Vec<String> {
        self.preparation
            .iter()
            .map(|step| step.args.as_slice())
            .chain(std::iter::once(self.main.as_slice()))
            .map(|args| {
                std::iter::once(program.to_string())
                    .chain(args.iter().map(|a| shell_quote(a)))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }
}

pub fn preparation_step(source: &EncodeSource) -> PreparationStep {
    let asset_file = format!("{}{}", source.asset.id, source.asset.extension());
    let output_file = source.file_name();
    PreparationStep {
        strip_id: source.strip_id.clone(),
        args: preparation_args(source, &asset_file, &output_file),
        asset_file,
        output_file,
    }
}

/// Trim one asset to its strip: video skips `video_offset` first.
pub fn preparation_args(source: &EncodeSource, asset_file: &str, output_file: &str) -> Vec<String> {
    let mut args = vec!["-y".to_string(), "-i".to_string(), asset_file.to_string()];
    if source.is_video() {
        args.push("-ss".to_string());
        args.push(source.video_offset.to_string());
    }
    args.push("-t".to_string());
    args.push(source.length.to_string());
    args.push(output_file.to_string());
    args
}

/// Delay applied to a source's audio, in milliseconds. Negative starts are
/// trimmed with `-ss` instead and get no delay.
pub fn start_delay_ms(source: &EncodeSource) -> i64 {
    if source.start < 0.0 {
        0
    } else {
        (source.start * 1000.0).round() as i64
    }
}

/// Audio mix graph over the media inputs, or `None` without audio.
///
/// Input `i` (1-based, after the capture at 0) is delayed into `[out<i>]`;
/// delay statements come in reverse input order and the mix comes last.
pub fn audio_filter_graph(sources: &[EncodeSource]) -> Option<String> {
    let audible: Vec<(usize, &EncodeSource)> = sources
        .iter()
        .enumerate()
        .map(|(idx, source)| (idx + 1, source))
        .filter(|(_, source)| source.has_audio)
        .collect();
    if audible.is_empty() {
        return None;
    }

    let mut statements: Vec<String> = audible
        .iter()
        .rev()
        .map(|(input, source)| {
            let ms = start_delay_ms(source);
            format!("[{input}:a]adelay={ms}|{ms}[out{input}]")
        })
        .collect();
    let labels: String = audible
        .iter()
        .map(|(input, _)| format!("[out{input}]"))
        .collect();
    statements.push(format!("{labels}amix=inputs={}[out]", audible.len()));
    Some(statements.join(";"))
}

/// Arguments of the main encode.
pub fn main_args(settings: &EncodeSettings, sources: &[EncodeSource]) -> Vec<String> {
    let size = settings.size_arg();
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-r".into(),
        settings.fps.to_string(),
        "-i".into(),
        CAPTURE_FILE_NAME.into(),
    ];

    for source in sources {
        if source.start < 0.0 {
            args.push("-ss".into());
            args.push(format!("{:.4}", -source.start));
        }
        args.push("-i".into());
        args.push(source.file_name());
    }

    args.push("-s".into());
    args.push(size.clone());

    if let Some(graph) = audio_filter_graph(sources) {
        args.extend([
            "-filter_complex".into(),
            graph,
            "-map".into(),
            "[out]".into(),
            "-c:a".into(),
            settings.audio_codec.clone(),
        ]);
    }

    args.extend([
        "-map".into(),
        "0:v".into(),
        "-t".into(),
        settings.output_secs().to_string(),
        "-c:v".into(),
        settings.video_codec.clone(),
        "-pix_fmt".into(),
        settings.pixel_format.clone(),
        "-s".into(),
        size,
        OUTPUT_FILE_NAME.into(),
    ]);
    args
}

fn shell_quote(arg: &str) -> String {
    let plain = arg
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "-_.:/=,+".contains(c));
    if plain && !arg.is_empty() {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
