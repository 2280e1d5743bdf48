//! Project file types.
//!
//! A project ties together the timeline parameters (fps, duration, output
//! raster), the asset list, and the strip descriptions.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::asset::Asset;
use crate::migration::migrate_project;
use crate::strip::{StripDescription, StripKind};

/// Version stamped into saved project files.
pub const PROJECT_VERSION: &str = "v0.1.0";

/// Top-level project file (`project.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Schema version.
    pub version: String,

    /// Human-readable project name.
    pub name: String,

    /// Output raster size in pixels.
    pub width: u32,
    pub height: u32,

    /// Timeline frame rate.
    pub fps: f64,

    /// Timeline duration in seconds.
    pub duration: f64,

    /// Source media.
    pub assets: Vec<Asset>,

    /// Timeline strips, in update order.
    pub strips: Vec<StripDescription>,
}

impl Project {
    /// Create an empty project.
    pub fn new(name: impl Into<String>, width: u32, height: u32, fps: f64, duration: f64) -> Self {
        Self {
            version: PROJECT_VERSION.to_string(),
            name: name.into(),
            width,
            height,
            fps,
            duration,
            assets: vec![],
            strips: vec![],
        }
    }

    /// Number of frames the timeline covers: `round(duration × fps)`.
    pub fn frames(&self) -> u64 {
        (self.duration * self.fps).round().max(0.0) as u64
    }

    /// Look up an asset by id.
    pub fn asset(&self, id: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    /// Load a project from a JSON file, migrating legacy versions.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ProjectError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let value: Value = serde_json::from_str(&content).map_err(|e| ProjectError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_value(value).map_err(|e| match e {
            ProjectError::ParseError { source, .. } => ProjectError::ParseError {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Build a project from a raw JSON value: shape check, migrate, deserialize.
    pub fn from_value(mut value: Value) -> Result<Self, ProjectError> {
        check_project_shape(&value)?;
        let applied = migrate_project(&mut value);
        if !applied.is_empty() {
            tracing::info!(steps = ?applied, "Migrated legacy project");
        }
        serde_json::from_value(value).map_err(|e| ProjectError::ParseError {
            path: PathBuf::new(),
            source: e,
        })
    }

    /// Save the project, stamping the current schema version.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ProjectError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ProjectError::IoError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let mut stamped = self.clone();
        stamped.version = PROJECT_VERSION.to_string();
        let json =
            serde_json::to_string_pretty(&stamped).map_err(|e| ProjectError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
        std::fs::write(path, json).map_err(|e| ProjectError::IoError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Report semantic problems that deserialization does not catch.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = vec![];

        if self.fps.is_nan() || self.fps <= 0.0 {
            errors.push(format!("fps must be positive (got {})", self.fps));
        }
        if self.duration.is_nan() || self.duration <= 0.0 {
            errors.push(format!("duration must be positive (got {})", self.duration));
        }
        if self.width == 0 || self.height == 0 {
            errors.push(format!(
                "output size must be non-zero (got {}x{})",
                self.width, self.height
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for (index, strip) in self.strips.iter().enumerate() {
            let base = strip.base();
            if let Some(id) = &base.id {
                if !seen.insert(id.as_str()) {
                    errors.push(format!("strip #{index}: duplicate id {id}"));
                }
            }
            if base.length < 0.0 {
                errors.push(format!("strip #{index}: negative length {}", base.length));
            }
            if let Some(asset_id) = strip.asset_id() {
                match self.asset(asset_id) {
                    None => errors.push(format!("strip #{index}: missing asset {asset_id}")),
                    Some(asset)
                        if matches!(strip.kind(), StripKind::Video | StripKind::Audio)
                            && !asset.is_playable() =>
                    {
                        errors.push(format!(
                            "strip #{index}: {} strip cannot play {:?} asset {asset_id}",
                            strip.kind().as_str(),
                            asset.kind
                        ));
                    }
                    Some(_) => {}
                }
            }
        }

        errors
    }
}

/// Structural check over a raw project value, mirroring the required fields.
fn check_project_shape(value: &Value) -> Result<(), ProjectError> {
    let fail = |message: String| Err(ProjectError::ValidationError { message });

    let Some(obj) = value.as_object() else {
        return fail("project must be a JSON object".to_string());
    };
    for key in ["version", "name"] {
        if !obj.get(key).is_some_and(Value::is_string) {
            return fail(format!("field `{key}` must be a string"));
        }
    }
    for key in ["width", "height", "fps", "duration"] {
        if !obj.get(key).is_some_and(Value::is_number) {
            return fail(format!("field `{key}` must be a number"));
        }
    }
    let Some(assets) = obj.get("assets").and_then(Value::as_array) else {
        return fail("field `assets` must be an array".to_string());
    };
    for (index, asset) in assets.iter().enumerate() {
        for key in ["id", "name", "type"] {
            if !asset.get(key).is_some_and(Value::is_string) {
                return fail(format!("asset #{index}: field `{key}` must be a string"));
            }
        }
    }
    let Some(strips) = obj.get("strips").and_then(Value::as_array) else {
        return fail("field `strips` must be an array".to_string());
    };
    for (index, strip) in strips.iter().enumerate() {
        if !strip.get("type").is_some_and(Value::is_string) {
            return fail(format!("strip #{index}: field `type` must be a string"));
        }
        for key in ["start", "length", "layer"] {
            if !strip.get(key).is_some_and(Value::is_number) {
                return fail(format!("strip #{index}: field `{key}` must be a number"));
            }
        }
    }
    Ok(())
}

/// Errors that can occur when working with projects.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid project: {message}")]
    ValidationError { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetKind;
    use crate::strip::{AudioStripDescription, StripBase, StripKind};
    use proptest::prelude::*;
    use serde_json::json;

    fn sample_project_json(version: &str) -> Value {
        json!({
            "version": version,
            "name": "Demo",
            "width": 1280,
            "height": 720,
            "fps": 30,
            "duration": 5.0,
            "assets": [
                {"id": "a1", "name": "voice.mp3", "type": "Audio", "path": "/media/voice.mp3"}
            ],
            "strips": [
                {"type": "Audio", "id": "s1", "start": -1.0, "length": 3.0, "layer": 0, "assetId": "a1"},
                {"type": "Text", "id": "s2", "start": 0.5, "length": 2.0, "layer": 3, "text": "Hello"}
            ]
        })
    }

    #[test]
    fn test_project_from_value_migrates_legacy_text() {
        let project = Project::from_value(sample_project_json("v0.0.2")).unwrap();
        assert_eq!(project.name, "Demo");
        assert_eq!(project.frames(), 150);
        assert_eq!(project.strips.len(), 2);
        assert_eq!(project.strips[1].kind(), StripKind::Text);
        assert_eq!(project.asset("a1").unwrap().kind, AssetKind::Audio);
        assert!(project.validate().is_empty());
    }

    #[test]
    fn test_shape_check_rejects_missing_fields() {
        let mut value = sample_project_json("v0.1.0");
        value.as_object_mut().unwrap().remove("fps");
        let err = Project::from_value(value).unwrap_err();
        assert!(err.to_string().contains("fps"));

        let mut value = sample_project_json("v0.1.0");
        value["strips"][0].as_object_mut().unwrap().remove("layer");
        let err = Project::from_value(value).unwrap_err();
        assert!(err.to_string().contains("strip #0"));
    }

    #[test]
    fn test_validate_reports_missing_asset_and_duplicates() {
        let mut project = Project::new("Broken", 640, 360, 24.0, 2.0);
        for _ in 0..2 {
            project
                .strips
                .push(StripDescription::Audio(AudioStripDescription {
                    base: StripBase::new(0.0, 1.0, 0)
                        .with_id("dup")
                        .with_asset("ghost", ""),
                }));
        }
        let errors = project.validate();
        assert!(errors.iter().any(|e| e.contains("duplicate id dup")));
        assert!(errors.iter().any(|e| e.contains("missing asset ghost")));
    }

    #[test]
    fn test_validate_reports_unplayable_media_asset() {
        let mut project = Project::new("Mixed", 640, 360, 24.0, 2.0);
        project
            .assets
            .push(Asset::new("logo", "logo.png", AssetKind::Image, "/m/logo.png"));
        project
            .strips
            .push(StripDescription::Audio(AudioStripDescription {
                base: StripBase::new(0.0, 1.0, 0).with_asset("logo", "/m/logo.png"),
            }));
        let errors = project.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Audio strip cannot play Image asset logo"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = std::env::temp_dir()
            .join("stripcast_test_project")
            .join("project.json");
        let _ = std::fs::remove_file(&path);

        let mut project = Project::from_value(sample_project_json("v0.0.1")).unwrap();
        project.version = "v0.0.1".to_string();
        project.save(&path).unwrap();

        let loaded = Project::load(&path).unwrap();
        assert_eq!(loaded.version, PROJECT_VERSION);
        assert_eq!(loaded.strips, project.strips);
        assert_eq!(loaded.assets, project.assets);

        std::fs::remove_file(&path).ok();
    }

    proptest! {
        #[test]
        fn frames_is_rounded_product(duration in 0.01f64..600.0, fps in 1.0f64..120.0) {
            let project = Project::new("p", 16, 16, fps, duration);
            prop_assert_eq!(project.frames(), (duration * fps).round() as u64);
        }
    }
}
