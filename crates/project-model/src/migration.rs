//! Version-gated rewrites of persisted project descriptions.
//!
//! Migrations run on the raw JSON value before it is deserialized, so a
//! step can rename tags or fields that the current types no longer accept.
//! Steps run in declaration order; each one is guarded by a predicate on
//! the project's recorded version.

use std::cmp::Ordering;

use serde_json::Value;

/// A dotted numeric version such as `v0.0.4`.
#[derive(Debug, Clone)]
pub struct Version(Vec<u32>);

impl Version {
    /// Parse `v1.2.3` / `1.2.3`. Non-numeric segments read as zero.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim().trim_start_matches('v');
        Self(
            trimmed
                .split('.')
                .map(|part| part.trim().parse::<u32>().unwrap_or(0))
                .collect(),
        )
    }

    pub fn segments(&self) -> &[u32] {
        &self.0
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());
        for i in 0..len {
            let a = self.0.get(i).copied().unwrap_or(0);
            let b = other.0.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One predicate-guarded transform over a raw project value.
pub struct MigrationStep {
    pub name: &'static str,
    pub applies: fn(&Version) -> bool,
    pub apply: fn(&mut Value),
}

static MIGRATION_STEPS: &[MigrationStep] = &[MigrationStep {
    name: "text-strip-to-text3d",
    applies: predates_text3d,
    apply: rename_text_strips,
}];

/// All known migration steps, oldest first.
pub fn migration_steps() -> &'static [MigrationStep] {
    MIGRATION_STEPS
}

/// Apply every step whose predicate matches the project's version.
///
/// Returns the names of the applied steps.
pub fn migrate_project(project: &mut Value) -> Vec<&'static str> {
    let version = Version::parse(
        project
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or_default(),
    );

    let mut applied = Vec::new();
    for step in migration_steps() {
        if (step.applies)(&version) {
            (step.apply)(project);
            tracing::debug!(step = step.name, version = ?version.segments(), "Applied project migration");
            applied.push(step.name);
        }
    }
    applied
}

fn predates_text3d(version: &Version) -> bool {
    *version < Version::parse("v0.0.4")
}

fn rename_text_strips(project: &mut Value) {
    let Some(strips) = project.get_mut("strips").and_then(Value::as_array_mut) else {
        return;
    };
    for strip in strips {
        if strip.get("type").and_then(Value::as_str) == Some("Text") {
            strip["type"] = Value::String("Text3D".to_string());
        }
    }
}
