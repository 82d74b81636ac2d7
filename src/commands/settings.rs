use crate::error::{PipelineError, Result};
use crate::models::test_summary::TestCountMode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SETTINGS_FILE: &str = "codetrend.json";

/// Immutable pipeline configuration, built once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub snapshots_directory: PathBuf,
    pub results_directory: PathBuf,
    pub project_urls: Vec<String>,
    pub interval_weeks: u32,
    pub java_command: String,
    pub maven_command: String,
    pub designite_jar_path: PathBuf,
    pub jacoco_cli_path: PathBuf,
    pub jacoco_agent_path: PathBuf,
    pub dv8_console_path: PathBuf,
    pub test_count_mode: TestCountMode,
}

impl Settings {
    /// Fails when a tool needed by the analyze stage is not configured.
    pub fn require_tools(&self) -> Result<()> {
        let tools = [
            ("designiteJarPath", &self.designite_jar_path),
            ("jacocoCliPath", &self.jacoco_cli_path),
            ("jacocoAgentPath", &self.jacoco_agent_path),
            ("dv8ConsolePath", &self.dv8_console_path),
        ];
        for (key, path) in tools {
            if path.as_os_str().is_empty() {
                return Err(PipelineError::Settings(format!("{key} is not configured")));
            }
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            snapshots_directory: PathBuf::from("snapshots"),
            results_directory: PathBuf::from("results"),
            project_urls: Vec::new(),
            interval_weeks: 4,
            java_command: "java".to_string(),
            maven_command: if cfg!(windows) { "mvn.cmd" } else { "mvn" }.to_string(),
            designite_jar_path: PathBuf::new(),
            jacoco_cli_path: PathBuf::new(),
            jacoco_agent_path: PathBuf::new(),
            dv8_console_path: PathBuf::new(),
            test_count_mode: TestCountMode::default(),
        }
    }
}

pub fn load_settings_from_disk(path: &Path) -> Result<Settings> {
    let raw = fs::read_to_string(path).map_err(|e| PipelineError::io(e, path))?;
    let value = serde_json::from_str::<Value>(&raw)
        .map_err(|e| PipelineError::Settings(format!("{}: {e}", path.display())))?;
    settings_from_value(value)
}

pub fn settings_from_value(input: Value) -> Result<Settings> {
    let mut settings = match input {
        Value::Object(map) => Value::Object(map),
        other => {
            return Err(PipelineError::Settings(format!(
                "expected a JSON object, found {other}"
            )))
        }
    };

    deep_merge_defaults(&mut settings, &default_settings());
    sanitize_settings(&mut settings);

    serde_json::from_value(settings).map_err(|e| PipelineError::Settings(e.to_string()))
}

fn default_settings() -> Value {
    serde_json::to_value(Settings::default()).unwrap_or_else(|_| json!({}))
}

fn deep_merge_defaults(target: &mut Value, defaults: &Value) {
    let (Some(target_obj), Some(default_obj)) = (target.as_object_mut(), defaults.as_object()) else {
        return;
    };

    for (key, default_value) in default_obj {
        match target_obj.get_mut(key) {
            Some(existing) => {
                if existing.is_null() {
                    *existing = default_value.clone();
                } else if existing.is_object() && default_value.is_object() {
                    deep_merge_defaults(existing, default_value);
                }
            }
            None => {
                target_obj.insert(key.clone(), default_value.clone());
            }
        }
    }
}

fn sanitize_settings(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    clamp_u64(obj, "intervalWeeks", 1, 520, 4);
    sanitize_enum(obj, "testCountMode", &["halved", "summed"], "halved");
    split_project_urls(obj);
}

/// Accepts either a JSON array or a single comma-separated string.
fn split_project_urls(map: &mut Map<String, Value>) {
    let urls: Vec<String> = match map.get("projectUrls") {
        Some(Value::String(joined)) => joined
            .split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(String::from)
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    };
    map.insert("projectUrls".to_string(), json!(urls));
}

fn clamp_u64(map: &mut Map<String, Value>, key: &str, min: u64, max: u64, default: u64) {
    let raw = map.get(key).and_then(Value::as_u64).unwrap_or(default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}

fn sanitize_enum(map: &mut Map<String, Value>, key: &str, allowed: &[&str], default: &str) {
    let valid = map
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| allowed.contains(value))
        .unwrap_or(default);
    map.insert(key.to_string(), json!(valid));
}
