use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::CleaveError;

pub const CONFIG_FILE_NAME: &str = "cleave.toml";
const FALLBACK_PROJECT_NAME: &str = "app";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Toml,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CleaveToml {
    #[serde(default)]
    pub project: CleaveTomlProject,
    #[serde(default)]
    pub build: BuildSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CleaveTomlProject {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSettings {
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
    #[serde(default = "default_compatibility_date")]
    pub compatibility_date: String,
    /// Entry script path, relative to each unit's output directory.
    #[serde(default = "default_main")]
    pub main: String,
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
            compatibility_date: default_compatibility_date(),
            main: default_main(),
            format: OutputFormat::default(),
        }
    }
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("target/cleave-gen")
}

fn default_compatibility_date() -> String {
    "2024-01-01".to_string()
}

fn default_main() -> String {
    "src/index.js".to_string()
}

/// Resolved settings for one compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    pub name: String,
    pub build: BuildSettings,
    /// The `cleave.toml` the settings came from, if any.
    pub path: Option<PathBuf>,
}

impl ProjectConfig {
    /// Defaults for a source file with no configuration file.
    pub fn for_source(source: &Path) -> Self {
        Self {
            name: project_name_from_path(source),
            build: BuildSettings::default(),
            path: None,
        }
    }

    pub fn override_name(&mut self, name: Option<String>) {
        if let Some(name) = name {
            self.name = name;
        }
    }

    pub fn override_format(&mut self, format: Option<OutputFormat>) {
        if let Some(format) = format {
            self.build.format = format;
        }
    }

    pub fn override_out_dir(&mut self, out_dir: Option<PathBuf>) {
        if let Some(out_dir) = out_dir {
            self.build.out_dir = out_dir;
        }
    }
}

pub fn read_cleave_toml(path: &Path) -> Result<CleaveToml, CleaveError> {
    let text = std::fs::read_to_string(path).map_err(|err| {
        CleaveError::Config(format!("failed to read {}: {err}", path.display()))
    })?;
    toml::from_str(&text)
        .map_err(|err| CleaveError::Config(format!("failed to parse {}: {err}", path.display())))
}

/// Picks the configuration file for `source`: an explicit path wins, then a
/// `cleave.toml` beside the source file, then one in the working directory.
pub fn find_config(explicit: Option<&Path>, source: &Path) -> Option<PathBuf> {
    if let Some(explicit) = explicit {
        return Some(explicit.to_path_buf());
    }
    let beside = source
        .parent()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file());
    if beside.is_some() {
        return beside;
    }
    let cwd = PathBuf::from(CONFIG_FILE_NAME);
    cwd.is_file().then_some(cwd)
}

pub fn load_project_config(
    explicit: Option<&Path>,
    source: &Path,
) -> Result<ProjectConfig, CleaveError> {
    let Some(path) = find_config(explicit, source) else {
        log::debug!("no {CONFIG_FILE_NAME} found for {}; using defaults", source.display());
        return Ok(ProjectConfig::for_source(source));
    };
    log::info!("using configuration {}", path.display());
    let toml = read_cleave_toml(&path)?;
    let name = match toml.project.name {
        Some(name) if !name.trim().is_empty() => name,
        _ => project_name_from_path(source),
    };
    Ok(ProjectConfig {
        name,
        build: toml.build,
        path: Some(path),
    })
}

pub fn project_name_from_path(source: &Path) -> String {
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_default();
    sanitize_project_name(&stem)
}

/// Lower-cases and maps everything outside `[a-z0-9-]` to `-`, collapsing runs.
pub fn sanitize_project_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        let ch = ch.to_ascii_lowercase();
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            out.push(ch);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        FALLBACK_PROJECT_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}
