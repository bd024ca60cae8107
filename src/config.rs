//! Settings file loading.

use directories::ProjectDirs;
use serde::Deserialize;
use sheetcalc_core::{DocumentSettings, RecalcMode};
use std::path::PathBuf;

const MAX_CONFIG_FILE_BYTES: u64 = 65_536; // 64 KiB

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub recalc: RecalcMode,
}

impl Settings {
    pub fn document_settings(&self) -> DocumentSettings {
        DocumentSettings {
            recalc: self.recalc,
        }
    }
}

/// Load settings from `config_file`, or from the user config dir when not given.
///
/// Never fails: problems are returned as warnings alongside the defaults.
pub fn load_settings(config_file: Option<&PathBuf>) -> (Settings, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let Some(path) = config_file.cloned().or_else(user_config_path) else {
        return (Settings::default(), warnings);
    };

    if !path.exists() {
        if config_file.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (Settings::default(), warnings);
    }

    match std::fs::metadata(&path) {
        Ok(meta) if meta.len() > MAX_CONFIG_FILE_BYTES => {
            warnings.push(format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            ));
        }
        Ok(_) => match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<Settings>(&content) {
                Ok(settings) => return (settings, warnings),
                Err(err) => warnings.push(format!("Failed to parse {}: {}", path.display(), err)),
            },
            Err(err) => warnings.push(format!("Failed to read {}: {}", path.display(), err)),
        },
        Err(err) => warnings.push(format!(
            "Failed to read metadata for {}: {}",
            path.display(),
            err
        )),
    }

    (Settings::default(), warnings)
}

/// Parse a `--recalc` value.
pub fn parse_recalc_mode(name: &str) -> Option<RecalcMode> {
    match name.trim().to_ascii_lowercase().as_str() {
        "topological" => Some(RecalcMode::Topological),
        "depth-first" | "dfs" => Some(RecalcMode::DepthFirst),
        _ => None,
    }
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "sheetcalc")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}
