use crate::settings::{RenderMode, SeedPattern, SimulationSettings};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("preset file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("preset serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A named preset containing simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub description: String,
    pub settings: SimulationSettings,
}

impl Preset {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        settings: SimulationSettings,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            settings,
        }
    }
}

/// Built-in presets plus user presets stored as JSON files
pub struct PresetManager {
    pub builtin: Vec<Preset>,
    pub user: Vec<Preset>,
    dir: Option<PathBuf>,
}

impl Default for PresetManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetManager {
    /// Manager backed by the per-user config directory
    pub fn new() -> Self {
        Self::with_dir(Self::default_dir())
    }

    /// Manager backed by `dir`; `None` disables user presets
    pub fn with_dir(dir: Option<PathBuf>) -> Self {
        let mut manager = Self {
            builtin: builtin_presets(),
            user: Vec::new(),
            dir,
        };
        manager.load_user_presets();
        manager
    }

    fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("sand-timer").join("presets"))
    }

    fn load_user_presets(&mut self) {
        let Some(dir) = &self.dir else { return };
        let Ok(entries) = fs::read_dir(dir) else { return };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            match read_preset(&path) {
                Ok(preset) => self.user.push(preset),
                Err(e) => warn!("Skipping preset {}: {}", path.display(), e),
            }
        }
        debug!("Loaded {} user presets", self.user.len());
    }

    /// Save a preset to disk, replacing a user preset of the same name
    pub fn save_preset(&mut self, preset: Preset) -> Result<PathBuf, PresetError> {
        let dir = self.dir.as_ref().ok_or(PresetError::NoConfigDir)?;
        fs::create_dir_all(dir)?;

        let path = dir.join(preset_filename(&preset.name));
        fs::write(&path, serde_json::to_string_pretty(&preset)?)?;

        match self.user.iter_mut().find(|p| p.name == preset.name) {
            Some(existing) => *existing = preset,
            None => self.user.push(preset),
        }
        Ok(path)
    }

    /// Delete a user preset
    pub fn delete_preset(&mut self, name: &str) -> Result<(), PresetError> {
        let dir = self.dir.as_ref().ok_or(PresetError::NoConfigDir)?;
        self.user.retain(|p| p.name != name);

        let path = dir.join(preset_filename(name));
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// All presets, built-in first
    pub fn all_presets(&self) -> impl Iterator<Item = &Preset> {
        self.builtin.iter().chain(self.user.iter())
    }

    /// Find a preset by name, ignoring case
    pub fn find(&self, name: &str) -> Option<&Preset> {
        self.all_presets().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn preset_names(&self) -> Vec<&str> {
        self.all_presets().map(|p| p.name.as_str()).collect()
    }
}

fn read_preset(path: &Path) -> Result<Preset, PresetError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn preset_filename(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{}.json", stem)
}

fn builtin_presets() -> Vec<Preset> {
    vec![
        Preset::new(
            "Classic",
            "5x5 block of sand at full speed",
            SimulationSettings::default(),
        ),
        Preset::new(
            "Fine Sand",
            "Supersampled grains shaded by density",
            SimulationSettings {
                render_mode: RenderMode::Density,
                supersample: 2,
                frame_rate: 20,
                seed_pattern: SeedPattern::Fill,
                ..Default::default()
            },
        ),
        Preset::new(
            "Hourglass",
            "Sand drains through a narrow neck",
            SimulationSettings {
                seed_pattern: SeedPattern::Hourglass,
                frame_rate: 30,
                ..Default::default()
            },
        ),
        Preset::new(
            "Slow Motion",
            "Weak gravity and a low speed limit",
            SimulationSettings {
                gravity_scale: 48.0,
                max_speed: 64,
                seed_size: 10,
                ..Default::default()
            },
        ),
        Preset::new(
            "Obstacle",
            "Block of sand falling onto a single peg",
            SimulationSettings {
                seed_size: 8,
                seed_x: 10,
                seed_y: 2,
                obstacle: Some((14, 20)),
                ..Default::default()
            },
        ),
        Preset::new(
            "Scatter",
            "Loose grains sprinkled over the top half",
            SimulationSettings {
                seed_pattern: SeedPattern::Scatter,
                ..Default::default()
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_lookup_ignores_case() {
        let manager = PresetManager::with_dir(None);
        let preset = manager.find("fine sand").unwrap();
        assert_eq!(preset.settings.render_mode, RenderMode::Density);
        assert_eq!(preset.settings.frame_rate, 20);
        assert!(manager.find("no such preset").is_none());
        assert_eq!(manager.preset_names().len(), 6);
    }

    #[test]
    fn test_builtins_are_within_bounds() {
        for preset in builtin_presets() {
            assert_eq!(preset.settings.clone().sanitized(), preset.settings, "{}", preset.name);
        }
    }

    #[test]
    fn test_save_load_delete_user_preset() {
        let dir = TempDir::new().unwrap();
        let path = Some(dir.path().join("presets"));

        let mut manager = PresetManager::with_dir(path.clone());
        let preset = Preset::new(
            "My Sand/1",
            "custom",
            SimulationSettings {
                frame_rate: 12,
                ..Default::default()
            },
        );
        let file = manager.save_preset(preset.clone()).unwrap();
        assert!(file.ends_with("My_Sand_1.json"));

        let reloaded = PresetManager::with_dir(path.clone());
        assert_eq!(reloaded.find("my sand/1"), Some(&preset));

        manager.delete_preset("My Sand/1").unwrap();
        assert!(!file.exists());
        assert!(PresetManager::with_dir(path).user.is_empty());
    }

    #[test]
    fn test_corrupt_preset_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.json"), "{ nope").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let manager = PresetManager::with_dir(Some(dir.path().to_path_buf()));
        assert!(manager.user.is_empty());
    }

    #[test]
    fn test_save_without_dir_fails() {
        let mut manager = PresetManager::with_dir(None);
        let result = manager.save_preset(Preset::new("x", "", SimulationSettings::default()));
        assert!(matches!(result, Err(PresetError::NoConfigDir)));
    }
}
