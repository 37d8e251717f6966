//! Engine settings

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Look of one kind of highlight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightStyle {
    /// Color RGBA
    pub color: [u8; 4],
    /// Point size or line width in pixels
    pub size: f32,
}

impl HighlightStyle {
    /// Color as normalized floats
    pub fn rgba(&self) -> [f32; 4] {
        self.color.map(|c| c as f32 / 255.0)
    }
}

/// Highlight styles per element kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightSettings {
    pub vertex: HighlightStyle,
    pub edge: HighlightStyle,
    pub face: HighlightStyle,
}

impl Default for HighlightSettings {
    fn default() -> Self {
        Self {
            vertex: HighlightStyle {
                color: [255, 160, 0, 255],
                size: 8.0,
            },
            edge: HighlightStyle {
                color: [0, 220, 255, 255],
                size: 3.0,
            },
            face: HighlightStyle {
                color: [0, 220, 255, 96],
                size: 1.0,
            },
        }
    }
}

/// All engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Undo steps kept per session
    pub undo_depth: usize,
    /// Reject edge/vertex candidates farther than this from the pointer (pixels);
    /// `None` accepts any element of the face under the pointer
    pub pick_radius_px: Option<f32>,
    /// Screen distances closer than this count as equal
    pub screen_tie_epsilon_px: f32,
    /// Start offset of the occlusion ray
    pub obstruction_bias: f32,
    /// Highlight styles
    pub highlight: HighlightSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            undo_depth: 32,
            pick_radius_px: None,
            screen_tie_epsilon_px: 0.5,
            obstruction_bias: 1e-4,
            highlight: HighlightSettings::default(),
        }
    }
}

impl EngineSettings {
    /// Load settings from file, or return default if not found
    pub fn load() -> Self {
        if let Some(dirs) = directories::ProjectDirs::from("com", "meshedit", "meshedit") {
            let config_path = dirs.config_dir().join("settings.json");
            if let Ok(settings) = Self::load_from(&config_path) {
                return settings;
            }
        }
        Self::default()
    }

    /// Save settings to file
    pub fn save(&self) {
        if let Some(dirs) = directories::ProjectDirs::from("com", "meshedit", "meshedit") {
            let config_dir = dirs.config_dir();
            if std::fs::create_dir_all(config_dir).is_ok() {
                if let Err(e) = self.save_to(&config_dir.join("settings.json")) {
                    tracing::warn!("Failed to save settings: {}", e);
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, String> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        std::fs::write(path, json).map_err(|e| format!("cannot write {}: {e}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("JSON parse error: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = EngineSettings::default();
        assert_eq!(s.undo_depth, 32);
        assert_eq!(s.pick_radius_px, None);
        assert_eq!(s.highlight.edge.rgba()[3], 1.0);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let s = EngineSettings::from_json(r#"{ "undo_depth": 4, "pick_radius_px": 12.0 }"#).unwrap();
        assert_eq!(s.undo_depth, 4);
        assert_eq!(s.pick_radius_px, Some(12.0));
        assert_eq!(s.screen_tie_epsilon_px, 0.5);
    }

    #[test]
    fn test_bad_json() {
        assert!(EngineSettings::from_json("{ undo_depth").is_err());
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("meshedit-settings-{}.json", uuid::Uuid::new_v4()));
        let mut s = EngineSettings::default();
        s.undo_depth = 7;
        s.save_to(&path).unwrap();
        assert_eq!(EngineSettings::load_from(&path).unwrap(), s);
        let _ = std::fs::remove_file(&path);
    }
}
