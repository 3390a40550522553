//! Game settings and preferences
//!
//! Loaded from a JSON file on native builds; the browser build starts from
//! defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::layout::LayoutRequest;
use crate::sim::Progression;

pub use crate::sim::GameMode;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// Colour themes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Theme {
    #[default]
    Standard,
    Dark,
    HighContrast,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Standard => "Standard",
            Theme::Dark => "Dark",
            Theme::HighContrast => "High Contrast",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "standard" | "default" => Some(Theme::Standard),
            "dark" => Some(Theme::Dark),
            "high_contrast" | "high-contrast" | "high contrast" | "contrast" => {
                Some(Theme::HighContrast)
            }
            _ => None,
        }
    }

    pub fn palette(&self) -> Palette {
        match self {
            Theme::Standard => Palette {
                canvas: "#ffffff",
                path: "#007bff",
                visited: "#28a745",
                bonus: "#ffd700",
                next: "#ff4500",
                open: "#dc3545",
                label: "#ffffff",
                obstacle: "#6c757d",
            },
            Theme::Dark => Palette {
                canvas: "#1e1e24",
                path: "#4dabf7",
                visited: "#51cf66",
                bonus: "#fcc419",
                next: "#ff922b",
                open: "#ff6b6b",
                label: "#1e1e24",
                obstacle: "#868e96",
            },
            Theme::HighContrast => Palette {
                canvas: "#000000",
                path: "#ffff00",
                visited: "#00ff00",
                bonus: "#ff00ff",
                next: "#00ffff",
                open: "#ffffff",
                label: "#000000",
                obstacle: "#808080",
            },
        }
    }
}

/// CSS colours used to draw a round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub canvas: &'static str,
    pub path: &'static str,
    pub visited: &'static str,
    pub bonus: &'static str,
    pub next: &'static str,
    pub open: &'static str,
    pub label: &'static str,
    pub obstacle: &'static str,
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Free play or countdown
    pub mode: GameMode,
    /// Points in the first round
    pub point_count: usize,
    /// Starting level (1..=5)
    pub level: u32,

    // === Canvas ===
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub point_radius: f32,

    // === Variants ===
    /// Drifting obstacles
    pub moving_obstacles: bool,
    /// Layout seed (random when unset)
    pub seed: Option<u64>,

    // === Look ===
    pub theme: Theme,
    /// Overrides the theme's path colour
    pub path_color: Option<String>,
    /// Overrides the theme's canvas colour
    pub canvas_color: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: GameMode::Free,
            point_count: DEFAULT_POINT_COUNT,
            level: 1,

            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            point_radius: POINT_RADIUS,

            moving_obstacles: false,
            seed: None,

            theme: Theme::Standard,
            path_color: None,
            canvas_color: None,
        }
    }
}

impl Settings {
    /// Parse and validate settings JSON
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)?;
        log::info!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Load settings, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::info!("Using default settings ({})", e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(MIN_POINT_COUNT..=MAX_POINT_COUNT).contains(&self.point_count) {
            return Err(SettingsError::Invalid(format!(
                "point_count must be between {} and {}, got {}",
                MIN_POINT_COUNT, MAX_POINT_COUNT, self.point_count
            )));
        }
        if !(1..=MAX_LEVEL).contains(&self.level) {
            return Err(SettingsError::Invalid(format!(
                "level must be between 1 and {}, got {}",
                MAX_LEVEL, self.level
            )));
        }
        if self.point_radius <= 0.0 {
            return Err(SettingsError::Invalid("point_radius must be positive".into()));
        }
        let min_side = self.point_radius * 4.0 + MIN_POINT_DISTANCE;
        if self.canvas_width < min_side || self.canvas_height < min_side {
            return Err(SettingsError::Invalid(format!(
                "canvas must be at least {}x{}",
                min_side, min_side
            )));
        }
        Ok(())
    }

    /// Starting difficulty
    pub fn progression(&self) -> Progression {
        Progression::new(self.level, self.point_count)
    }

    /// Layout request for a round at the given difficulty
    pub fn layout_request(&self, progression: Progression) -> LayoutRequest {
        LayoutRequest {
            count: progression.point_count,
            level: progression.level,
            width: self.canvas_width,
            height: self.canvas_height,
            point_radius: self.point_radius,
            moving_obstacles: self.moving_obstacles,
        }
    }

    /// Theme palette with colour overrides applied
    pub fn path_color(&self) -> &str {
        self.path_color
            .as_deref()
            .unwrap_or(self.theme.palette().path)
    }

    pub fn canvas_color(&self) -> &str {
        self.canvas_color
            .as_deref()
            .unwrap_or(self.theme.palette().canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{ "mode": "Time", "point_count": 12 }"#).unwrap();
        assert_eq!(settings.mode, GameMode::Time);
        assert_eq!(settings.point_count, 12);
        assert_eq!(settings.level, 1);
        assert_eq!(settings.theme, Theme::Standard);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let err = Settings::from_json(r#"{ "point_count": 40 }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
        let err = Settings::from_json(r#"{ "level": 0 }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
        let err = Settings::from_json("not json").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn test_json_round_trip() {
        let settings = Settings {
            mode: GameMode::Time,
            seed: Some(77),
            theme: Theme::Dark,
            path_color: Some("#123456".into()),
            ..Settings::default()
        };
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_color_overrides() {
        let mut settings = Settings::default();
        assert_eq!(settings.path_color(), "#007bff");
        settings.path_color = Some("#ff0000".into());
        settings.theme = Theme::Dark;
        assert_eq!(settings.path_color(), "#ff0000");
        assert_eq!(settings.canvas_color(), "#1e1e24");
    }

    #[test]
    fn test_theme_from_str() {
        assert_eq!(Theme::from_str("DARK"), Some(Theme::Dark));
        assert_eq!(Theme::from_str("high-contrast"), Some(Theme::HighContrast));
        assert_eq!(Theme::from_str("neon"), None);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir()
            .join(format!("dot-link-settings-{}.json", std::process::id()));
        let settings = Settings {
            level: 3,
            moving_obstacles: true,
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        let loaded = Settings::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_file() {
        let err = Settings::load("/nonexistent/dot-link.json").unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
        assert_eq!(
            Settings::load_or_default("/nonexistent/dot-link.json"),
            Settings::default()
        );
    }
}
