//! JSON configuration for a surface and its window

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use log::{debug, warn};

use crate::display::{FontSpec, Surface, TextAlign, TextBaseline};
use crate::error::{Result, RetroError};
use crate::palette::{Palette, PaletteSpec};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logical resolution
    pub width: u32,
    pub height: u32,
    /// Window (destination) size
    pub window_width: u32,
    pub window_height: u32,
    pub palette: Option<PaletteSpec>,
    pub fonts: Vec<FontSpec>,
    /// Font selected at startup
    pub font: Option<String>,
    pub text_align: String,
    pub text_baseline: String,
    pub safe_mode: bool,
    pub auto_commit: bool,
    pub vsync: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 320,
            height: 200,
            window_width: 960,
            window_height: 600,
            palette: None,
            fonts: Vec::new(),
            font: None,
            text_align: "left".to_string(),
            text_baseline: "top".to_string(),
            safe_mode: true,
            auto_commit: true,
            vsync: true,
        }
    }
}

impl Config {
    /// Save config to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .map_err(|e| RetroError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load config from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| RetroError::Config(format!("{}: {}", path.display(), e)))?;
        let config = serde_json::from_str(&json)?;
        debug!("config loaded from {}", path.display());
        Ok(config)
    }

    /// Build a surface with this config's resolution, palette, modes and
    /// fonts. Path fonts are still loading when this returns.
    pub fn build_surface(&self) -> Result<Surface> {
        let mut surface = Surface::new(
            self.width,
            self.height,
            self.window_width,
            self.window_height,
        )?;

        if let Some(spec) = &self.palette {
            surface.set_palette(Some(Palette::from_spec(spec)?));
        }
        surface
            .set_safe_mode(self.safe_mode)
            .set_auto_commit(self.auto_commit);

        let align = self.text_align.parse::<TextAlign>().unwrap_or_else(|e| {
            warn!("{}; using left", e);
            TextAlign::Left
        });
        let baseline = self.text_baseline.parse::<TextBaseline>().unwrap_or_else(|e| {
            warn!("{}; using top", e);
            TextBaseline::Top
        });
        surface.set_text_align(align).set_text_baseline(baseline);

        surface.add_fonts(
            self.fonts.clone(),
            None,
            Some(Box::new(|e: &RetroError| warn!("font skipped: {}", e))),
        )?;
        if let Some(id) = &self.font {
            if surface.set_font(id).is_err() {
                // Path fonts only exist once their load finishes
                surface.finish_font_loads()?;
                surface.set_font(id)?;
            }
        }

        Ok(surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: Config = serde_json::from_str(r#"{"width": 160}"#).unwrap();
        assert_eq!(config.width, 160);
        assert_eq!(config.height, 200);
        assert!(config.vsync);
        assert!(config.palette.is_none());
    }

    #[test]
    fn test_palette_forms() {
        let config: Config = serde_json::from_str(r#"{"palette": "c64"}"#).unwrap();
        assert_eq!(config.palette, Some(PaletteSpec::Named("c64".to_string())));

        let config: Config =
            serde_json::from_str(r#"{"palette": [[0,0,0],[255,255,255]]}"#).unwrap();
        let surface = config.build_surface().unwrap();
        assert_eq!(surface.palette().map(Palette::len), Some(2));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("retrosim-config-{}.json", std::process::id()));
        let mut config = Config::default();
        config.width = 64;
        config.text_align = "center".to_string();
        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Config::load("/nonexistent/retrosim.json"),
            Err(RetroError::Config(_))
        ));
    }

    #[test_log::test]
    fn test_build_surface_applies_settings() {
        let config: Config = serde_json::from_str(
            r#"{"width": 100, "height": 50, "safe_mode": false, "text_align": "justify",
                "text_baseline": "middle", "font": "builtin"}"#,
        )
        .unwrap();
        let surface = config.build_surface().unwrap();
        assert_eq!(surface.resolution(), (96, 50));
        assert!(!surface.safe_mode());
        assert_eq!(surface.text_align(), TextAlign::Left);
        assert_eq!(surface.text_baseline(), TextBaseline::Middle);
        assert_eq!(surface.font(), Some("builtin"));
    }

    #[test]
    fn test_bad_resolution_fails() {
        let config = Config {
            width: 4,
            ..Config::default()
        };
        assert!(matches!(
            config.build_surface(),
            Err(RetroError::InvalidResolution { .. })
        ));
    }
}
