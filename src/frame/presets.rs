use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FrameError, Result};
use crate::geometry::ScreenRect;

/// A device-frame preset: artwork reference plus the screen rect to use until
/// detection (or the user) overrides it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FramePreset {
    /// Stable identifier, used on the CLI and in config files.
    pub id: String,

    /// Human-readable label for pickers.
    pub display_label: String,

    /// Artwork path. Built-in presets ship without artwork and rely on the
    /// user pointing at a frame PNG; presets loaded from config may carry one.
    pub image_path: Option<PathBuf>,

    /// Screen rect to assume when no artwork is available for detection.
    pub default_screen_rect: ScreenRect,
}

/// Ordered registry of frame presets.
///
/// Presets are resolved once at load time, by id, with a single deterministic
/// fallback order for artwork: an explicit path always wins, then the
/// preset's own artwork, then no frame at all (full-canvas screen rect).
pub struct PresetRegistry {
    presets: Vec<FramePreset>,
}

impl PresetRegistry {
    /// Registry with the built-in presets, in display order.
    pub fn builtin() -> Self {
        let presets = vec![
            FramePreset {
                id: "phone".to_string(),
                display_label: "Phone (portrait)".to_string(),
                image_path: None,
                default_screen_rect: ScreenRect::new(6.0, 3.0, 88.0, 94.0),
            },
            FramePreset {
                id: "phone-landscape".to_string(),
                display_label: "Phone (landscape)".to_string(),
                image_path: None,
                default_screen_rect: ScreenRect::new(3.0, 6.0, 94.0, 88.0),
            },
            FramePreset {
                id: "tablet".to_string(),
                display_label: "Tablet".to_string(),
                image_path: None,
                default_screen_rect: ScreenRect::new(8.0, 7.0, 84.0, 86.0),
            },
            FramePreset {
                id: "laptop".to_string(),
                display_label: "Laptop".to_string(),
                image_path: None,
                default_screen_rect: ScreenRect::new(11.0, 6.0, 78.0, 82.0),
            },
        ];

        Self { presets }
    }

    /// Add a preset at the end of the order. A preset with an existing id
    /// replaces the original in place, keeping its position.
    pub fn register(&mut self, preset: FramePreset) {
        match self.presets.iter_mut().find(|p| p.id == preset.id) {
            Some(existing) => *existing = preset,
            None => self.presets.push(preset),
        }
    }

    pub fn get(&self, id: &str) -> Option<&FramePreset> {
        self.presets.iter().find(|p| p.id == id)
    }

    /// Presets in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &FramePreset> {
        self.presets.iter()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Resolve the artwork to use for a composition.
    ///
    /// Fallback order: explicit path, then the preset's artwork. Returns
    /// `Ok(None)` when neither is configured (composition proceeds without a
    /// frame). An unknown preset id is an error, not a silent fallthrough.
    pub fn resolve_image_path(
        &self,
        explicit: Option<&Path>,
        preset_id: Option<&str>,
    ) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            return Ok(Some(path.to_path_buf()));
        }

        match preset_id {
            Some(id) => {
                let preset = self.get(id).ok_or_else(|| FrameError::UnknownPreset {
                    id: id.to_string(),
                })?;
                Ok(preset.image_path.clone())
            }
            None => Ok(None),
        }
    }

    /// The screen rect to start from for a preset, before detection runs.
    pub fn default_screen_rect(&self, preset_id: Option<&str>) -> Result<ScreenRect> {
        match preset_id {
            Some(id) => {
                let preset = self.get(id).ok_or_else(|| FrameError::UnknownPreset {
                    id: id.to_string(),
                })?;
                Ok(preset.default_screen_rect)
            }
            None => Ok(ScreenRect::full()),
        }
    }
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_presets_available() {
        let registry = PresetRegistry::builtin();

        assert!(registry.get("phone").is_some());
        assert!(registry.get("tablet").is_some());
        assert!(registry.get("laptop").is_some());
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_registration_order_is_stable() {
        let registry = PresetRegistry::builtin();
        let ids: Vec<&str> = registry.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["phone", "phone-landscape", "tablet", "laptop"]);
    }

    #[test]
    fn test_register_replaces_in_place() {
        let mut registry = PresetRegistry::builtin();
        registry.register(FramePreset {
            id: "phone".to_string(),
            display_label: "Custom phone".to_string(),
            image_path: Some(PathBuf::from("custom.png")),
            default_screen_rect: ScreenRect::new(5.0, 5.0, 90.0, 90.0),
        });

        assert_eq!(registry.len(), 4);
        assert_eq!(registry.iter().next().unwrap().display_label, "Custom phone");
    }

    #[test]
    fn test_resolution_order() {
        let mut registry = PresetRegistry::builtin();
        registry.register(FramePreset {
            id: "bundled".to_string(),
            display_label: "Bundled".to_string(),
            image_path: Some(PathBuf::from("bundled.png")),
            default_screen_rect: ScreenRect::full(),
        });

        // Explicit path wins over the preset's artwork.
        let explicit = PathBuf::from("explicit.png");
        let resolved = registry
            .resolve_image_path(Some(&explicit), Some("bundled"))
            .unwrap();
        assert_eq!(resolved, Some(explicit));

        // Preset artwork when no explicit path is given.
        let resolved = registry.resolve_image_path(None, Some("bundled")).unwrap();
        assert_eq!(resolved, Some(PathBuf::from("bundled.png")));

        // Nothing configured: no frame.
        assert_eq!(registry.resolve_image_path(None, None).unwrap(), None);
    }

    #[test]
    fn test_unknown_preset_is_an_error() {
        let registry = PresetRegistry::builtin();
        assert!(registry.resolve_image_path(None, Some("missing")).is_err());
        assert!(registry.default_screen_rect(Some("missing")).is_err());
    }

    #[test]
    fn test_default_rect_without_preset_is_full_canvas() {
        let registry = PresetRegistry::builtin();
        let rect = registry.default_screen_rect(None).unwrap();
        assert_eq!(rect, ScreenRect::full());
    }
}
