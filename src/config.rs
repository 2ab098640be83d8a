//! Board settings - layout constants, tween timings, and command line overrides.

use std::{f32::consts::FRAC_PI_4, path::Path, time::Duration};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub(super) fn plugin(app: &mut App) {
    app.register_type::<BoardSettings>();
    app.insert_resource(BoardSettings::from_args(std::env::args()));
}

/// Failure to read a settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed settings file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Layout and timing of the board. Lengths are world units, durations milliseconds.
#[derive(Resource, Reflect, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[reflect(Resource)]
#[serde(default)]
pub struct BoardSettings {
    pub card_width: f32,
    pub card_height: f32,
    pub card_thickness: f32,
    /// Horizontal gap between neighbouring hand cards.
    pub margin: f32,
    pub deck_size: usize,
    pub deck_origin: Vec3,
    /// Height added per card stacked on the deck.
    pub deck_step: f32,
    pub menu_card_position: Vec3,
    pub hand_height: f32,
    pub hand_depth: f32,
    pub hand_tilt: f32,
    pub hover_rise: f32,
    pub hover_advance: f32,
    pub hover_scale: f32,
    pub inspect_position: Vec3,
    pub backdrop_opacity: f32,
    pub flip_rise: f32,
    pub hover_ms: u64,
    pub hand_move_ms: u64,
    pub hand_turn_ms: u64,
    pub zoom_ms: u64,
    pub fade_ms: u64,
    pub flip_half_ms: u64,
    pub face_image: String,
    pub back_image: String,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            card_width: 13.5,
            card_height: 18.0,
            card_thickness: 0.01,
            margin: 3.0,
            deck_size: 40,
            deck_origin: Vec3::new(75.0, 1.0, 50.0),
            deck_step: 0.2,
            menu_card_position: Vec3::new(25.0, 1.0, 25.0),
            hand_height: 15.0,
            hand_depth: 90.0,
            hand_tilt: -FRAC_PI_4,
            hover_rise: 10.0 * 3f32.sqrt(),
            hover_advance: 10.0,
            hover_scale: 1.2,
            inspect_position: Vec3::new(0.0, 150.0, 150.0),
            backdrop_opacity: 0.5,
            flip_rise: 20.0,
            hover_ms: 100,
            hand_move_ms: 250,
            hand_turn_ms: 500,
            zoom_ms: 250,
            fade_ms: 100,
            flip_half_ms: 250,
            face_image: "images/Airman.jpg".to_string(),
            back_image: "images/cardback.jpg".to_string(),
        }
    }
}

impl BoardSettings {
    /// Distance between the centres of neighbouring hand cards.
    pub fn hand_pitch(&self) -> f32 {
        self.card_width + self.margin
    }

    pub fn card_half_extents(&self) -> Vec3 {
        Vec3::new(self.card_width, self.card_height, self.card_thickness) * 0.5
    }

    pub fn millis(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Build settings from `--settings=<path>` and `--deck-size=<n>` arguments.
    pub fn from_args(args: impl IntoIterator<Item = String>) -> Self {
        let args: Vec<String> = args.into_iter().collect();

        let mut settings = args
            .iter()
            .find_map(|arg| arg.strip_prefix("--settings="))
            .map(|path| match Self::load(path) {
                Ok(settings) => {
                    info!("Loaded board settings from {}", path);
                    settings
                }
                Err(err) => {
                    warn!("Falling back to default board settings: {}", err);
                    Self::default()
                }
            })
            .unwrap_or_default();

        if let Some(size) = args
            .iter()
            .find_map(|arg| arg.strip_prefix("--deck-size="))
            .and_then(|n| n.parse::<usize>().ok())
        {
            settings.deck_size = size;
        }

        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults_match_board_layout() {
        let settings = BoardSettings::default();
        assert_eq!(settings.hand_pitch(), 16.5);
        assert_eq!(settings.deck_size, 40);
        assert_eq!(settings.card_half_extents(), Vec3::new(6.75, 9.0, 0.005));
    }

    #[test]
    fn test_deck_size_override() {
        let settings = BoardSettings::from_args(args(&["board", "--deck-size=5"]));
        assert_eq!(settings.deck_size, 5);

        let settings = BoardSettings::from_args(args(&["board", "--deck-size=lots"]));
        assert_eq!(settings.deck_size, 40);
    }

    #[test]
    fn test_missing_settings_file_uses_defaults() {
        let settings =
            BoardSettings::from_args(args(&["board", "--settings=/nonexistent/board.json"]));
        assert_eq!(settings, BoardSettings::default());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: BoardSettings = serde_json::from_str(r#"{"margin": 1.5}"#).unwrap();
        assert_eq!(settings.margin, 1.5);
        assert_eq!(settings.card_width, 13.5);
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let path = std::env::temp_dir().join("hopup-board-bad-settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            BoardSettings::load(&path),
            Err(SettingsError::Parse(_))
        ));
        let _ = std::fs::remove_file(path);
    }
}
