//! Per-character configuration.
//!
//! Every character directory holds three JSON files: `sprite-map.json`
//! (sheet geometry plus one sheet file per sequence), `frame-count.json`
//! and `emote-config.json`. They are read once and shared through
//! [`ConfigCache`].

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bevy::log::info;
use bevy::math::UVec2;
use bevy::prelude::Resource;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::state::Sequence;

pub const SPRITE_MAP_FILE: &str = "sprite-map.json";
pub const FRAME_COUNT_FILE: &str = "frame-count.json";
pub const EMOTE_CONFIG_FILE: &str = "emote-config.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration for character {character}: {reason}")]
    Invalid { character: String, reason: String },
}

/// Sheet geometry and the sheet file that backs each sequence.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct SpriteMap {
    pub frame_rate: f32,
    pub sprite_column: u32,
    pub frame_height: u32,
    pub frame_width: u32,
    #[serde(default)]
    pub top_hotspot_height: u32,
    #[serde(default)]
    pub top_hotspot_width: u32,
    pub idle: String,
    pub hover: String,
    pub click: String,
    pub sleep: String,
    pub intro: String,
    pub outro: String,
    pub grab: String,
    pub up: String,
    pub down: String,
    pub left: String,
    pub right: String,
    pub up_left: String,
    pub up_right: String,
    pub down_left: String,
    pub down_right: String,
    pub walk_idle: String,
    pub pat: String,
    pub emote: String,
}

impl SpriteMap {
    pub fn file(&self, seq: Sequence) -> &str {
        match seq {
            Sequence::Idle => &self.idle,
            Sequence::Hover => &self.hover,
            Sequence::Click => &self.click,
            Sequence::Sleep => &self.sleep,
            Sequence::Intro => &self.intro,
            Sequence::Outro => &self.outro,
            Sequence::Grab => &self.grab,
            Sequence::Up => &self.up,
            Sequence::Down => &self.down,
            Sequence::Left => &self.left,
            Sequence::Right => &self.right,
            Sequence::UpLeft => &self.up_left,
            Sequence::UpRight => &self.up_right,
            Sequence::DownLeft => &self.down_left,
            Sequence::DownRight => &self.down_right,
            Sequence::WalkIdle => &self.walk_idle,
            Sequence::Pat => &self.pat,
            Sequence::Emote => &self.emote,
        }
    }

    pub fn frame_size(&self) -> UVec2 {
        UVec2::new(self.frame_width, self.frame_height)
    }

    /// Distinct sheet files, in sequence order.
    pub fn sheet_files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = Vec::with_capacity(Sequence::COUNT);
        for seq in Sequence::ALL {
            let file = self.file(seq);
            if !files.contains(&file) {
                files.push(file);
            }
        }
        files
    }
}

/// Number of frames in each sequence's sheet.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct FrameCount {
    pub idle: u32,
    pub hover: u32,
    pub click: u32,
    pub sleep: u32,
    pub intro: u32,
    pub outro: u32,
    pub grab: u32,
    pub up: u32,
    pub down: u32,
    pub left: u32,
    pub right: u32,
    pub up_left: u32,
    pub up_right: u32,
    pub down_left: u32,
    pub down_right: u32,
    pub walk_idle: u32,
    pub pat: u32,
    pub emote: u32,
}

impl FrameCount {
    pub fn get(&self, seq: Sequence) -> u32 {
        match seq {
            Sequence::Idle => self.idle,
            Sequence::Hover => self.hover,
            Sequence::Click => self.click,
            Sequence::Sleep => self.sleep,
            Sequence::Intro => self.intro,
            Sequence::Outro => self.outro,
            Sequence::Grab => self.grab,
            Sequence::Up => self.up,
            Sequence::Down => self.down,
            Sequence::Left => self.left,
            Sequence::Right => self.right,
            Sequence::UpLeft => self.up_left,
            Sequence::UpRight => self.up_right,
            Sequence::DownLeft => self.down_left,
            Sequence::DownRight => self.down_right,
            Sequence::WalkIdle => self.walk_idle,
            Sequence::Pat => self.pat,
            Sequence::Emote => self.emote,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct EmoteConfig {
    pub annoy_emote: bool,
    pub min_emote_trigger_minutes: f32,
    pub max_emote_trigger_minutes: f32,
    /// Milliseconds.
    pub emote_duration: u64,
}

impl EmoteConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.emote_duration)
    }

    /// Bounds of the random wait before the next emote. A bound too large
    /// for a `Duration` comes back as zero, which disables emotes.
    pub fn trigger_window(&self) -> (Duration, Duration) {
        (
            minutes(self.min_emote_trigger_minutes).unwrap_or_default(),
            minutes(self.max_emote_trigger_minutes).unwrap_or_default(),
        )
    }
}

/// Negative minutes count as zero; `None` when not representable.
fn minutes(m: f32) -> Option<Duration> {
    if !m.is_finite() {
        return None;
    }
    Duration::try_from_secs_f32(m.max(0.0) * 60.0).ok()
}

#[derive(Clone, Debug, PartialEq)]
pub struct CharacterConfig {
    pub name: String,
    pub sprite_map: SpriteMap,
    pub frame_count: FrameCount,
    pub emote: EmoteConfig,
}

impl CharacterConfig {
    /// Read the three config files from `dir`.
    pub fn load(name: &str, dir: &Path) -> Result<Self, ConfigError> {
        let config = Self {
            name: name.to_string(),
            sprite_map: read_json(&dir.join(SPRITE_MAP_FILE))?,
            frame_count: read_json(&dir.join(FRAME_COUNT_FILE))?,
            emote: read_json(&dir.join(EMOTE_CONFIG_FILE))?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::Invalid {
            character: self.name.clone(),
            reason: reason.to_string(),
        };
        let map = &self.sprite_map;
        if map.sprite_column == 0 {
            return Err(invalid("SpriteColumn must be at least 1"));
        }
        if map.frame_width == 0 || map.frame_height == 0 {
            return Err(invalid("FrameWidth and FrameHeight must be non-zero"));
        }
        if map.frame_rate.is_nan() || map.frame_rate <= 0.0 {
            return Err(invalid("FrameRate must be positive"));
        }
        let emote = &self.emote;
        for (key, value) in [
            ("MinEmoteTriggerMinutes", emote.min_emote_trigger_minutes),
            ("MaxEmoteTriggerMinutes", emote.max_emote_trigger_minutes),
        ] {
            if minutes(value).is_none() {
                return Err(invalid(&format!("{} is out of range", key)));
            }
        }
        if emote.min_emote_trigger_minutes > emote.max_emote_trigger_minutes {
            return Err(invalid(
                "MinEmoteTriggerMinutes exceeds MaxEmoteTriggerMinutes",
            ));
        }
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Loaded character configs, keyed by character name. Owned by the host and
/// handed to whoever needs a config; nothing is cached behind its back.
#[derive(Resource, Debug)]
pub struct ConfigCache {
    root: PathBuf,
    configs: HashMap<String, Arc<CharacterConfig>>,
}

impl ConfigCache {
    /// `root` is the directory holding one sub-directory per character.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            configs: HashMap::new(),
        }
    }

    pub fn get(&mut self, character: &str) -> Result<Arc<CharacterConfig>, ConfigError> {
        if let Some(config) = self.configs.get(character) {
            return Ok(Arc::clone(config));
        }
        let config = Arc::new(CharacterConfig::load(character, &self.root.join(character))?);
        info!(
            "Loaded character {} ({}x{} frames at {} fps)",
            character,
            config.sprite_map.frame_width,
            config.sprite_map.frame_height,
            config.sprite_map.frame_rate
        );
        self.configs.insert(character.to_string(), Arc::clone(&config));
        Ok(config)
    }

    pub fn clear(&mut self) {
        self.configs.clear();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sprite_map_json() -> &'static str {
        r#"{
            "FrameRate": 10,
            "SpriteColumn": 4,
            "FrameHeight": 32,
            "FrameWidth": 16,
            "TopHotspotHeight": 8,
            "TopHotspotWidth": 10,
            "Idle": "idle.png", "Hover": "hover.png", "Click": "click.png",
            "Sleep": "sleep.png", "Intro": "intro.png", "Outro": "outro.png",
            "Grab": "grab.png", "Up": "up.png", "Down": "down.png",
            "Left": "left.png", "Right": "right.png", "UpLeft": "up.png",
            "UpRight": "up.png", "DownLeft": "down.png", "DownRight": "down.png",
            "WalkIdle": "idle.png", "Pat": "pat.png", "Emote": "emote.png"
        }"#
    }

    pub(crate) fn frame_count_json() -> &'static str {
        r#"{
            "Idle": 4, "Hover": 4, "Click": 3, "Sleep": 6, "Intro": 5,
            "Outro": 5, "Grab": 2, "Up": 4, "Down": 4, "Left": 4, "Right": 4,
            "UpLeft": 4, "UpRight": 4, "DownLeft": 4, "DownRight": 4,
            "WalkIdle": 4, "Pat": 3, "Emote": 6
        }"#
    }

    pub(crate) fn emote_json() -> &'static str {
        r#"{
            "AnnoyEmote": true,
            "MinEmoteTriggerMinutes": 1,
            "MaxEmoteTriggerMinutes": 2,
            "EmoteDuration": 1500
        }"#
    }

    /// Config used across the crate's unit tests.
    pub(crate) fn sample() -> CharacterConfig {
        CharacterConfig {
            name: "mambo".into(),
            sprite_map: serde_json::from_str(sprite_map_json()).unwrap(),
            frame_count: serde_json::from_str(frame_count_json()).unwrap(),
            emote: serde_json::from_str(emote_json()).unwrap(),
        }
    }

    fn write_character(root: &Path, name: &str) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(SPRITE_MAP_FILE), sprite_map_json()).unwrap();
        fs::write(dir.join(FRAME_COUNT_FILE), frame_count_json()).unwrap();
        fs::write(dir.join(EMOTE_CONFIG_FILE), emote_json()).unwrap();
        dir
    }

    #[test]
    fn parses_pascal_case_keys() {
        let config = sample();
        assert_eq!(config.sprite_map.sprite_column, 4);
        assert_eq!(config.sprite_map.file(Sequence::UpLeft), "up.png");
        assert_eq!(config.frame_count.get(Sequence::Sleep), 6);
        assert_eq!(config.emote.duration(), Duration::from_millis(1500));
        assert_eq!(
            config.emote.trigger_window(),
            (Duration::from_secs(60), Duration::from_secs(120))
        );
    }

    #[test]
    fn sheet_files_are_deduplicated() {
        let config = sample();
        let files = config.sprite_map.sheet_files();
        assert_eq!(
            files,
            vec![
                "idle.png",
                "hover.png",
                "click.png",
                "sleep.png",
                "intro.png",
                "outro.png",
                "grab.png",
                "up.png",
                "down.png",
                "left.png",
                "right.png",
                "pat.png",
                "emote.png"
            ]
        );
    }

    #[test]
    fn cache_loads_once_and_shares() {
        let root = tempfile::tempdir().expect("tempdir");
        let dir = write_character(root.path(), "mambo");
        let mut cache = ConfigCache::new(root.path());

        let first = cache.get("mambo").unwrap();
        // Later edits on disk are not seen until the cache is cleared.
        fs::write(dir.join(FRAME_COUNT_FILE), "{}").unwrap();
        let second = cache.get("mambo").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        cache.clear();
        assert!(matches!(
            cache.get("mambo"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn missing_character_is_io_error() {
        let root = tempfile::tempdir().expect("tempdir");
        let mut cache = ConfigCache::new(root.path());
        let err = cache.get("rice-shower").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains(SPRITE_MAP_FILE));
    }

    #[test]
    fn huge_emote_window_is_rejected_on_load() {
        let root = tempfile::tempdir().expect("tempdir");
        let dir = write_character(root.path(), "mambo");
        fs::write(
            dir.join(EMOTE_CONFIG_FILE),
            r#"{
                "AnnoyEmote": true,
                "MinEmoteTriggerMinutes": 1,
                "MaxEmoteTriggerMinutes": 1e30,
                "EmoteDuration": 1500
            }"#,
        )
        .unwrap();
        let err = ConfigCache::new(root.path()).get("mambo").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("MaxEmoteTriggerMinutes"));
    }

    #[test]
    fn unrepresentable_window_disables_emotes() {
        let mut config = sample();
        config.emote.max_emote_trigger_minutes = f32::INFINITY;
        assert!(config.validate().is_err());
        assert_eq!(
            config.emote.trigger_window(),
            (Duration::from_secs(60), Duration::ZERO)
        );
    }

    #[test]
    fn zero_columns_rejected() {
        let mut config = sample();
        config.sprite_map.sprite_column = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn inverted_emote_window_rejected() {
        let mut config = sample();
        config.emote.min_emote_trigger_minutes = 5.0;
        assert!(config.validate().is_err());
    }
}
