use std::collections::HashMap;
use std::time::Duration;

use bevy::prelude::{Event, Resource};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Sound {
    Intro,
    Run,
    Mambo,
    Pat,
    Emote,
}

impl Sound {
    pub fn file_name(self) -> &'static str {
        match self {
            Sound::Intro => "intro.ogg",
            Sound::Run => "run.ogg",
            Sound::Mambo => "mambo.ogg",
            Sound::Pat => "pat.ogg",
            Sound::Emote => "emote.ogg",
        }
    }
}

/// Fire-and-forget request to play a character sound.
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaySound(pub Sound);

/// Decides whether a requested sound actually plays: sound must have been
/// enabled, and a sound with a repeat gap stays quiet until the gap since
/// its last playback has passed.
#[derive(Resource, Clone, Debug)]
pub struct SoundBoard {
    enabled: bool,
    volume: f32,
    min_gap: HashMap<Sound, Duration>,
    last_played: HashMap<Sound, Duration>,
}

impl Default for SoundBoard {
    fn default() -> Self {
        Self {
            enabled: false,
            volume: 0.8,
            min_gap: HashMap::new(),
            last_played: HashMap::new(),
        }
    }
}

impl SoundBoard {
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn set_min_gap(&mut self, sound: Sound, gap: Duration) {
        self.min_gap.insert(sound, gap);
    }

    /// `now` is time since app start. Returns true and records the playback
    /// when the sound should be played.
    pub fn admit(&mut self, sound: Sound, now: Duration) -> bool {
        if !self.enabled {
            return false;
        }
        if let (Some(gap), Some(last)) = (self.min_gap.get(&sound), self.last_played.get(&sound)) {
            if now.saturating_sub(*last) < *gap {
                return false;
            }
        }
        self.last_played.insert(sound, now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_until_enabled() {
        let mut board = SoundBoard::default();
        assert!(!board.admit(Sound::Mambo, Duration::ZERO));
        board.enable();
        assert!(board.admit(Sound::Mambo, Duration::ZERO));
    }

    #[test]
    fn repeat_gap_is_per_sound() {
        let mut board = SoundBoard::default();
        board.enable();
        board.set_min_gap(Sound::Run, Duration::from_secs(2));

        assert!(board.admit(Sound::Run, Duration::from_secs(10)));
        assert!(!board.admit(Sound::Run, Duration::from_secs(11)));
        assert!(board.admit(Sound::Pat, Duration::from_secs(11)));
        assert!(board.admit(Sound::Run, Duration::from_secs(12)));
    }

    #[test]
    fn disable_silences_again() {
        let mut board = SoundBoard::default();
        board.enable();
        board.disable();
        assert!(!board.is_enabled());
        assert!(!board.admit(Sound::Pat, Duration::ZERO));
    }

    #[test]
    fn volume_is_clamped() {
        let mut board = SoundBoard::default();
        board.set_volume(1.7);
        assert_eq!(board.volume(), 1.0);
        board.set_volume(-0.2);
        assert_eq!(board.volume(), 0.0);
    }
}
