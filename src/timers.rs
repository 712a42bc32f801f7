use std::time::Duration;

use bevy::time::{Timer, TimerMode};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TimerKind {
    /// How long the pet lingers after it stops walking.
    WalkIdle,
    /// Length of an emote.
    EmoteDuration,
    /// Inactivity before the pet falls asleep.
    Sleep,
    /// Wait before the next random emote.
    EmoteTrigger,
}

impl TimerKind {
    const ALL: [TimerKind; 4] = [
        TimerKind::WalkIdle,
        TimerKind::EmoteDuration,
        TimerKind::Sleep,
        TimerKind::EmoteTrigger,
    ];

    fn slot(self) -> usize {
        self as usize
    }
}

/// One-shot timers, at most one running per kind. Starting a running kind
/// restarts it.
#[derive(Clone, Debug)]
pub struct PetTimers {
    walk_idle: Duration,
    running: [Option<Timer>; 4],
}

impl PetTimers {
    /// `walk_idle` is used whenever a walk-idle timer is started without an
    /// explicit duration.
    pub fn new(walk_idle: Duration) -> Self {
        Self {
            walk_idle,
            running: Default::default(),
        }
    }

    pub fn start(&mut self, kind: TimerKind, duration: Option<Duration>) {
        let duration = match (kind, duration) {
            (_, Some(d)) => d,
            (TimerKind::WalkIdle, None) => self.walk_idle,
            (_, None) => return,
        };
        self.running[kind.slot()] = Some(Timer::new(duration, TimerMode::Once));
    }

    /// Stopping a kind that is not running does nothing.
    pub fn stop(&mut self, kind: TimerKind) {
        self.running[kind.slot()] = None;
    }

    pub fn is_running(&self, kind: TimerKind) -> bool {
        self.running[kind.slot()].is_some()
    }

    /// Advance every running timer; finished ones are removed and returned.
    pub fn tick(&mut self, delta: Duration) -> Vec<TimerKind> {
        let mut fired = Vec::new();
        for kind in TimerKind::ALL {
            let slot = &mut self.running[kind.slot()];
            let finished = match slot {
                Some(timer) => timer.tick(delta).finished(),
                None => false,
            };
            if finished {
                *slot = None;
                fired.push(kind);
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_idle_uses_default_duration() {
        let mut timers = PetTimers::new(Duration::from_secs(3));
        timers.start(TimerKind::WalkIdle, None);
        assert!(timers.tick(Duration::from_secs(2)).is_empty());
        assert_eq!(timers.tick(Duration::from_secs(1)), vec![TimerKind::WalkIdle]);
        assert!(!timers.is_running(TimerKind::WalkIdle));
    }

    #[test]
    fn stop_cancels_and_is_idempotent() {
        let mut timers = PetTimers::new(Duration::from_secs(3));
        timers.start(TimerKind::EmoteDuration, Some(Duration::from_millis(500)));
        timers.stop(TimerKind::EmoteDuration);
        timers.stop(TimerKind::EmoteDuration);
        assert!(timers.tick(Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn restart_resets_elapsed() {
        let mut timers = PetTimers::new(Duration::from_secs(3));
        timers.start(TimerKind::Sleep, Some(Duration::from_secs(10)));
        timers.tick(Duration::from_secs(9));
        timers.start(TimerKind::Sleep, Some(Duration::from_secs(10)));
        assert!(timers.tick(Duration::from_secs(9)).is_empty());
        assert_eq!(timers.tick(Duration::from_secs(1)), vec![TimerKind::Sleep]);
    }

    #[test]
    fn kinds_without_default_need_a_duration() {
        let mut timers = PetTimers::new(Duration::from_secs(3));
        timers.start(TimerKind::EmoteTrigger, None);
        assert!(!timers.is_running(TimerKind::EmoteTrigger));
    }
}
