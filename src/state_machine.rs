//! Behaviour state machine.
//!
//! Any state may move to any other; the controller only asks for sensible
//! transitions. Side effects are requested from a [`TransitionHooks`]
//! implementation supplied per call, so the machine owns no timers and no
//! audio.

use std::sync::Arc;
use std::time::Duration;

use crate::config::CharacterConfig;
use crate::sound::Sound;
use crate::state::{BehaviorState, FrameCounters};
use crate::timers::TimerKind;

/// Collaborators a transition may call into. Every hook defaults to a no-op.
pub trait TransitionHooks {
    fn play_sound(&mut self, _sound: Sound) {}

    /// `None` leaves the duration to the timer owner.
    fn start_timer(&mut self, _kind: TimerKind, _duration: Option<Duration>) {}

    fn stop_timer(&mut self, _kind: TimerKind) {}

    /// Entering Dragging. No grab sound ships with the characters yet.
    fn grabbed(&mut self) {}

    fn state_changed(&mut self, _new: BehaviorState, _old: BehaviorState) {}
}

/// What a transition asked for, in the order it asked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SideEffect {
    PlaySound(Sound),
    StartTimer(TimerKind, Option<Duration>),
    StopTimer(TimerKind),
    Grabbed,
    StateChanged {
        new: BehaviorState,
        old: BehaviorState,
    },
}

/// Hooks that just record, to be applied by the caller afterwards.
#[derive(Clone, Debug, Default)]
pub struct EffectQueue(pub Vec<SideEffect>);

impl EffectQueue {
    pub fn drain(&mut self) -> std::vec::Drain<'_, SideEffect> {
        self.0.drain(..)
    }
}

impl TransitionHooks for EffectQueue {
    fn play_sound(&mut self, sound: Sound) {
        self.0.push(SideEffect::PlaySound(sound));
    }

    fn start_timer(&mut self, kind: TimerKind, duration: Option<Duration>) {
        self.0.push(SideEffect::StartTimer(kind, duration));
    }

    fn stop_timer(&mut self, kind: TimerKind) {
        self.0.push(SideEffect::StopTimer(kind));
    }

    fn grabbed(&mut self) {
        self.0.push(SideEffect::Grabbed);
    }

    fn state_changed(&mut self, new: BehaviorState, old: BehaviorState) {
        self.0.push(SideEffect::StateChanged { new, old });
    }
}

#[derive(Clone, Debug)]
pub struct StateMachine {
    config: Arc<CharacterConfig>,
    state: BehaviorState,
    frames: FrameCounters,
}

impl StateMachine {
    pub fn new(config: Arc<CharacterConfig>) -> Self {
        Self {
            config,
            state: BehaviorState::Intro,
            frames: FrameCounters::default(),
        }
    }

    pub fn state(&self) -> BehaviorState {
        self.state
    }

    pub fn frames(&self) -> &FrameCounters {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut FrameCounters {
        &mut self.frames
    }

    /// Returns false, with no hook called, when already in `new`.
    pub fn transition_to(&mut self, new: BehaviorState, hooks: &mut impl TransitionHooks) -> bool {
        let old = self.state;
        if old == new {
            return false;
        }

        match old {
            BehaviorState::WalkIdle => hooks.stop_timer(TimerKind::WalkIdle),
            BehaviorState::Emote => hooks.stop_timer(TimerKind::EmoteDuration),
            _ => {}
        }

        match new {
            BehaviorState::Dragging => hooks.grabbed(),
            BehaviorState::Walking => hooks.play_sound(Sound::Run),
            BehaviorState::WalkIdle => hooks.start_timer(TimerKind::WalkIdle, None),
            BehaviorState::Click => hooks.play_sound(Sound::Mambo),
            BehaviorState::Pat => hooks.play_sound(Sound::Pat),
            BehaviorState::Emote => {
                hooks.play_sound(Sound::Emote);
                hooks.start_timer(
                    TimerKind::EmoteDuration,
                    Some(self.config.emote.duration()),
                );
            }
            _ => {}
        }

        self.state = new;
        self.frames.reset_for(new);
        hooks.state_changed(new, old);
        true
    }

    pub fn transition_to_idle_or_hover(
        &mut self,
        pointer_over: bool,
        hooks: &mut impl TransitionHooks,
    ) -> bool {
        let target = if pointer_over {
            BehaviorState::Hover
        } else {
            BehaviorState::Idle
        };
        self.transition_to(target, hooks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::sample;
    use crate::state::Sequence;

    fn machine() -> StateMachine {
        StateMachine::new(Arc::new(sample()))
    }

    #[test]
    fn starts_in_intro() {
        assert_eq!(machine().state(), BehaviorState::Intro);
    }

    #[test]
    fn same_state_is_a_no_op() {
        let mut sm = machine();
        let mut fx = EffectQueue::default();
        sm.transition_to(BehaviorState::Click, &mut fx);
        sm.frames_mut().set(Sequence::Click, 2);
        fx.0.clear();

        assert!(!sm.transition_to(BehaviorState::Click, &mut fx));
        assert!(fx.0.is_empty());
        assert_eq!(sm.frames().get(Sequence::Click), 2);
    }

    #[test]
    fn entering_walking_plays_run_and_resets_directions() {
        let mut sm = machine();
        let mut fx = EffectQueue::default();
        sm.frames_mut().set(Sequence::DownLeft, 3);
        sm.frames_mut().set(Sequence::Up, 1);

        sm.transition_to(BehaviorState::Walking, &mut fx);

        for seq in Sequence::WALKING {
            assert_eq!(sm.frames().get(seq), 0);
        }
        assert_eq!(
            fx.0,
            vec![
                SideEffect::PlaySound(Sound::Run),
                SideEffect::StateChanged {
                    new: BehaviorState::Walking,
                    old: BehaviorState::Intro
                }
            ]
        );
    }

    #[test]
    fn walk_idle_timer_started_and_stopped() {
        let mut sm = machine();
        let mut fx = EffectQueue::default();
        sm.transition_to(BehaviorState::WalkIdle, &mut fx);
        assert_eq!(fx.0[0], SideEffect::StartTimer(TimerKind::WalkIdle, None));

        fx.0.clear();
        sm.transition_to(BehaviorState::Idle, &mut fx);
        assert_eq!(fx.0[0], SideEffect::StopTimer(TimerKind::WalkIdle));
    }

    #[test]
    fn emote_uses_configured_duration() {
        let mut sm = machine();
        let mut fx = EffectQueue::default();
        sm.transition_to(BehaviorState::Emote, &mut fx);
        assert_eq!(
            &fx.0[..2],
            &[
                SideEffect::PlaySound(Sound::Emote),
                SideEffect::StartTimer(
                    TimerKind::EmoteDuration,
                    Some(Duration::from_millis(1500))
                ),
            ]
        );

        fx.0.clear();
        sm.transition_to(BehaviorState::Hover, &mut fx);
        assert_eq!(fx.0[0], SideEffect::StopTimer(TimerKind::EmoteDuration));
    }

    #[test]
    fn click_pat_and_drag_hooks() {
        let mut sm = machine();
        let mut fx = EffectQueue::default();
        sm.transition_to(BehaviorState::Click, &mut fx);
        sm.transition_to(BehaviorState::Pat, &mut fx);
        sm.transition_to(BehaviorState::Dragging, &mut fx);
        let requested: Vec<_> = fx
            .drain()
            .filter(|e| !matches!(e, SideEffect::StateChanged { .. }))
            .collect();
        assert_eq!(
            requested,
            vec![
                SideEffect::PlaySound(Sound::Mambo),
                SideEffect::PlaySound(Sound::Pat),
                SideEffect::Grabbed,
            ]
        );
    }

    #[test]
    fn hover_to_idle_resets_idle_counter() {
        let mut sm = machine();
        let mut fx = EffectQueue::default();
        sm.transition_to(BehaviorState::Hover, &mut fx);
        sm.frames_mut().set(Sequence::Idle, 3);
        sm.transition_to_idle_or_hover(false, &mut fx);
        assert_eq!(sm.state(), BehaviorState::Idle);
        assert_eq!(sm.frames().get(Sequence::Idle), 0);

        sm.transition_to_idle_or_hover(true, &mut fx);
        assert_eq!(sm.state(), BehaviorState::Hover);
    }
}
