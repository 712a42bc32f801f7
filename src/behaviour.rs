//! The pet's brain: turns pointer input, timers and finished sequences into
//! state transitions, and runs chase movement plus sprite playback on every
//! sprite tick.

use std::sync::Arc;
use std::time::Duration;

use bevy::log::{debug, info};
use bevy::math::{Rect, Vec2};
use bevy::prelude::Component;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::animation::{
    AnimationDriver, DrawSurface, FrameAccumulator, FrameGeometry, SpriteResolver,
};
use crate::config::CharacterConfig;
use crate::movement::{Direction, Movement, MovementSettings};
use crate::sound::Sound;
use crate::state::{BehaviorState, FrameCounters, Sequence};
use crate::state_machine::{EffectQueue, SideEffect, StateMachine};
use crate::timers::{PetTimers, TimerKind};

#[derive(Clone, Debug, PartialEq)]
pub struct BehaviourSettings {
    pub movement: MovementSettings,
    pub walk_idle: Duration,
    /// Pointer inactivity before an idle pet falls asleep.
    pub sleep_after: Duration,
    /// Pointer travel, in px, that turns a press into a drag.
    pub drag_threshold: f32,
}

impl Default for BehaviourSettings {
    fn default() -> Self {
        Self {
            movement: MovementSettings::default(),
            walk_idle: Duration::from_secs(3),
            sleep_after: Duration::from_secs(60),
            drag_threshold: 4.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Press {
    at: Vec2,
    dragged: bool,
}

fn walking_sequence(dir: Direction) -> Sequence {
    match dir {
        Direction::Up => Sequence::Up,
        Direction::Down => Sequence::Down,
        Direction::Left => Sequence::Left,
        Direction::Right => Sequence::Right,
        Direction::UpLeft => Sequence::UpLeft,
        Direction::UpRight => Sequence::UpRight,
        Direction::DownLeft => Sequence::DownLeft,
        Direction::DownRight => Sequence::DownRight,
    }
}

#[derive(Component)]
pub struct Gremlin {
    config: Arc<CharacterConfig>,
    settings: BehaviourSettings,
    machine: StateMachine,
    movement: Movement,
    timers: PetTimers,
    driver: AnimationDriver,
    ticks: FrameAccumulator,
    effects: EffectQueue,
    sounds: Vec<Sound>,
    press: Option<Press>,
    facing: Direction,
    finished: bool,
    rng: StdRng,
}

impl Gremlin {
    pub fn new(config: Arc<CharacterConfig>, settings: BehaviourSettings, position: Vec2) -> Self {
        Self::with_rng(config, settings, position, StdRng::from_entropy())
    }

    pub fn with_rng(
        config: Arc<CharacterConfig>,
        settings: BehaviourSettings,
        position: Vec2,
        rng: StdRng,
    ) -> Self {
        let mut pet = Self {
            machine: StateMachine::new(Arc::clone(&config)),
            movement: Movement::new(settings.movement, position),
            timers: PetTimers::new(settings.walk_idle),
            driver: AnimationDriver::new(FrameGeometry::from_sprite_map(&config.sprite_map)),
            ticks: FrameAccumulator::new(config.sprite_map.frame_rate),
            effects: EffectQueue::default(),
            sounds: vec![Sound::Intro],
            press: None,
            facing: Direction::Down,
            finished: false,
            rng,
            config,
            settings,
        };
        pet.touch();
        pet.arm_emote();
        pet
    }

    pub fn state(&self) -> BehaviorState {
        self.machine.state()
    }

    pub fn frames(&self) -> &FrameCounters {
        self.machine.frames()
    }

    pub fn movement(&self) -> &Movement {
        &self.movement
    }

    pub fn position(&self) -> Vec2 {
        self.movement.position()
    }

    pub fn timers(&self) -> &PetTimers {
        &self.timers
    }

    /// Outro has played to the end.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn set_scripted(&mut self, scripted: bool) {
        self.movement.set_scripted(scripted);
    }

    /// Sounds requested since the last call.
    pub fn take_sounds(&mut self) -> Vec<Sound> {
        std::mem::take(&mut self.sounds)
    }

    /// The frame rectangle around the anchor.
    pub fn body(&self) -> Rect {
        Rect::from_center_size(
            self.movement.position(),
            self.config.sprite_map.frame_size().as_vec2(),
        )
    }

    fn in_top_hotspot(&self, p: Vec2) -> bool {
        let map = &self.config.sprite_map;
        if map.top_hotspot_width == 0 || map.top_hotspot_height == 0 {
            return false;
        }
        let body = self.body();
        let half_width = map.top_hotspot_width as f32 / 2.0;
        let hotspot = Rect::new(
            body.center().x - half_width,
            body.min.y,
            body.center().x + half_width,
            body.min.y + map.top_hotspot_height as f32,
        );
        hotspot.contains(p)
    }

    // ----------------- Input -----------------

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        let p = Vec2::new(x, y);
        self.movement.update_pointer_position(x, y);
        self.touch();

        if let Some(press) = self.press.as_mut() {
            if !press.dragged && press.at.distance(p) > self.settings.drag_threshold {
                press.dragged = true;
                let at = press.at;
                self.movement.begin_drag(at.x, at.y);
                self.transition(BehaviorState::Dragging);
            }
        }
        if self.movement.is_dragging() {
            self.movement.update_drag(x, y);
        }

        let over = self.body().contains(p);
        self.set_hover(over);
    }

    /// The pointer left the host surface.
    pub fn pointer_left(&mut self) {
        self.set_hover(false);
    }

    fn set_hover(&mut self, over: bool) {
        if self.movement.is_pointer_over() == over {
            return;
        }
        self.movement.set_pointer_over(over);
        match (self.state(), over) {
            (BehaviorState::Idle, true) => self.transition(BehaviorState::Hover),
            (BehaviorState::Hover, false) => self.transition(BehaviorState::Idle),
            _ => {}
        }
    }

    pub fn press(&mut self, x: f32, y: f32) {
        if self.finished || matches!(self.state(), BehaviorState::Intro | BehaviorState::Outro) {
            return;
        }
        let p = Vec2::new(x, y);
        if !self.body().contains(p) {
            return;
        }
        self.touch();
        if self.state() == BehaviorState::Sleeping {
            self.idle_or_hover();
            return;
        }
        self.press = Some(Press {
            at: p,
            dragged: false,
        });
    }

    pub fn release(&mut self, x: f32, y: f32) {
        let Some(press) = self.press.take() else {
            return;
        };
        let p = Vec2::new(x, y);
        if press.dragged {
            self.movement.end_drag();
            let over = self.body().contains(p);
            self.movement.set_pointer_over(over);
            self.idle_or_hover();
        } else if self.body().contains(p) {
            if self.in_top_hotspot(p) {
                self.transition(BehaviorState::Pat);
            } else {
                self.transition(BehaviorState::Click);
            }
        }
    }

    /// Play the outro; the pet is finished once it completes.
    pub fn dismiss(&mut self) {
        if self.finished {
            return;
        }
        if self.press.take().is_some() {
            self.movement.end_drag();
        }
        self.transition(BehaviorState::Outro);
    }

    // ----------------- Loop -----------------

    /// Feed one presentation frame worth of time. Timers run on real time,
    /// movement and sprites at the character's frame rate.
    pub fn advance<H>(
        &mut self,
        delta_ms: f64,
        sprites: &mut impl SpriteResolver<H>,
        surface: &mut impl DrawSurface<H>,
    ) {
        if self.finished {
            return;
        }
        let fired = self
            .timers
            .tick(Duration::from_secs_f64(delta_ms.max(0.0) / 1000.0));
        for kind in fired {
            self.timer_fired(kind);
        }
        for _ in 0..self.ticks.accumulate(delta_ms) {
            self.step(sprites, surface);
            if self.finished {
                break;
            }
        }
    }

    fn step<H>(
        &mut self,
        sprites: &mut impl SpriteResolver<H>,
        surface: &mut impl DrawSurface<H>,
    ) {
        let state = self.state();
        if state.can_chase() {
            self.movement.tick();
            if let Some(dir) = self.movement.current_direction() {
                self.facing = dir;
            }
            if self.movement.is_moving() {
                self.transition(BehaviorState::Walking);
            } else if state == BehaviorState::Walking {
                self.transition(BehaviorState::WalkIdle);
            }
        } else if !self.movement.is_dragging() {
            self.movement.halt();
        }

        let state = self.state();
        let seq = self.sequence_for(state);
        let index = self.machine.frames().get(seq);
        let played = self.driver.play_animation(
            state,
            index,
            self.config.sprite_map.file(seq),
            self.config.frame_count.get(seq),
            sprites,
            surface,
        );
        // Only store the result against the state it was computed for.
        if self.state() != state {
            return;
        }
        self.machine.frames_mut().set(seq, played.next);
        if played.completed {
            self.sequence_completed(state);
        }
    }

    fn sequence_for(&self, state: BehaviorState) -> Sequence {
        match state {
            BehaviorState::Intro => Sequence::Intro,
            BehaviorState::Idle => Sequence::Idle,
            BehaviorState::Hover => Sequence::Hover,
            BehaviorState::Walking => walking_sequence(self.facing),
            BehaviorState::WalkIdle => Sequence::WalkIdle,
            BehaviorState::Dragging => Sequence::Grab,
            BehaviorState::Click => Sequence::Click,
            BehaviorState::Pat => Sequence::Pat,
            BehaviorState::Sleeping => Sequence::Sleep,
            BehaviorState::Outro => Sequence::Outro,
            BehaviorState::Emote => Sequence::Emote,
        }
    }

    fn sequence_completed(&mut self, state: BehaviorState) {
        match state {
            BehaviorState::Intro | BehaviorState::Click | BehaviorState::Pat => {
                self.idle_or_hover();
            }
            // Timed emotes loop until their timer fires.
            BehaviorState::Emote if !self.timers.is_running(TimerKind::EmoteDuration) => {
                self.idle_or_hover();
            }
            BehaviorState::Outro => {
                info!("{} said goodbye", self.config.name);
                self.finished = true;
            }
            _ => {}
        }
    }

    fn timer_fired(&mut self, kind: TimerKind) {
        let state = self.state();
        match kind {
            TimerKind::WalkIdle => {
                if state == BehaviorState::WalkIdle {
                    self.idle_or_hover();
                }
            }
            TimerKind::EmoteDuration => {
                if state == BehaviorState::Emote {
                    self.idle_or_hover();
                }
            }
            TimerKind::Sleep => {
                if matches!(state, BehaviorState::Idle | BehaviorState::Hover) {
                    self.transition(BehaviorState::Sleeping);
                } else if state != BehaviorState::Sleeping {
                    self.touch();
                }
            }
            TimerKind::EmoteTrigger => {
                if matches!(
                    state,
                    BehaviorState::Idle | BehaviorState::Hover | BehaviorState::WalkIdle
                ) {
                    self.transition(BehaviorState::Emote);
                } else {
                    self.arm_emote();
                }
            }
        }
    }

    // ----------------- Helpers -----------------

    /// Pointer activity: push the sleep timer back.
    fn touch(&mut self) {
        self.timers
            .start(TimerKind::Sleep, Some(self.settings.sleep_after));
    }

    fn arm_emote(&mut self) {
        if !self.config.emote.annoy_emote {
            return;
        }
        let (min, max) = self.config.emote.trigger_window();
        if max.is_zero() {
            return;
        }
        let wait = if min >= max {
            max
        } else {
            self.rng.gen_range(min..=max)
        };
        debug!("Next emote in {:?}", wait);
        self.timers.start(TimerKind::EmoteTrigger, Some(wait));
    }

    fn idle_or_hover(&mut self) {
        let over = self.movement.is_pointer_over();
        if self
            .machine
            .transition_to_idle_or_hover(over, &mut self.effects)
        {
            self.apply_effects();
        }
    }

    fn transition(&mut self, to: BehaviorState) {
        if self.machine.transition_to(to, &mut self.effects) {
            self.apply_effects();
        }
    }

    fn apply_effects(&mut self) {
        let effects: Vec<SideEffect> = self.effects.drain().collect();
        for effect in effects {
            match effect {
                SideEffect::PlaySound(sound) => self.sounds.push(sound),
                // A zero-length emote ends with its sequence instead.
                SideEffect::StartTimer(_, Some(d)) if d.is_zero() => {}
                SideEffect::StartTimer(kind, duration) => self.timers.start(kind, duration),
                SideEffect::StopTimer(kind) => self.timers.stop(kind),
                SideEffect::Grabbed => debug!("{} grabbed", self.config.name),
                SideEffect::StateChanged { new, old } => {
                    debug!("{}: {} -> {}", self.config.name, old, new);
                    // However an emote ends, the next one gets scheduled.
                    if old == BehaviorState::Emote {
                        self.arm_emote();
                    }
                }
            }
        }
    }
}
