//! Sprite playback: sheet-cell lookup, frame advance and the presentation
//! loop that drives it.

use std::time::Duration;

use bevy::log::{debug, warn};
use bevy::math::{URect, UVec2};
use bevy::prelude::Resource;

use crate::config::SpriteMap;
use crate::state::BehaviorState;

/// A decoded sprite sheet: the host's image handle plus its pixel size.
#[derive(Clone, Debug, PartialEq)]
pub struct SheetImage<H> {
    pub handle: H,
    pub size: UVec2,
}

/// Looks sprite sheets up by file name. `None` covers both "missing" and
/// "not decoded yet"; either way the frame is not advanced this tick.
pub trait SpriteResolver<H> {
    fn resolve(&mut self, file: &str) -> Option<SheetImage<H>>;
}

/// Where frames end up.
pub trait DrawSurface<H> {
    fn clear(&mut self);

    /// Show `source` (pixels of `image`) at the surface origin, unscaled.
    fn draw(&mut self, image: &H, source: URect);
}

/// Column-major layout shared by every sheet of a character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameGeometry {
    pub columns: u32,
    pub frame_size: UVec2,
}

impl FrameGeometry {
    pub fn from_sprite_map(map: &SpriteMap) -> Self {
        Self {
            columns: map.sprite_column.max(1),
            frame_size: map.frame_size(),
        }
    }

    /// Pixel rectangle of frame `index`.
    pub fn cell(&self, index: u32) -> URect {
        let col = index % self.columns;
        let row = index / self.columns;
        let min = UVec2::new(col, row) * self.frame_size;
        URect::from_corners(min, min + self.frame_size)
    }
}

/// Result of one `play_animation` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Playback {
    pub next: u32,
    /// The sequence just wrapped back to frame 0.
    pub completed: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct AnimationDriver {
    geometry: FrameGeometry,
}

impl AnimationDriver {
    pub fn new(geometry: FrameGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    /// Draw frame `index` of `sprite` and return the index of the next frame.
    /// A cell falling outside the sheet is skipped, the index still advances.
    pub fn render_frame<H>(
        &self,
        surface: &mut impl DrawSurface<H>,
        sprite: &SheetImage<H>,
        index: u32,
        frame_count: u32,
    ) -> u32 {
        if frame_count == 0 {
            return index;
        }
        let next = (index + 1) % frame_count;
        let cell = self.geometry.cell(index);
        if cell.max.x > sprite.size.x || cell.max.y > sprite.size.y {
            warn!(
                "Frame {} at {:?} lies outside the {}x{} sheet",
                index, cell, sprite.size.x, sprite.size.y
            );
            return next;
        }
        surface.clear();
        surface.draw(&sprite.handle, cell);
        next
    }

    pub fn play_animation<H>(
        &self,
        state: BehaviorState,
        index: u32,
        file: &str,
        frame_count: u32,
        sprites: &mut impl SpriteResolver<H>,
        surface: &mut impl DrawSurface<H>,
    ) -> Playback {
        let stalled = Playback {
            next: index,
            completed: false,
        };
        if frame_count == 0 {
            debug!("Frame count is 0 for {} ({})", file, state);
            return stalled;
        }
        let Some(sprite) = sprites.resolve(file) else {
            debug!("Sprite {} not available", file);
            return stalled;
        };
        let next = self.render_frame(surface, &sprite, index, frame_count);
        Playback {
            next,
            completed: next == 0 && index != 0,
        }
    }
}

// ===== Presentation loop =====

/// Start/stop gate over the host's per-refresh callback.
#[derive(Resource, Debug, Default)]
pub struct FrameLoop {
    running: bool,
    last_frame: Option<Duration>,
}

impl FrameLoop {
    pub fn start(&mut self) {
        self.running = true;
        self.last_frame = None;
    }

    /// Stopping a stopped loop does nothing.
    pub fn stop(&mut self) {
        self.running = false;
        self.last_frame = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Called by the host once per presentation frame with the time since
    /// startup. Runs `tick` with the milliseconds elapsed since the previous
    /// frame; the first frame after `start` reports 0.
    pub fn frame(&mut self, now: Duration, mut tick: impl FnMut(f64)) {
        if !self.running {
            return;
        }
        let delta = self
            .last_frame
            .map(|last| now.saturating_sub(last))
            .unwrap_or_default();
        self.last_frame = Some(now);
        tick(delta.as_secs_f64() * 1000.0);
    }
}

/// Turns variable frame deltas into a fixed number of sprite ticks. Stalls
/// are caught up, not skipped.
///
/// Time is kept in fractions of a frame rather than milliseconds so whole
/// multiples of the interval (100 ms at 30 fps) land on exact tick counts.
#[derive(Clone, Copy, Debug)]
pub struct FrameAccumulator {
    frame_rate: f64,
    pending_frames: f64,
}

impl FrameAccumulator {
    pub fn new(frame_rate: f32) -> Self {
        let frame_rate = if frame_rate > 0.0 {
            frame_rate as f64
        } else {
            0.0
        };
        Self {
            frame_rate,
            pending_frames: 0.0,
        }
    }

    pub fn interval_ms(&self) -> f64 {
        if self.frame_rate > 0.0 {
            1000.0 / self.frame_rate
        } else {
            f64::INFINITY
        }
    }

    pub fn pending_ms(&self) -> f64 {
        if self.frame_rate > 0.0 {
            self.pending_frames * 1000.0 / self.frame_rate
        } else {
            0.0
        }
    }

    /// Add `delta_ms` and return how many whole intervals are due.
    pub fn accumulate(&mut self, delta_ms: f64) -> u32 {
        if self.frame_rate <= 0.0 || !delta_ms.is_finite() || delta_ms <= 0.0 {
            return 0;
        }
        self.pending_frames += delta_ms * self.frame_rate / 1000.0;
        let due = self.pending_frames.floor();
        self.pending_frames -= due;
        due as u32
    }
}

/// A zero-argument tick run at a fixed rate from delta-time callbacks.
pub struct RateLimitedTick<F> {
    accumulator: FrameAccumulator,
    tick: F,
}

impl<F: FnMut()> RateLimitedTick<F> {
    pub fn new(frame_rate: f32, tick: F) -> Self {
        Self {
            accumulator: FrameAccumulator::new(frame_rate),
            tick,
        }
    }

    pub fn call(&mut self, delta_ms: f64) {
        for _ in 0..self.accumulator.accumulate(delta_ms) {
            (self.tick)();
        }
    }

    pub fn pending_ms(&self) -> f64 {
        self.accumulator.pending_ms()
    }
}
