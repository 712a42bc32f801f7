//! An animated desktop pet: a sprite character that plays an intro, idles,
//! follows the cursor, reacts to hover, clicks, pats and drags, falls asleep,
//! emotes now and then, and says goodbye with an outro.
//!
//! The core (`state_machine`, `movement`, `animation`, `behaviour`) is plain
//! data driven through method calls; `plugin` hooks it into a Bevy app.

pub mod animation;
pub mod behaviour;
pub mod config;
pub mod movement;
pub mod plugin;
pub mod sound;
pub mod sprites;
pub mod state;
pub mod state_machine;
pub mod timers;

pub use animation::{
    AnimationDriver, DrawSurface, FrameAccumulator, FrameGeometry, FrameLoop, Playback,
    RateLimitedTick, SheetImage, SpriteResolver,
};
pub use behaviour::{BehaviourSettings, Gremlin};
pub use config::{CharacterConfig, ConfigCache, ConfigError, EmoteConfig, FrameCount, SpriteMap};
pub use movement::{Direction, Movement, MovementSettings};
pub use plugin::{GremlinPlugin, PetSettings};
pub use sound::{PlaySound, Sound, SoundBoard};
pub use state::{BehaviorState, FrameCounters, Sequence};
pub use state_machine::{EffectQueue, SideEffect, StateMachine, TransitionHooks};
pub use timers::{PetTimers, TimerKind};
