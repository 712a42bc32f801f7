use std::fmt;

// ===== Behaviour states =====

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BehaviorState {
    Intro,
    Idle,
    Hover,
    Walking,
    WalkIdle,
    Dragging,
    Click,
    Pat,
    Sleeping,
    Outro,
    Emote,
}

impl BehaviorState {
    /// One-shot states hand control back to the controller when their
    /// sequence loops back to frame 0.
    pub fn is_one_shot(self) -> bool {
        matches!(
            self,
            BehaviorState::Intro
                | BehaviorState::Outro
                | BehaviorState::Click
                | BehaviorState::Pat
                | BehaviorState::Emote
        )
    }

    /// States in which the pet is free to chase the pointer.
    pub fn can_chase(self) -> bool {
        matches!(
            self,
            BehaviorState::Idle
                | BehaviorState::Hover
                | BehaviorState::Walking
                | BehaviorState::WalkIdle
        )
    }

    /// Sequences whose counters are rewound when this state is entered.
    pub fn sequences(self) -> &'static [Sequence] {
        match self {
            BehaviorState::Intro => &[Sequence::Intro],
            BehaviorState::Idle => &[Sequence::Idle],
            BehaviorState::Hover => &[Sequence::Hover],
            BehaviorState::Walking => &Sequence::WALKING,
            BehaviorState::WalkIdle => &[Sequence::WalkIdle],
            BehaviorState::Dragging => &[Sequence::Grab],
            BehaviorState::Click => &[Sequence::Click],
            BehaviorState::Pat => &[Sequence::Pat],
            BehaviorState::Sleeping => &[Sequence::Sleep],
            BehaviorState::Outro => &[Sequence::Outro],
            BehaviorState::Emote => &[Sequence::Emote],
        }
    }
}

impl fmt::Display for BehaviorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ===== Sprite sequences =====

/// A named sprite sheet of the character. Walking has one sequence per
/// compass direction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Sequence {
    Idle,
    Hover,
    Click,
    Sleep,
    Intro,
    Outro,
    Grab,
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
    WalkIdle,
    Pat,
    Emote,
}

impl Sequence {
    pub const COUNT: usize = 18;

    pub const ALL: [Sequence; Sequence::COUNT] = [
        Sequence::Idle,
        Sequence::Hover,
        Sequence::Click,
        Sequence::Sleep,
        Sequence::Intro,
        Sequence::Outro,
        Sequence::Grab,
        Sequence::Up,
        Sequence::Down,
        Sequence::Left,
        Sequence::Right,
        Sequence::UpLeft,
        Sequence::UpRight,
        Sequence::DownLeft,
        Sequence::DownRight,
        Sequence::WalkIdle,
        Sequence::Pat,
        Sequence::Emote,
    ];

    pub const WALKING: [Sequence; 8] = [
        Sequence::Up,
        Sequence::Down,
        Sequence::Left,
        Sequence::Right,
        Sequence::UpLeft,
        Sequence::UpRight,
        Sequence::DownLeft,
        Sequence::DownRight,
    ];

    /// Key used by the character's sprite-map and frame-count files.
    pub fn name(self) -> &'static str {
        match self {
            Sequence::Idle => "Idle",
            Sequence::Hover => "Hover",
            Sequence::Click => "Click",
            Sequence::Sleep => "Sleep",
            Sequence::Intro => "Intro",
            Sequence::Outro => "Outro",
            Sequence::Grab => "Grab",
            Sequence::Up => "Up",
            Sequence::Down => "Down",
            Sequence::Left => "Left",
            Sequence::Right => "Right",
            Sequence::UpLeft => "UpLeft",
            Sequence::UpRight => "UpRight",
            Sequence::DownLeft => "DownLeft",
            Sequence::DownRight => "DownRight",
            Sequence::WalkIdle => "WalkIdle",
            Sequence::Pat => "Pat",
            Sequence::Emote => "Emote",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

// ===== Frame counters =====

/// Per-sequence frame cursor. Counters only move through [`FrameCounters::set`],
/// which callers feed with the `(index + 1) % frame_count` value the
/// animation driver hands back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameCounters {
    frames: [u32; Sequence::COUNT],
}

impl FrameCounters {
    pub fn get(&self, seq: Sequence) -> u32 {
        self.frames[seq.slot()]
    }

    pub fn set(&mut self, seq: Sequence, index: u32) {
        self.frames[seq.slot()] = index;
    }

    /// Rewind every counter belonging to `state`.
    pub fn reset_for(&mut self, state: BehaviorState) {
        for seq in state.sequences() {
            self.frames[seq.slot()] = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_slots_follow_all_order() {
        for (i, seq) in Sequence::ALL.iter().enumerate() {
            assert_eq!(seq.slot(), i, "{}", seq.name());
        }
    }

    #[test]
    fn walking_reset_rewinds_every_direction() {
        let mut frames = FrameCounters::default();
        for (i, seq) in Sequence::WALKING.iter().enumerate() {
            frames.set(*seq, i as u32 + 1);
        }
        frames.set(Sequence::Idle, 3);

        frames.reset_for(BehaviorState::Walking);

        for seq in Sequence::WALKING {
            assert_eq!(frames.get(seq), 0);
        }
        assert_eq!(frames.get(Sequence::Idle), 3);
    }

    #[test]
    fn dragging_owns_the_grab_sequence() {
        let mut frames = FrameCounters::default();
        frames.set(Sequence::Grab, 5);
        frames.reset_for(BehaviorState::Dragging);
        assert_eq!(frames.get(Sequence::Grab), 0);
    }

    #[test]
    fn one_shot_states() {
        let one_shot: Vec<_> = [
            BehaviorState::Intro,
            BehaviorState::Idle,
            BehaviorState::Click,
            BehaviorState::Walking,
            BehaviorState::Pat,
            BehaviorState::Outro,
            BehaviorState::Emote,
        ]
        .into_iter()
        .filter(|s| s.is_one_shot())
        .collect();
        assert_eq!(
            one_shot,
            vec![
                BehaviorState::Intro,
                BehaviorState::Click,
                BehaviorState::Pat,
                BehaviorState::Outro,
                BehaviorState::Emote
            ]
        );
    }
}
