//! Pointer chase and drag kinematics.
//!
//! Positions live in the host's surface space: origin top-left, y grows
//! downward. `position` is the pet's anchor, the centre of its frame, so
//! the chase distance is measured centre-to-pointer.

use bevy::math::Vec2;

/// `|vx/vy|` (or the inverse) above which only the dominant axis names the
/// walking direction.
pub const DIRECTION_DOMINANCE: f32 = 1.5;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl Direction {
    /// Walking direction for a velocity. `None` when standing still.
    ///
    /// A compound label (e.g. `UpLeft`) is only used when neither axis
    /// outweighs the other by more than [`DIRECTION_DOMINANCE`].
    pub fn from_velocity(v: Vec2) -> Option<Direction> {
        if v.x == 0.0 && v.y == 0.0 {
            return None;
        }
        let (ax, ay) = (v.x.abs(), v.y.abs());
        let horizontal = if v.x < 0.0 {
            Direction::Left
        } else {
            Direction::Right
        };
        let vertical = if v.y < 0.0 {
            Direction::Up
        } else {
            Direction::Down
        };

        if ax > DIRECTION_DOMINANCE * ay {
            return Some(horizontal);
        }
        if ay > DIRECTION_DOMINANCE * ax {
            return Some(vertical);
        }
        Some(match (vertical, horizontal) {
            (Direction::Up, Direction::Left) => Direction::UpLeft,
            (Direction::Up, _) => Direction::UpRight,
            (_, Direction::Left) => Direction::DownLeft,
            _ => Direction::DownRight,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovementSettings {
    /// Dead-zone radius around the anchor.
    pub follow_radius: f32,
    /// Dead-zone radius used while the pet is scripted.
    pub scripted_follow_radius: f32,
    /// Displacement per tick while chasing.
    pub move_speed: f32,
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self {
            follow_radius: 50.0,
            scripted_follow_radius: 10.0,
            move_speed: 5.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Movement {
    settings: MovementSettings,
    position: Vec2,
    velocity: Vec2,
    pointer: Vec2,
    dragging: bool,
    drag_offset: Vec2,
    pointer_over: bool,
    scripted: bool,
}

impl Movement {
    pub fn new(settings: MovementSettings, position: Vec2) -> Self {
        Self {
            settings,
            position,
            velocity: Vec2::ZERO,
            // Parked on the pet so nothing is chased before the first report.
            pointer: position,
            dragging: false,
            drag_offset: Vec2::ZERO,
            pointer_over: false,
            scripted: false,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn is_moving(&self) -> bool {
        self.velocity != Vec2::ZERO
    }

    pub fn is_pointer_over(&self) -> bool {
        self.pointer_over
    }

    pub fn set_pointer_over(&mut self, over: bool) {
        self.pointer_over = over;
    }

    pub fn set_scripted(&mut self, scripted: bool) {
        self.scripted = scripted;
    }

    pub fn update_pointer_position(&mut self, x: f32, y: f32) {
        self.pointer = Vec2::new(x, y);
    }

    fn dead_zone(&self) -> f32 {
        if self.scripted {
            self.settings.scripted_follow_radius
        } else {
            self.settings.follow_radius
        }
    }

    pub fn compute_chase_vector(&self) -> Vec2 {
        if self.dragging {
            return Vec2::ZERO;
        }
        let delta = self.pointer - self.position;
        let distance = delta.length();
        if distance == 0.0 || distance <= self.dead_zone() {
            return Vec2::ZERO;
        }
        delta / distance * self.settings.move_speed
    }

    pub fn begin_drag(&mut self, x: f32, y: f32) {
        self.dragging = true;
        self.velocity = Vec2::ZERO;
        self.drag_offset = Vec2::new(x, y) - self.position;
    }

    pub fn update_drag(&mut self, x: f32, y: f32) {
        if !self.dragging {
            return;
        }
        self.position = Vec2::new(x, y) - self.drag_offset;
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    /// One chase step. Velocity is a per-tick displacement.
    pub fn tick(&mut self) {
        if self.dragging {
            return;
        }
        self.velocity = self.compute_chase_vector();
        if self.velocity != Vec2::ZERO {
            self.position += self.velocity;
        }
    }

    /// Drop any chase velocity without moving.
    pub fn halt(&mut self) {
        self.velocity = Vec2::ZERO;
    }

    pub fn current_direction(&self) -> Option<Direction> {
        Direction::from_velocity(self.velocity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> Movement {
        Movement::new(MovementSettings::default(), Vec2::ZERO)
    }

    #[test]
    fn dead_zone_yields_no_velocity() {
        let mut m = model();
        m.update_pointer_position(30.0, 40.0); // exactly 50 away
        assert_eq!(m.compute_chase_vector(), Vec2::ZERO);
        m.update_pointer_position(0.0, 0.0);
        assert_eq!(m.compute_chase_vector(), Vec2::ZERO);
    }

    #[test]
    fn chase_has_configured_speed_toward_pointer() {
        let mut m = model();
        m.update_pointer_position(60.0, 80.0);
        let v = m.compute_chase_vector();
        assert!((v.length() - 5.0).abs() < 1e-5);
        assert!((v.x - 3.0).abs() < 1e-5);
        assert!((v.y - 4.0).abs() < 1e-5);
    }

    #[test]
    fn scripted_mode_shrinks_dead_zone() {
        let mut m = model();
        m.update_pointer_position(20.0, 0.0);
        assert_eq!(m.compute_chase_vector(), Vec2::ZERO);
        m.set_scripted(true);
        assert_eq!(m.compute_chase_vector(), Vec2::new(5.0, 0.0));
    }

    #[test]
    fn tick_steps_position_by_velocity() {
        let mut m = model();
        m.update_pointer_position(100.0, 0.0);
        m.tick();
        assert_eq!(m.position(), Vec2::new(5.0, 0.0));
        assert!(m.is_moving());
        assert_eq!(m.current_direction(), Some(Direction::Right));
    }

    #[test]
    fn drag_keeps_grab_point_under_pointer() {
        let mut m = model();
        m.begin_drag(10.0, 10.0);
        m.update_drag(15.0, 12.0);
        assert_eq!(m.position(), Vec2::new(5.0, 2.0));
    }

    #[test]
    fn drag_overrides_chase() {
        let mut m = model();
        m.update_pointer_position(500.0, 500.0);
        m.begin_drag(1.0, 1.0);
        assert_eq!(m.compute_chase_vector(), Vec2::ZERO);
        m.tick();
        assert_eq!(m.position(), Vec2::ZERO);

        m.end_drag();
        m.update_drag(50.0, 50.0);
        assert_eq!(m.position(), Vec2::ZERO);
    }

    #[test]
    fn direction_uses_dominant_axis() {
        assert_eq!(Direction::from_velocity(Vec2::ZERO), None);
        assert_eq!(
            Direction::from_velocity(Vec2::new(-4.0, -1.0)),
            Some(Direction::Left)
        );
        assert_eq!(
            Direction::from_velocity(Vec2::new(0.5, 3.0)),
            Some(Direction::Down)
        );
        assert_eq!(
            Direction::from_velocity(Vec2::new(0.0, -2.0)),
            Some(Direction::Up)
        );
        assert_eq!(
            Direction::from_velocity(Vec2::new(-1.0, -1.2)),
            Some(Direction::UpLeft)
        );
        assert_eq!(
            Direction::from_velocity(Vec2::new(1.0, 1.0)),
            Some(Direction::DownRight)
        );
        assert_eq!(
            Direction::from_velocity(Vec2::new(1.4, -1.0)),
            Some(Direction::UpRight)
        );
    }
}
