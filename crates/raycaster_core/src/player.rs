//! # Local Player State
//!
//! Position, facing direction and camera plane of the player at this seat.
//!
//! The frame loop owns the only instance. The renderer borrows it for a
//! frame, the network layer only ever sees a copied `(x, y)`.

use crate::input::Keys;

/// Two-component vector in map cells.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
}

impl Vec2 {
    /// Creates a new vector.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Rotates the vector by `angle` radians, counter-clockwise.
    #[inline]
    #[must_use]
    pub fn rotated(self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }
}

impl From<[f64; 2]> for Vec2 {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

/// Collision query against the level map.
///
/// Level generation lives outside this crate; anything that can answer
/// "may the player stand here" plugs in.
pub trait Walkable {
    /// True if the point `(x, y)` is free floor.
    fn is_walkable(&self, x: f64, y: f64) -> bool;
}

impl<F: Fn(f64, f64) -> bool> Walkable for F {
    #[inline]
    fn is_walkable(&self, x: f64, y: f64) -> bool {
        self(x, y)
    }
}

/// A map without walls.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenField;

impl Walkable for OpenField {
    #[inline]
    fn is_walkable(&self, _x: f64, _y: f64) -> bool {
        true
    }
}

/// Local player: where we are, where we look, how fast we go.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalPlayerState {
    position: Vec2,
    direction: Vec2,
    plane: Vec2,
    /// Cells per second.
    move_speed: f64,
    /// Radians per second.
    rot_speed: f64,
}

impl LocalPlayerState {
    /// Default spawn point.
    pub const SPAWN: Vec2 = Vec2::new(22.0, 11.5);
    /// Default facing.
    pub const DIRECTION: Vec2 = Vec2::new(-1.0, 0.0);
    /// Default camera plane (about 66 degrees field of view).
    pub const PLANE: Vec2 = Vec2::new(0.0, 0.66);
    /// Default move speed in cells per second.
    pub const MOVE_SPEED: f64 = 5.0;
    /// Default rotation speed in radians per second.
    pub const ROT_SPEED: f64 = 3.0;

    /// Creates a player.
    #[must_use]
    pub const fn new(position: Vec2, direction: Vec2, plane: Vec2, move_speed: f64, rot_speed: f64) -> Self {
        Self {
            position,
            direction,
            plane,
            move_speed,
            rot_speed,
        }
    }

    /// Current position.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Current facing direction.
    #[inline]
    #[must_use]
    pub const fn direction(&self) -> Vec2 {
        self.direction
    }

    /// Current camera plane, perpendicular to the direction.
    #[inline]
    #[must_use]
    pub const fn plane(&self) -> Vec2 {
        self.plane
    }

    /// Moves along the facing direction for `frame_time` seconds.
    ///
    /// Negative time walks backwards. Each axis is checked against the map
    /// separately, so the player slides along walls instead of sticking.
    /// Returns true if the position changed.
    pub fn move_by<W: Walkable + ?Sized>(&mut self, frame_time: f64, map: &W) -> bool {
        let step = self.move_speed * frame_time;
        let before = self.position;

        let next_x = self.position.x + self.direction.x * step;
        if map.is_walkable(next_x, self.position.y) {
            self.position.x = next_x;
        }
        let next_y = self.position.y + self.direction.y * step;
        if map.is_walkable(self.position.x, next_y) {
            self.position.y = next_y;
        }

        self.position != before
    }

    /// Rotates direction and camera plane by `rot_speed * frame_time` radians.
    ///
    /// Positive time turns left.
    pub fn turn(&mut self, frame_time: f64) {
        let angle = self.rot_speed * frame_time;
        self.direction = self.direction.rotated(angle);
        self.plane = self.plane.rotated(angle);
    }

    /// Applies one frame of held keys. Returns true if the position changed.
    pub fn apply_keys<W: Walkable + ?Sized>(&mut self, keys: Keys, frame_time: f64, map: &W) -> bool {
        let before = self.position;
        if keys.contains(Keys::UP) {
            self.move_by(frame_time, map);
        }
        if keys.contains(Keys::DOWN) {
            self.move_by(-frame_time, map);
        }
        if keys.contains(Keys::RIGHT) {
            self.turn(-frame_time);
        }
        if keys.contains(Keys::LEFT) {
            self.turn(frame_time);
        }
        self.position != before
    }
}

impl Default for LocalPlayerState {
    fn default() -> Self {
        Self::new(Self::SPAWN, Self::DIRECTION, Self::PLANE, Self::MOVE_SPEED, Self::ROT_SPEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_default_spawn() {
        let player = LocalPlayerState::default();
        assert_eq!(player.position(), Vec2::new(22.0, 11.5));
        assert_eq!(player.direction(), Vec2::new(-1.0, 0.0));
        assert_eq!(player.plane(), Vec2::new(0.0, 0.66));
    }

    #[test]
    fn test_move_forward_and_back() {
        let mut player = LocalPlayerState::default();
        assert!(player.move_by(0.1, &OpenField));
        assert!((player.position().x - 21.5).abs() < EPS);
        assert!((player.position().y - 11.5).abs() < EPS);

        assert!(player.move_by(-0.1, &OpenField));
        assert!((player.position().x - 22.0).abs() < EPS);
    }

    #[test]
    fn test_wall_blocks_movement() {
        let mut player = LocalPlayerState::default();
        let wall_at_21 = |x: f64, _y: f64| x > 21.9;
        assert!(!player.move_by(0.1, &wall_at_21));
        assert_eq!(player.position(), LocalPlayerState::SPAWN);
    }

    #[test]
    fn test_slides_along_wall() {
        let mut player = LocalPlayerState::new(
            Vec2::new(5.0, 5.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 0.66),
            1.0,
            1.0,
        );
        // X is blocked, Y is free.
        let map = |x: f64, _y: f64| x <= 5.0;
        assert!(player.move_by(1.0, &map));
        assert_eq!(player.position(), Vec2::new(5.0, 6.0));
    }

    #[test]
    fn test_turn_keeps_plane_perpendicular() {
        let mut player = LocalPlayerState::default();
        player.turn(0.37);
        let dot = player.direction().x * player.plane().x + player.direction().y * player.plane().y;
        assert!(dot.abs() < EPS);
        // Turning never moves.
        assert_eq!(player.position(), LocalPlayerState::SPAWN);
    }

    #[test]
    fn test_apply_keys() {
        let mut player = LocalPlayerState::default();
        assert!(!player.apply_keys(Keys::LEFT | Keys::RIGHT, 0.1, &OpenField));
        assert!(!player.apply_keys(Keys::empty(), 0.1, &OpenField));
        assert!(player.apply_keys(Keys::UP, 0.1, &OpenField));
        // Forward then back in the same frame cancels out.
        let before = player.position();
        assert!(!player.apply_keys(Keys::UP | Keys::DOWN, 0.1, &OpenField));
        assert_eq!(player.position(), before);
    }
}
