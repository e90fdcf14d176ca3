/// The player actor as plain simulation data.
///
/// `ActorState` is a value type: the step function takes it, the physics
/// and collision passes return an updated copy. Nothing holds a reference
/// to it across a tick.

use super::geometry::{Aabb, Vec2};

/// Per-tick intent from whatever input source is attached.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Intent {
    pub wants_move: bool,
    pub wants_jump: bool,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ActorState {
    /// Committed position (centre of the hitbox). Written only by the commit step.
    pub position: Vec2,
    /// Proposed position for this tick; physics and collision write here.
    pub desired_position: Vec2,
    /// World units per second.
    pub velocity: Vec2,
    /// Collision box size, centred on the position.
    pub hitbox: Vec2,
    pub is_moving: bool,
    pub is_jumping: bool,
    pub is_on_ground: bool,
}

impl ActorState {
    pub fn new(position: Vec2, hitbox: Vec2) -> Self {
        ActorState {
            position,
            desired_position: position,
            velocity: Vec2::ZERO,
            hitbox,
            is_moving: false,
            is_jumping: false,
            is_on_ground: false,
        }
    }

    /// Collision box at the desired position.
    pub fn collision_box(&self) -> Aabb {
        Aabb::centered(self.desired_position, self.hitbox)
    }

    /// Accept the desired position as the new committed position.
    pub fn commit(mut self) -> Self {
        self.position = self.desired_position;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_actor_is_at_rest() {
        let a = ActorState::new(Vec2::new(100.0, 50.0), Vec2::new(10.0, 20.0));
        assert_eq!(a.desired_position, a.position);
        assert_eq!(a.velocity, Vec2::ZERO);
        assert!(!a.is_on_ground && !a.is_moving && !a.is_jumping);
    }

    #[test]
    fn collision_box_follows_desired_position() {
        let mut a = ActorState::new(Vec2::new(100.0, 50.0), Vec2::new(10.0, 20.0));
        a.desired_position = Vec2::new(110.0, 40.0);
        assert_eq!(a.collision_box(), Aabb::new(105.0, 30.0, 10.0, 20.0));
        assert_eq!(a.position, Vec2::new(100.0, 50.0));
    }

    #[test]
    fn commit_copies_desired() {
        let mut a = ActorState::new(Vec2::ZERO, Vec2::new(1.0, 1.0));
        a.desired_position = Vec2::new(3.0, 4.0);
        let a = a.commit();
        assert_eq!(a.position, Vec2::new(3.0, 4.0));
    }
}
