/// Actor physics: integrates forces into a desired position.
///
/// ## Order of operations (one call = one tick)
///
///   1. Latch intent flags, remember last tick's ground contact, clear it
///   2. Gravity:   vy += gravity * dt
///   3. Damping:   vx *= friction        (once per call, not scaled by dt)
///   4. Jump:      grounded + jump intent  → vy += jump_impulse
///                 no jump intent, vy > cutoff → vy = cutoff  (short hops)
///   5. Forward:   move intent → vx += forward_accel * dt
///   6. Clamp velocity into [min_velocity, max_velocity]
///   7. desired = position + velocity * dt
///
/// Ground contact is only ever set again by the solid collision pass.
/// `position` is never touched here.

use super::entity::{ActorState, Intent};
use super::geometry::Vec2;

/// Physics constants, in world units per second.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Tuning {
    pub gravity: f32,
    pub friction: f32,
    pub jump_impulse: f32,
    pub jump_cutoff: f32,
    pub forward_accel: f32,
    pub min_velocity: Vec2,
    pub max_velocity: Vec2,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            gravity: -450.0,
            friction: 0.90,
            jump_impulse: 310.0,
            jump_cutoff: 150.0,
            forward_accel: 800.0,
            min_velocity: Vec2::new(0.0, -450.0),
            max_velocity: Vec2::new(120.0, 250.0),
        }
    }
}

/// Result of one integration step.
#[derive(Clone, Copy, Debug)]
pub struct Advance {
    pub actor: ActorState,
    /// A jump impulse was applied this tick (cue for the audio sink).
    pub jumped: bool,
}

pub fn advance(mut actor: ActorState, dt: f32, intent: Intent, tuning: &Tuning) -> Advance {
    actor.is_moving = intent.wants_move;
    actor.is_jumping = intent.wants_jump;
    let grounded = actor.is_on_ground;
    actor.is_on_ground = false;

    let mut v = actor.velocity;
    v.y += tuning.gravity * dt;
    v.x *= tuning.friction;

    let mut jumped = false;
    if actor.is_jumping && grounded {
        v.y += tuning.jump_impulse;
        jumped = true;
    } else if !actor.is_jumping && v.y > tuning.jump_cutoff {
        v.y = tuning.jump_cutoff;
    }

    if actor.is_moving {
        v.x += tuning.forward_accel * dt;
    }

    actor.velocity = v.clamp(tuning.min_velocity, tuning.max_velocity);
    actor.desired_position = actor.position + actor.velocity * dt;

    Advance { actor, jumped }
}
