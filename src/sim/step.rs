/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Physics advance (desired position only)
///   2. Hazard pass       → may end the game (lost)
///   3. Win check         → may end the game (won), uses committed x
///   4. Solid pass        → may end the game (fell through), else commits
///
/// Any transition to GameOver ends the tick without committing. Once in
/// GameOver, `step` is a no-op until `restart_level`.

use tracing::info;

use crate::domain::collision::{self, Outcome};
use crate::domain::entity::{ActorState, Intent};
use crate::domain::physics;
use crate::domain::tile::Layer;
use super::event::GameEvent;
use super::world::{Ending, LossCause, Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, dt: f32, intent: Intent) -> Vec<GameEvent> {
    if world.phase != Phase::Playing { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;

    let advanced = physics::advance(world.actor, dt, intent, &world.tuning);
    if advanced.jumped { events.push(GameEvent::Jumped); }
    let actor = advanced.actor;

    if resolve_hazards(world, actor, &mut events) { return events; }
    if resolve_win(world, &mut events) { return events; }
    resolve_solids(world, actor, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Collision passes
// ══════════════════════════════════════════════════════════════

fn resolve_hazards(world: &mut WorldState, actor: ActorState, events: &mut Vec<GameEvent>) -> bool {
    let res = collision::resolve(actor, &world.grid, Layer::Hazard);
    match res.outcome {
        Outcome::Clear => false,
        Outcome::HazardContact => {
            events.push(GameEvent::HazardDeath);
            game_over(world, Ending::Lost(LossCause::Hazard));
            true
        }
        Outcome::FellThrough => {
            events.push(GameEvent::FellIntoPit);
            game_over(world, Ending::Lost(LossCause::FellThrough));
            true
        }
    }
}

fn resolve_solids(world: &mut WorldState, actor: ActorState, events: &mut Vec<GameEvent>) {
    let res = collision::resolve(actor, &world.grid, Layer::Solid);
    match res.outcome {
        Outcome::FellThrough => {
            events.push(GameEvent::FellIntoPit);
            game_over(world, Ending::Lost(LossCause::FellThrough));
        }
        // Solid pass never reports hazard contact.
        Outcome::Clear | Outcome::HazardContact => world.actor = res.actor,
    }
}

// ══════════════════════════════════════════════════════════════
// Win check
// ══════════════════════════════════════════════════════════════

fn resolve_win(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    if world.actor.position.x > world.finish_x {
        events.push(GameEvent::LevelCleared);
        game_over(world, Ending::Won);
        return true;
    }
    false
}

// ══════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════

fn game_over(world: &mut WorldState, ending: Ending) {
    info!(
        level = %world.level_name,
        tick = world.tick,
        x = world.actor.position.x,
        y = world.actor.position.y,
        ?ending,
        "game over"
    );
    world.phase = Phase::GameOver(ending);
}

/// Replay: put a fresh actor at the spawn point and resume play.
pub fn restart_level(world: &mut WorldState) {
    world.actor = ActorState::new(world.spawn, world.actor.hitbox);
    world.phase = Phase::Playing;
    world.tick = 0;
    world.camera.follow(world.spawn, world.grid.pixel_size());
    info!(level = %world.level_name, "level restarted");
}
