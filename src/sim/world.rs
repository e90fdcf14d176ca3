/// WorldState: the complete state of a running level.
///
/// ## Ownership
///
///   - `grid` : loaded once per level, **never mutated** afterwards.
///   - `actor`: replaced wholesale by `step` each tick (value type).
///   - `phase`: `Playing` until a win or loss; `GameOver` is terminal
///     until `restart_level` rebuilds the actor from the spawn point.
///
/// ## Camera / Viewport
///
/// World and screen coordinates are separate:
///   - `camera`: view centre and view size, both in world units
///   - The renderer sets `view_size` from the terminal size, then
///     `follow()` clamps the centre so the view never leaves the level

use crate::domain::entity::ActorState;
use crate::domain::geometry::Vec2;
use crate::domain::grid::TileGrid;
use crate::domain::physics::Tuning;
use crate::sim::level::Level;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LossCause {
    Hazard,
    FellThrough,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Ending {
    Won,
    Lost(LossCause),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    GameOver(Ending),
}

/// Camera: a viewport into the world, in world units.
#[derive(Clone, Debug)]
pub struct Camera {
    /// World position at the centre of the view.
    pub center: Vec2,
    /// Size of the visible area.
    pub view_size: Vec2,
}

impl Camera {
    pub fn new() -> Self {
        Camera { center: Vec2::ZERO, view_size: Vec2::ZERO }
    }

    /// Track a target, clamping each axis to
    /// `[half_view, level_extent - half_view]`. A level smaller than the
    /// view on some axis is centred on that axis instead.
    pub fn follow(&mut self, target: Vec2, level_extent: Vec2) {
        self.center = Vec2::new(
            clamp_axis(target.x, self.view_size.x, level_extent.x),
            clamp_axis(target.y, self.view_size.y, level_extent.y),
        );
    }

    /// World position of the bottom-left corner of the view.
    pub fn origin(&self) -> Vec2 {
        self.center - self.view_size * 0.5
    }
}

fn clamp_axis(target: f32, view: f32, extent: f32) -> f32 {
    if extent <= view {
        return extent / 2.0;
    }
    let half = view / 2.0;
    target.max(half).min(extent - half)
}

pub struct WorldState {
    pub grid: TileGrid,
    pub actor: ActorState,
    pub tuning: Tuning,
    pub phase: Phase,
    pub level_name: String,
    pub spawn: Vec2,
    /// Committed x beyond which the level counts as cleared.
    pub finish_x: f32,
    pub tick: u64,
    pub camera: Camera,
}

impl WorldState {
    pub fn new(level: Level, tuning: Tuning, hitbox: Vec2) -> Self {
        let actor = ActorState::new(level.spawn, hitbox);
        let mut camera = Camera::new();
        camera.center = level.spawn;
        WorldState {
            grid: level.grid,
            actor,
            tuning,
            phase: Phase::Playing,
            level_name: level.name,
            spawn: level.spawn,
            finish_x: level.finish_x,
            tick: 0,
            camera,
        }
    }

    #[inline]
    pub fn is_game_over(&self) -> bool {
        matches!(self.phase, Phase::GameOver(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_tracks_inside_level() {
        let mut cam = Camera::new();
        cam.view_size = Vec2::new(320.0, 160.0);
        cam.follow(Vec2::new(1000.0, 120.0), Vec2::new(3200.0, 240.0));
        assert_eq!(cam.center, Vec2::new(1000.0, 120.0));
        assert_eq!(cam.origin(), Vec2::new(840.0, 40.0));
    }

    #[test]
    fn camera_clamps_to_level_edges() {
        let mut cam = Camera::new();
        cam.view_size = Vec2::new(320.0, 160.0);
        cam.follow(Vec2::new(20.0, 10.0), Vec2::new(3200.0, 240.0));
        assert_eq!(cam.center, Vec2::new(160.0, 80.0));
        cam.follow(Vec2::new(3190.0, 239.0), Vec2::new(3200.0, 240.0));
        assert_eq!(cam.center, Vec2::new(3040.0, 160.0));
    }

    #[test]
    fn camera_centres_small_levels() {
        let mut cam = Camera::new();
        cam.view_size = Vec2::new(640.0, 480.0);
        cam.follow(Vec2::new(20.0, 10.0), Vec2::new(320.0, 240.0));
        assert_eq!(cam.center, Vec2::new(160.0, 120.0));
    }
}
