/// Tile collision resolution for one actor against one layer.
///
/// ## Sampling
///
/// The actor's grid cell is taken from its *committed* position, and the
/// 3×3 neighbourhood is walked row-major (row -1..=1, col -1..=1). A row at
/// or below the bottom edge aborts the walk: the actor has dropped into a pit.
/// Rows above the top edge are open sky and read as empty.
///
/// ## Priority
///
/// The centre cell is dropped and the other 8 are resolved in the order of
/// `PRIORITY`: Bottom, Top, Left, Right, then the diagonals. Bottom goes first
/// so floor contact settles before any wall nudges the actor sideways.
///
/// ## Resolution
///
/// Each slot re-derives the collision box from the current desired position,
/// so pushes accumulate. Only strictly positive overlaps count. After the
/// last slot the desired position is committed.
///
/// Hazard tiles never push: any overlap is a loss.

use tracing::debug;

use super::entity::ActorState;
use super::geometry::Aabb;
use super::grid::{OutOfRows, TileGrid};
use super::tile::{Layer, TileCoord, TileId};

/// Direction of a neighbour cell relative to the actor.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Slot {
    Bottom,
    Top,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Resolution order: (row offset, col offset, slot). Rows grow downward.
pub const PRIORITY: [(i32, i32, Slot); 8] = [
    (1, 0, Slot::Bottom),
    (-1, 0, Slot::Top),
    (0, -1, Slot::Left),
    (0, 1, Slot::Right),
    (-1, -1, Slot::TopLeft),
    (-1, 1, Slot::TopRight),
    (1, -1, Slot::BottomLeft),
    (1, 1, Slot::BottomRight),
];

/// One sampled neighbour cell.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct NeighborSample {
    pub slot: Slot,
    pub coord: TileCoord,
    pub tile: TileId,
    pub rect: Aabb,
}

/// Marker: the neighbourhood reached past the bottom of the grid.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FellThrough;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Clear,
    FellThrough,
    HazardContact,
}

#[derive(Clone, Copy, Debug)]
pub struct Resolution {
    pub actor: ActorState,
    pub outcome: Outcome,
}

/// Sample the 8 neighbours of the actor's committed cell, in priority order.
pub fn sample_neighbors(
    grid: &TileGrid,
    layer: Layer,
    actor: &ActorState,
) -> Result<[NeighborSample; 8], FellThrough> {
    let center = grid.grid_of(actor.position);

    // Row-major walk; index = (d_row + 1) * 3 + (d_col + 1).
    let mut cells = [TileId::EMPTY; 9];
    for d_row in -1..=1 {
        for d_col in -1..=1 {
            let coord = center.offset(d_col, d_row);
            let tile = match grid.tile_id_at(layer, coord) {
                Ok(id) => id,
                Err(OutOfRows::Above) => TileId::EMPTY,
                Err(OutOfRows::Below) => return Err(FellThrough),
            };
            cells[((d_row + 1) * 3 + d_col + 1) as usize] = tile;
        }
    }

    Ok(PRIORITY.map(|(d_row, d_col, slot)| {
        let coord = center.offset(d_col, d_row);
        NeighborSample {
            slot,
            coord,
            tile: cells[((d_row + 1) * 3 + d_col + 1) as usize],
            rect: grid.world_rect_of(coord),
        }
    }))
}

/// Resolve the actor against one layer of the grid.
pub fn resolve(actor: ActorState, grid: &TileGrid, layer: Layer) -> Resolution {
    let samples = match sample_neighbors(grid, layer, &actor) {
        Ok(s) => s,
        Err(FellThrough) => {
            debug!(?layer, x = actor.position.x, y = actor.position.y, "fell through bottom of grid");
            return Resolution { actor, outcome: Outcome::FellThrough };
        }
    };
    match layer {
        Layer::Solid => resolve_solids(actor, &samples),
        Layer::Hazard => check_hazards(actor, &samples),
    }
}

fn check_hazards(actor: ActorState, samples: &[NeighborSample; 8]) -> Resolution {
    let hitbox = actor.collision_box();
    let hit = samples
        .iter()
        .filter(|s| !s.tile.is_empty())
        .find(|s| hitbox.overlap(&s.rect).is_some());

    match hit {
        Some(s) => {
            debug!(slot = ?s.slot, col = s.coord.col, row = s.coord.row, "hazard contact");
            Resolution { actor, outcome: Outcome::HazardContact }
        }
        None => Resolution { actor, outcome: Outcome::Clear },
    }
}

fn resolve_solids(mut actor: ActorState, samples: &[NeighborSample; 8]) -> Resolution {
    for s in samples {
        if s.tile.is_empty() {
            continue;
        }
        let overlap = match actor.collision_box().overlap(&s.rect) {
            Some(o) => o,
            None => continue,
        };
        let (w, h) = (overlap.size.x, overlap.size.y);

        match s.slot {
            Slot::Bottom => land(&mut actor, h),
            Slot::Top => bump_head(&mut actor, h),
            Slot::Left => actor.desired_position.x += w,
            Slot::Right => actor.desired_position.x -= w,
            Slot::TopLeft | Slot::TopRight | Slot::BottomLeft | Slot::BottomRight => {
                if w > h {
                    match s.slot {
                        Slot::BottomLeft | Slot::BottomRight => land(&mut actor, h),
                        _ => bump_head(&mut actor, h),
                    }
                } else {
                    // Push away from the side the tile sits on.
                    match s.slot {
                        Slot::TopLeft | Slot::BottomLeft => actor.desired_position.x += w,
                        _ => actor.desired_position.x -= w,
                    }
                }
            }
        }
    }

    Resolution { actor: actor.commit(), outcome: Outcome::Clear }
}

#[inline]
fn land(actor: &mut ActorState, h: f32) {
    actor.desired_position.y += h;
    actor.velocity.y = 0.0;
    actor.is_on_ground = true;
}

#[inline]
fn bump_head(actor: &mut ActorState, h: f32) {
    actor.desired_position.y -= h;
    actor.velocity.y = 0.0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geometry::Vec2;

    const TILE: f32 = 16.0;

    /// Build a grid from ASCII rows: '#' solid, '^' hazard, anything else empty.
    fn grid_from(rows: &[&str]) -> TileGrid {
        let height = rows.len();
        let width = rows[0].len();
        let mut solid = vec![TileId::EMPTY; width * height];
        let mut hazard = vec![TileId::EMPTY; width * height];
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                match ch {
                    '#' => solid[y * width + x] = TileId(1),
                    '^' => hazard[y * width + x] = TileId(1),
                    _ => {}
                }
            }
        }
        TileGrid::new(width, height, Vec2::new(TILE, TILE), solid, hazard).unwrap()
    }

    /// Actor committed at `pos`, proposing `desired`, 10 x 20 hitbox.
    fn actor_at(pos: (f32, f32), desired: (f32, f32)) -> ActorState {
        let mut a = ActorState::new(Vec2::new(pos.0, pos.1), Vec2::new(10.0, 20.0));
        a.desired_position = Vec2::new(desired.0, desired.1);
        a
    }

    // 10 rows = 160 px tall. Row 8 spans y 16..32, row 7 spans y 32..48.
    // Column 6 spans x 96..112, column 5 spans x 80..96.

    #[test]
    fn priority_table_order() {
        let slots: Vec<Slot> = PRIORITY.iter().map(|p| p.2).collect();
        assert_eq!(slots, vec![
            Slot::Bottom, Slot::Top, Slot::Left, Slot::Right,
            Slot::TopLeft, Slot::TopRight, Slot::BottomLeft, Slot::BottomRight,
        ]);
    }

    #[test]
    fn samples_come_back_in_priority_order() {
        let g = grid_from(&[
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            ".....#....",
            "..........",
            "......#...",
            "..........",
        ]);
        let a = actor_at((100.0, 40.0), (100.0, 40.0)); // cell (6, 7)
        let s = sample_neighbors(&g, Layer::Solid, &a).unwrap();
        assert_eq!(s[0].slot, Slot::Bottom);
        assert_eq!(s[0].coord, TileCoord::new(6, 8));
        assert_eq!(s[0].tile, TileId(1));
        assert_eq!(s[0].rect, Aabb::new(96.0, 16.0, 16.0, 16.0));
        assert_eq!(s[4].slot, Slot::TopLeft);
        assert_eq!(s[4].coord, TileCoord::new(5, 6));
        assert_eq!(s[4].tile, TileId(1));
        assert!(s.iter().all(|n| n.coord != TileCoord::new(6, 7)));
    }

    #[test]
    fn empty_neighbourhood_leaves_actor_alone() {
        let g = grid_from(&[".........."; 10]);
        let a = actor_at((100.0, 80.0), (101.5, 78.0));
        let r = resolve(a, &g, Layer::Solid);
        assert_eq!(r.outcome, Outcome::Clear);
        assert_eq!(r.actor.desired_position, Vec2::new(101.5, 78.0));
        assert_eq!(r.actor.position, Vec2::new(101.5, 78.0));
        assert!(!r.actor.is_on_ground);
    }

    #[test]
    fn landing_on_floor() {
        let g = grid_from(&[
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "##########",
            "..........",
        ]);
        let mut a = actor_at((100.0, 40.0), (100.0, 38.0)); // box y 28..48
        a.velocity = Vec2::new(30.0, -120.0);
        let r = resolve(a, &g, Layer::Solid);
        assert_eq!(r.outcome, Outcome::Clear);
        // Floor top is y = 32: overlap 4.
        assert_eq!(r.actor.desired_position.y, 42.0);
        assert_eq!(r.actor.position, Vec2::new(100.0, 42.0));
        assert_eq!(r.actor.velocity, Vec2::new(30.0, 0.0));
        assert!(r.actor.is_on_ground);
    }

    #[test]
    fn bottom_wins_over_left() {
        let g = grid_from(&[
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            ".....#....",
            "##########",
            "..........",
        ]);
        // Box x 95..105 overlaps the left wall (x 80..96) by 1.
        let mut a = actor_at((100.0, 40.0), (100.0, 38.0));
        a.velocity = Vec2::new(0.0, -50.0);
        let r = resolve(a, &g, Layer::Solid);
        assert_eq!(r.actor.desired_position, Vec2::new(101.0, 42.0));
        assert_eq!(r.actor.velocity.y, 0.0);
        assert!(r.actor.is_on_ground);
    }

    #[test]
    fn head_bump_pushes_down() {
        let g = grid_from(&[
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "......#...", // row 5: y 64..80
            "..........", // row 6: y 48..64
            "..........",
            "..........",
            "..........",
        ]);
        let mut a = actor_at((100.0, 56.0), (100.0, 57.0)); // box y 47..67
        a.velocity = Vec2::new(0.0, 200.0);
        let r = resolve(a, &g, Layer::Solid);
        assert_eq!(r.actor.desired_position.y, 54.0);
        assert_eq!(r.actor.velocity.y, 0.0);
        assert!(!r.actor.is_on_ground);
    }

    #[test]
    fn right_wall_pushes_left() {
        let g = grid_from(&[
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            ".......#..", // col 7: x 112..128, row 7: y 32..48
            "..........",
            "..........",
        ]);
        let a = actor_at((104.0, 40.0), (109.0, 40.0)); // box x 104..114
        let r = resolve(a, &g, Layer::Solid);
        assert_eq!(r.actor.desired_position.x, 107.0);
    }

    #[test]
    fn diagonal_shallow_overlap_resolves_vertically() {
        let g = grid_from(&[
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            ".......#..", // bottom-right of cell (6, 7)
            "..........",
        ]);
        // Box x 106..116 (w overlap 4), y 30..50 (h overlap 2).
        let mut a = actor_at((110.0, 40.0), (111.0, 40.0));
        a.velocity = Vec2::new(10.0, -80.0);
        let r = resolve(a, &g, Layer::Solid);
        assert_eq!(r.actor.desired_position, Vec2::new(111.0, 42.0));
        assert_eq!(r.actor.velocity.y, 0.0);
        assert!(r.actor.is_on_ground);
    }

    #[test]
    fn diagonal_tall_overlap_resolves_horizontally_on_x() {
        let g = grid_from(&[
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            ".....#....", // top-left of cell (6, 7): x 80..96, y 48..64
            "..........",
            "..........",
            "..........",
        ]);
        // Box x 94..104 (w 2), y 40..60 (h 12).
        let a = actor_at((100.0, 40.0), (99.0, 50.0));
        let r = resolve(a, &g, Layer::Solid);
        assert_eq!(r.actor.desired_position, Vec2::new(101.0, 50.0));
        assert!(!r.actor.is_on_ground);

        let g = grid_from(&[
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            ".......#..", // top-right of cell (6, 7): x 112..128
            "..........",
            "..........",
            "..........",
        ]);
        // Box x 104..114 (w 2), y 40..60.
        let a = actor_at((100.0, 40.0), (109.0, 50.0));
        let r = resolve(a, &g, Layer::Solid);
        assert_eq!(r.actor.desired_position, Vec2::new(107.0, 50.0));
    }

    #[test]
    fn touching_edge_is_not_a_collision() {
        let g = grid_from(&[
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "##########",
            "..........",
        ]);
        let mut a = actor_at((100.0, 42.0), (100.0, 42.0)); // box bottom exactly 32
        a.velocity = Vec2::new(0.0, -5.0);
        let r = resolve(a, &g, Layer::Solid);
        assert_eq!(r.actor.desired_position.y, 42.0);
        assert_eq!(r.actor.velocity.y, -5.0);
        assert!(!r.actor.is_on_ground);
    }

    #[test]
    fn falling_past_bottom_row_aborts() {
        let g = grid_from(&[
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "##########",
            "######....",
        ]);
        // Cell (6, 9): the bottom neighbours are off the grid.
        let mut a = actor_at((100.0, 8.0), (100.0, 6.0));
        a.velocity = Vec2::new(0.0, -100.0);
        assert_eq!(sample_neighbors(&g, Layer::Solid, &a), Err(FellThrough));

        let r = resolve(a, &g, Layer::Solid);
        assert_eq!(r.outcome, Outcome::FellThrough);
        assert_eq!(r.actor, a);
    }

    #[test]
    fn rows_above_the_grid_are_sky() {
        let g = grid_from(&["..........", ".........."]);
        let a = actor_at((100.0, 40.0), (100.0, 41.0)); // row -1
        let r = resolve(a, &g, Layer::Solid);
        assert_eq!(r.outcome, Outcome::Clear);
        assert_eq!(r.actor.position, Vec2::new(100.0, 41.0));
    }

    #[test]
    fn hazard_contact_is_lethal_and_does_not_push() {
        let g = grid_from(&[
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "......^...",
            "..........",
        ]);
        let a = actor_at((100.0, 40.0), (100.0, 38.0));
        let r = resolve(a, &g, Layer::Hazard);
        assert_eq!(r.outcome, Outcome::HazardContact);
        assert_eq!(r.actor, a);

        // Solid pass ignores hazard tiles entirely.
        let r = resolve(a, &g, Layer::Solid);
        assert_eq!(r.outcome, Outcome::Clear);
        assert_eq!(r.actor.desired_position.y, 38.0);
    }

    #[test]
    fn hazard_touching_edge_is_safe() {
        let g = grid_from(&[
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "......^...",
            "..........",
        ]);
        let a = actor_at((100.0, 42.0), (100.0, 42.0));
        assert_eq!(resolve(a, &g, Layer::Hazard).outcome, Outcome::Clear);
    }
}
