/// Level loader.
///
/// ## Sources (priority order):
///   1. Path given on the command line
///   2. `level_file` from config.toml
///   3. Built-in embedded level
///
/// ## Level format (`.txt`):
///   ```
///   # Level Name
///   @ tile=16x16 finish=3130
///   <map rows, top row first>
///   ```
///
/// The `@` line is optional; `tile` defaults to 16x16 and `finish` to the
/// `F` column (or one tile short of the right edge when there is none).
/// Rows shorter than the widest row are padded with empty cells.
///
/// ## Tile legend:
///   '#' = Ground (solid)     '=' = Brick (solid)
///   '?' = Block (solid)      '^' = Spikes (hazard)
///   'P' = Player spawn       'F' = Finish column marker
///   anything else = Empty

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::domain::geometry::Vec2;
use crate::domain::grid::{GridError, TileGrid};
use crate::domain::tile::{TileCoord, TileId};

// Solid layer ids
pub const GROUND: TileId = TileId(1);
pub const BRICK: TileId = TileId(2);
pub const BLOCK: TileId = TileId(3);
// Hazard layer ids
pub const SPIKES: TileId = TileId(1);

const DEFAULT_TILE: f32 = 16.0;

const BUILTIN: &str = include_str!("../../levels/koalio-hills.txt");

/// A validated level, ready to become a `WorldState`.
#[derive(Clone, Debug)]
pub struct Level {
    pub name: String,
    pub grid: TileGrid,
    /// Centre of the spawn cell.
    pub spawn: Vec2,
    pub finish_x: f32,
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("level has no map rows")]
    Empty,
    #[error("level has no spawn point ('P')")]
    MissingSpawn,
    #[error("level has more than one spawn point ('P')")]
    MultipleSpawns,
    #[error("bad metadata `{0}`")]
    BadMeta(String),
    #[error(transparent)]
    Grid(#[from] GridError),
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Load the level from `path`, or the built-in level when `None`.
pub fn load_level(path: Option<&Path>) -> Result<Level, LevelError> {
    let level = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .map_err(|source| LevelError::Io { path: p.to_path_buf(), source })?;
            parse_level(&text)?
        }
        None => builtin_level()?,
    };
    info!(
        name = %level.name,
        width = level.grid.width(),
        height = level.grid.height(),
        finish_x = level.finish_x,
        "level loaded"
    );
    Ok(level)
}

pub fn builtin_level() -> Result<Level, LevelError> {
    parse_level(BUILTIN)
}

pub fn parse_level(content: &str) -> Result<Level, LevelError> {
    let mut name = String::from("Untitled");
    let mut tile = Vec2::new(DEFAULT_TILE, DEFAULT_TILE);
    let mut finish: Option<f32> = None;
    let mut rows: Vec<&str> = vec![];

    for line in content.lines() {
        let line = line.trim_end_matches('\r');
        if rows.is_empty() {
            if let Some(rest) = line.strip_prefix('#').filter(|r| r.starts_with(' ')) {
                name = rest.trim().to_string();
                continue;
            }
            if let Some(rest) = line.strip_prefix('@') {
                parse_meta(rest, &mut tile, &mut finish)?;
                continue;
            }
            if line.trim().is_empty() { continue; }
        }
        rows.push(line);
    }
    while rows.last().map_or(false, |r| r.trim().is_empty()) {
        rows.pop();
    }

    let height = rows.len();
    if height == 0 {
        return Err(LevelError::Empty);
    }
    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);

    let mut solid = vec![TileId::EMPTY; width * height];
    let mut hazard = vec![TileId::EMPTY; width * height];
    let mut spawn_cell: Option<TileCoord> = None;
    let mut finish_col: Option<usize> = None;

    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            let idx = y * width + x;
            match ch {
                '#' => solid[idx] = GROUND,
                '=' => solid[idx] = BRICK,
                '?' => solid[idx] = BLOCK,
                '^' => hazard[idx] = SPIKES,
                'P' => {
                    if spawn_cell.is_some() { return Err(LevelError::MultipleSpawns); }
                    spawn_cell = Some(TileCoord::new(x as i32, y as i32));
                }
                'F' => {
                    finish_col.get_or_insert(x);
                }
                _ => {}
            }
        }
    }

    let grid = TileGrid::new(width, height, tile, solid, hazard)?;
    let spawn_cell = spawn_cell.ok_or(LevelError::MissingSpawn)?;
    let spawn_rect = grid.world_rect_of(spawn_cell);
    let spawn = Vec2::new(
        spawn_rect.min_x() + tile.x / 2.0,
        spawn_rect.min_y() + tile.y / 2.0,
    );
    let finish_x = finish
        .or_else(|| finish_col.map(|c| c as f32 * tile.x))
        .unwrap_or(grid.pixel_size().x - tile.x);

    Ok(Level { name, grid, spawn, finish_x })
}

/// `tile=WxH finish=X`, whitespace separated.
fn parse_meta(meta: &str, tile: &mut Vec2, finish: &mut Option<f32>) -> Result<(), LevelError> {
    for pair in meta.split_whitespace() {
        let bad = || LevelError::BadMeta(pair.to_string());
        let (key, value) = pair.split_once('=').ok_or_else(bad)?;
        match key {
            "tile" => {
                let (w, h) = value.split_once('x').ok_or_else(bad)?;
                let w: f32 = w.parse().map_err(|_| bad())?;
                let h: f32 = h.parse().map_err(|_| bad())?;
                *tile = Vec2::new(w, h);
            }
            "finish" => {
                *finish = Some(value.parse().map_err(|_| bad())?);
            }
            _ => return Err(bad()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::Layer;

    #[test]
    fn builtin_level_is_valid() {
        let level = builtin_level().unwrap();
        assert_eq!(level.name, "Koalio Hills");
        assert_eq!(level.grid.width(), 200);
        assert_eq!(level.grid.height(), 15);
        assert_eq!(level.finish_x, 3130.0);
        assert!(level.finish_x < level.grid.pixel_size().x);
        // Spawn cell (5, 11): 240 - 12 * 16 = 48.
        assert_eq!(level.spawn, Vec2::new(88.0, 56.0));
    }

    #[test]
    fn legend_maps_to_layers() {
        let level = parse_level("# T\n#=?\n^P.\n").unwrap();
        let g = &level.grid;
        assert_eq!(g.tile_id_at(Layer::Solid, TileCoord::new(0, 0)), Ok(GROUND));
        assert_eq!(g.tile_id_at(Layer::Solid, TileCoord::new(1, 0)), Ok(BRICK));
        assert_eq!(g.tile_id_at(Layer::Solid, TileCoord::new(2, 0)), Ok(BLOCK));
        assert_eq!(g.tile_id_at(Layer::Hazard, TileCoord::new(0, 1)), Ok(SPIKES));
        assert_eq!(g.tile_id_at(Layer::Solid, TileCoord::new(0, 1)), Ok(TileId::EMPTY));
        assert_eq!(level.spawn, Vec2::new(24.0, 8.0));
    }

    #[test]
    fn ragged_rows_are_padded() {
        let level = parse_level("# Ragged\n.P\n#####\n").unwrap();
        assert_eq!(level.grid.width(), 5);
        assert_eq!(
            level.grid.tile_id_at(Layer::Solid, TileCoord::new(4, 0)),
            Ok(TileId::EMPTY)
        );
    }

    #[test]
    fn meta_overrides_tile_size_and_finish() {
        let level = parse_level("# M\n@ tile=32x8 finish=50\nP..\n###\n").unwrap();
        assert_eq!(level.grid.tile_size(), Vec2::new(32.0, 8.0));
        assert_eq!(level.finish_x, 50.0);
        assert_eq!(level.spawn, Vec2::new(16.0, 12.0));
    }

    #[test]
    fn finish_column_marker() {
        let level = parse_level("P..F.\n#####\n").unwrap();
        assert_eq!(level.name, "Untitled");
        assert_eq!(level.finish_x, 48.0);

        let level = parse_level("P....\n#####\n").unwrap();
        assert_eq!(level.finish_x, 64.0);
    }

    #[test]
    fn map_rows_may_start_with_hash() {
        // A '#' row without a following space is map data, not a name.
        let level = parse_level("# Name\n..P\n###\n").unwrap();
        assert_eq!(level.grid.height(), 2);
        assert_eq!(level.name, "Name");
    }

    #[test]
    fn rejects_broken_levels() {
        assert!(matches!(parse_level("# Nothing\n"), Err(LevelError::Empty)));
        assert!(matches!(parse_level("...\n###\n"), Err(LevelError::MissingSpawn)));
        assert!(matches!(parse_level("P.P\n###\n"), Err(LevelError::MultipleSpawns)));
        assert!(matches!(parse_level("@ tile=abc\nP\n"), Err(LevelError::BadMeta(_))));
        assert!(matches!(parse_level("@ speed=3\nP\n"), Err(LevelError::BadMeta(_))));
        assert!(matches!(
            parse_level("@ tile=0x16\nP\n"),
            Err(LevelError::Grid(GridError::TileSize { .. }))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_level(Some(Path::new("/nonexistent/koalio/level.txt"))).unwrap_err();
        assert!(matches!(err, LevelError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/koalio/level.txt"));
    }
}
