/// TileGrid: the static tile map of one level.
///
/// ## Coordinates
///
/// Storage is row-major with a top-left origin (row 0 = top of the level).
/// World space is bottom-left origin, so the vertical axis is flipped:
///
///   col = floor(x / tile_w)
///   row = floor((height_px - y) / tile_h)
///
/// ## Out-of-range queries
///
/// Columns past either horizontal edge read as empty: level edges may
/// legitimately look one cell outside. Rows are not forgiving: a row below
/// the grid is how a fall into a pit is detected, so it is reported rather
/// than answered.

use thiserror::Error;

use super::geometry::{Aabb, Vec2};
use super::tile::{Layer, TileCoord, TileId};

/// A row query that fell outside `[0, height)`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OutOfRows {
    Above,
    Below,
}

#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("tile grid must have at least one row and one column (got {width}x{height})")]
    Empty { width: usize, height: usize },
    #[error("tile size must be positive (got {width}x{height})")]
    TileSize { width: f32, height: f32 },
    #[error("{layer:?} layer has {actual} tiles, expected {expected}")]
    LayerSize { layer: Layer, expected: usize, actual: usize },
}

#[derive(Clone, Debug)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tile_size: Vec2,
    solid: Vec<TileId>,
    hazard: Vec<TileId>,
}

impl TileGrid {
    /// Build a validated grid. Layers are row-major, `width * height` long.
    pub fn new(
        width: usize,
        height: usize,
        tile_size: Vec2,
        solid: Vec<TileId>,
        hazard: Vec<TileId>,
    ) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::Empty { width, height });
        }
        if !(tile_size.x > 0.0 && tile_size.y > 0.0) {
            return Err(GridError::TileSize { width: tile_size.x, height: tile_size.y });
        }
        let expected = width * height;
        for (layer, tiles) in [(Layer::Solid, &solid), (Layer::Hazard, &hazard)] {
            if tiles.len() != expected {
                return Err(GridError::LayerSize { layer, expected, actual: tiles.len() });
            }
        }
        Ok(TileGrid { width, height, tile_size, solid, hazard })
    }

    #[inline] pub fn width(&self) -> usize { self.width }
    #[inline] pub fn height(&self) -> usize { self.height }
    #[inline] pub fn tile_size(&self) -> Vec2 { self.tile_size }

    /// Level extent in world units.
    pub fn pixel_size(&self) -> Vec2 {
        Vec2::new(
            self.width as f32 * self.tile_size.x,
            self.height as f32 * self.tile_size.y,
        )
    }

    pub fn tile_id_at(&self, layer: Layer, coord: TileCoord) -> Result<TileId, OutOfRows> {
        if coord.row < 0 {
            return Err(OutOfRows::Above);
        }
        if coord.row as usize >= self.height {
            return Err(OutOfRows::Below);
        }
        if coord.col < 0 || coord.col as usize >= self.width {
            return Ok(TileId::EMPTY);
        }
        let idx = coord.row as usize * self.width + coord.col as usize;
        let tiles = match layer {
            Layer::Solid => &self.solid,
            Layer::Hazard => &self.hazard,
        };
        Ok(tiles[idx])
    }

    /// Grid cell containing a world position.
    pub fn grid_of(&self, pos: Vec2) -> TileCoord {
        let height_px = self.pixel_size().y;
        TileCoord {
            col: (pos.x / self.tile_size.x).floor() as i32,
            row: ((height_px - pos.y) / self.tile_size.y).floor() as i32,
        }
    }

    /// World rectangle covered by a grid cell.
    pub fn world_rect_of(&self, coord: TileCoord) -> Aabb {
        let height_px = self.pixel_size().y;
        Aabb::new(
            coord.col as f32 * self.tile_size.x,
            height_px - (coord.row + 1) as f32 * self.tile_size.y,
            self.tile_size.x,
            self.tile_size.y,
        )
    }
}
