/// Tile identifiers, layers and grid coordinates.
/// Semantics are queried via methods so the meaning of id 0 lives here.

/// Tile identifier within one layer. `0` is always empty.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct TileId(pub u32);

impl TileId {
    pub const EMPTY: TileId = TileId(0);

    /// True for id 0, which never collides.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Which semantic layer a query reads.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Layer {
    /// Walls and floors: resolved by pushing the actor out.
    Solid,
    /// Spikes and the like: kill on contact, never push.
    Hazard,
}

/// Grid-space coordinate. Origin top-left, row grows downward.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TileCoord {
    pub col: i32,
    pub row: i32,
}

impl TileCoord {
    pub const fn new(col: i32, row: i32) -> Self {
        TileCoord { col, row }
    }

    pub const fn offset(self, d_col: i32, d_row: i32) -> Self {
        TileCoord { col: self.col + d_col, row: self.row + d_row }
    }
}
