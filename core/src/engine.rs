use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Outcome of revealing a tile.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RevealOutcome {
    /// The tile was dug out before; nothing changed.
    AlreadyOpen,
    Opened(TileContent),
}

impl RevealOutcome {
    pub const fn has_update(self) -> bool {
        match self {
            Self::AlreadyOpen => false,
            Self::Opened(_) => true,
        }
    }

    pub const fn content(self) -> Option<TileContent> {
        match self {
            Self::AlreadyOpen => None,
            Self::Opened(content) => Some(content),
        }
    }
}

/// The mine itself: ground-truth contents plus the player-visible board.
///
/// Reveals are monotonic. A cell moves from `Hidden` to `Revealed(content)`
/// exactly once and keeps that value forever.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MineGrid {
    layout: TileLayout,
    board: Array2<MineCell>,
}

impl MineGrid {
    pub fn new(layout: TileLayout) -> Self {
        let size = layout.size();
        Self {
            layout,
            board: Array2::default(size.to_nd_index()),
        }
    }

    pub fn size(&self) -> Coord2 {
        self.layout.size()
    }

    pub fn grid_config(&self) -> GridConfig {
        self.layout.grid_config()
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        self.layout.validate_coords(coords)
    }

    pub fn cell_at(&self, coords: Coord2) -> MineCell {
        self.board[coords.to_nd_index()]
    }

    pub fn content_at(&self, coords: Coord2) -> TileContent {
        self.layout[coords]
    }

    pub fn is_hidden(&self, coords: Coord2) -> bool {
        self.cell_at(coords).is_hidden()
    }

    /// Copies the hidden content onto the board. Already-open tiles report
    /// `AlreadyOpen` and stay untouched.
    pub fn reveal_at(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let coords = self.layout.validate_coords(coords)?;

        if !self.board[coords.to_nd_index()].is_hidden() {
            return Ok(RevealOutcome::AlreadyOpen);
        }

        let content = self.layout[coords];
        self.board[coords.to_nd_index()] = MineCell::Revealed(content);
        log::debug!("revealed {:?} at {:?}", content, coords);
        Ok(RevealOutcome::Opened(content))
    }

    /// All coordinates in row-major scan order.
    pub fn iter_coords(&self) -> impl Iterator<Item = Coord2> + use<> {
        let (w, h) = self.size();
        (0..h).flat_map(move |y| (0..w).map(move |x| (x, y)))
    }

    /// In-bounds coordinates of the square block around `center`, scan order.
    pub fn block_coords(&self, center: Coord2, radius: Coord) -> impl Iterator<Item = Coord2> + use<> {
        let (w, h) = self.size();
        let x0 = center.0.saturating_sub(radius);
        let y0 = center.1.saturating_sub(radius);
        let x1 = center.0.saturating_add(radius);
        let y1 = center.1.saturating_add(radius);
        (y0..=y1)
            .flat_map(move |y| (x0..=x1).map(move |x| (x, y)))
            .filter(move |&(x, y)| x < w && y < h)
    }
}
