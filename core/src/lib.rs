use core::ops::{Index, IndexMut};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use corpus::*;
pub use economy::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use locator::*;
pub use quiz::*;
pub use session::*;
pub use state::*;
pub use store::*;
pub use tile::*;
pub use types::*;

mod corpus;
mod economy;
mod engine;
mod error;
mod generator;
mod locator;
mod quiz;
mod session;
mod state;
mod store;
mod tile;
mod types;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub size: Coord2,
}

impl GridConfig {
    /// Grid dimensions of the standard mine.
    pub const DEFAULT_SIZE: Coord2 = (24, 18);

    pub const fn new_unchecked(size: Coord2) -> Self {
        Self { size }
    }

    pub fn new((size_x, size_y): Coord2) -> Self {
        let size_x = size_x.clamp(1, Coord::MAX);
        let size_y = size_y.clamp(1, Coord::MAX);
        Self::new_unchecked((size_x, size_y))
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self::new_unchecked(Self::DEFAULT_SIZE)
    }
}

/// Ground truth beneath the mine: what every tile holds before it is dug out.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileLayout {
    contents: Array2<TileContent>,
}

impl TileLayout {
    pub fn from_contents(contents: Array2<TileContent>) -> Self {
        Self { contents }
    }

    /// Layout of nothing but dirt, the generator's starting canvas.
    pub fn filled(config: GridConfig) -> Self {
        Self {
            contents: Array2::from_elem(config.size.to_nd_index(), TileContent::Dirt),
        }
    }

    pub fn grid_config(&self) -> GridConfig {
        GridConfig::new_unchecked(self.size())
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let size = self.size();
        if coords.0 < size.0 && coords.1 < size.1 {
            Ok(coords)
        } else {
            Err(GameError::OutOfBounds)
        }
    }

    pub fn size(&self) -> Coord2 {
        let dim = self.contents.dim();
        (dim.0.try_into().unwrap(), dim.1.try_into().unwrap())
    }

    pub fn total_cells(&self) -> CellCount {
        self.contents.len().try_into().unwrap()
    }

    pub fn count_of(&self, content: TileContent) -> CellCount {
        self.contents
            .iter()
            .filter(|&&cell| cell == content)
            .count()
            .try_into()
            .unwrap()
    }
}

impl Index<Coord2> for TileLayout {
    type Output = TileContent;

    fn index(&self, (x, y): Coord2) -> &Self::Output {
        &self.contents[(x as usize, y as usize)]
    }
}

impl IndexMut<Coord2> for TileLayout {
    fn index_mut(&mut self, (x, y): Coord2) -> &mut Self::Output {
        &mut self.contents[(x as usize, y as usize)]
    }
}
