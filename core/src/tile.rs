use serde::{Deserialize, Serialize};

/// Ground-truth content beneath every tile, fixed at generation time.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileContent {
    Dirt,
    Ore,
    QuestionNode,
}

impl Default for TileContent {
    fn default() -> Self {
        Self::Dirt
    }
}

/// Player-visible state of a tile. A revealed tile never changes again.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MineCell {
    Hidden,
    Revealed(TileContent),
}

impl MineCell {
    pub const fn is_hidden(self) -> bool {
        matches!(self, Self::Hidden)
    }

    pub const fn content(self) -> Option<TileContent> {
        match self {
            Self::Hidden => None,
            Self::Revealed(content) => Some(content),
        }
    }
}

impl Default for MineCell {
    fn default() -> Self {
        Self::Hidden
    }
}
