use rand::prelude::*;

use crate::*;

/// Manhattan radius of the guaranteed dirt pocket around the player.
pub const POCKET_RADIUS: u32 = 2;

pub trait LayerGenerator {
    fn generate(self, config: GridConfig) -> MineGrid;
}

/// Per-cell content probabilities for one mine layer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LayerOdds {
    pub question: f64,
    pub ore: f64,
}

impl LayerOdds {
    pub const BASE_QUESTION: f64 = 0.06;
    pub const BASE_ORE: f64 = 0.10;
    /// Per-level and per-depth probability increments, both capped.
    pub const BOOST_STEP: f64 = 0.01;
    pub const BOOST_CAP: f64 = 0.05;

    /// Odds for a layer: better shovels find more question nodes, deeper
    /// layers hold more of everything.
    pub fn for_layer(shovel_level: u8, depth: u32) -> Self {
        let level_boost =
            (f64::from(shovel_level.saturating_sub(1)) * Self::BOOST_STEP).min(Self::BOOST_CAP);
        let depth_boost =
            (f64::from(depth.saturating_sub(1)) * Self::BOOST_STEP).min(Self::BOOST_CAP);
        Self {
            question: Self::BASE_QUESTION + level_boost + depth_boost,
            ore: Self::BASE_ORE + depth_boost,
        }
    }

    /// Clamps pathological odds so the two probabilities fit in [0, 1]
    /// together. Saturates, never fails.
    pub fn saturated(self) -> Self {
        let question = self.question.clamp(0.0, 1.0);
        let ore = self.ore.clamp(0.0, 1.0 - question);
        if question != self.question || ore != self.ore {
            log::warn!(
                "layer odds saturated, requested q={} ore={}, using q={} ore={}",
                self.question,
                self.ore,
                question,
                ore
            );
        }
        Self { question, ore }
    }
}

/// Generation strategy that draws one uniform sample per cell outside the
/// starting pocket. Deterministic for a given seed.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbLayerGenerator {
    seed: u64,
    origin: Coord2,
    odds: LayerOdds,
}

impl ProbLayerGenerator {
    pub fn new(seed: u64, origin: Coord2, odds: LayerOdds) -> Self {
        Self { seed, origin, odds }
    }
}

impl LayerGenerator for ProbLayerGenerator {
    fn generate(self, config: GridConfig) -> MineGrid {
        use TileContent::*;

        let odds = self.odds.saturated();
        let (w, h) = config.size;
        let mut layout = TileLayout::filled(config);

        let mut rng = SmallRng::seed_from_u64(self.seed);
        for y in 0..h {
            for x in 0..w {
                let coords = (x, y);
                // the starting pocket stays plain dirt
                if manhattan(coords, self.origin) <= POCKET_RADIUS {
                    continue;
                }

                let sample: f64 = rng.random();
                layout[coords] = if sample < odds.question {
                    QuestionNode
                } else if sample < odds.question + odds.ore {
                    Ore
                } else {
                    Dirt
                };
            }
        }

        let mut grid = MineGrid::new(layout);

        // carve the pocket open so the player starts on dug ground
        for y in 0..h {
            for x in 0..w {
                let coords = (x, y);
                if manhattan(coords, self.origin) <= POCKET_RADIUS {
                    let _ = grid.reveal_at(coords);
                }
            }
        }

        grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate(seed: u64, odds: LayerOdds) -> MineGrid {
        ProbLayerGenerator::new(seed, (2, 2), odds).generate(GridConfig::default())
    }

    #[test]
    fn starting_pocket_is_open_dirt() {
        let grid = generate(7, LayerOdds::for_layer(1, 1));

        for coords in grid.iter_coords() {
            if manhattan(coords, (2, 2)) <= POCKET_RADIUS {
                assert_eq!(grid.cell_at(coords), MineCell::Revealed(TileContent::Dirt));
            } else {
                assert!(grid.is_hidden(coords));
            }
        }
    }

    #[test]
    fn same_seed_generates_the_same_layer() {
        let odds = LayerOdds::for_layer(3, 4);
        assert_eq!(generate(42, odds), generate(42, odds));
    }

    #[test]
    fn odds_grow_with_level_and_depth_up_to_the_cap() {
        let base = LayerOdds::for_layer(1, 1);
        assert!((base.question - LayerOdds::BASE_QUESTION).abs() < 1e-12);
        assert!((base.ore - LayerOdds::BASE_ORE).abs() < 1e-12);

        let deep = LayerOdds::for_layer(20, 20);
        assert!((deep.question - (LayerOdds::BASE_QUESTION + 0.10)).abs() < 1e-12);
        assert!((deep.ore - (LayerOdds::BASE_ORE + 0.05)).abs() < 1e-12);

        // capped: going deeper changes nothing
        assert_eq!(LayerOdds::for_layer(200, 200), deep);
    }

    #[test]
    fn pathological_odds_saturate_instead_of_crashing() {
        let odds = LayerOdds {
            question: 0.9,
            ore: 0.9,
        }
        .saturated();
        assert!(odds.question + odds.ore <= 1.0 + 1e-12);

        let grid = generate(
            1,
            LayerOdds {
                question: 40.0,
                ore: 40.0,
            },
        );
        // every cell outside the pocket became a question node
        for coords in grid.iter_coords() {
            if manhattan(coords, (2, 2)) > POCKET_RADIUS {
                assert_eq!(grid.content_at(coords), TileContent::QuestionNode);
            }
        }
    }
}
