use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::*;

/// The whole persistent state document. The session orchestrator owns the
/// single instance; components only ever see references into it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MineGame {
    pub(crate) grid: MineGrid,
    pub(crate) player: Coord2,
    pub(crate) gold: Gold,
    pub(crate) shovel_level: u8,
    pub(crate) dynamite: u16,
    pub(crate) depth: u32,
    pub(crate) cat: CatModel,
    pub(crate) used_questions: BTreeSet<String>,
    pub(crate) quiz: QuizSlot,
    pub(crate) last_ping: Option<Ping>,
}

impl MineGame {
    /// Versioned key the serialized document is stored under.
    pub const SAVE_KEY: &'static str = "signal_mine_save_v1";

    pub const START_POSITION: Coord2 = (2, 2);

    /// A brand-new game: starting gold, level-one shovel, freshly generated
    /// first layer with the safe pocket around the player.
    pub fn fresh(config: GridConfig, seed: u64) -> Self {
        let (w, h) = config.size;
        let player = (
            Self::START_POSITION.0.min(w.saturating_sub(1)),
            Self::START_POSITION.1.min(h.saturating_sub(1)),
        );
        let odds = LayerOdds::for_layer(1, 1);
        let grid = ProbLayerGenerator::new(seed, player, odds).generate(config);

        Self {
            grid,
            player,
            gold: STARTING_GOLD,
            shovel_level: 1,
            dynamite: 0,
            depth: 1,
            cat: CatModel::default(),
            used_questions: BTreeSet::new(),
            quiz: QuizSlot::Idle,
            last_ping: None,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn grid(&self) -> &MineGrid {
        &self.grid
    }

    pub fn player(&self) -> Coord2 {
        self.player
    }

    pub fn gold(&self) -> Gold {
        self.gold
    }

    pub fn shovel_level(&self) -> u8 {
        self.shovel_level
    }

    pub fn dynamite(&self) -> u16 {
        self.dynamite
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn cat(&self) -> &CatModel {
        &self.cat
    }

    pub fn used_questions(&self) -> &BTreeSet<String> {
        &self.used_questions
    }

    pub fn quiz(&self) -> &QuizSlot {
        &self.quiz
    }

    pub fn last_ping(&self) -> Option<Ping> {
        self.last_ping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_uses_the_standard_defaults() {
        let game = MineGame::fresh(GridConfig::default(), 5);

        assert_eq!(game.player(), (2, 2));
        assert_eq!(game.gold(), 10);
        assert_eq!(game.shovel_level(), 1);
        assert_eq!(game.dynamite(), 0);
        assert_eq!(game.depth(), 1);
        assert!((game.cat().ability - START_ABILITY).abs() < 1e-9);
        assert!(game.quiz().is_idle());
        assert_eq!(game.last_ping(), None);
        assert_eq!(game.grid().size(), GridConfig::DEFAULT_SIZE);
    }

    #[test]
    fn fresh_player_stays_inside_tiny_grids() {
        let game = MineGame::fresh(GridConfig::new((2, 1)), 5);
        assert_eq!(game.player(), (1, 0));
    }

    #[test]
    fn document_round_trips_through_json() {
        let mut game = MineGame::fresh(GridConfig::default(), 11);
        game.gold = 42;
        game.dynamite = 2;
        game.used_questions.insert("R1".to_string());
        game.quiz = QuizSlot::Presented {
            id: "R2".to_string(),
        };
        game.last_ping = Some(Ping {
            direction: Direction::Left,
            distance: 4,
        });

        let raw = game.to_json().unwrap();
        let restored = MineGame::from_json(&raw).unwrap();

        assert_eq!(restored, game);
    }

    #[test]
    fn corrupt_documents_fail_to_parse() {
        assert!(MineGame::from_json("{\"gold\": \"lots\"}").is_err());
        assert!(MineGame::from_json("").is_err());
    }
}
