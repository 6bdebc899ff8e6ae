use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::*;

/// External action requests accepted by the session, one per player input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Move(Direction),
    DigAt(Coord, Coord),
    UseAreaClear,
    UseLocator,
    BuyAreaClearCharge,
    BuyLocator,
    UpgradeShovel,
    SubmitAnswer(usize),
    AcknowledgeQuestion,
    ResetGame,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The state changed.
    Applied,
    /// Valid request, nothing to do (already-dug tile, blocked move).
    NoChange,
    /// Expected failure: insufficient resources or an invalid target.
    Rejected,
    /// A question node was triggered and a question is now presented.
    QuestionOpened,
    /// An answer was graded; details live in the quiz slot.
    QuestionGraded,
}

impl ActionOutcome {
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Rejected => false,
            Self::Applied => true,
            Self::QuestionOpened => true,
            Self::QuestionGraded => true,
        }
    }
}

/// Result of dispatching one action: what happened plus a status line.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionReply {
    pub outcome: ActionOutcome,
    pub message: String,
}

impl ActionReply {
    fn applied(message: impl Into<String>) -> Self {
        Self {
            outcome: ActionOutcome::Applied,
            message: message.into(),
        }
    }

    fn no_change(message: impl Into<String>) -> Self {
        Self {
            outcome: ActionOutcome::NoChange,
            message: message.into(),
        }
    }

    fn rejected(message: impl Into<String>) -> Self {
        Self {
            outcome: ActionOutcome::Rejected,
            message: message.into(),
        }
    }
}

/// Composes generator, reveal machine, economy, locator, and the adaptive
/// engine over the single state document. Every action runs to completion
/// before the next one is accepted; a save follows every successful mutation.
pub struct GameSession<S: SaveStore> {
    game: MineGame,
    bank: QuestionBank,
    store: S,
    rng: SmallRng,
}

impl<S: SaveStore> GameSession<S> {
    /// Restores the saved document, or starts fresh when the store is empty
    /// or holds something unreadable. Corrupt saves are discarded silently.
    pub fn load_or_new(mut store: S, bank: QuestionBank, config: GridConfig, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);

        let (game, created) = match store.load(MineGame::SAVE_KEY) {
            Some(raw) => match MineGame::from_json(&raw) {
                Ok(game) => (game, false),
                Err(err) => {
                    log::warn!("discarding corrupt save: {err}");
                    (MineGame::fresh(config, rng.random()), true)
                }
            },
            None => (MineGame::fresh(config, rng.random()), true),
        };

        let mut session = Self {
            game,
            bank,
            store,
            rng,
        };
        if created {
            session.persist();
        }
        session
    }

    /// Builds a session around an existing document, e.g. one restored by an
    /// outer persistence layer.
    pub fn from_parts(game: MineGame, bank: QuestionBank, store: S, seed: u64) -> Self {
        Self {
            game,
            bank,
            store,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn game(&self) -> &MineGame {
        &self.game
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The record behind the currently presented question, if any.
    pub fn current_question(&self) -> Option<&QuestionRecord> {
        self.game
            .quiz
            .presented_id()
            .and_then(|id| self.bank.get(id))
    }

    pub fn dispatch(&mut self, action: Action) -> ActionReply {
        log::debug!("dispatch {:?}", action);
        let reply = match action {
            Action::Move(direction) => self.move_player(direction),
            Action::DigAt(x, y) => self.dig_at((x, y)),
            Action::UseAreaClear => self.area_clear(),
            // both locator actions are the same purchased scan: pay, then run
            Action::UseLocator | Action::BuyLocator => self.buy_ping(),
            Action::BuyAreaClearCharge => self.buy_dynamite(),
            Action::UpgradeShovel => self.upgrade_shovel(),
            Action::SubmitAnswer(chosen) => self.submit_answer(chosen),
            Action::AcknowledgeQuestion => self.acknowledge(),
            Action::ResetGame => self.reset(),
        };
        if reply.outcome.has_update() {
            self.persist();
        }
        reply
    }

    fn persist(&mut self) {
        match self.game.to_json() {
            Ok(payload) => {
                if !self.store.save(MineGame::SAVE_KEY, &payload) {
                    log::warn!("save failed, continuing with in-memory state");
                }
            }
            Err(err) => log::warn!("could not serialize state: {err}"),
        }
    }

    /// Mine actions wait while a question is on the table.
    fn question_gate(&self) -> Option<ActionReply> {
        if self.game.quiz.is_idle() {
            None
        } else {
            Some(ActionReply::rejected("Answer the open question first."))
        }
    }

    fn move_player(&mut self, direction: Direction) -> ActionReply {
        if let Some(reply) = self.question_gate() {
            return reply;
        }

        let Some(dest) = step(self.game.player, direction, self.game.grid.size()) else {
            return ActionReply::no_change("The mine wall blocks the way.");
        };
        if self.game.grid.is_hidden(dest) {
            return ActionReply::no_change("That ground is still solid rock.");
        }

        self.game.player = dest;
        ActionReply::applied(format!("Moved {}.", direction.label().to_lowercase()))
    }

    fn dig_at(&mut self, coords: Coord2) -> ActionReply {
        if let Some(reply) = self.question_gate() {
            return reply;
        }
        if self.game.grid.validate_coords(coords).is_err() {
            return ActionReply::rejected("That spot is outside the mine.");
        }
        if manhattan(coords, self.game.player) > 1 {
            return ActionReply::rejected("Too far away to dig there.");
        }
        if !self.game.grid.is_hidden(coords) {
            return ActionReply::no_change("Already dug out.");
        }

        let cost = dig_cost(self.game.shovel_level);
        if self.game.gold < cost {
            return ActionReply::rejected(
                "You're broke. Mine ore or answer questions to earn gold.",
            );
        }
        self.game.gold -= cost;

        match self.game.grid.reveal_at(coords) {
            Ok(RevealOutcome::Opened(TileContent::Ore)) => {
                let value = ore_reward(&mut self.rng, self.game.depth);
                self.game.gold += value;
                ActionReply::applied(format!("Ore found! +{value} gold."))
            }
            Ok(RevealOutcome::Opened(TileContent::QuestionNode)) => self.open_question(),
            Ok(RevealOutcome::Opened(TileContent::Dirt)) => {
                ActionReply::applied("Nothing but dirt.")
            }
            // unreachable after the guards above, but never fatal
            Ok(RevealOutcome::AlreadyOpen) => ActionReply::no_change("Already dug out."),
            Err(err) => {
                log::warn!("dig failed after guards: {err}");
                ActionReply::rejected("That spot is outside the mine.")
            }
        }
    }

    fn area_clear(&mut self) -> ActionReply {
        if let Some(reply) = self.question_gate() {
            return reply;
        }
        if self.game.dynamite == 0 {
            return ActionReply::rejected("No dynamite. Buy some in the shop.");
        }
        self.game.dynamite -= 1;

        let mut ore_gold: Gold = 0;
        let mut fresh_nodes: Vec<Coord2> = Vec::new();
        for coords in self.game.grid.block_coords(self.game.player, 1) {
            match self.game.grid.reveal_at(coords) {
                Ok(RevealOutcome::Opened(TileContent::Ore)) => {
                    ore_gold += blast_ore_reward(&mut self.rng);
                }
                Ok(RevealOutcome::Opened(TileContent::QuestionNode)) => {
                    fresh_nodes.push(coords);
                }
                _ => {}
            }
        }
        self.game.gold += ore_gold;

        // a blast that uncovered question nodes opens exactly one question,
        // triggered by the nearest of the freshly revealed nodes
        if !fresh_nodes.is_empty() {
            let player = self.game.player;
            let trigger = fresh_nodes
                .iter()
                .copied()
                .min_by_key(|&coords| manhattan(coords, player));
            log::debug!("blast uncovered question node at {:?}", trigger);
            let opened = self.open_question();
            return ActionReply {
                outcome: opened.outcome,
                message: format!("Boom! Area cleared. {}", opened.message),
            };
        }

        if ore_gold > 0 {
            ActionReply::applied(format!("Boom! Area cleared. +{ore_gold} gold in ore."))
        } else {
            ActionReply::applied("Boom! Area cleared.")
        }
    }

    fn buy_dynamite(&mut self) -> ActionReply {
        if let Some(reply) = self.question_gate() {
            return reply;
        }
        if self.game.gold < DYNAMITE_PRICE {
            return ActionReply::rejected("Not enough gold for dynamite.");
        }
        self.game.gold -= DYNAMITE_PRICE;
        self.game.dynamite += 1;
        ActionReply::applied("Dynamite purchased.")
    }

    /// A purchased scan: the charge is consumed even when nothing is found.
    fn buy_ping(&mut self) -> ActionReply {
        if let Some(reply) = self.question_gate() {
            return reply;
        }
        if self.game.gold < PING_PRICE {
            return ActionReply::rejected("Not enough gold for ping.");
        }
        self.game.gold -= PING_PRICE;

        match locate_question_node(&self.game.grid, self.game.player) {
            Some(ping) => {
                self.game.last_ping = Some(ping);
                ActionReply::applied(format!("Ping: {}", ping.describe()))
            }
            None => {
                self.game.last_ping = None;
                ActionReply::applied("No question nodes detected (this layer is wild).")
            }
        }
    }

    /// Atomic: gold, level, depth, and the fresh layer change together or
    /// not at all.
    fn upgrade_shovel(&mut self) -> ActionReply {
        if let Some(reply) = self.question_gate() {
            return reply;
        }
        let cost = shovel_upgrade_cost(self.game.shovel_level);
        if self.game.gold < cost {
            return ActionReply::rejected("Not enough gold for shovel upgrade.");
        }

        self.game.gold -= cost;
        self.game.shovel_level += 1;
        self.game.depth += 1;

        let odds = LayerOdds::for_layer(self.game.shovel_level, self.game.depth);
        let generator = ProbLayerGenerator::new(self.rng.random(), self.game.player, odds);
        self.game.grid = generator.generate(self.game.grid.grid_config());
        self.game.last_ping = None;

        ActionReply::applied(format!(
            "Upgraded shovel to Level {}. New layer opened!",
            self.game.shovel_level
        ))
    }

    fn open_question(&mut self) -> ActionReply {
        let question = select_question(
            &self.bank,
            &self.game.cat,
            &self.game.used_questions,
            &mut self.rng,
        );
        log::debug!(
            "presenting {:?} ({:?}, difficulty {})",
            question.id,
            question.skill,
            question.difficulty
        );
        // shown, not yet committed: the used-set grows only on grading
        self.game.quiz = QuizSlot::Presented {
            id: question.id.clone(),
        };
        ActionReply {
            outcome: ActionOutcome::QuestionOpened,
            message: "Question node found! Answer to earn rewards.".to_string(),
        }
    }

    fn submit_answer(&mut self, chosen: usize) -> ActionReply {
        let QuizSlot::Presented { id } = &self.game.quiz else {
            return ActionReply::rejected("No question is waiting for an answer.");
        };
        let id = id.clone();

        let Some(question) = self.bank.get(&id) else {
            // the corpus changed under a restored save; recover, never fail
            log::warn!("presented question {:?} is gone from the corpus", id);
            self.game.quiz = QuizSlot::Idle;
            return ActionReply::rejected("That question is no longer available.");
        };
        if chosen >= question.choices.len() {
            return ActionReply::rejected("No such choice.");
        }

        let result = grade(&mut self.game.cat, question, chosen);
        self.game.gold += result.reward;
        self.game.used_questions.insert(id.clone());
        self.game.quiz = QuizSlot::Graded {
            id,
            correct: result.correct,
            reward: result.reward,
        };

        let message = if result.correct {
            format!(
                "Correct. +{} gold. {}",
                result.reward, question.explanation
            )
        } else {
            format!(
                "Not quite. Correct answer: {}. {}",
                choice_letter(result.correct_index),
                question.explanation
            )
        };
        ActionReply {
            outcome: ActionOutcome::QuestionGraded,
            message,
        }
    }

    fn acknowledge(&mut self) -> ActionReply {
        match self.game.quiz {
            QuizSlot::Graded { .. } => {
                self.game.quiz = QuizSlot::Idle;
                ActionReply::applied("Back to the mine.")
            }
            QuizSlot::Presented { .. } => {
                ActionReply::rejected("Answer the open question first.")
            }
            QuizSlot::Idle => ActionReply::no_change("Nothing to acknowledge."),
        }
    }

    fn reset(&mut self) -> ActionReply {
        let config = self.game.grid.grid_config();
        self.game = MineGame::fresh(config, self.rng.random());
        ActionReply::applied("Fresh mine opened. Good luck.")
    }

    /// Re-derives the renderable snapshot from the current document.
    pub fn view(&self) -> ViewModel {
        let game = &self.game;
        let (w, h) = game.grid.size();

        let tiles = (0..h)
            .map(|y| (0..w).map(|x| game.grid.cell_at((x, y))).collect())
            .collect();

        let question = game.quiz.question_id().and_then(|id| {
            let record = self.bank.get(id)?;
            let graded = match game.quiz {
                QuizSlot::Graded { correct, reward, .. } => Some(GradedView {
                    correct,
                    reward,
                    correct_index: record.answer_index,
                }),
                _ => None,
            };
            Some(QuestionView {
                skill_label: record.skill.label(),
                difficulty: record.difficulty,
                passage: record.passage.clone(),
                question: record.question.clone(),
                choices: record.choices.clone(),
                graded,
            })
        });

        let ping_text = match game.last_ping {
            Some(ping) => format!("Ping: {}", ping.describe()),
            None => {
                "Dig around to find a question node. Buy a Scanner Ping in the shop to locate one."
                    .to_string()
            }
        };

        ViewModel {
            size: (w, h),
            tiles,
            player: game.player,
            hud: HudView {
                gold: game.gold,
                shovel_level: game.shovel_level,
                dynamite: game.dynamite,
                depth: game.depth,
                ability: game.cat.ability,
                accuracy_pct: game.cat.accuracy_pct(),
                main_idea_pct: game.cat.skills.main_idea.accuracy_pct(),
                evidence_pct: game.cat.skills.evidence.accuracy_pct(),
                answered: game.cat.answered,
                correct: game.cat.correct,
                dig_cost: dig_cost(game.shovel_level),
                next_shovel_cost: shovel_upgrade_cost(game.shovel_level),
                ping_text,
            },
            question,
        }
    }
}

const fn choice_letter(index: usize) -> char {
    (b'A' + (index as u8)) as char
}

/// Snapshot handed to the rendering layer. Rows are indexed `tiles[y][x]`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ViewModel {
    pub size: Coord2,
    pub tiles: Vec<Vec<MineCell>>,
    pub player: Coord2,
    pub hud: HudView,
    pub question: Option<QuestionView>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HudView {
    pub gold: Gold,
    pub shovel_level: u8,
    pub dynamite: u16,
    pub depth: u32,
    pub ability: f64,
    pub accuracy_pct: u32,
    pub main_idea_pct: u32,
    pub evidence_pct: u32,
    pub answered: u32,
    pub correct: u32,
    pub dig_cost: Gold,
    pub next_shovel_cost: Gold,
    pub ping_text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuestionView {
    pub skill_label: &'static str,
    pub difficulty: u8,
    pub passage: String,
    pub question: String,
    pub choices: Vec<String>,
    pub graded: Option<GradedView>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GradedView {
    pub correct: bool,
    pub reward: Gold,
    pub correct_index: usize,
}
