use std::collections::BTreeSet;

use rand::Rng;
use rand::RngExt;
use serde::{Deserialize, Serialize};

use crate::*;

/// Per-skill answered/correct tally. Both counters only ever grow.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillStats {
    pub answered: u32,
    pub correct: u32,
}

impl SkillStats {
    /// Accuracy in [0, 1]. An unattempted skill counts as mastered so it
    /// does not dominate targeting before any data exists.
    pub fn accuracy(&self) -> f64 {
        if self.answered == 0 {
            1.0
        } else {
            f64::from(self.correct) / f64::from(self.answered)
        }
    }

    /// Rounded percentage for the HUD; unattempted skills display 0%.
    pub fn accuracy_pct(&self) -> u32 {
        if self.answered == 0 {
            0
        } else {
            (f64::from(self.correct) / f64::from(self.answered) * 100.0).round() as u32
        }
    }

    fn record(&mut self, correct: bool) {
        self.answered += 1;
        if correct {
            self.correct += 1;
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillTable {
    pub main_idea: SkillStats,
    pub evidence: SkillStats,
}

impl SkillTable {
    pub fn stats(&self, skill: Skill) -> SkillStats {
        match skill {
            Skill::MainIdea => self.main_idea,
            Skill::Evidence => self.evidence,
        }
    }

    fn stats_mut(&mut self, skill: Skill) -> &mut SkillStats {
        match skill {
            Skill::MainIdea => &mut self.main_idea,
            Skill::Evidence => &mut self.evidence,
        }
    }
}

pub const ABILITY_FLOOR: f64 = 1.0;
pub const ABILITY_CEIL: f64 = 5.0;
pub const START_ABILITY: f64 = 2.0;

/// Streak nudge applied on top of the ability estimate when targeting.
const STREAK_NUDGE: f64 = 0.6;

/// Ability estimate plus the counters that drive difficulty targeting.
///
/// The estimate falls faster than it rises: the penalty for a wrong answer
/// always exceeds the reward for a correct one at the same difficulty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatModel {
    pub ability: f64,
    pub answered: u32,
    pub correct: u32,
    pub streak: u32,
    pub wrong_streak: u32,
    pub skills: SkillTable,
}

impl Default for CatModel {
    fn default() -> Self {
        Self {
            ability: START_ABILITY,
            answered: 0,
            correct: 0,
            streak: 0,
            wrong_streak: 0,
            skills: SkillTable::default(),
        }
    }
}

impl CatModel {
    pub fn accuracy_pct(&self) -> u32 {
        if self.answered == 0 {
            0
        } else {
            (f64::from(self.correct) / f64::from(self.answered) * 100.0).round() as u32
        }
    }

    /// Folds one graded answer into the model: counters, streaks, and the
    /// asymmetric difficulty-weighted ability update.
    fn record(&mut self, skill: Skill, difficulty: u8, correct: bool) {
        self.answered += 1;
        if correct {
            self.correct += 1;
        }
        self.skills.stats_mut(skill).record(correct);

        if correct {
            self.streak += 1;
            self.wrong_streak = 0;
        } else {
            self.wrong_streak += 1;
            self.streak = 0;
        }

        let f = f64::from(difficulty) / f64::from(MAX_DIFFICULTY);
        let delta = if correct {
            0.20 + 0.18 * f
        } else {
            -(0.28 + 0.22 * f)
        };
        self.ability = (self.ability + delta).clamp(ABILITY_FLOOR, ABILITY_CEIL);
    }
}

/// Targets the weaker skill. Exact ties are an unweighted coin flip.
pub fn choose_skill_target(cat: &CatModel, rng: &mut impl Rng) -> Skill {
    let main_idea = cat.skills.main_idea.accuracy();
    let evidence = cat.skills.evidence.accuracy();

    if main_idea < evidence {
        Skill::MainIdea
    } else if evidence < main_idea {
        Skill::Evidence
    } else if rng.random_bool(0.5) {
        Skill::MainIdea
    } else {
        Skill::Evidence
    }
}

/// Difficulty to aim for: the ability estimate nudged by the current streak.
/// The two nudges cannot both fire since the streaks are mutually exclusive.
pub fn target_difficulty(cat: &CatModel) -> f64 {
    let mut target = cat.ability;
    if cat.streak >= 2 {
        target += STREAK_NUDGE;
    }
    if cat.wrong_streak >= 1 {
        target -= STREAK_NUDGE;
    }
    target.clamp(f64::from(MIN_DIFFICULTY), f64::from(MAX_DIFFICULTY))
}

/// Picks the next question. Fallback tiers, each an explicit step:
/// unused questions of the targeted skill, then that skill ignoring usage
/// (the pool may repeat once exhausted), then the whole corpus uniformly.
pub fn select_question<'a>(
    bank: &'a QuestionBank,
    cat: &CatModel,
    used: &BTreeSet<String>,
    rng: &mut impl Rng,
) -> &'a QuestionRecord {
    let skill = choose_skill_target(cat, rng);
    let target = target_difficulty(cat);

    if let Some(question) =
        closest_by_difficulty(bank.of_skill(skill).filter(|q| !used.contains(&q.id)), target)
    {
        return question;
    }

    log::debug!("{:?} pool exhausted, allowing repeats", skill);
    if let Some(question) = closest_by_difficulty(bank.of_skill(skill), target) {
        return question;
    }

    log::warn!("no questions tagged {:?}, falling back to the whole corpus", skill);
    bank.pick_uniform(rng)
}

/// Smallest |difficulty - target| wins; first-found wins ties.
fn closest_by_difficulty<'a>(
    pool: impl Iterator<Item = &'a QuestionRecord>,
    target: f64,
) -> Option<&'a QuestionRecord> {
    let mut best: Option<(&QuestionRecord, f64)> = None;
    for question in pool {
        let gap = (f64::from(question.difficulty) - target).abs();
        if best.is_none_or(|(_, best_gap)| gap < best_gap) {
            best = Some((question, gap));
        }
    }
    best.map(|(question, _)| question)
}

/// What grading one answer produced.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GradeResult {
    pub correct: bool,
    pub reward: Gold,
    pub correct_index: usize,
}

/// Grades a submitted choice against the record and updates the model.
/// Marking the question as used and paying the reward stay with the caller.
pub fn grade(cat: &mut CatModel, question: &QuestionRecord, chosen_index: usize) -> GradeResult {
    let correct = chosen_index == question.answer_index;
    cat.record(question.skill, question.difficulty, correct);
    let reward = answer_reward(question.difficulty, correct);
    log::debug!(
        "graded {:?}: correct={} ability={:.2}",
        question.id,
        correct,
        cat.ability
    );
    GradeResult {
        correct,
        reward,
        correct_index: question.answer_index,
    }
}

/// The single in-flight question.
///
/// Valid transitions:
/// - Idle -> Presented (selection)
/// - Presented -> Graded (answer submitted)
/// - Graded -> Idle (acknowledged)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum QuizSlot {
    Idle,
    Presented { id: String },
    Graded { id: String, correct: bool, reward: Gold },
}

impl QuizSlot {
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn presented_id(&self) -> Option<&str> {
        match self {
            Self::Presented { id } => Some(id),
            _ => None,
        }
    }

    pub fn question_id(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Presented { id } | Self::Graded { id, .. } => Some(id),
        }
    }
}

impl Default for QuizSlot {
    fn default() -> Self {
        Self::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    fn record(id: &str, skill: Skill, difficulty: u8) -> QuestionRecord {
        QuestionRecord {
            id: id.into(),
            skill,
            difficulty,
            passage: "A short passage.".into(),
            question: "What is it about?".into(),
            choices: vec!["This.".into(), "That.".into()],
            answer_index: 0,
            explanation: "It says so.".into(),
        }
    }

    fn bank() -> QuestionBank {
        QuestionBank::new(vec![
            record("M1", Skill::MainIdea, 1),
            record("M3", Skill::MainIdea, 3),
            record("M5", Skill::MainIdea, 5),
            record("E2", Skill::Evidence, 2),
            record("E4", Skill::Evidence, 4),
        ])
        .unwrap()
    }

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(123)
    }

    #[test]
    fn weaker_skill_is_targeted() {
        let mut cat = CatModel::default();
        cat.skills.main_idea = SkillStats {
            answered: 4,
            correct: 1,
        };
        cat.skills.evidence = SkillStats {
            answered: 4,
            correct: 3,
        };

        assert_eq!(choose_skill_target(&cat, &mut rng()), Skill::MainIdea);
    }

    #[test]
    fn unattempted_skill_counts_as_mastered() {
        let mut cat = CatModel::default();
        cat.skills.evidence = SkillStats {
            answered: 2,
            correct: 1,
        };

        // evidence at 50%, main idea untouched at 100%
        assert_eq!(choose_skill_target(&cat, &mut rng()), Skill::Evidence);
    }

    #[test]
    fn streaks_nudge_the_target_difficulty() {
        let mut cat = CatModel::default();
        cat.ability = 3.0;
        cat.streak = 2;
        assert!((target_difficulty(&cat) - 3.6).abs() < 1e-9);

        cat.streak = 0;
        cat.wrong_streak = 1;
        assert!((target_difficulty(&cat) - 2.4).abs() < 1e-9);

        cat.ability = 4.8;
        cat.streak = 3;
        cat.wrong_streak = 0;
        assert!((target_difficulty(&cat) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn selection_prefers_unused_questions() {
        let bank = bank();
        let mut cat = CatModel::default();
        // make main idea the clear target
        cat.skills.main_idea = SkillStats {
            answered: 2,
            correct: 0,
        };
        cat.ability = 3.0;

        let mut used = BTreeSet::new();
        used.insert("M3".to_string());

        let question = select_question(&bank, &cat, &used, &mut rng());
        assert_ne!(question.id, "M3");
        assert_eq!(question.skill, Skill::MainIdea);
    }

    #[test]
    fn exhausted_pool_allows_repeats() {
        let bank = bank();
        let mut cat = CatModel::default();
        cat.skills.main_idea = SkillStats {
            answered: 2,
            correct: 0,
        };
        cat.ability = 3.0;

        let used: BTreeSet<String> =
            ["M1", "M3", "M5"].iter().map(|id| id.to_string()).collect();

        // every main-idea question is used, tier two picks the closest to 3.0
        let question = select_question(&bank, &cat, &used, &mut rng());
        assert_eq!(question.id, "M3");
    }

    #[test]
    fn closest_difficulty_wins_with_first_found_ties() {
        let pool = [
            record("A", Skill::MainIdea, 2),
            record("B", Skill::MainIdea, 4),
        ];
        // both are 1 away from 3.0; first in scan order wins
        let best = closest_by_difficulty(pool.iter(), 3.0).unwrap();
        assert_eq!(best.id, "A");
    }

    #[test]
    fn grading_updates_ability_asymmetrically() {
        let mut cat = CatModel::default();
        cat.ability = 3.0;

        let result = grade(&mut cat, &record("M5", Skill::MainIdea, 5), 0);
        assert!(result.correct);
        assert_eq!(result.reward, 21);
        assert!((cat.ability - 3.38).abs() < 1e-9);
        assert_eq!(cat.streak, 1);
        assert_eq!(cat.wrong_streak, 0);

        let result = grade(&mut cat, &record("M1", Skill::MainIdea, 1), 1);
        assert!(!result.correct);
        assert_eq!(result.reward, 3);
        assert!((cat.ability - (3.38 - 0.324)).abs() < 1e-9);
        assert_eq!(cat.streak, 0);
        assert_eq!(cat.wrong_streak, 1);
    }

    #[test]
    fn ability_stays_clamped_for_any_grading_sequence() {
        let mut cat = CatModel::default();
        let hard = record("M5", Skill::MainIdea, 5);

        for _ in 0..50 {
            grade(&mut cat, &hard, 1);
            assert!(cat.ability >= ABILITY_FLOOR);
        }
        assert!((cat.ability - ABILITY_FLOOR).abs() < 1e-9);

        for _ in 0..50 {
            grade(&mut cat, &hard, 0);
            assert!(cat.ability <= ABILITY_CEIL);
        }
        assert!((cat.ability - ABILITY_CEIL).abs() < 1e-9);
    }

    #[test]
    fn counters_stay_consistent() {
        let mut cat = CatModel::default();
        let questions = [
            record("M1", Skill::MainIdea, 1),
            record("E2", Skill::Evidence, 2),
        ];

        for (i, question) in questions.iter().cycle().take(10).enumerate() {
            grade(&mut cat, question, i % 2);
        }

        assert_eq!(cat.answered, 10);
        assert!(cat.correct <= cat.answered);
        let by_skill = cat.skills.main_idea.answered + cat.skills.evidence.answered;
        assert_eq!(by_skill, cat.answered);
    }
}
