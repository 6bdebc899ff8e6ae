use rand::RngExt;
use serde::{Deserialize, Serialize};

use crate::*;

pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 5;

/// Reading-comprehension competency tags.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Skill {
    MainIdea,
    Evidence,
}

impl Skill {
    pub const ALL: [Skill; 2] = [Skill::MainIdea, Skill::Evidence];

    pub const fn label(self) -> &'static str {
        match self {
            Self::MainIdea => "Main Idea",
            Self::Evidence => "Evidence",
        }
    }
}

/// One question as shipped by the corpus. Read-only once loaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub id: String,
    pub skill: Skill,
    pub difficulty: u8,
    pub passage: String,
    pub question: String,
    pub choices: Vec<String>,
    pub answer_index: usize,
    pub explanation: String,
}

impl QuestionRecord {
    fn validate(&self) -> Result<()> {
        if self.id.is_empty()
            || !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&self.difficulty)
            || self.choices.len() < 2
            || self.answer_index >= self.choices.len()
        {
            log::warn!("rejecting malformed question record {:?}", self.id);
            return Err(GameError::InvalidQuestion);
        }
        Ok(())
    }
}

/// The fixed question corpus, validated on construction and never mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionBank {
    questions: Vec<QuestionRecord>,
}

impl QuestionBank {
    pub fn new(questions: Vec<QuestionRecord>) -> Result<Self> {
        if questions.is_empty() {
            return Err(GameError::EmptyCorpus);
        }
        for (i, question) in questions.iter().enumerate() {
            question.validate()?;
            if questions[..i].iter().any(|other| other.id == question.id) {
                log::warn!("duplicate question id {:?}", question.id);
                return Err(GameError::InvalidQuestion);
            }
        }
        Ok(Self { questions })
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let questions: Vec<QuestionRecord> = serde_json::from_str(raw).map_err(|err| {
            log::warn!("question corpus failed to parse: {err}");
            GameError::InvalidQuestion
        })?;
        Self::new(questions)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        // `new` rejects empty corpora, kept for completeness
        self.questions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuestionRecord> {
        self.questions.iter()
    }

    pub fn get(&self, id: &str) -> Option<&QuestionRecord> {
        self.questions.iter().find(|question| question.id == id)
    }

    pub fn of_skill(&self, skill: Skill) -> impl Iterator<Item = &QuestionRecord> {
        self.questions
            .iter()
            .filter(move |question| question.skill == skill)
    }

    /// Uniform pick over the whole corpus, the selection chain's last resort.
    pub fn pick_uniform(&self, rng: &mut impl rand::Rng) -> &QuestionRecord {
        &self.questions[rng.random_range(0..self.questions.len())]
    }
}
