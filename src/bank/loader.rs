use std::{collections::HashMap, fs, path::Path, sync::Arc};

use serde::Deserialize;
use tracing::warn;

use crate::bank::models::{Difficulty, QuestionRecord};

#[derive(Debug, thiserror::Error)]
pub enum BankError {
    #[error("Failed to read question file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid question file: {0}")]
    Parse(#[from] serde_json::Error),
}

/* File schema */

#[derive(Debug, Deserialize)]
struct BankFile {
    #[serde(default)]
    categories: Vec<RawCategory>,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    category: String,
    #[serde(default)]
    difficulty_levels: HashMap<String, Vec<RawQuestion>>,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    question: String,
    true_answer: String,
    answer_1: String,
    answer_2: String,
    answer_3: String,
}

impl From<RawQuestion> for QuestionRecord {
    fn from(raw: RawQuestion) -> Self {
        Self {
            prompt: raw.question,
            correct_answer: raw.true_answer,
            distractors: [raw.answer_1, raw.answer_2, raw.answer_3],
        }
    }
}

/// Immutable question bank, loaded once at startup. Read-only afterwards,
/// so pools are shared as `Arc` handles without further locking.
pub struct QuestionBank {
    categories: Vec<String>,
    pools: HashMap<(String, Difficulty), Arc<Vec<QuestionRecord>>>,
}

impl QuestionBank {
    pub fn empty() -> Self {
        Self {
            categories: Vec::new(),
            pools: HashMap::new(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, BankError> {
        let raw = fs::read_to_string(path)?;
        let file: BankFile = serde_json::from_str(&raw)?;

        let mut bank = Self::empty();
        for category in file.categories {
            for (level, questions) in category.difficulty_levels {
                let Ok(difficulty) = Difficulty::try_from(level.as_str()) else {
                    warn!(
                        "Skipping unknown difficulty level '{}' in category '{}'",
                        level, category.category
                    );
                    continue;
                };

                let records = questions.into_iter().map(QuestionRecord::from).collect();
                bank.insert(&category.category, difficulty, records);
            }
        }

        Ok(bank)
    }

    pub fn insert(
        &mut self,
        category: &str,
        difficulty: Difficulty,
        records: Vec<QuestionRecord>,
    ) {
        if !self.categories.iter().any(|c| c == category) {
            self.categories.push(category.to_string());
        }

        self.pools
            .insert((category.to_string(), difficulty), Arc::new(records));
    }

    pub fn lookup(
        &self,
        category: &str,
        difficulty: Difficulty,
    ) -> Option<Arc<Vec<QuestionRecord>>> {
        self.pools
            .get(&(category.to_string(), difficulty))
            .cloned()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }
}
