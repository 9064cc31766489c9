use core::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Difficulty {
    One,
    Two,
    Three,
}

impl Difficulty {
    pub fn as_str(&self) -> &str {
        match self {
            Difficulty::One => "1",
            Difficulty::Two => "2",
            Difficulty::Three => "3",
        }
    }

    pub fn all() -> [Difficulty; 3] {
        [Difficulty::One, Difficulty::Two, Difficulty::Three]
    }
}

impl TryFrom<&str> for Difficulty {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "1" => Ok(Difficulty::One),
            "2" => Ok(Difficulty::Two),
            "3" => Ok(Difficulty::Three),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionRecord {
    pub prompt: String,
    pub correct_answer: String,
    pub distractors: [String; 3],
}
