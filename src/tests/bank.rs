use std::{fs, path::PathBuf};

use uuid::Uuid;

use crate::bank::{
    loader::{BankError, QuestionBank},
    models::Difficulty,
};

fn write_bank_file(content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("quizline-test-bank-{}.json", Uuid::new_v4()));
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn loads_the_original_file_schema() {
    let path = write_bank_file(
        r#"{
            "categories": [
                {
                    "category": "Math",
                    "difficulty_levels": {
                        "1": [
                            {
                                "question": "2+2?",
                                "true_answer": "4",
                                "answer_1": "3",
                                "answer_2": "5",
                                "answer_3": "22"
                            }
                        ],
                        "2": [
                            {
                                "question": "3*3?",
                                "true_answer": "9",
                                "answer_1": "6",
                                "answer_2": "12",
                                "answer_3": "33"
                            },
                            {
                                "question": "10/2?",
                                "true_answer": "5",
                                "answer_1": "2",
                                "answer_2": "8",
                                "answer_3": "20"
                            }
                        ]
                    }
                }
            ]
        }"#,
    );

    let bank = QuestionBank::load(&path).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(bank.category_count(), 1);
    assert_eq!(bank.categories(), &["Math".to_string()]);

    let pool = bank.lookup("Math", Difficulty::One).unwrap();
    assert_eq!(pool.len(), 1);
    assert_eq!(pool[0].prompt, "2+2?");
    assert_eq!(pool[0].correct_answer, "4");
    assert_eq!(
        pool[0].distractors,
        ["3".to_string(), "5".to_string(), "22".to_string()]
    );

    assert_eq!(bank.lookup("Math", Difficulty::Two).unwrap().len(), 2);
    assert!(bank.lookup("Math", Difficulty::Three).is_none());
    assert!(bank.lookup("History", Difficulty::One).is_none());
}

#[test]
fn missing_file_is_an_io_error() {
    let path = std::env::temp_dir().join(format!("quizline-test-absent-{}.json", Uuid::new_v4()));
    let result = QuestionBank::load(&path);
    assert!(matches!(result, Err(BankError::Io(_))));
}

#[test]
fn malformed_json_is_a_parse_error() {
    let path = write_bank_file("this is not json");
    let result = QuestionBank::load(&path);
    fs::remove_file(&path).ok();
    assert!(matches!(result, Err(BankError::Parse(_))));
}

#[test]
fn unknown_difficulty_levels_are_skipped() {
    let path = write_bank_file(
        r#"{
            "categories": [
                {
                    "category": "Math",
                    "difficulty_levels": {
                        "9": [
                            {
                                "question": "q",
                                "true_answer": "a",
                                "answer_1": "b",
                                "answer_2": "c",
                                "answer_3": "d"
                            }
                        ]
                    }
                }
            ]
        }"#,
    );

    let bank = QuestionBank::load(&path).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(bank.category_count(), 0);
    assert!(bank.lookup("Math", Difficulty::One).is_none());
}

#[test]
fn difficulty_conversions_round_trip() {
    for level in Difficulty::all() {
        assert_eq!(Difficulty::try_from(level.as_str()), Ok(level));
    }

    assert!(Difficulty::try_from("4").is_err());
    assert!(Difficulty::try_from("").is_err());
}
