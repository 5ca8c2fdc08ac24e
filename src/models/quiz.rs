use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`
    pub correct: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Quiz {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub questions: Vec<Question>,
}

/// Question shown to the student, answer key stripped
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub index: usize,
    pub question: String,
    pub options: Vec<String>,
}

/// All quizzes keyed by skill code, as stored in `questions.json`
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct QuizBank {
    quizzes: HashMap<String, Quiz>,
}

impl QuizBank {
    /// Read the question bank. Returns `None` when the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).context(format!("Failed to read question bank: {}", path.display()))
            }
        };

        let bank = serde_json::from_str(&content)
            .context(format!("Failed to parse question bank: {}", path.display()))?;

        Ok(Some(bank))
    }

    pub fn get(&self, skill_code: &str) -> Option<&Quiz> {
        self.quizzes.get(skill_code)
    }
}

impl Quiz {
    pub fn public_questions(&self) -> Vec<PublicQuestion> {
        self.questions
            .iter()
            .enumerate()
            .map(|(index, q)| PublicQuestion {
                index,
                question: q.question.clone(),
                options: q.options.clone(),
            })
            .collect()
    }
}
