use include_dir::{include_dir, Dir};
use serde::Deserialize;
use thiserror::Error;

static BANK_DIR: Dir = include_dir!("src/banks");

#[derive(Debug, Error)]
pub enum BankError {
    #[error("no built-in bank named {0}")]
    UnknownBuiltin(String),

    #[error("bank is not valid json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("bank {topic} has no questions")]
    Empty { topic: String },

    #[error("question {index} in {topic}: correct option {correct} out of range for {options} options")]
    CorrectOutOfRange {
        topic: String,
        index: usize,
        correct: usize,
        options: usize,
    },
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Question {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct: usize,
}

/// Ordered, fixed-length question list for one topic. Read-only
/// configuration as far as the session engine is concerned; its length is
/// the scoring denominator.
#[derive(Deserialize, Clone, Debug)]
pub struct QuestionBank {
    topic: String,
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new(topic: impl Into<String>, questions: Vec<Question>) -> Result<Self, BankError> {
        let bank = Self {
            topic: topic.into(),
            questions,
        };
        bank.validate()?;
        Ok(bank)
    }

    /// Parse and validate a caller-supplied bank.
    pub fn from_json(raw: &str) -> Result<Self, BankError> {
        let bank: QuestionBank = serde_json::from_str(raw)?;
        bank.validate()?;
        Ok(bank)
    }

    /// Load one of the banks embedded in the binary.
    pub fn builtin(name: &str) -> Result<Self, BankError> {
        let file = BANK_DIR
            .get_file(format!("{name}.json"))
            .and_then(|f| f.contents_utf8())
            .ok_or_else(|| BankError::UnknownBuiltin(name.to_string()))?;
        Self::from_json(file)
    }

    /// Names accepted by [`QuestionBank::builtin`].
    pub fn builtin_topics() -> Vec<String> {
        let mut names: Vec<String> = BANK_DIR
            .files()
            .filter_map(|f| f.path().file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn validate(&self) -> Result<(), BankError> {
        if self.questions.is_empty() {
            return Err(BankError::Empty {
                topic: self.topic.clone(),
            });
        }
        for (index, q) in self.questions.iter().enumerate() {
            if q.correct >= q.options.len() {
                return Err(BankError::CorrectOutOfRange {
                    topic: self.topic.clone(),
                    index,
                    correct: q.correct,
                    options: q.options.len(),
                });
            }
        }
        Ok(())
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }
}
