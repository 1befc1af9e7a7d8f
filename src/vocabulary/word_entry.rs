use std::fmt::Display;

/// What the learner has to produce for a prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerKey {
    Translation(String),
    Choices {
        correct: String,
        wrong: String,
        wrong_translation: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct WordEntry {
    prompt: String,
    answer: AnswerKey,
}

impl WordEntry {
    pub fn translation(term: &str, translation: &str) -> Self {
        Self {
            prompt: term.to_string(),
            answer: AnswerKey::Translation(translation.to_string()),
        }
    }

    pub fn multiple_choice(
        prompt: &str,
        correct: &str,
        wrong: &str,
        wrong_translation: Option<&str>,
    ) -> Self {
        Self {
            prompt: prompt.to_string(),
            answer: AnswerKey::Choices {
                correct: correct.to_string(),
                wrong: wrong.to_string(),
                wrong_translation: wrong_translation.map(str::to_string),
            },
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn answer(&self) -> &AnswerKey {
        &self.answer
    }

    pub fn has_choices(&self) -> bool {
        matches!(self.answer, AnswerKey::Choices { .. })
    }
}

impl Display for WordEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.answer {
            AnswerKey::Translation(translation) => write!(f, "{} -> {}", self.prompt, translation),
            AnswerKey::Choices { correct, wrong, .. } => {
                write!(f, "{} -> {} (not {})", self.prompt, correct, wrong)
            }
        }
    }
}
