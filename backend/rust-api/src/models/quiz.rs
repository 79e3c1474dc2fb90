use serde::{Deserialize, Serialize};

pub const MAX_ATTEMPTS: u32 = 3;
pub const QUESTIONS_PER_ROUND: usize = 3;
pub const OPTIONS_PER_QUESTION: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

impl Question {
    pub fn new(question: impl Into<String>, options: [&str; OPTIONS_PER_QUESTION], correct: &str) -> Self {
        Self {
            question: question.into(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer: correct.to_string(),
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.options.len() == OPTIONS_PER_QUESTION && self.options.contains(&self.correct_answer)
    }
}

/// One buyer's attempt streak, stored in `quiz_state` keyed by `user_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizState {
    pub user_id: String,
    pub city: String,
    pub attempts_left: u32,
    #[serde(default)]
    pub questions_asked: Vec<String>,
    #[serde(default)]
    pub current_questions: Vec<Question>,
    #[serde(default)]
    pub score: u32,
}

impl QuizState {
    pub fn new(user_id: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            city: city.into(),
            attempts_left: MAX_ATTEMPTS,
            questions_asked: Vec::new(),
            current_questions: Vec::new(),
            score: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionButton {
    pub text: &'static str,
    pub action: &'static str,
}

impl ActionButton {
    pub const BUY_MEMBERSHIP: ActionButton = ActionButton {
        text: "Buy Membership",
        action: "buy_membership",
    };
    pub const PLAY_AGAIN: ActionButton = ActionButton {
        text: "Play Quiz Again",
        action: "play_quiz",
    };
    pub const START_NEW_LISTING: ActionButton = ActionButton {
        text: "Start New Listing",
        action: "start_new_listing",
    };
}

#[derive(Debug, Deserialize)]
pub struct QuizRoundRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuizRoundResponse {
    pub status: &'static str,
    pub message: String,
    pub questions: Vec<Question>,
    pub attempts_left: u32,
}

#[derive(Debug, Serialize)]
pub struct QuizExhaustedResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub buttons: Vec<ActionButton>,
}

#[derive(Debug, Deserialize)]
pub struct QuizSubmitRequest {
    pub user_id: String,
    #[serde(default)]
    pub answers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct QuizSubmitResponse {
    pub status: &'static str,
    pub message: String,
    pub score: String,
    pub buttons: Vec<ActionButton>,
}
