//! Turns untrusted generator output into exactly three well-formed questions.
//!
//! Nothing the model returns reaches a response unchecked: the text is parsed
//! into [`GeneratedQuestions`], each candidate is repaired into a [`Question`]
//! with four options and an answer among them, and the round is padded or cut
//! to [`QUESTIONS_PER_ROUND`].

use serde_json::Value;

use crate::llm::{strip_code_fences, GenerationRequest};
use crate::models::quiz::{Question, OPTIONS_PER_QUESTION, QUESTIONS_PER_ROUND};

pub type RoundQuestions = [Question; QUESTIONS_PER_ROUND];

/// Result of parsing raw generator text.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedQuestions {
    /// A JSON list of candidates. Elements are still unvalidated.
    Parsed(Vec<Value>),
    ParseFailure(String),
}

pub fn quiz_generation_request(city: &str, questions_asked: &[String]) -> GenerationRequest {
    let avoid = if questions_asked.is_empty() {
        "None".to_string()
    } else {
        questions_asked.join(", ")
    };

    let prompt = format!(
        "You are a Real-estate Quiz generator for {city}. \
         Generate exactly 3 unique multiple choice questions about the real-estate market in {city}. \
         Each question should have exactly 4 options (A, B, C, D) and one correct answer. \
         Do not repeat these questions: {avoid}. \
         Return ONLY a valid JSON array with this exact structure: \
         [{{\"question\": \"Your question here?\", \"options\": [\"Option A\", \"Option B\", \"Option C\", \"Option D\"], \"correct_answer\": \"Option A\"}}]. \
         Do not include any markdown formatting, explanations, or additional text. \
         Make sure the correct_answer matches exactly one of the options."
    );

    GenerationRequest {
        system_instruction: None,
        prompt,
        temperature: 0.3,
        max_output_tokens: 2048,
        grounded_search: true,
    }
}

pub fn parse_generated(raw: &str) -> GeneratedQuestions {
    let cleaned = strip_code_fences(raw);

    let value = match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => value,
        // Models sometimes wrap the array in prose; try the outermost [...] span.
        Err(first_err) => match outer_array(&cleaned).map(serde_json::from_str::<Value>) {
            Some(Ok(value)) => value,
            _ => return GeneratedQuestions::ParseFailure(first_err.to_string()),
        },
    };

    match value {
        Value::Array(items) => GeneratedQuestions::Parsed(items),
        Value::Object(mut map) => match map.remove("questions") {
            Some(Value::Array(items)) => GeneratedQuestions::Parsed(items),
            _ => GeneratedQuestions::ParseFailure("expected a JSON array of questions".to_string()),
        },
        other => GeneratedQuestions::ParseFailure(format!(
            "expected a JSON array of questions, got {}",
            json_kind(&other)
        )),
    }
}

fn outer_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Repairs one candidate. Non-object candidates are dropped.
pub fn repair_question(candidate: &Value, index: usize, city: &str) -> Option<Question> {
    let fields = candidate.as_object()?;

    let question = fields
        .get("question")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Sample question {} about {} real estate?", index + 1, city));

    let mut options: Vec<String> = match fields.get("options") {
        Some(Value::Array(items)) => items.iter().filter_map(option_text).collect(),
        _ => Vec::new(),
    };
    options.truncate(OPTIONS_PER_QUESTION);
    // Fillers continue from the next free slot letter and skip labels already taken.
    let mut letter = b'A' + options.len() as u8;
    while options.len() < OPTIONS_PER_QUESTION {
        let filler = format!("Option {}", letter as char);
        if !options.contains(&filler) {
            options.push(filler);
        }
        letter += 1;
    }

    let correct_answer = fields
        .get("correct_answer")
        .and_then(option_text)
        .filter(|answer| options.contains(answer))
        .unwrap_or_else(|| options[0].clone());

    Some(Question {
        question,
        options,
        correct_answer,
    })
}

fn option_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Served when the generator output cannot be parsed or the generator is down.
pub fn fallback_questions(city: &str) -> RoundQuestions {
    [
        Question::new(
            format!("What is the average property price range in {}?", city),
            ["₹20-30 lakhs", "₹30-50 lakhs", "₹50-70 lakhs", "₹70+ lakhs"],
            "₹30-50 lakhs",
        ),
        Question::new(
            format!("Which area in {} is considered prime for residential investment?", city),
            ["City Center", "Outskirts", "Industrial Area", "Agricultural Zone"],
            "City Center",
        ),
        Question::new(
            format!("What type of properties are most in demand in {}?", city),
            ["1 BHK Apartments", "2-3 BHK Apartments", "Villas", "Commercial Spaces"],
            "2-3 BHK Apartments",
        ),
    ]
}

/// Filler used when fewer than three usable questions survive repair.
pub fn generic_question(city: &str) -> Question {
    Question::new(
        format!("What is a key factor to consider when buying property in {}?", city),
        ["Location", "Price", "Amenities", "All of the above"],
        "All of the above",
    )
}

/// Builds the round: repair every candidate, keep the first three that
/// survive, pad with [`generic_question`]. A parse failure yields the fallback set.
pub fn build_round(generated: &GeneratedQuestions, city: &str) -> RoundQuestions {
    let candidates = match generated {
        GeneratedQuestions::Parsed(candidates) => candidates,
        GeneratedQuestions::ParseFailure(_) => return fallback_questions(city),
    };

    let mut repaired = candidates
        .iter()
        .enumerate()
        .filter_map(|(index, candidate)| repair_question(candidate, index, city));

    let round =
        [(); QUESTIONS_PER_ROUND].map(|_| repaired.next().unwrap_or_else(|| generic_question(city)));
    debug_assert!(round.iter().all(Question::is_well_formed));
    round
}
