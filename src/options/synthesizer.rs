use std::sync::Arc;
use tracing::{error, info, warn};

use super::generator::TextGenerator;
use super::option_set::{OptionSet, OPTION_COUNT, SENTINEL};

/// Produces the patient's reply choices for a doctor's question.
///
/// Always yields a valid [`OptionSet`]: anything the model gets wrong is
/// replaced by the fallback set.
pub struct OptionSynthesizer {
    generator: Arc<dyn TextGenerator>,
    max_attempts: u32,
}

impl OptionSynthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            max_attempts: 1,
        }
    }

    /// Ask the model up to `attempts` times before falling back (minimum 1)
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub async fn synthesize(&self, question: &str) -> OptionSet {
        let question = question.trim();
        if question.is_empty() {
            warn!("Empty question, using fallback options");
            return OptionSet::fallback();
        }

        let prompt = build_prompt(question);

        for attempt in 1..=self.max_attempts {
            match self.generator.generate(&prompt).await {
                Ok(text) => match parse_options(&text) {
                    Some(options) => {
                        info!("Generated {} options (attempt {})", OPTION_COUNT, attempt);
                        return options;
                    }
                    None => warn!(
                        "Unusable options from model (attempt {}): {:?}",
                        attempt, text
                    ),
                },
                Err(e) => error!("Option generation error (attempt {}): {:#}", attempt, e),
            }
        }

        OptionSet::fallback()
    }
}

pub fn build_prompt(question: &str) -> String {
    format!(
        "You are an AI assistant helping a patient with expressive dysphasia communicate. \
         Given a question asked by a doctor, generate exactly {count} contextually relevant \
         multiple-choice options for the patient to select as a response. Options should be \
         simple, short, and ordered from most likely to least likely. \
         The last option must be '{sentinel}'. \
         Return the options as a JSON array of strings.\n\n\
         Question: {question}\n\n\
         Output: ```json\n[]\n```",
        count = OPTION_COUNT,
        sentinel = SENTINEL,
        question = question,
    )
}

/// Parse a model reply into a valid option set.
///
/// Accepts a bare JSON array, one wrapped in a Markdown code fence, or one
/// embedded in prose (first `[` through last `]`).
pub fn parse_options(text: &str) -> Option<OptionSet> {
    let unfenced = strip_code_fence(text.trim());

    let parsed = serde_json::from_str::<Vec<String>>(unfenced).ok().or_else(|| {
        let start = unfenced.find('[')?;
        let end = unfenced.rfind(']')?;
        if end <= start {
            return None;
        }
        serde_json::from_str::<Vec<String>>(&unfenced[start..=end]).ok()
    })?;

    match OptionSet::new(parsed) {
        Ok(options) => Some(options),
        Err(e) => {
            warn!("Rejected generated options: {}", e);
            None
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    // Drop an info string such as "json" on the opening fence line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };

    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}
