use serde::Serialize;

use crate::error::OptionSetError;

/// Closing choice meaning "none of the above apply"
pub const SENTINEL: &str = "NONE of the ABOVE";

pub const OPTION_COUNT: usize = 7;

/// Used when the model's answer is missing or unusable
pub const FALLBACK_OPTIONS: [&str; OPTION_COUNT] = [
    "Yes",
    "No",
    "Maybe",
    "Not sure",
    "I need help",
    "Can you repeat?",
    SENTINEL,
];

/// Shown when nothing was understood from the doctor
pub const RETRY_OPTIONS: [&str; OPTION_COUNT] = [
    "Try again",
    "Type a message",
    "Ask something else",
    "Wait a moment",
    "Need help?",
    "Speak louder",
    SENTINEL,
];

/// Seven replies ranked most to least likely, ending in [`SENTINEL`].
///
/// The only way to build one is through validation, so holders can rely on
/// the shape without re-checking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OptionSet(Vec<String>);

impl OptionSet {
    pub fn new(options: Vec<String>) -> Result<Self, OptionSetError> {
        if options.len() != OPTION_COUNT {
            return Err(OptionSetError::WrongLength {
                expected: OPTION_COUNT,
                actual: options.len(),
            });
        }

        let options: Vec<String> = options.into_iter().map(|o| o.trim().to_string()).collect();

        if let Some(index) = options.iter().position(|o| o.is_empty()) {
            return Err(OptionSetError::EmptyOption(index));
        }

        let last = &options[OPTION_COUNT - 1];
        if !is_sentinel(last) {
            return Err(OptionSetError::MissingSentinel(last.clone()));
        }

        Ok(Self(options))
    }

    pub fn fallback() -> Self {
        Self(FALLBACK_OPTIONS.iter().map(|o| o.to_string()).collect())
    }

    pub fn retry() -> Self {
        Self(RETRY_OPTIONS.iter().map(|o| o.to_string()).collect())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, option: &str) -> bool {
        self.0.iter().any(|o| o == option)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

pub fn is_sentinel(option: &str) -> bool {
    option.trim().eq_ignore_ascii_case(SENTINEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fixed_sets_are_valid() {
        assert!(OptionSet::new(strings(&FALLBACK_OPTIONS)).is_ok());
        assert!(OptionSet::new(strings(&RETRY_OPTIONS)).is_ok());
    }

    #[test]
    fn test_sentinel_is_case_insensitive() {
        let options = strings(&["a", "b", "c", "d", "e", "f", "none of the above"]);
        let set = OptionSet::new(options).unwrap();
        assert_eq!(set.as_slice()[6], "none of the above");
    }

    #[test]
    fn test_rejects_wrong_length() {
        let result = OptionSet::new(strings(&["Yes", SENTINEL]));
        assert_eq!(
            result,
            Err(OptionSetError::WrongLength {
                expected: 7,
                actual: 2
            })
        );
    }

    #[test]
    fn test_rejects_missing_sentinel() {
        let result = OptionSet::new(strings(&["a", "b", "c", "d", "e", "f", "g"]));
        assert_eq!(result, Err(OptionSetError::MissingSentinel("g".to_string())));
    }

    #[test]
    fn test_rejects_blank_option() {
        let result = OptionSet::new(strings(&["a", "  ", "c", "d", "e", "f", SENTINEL]));
        assert_eq!(result, Err(OptionSetError::EmptyOption(1)));
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let json = serde_json::to_string(&OptionSet::fallback()).unwrap();
        assert!(json.starts_with("[\"Yes\",\"No\""));
    }
}
