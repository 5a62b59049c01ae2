//! Request validation helpers.
//!
//! Handlers collect field errors into [`ValidationErrors`] and return them
//! all at once, so a form can highlight every bad field in one round trip.
//! Messages are written for the shopper, in Portuguese.

use std::collections::BTreeMap;

use serde::Serialize;

/// Brazilian state codes (UF).
const STATES: [&str; 27] = [
    "AC", "AL", "AP", "AM", "BA", "CE", "DF", "ES", "GO", "MA", "MT", "MS", "MG", "PA", "PB",
    "PR", "PE", "PI", "RJ", "RN", "RS", "RO", "RR", "SC", "SP", "SE", "TO",
];

/// Field name to message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for `field`. The first message per field wins.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// `Ok(())` when nothing was recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` if any field failed.
    pub fn finish(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Check that a trimmed value is present and at most `max` characters,
    /// returning the trimmed value.
    pub fn required(&mut self, field: &str, value: &str, max: usize) -> String {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.add(field, "Campo obrigatório");
        } else if trimmed.chars().count() > max {
            self.add(field, format!("Máximo de {max} caracteres"));
        }
        trimmed.to_owned()
    }

    /// Check a CEP, returning its 8 digits without punctuation.
    pub fn cep(&mut self, field: &str, value: &str) -> String {
        match normalize_cep(value) {
            Some(cep) => cep,
            None => {
                self.add(field, "CEP inválido (use 8 dígitos)");
                value.trim().to_owned()
            }
        }
    }

    /// Check a state code, returning it uppercased.
    pub fn state(&mut self, field: &str, value: &str) -> String {
        let state = value.trim().to_ascii_uppercase();
        if !STATES.contains(&state.as_str()) {
            self.add(field, "Estado inválido (use a sigla, por exemplo SP)");
        }
        state
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(String::as_str).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Strip `-`, `.` and spaces from a CEP and require exactly 8 digits.
#[must_use]
pub fn normalize_cep(value: &str) -> Option<String> {
    let digits: String = value
        .chars()
        .filter(|c| !matches!(c, '-' | '.' | ' '))
        .collect();
    (digits.len() == 8 && digits.chars().all(|c| c.is_ascii_digit())).then_some(digits)
}

/// Trim an optional string, mapping blank to `None`.
#[must_use]
pub fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Trim and de-duplicate option lists such as sizes and colors, dropping blanks.
#[must_use]
pub fn clean_list(values: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim().to_owned();
        if !value.is_empty() && !cleaned.contains(&value) {
            cleaned.push(value);
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cep_normalization() {
        assert_eq!(normalize_cep("01310-100").as_deref(), Some("01310100"));
        assert_eq!(normalize_cep("01.310-100").as_deref(), Some("01310100"));
        assert_eq!(normalize_cep("0131010"), None);
        assert_eq!(normalize_cep("0131010a"), None);
    }

    #[test]
    fn test_state_codes() {
        let mut errors = ValidationErrors::new();
        assert_eq!(errors.state("state", "sp"), "SP");
        assert!(errors.is_empty());
        errors.state("state", "XX");
        assert!(errors.get("state").is_some());
    }

    #[test]
    fn test_required_trims_and_limits() {
        let mut errors = ValidationErrors::new();
        assert_eq!(errors.required("name", "  Ana  ", 10), "Ana");
        errors.required("street", "   ", 10);
        errors.required("city", "São José dos Campos", 5);
        assert_eq!(errors.get("street"), Some("Campo obrigatório"));
        assert_eq!(errors.get("city"), Some("Máximo de 5 caracteres"));
        assert!(errors.finish().is_err());
    }

    #[test]
    fn test_first_message_wins() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "primeiro");
        errors.add("email", "segundo");
        assert_eq!(errors.get("email"), Some("primeiro"));
    }

    #[test]
    fn test_optional_and_lists() {
        assert_eq!(optional(Some("  ".to_string())), None);
        assert_eq!(optional(Some(" apto 3 ".to_string())).as_deref(), Some("apto 3"));
        assert_eq!(
            clean_list(vec![" P ".into(), "M".into(), "P".into(), String::new()]),
            vec!["P".to_string(), "M".to_string()]
        );
    }
}
