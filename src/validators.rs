//! Predicates over validated values.
//!
//! A field runs its validators, in declared order, on the value produced by
//! its coercion step. The first validator to reject the value decides the
//! message; the field stops there.
//!
//! Any closure `Fn(&Parsed) -> Result<(), ValidationError>` is a validator, and
//! so are the structs in this module, which also work on their own:
//!
//! ```
//! use jsonfields::validators::{MaxLength, Validator};
//! use jsonfields::Parsed;
//!
//! let short = MaxLength::new(5);
//! assert!(short.validate(&Parsed::from("abc")).is_ok());
//! assert!(short.validate(&Parsed::from("abcdef")).is_err());
//! ```

use crate::errors::Error;
use crate::messages::render;
use crate::validation::ValidationError;
use crate::value::Parsed;
use regex::Regex;
use std::cmp::Ordering;

/// A single check run by a field.
pub trait Validator: Send + Sync {
    fn validate(&self, value: &Parsed) -> Result<(), ValidationError>;
}

impl<F> Validator for F
where
    F: Fn(&Parsed) -> Result<(), ValidationError> + Send + Sync,
{
    fn validate(&self, value: &Parsed) -> Result<(), ValidationError> {
        self(value)
    }
}

fn reject(template: &str, limit: Option<&Parsed>, value: &Parsed) -> ValidationError {
    let mut params = vec![("value", value.to_string())];
    if let Some(limit) = limit {
        params.push(("limit", limit.to_string()));
    }
    ValidationError::new(render(template, &params))
}

/// Rejects values ordered below `limit`.
#[derive(Debug, Clone, PartialEq)]
pub struct MinValue {
    limit: Parsed,
    message: String,
}

impl MinValue {
    pub fn new<T: Into<Parsed>>(limit: T) -> Self {
        Self {
            limit: limit.into(),
            message: "Ensure this value is greater than or equal to {limit}.".to_owned(),
        }
    }

    /// Replaces the message template. `{limit}` and `{value}` are substituted.
    pub fn message<T: Into<String>>(mut self, message: T) -> Self {
        self.message = message.into();
        self
    }

    pub fn limit(&self) -> &Parsed {
        &self.limit
    }

    pub fn accepts(&self, value: &Parsed) -> bool {
        match value.compare(&self.limit) {
            Some(Ordering::Less) | None => false,
            _ => true,
        }
    }
}

impl Validator for MinValue {
    fn validate(&self, value: &Parsed) -> Result<(), ValidationError> {
        if self.accepts(value) {
            Ok(())
        } else {
            Err(reject(&self.message, Some(&self.limit), value))
        }
    }
}

/// Rejects values ordered above `limit`.
#[derive(Debug, Clone, PartialEq)]
pub struct MaxValue {
    limit: Parsed,
    message: String,
}

impl MaxValue {
    pub fn new<T: Into<Parsed>>(limit: T) -> Self {
        Self {
            limit: limit.into(),
            message: "Ensure this value is less than or equal to {limit}.".to_owned(),
        }
    }

    pub fn message<T: Into<String>>(mut self, message: T) -> Self {
        self.message = message.into();
        self
    }

    pub fn limit(&self) -> &Parsed {
        &self.limit
    }

    pub fn accepts(&self, value: &Parsed) -> bool {
        match value.compare(&self.limit) {
            Some(Ordering::Greater) | None => false,
            _ => true,
        }
    }
}

impl Validator for MaxValue {
    fn validate(&self, value: &Parsed) -> Result<(), ValidationError> {
        if self.accepts(value) {
            Ok(())
        } else {
            Err(reject(&self.message, Some(&self.limit), value))
        }
    }
}

/// Rejects text, lists and maps shorter than `limit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinLength {
    limit: usize,
    message: String,
}

impl MinLength {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            message: "Ensure this value has at least {limit} characters.".to_owned(),
        }
    }

    pub fn message<T: Into<String>>(mut self, message: T) -> Self {
        self.message = message.into();
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn accepts(&self, value: &Parsed) -> bool {
        value.len().map(|len| len >= self.limit).unwrap_or(false)
    }
}

impl Validator for MinLength {
    fn validate(&self, value: &Parsed) -> Result<(), ValidationError> {
        if self.accepts(value) {
            Ok(())
        } else {
            let limit = Parsed::Int(self.limit as i64);
            Err(reject(&self.message, Some(&limit), value))
        }
    }
}

/// Rejects text, lists and maps longer than `limit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaxLength {
    limit: usize,
    message: String,
}

impl MaxLength {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            message: "Ensure this value has no more than {limit} characters.".to_owned(),
        }
    }

    pub fn message<T: Into<String>>(mut self, message: T) -> Self {
        self.message = message.into();
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn accepts(&self, value: &Parsed) -> bool {
        value.len().map(|len| len <= self.limit).unwrap_or(false)
    }
}

impl Validator for MaxLength {
    fn validate(&self, value: &Parsed) -> Result<(), ValidationError> {
        if self.accepts(value) {
            Ok(())
        } else {
            let limit = Parsed::Int(self.limit as i64);
            Err(reject(&self.message, Some(&limit), value))
        }
    }
}

/// Requires text to contain a match of a regular expression, or, with
/// `inverse_match`, to contain none.
///
/// Flags such as case-insensitivity are set by compiling the expression with
/// [`regex::RegexBuilder`] and passing it to
/// [`from_regex`](#method.from_regex).
#[derive(Debug, Clone)]
pub struct RegexValidator {
    regex: Regex,
    inverse_match: bool,
    message: String,
}

impl RegexValidator {
    pub fn new(pattern: &str) -> Result<Self, Error> {
        let regex = Regex::new(pattern).map_err(|err| Error::InvalidPattern {
            pattern: pattern.to_owned(),
            reason: err.to_string(),
        })?;
        Ok(Self::from_regex(regex))
    }

    pub fn from_regex(regex: Regex) -> Self {
        Self {
            regex,
            inverse_match: false,
            message: "This value does not match the required pattern.".to_owned(),
        }
    }

    pub fn inverse_match(mut self, inverse_match: bool) -> Self {
        self.inverse_match = inverse_match;
        self
    }

    pub fn message<T: Into<String>>(mut self, message: T) -> Self {
        self.message = message.into();
        self
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn is_inverse(&self) -> bool {
        self.inverse_match
    }

    pub fn accepts(&self, value: &Parsed) -> bool {
        let found = match value.as_str() {
            Some(text) => self.regex.is_match(text),
            None => self.regex.is_match(&value.to_string()),
        };
        found != self.inverse_match
    }

    /// Same as `validate`, reporting `template` instead of this validator's
    /// own message.
    pub(crate) fn validate_with(&self, value: &Parsed, template: &str) -> Result<(), ValidationError> {
        if self.accepts(value) {
            Ok(())
        } else {
            Err(reject(template, None, value))
        }
    }
}

impl Validator for RegexValidator {
    fn validate(&self, value: &Parsed) -> Result<(), ValidationError> {
        self.validate_with(value, &self.message)
    }
}

/// Requires a value to be one of a fixed set of choices.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceValidator {
    choices: Vec<(Parsed, Option<String>)>,
    message: String,
}

impl ChoiceValidator {
    pub fn new<I, T>(choices: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Parsed>,
    {
        Self::from_pairs(choices.into_iter().map(|choice| (choice.into(), None)))
    }

    /// Choices given as `(value, label)` pairs. Only the values take part in
    /// the membership test.
    pub fn labelled<I, T, L>(choices: I) -> Self
    where
        I: IntoIterator<Item = (T, L)>,
        T: Into<Parsed>,
        L: Into<String>,
    {
        Self::from_pairs(
            choices
                .into_iter()
                .map(|(choice, label)| (choice.into(), Some(label.into()))),
        )
    }

    fn from_pairs<I: Iterator<Item = (Parsed, Option<String>)>>(choices: I) -> Self {
        Self {
            choices: choices.collect(),
            message: "Value {value} is not a valid choice. Choose one of {choices}.".to_owned(),
        }
    }

    pub fn message<T: Into<String>>(mut self, message: T) -> Self {
        self.message = message.into();
        self
    }

    pub fn choices(&self) -> impl Iterator<Item = &Parsed> {
        self.choices.iter().map(|(choice, _)| choice)
    }

    pub fn label(&self, value: &Parsed) -> Option<&str> {
        self.choices
            .iter()
            .find(|(choice, _)| choice.matches(value))
            .and_then(|(_, label)| label.as_deref())
    }

    pub fn accepts(&self, value: &Parsed) -> bool {
        self.choices().any(|choice| choice.matches(value))
    }
}

impl Validator for ChoiceValidator {
    fn validate(&self, value: &Parsed) -> Result<(), ValidationError> {
        if self.accepts(value) {
            return Ok(());
        }
        let choices = self
            .choices()
            .map(|choice| choice.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Err(ValidationError::new(render(
            &self.message,
            &[("value", value.to_string()), ("choices", choices)],
        )))
    }
}
