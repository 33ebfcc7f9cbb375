//! An error type for all field- and schema-related operations.

use crate::validation::ValidationError;
use failure::Fail;

/// An enum of possible errors that can emerge from this crate.
///
/// Only [`Invalid`](#variant.Invalid) describes bad input data. The remaining
/// variants describe a path that located nothing, a misconfigured resolution,
/// or a misuse of the declarative API; the validation pipeline never turns
/// those into validation failures.
#[derive(Debug, Fail, PartialEq, Clone)]
pub enum Error {
    /// The input did not satisfy a field or schema.
    ///
    /// The wrapped [`ValidationError`](../validation/struct.ValidationError.html)
    /// holds the full tree of messages, keyed by field name.
    #[fail(display = "{}", _0)]
    Invalid(#[cause] ValidationError),

    /// A path expression located no value.
    ///
    /// This never escapes a call to `parse`: fields turn it into a `required`
    /// failure, or try their next candidate path.
    #[fail(display = "no value found at `{}`", source)]
    NotFound { source: String },

    /// A dialect was requested by a name that is not registered.
    #[fail(display = "Dialect '{}' is not supported; choose one of {}.", dialect, allowed)]
    UnknownDialect { dialect: String, allowed: String },

    /// A delegate dialect could not make sense of a query expression.
    #[fail(display = "invalid query `{}`: {}", query, reason)]
    InvalidQuery { query: String, reason: String },

    /// Nested schemas, lists or dictionaries went deeper than the configured
    /// `max_depth`.
    #[fail(display = "maximum nesting depth exceeded during validation")]
    MaxDepthExceeded,

    /// A standalone field was asked to find a value without any path source.
    #[fail(display = "`source` is required to find `{}` field", field)]
    MissingSource { field: String },

    /// A field was declared as not required, but without a default.
    #[fail(display = "`default` should be set for not required field `{}`", field)]
    MissingDefault { field: String },

    /// The child field of a list or dictionary declared its own path source.
    #[fail(display = "`source` is not allowed for the child of `{}` field", field)]
    ChildSource { field: String },

    /// A regular expression did not compile.
    #[fail(display = "invalid pattern `{}`: {}", pattern, reason)]
    InvalidPattern { pattern: String, reason: String },

    /// A field failed with a message key missing from its catalog.
    #[fail(
        display = "error key `{}` does not exist in the messages of field `{}`",
        key, field
    )]
    UnknownMessageKey { field: String, key: String },

    /// A kind-specific option was set on a field of another kind.
    #[fail(display = "option `{}` does not apply to field `{}`", option, field)]
    InvalidOption { field: String, option: String },

    /// A schema was built from a field that is not a schema field.
    #[fail(display = "field `{}` is not a schema field", field)]
    NotSchema { field: String },

    /// A schema type registered a refinement for a field it does not declare.
    #[fail(display = "schema `{}` declares no field `{}`", schema, field)]
    UnknownField { schema: String, field: String },
}

impl Error {
    /// The validation failure carried by this error, if it is one.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Error::Invalid(err) => Some(err),
            _ => None,
        }
    }

    /// Same as [`validation`](#method.validation), but moves ownership.
    pub fn into_validation(self) -> Option<ValidationError> {
        match self {
            Error::Invalid(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound { .. } => true,
            _ => false,
        }
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Invalid(err)
    }
}
