//! Message catalogs.
//!
//! Every field kind owns a catalog of message templates, layered over the
//! catalogs of the more general kinds it specializes. Lookups go from the most
//! specific layer to the least specific one.

use crate::field::Kind;

type Layer = &'static [(&'static str, &'static str)];

const BASE: Layer = &[
    ("required", "This field is required."),
    ("null", "This field may not be null."),
    ("blank", "This field may not be empty."),
];

const TEXT: Layer = &[
    ("invalid", "A valid string is required."),
    (
        "max_length",
        "Ensure this field has no more than {limit} characters.",
    ),
    ("min_length", "Ensure this field has at least {limit} characters."),
];

const PATTERN: Layer = &[("invalid", "This field does not match the required pattern.")];

const NUMBER: Layer = &[
    ("invalid", "A valid number is required."),
    ("max_value", "Ensure this field is less than or equal to {limit}."),
    ("min_value", "Ensure this field is greater than or equal to {limit}."),
    ("max_string_length", "String value too large."),
];

const INTEGER: Layer = &[
    ("invalid", "A valid integer is required."),
    (
        "out_of_range",
        "Ensure this field is between -9223372036854775808 and 9223372036854775807.",
    ),
];

const DATE: Layer = &[
    ("invalid", "A valid date is required. Allowed formats: {formats}."),
    ("max_string_length", "String value too large."),
];

const DATE_ONLY: Layer = &[("datetime", "Expected a date but got a datetime.")];

const DATETIME_ONLY: Layer = &[("date", "Expected a datetime but got a date.")];

const LIST: Layer = &[(
    "invalid_type",
    "Expected a list of items but got type '{input_type}'.",
)];

const DICT: Layer = &[(
    "invalid_type",
    "Expected a dictionary of items but got type '{input_type}'.",
)];

/// The layers of `kind`, least specific first.
pub(crate) fn layers(kind: &Kind) -> Vec<Layer> {
    match kind {
        Kind::Text { pattern: None, .. } => vec![BASE, TEXT],
        Kind::Text { pattern: Some(_), .. } => vec![BASE, TEXT, PATTERN],
        Kind::Integer => vec![BASE, NUMBER, INTEGER],
        Kind::Float { .. } | Kind::Decimal => vec![BASE, NUMBER],
        Kind::Date { .. } => vec![BASE, DATE, DATE_ONLY],
        Kind::DateTime { .. } => vec![BASE, DATE, DATETIME_ONLY],
        Kind::List { .. } => vec![BASE, LIST],
        Kind::Dict { .. } => vec![BASE, DICT],
        Kind::Any | Kind::Boolean | Kind::Schema(_) => vec![BASE],
    }
}

/// Looks up `key` in the catalog of `kind`.
pub(crate) fn lookup(kind: &Kind, key: &str) -> Option<&'static str> {
    layers(kind)
        .into_iter()
        .rev()
        .find_map(|layer| layer.iter().find(|(k, _)| *k == key).map(|(_, v)| *v))
}

/// Substitutes `{name}` placeholders in `template`.
pub fn render(template: &str, params: &[(&str, String)]) -> String {
    params.iter().fold(template.to_owned(), |message, (name, value)| {
        message.replace(&format!("{{{}}}", name), value)
    })
}
