//! Fields: declarative rules that locate, coerce, validate and post-process
//! one value of a document.
//!
//! Running a field over a located raw value goes through these steps:
//!
//! 1. A *missing* value fails with `required`, unless the field is not
//!    required, in which case its default is returned untouched.
//! 2. A `null` value fails with `null`, unless the field allows nulls.
//! 3. A *blank* value (empty text, sequence or mapping) fails with `blank`,
//!    unless the field allows blanks, in which case the field's blank default
//!    is returned.
//! 4. Anything else is coerced to the field's kind, then checked by every
//!    validator in order, then refined by the kind itself, then passed through
//!    every post-process transform in order.
//!
//! Fields are built with chained options:
//!
//! ```
//! use jsonfields::{Field, Parsed};
//! use serde_json::json;
//!
//! let user_id = Field::integer().source("user").min_value(1);
//! assert_eq!(user_id.parse(&json!({ "user": "42.0" })).unwrap(), Parsed::Int(42));
//! assert!(user_id.parse(&json!({ "user": 0 })).is_err());
//! ```

use crate::coerce;
use crate::dates::ISO_8601;
use crate::errors::Error;
use crate::messages::{self, render};
use crate::parser::{Ctx, Parser};
use crate::path;
use crate::schema::Composite;
use crate::validation::ValidationError;
use crate::validators::{MaxLength, MaxValue, MinLength, MinValue, RegexValidator, Validator};
use crate::value::Parsed;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// A post-process step, applied to a value once it passed validation.
pub trait Transform: Send + Sync {
    fn apply(&self, value: Parsed) -> Parsed;
}

impl<F> Transform for F
where
    F: Fn(Parsed) -> Parsed + Send + Sync,
{
    fn apply(&self, value: Parsed) -> Parsed {
        self(value)
    }
}

#[derive(Clone)]
enum DefaultValue {
    Value(Parsed),
    Factory(Arc<dyn Fn() -> Parsed + Send + Sync>),
}

impl DefaultValue {
    fn produce(&self) -> Parsed {
        match self {
            DefaultValue::Value(value) => value.clone(),
            DefaultValue::Factory(factory) => factory(),
        }
    }
}

/// What a field coerces its value into.
#[derive(Clone)]
pub enum Kind {
    /// No coercion: the located value is returned as is.
    Any,
    Boolean,
    /// Text, optionally trimmed, optionally required to match a pattern.
    Text {
        trim_whitespace: bool,
        pattern: Option<RegexValidator>,
    },
    Integer,
    /// A float, optionally rounded to `precision` decimal digits.
    Float { precision: Option<u32> },
    Decimal,
    /// A date parsed with the first matching format.
    Date { formats: Vec<String> },
    DateTime { formats: Vec<String> },
    /// A sequence whose every element runs through `child`.
    List { child: Box<Field> },
    /// A mapping whose every value runs through `child`.
    Dict { child: Box<Field> },
    Schema(Composite),
}

impl Kind {
    pub fn label(&self) -> &'static str {
        match self {
            Kind::Any => "any",
            Kind::Boolean => "boolean",
            Kind::Text { pattern: None, .. } => "text",
            Kind::Text { pattern: Some(_), .. } => "regex",
            Kind::Integer => "integer",
            Kind::Float { .. } => "float",
            Kind::Decimal => "decimal",
            Kind::Date { .. } => "date",
            Kind::DateTime { .. } => "datetime",
            Kind::List { .. } => "list",
            Kind::Dict { .. } => "dict",
            Kind::Schema(_) => "schema",
        }
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Kind::List { child } | Kind::Dict { child } => {
                write!(f, "{}<{:?}>", self.label(), child.kind)
            }
            Kind::Schema(composite) => write!(f, "schema<{}>", composite.type_name()),
            _ => f.write_str(self.label()),
        }
    }
}

/// A declarative rule for one value of a document.
#[derive(Clone)]
pub struct Field {
    sources: Vec<String>,
    default: Option<DefaultValue>,
    required: bool,
    null: bool,
    blank: bool,
    validators: Vec<Arc<dyn Validator>>,
    post_process: Vec<Arc<dyn Transform>>,
    dialect: Option<String>,
    messages: HashMap<String, String>,
    kind: Kind,
    name: Option<String>,
    parent: Option<String>,
    defect: Option<Error>,
}

impl Field {
    pub(crate) fn with_kind(kind: Kind) -> Self {
        let mut field = Self {
            sources: Vec::new(),
            default: None,
            required: true,
            null: false,
            blank: false,
            validators: Vec::new(),
            post_process: Vec::new(),
            dialect: None,
            messages: HashMap::new(),
            kind,
            name: None,
            parent: None,
            defect: None,
        };
        field.bind_children();
        field
    }

    /// A field returning the located value without coercion.
    pub fn any() -> Self {
        Self::with_kind(Kind::Any)
    }

    /// A field coercing `true`/`t`/`yes`/`y`/`1` and `false`/`f`/`no`/`n`/`0`
    /// (in any letter case) to booleans, and anything else by truthiness.
    pub fn boolean() -> Self {
        Self::with_kind(Kind::Boolean)
    }

    /// A field coercing to text, trimming surrounding whitespace by default.
    pub fn text() -> Self {
        Self::with_kind(Kind::Text {
            trim_whitespace: true,
            pattern: None,
        })
    }

    /// A text field that must contain a match of `pattern`.
    pub fn regex(pattern: &str) -> Self {
        match RegexValidator::new(pattern) {
            Ok(validator) => Self::regex_with(validator),
            Err(err) => {
                let mut field = Self::text();
                field.defect = Some(err);
                field
            }
        }
    }

    /// Same as [`regex`](#method.regex), with a prepared validator; use this
    /// to set regex flags or an inverted match.
    pub fn regex_with(validator: RegexValidator) -> Self {
        Self::with_kind(Kind::Text {
            trim_whitespace: true,
            pattern: Some(validator),
        })
    }

    /// A whole number. Strings such as `"1.00"` are accepted, `"1.2"` is not.
    /// Values outside the `i64` range fail with the `out_of_range` message.
    pub fn integer() -> Self {
        Self::with_kind(Kind::Integer)
    }

    pub fn float() -> Self {
        Self::with_kind(Kind::Float { precision: None })
    }

    /// An arbitrary-precision decimal. Not-a-number and infinities are
    /// rejected.
    pub fn decimal() -> Self {
        Self::with_kind(Kind::Decimal)
    }

    /// A date without time of day, parsed as ISO 8601 unless
    /// [`formats`](#method.formats) says otherwise.
    pub fn date() -> Self {
        Self::with_kind(Kind::Date {
            formats: vec![ISO_8601.to_owned()],
        })
    }

    /// A date with time of day, parsed as ISO 8601 unless
    /// [`formats`](#method.formats) says otherwise.
    pub fn datetime() -> Self {
        Self::with_kind(Kind::DateTime {
            formats: vec![ISO_8601.to_owned()],
        })
    }

    /// A list whose elements pass through [`child`](#method.child), by
    /// default a nullable, blankable [`any`](#method.any) field.
    pub fn list() -> Self {
        Self::with_kind(Kind::List {
            child: Box::new(Self::default_child()),
        })
    }

    /// A mapping whose values pass through [`child`](#method.child).
    pub fn dict() -> Self {
        Self::with_kind(Kind::Dict {
            child: Box::new(Self::default_child()),
        })
    }

    fn default_child() -> Self {
        Self::any().null(true).blank(true)
    }

    /// Sets the only path expression locating this field's value.
    pub fn source<T: Into<String>>(mut self, source: T) -> Self {
        self.sources = vec![source.into()];
        self
    }

    /// Sets candidate path expressions, tried in order; the first one that
    /// locates a value wins.
    pub fn sources<I, T>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    /// The value returned when the field is missing and not required. For
    /// text, list and dictionary fields it also replaces the blank default.
    pub fn default<T: Into<Parsed>>(mut self, value: T) -> Self {
        self.default = Some(DefaultValue::Value(value.into()));
        self
    }

    /// Same as [`default`](#method.default), producing a fresh value on every
    /// use.
    pub fn default_with<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Parsed + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Factory(Arc::new(factory)));
        self
    }

    /// Whether a missing value is an error. A field that is not required
    /// must have a [`default`](#method.default).
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn null(mut self, null: bool) -> Self {
        self.null = null;
        self
    }

    pub fn blank(mut self, blank: bool) -> Self {
        self.blank = blank;
        self
    }

    /// Appends a validator. Validators run in the order they were added,
    /// including the ones added by options such as
    /// [`min_value`](#method.min_value).
    pub fn validator<V: Validator + 'static>(mut self, validator: V) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Appends a post-process transform.
    pub fn post_process<T: Transform + 'static>(mut self, transform: T) -> Self {
        self.post_process.push(Arc::new(transform));
        self
    }

    /// Pins the path dialect, by name. Unknown names fail when the field
    /// resolves its sources.
    pub fn dialect<T: Into<String>>(mut self, dialect: T) -> Self {
        self.dialect = Some(dialect.into());
        self
    }

    /// Overrides one message template of this field's catalog.
    pub fn error_message<K: Into<String>, T: Into<String>>(mut self, key: K, template: T) -> Self {
        self.messages.insert(key.into(), template.into());
        self
    }

    pub fn trim_whitespace(mut self, trim: bool) -> Self {
        match self.kind {
            Kind::Text {
                ref mut trim_whitespace,
                ..
            } => *trim_whitespace = trim,
            _ => self.misuse("trim_whitespace"),
        }
        self
    }

    pub fn min_length(self, limit: usize) -> Self {
        let validator = match self.template("min_length") {
            Some(message) => MinLength::new(limit).message(message),
            None => MinLength::new(limit),
        };
        self.validator(validator)
    }

    pub fn max_length(self, limit: usize) -> Self {
        let validator = match self.template("max_length") {
            Some(message) => MaxLength::new(limit).message(message),
            None => MaxLength::new(limit),
        };
        self.validator(validator)
    }

    pub fn min_value<T: Into<Parsed>>(self, limit: T) -> Self {
        let validator = match self.template("min_value") {
            Some(message) => MinValue::new(limit).message(message),
            None => MinValue::new(limit),
        };
        self.validator(validator)
    }

    pub fn max_value<T: Into<Parsed>>(self, limit: T) -> Self {
        let validator = match self.template("max_value") {
            Some(message) => MaxValue::new(limit).message(message),
            None => MaxValue::new(limit),
        };
        self.validator(validator)
    }

    /// Rounds float values to `digits` decimal digits.
    pub fn precision(mut self, digits: u32) -> Self {
        match self.kind {
            Kind::Float { ref mut precision } => *precision = Some(digits),
            _ => self.misuse("precision"),
        }
        self
    }

    /// Sets the candidate formats of a date field: `strftime`-style strings,
    /// or [`ISO_8601`](dates/constant.ISO_8601.html).
    pub fn formats<I, T>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let formats: Vec<String> = formats.into_iter().map(Into::into).collect();
        match self.kind {
            Kind::Date { formats: ref mut f } | Kind::DateTime { formats: ref mut f } => {
                *f = formats
            }
            _ => self.misuse("formats"),
        }
        self
    }

    /// Inverts the pattern of a [`regex`](#method.regex) field.
    pub fn inverse_match(mut self, inverse: bool) -> Self {
        match self.kind {
            Kind::Text {
                pattern: Some(ref mut pattern),
                ..
            } => *pattern = pattern.clone().inverse_match(inverse),
            _ => self.misuse("inverse_match"),
        }
        self
    }

    /// Sets the field every element of a list, or every value of a
    /// dictionary, runs through. The child must not have a source.
    pub fn child(mut self, child: Field) -> Self {
        match self.kind {
            Kind::List { child: ref mut c } | Kind::Dict { child: ref mut c } => {
                **c = child;
            }
            _ => self.misuse("child"),
        }
        self.bind_children();
        self
    }

    pub(crate) fn misuse(&mut self, option: &str) {
        if self.defect.is_none() {
            self.defect = Some(Error::InvalidOption {
                field: self.label().to_owned(),
                option: option.to_owned(),
            });
        }
    }

    /// Attaches this field to `parent` under `name`. A field without sources
    /// is then located by its name.
    pub fn bind<N: Into<String>, P: Into<String>>(&mut self, name: N, parent: P) {
        let name = name.into();
        if self.sources.is_empty() && !name.is_empty() {
            self.sources.push(name.clone());
        }
        self.name = Some(name);
        self.parent = Some(parent.into());
        self.bind_children();
    }

    fn bind_children(&mut self) {
        let parent = self.label().to_owned();
        match self.kind {
            Kind::List { ref mut child } | Kind::Dict { ref mut child } => {
                child.bind("", parent)
            }
            _ => {}
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The name of the field or schema this field is bound to.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// The path expressions locating this field's value, in the order they
    /// are tried.
    pub fn source_paths(&self) -> &[String] {
        &self.sources
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut Kind {
        &mut self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn allows_null(&self) -> bool {
        self.null
    }

    pub fn allows_blank(&self) -> bool {
        self.blank
    }

    pub fn dialect_name(&self) -> Option<&str> {
        self.dialect.as_deref()
    }

    pub(crate) fn label(&self) -> &str {
        match self.name {
            Some(ref name) if !name.is_empty() => name,
            _ => "<unbound>",
        }
    }

    /// Checks the declaration itself, recursing into children and schema
    /// fields.
    pub fn check(&self) -> Result<(), Error> {
        if let Some(ref defect) = self.defect {
            return Err(defect.clone());
        }
        if !self.required && self.default.is_none() {
            return Err(Error::MissingDefault {
                field: self.label().to_owned(),
            });
        }
        match self.kind {
            Kind::List { ref child } | Kind::Dict { ref child } => {
                if !child.sources.is_empty() {
                    return Err(Error::ChildSource {
                        field: self.label().to_owned(),
                    });
                }
                child.check()
            }
            Kind::Schema(ref composite) => composite.check(),
            _ => Ok(()),
        }
    }

    /// The message template stored under `key`, per-field overrides first.
    pub fn template(&self, key: &str) -> Option<&str> {
        self.messages
            .get(key)
            .map(String::as_str)
            .or_else(|| messages::lookup(&self.kind, key))
    }

    /// The validation failure named `key`, tagged with this field's name.
    pub(crate) fn fail(&self, key: &str, params: &[(&str, String)]) -> Error {
        match self.template(key) {
            Some(template) => Error::Invalid(
                ValidationError::new(render(template, params)).with_field(self.name()),
            ),
            None => Error::UnknownMessageKey {
                field: self.label().to_owned(),
                key: key.to_owned(),
            },
        }
    }

    /// Locates this field's raw value in `data`, trying every source in
    /// order. `Ok(None)` means no source located anything.
    pub fn find<'a>(&self, data: &'a Value) -> Result<Option<Cow<'a, Value>>, Error> {
        let config = Default::default();
        self.find_in(data, &Ctx::new(&config))
    }

    pub(crate) fn find_in<'a>(
        &self,
        data: &'a Value,
        ctx: &Ctx,
    ) -> Result<Option<Cow<'a, Value>>, Error> {
        if self.sources.is_empty() {
            if let Kind::Schema(_) = self.kind {
                return Ok(Some(Cow::Borrowed(data)));
            }
            return Err(Error::MissingSource {
                field: self.label().to_owned(),
            });
        }

        let dialect = self.dialect.as_deref().or_else(|| ctx.dialect());
        for source in &self.sources {
            match path::find(source, data, dialect) {
                Ok(found) => return Ok(Some(found)),
                Err(Error::NotFound { .. }) => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(None)
    }

    /// Locates and validates this field's value in `document`, using the
    /// default [`Config`](struct.Config.html).
    pub fn parse(&self, document: &Value) -> Result<Parsed, Error> {
        Parser::new().parse(self, document)
    }

    /// Validates an already located raw value; `None` stands for a missing
    /// value.
    pub fn run_validation(&self, raw: Option<&Value>) -> Result<Parsed, Error> {
        Parser::new().run_validation(self, raw)
    }

    pub(crate) fn run(&self, raw: Option<&Value>, ctx: &Ctx) -> Result<Parsed, Error> {
        let value = match raw {
            None => {
                if self.required {
                    return Err(self.fail("required", &[]));
                }
                return Ok(self.default_value());
            }
            Some(value) => value,
        };

        if value.is_null() {
            if !self.null {
                return Err(self.fail("null", &[]));
            }
            return Ok(Parsed::Null);
        }

        if self.is_blank(value) {
            if !self.blank {
                return Err(self.fail("blank", &[]));
            }
            return Ok(self.blank_value(value));
        }

        let value = coerce::convert(self, value, ctx)?;
        for validator in &self.validators {
            validator
                .validate(&value)
                .map_err(|err| err.or_field(self.name()))?;
        }
        let value = coerce::refine(self, value)?;
        Ok(self
            .post_process
            .iter()
            .fold(value, |value, transform| transform.apply(value)))
    }

    fn default_value(&self) -> Parsed {
        self.default
            .as_ref()
            .map(DefaultValue::produce)
            .unwrap_or(Parsed::Null)
    }

    fn is_blank(&self, value: &Value) -> bool {
        match (&self.kind, value) {
            (Kind::Boolean, _) => false,
            (
                Kind::Text {
                    trim_whitespace: true,
                    ..
                },
                Value::String(s),
            ) => s.trim().is_empty(),
            (_, Value::String(s)) => s.is_empty(),
            (_, Value::Array(items)) => items.is_empty(),
            (_, Value::Object(map)) => map.is_empty(),
            _ => false,
        }
    }

    fn blank_value(&self, value: &Value) -> Parsed {
        let blank = match self.kind {
            Kind::Text { .. } => Parsed::Text(String::new()),
            Kind::List { .. } => Parsed::List(Vec::new()),
            Kind::Dict { .. } => Parsed::Map(BTreeMap::new()),
            _ => return Parsed::Json(value.clone()),
        };
        self.default
            .as_ref()
            .map(DefaultValue::produce)
            .unwrap_or(blank)
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("sources", &self.sources)
            .field("required", &self.required)
            .field("null", &self.null)
            .field("blank", &self.blank)
            .field("dialect", &self.dialect)
            .field("validators", &self.validators.len())
            .field("post_process", &self.post_process.len())
            .finish()
    }
}
