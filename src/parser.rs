//! Run fields and schemas over documents.
//!
//! This module contains the entry point of *parsing*, the process of taking a
//! document, locating a field's raw value in it, and turning that raw value
//! into a validated [`Parsed`](../value/enum.Parsed.html) value.
//!
//! See the docs for [`Parser`](struct.Parser.html) for more.

use crate::errors::Error;
use crate::field::Field;
use crate::path::Dialect;
use crate::value::Parsed;
use serde_json::Value;
use tracing::{debug, trace};

/// Parses documents with fields and schemas.
#[derive(Debug, Default, Eq, PartialEq, Clone, Hash)]
pub struct Parser {
    config: Config,
}

impl Parser {
    /// Constructs a new parser using the default configuration.
    pub fn new() -> Self {
        Self::new_with_config(Config::default())
    }

    /// Constructs a new parser using a configuration.
    pub fn new_with_config(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Locates the value of `field` in `document`, then validates it.
    ///
    /// The declaration of `field` is checked first; a misdeclared field fails
    /// with the corresponding [`Error`](../errors/enum.Error.html) variant
    /// before the document is even looked at. Only bad input data fails with
    /// [`Error::Invalid`](../errors/enum.Error.html#variant.Invalid).
    pub fn parse(&self, field: &Field, document: &Value) -> Result<Parsed, Error> {
        field.check()?;
        let ctx = Ctx::new(&self.config);
        let raw = field.find_in(document, &ctx)?;
        trace!(field = ?field.name(), found = raw.is_some(), "located raw value");
        self.finish(field, raw.as_deref(), &ctx)
    }

    /// Validates an already located raw value. `None` stands for a value that
    /// could not be located.
    pub fn run_validation(&self, field: &Field, raw: Option<&Value>) -> Result<Parsed, Error> {
        field.check()?;
        let ctx = Ctx::new(&self.config);
        self.finish(field, raw, &ctx)
    }

    fn finish(&self, field: &Field, raw: Option<&Value>, ctx: &Ctx) -> Result<Parsed, Error> {
        let result = field.run(raw, ctx);
        if let Err(ref err) = result {
            debug!(field = ?field.name(), error = %err, "field rejected its value");
        }
        result
    }
}

/// Configuration for how parsing should proceed.
#[derive(Debug, Eq, PartialEq, Clone, Hash)]
pub struct Config {
    max_depth: usize,
    max_string_length: usize,
    dialect: Option<String>,
}

impl Config {
    /// Create a new, default `Config`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum nesting of schemas, lists and dictionaries before
    /// aborting evaluation. The default value is 32.
    ///
    /// When evaluation is aborted because of this maximum depth, parsing
    /// fails with [`Error::MaxDepthExceeded`](../errors/enum.Error.html#variant.MaxDepthExceeded)
    /// rather than with a validation failure.
    pub fn max_depth(&mut self, max_depth: usize) -> &mut Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the longest string, in characters, that numeric and date fields
    /// attempt to parse. Longer strings fail with the `max_string_length`
    /// message. The default value is 1000.
    pub fn max_string_length(&mut self, max_string_length: usize) -> &mut Self {
        self.max_string_length = max_string_length;
        self
    }

    /// Sets the path dialect used by fields that do not pin one. By default
    /// every path goes through the best available dialect.
    ///
    /// Unknown names are rejected right away, rather than on first use.
    pub fn dialect(&mut self, dialect: &str) -> Result<&mut Self, Error> {
        dialect.parse::<Dialect>()?;
        self.dialect = Some(dialect.to_owned());
        Ok(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 32,
            max_string_length: 1000,
            dialect: None,
        }
    }
}

/// The state of one evaluation: the configuration, and how deep into nested
/// fields the evaluation currently is.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Ctx<'c> {
    config: &'c Config,
    depth: usize,
}

impl<'c> Ctx<'c> {
    pub(crate) fn new(config: &'c Config) -> Self {
        Self { config, depth: 0 }
    }

    /// The context of one nesting level down.
    pub(crate) fn descend(&self) -> Result<Self, Error> {
        if self.depth == self.config.max_depth {
            return Err(Error::MaxDepthExceeded);
        }
        Ok(Self {
            config: self.config,
            depth: self.depth + 1,
        })
    }

    pub(crate) fn dialect(&self) -> Option<&'c str> {
        self.config.dialect.as_deref()
    }

    pub(crate) fn max_string_length(&self) -> usize {
        self.config.max_string_length
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn max_depth() {
        let mut config = Config::new();
        config.max_depth(1);
        let parser = Parser::new_with_config(config);

        let f = Field::list().source("x");
        assert!(parser.parse(&f, &json!({ "x": [1] })).is_ok());

        let f = Field::list().source("x").child(Field::list());
        assert_eq!(
            parser.parse(&f, &json!({ "x": [[1]] })),
            Err(Error::MaxDepthExceeded)
        );
    }

    #[test]
    fn max_string_length() {
        let mut config = Config::new();
        config.max_string_length(3);
        let parser = Parser::new_with_config(config);

        let f = Field::integer().source("x");
        assert_eq!(parser.parse(&f, &json!({ "x": "123" })), Ok(Parsed::Int(123)));
        assert_eq!(
            parser
                .parse(&f, &json!({ "x": "1234" }))
                .unwrap_err()
                .into_validation()
                .map(|err| err.flatten()),
            Some(json!(["String value too large."]))
        );
    }

    #[test]
    fn default_dialect() {
        let mut config = Config::new();
        config.dialect("pointer").unwrap();
        let parser = Parser::new_with_config(config);

        let data = json!({ "x": [1, 2] });
        let f = Field::integer().source("/x/1");
        assert_eq!(parser.parse(&f, &data), Ok(Parsed::Int(2)));

        // fields pinning their own dialect ignore the configured one
        let f = Field::integer().source("x.0").dialect("default");
        assert_eq!(parser.parse(&f, &data), Ok(Parsed::Int(1)));
    }

    #[test]
    fn unknown_dialect() {
        let mut config = Config::new();
        match config.dialect("xpath") {
            Err(Error::UnknownDialect { dialect, .. }) => assert_eq!(dialect, "xpath"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(config, Config::default());
    }

    #[test]
    fn run_validation_checks_declaration() {
        let f = Field::any().required(false);
        assert!(Parser::new().run_validation(&f, None).is_err());
    }
}
