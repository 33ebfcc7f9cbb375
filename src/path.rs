//! Locate values inside documents.
//!
//! A path expression is resolved by a *dialect*. The `default` dialect walks a
//! dot-separated path, one token at a time:
//!
//! * `?` matches the first entry of a mapping,
//! * an integer indexes into a sequence (negative integers count from the
//!   end),
//! * anything else is a literal key; quoting a segment (`"1"` or `'1'`) forces
//!   it to be read as a key.
//!
//! The `jmespath` dialect (behind the `jmespath` cargo feature) delegates to a
//! [JMESPath](http://jmespath.org) evaluator, and the `pointer` dialect reads
//! [RFC 6901](https://tools.ietf.org/html/rfc6901) JSON Pointers. When no
//! dialect is named, the richest one compiled in is used.

use crate::errors::Error;
use json_pointer::JsonPointer;
use serde_json::Value;
use std::borrow::Cow;
use std::str::FromStr;
use tracing::trace;

/// A path expression of the `default` dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    source: String,
    delimiter: String,
    allow_null: bool,
}

/// A single step of a [`Path`](struct.Path.html).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Key(&'a str),
    Index(i64),
    Any,
}

impl<'a> Token<'a> {
    /// Classifies one segment of a path expression.
    pub fn parse(segment: &'a str) -> Self {
        if segment == "?" {
            return Token::Any;
        }
        if let Ok(index) = segment.trim().parse::<i64>() {
            return Token::Index(index);
        }
        Token::Key(unquote(segment))
    }
}

impl Path {
    pub fn new<T: Into<String>>(source: T) -> Self {
        Self {
            source: source.into(),
            delimiter: ".".to_owned(),
            allow_null: false,
        }
    }

    /// Sets the string separating tokens. The default is `.`.
    pub fn delimiter<T: Into<String>>(mut self, delimiter: T) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Sets whether an explicit `null` at the end of the path counts as found.
    /// By default it does not, so a `null` value looks exactly like a missing
    /// one.
    pub fn allow_null(mut self, allow_null: bool) -> Self {
        self.allow_null = allow_null;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The tokens of this path, in order.
    pub fn tokens(&self) -> Vec<Token> {
        self.source.split(self.delimiter.as_str()).map(Token::parse).collect()
    }

    /// Walks `data` along this path.
    pub fn find<'a>(&self, data: &'a Value) -> Result<Cow<'a, Value>, Error> {
        self.walk(&self.source, Cow::Borrowed(data))
    }

    fn walk<'a>(&self, path: &str, data: Cow<'a, Value>) -> Result<Cow<'a, Value>, Error> {
        let (head, tail) = match path.find(self.delimiter.as_str()) {
            Some(at) => (&path[..at], Some(&path[at + self.delimiter.len()..])),
            None => (path, None),
        };

        let found = match data {
            Cow::Borrowed(data) => eval(Token::parse(head), data),
            Cow::Owned(data) => eval(Token::parse(head), &data).map(|v| Cow::Owned(v.into_owned())),
        }
        .ok_or_else(|| self.not_found())?;

        match tail {
            Some(tail) if !tail.is_empty() => self.walk(tail, found),
            _ => {
                if found.is_null() && !self.allow_null {
                    return Err(self.not_found());
                }
                Ok(found)
            }
        }
    }

    fn not_found(&self) -> Error {
        Error::NotFound {
            source: self.source.clone(),
        }
    }
}

fn unquote(segment: &str) -> &str {
    let bytes = segment.as_bytes();
    if bytes.len() >= 2
        && (bytes[0] == b'"' || bytes[0] == b'\'')
        && bytes[0] == bytes[bytes.len() - 1]
    {
        &segment[1..segment.len() - 1]
    } else {
        segment
    }
}

fn eval<'a>(token: Token, data: &'a Value) -> Option<Cow<'a, Value>> {
    match (data, token) {
        (Value::Array(items), Token::Index(i)) => {
            let i = if i < 0 { items.len() as i64 + i } else { i };
            if i < 0 {
                return None;
            }
            items.get(i as usize).map(Cow::Borrowed)
        }
        (Value::String(s), Token::Index(i)) => {
            let len = s.chars().count() as i64;
            let i = if i < 0 { len + i } else { i };
            if i < 0 {
                return None;
            }
            s.chars()
                .nth(i as usize)
                .map(|c| Cow::Owned(Value::String(c.to_string())))
        }
        (Value::Object(map), Token::Any) => map.values().next().map(Cow::Borrowed),
        (Value::Object(map), Token::Key(key)) => map.get(key).map(Cow::Borrowed),
        _ => None,
    }
}

/// The path languages a field can be resolved with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// The delegate dialect when it is compiled in, `Default` otherwise.
    Best,
    Default,
    Pointer,
    #[cfg(feature = "jmespath")]
    Jmespath,
}

impl Dialect {
    /// The names accepted by [`from_str`](#method.from_str).
    pub fn names() -> &'static [&'static str] {
        &[
            "default",
            "pointer",
            #[cfg(feature = "jmespath")]
            "jmespath",
        ]
    }

    /// Resolves `source` against `data` in this dialect.
    pub fn find<'a>(self, source: &str, data: &'a Value) -> Result<Cow<'a, Value>, Error> {
        trace!(source, dialect = ?self, "resolving path");
        match self {
            Dialect::Best => best_find(source, data),
            Dialect::Default => Path::new(source).find(data),
            Dialect::Pointer => pointer_find(source, data),
            #[cfg(feature = "jmespath")]
            Dialect::Jmespath => jmespath_find(source, data),
        }
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "default" => Ok(Dialect::Default),
            "pointer" => Ok(Dialect::Pointer),
            #[cfg(feature = "jmespath")]
            "jmespath" => Ok(Dialect::Jmespath),
            _ => Err(Error::UnknownDialect {
                dialect: name.to_owned(),
                allowed: Dialect::names()
                    .iter()
                    .map(|name| format!("'{}'", name))
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }
}

/// Resolves `source` against `data` in the dialect registered as `dialect`,
/// or in the best available dialect when `dialect` is `None`.
pub fn find<'a>(
    source: &str,
    data: &'a Value,
    dialect: Option<&str>,
) -> Result<Cow<'a, Value>, Error> {
    let dialect = match dialect {
        Some(name) => name.parse()?,
        None => Dialect::Best,
    };
    dialect.find(source, data)
}

#[cfg(feature = "jmespath")]
fn best_find<'a>(source: &str, data: &'a Value) -> Result<Cow<'a, Value>, Error> {
    jmespath_find(source, data)
}

#[cfg(not(feature = "jmespath"))]
fn best_find<'a>(source: &str, data: &'a Value) -> Result<Cow<'a, Value>, Error> {
    Path::new(source).find(data)
}

// JMESPath cannot tell a missing value from an explicit null, so both are
// reported as not found.
#[cfg(feature = "jmespath")]
fn jmespath_find<'a>(source: &str, data: &'a Value) -> Result<Cow<'a, Value>, Error> {
    let invalid = |reason: String| Error::InvalidQuery {
        query: source.to_owned(),
        reason,
    };

    let expr = jmespath::compile(source).map_err(|err| invalid(err.to_string()))?;
    let found = expr
        .search(data.clone())
        .map_err(|err| invalid(err.to_string()))?;
    if found.is_null() {
        return Err(Error::NotFound {
            source: source.to_owned(),
        });
    }

    serde_json::to_value(&*found)
        .map(Cow::Owned)
        .map_err(|err| invalid(err.to_string()))
}

fn pointer_find<'a>(source: &str, data: &'a Value) -> Result<Cow<'a, Value>, Error> {
    let pointer = source
        .parse::<JsonPointer<String, Vec<String>>>()
        .map_err(|err| Error::InvalidQuery {
            query: source.to_owned(),
            reason: format!("{:?}", err),
        })?;

    match pointer.get(data) {
        Ok(found) if !found.is_null() => Ok(Cow::Borrowed(found)),
        _ => Err(Error::NotFound {
            source: source.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_path() {
        let data = json!({ "x": { "y": [1, 2], "1": [3, 4], "?": "any" } });

        assert_eq!(*Path::new("x.y.1").find(&data).unwrap(), json!(2));
        assert_eq!(*Path::new("x.\"1\".0").find(&data).unwrap(), json!(3));
        assert_eq!(*Path::new("x.'1'.-1").find(&data).unwrap(), json!(4));
        assert_eq!(*Path::new("x.\"?\"").find(&data).unwrap(), json!("any"));
        assert_eq!(*Path::new("?.y.0").find(&data).unwrap(), json!(1));
        assert!(Path::new("x.z").find(&data).unwrap_err().is_not_found());
        assert!(Path::new("x.y.z").find(&data).unwrap_err().is_not_found());
        assert!(Path::new("x.1").find(&data).unwrap_err().is_not_found());
        assert!(Path::new("x.y.5").find(&data).unwrap_err().is_not_found());
        assert!(Path::new("x.y.\"1\"").find(&data).unwrap_err().is_not_found());
    }

    #[test]
    fn explicit_null() {
        let data = json!({ "x": null });
        assert!(Path::new("x").find(&data).unwrap_err().is_not_found());
        assert_eq!(*Path::new("x").allow_null(true).find(&data).unwrap(), Value::Null);
    }

    #[test]
    fn custom_delimiter() {
        let data = json!({ "a.b": { "c": [true] } });
        assert_eq!(*Path::new("a.b/c/0").delimiter("/").find(&data).unwrap(), json!(true));
    }

    #[test]
    fn strings_are_sequences() {
        let data = json!({ "name": "abc" });
        assert_eq!(*Path::new("name.0").find(&data).unwrap(), json!("a"));
        assert!(Path::new("name.key").find(&data).unwrap_err().is_not_found());
    }

    #[test]
    fn tokens() {
        assert_eq!(
            Path::new("a.?.-2.\"3\"").tokens(),
            vec![Token::Key("a"), Token::Any, Token::Index(-2), Token::Key("3")]
        );
    }

    #[test]
    fn dialects() {
        let data = json!({ "x": { "y": 1, "z": [3, 4] } });

        assert_eq!(*find("x.y", &data, None).unwrap(), json!(1));
        assert_eq!(*find("x.y", &data, Some("default")).unwrap(), json!(1));
        assert_eq!(*find("/x/z/1", &data, Some("pointer")).unwrap(), json!(4));
        assert!(find("/x/w", &data, Some("pointer")).unwrap_err().is_not_found());

        match find("x.y", &data, Some("dummy")) {
            Err(Error::UnknownDialect { dialect, allowed }) => {
                assert_eq!(dialect, "dummy");
                assert!(allowed.contains("'default'"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[cfg(feature = "jmespath")]
    #[test]
    fn jmespath_dialect() {
        let data = json!({ "sku": ["001-001", "002-002"], "none": null });

        assert_eq!(*find("sku[0]", &data, Some("jmespath")).unwrap(), json!("001-001"));
        assert_eq!(*find("sku[*] | [1]", &data, None).unwrap(), json!("002-002"));
        assert!(find("none", &data, Some("jmespath")).unwrap_err().is_not_found());
        assert!(find("missing", &data, Some("jmespath")).unwrap_err().is_not_found());
    }
}
