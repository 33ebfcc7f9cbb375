//! Validation failures.
//!
//! A [`ValidationError`](struct.ValidationError.html) is a tree: leaves are
//! plain messages, internal nodes wrap the failures of nested fields. Every
//! node may carry the name of the field it belongs to.

use failure::Fail;
use serde_json::{Map, Value};
use std::fmt;

/// A user-facing validation failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    messages: Vec<Message>,
    field_name: Option<String>,
}

/// One entry of a [`ValidationError`](struct.ValidationError.html).
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Text(String),
    Nested(ValidationError),
}

impl ValidationError {
    /// A failure holding a single, untagged message.
    pub fn new<T: Into<String>>(message: T) -> Self {
        Self {
            messages: vec![Message::Text(message.into())],
            field_name: None,
        }
    }

    /// An untagged failure wrapping the failures of several nested fields.
    pub fn nested(errors: Vec<ValidationError>) -> Self {
        Self {
            messages: errors.into_iter().map(Message::Nested).collect(),
            field_name: None,
        }
    }

    /// Tags this failure with the name of the field it belongs to.
    pub fn with_field<T: Into<String>>(mut self, field_name: Option<T>) -> Self {
        self.field_name = field_name.map(Into::into);
        self
    }

    /// Tags this failure only if no field claimed it yet.
    pub(crate) fn or_field(self, field_name: Option<&str>) -> Self {
        if self.field_name.is_some() {
            self
        } else {
            self.with_field(field_name)
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Same as [`messages`](#method.messages), but moves ownership.
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    pub fn field_name(&self) -> Option<&str> {
        self.field_name.as_deref()
    }

    /// A serializable view of the failure tree.
    ///
    /// Leaves become strings and every tagged node becomes a one-entry
    /// object mapping its field name to the list of its flattened messages.
    /// An untagged top-level failure, as raised by a schema parsing a whole
    /// document, is unwrapped to the list itself:
    ///
    /// ```
    /// use jsonfields::ValidationError;
    /// use serde_json::json;
    ///
    /// let err = ValidationError::nested(vec![
    ///     ValidationError::new("This field is required.").with_field(Some("id")),
    /// ]);
    /// assert_eq!(err.flatten(), json!([{ "id": ["This field is required."] }]));
    /// ```
    pub fn flatten(&self) -> Value {
        let messages = Value::Array(self.messages.iter().map(Message::flatten).collect());
        match self.field_name {
            None => messages,
            Some(ref name) => {
                let mut node = Map::new();
                node.insert(name.clone(), messages);
                Value::Object(node)
            }
        }
    }
}

impl Message {
    fn flatten(&self) -> Value {
        match self {
            Message::Text(text) => Value::String(text.clone()),
            Message::Nested(err) => {
                let messages = err.messages.iter().map(Message::flatten).collect();
                let mut node = Map::new();
                node.insert(
                    err.field_name.clone().unwrap_or_default(),
                    Value::Array(messages),
                );
                Value::Object(node)
            }
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.flatten())
    }
}

impl Fail for ValidationError {}
