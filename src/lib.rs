//! `jsonfields` extracts typed, validated values out of loosely structured
//! JSON documents.
//!
//! Every value of interest is described by a [`Field`](field/struct.Field.html):
//! where to find it (one or more path expressions), what it should be coerced
//! into, and which rules it must satisfy. Fields are grouped into
//! [`Schema`s](schema/struct.Schema.html), which nest into one another and
//! report every failure of every field at once.
//!
//! # Parsing documents
//!
//! ```
//! use serde_json::json;
//! use jsonfields::{Error, Field, Parsed, Schema, SchemaType};
//!
//! fn main() -> Result<(), Error> {
//!     let review = SchemaType::builder("Review")
//!         .field("user_id", Field::integer().source("user").min_value(1))
//!         .field("text", Field::text())
//!         .field("verified", Field::boolean().required(false).default(false))
//!         .build()?;
//!
//!     let item = SchemaType::builder("Item")
//!         .field("id", Field::integer())
//!         .field("price", Field::float().source("details.price").min_value(0))
//!         .field(
//!             "reviews",
//!             Field::list().source("reviews.top").child(Field::schema(&review)),
//!         )
//!         .build()?;
//!
//!     let schema = Schema::new(&item)?;
//!
//!     // Values are located, coerced and validated. Missing optional fields
//!     // fall back to their default.
//!     let input_ok = json!({
//!         "id": "123",
//!         "details": { "price": 0.99 },
//!         "reviews": { "top": [{ "user": 1, "text": "  Good item!  " }] }
//!     });
//!
//!     let parsed = schema.parse(&input_ok)?;
//!     assert_eq!(parsed.get("id"), Some(&Parsed::Int(123)));
//!     assert_eq!(
//!         parsed.to_json(),
//!         json!({
//!             "id": 123,
//!             "price": 0.99,
//!             "reviews": [{ "text": "Good item!", "user_id": 1, "verified": false }]
//!         })
//!     );
//!
//!     // Every failing field is reported, keyed by its name. Nested schemas,
//!     // lists and dictionaries nest their failures the same way.
//!     let input_bad = json!({
//!         "details": { "price": -1 },
//!         "reviews": { "top": [{ "user": 0, "text": "Bad item!" }] }
//!     });
//!
//!     let err = schema.parse(&input_bad).unwrap_err();
//!     assert_eq!(
//!         err.validation().map(|err| err.flatten()),
//!         Some(json!([
//!             { "id": ["This field is required."] },
//!             { "price": ["Ensure this field is greater than or equal to 0."] },
//!             { "reviews": [{ "user_id": ["Ensure this field is greater than or equal to 1."] }] }
//!         ]))
//!     );
//!
//!     Ok(())
//! }
//! ```
//!
//! Only bad input data fails with [`Error::Invalid`](errors/enum.Error.html#variant.Invalid).
//! A misdeclared field, such as an optional field without a default, fails
//! with its own [`Error`](errors/enum.Error.html) variant before any document
//! is read.
//!
//! # Path dialects
//!
//! Path expressions are resolved by the dialect a field names, or by the
//! dialect configured on the [`Parser`](parser/struct.Parser.html). See the
//! [`path`](path/index.html) module for the available dialects.

mod coerce;

pub mod dates;
pub mod errors;
pub mod field;
pub mod messages;
pub mod parser;
pub mod path;
pub mod schema;
pub mod validation;
pub mod validators;
pub mod value;

pub use crate::errors::Error;
pub use crate::field::{Field, Kind, Transform};
pub use crate::parser::{Config, Parser};
pub use crate::path::{Dialect, Path};
pub use crate::schema::{Schema, SchemaBuilder, SchemaType};
pub use crate::validation::{Message, ValidationError};
pub use crate::validators::{
    ChoiceValidator, MaxLength, MaxValue, MinLength, MinValue, RegexValidator, Validator,
};
pub use crate::value::Parsed;
