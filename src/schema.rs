//! Schemas: named groups of fields, validated together.
//!
//! A [`SchemaType`](struct.SchemaType.html) is an immutable declaration: an
//! ordered list of named fields, optional per-field refinements, and an
//! optional result assembler. Declarations are built with a
//! [`SchemaBuilder`](struct.SchemaBuilder.html), and may extend one another;
//! a field redeclared under an inherited name replaces the inherited one in
//! place.
//!
//! A [`Schema`](struct.Schema.html) is one instance of a schema type. It is a
//! field in its own right, so schemas nest into other schemas, lists and
//! dictionaries.
//!
//! ```
//! use jsonfields::{Field, Parsed, Schema, SchemaType};
//! use serde_json::json;
//!
//! let point = SchemaType::builder("Point")
//!     .field("x", Field::integer())
//!     .field("y", Field::integer())
//!     .build()
//!     .unwrap();
//!
//! let parsed = Schema::new(&point).unwrap().parse(&json!({ "x": 1, "y": "2" })).unwrap();
//! assert_eq!(parsed.get("y"), Some(&Parsed::Int(2)));
//! ```

use crate::errors::Error;
use crate::field::{Field, Kind};
use crate::parser::{Ctx, Parser};
use crate::validation::ValidationError;
use crate::value::Parsed;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// An extra check of one field's validated value, declared on the schema.
pub type Refinement = Arc<dyn Fn(Parsed) -> Result<Parsed, ValidationError> + Send + Sync>;

/// Turns the validated mapping of a schema into its final value.
pub type Assemble = Arc<dyn Fn(BTreeMap<String, Parsed>) -> Parsed + Send + Sync>;

struct Declaration {
    name: String,
    fields: Vec<(String, Field)>,
    refinements: HashMap<String, Refinement>,
    result: Option<Assemble>,
}

/// An immutable schema declaration.
#[derive(Clone)]
pub struct SchemaType(Arc<Declaration>);

impl SchemaType {
    /// Starts a declaration without inherited fields.
    pub fn builder<N: Into<String>>(name: N) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
            refinements: HashMap::new(),
            result: None,
        }
    }

    /// Starts a declaration inheriting the fields, refinements and result
    /// assembler of `self`.
    pub fn extend<N: Into<String>>(&self, name: N) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: self.0.fields.clone(),
            refinements: self.0.refinements.clone(),
            result: self.0.result.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// The declared field names, in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.fields.iter().map(|(name, _)| name.as_str())
    }

    /// The unbound declaration of the field named `name`.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.0
            .fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, field)| field)
    }
}

impl fmt::Debug for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SchemaType")
            .field("name", &self.0.name)
            .field("fields", &self.field_names().collect::<Vec<_>>())
            .finish()
    }
}

/// Builds a [`SchemaType`](struct.SchemaType.html).
pub struct SchemaBuilder {
    name: String,
    fields: Vec<(String, Field)>,
    refinements: HashMap<String, Refinement>,
    result: Option<Assemble>,
}

impl SchemaBuilder {
    /// Declares `field` under `name`. A field already declared under `name`
    /// is replaced, keeping its position.
    pub fn field<N: Into<String>>(mut self, name: N, field: Field) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = field,
            None => self.fields.push((name, field)),
        }
        self
    }

    /// Registers a refinement of the field named `name`, run after the field
    /// itself validated its value.
    pub fn refine<N, F>(mut self, name: N, refinement: F) -> Self
    where
        N: Into<String>,
        F: Fn(Parsed) -> Result<Parsed, ValidationError> + Send + Sync + 'static,
    {
        self.refinements.insert(name.into(), Arc::new(refinement));
        self
    }

    /// Sets the default result assembler of the schema type.
    pub fn result<F>(mut self, assemble: F) -> Self
    where
        F: Fn(BTreeMap<String, Parsed>) -> Parsed + Send + Sync + 'static,
    {
        self.result = Some(Arc::new(assemble));
        self
    }

    /// Checks every declared field and refinement, and seals the
    /// declaration.
    pub fn build(self) -> Result<SchemaType, Error> {
        for (name, field) in &self.fields {
            let mut bound = field.clone();
            bound.bind(name.as_str(), self.name.as_str());
            bound.check()?;
        }

        let mut refined: Vec<&String> = self.refinements.keys().collect();
        refined.sort();
        if let Some(name) = refined
            .into_iter()
            .find(|name| !self.fields.iter().any(|(n, _)| n == *name))
        {
            return Err(Error::UnknownField {
                schema: self.name,
                field: name.clone(),
            });
        }

        Ok(SchemaType(Arc::new(Declaration {
            name: self.name,
            fields: self.fields,
            refinements: self.refinements,
            result: self.result,
        })))
    }
}

#[derive(Clone)]
struct Bound {
    field: Field,
    refine: Option<Refinement>,
}

/// The fields of one schema instance, bound to it.
#[derive(Clone)]
pub struct Composite {
    type_name: String,
    fields: Vec<Bound>,
    result: Option<Assemble>,
}

impl Composite {
    fn instantiate(schema_type: &SchemaType) -> Self {
        let declaration = &schema_type.0;
        let fields = declaration
            .fields
            .iter()
            .map(|(name, field)| {
                let mut field = field.clone();
                field.bind(name.as_str(), declaration.name.as_str());
                Bound {
                    field,
                    refine: declaration.refinements.get(name).cloned(),
                }
            })
            .collect();

        Self {
            type_name: declaration.name.clone(),
            fields,
            result: declaration.result.clone(),
        }
    }

    /// The name of the schema type this instance was created from.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The bound fields, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().map(|bound| &bound.field)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields().find(|field| field.name() == Some(name))
    }

    pub fn check(&self) -> Result<(), Error> {
        self.fields.iter().try_for_each(|bound| bound.field.check())
    }

    /// Runs every field over `value`. Validation failures of all fields are
    /// collected under the name of `owner`; any other error aborts at once.
    pub(crate) fn coerce(&self, owner: &Field, value: &Value, ctx: &Ctx) -> Result<Parsed, Error> {
        let ctx = ctx.descend()?;
        let mut parsed = BTreeMap::new();
        let mut errors = Vec::new();

        for Bound { field, refine } in &self.fields {
            let raw = field.find_in(value, &ctx)?;
            let result = field.run(raw.as_deref(), &ctx).and_then(|value| match refine {
                Some(refine) => refine(value).map_err(|err| Error::Invalid(err.or_field(field.name()))),
                None => Ok(value),
            });

            match result {
                Ok(value) => {
                    if let Some(name) = field.name() {
                        parsed.insert(name.to_owned(), value);
                    }
                }
                Err(Error::Invalid(err)) => errors.push(err.or_field(field.name())),
                Err(err) => return Err(err),
            }
        }

        if !errors.is_empty() {
            debug!(
                schema = self.type_name.as_str(),
                failed = errors.len(),
                "schema rejected its value"
            );
            return Err(Error::Invalid(
                ValidationError::nested(errors).with_field(owner.name()),
            ));
        }

        Ok(match self.result {
            Some(ref assemble) => assemble(parsed),
            None => Parsed::Map(parsed),
        })
    }
}

impl fmt::Debug for Composite {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Composite")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields().collect::<Vec<_>>())
            .finish()
    }
}

impl Field {
    /// A field validating a nested document with a fresh instance of
    /// `schema_type`. Without a source, the field takes the whole value it
    /// is given.
    pub fn schema(schema_type: &SchemaType) -> Self {
        Self::with_kind(Kind::Schema(Composite::instantiate(schema_type)))
    }

    /// Overrides the result assembler of a schema field.
    pub fn result<F>(mut self, assemble: F) -> Self
    where
        F: Fn(BTreeMap<String, Parsed>) -> Parsed + Send + Sync + 'static,
    {
        match self.kind_mut() {
            Kind::Schema(composite) => composite.result = Some(Arc::new(assemble)),
            _ => self.misuse("result"),
        }
        self
    }
}

/// An instance of a [`SchemaType`](struct.SchemaType.html), ready to parse
/// documents.
#[derive(Clone, Debug)]
pub struct Schema {
    root: Field,
}

impl Schema {
    /// An instance of `schema_type` reading the whole document.
    pub fn new(schema_type: &SchemaType) -> Result<Self, Error> {
        Self::from_field(Field::schema(schema_type))
    }

    /// An instance configured like any other field, e.g. with a source:
    ///
    /// ```
    /// # use jsonfields::{Field, Schema, SchemaType};
    /// # let point = SchemaType::builder("Point").field("x", Field::integer()).build().unwrap();
    /// let schema = Schema::from_field(Field::schema(&point).source("shapes[0].origin")).unwrap();
    /// ```
    pub fn from_field(field: Field) -> Result<Self, Error> {
        match field.kind() {
            Kind::Schema(_) => {}
            _ => {
                return Err(Error::NotSchema {
                    field: field.label().to_owned(),
                })
            }
        }
        field.check()?;
        Ok(Self { root: field })
    }

    pub fn type_name(&self) -> &str {
        match self.root.kind() {
            Kind::Schema(composite) => composite.type_name(),
            _ => "",
        }
    }

    /// The bound field named `name`.
    pub fn field(&self, name: &str) -> Option<&Field> {
        match self.root.kind() {
            Kind::Schema(composite) => composite.field(name),
            _ => None,
        }
    }

    pub fn field_names(&self) -> Vec<&str> {
        match self.root.kind() {
            Kind::Schema(composite) => composite.fields().filter_map(Field::name).collect(),
            _ => Vec::new(),
        }
    }

    pub fn as_field(&self) -> &Field {
        &self.root
    }

    pub fn into_field(self) -> Field {
        self.root
    }

    /// Parses `document` with the default [`Config`](../parser/struct.Config.html).
    pub fn parse(&self, document: &Value) -> Result<Parsed, Error> {
        Parser::new().parse(&self.root, document)
    }

    /// Wraps a function producing documents into one producing parsed
    /// values.
    ///
    /// ```
    /// # use jsonfields::{Field, Parsed, Schema, SchemaType};
    /// # use serde_json::json;
    /// let user = SchemaType::builder("User").field("id", Field::integer()).build().unwrap();
    /// let lookup = Schema::new(&user).unwrap().decorate(|id: i64| json!({ "id": id }));
    /// assert_eq!(lookup(7).unwrap().get("id"), Some(&Parsed::Int(7)));
    /// ```
    pub fn decorate<A, F>(&self, produce: F) -> impl Fn(A) -> Result<Parsed, Error>
    where
        F: Fn(A) -> Value,
    {
        let schema = self.clone();
        move |args: A| schema.parse(&produce(args))
    }
}
