//! Strict-schema snapshot normalization.
//!
//! The permissive [`Normalizer`] accepts any tree.  That is convenient, but it
//! also means a regression that *drops* a field produces a perfectly valid,
//! just different, snapshot.  The strict variant first checks the tree against
//! a [`Schema`]: a set of named object shapes, each listing which properties
//! are permitted, which are required, and what kind of value each holds.
//!
//! # Violations are batched
//!
//! Validation never stops at the first problem.  Every violation is collected
//! with a JSONPath-like location and returned together in one
//! [`SchemaViolations`] error:
//!
//! ```text
//! $.title: required field is missing.
//! $.rootComponent.children[2].transform: expected 13 elements but found 12.
//! $.rootComponent.colour: property is not permitted on Component.
//! ```
//!
//! # Output order
//!
//! After validation the tree is rebuilt with each object's keys in the order
//! its shape declares them, so the canonical text does not depend on the order
//! the exporter happened to write properties in.  Values typed
//! [`FieldKind::Any`] fall back to the permissive rules.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::snapshot::normalize::{
    is_identifier_key, order_by_identity, NormalizeOptions, Normalizer,
};
use crate::snapshot::{parse_text, to_canonical_text, SnapshotError};

// ── Schema model ──────────────────────────────────────────────────────────────

/// The kind of value a field must hold.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// A JSON string.
    String,
    /// Any JSON number (integer or floating point).
    Number,
    /// `true` or `false`.
    Boolean,
    /// Anything; normalized permissively and not validated further.
    Any,
    /// An object validated against the named [`ObjectShape`].
    Object(String),
    /// An array whose every element has the given kind.
    Array(Box<FieldKind>),
    /// An array of exactly `len` elements of the given kind.
    FixedArray(Box<FieldKind>, usize),
}

impl FieldKind {
    /// Shorthand for [`FieldKind::Object`].
    pub fn object(shape: impl Into<String>) -> Self {
        Self::Object(shape.into())
    }

    /// Shorthand for [`FieldKind::Array`].
    pub fn array_of(item: FieldKind) -> Self {
        Self::Array(Box::new(item))
    }

    /// Shorthand for [`FieldKind::FixedArray`].
    pub fn fixed_array_of(item: FieldKind, len: usize) -> Self {
        Self::FixedArray(Box::new(item), len)
    }
}

/// One permitted property of an object shape.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
}

/// The permitted properties of one object type, in output order.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectShape {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

impl ObjectShape {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a required field.
    pub fn required(self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.with_field(name, kind, true)
    }

    /// Appends an optional field.  An explicit `null` counts as absent.
    pub fn optional(self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.with_field(name, kind, false)
    }

    fn with_field(mut self, name: impl Into<String>, kind: FieldKind, required: bool) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            kind,
            required,
        });
        self
    }

    /// Looks up a field by exact property name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A set of object shapes plus the name of the root shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    root: String,
    shapes: BTreeMap<String, ObjectShape>,
}

impl Schema {
    /// Creates an empty schema whose root object has shape `root`.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            shapes: BTreeMap::new(),
        }
    }

    /// Adds (or replaces) a shape.
    pub fn with_shape(mut self, shape: ObjectShape) -> Self {
        self.shapes.insert(shape.name.clone(), shape);
        self
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn shape(&self, name: &str) -> Option<&ObjectShape> {
        self.shapes.get(name)
    }

    /// The built-in schema for an exported assembly tree.
    ///
    /// ```text
    /// AssemblyDocument { title, units?, activeConfiguration?, rootComponent }
    /// Component        { name, referencePath?, configuration?, suppressed?, visible?,
    ///                    transform?[13], massProperties?, properties?[], children[] }
    /// MassProperties   { mass, volume, surfaceArea?, centerOfMass?[3] }
    /// CustomProperty   { name, value }
    /// ```
    pub fn assembly() -> Self {
        Self::new("AssemblyDocument")
            .with_shape(
                ObjectShape::new("AssemblyDocument")
                    .required("title", FieldKind::String)
                    .optional("units", FieldKind::String)
                    .optional("activeConfiguration", FieldKind::String)
                    .required("rootComponent", FieldKind::object("Component")),
            )
            .with_shape(
                ObjectShape::new("Component")
                    .required("name", FieldKind::String)
                    .optional("referencePath", FieldKind::String)
                    .optional("configuration", FieldKind::String)
                    .optional("suppressed", FieldKind::Boolean)
                    .optional("visible", FieldKind::Boolean)
                    .optional("transform", FieldKind::fixed_array_of(FieldKind::Number, 13))
                    .optional("massProperties", FieldKind::object("MassProperties"))
                    .optional(
                        "properties",
                        FieldKind::array_of(FieldKind::object("CustomProperty")),
                    )
                    .required("children", FieldKind::array_of(FieldKind::object("Component"))),
            )
            .with_shape(
                ObjectShape::new("MassProperties")
                    .required("mass", FieldKind::Number)
                    .required("volume", FieldKind::Number)
                    .optional("surfaceArea", FieldKind::Number)
                    .optional("centerOfMass", FieldKind::fixed_array_of(FieldKind::Number, 3)),
            )
            .with_shape(
                ObjectShape::new("CustomProperty")
                    .required("name", FieldKind::String)
                    .required("value", FieldKind::Any),
            )
    }
}

// ── Violations ────────────────────────────────────────────────────────────────

/// One schema rule broken at one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// JSONPath-like location, e.g. `$.rootComponent.children[0].name`.
    pub path: String,
    /// Human-readable rule description, ending in a full stop.
    pub message: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every violation found in one validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolations {
    violations: Vec<SchemaViolation>,
}

impl SchemaViolations {
    pub fn violations(&self) -> &[SchemaViolation] {
        &self.violations
    }

    /// The violations rendered as `"<path>: <message>"` strings.
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }
}

impl fmt::Display for SchemaViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "snapshot does not match schema ({} violation(s))",
            self.violations.len()
        )?;
        for violation in &self.violations {
            write!(f, "\n  {violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaViolations {}

// ── Strict normalizer ─────────────────────────────────────────────────────────

/// Validates a tree against a [`Schema`] and then canonicalizes it.
#[derive(Debug, Clone)]
pub struct StrictNormalizer {
    schema: Schema,
    normalizer: Normalizer,
}

impl StrictNormalizer {
    pub fn new(schema: Schema, options: NormalizeOptions) -> Self {
        Self {
            schema,
            normalizer: Normalizer::new(options),
        }
    }

    /// A strict normalizer for [`Schema::assembly`] with default options.
    pub fn assembly() -> Self {
        Self::new(Schema::assembly(), NormalizeOptions::default())
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Checks `value` against the root shape.
    ///
    /// # Errors
    ///
    /// Returns every violation found, in document order.
    pub fn validate(&self, value: &Value) -> Result<(), SchemaViolations> {
        let mut violations = Vec::new();
        let root = FieldKind::Object(self.schema.root.clone());
        self.validate_value(value, &root, "$", &mut violations);
        if violations.is_empty() {
            Ok(())
        } else {
            debug!("schema validation found {} violation(s)", violations.len());
            Err(SchemaViolations { violations })
        }
    }

    /// Validates and canonicalizes `value`.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Schema`] carrying every violation if the tree
    /// does not match the schema.
    pub fn normalize_value(&self, value: &Value) -> Result<Value, SnapshotError> {
        self.validate(value)?;
        let root = FieldKind::Object(self.schema.root.clone());
        Ok(self.rebuild(value, &root))
    }

    /// Parses, validates and canonicalizes `text`.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::InvalidJson`] or [`SnapshotError::Schema`].
    pub fn normalize_text(&self, text: &str) -> Result<String, SnapshotError> {
        let value = parse_text(text)?;
        to_canonical_text(&self.normalize_value(&value)?)
    }

    /// Serializes `model`, validates and canonicalizes it.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Serialize`] or [`SnapshotError::Schema`].
    pub fn normalize<T: Serialize + ?Sized>(&self, model: &T) -> Result<String, SnapshotError> {
        let value = serde_json::to_value(model).map_err(SnapshotError::Serialize)?;
        to_canonical_text(&self.normalize_value(&value)?)
    }

    fn validate_value(
        &self,
        value: &Value,
        kind: &FieldKind,
        path: &str,
        out: &mut Vec<SchemaViolation>,
    ) {
        let violation = |message: String| SchemaViolation {
            path: path.to_string(),
            message,
        };

        match kind {
            FieldKind::Any => {}
            FieldKind::String if !value.is_string() => {
                out.push(violation("expected a string.".into()))
            }
            FieldKind::Number if !value.is_number() => {
                out.push(violation("expected a number.".into()))
            }
            FieldKind::Boolean if !value.is_boolean() => {
                out.push(violation("expected a boolean.".into()))
            }
            FieldKind::String | FieldKind::Number | FieldKind::Boolean => {}
            FieldKind::Object(shape_name) => {
                match (value.as_object(), self.schema.shape(shape_name)) {
                    (None, _) => out.push(violation("expected an object.".into())),
                    (Some(_), None) => out.push(violation(format!(
                        "schema defines no shape named '{shape_name}'."
                    ))),
                    (Some(map), Some(shape)) => self.validate_object(map, shape, path, out),
                }
            }
            FieldKind::Array(item) => match value.as_array() {
                None => out.push(violation("expected an array.".into())),
                Some(items) => self.validate_items(items, item, path, out),
            },
            FieldKind::FixedArray(item, len) => match value.as_array() {
                None => out.push(violation("expected an array.".into())),
                Some(items) => {
                    if items.len() != *len {
                        out.push(violation(format!(
                            "expected {len} elements but found {}.",
                            items.len()
                        )));
                    }
                    self.validate_items(items, item, path, out);
                }
            },
        }
    }

    fn validate_items(
        &self,
        items: &[Value],
        kind: &FieldKind,
        path: &str,
        out: &mut Vec<SchemaViolation>,
    ) {
        for (index, item) in items.iter().enumerate() {
            self.validate_value(item, kind, &format!("{path}[{index}]"), out);
        }
    }

    fn validate_object(
        &self,
        map: &Map<String, Value>,
        shape: &ObjectShape,
        path: &str,
        out: &mut Vec<SchemaViolation>,
    ) {
        for field in &shape.fields {
            let field_path = format!("{path}.{}", field.name);
            match map.get(&field.name) {
                None if field.required => out.push(SchemaViolation {
                    path: field_path,
                    message: "required field is missing.".into(),
                }),
                Some(Value::Null) if !field.required => {}
                None => {}
                Some(child) => self.validate_value(child, &field.kind, &field_path, out),
            }
        }

        for key in map.keys() {
            if !is_identifier_key(key) && shape.field(key).is_none() {
                out.push(SchemaViolation {
                    path: format!("{path}.{key}"),
                    message: format!("property is not permitted on {}.", shape.name),
                });
            }
        }
    }

    /// Rebuilds an already-validated tree in schema order.
    fn rebuild(&self, value: &Value, kind: &FieldKind) -> Value {
        match (kind, value) {
            (FieldKind::Object(shape_name), Value::Object(map)) => {
                let Some(shape) = self.schema.shape(shape_name) else {
                    return self.normalizer.normalize_value(value);
                };
                let mut out = Map::new();
                for field in &shape.fields {
                    if is_identifier_key(&field.name) {
                        continue;
                    }
                    if let Some(child) = map.get(&field.name) {
                        out.insert(field.name.clone(), self.rebuild(child, &field.kind));
                    }
                }
                Value::Object(out)
            }
            (FieldKind::Array(item) | FieldKind::FixedArray(item, _), Value::Array(items)) => {
                let items = items.iter().map(|child| self.rebuild(child, item)).collect();
                Value::Array(order_by_identity(items))
            }
            _ => self.normalizer.normalize_value(value),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
