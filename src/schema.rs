//! Record schemas: ordered fields bound to rules, plus default values.

use crate::error::{AchError, Result};
use crate::formatter::{split_line, Formatter, Rule};
use crate::value::{Attributes, Value};

/// A default field value.
#[derive(Debug, Clone)]
pub enum DefaultValue {
    /// Used as is.
    Value(Value),
    /// Called once for every record constructed.
    Deferred(fn() -> Value),
}

impl DefaultValue {
    /// Produces the value for a new record.
    pub fn materialize(&self) -> Value {
        match self {
            DefaultValue::Value(value) => value.clone(),
            DefaultValue::Deferred(f) => f(),
        }
    }
}

/// A named field and the rule that formats it.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub rule: Rule,
}

/// An immutable record layout.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    fields: Vec<Field>,
    defaults: Vec<(String, DefaultValue)>,
}

impl Schema {
    /// Starts declaring a schema called `name`.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
            defaults: Vec::new(),
        }
    }

    /// Record type name, used in error messages and validation keys.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.rule)
    }

    /// Total width of a serialized record.
    pub fn width(&self) -> usize {
        self.fields.iter().map(|f| f.rule.width()).sum()
    }

    /// Evaluates every default, calling deferred ones.
    pub fn default_values(&self) -> Attributes {
        self.defaults
            .iter()
            .map(|(name, default)| (name.clone(), default.materialize()))
            .collect()
    }

    /// Splits `line` into one raw substring per field, in field order.
    pub fn split(&self, line: &str) -> Result<Vec<(String, String)>> {
        let parts = split_line(&self.name, self.fields.iter().map(|f| &f.rule), line)?;
        Ok(self
            .fields
            .iter()
            .map(|f| f.name.clone())
            .zip(parts)
            .collect())
    }
}

/// Declares the fields and defaults of a [`Schema`] against a rule registry.
///
/// # Examples
///
/// ```
/// use ach_builder::{Formatter, Schema};
///
/// let schema = Schema::builder("Test")
///     .fields(["customer_name", "amount"])
///     .default("customer_name", "JOHN SMITH")
///     .build(&Formatter::standard())
///     .unwrap();
/// assert_eq!(schema.width(), 32);
/// ```
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<String>,
    defaults: Vec<(String, DefaultValue)>,
}

impl SchemaBuilder {
    /// Declares the ordered fields of the record.
    pub fn fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(names.into_iter().map(Into::into));
        self
    }

    /// Declares a literal default for `field`.
    pub fn default(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.defaults
            .push((field.to_string(), DefaultValue::Value(value.into())));
        self
    }

    /// Declares a default computed for every new record.
    pub fn deferred(mut self, field: &str, f: fn() -> Value) -> Self {
        self.defaults
            .push((field.to_string(), DefaultValue::Deferred(f)));
        self
    }

    /// Resolves every field's rule.
    ///
    /// Fails with [`AchError::UnknownField`] for a field with no registered rule.
    pub fn build(self, formatter: &Formatter) -> Result<Schema> {
        let fields = self
            .fields
            .into_iter()
            .map(|name| match formatter.rule(&name) {
                Some(rule) => Ok(Field {
                    rule: rule.clone(),
                    name,
                }),
                None => Err(AchError::UnknownField {
                    field: name,
                    record: self.name.clone(),
                }),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Schema {
            name: self.name,
            fields,
            defaults: self.defaults,
        })
    }
}

/// Declares a schema whose fields define their own rules on first use.
///
/// A field that is not yet in the registry must come with a descriptor,
/// which is registered; a field already in the registry must not. Fields are
/// appended in declaration order.
///
/// # Examples
///
/// ```
/// use ach_builder::{DynamicSchema, Formatter};
///
/// let mut formatter = Formatter::standard();
/// let mut header = DynamicSchema::new("TransmissionHeader", &mut formatter);
/// header.field("request_type", Some("<-9-"), Some("$$ADD ID=".into())).unwrap();
/// header.field("remote_id", Some("<-8-"), None).unwrap();
/// let schema = header.seal();
///
/// assert_eq!(schema.width(), 17);
/// assert!(formatter.is_defined("remote_id"));
/// ```
#[derive(Debug)]
pub struct DynamicSchema<'a> {
    formatter: &'a mut Formatter,
    name: String,
    fields: Vec<Field>,
    defaults: Vec<(String, DefaultValue)>,
}

impl<'a> DynamicSchema<'a> {
    pub fn new(name: impl Into<String>, formatter: &'a mut Formatter) -> Self {
        DynamicSchema {
            formatter,
            name: name.into(),
            fields: Vec::new(),
            defaults: Vec::new(),
        }
    }

    /// References `name`, optionally supplying a rule descriptor and a default.
    ///
    /// - Unregistered name without a descriptor: [`AchError::UndefinedFormat`].
    /// - Registered name with a descriptor: [`AchError::DuplicateFormat`].
    pub fn field(
        &mut self,
        name: &str,
        descriptor: Option<&str>,
        default: Option<Value>,
    ) -> Result<&mut Self> {
        match (self.formatter.is_defined(name), descriptor) {
            (false, None) => {
                return Err(AchError::UndefinedFormat {
                    field: name.to_string(),
                })
            }
            (true, Some(_)) => {
                return Err(AchError::DuplicateFormat {
                    field: name.to_string(),
                })
            }
            (false, Some(descriptor)) => self.formatter.define(name, descriptor)?,
            (true, None) => {}
        }

        if !self.fields.iter().any(|f| f.name == name) {
            let rule = match self.formatter.rule(name) {
                Some(rule) => rule.clone(),
                None => {
                    return Err(AchError::UndefinedFormat {
                        field: name.to_string(),
                    })
                }
            };
            self.fields.push(Field {
                name: name.to_string(),
                rule,
            });
        }

        if let Some(default) = default {
            self.defaults.retain(|(field, _)| field != name);
            self.defaults
                .push((name.to_string(), DefaultValue::Value(default)));
        }
        Ok(self)
    }

    /// Number of fields declared so far.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Freezes the declared fields into a [`Schema`].
    pub fn seal(self) -> Schema {
        Schema {
            name: self.name,
            fields: self.fields,
            defaults: self.defaults,
        }
    }
}
