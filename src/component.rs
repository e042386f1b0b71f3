//! Behaviour shared by [`crate::File`] and [`crate::Batch`].
//!
//! A component carries attributes that cascade down the hierarchy. Records
//! built by a component take the attributes naming their own fields
//! ([`Component::fields_for`]); control records additionally take values
//! computed from the component's children ([`control_fields`]).

use crate::error::Result;
use crate::layout::FileLayout;
use crate::record::Record;
use crate::schema::Schema;
use crate::value::{Attributes, Value};
use std::sync::Arc;

/// An attribute-bearing container of records.
pub trait Component {
    /// Type name used in error messages.
    const NAME: &'static str;

    fn layout(&self) -> &Arc<FileLayout>;

    fn attributes(&self) -> &Attributes;

    fn attributes_mut(&mut self) -> &mut Attributes;

    /// Every record of the component, in serialization order.
    fn records(&mut self) -> Vec<Record>;

    fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes().get(name)
    }

    /// Sets an attribute; the name must have a rule in the layout's registry.
    fn set_attribute(&mut self, name: &str, value: impl Into<Value>) -> Result<()>
    where
        Self: Sized,
    {
        self.layout().check_attribute(name, Self::NAME)?;
        self.attributes_mut().insert(name.to_string(), value.into());
        Ok(())
    }

    /// The attributes that name fields of `schema`.
    fn fields_for(&self, schema: &Schema) -> Attributes {
        self.attributes()
            .iter()
            .filter(|(name, _)| schema.has_field(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

/// Values for a control record: for each field of `schema`, the computed
/// value if `computed` knows the field, else the attribute. Fields with
/// neither are left to the schema defaults.
pub(crate) fn control_fields<F>(schema: &Schema, attributes: &Attributes, computed: F) -> Attributes
where
    F: Fn(&str) -> Option<Value>,
{
    schema
        .field_names()
        .filter_map(|name| {
            computed(name)
                .or_else(|| attributes.get(name).cloned())
                .map(|value| (name.to_string(), value))
        })
        .collect()
}
