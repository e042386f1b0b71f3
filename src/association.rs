//! Child collections owned by components.
//!
//! A collection is declared unbound, then bound to exactly one owner when the
//! owning component is constructed. Binding an already-bound collection again
//! fails with [`AchError::DoubleAssignment`].
//!
//! - [`HasMany`] is a plain ordered list (batches of a file, entries of a batch).
//! - [`LinkedHasMany`] groups its elements under the latest element of another
//!   collection (addenda under the entry they follow).

use crate::error::{AchError, Result};
use crate::value::Attributes;
use std::collections::BTreeMap;

/// Computes extra attributes for the next child from the current child count.
pub type ProcDefaults = fn(usize) -> Attributes;

/// An ordered collection of children.
#[derive(Debug, Clone)]
pub struct HasMany<T> {
    name: &'static str,
    owner: Option<String>,
    proc_defaults: Option<ProcDefaults>,
    items: Vec<T>,
}

impl<T> HasMany<T> {
    /// Declares an unbound collection.
    pub fn declare(name: &'static str) -> Self {
        HasMany {
            name,
            owner: None,
            proc_defaults: None,
            items: Vec::new(),
        }
    }

    /// Attaches a function computing per-child default attributes.
    pub fn with_proc_defaults(mut self, proc_defaults: ProcDefaults) -> Self {
        self.proc_defaults = Some(proc_defaults);
        self
    }

    /// Returns an empty copy of this declaration bound to `owner`.
    pub fn bind(&self, owner: impl Into<String>) -> Result<Self> {
        if let Some(current) = &self.owner {
            return Err(AchError::DoubleAssignment {
                name: self.name,
                owner: current.clone(),
            });
        }
        Ok(HasMany {
            name: self.name,
            owner: Some(owner.into()),
            proc_defaults: self.proc_defaults,
            items: Vec::new(),
        })
    }

    /// Attributes the next child should receive from the collection itself.
    pub fn next_defaults(&self) -> Attributes {
        self.proc_defaults
            .map(|f| f(self.items.len()))
            .unwrap_or_default()
    }

    /// Appends a child and returns it.
    pub fn push(&mut self, item: T) -> &mut T {
        self.items.push(item);
        let last = self.items.len() - 1;
        &mut self.items[last]
    }

    pub fn all(&self) -> &[T] {
        &self.items
    }

    pub fn all_mut(&mut self) -> &mut [T] {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A collection whose elements attach to the latest element of another one.
///
/// Elements are keyed by the index of the linked element that was last at
/// the time they were added.
#[derive(Debug, Clone)]
pub struct LinkedHasMany<T> {
    name: &'static str,
    link: &'static str,
    record: &'static str,
    owner: Option<String>,
    items: BTreeMap<usize, Vec<T>>,
}

impl<T> LinkedHasMany<T> {
    /// Declares an unbound collection of `record` elements linked to the
    /// collection of `link` elements.
    pub fn declare(name: &'static str, record: &'static str, link: &'static str) -> Self {
        LinkedHasMany {
            name,
            link,
            record,
            owner: None,
            items: BTreeMap::new(),
        }
    }

    /// Returns an empty copy of this declaration bound to `owner`.
    pub fn bind(&self, owner: impl Into<String>) -> Result<Self> {
        if let Some(current) = &self.owner {
            return Err(AchError::DoubleAssignment {
                name: self.name,
                owner: current.clone(),
            });
        }
        Ok(LinkedHasMany {
            name: self.name,
            link: self.link,
            record: self.record,
            owner: Some(owner.into()),
            items: BTreeMap::new(),
        })
    }

    /// Appends `item` under the latest of `linked_count` linked elements.
    ///
    /// Fails with [`AchError::NoLink`] when there is no linked element yet.
    pub fn push(&mut self, linked_count: usize, item: T) -> Result<&mut T> {
        let Some(link_index) = linked_count.checked_sub(1) else {
            return Err(AchError::NoLink {
                link: self.link,
                record: self.record,
            });
        };
        let group = self.items.entry(link_index).or_default();
        group.push(item);
        let last = group.len() - 1;
        Ok(&mut group[last])
    }

    /// Elements attached to the linked element at `link_index`.
    pub fn linked_to(&self, link_index: usize) -> &[T] {
        self.items
            .get(&link_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All groups, keyed by linked element index.
    pub fn all(&self) -> &BTreeMap<usize, Vec<T>> {
        &self.items
    }

    /// Every element, in linked order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.values().flatten()
    }

    /// Total number of elements across all groups.
    pub fn len(&self) -> usize {
        self.items.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_bound_collections_do_not_share_items() {
        let declared: HasMany<u32> = HasMany::declare("items");
        let mut first = declared.bind("first").unwrap();
        let second = declared.bind("second").unwrap();
        first.push(1);
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }

    #[test]
    fn test_rebinding_fails() {
        let bound: HasMany<u32> = HasMany::declare("items").bind("owner").unwrap();
        let err = bound.bind("other").unwrap_err();
        assert!(matches!(err, AchError::DoubleAssignment { name: "items", .. }));

        let linked: LinkedHasMany<u32> = LinkedHasMany::declare("addenda", "Addenda", "entry")
            .bind("owner")
            .unwrap();
        assert!(linked.bind("other").is_err());
    }

    #[test]
    fn test_proc_defaults_see_current_length() {
        fn numbering(count: usize) -> Attributes {
            let mut attrs = Attributes::new();
            attrs.insert("batch_number".to_string(), Value::from(count + 1));
            attrs
        }
        let mut batches: HasMany<u32> = HasMany::declare("batches")
            .with_proc_defaults(numbering)
            .bind("file")
            .unwrap();
        assert_eq!(batches.next_defaults()["batch_number"], Value::from(1));
        batches.push(7);
        assert_eq!(batches.next_defaults()["batch_number"], Value::from(2));
    }

    #[test]
    fn test_linked_push_without_link_fails() {
        let mut addenda: LinkedHasMany<&str> = LinkedHasMany::declare("addenda", "Addenda", "entry");
        let err = addenda.push(0, "foo").unwrap_err();
        assert!(matches!(err, AchError::NoLink { link: "entry", .. }));
    }

    #[test]
    fn test_linked_push_groups_under_latest() {
        let mut addenda: LinkedHasMany<&str> = LinkedHasMany::declare("addenda", "Addenda", "entry");
        addenda.push(1, "foo").unwrap();
        addenda.push(2, "bar").unwrap();
        addenda.push(2, "baz").unwrap();

        assert_eq!(addenda.linked_to(0), &["foo"]);
        assert_eq!(addenda.linked_to(1), &["bar", "baz"]);
        assert!(addenda.linked_to(2).is_empty());
        assert_eq!(addenda.len(), 3);
    }
}
