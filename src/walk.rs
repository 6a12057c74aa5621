//! Struct traversal.
//!
//! `#[derive(Configurable)]` writes a [`Configurable::visit_fields`] that
//! hands each eligible field to a [`Visitor`], in declaration order. Exported
//! fields are visited. Private fields and fields marked `skip` are not.
//! Nested structs are entered depth-first, and an unset `Option<Struct>` is
//! allocated with its default before it is entered.

use std::convert::Infallible;

use crate::coerce::Location;
use crate::types::FieldDescriptor;

pub use configurator_derive::Configurable;

/// A struct whose fields can be walked and filled.
pub trait Configurable {
    fn visit_fields<V: Visitor>(&mut self, visitor: &mut V) -> Result<(), V::Error>;
}

impl<T: Configurable + ?Sized> Configurable for Box<T> {
    fn visit_fields<V: Visitor>(&mut self, visitor: &mut V) -> Result<(), V::Error> {
        (**self).visit_fields(visitor)
    }
}

/// Callbacks invoked by [`Configurable::visit_fields`].
pub trait Visitor: Sized {
    type Error;

    fn visit_leaf(&mut self, field: &FieldDescriptor, location: Location<'_>)
    -> Result<(), Self::Error>;

    fn visit_struct<C: Configurable + ?Sized>(
        &mut self,
        _field: &FieldDescriptor,
        target: &mut C,
    ) -> Result<(), Self::Error> {
        target.visit_fields(self)
    }

    fn visit_optional_struct<C: Configurable + Default>(
        &mut self,
        field: &FieldDescriptor,
        slot: &mut Option<C>,
    ) -> Result<(), Self::Error> {
        let target = slot.get_or_insert_with(C::default);
        self.visit_struct(field, target)
    }
}

/// One leaf field as seen from the root: its nesting path and descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    path: Vec<&'static str>,
    descriptor: FieldDescriptor,
}

impl SchemaField {
    pub fn path(&self) -> &[&'static str] {
        &self.path
    }

    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }

    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }
}

/// Every leaf field of a target, in traversal order.
///
/// Providers receive this at init time so they can prepare (register flags,
/// check tag uniqueness) before any value is requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<SchemaField>,
}

impl Schema {
    /// Walk `target` and record its leaves. Unset optional nested structs are
    /// allocated as a side effect, exactly as a population pass would.
    pub fn collect<C: Configurable + ?Sized>(target: &mut C) -> Self {
        let mut collector = SchemaCollector::default();
        if let Err(never) = target.visit_fields(&mut collector) {
            match never {}
        }
        Schema {
            fields: collector.fields,
        }
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaField> {
        self.fields.iter()
    }

    /// Leaves that physically carry `key` among their tags.
    pub fn with_tag<'s>(&'s self, key: &'s str) -> impl Iterator<Item = &'s SchemaField> {
        self.fields
            .iter()
            .filter(move |field| field.descriptor.tags().contains(key))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Default)]
struct SchemaCollector {
    path: Vec<&'static str>,
    fields: Vec<SchemaField>,
}

impl Visitor for SchemaCollector {
    type Error = Infallible;

    fn visit_leaf(&mut self, field: &FieldDescriptor, _location: Location<'_>) -> Result<(), Infallible> {
        let mut path = self.path.clone();
        path.push(field.name());
        self.fields.push(SchemaField {
            path,
            descriptor: *field,
        });
        Ok(())
    }

    fn visit_struct<C: Configurable + ?Sized>(
        &mut self,
        field: &FieldDescriptor,
        target: &mut C,
    ) -> Result<(), Infallible> {
        self.path.push(field.name());
        let result = target.visit_fields(self);
        self.path.pop();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{Branch, Leafy, Root};

    #[test]
    fn collects_leaves_in_declaration_order() {
        let mut target = Leafy::default();
        let schema = Schema::collect(&mut target);
        let names: Vec<_> = schema.iter().map(|f| f.descriptor().name()).collect();
        assert_eq!(names, vec!["name", "age", "tags"]);
    }

    #[test]
    fn skips_private_and_skipped_fields() {
        let mut target = Leafy::default();
        let schema = Schema::collect(&mut target);
        assert!(schema.iter().all(|f| f.descriptor().name() != "hidden"));
        assert!(schema.iter().all(|f| f.descriptor().name() != "ignored"));
    }

    #[test]
    fn nested_paths_are_recorded() {
        let mut target = Root::default();
        let schema = Schema::collect(&mut target);
        let paths: Vec<_> = schema.iter().map(SchemaField::dotted_path).collect();
        assert_eq!(
            paths,
            vec!["title", "branch.depth", "maybe.depth", "boxed.depth"]
        );
    }

    #[test]
    fn optional_nested_structs_are_allocated() {
        let mut target = Root::default();
        assert!(target.maybe.is_none());
        Schema::collect(&mut target);
        assert_eq!(target.maybe, Some(Branch::default()));
        assert!(target.boxed.is_some());
    }

    #[test]
    fn existing_optional_struct_is_kept() {
        let mut target = Root {
            maybe: Some(Branch { depth: 9 }),
            ..Root::default()
        };
        Schema::collect(&mut target);
        assert_eq!(target.maybe, Some(Branch { depth: 9 }));
    }

    #[test]
    fn with_tag_filters_by_key_presence() {
        let mut target = Root::default();
        let schema = Schema::collect(&mut target);
        let env: Vec<_> = schema.with_tag("env").map(SchemaField::dotted_path).collect();
        assert_eq!(env, vec!["branch.depth", "maybe.depth", "boxed.depth"]);
    }
}
