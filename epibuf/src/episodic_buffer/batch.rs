//! Batches drawn from the episodic buffer.
use super::Fields;
use crate::FieldArray;
use std::collections::btree_map;

/// Rows of every field at a set of step indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch<A> {
    /// Selected rows, keyed by field name.
    fields: Fields<A>,

    /// Step indices the rows were selected from, in row order.
    ix_sample: Vec<usize>,
}

impl<A: FieldArray> Batch<A> {
    /// Gathers the rows at `ixs` from every field.
    pub(super) fn select(fields: &Fields<A>, ixs: Vec<usize>) -> Self {
        let fields = fields
            .iter()
            .map(|(name, array)| (name.clone(), array.select(&ixs)))
            .collect();
        Self {
            fields,
            ix_sample: ixs,
        }
    }

    /// Returns the rows of a field.
    pub fn get(&self, name: &str) -> Option<&A> {
        self.fields.get(name)
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.ix_sample.len()
    }

    /// Returns `true` if the batch has no rows.
    pub fn is_empty(&self) -> bool {
        self.ix_sample.is_empty()
    }

    /// Returns the step indices the rows were selected from.
    pub fn indices(&self) -> &[usize] {
        &self.ix_sample
    }

    /// Returns the field names in name order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    /// Iterates over the fields in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, A> {
        self.fields.iter()
    }

    /// Returns the rows keyed by field name.
    pub fn into_fields(self) -> Fields<A> {
        self.fields
    }

    /// Decomposes the batch into the rows and the step indices.
    pub fn unpack(self) -> (Fields<A>, Vec<usize>) {
        (self.fields, self.ix_sample)
    }
}
