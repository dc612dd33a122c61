//! Episodes handed to the buffer.
use crate::{
    error::{EpisodicBufferError, Result},
    FieldArray,
};
use std::{
    collections::{btree_map, BTreeMap},
    iter::FromIterator,
};

/// Per-step values of a single field of an episode.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<A> {
    /// A single array of per-step values.
    Flat(A),

    /// Several named arrays of per-step values, e.g., the heads of a
    /// multi-discrete action. Each sub-field is stored as a top-level field
    /// of the buffer under its own name.
    Nested(BTreeMap<String, A>),
}

impl<A: FieldArray> FieldValue<A> {
    /// Returns the per-step arrays of this field together with their names.
    ///
    /// `name` is the name of this field in the episode; it is returned for
    /// [`FieldValue::Flat`] and dropped for [`FieldValue::Nested`].
    pub fn arrays<'a>(&'a self, name: &'a str) -> Vec<(&'a str, &'a A)> {
        match self {
            Self::Flat(a) => vec![(name, a)],
            Self::Nested(m) => m.iter().map(|(k, a)| (k.as_str(), a)).collect(),
        }
    }
}

/// One trajectory of named per-step values.
///
/// All fields of an episode must have the same number of steps. This is
/// checked when the episode is committed to a buffer.
///
/// ```
/// use epibuf::Episode;
///
/// let episode = Episode::new()
///     .with_field("obs", vec![0.0f32, 1.0, 2.0])
///     .with_field("rew", vec![0.0f32, 0.0, 1.0])
///     .with_nested("act", vec![("steer", vec![0.1f32, 0.2, 0.3]), ("gas", vec![1.0, 1.0, 0.0])]);
/// assert_eq!(episode.len().unwrap(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Episode<A> {
    fields: BTreeMap<String, FieldValue<A>>,
}

impl<A> Default for Episode<A> {
    fn default() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }
}

impl<A: FieldArray> Episode<A> {
    /// Creates an episode without fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a flat field.
    pub fn with_field(mut self, name: impl Into<String>, values: A) -> Self {
        self.fields.insert(name.into(), FieldValue::Flat(values));
        self
    }

    /// Adds a nested field.
    pub fn with_nested<K, I>(mut self, name: impl Into<String>, sub_fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, A)>,
    {
        let sub_fields = sub_fields.into_iter().map(|(k, a)| (k.into(), a)).collect();
        self.fields.insert(name.into(), FieldValue::Nested(sub_fields));
        self
    }

    /// Inserts a field, returning the previous value with the same name, if any.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: FieldValue<A>,
    ) -> Option<FieldValue<A>> {
        self.fields.insert(name.into(), value)
    }

    /// Returns the field of the given name.
    pub fn get(&self, name: &str) -> Option<&FieldValue<A>> {
        self.fields.get(name)
    }

    /// Iterates over the fields in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldValue<A>> {
        self.fields.iter()
    }

    /// Returns the names of the fields in name order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    /// Returns the number of fields, counting a nested field once.
    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    /// Returns the number of steps of the episode.
    ///
    /// An episode without per-step arrays has zero steps.
    ///
    /// # Errors
    ///
    /// Returns [`EpisodicBufferError::DimensionMismatch`] if the arrays of the
    /// episode differ in length.
    pub fn len(&self) -> Result<usize> {
        let mut len: Option<(&str, usize)> = None;
        for (name, value) in self.fields.iter() {
            for (array_name, array) in value.arrays(name) {
                match len {
                    None => len = Some((array_name, array.len())),
                    Some((first, n)) if n != array.len() => {
                        return Err(EpisodicBufferError::DimensionMismatch(format!(
                            "field `{}` has {} steps but field `{}` has {} steps",
                            array_name,
                            array.len(),
                            first,
                            n
                        )))
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(len.map_or(0, |(_, n)| n))
    }
}

impl<A> From<BTreeMap<String, FieldValue<A>>> for Episode<A> {
    fn from(fields: BTreeMap<String, FieldValue<A>>) -> Self {
        Self { fields }
    }
}

impl<A, K: Into<String>> FromIterator<(K, FieldValue<A>)> for Episode<A> {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue<A>)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
