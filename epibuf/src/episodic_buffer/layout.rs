//! Layout of the fields of committed episodes.
use crate::{
    episode::{Episode, FieldValue},
    error::{EpisodicBufferError, Result},
    FieldArray,
};
use std::collections::BTreeSet;

/// Shape of a single top-level field of an episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSpec {
    /// A flat field, stored under its own name.
    Flat(String),

    /// A nested field whose sub-fields are stored under their own names.
    Nested {
        /// Name of the field in the episode.
        parent: String,

        /// Names of the sub-fields, in name order.
        keys: Vec<String>,
    },
}

impl FieldSpec {
    fn of<A>(name: &str, value: &FieldValue<A>) -> Self {
        match value {
            FieldValue::Flat(_) => Self::Flat(name.to_string()),
            FieldValue::Nested(m) => Self::Nested {
                parent: name.to_string(),
                keys: m.keys().cloned().collect(),
            },
        }
    }

    /// Returns the name of the field in the episode.
    pub fn name(&self) -> &str {
        match self {
            Self::Flat(name) => name,
            Self::Nested { parent, .. } => parent,
        }
    }

    /// Returns the names under which the field is stored in the buffer.
    pub fn storage_names(&self) -> Vec<&str> {
        match self {
            Self::Flat(name) => vec![name.as_str()],
            Self::Nested { keys, .. } => keys.iter().map(|k| k.as_str()).collect(),
        }
    }

    fn matches<A>(&self, value: &FieldValue<A>) -> bool {
        match (self, value) {
            (Self::Flat(_), FieldValue::Flat(_)) => true,
            (Self::Nested { keys, .. }, FieldValue::Nested(m)) => {
                keys.len() == m.len() && keys.iter().zip(m.keys()).all(|(k1, k2)| k1 == k2)
            }
            _ => false,
        }
    }
}

/// Field layout fixed by the first committed episodes.
///
/// Every episode committed later must have exactly the same fields, each
/// either flat or nested with the same sub-fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    specs: Vec<FieldSpec>,
}

impl FieldLayout {
    /// Resolves the layout from an episode.
    ///
    /// # Errors
    ///
    /// Returns [`EpisodicBufferError::DimensionMismatch`] if flattening nested
    /// fields gives two storage fields the same name.
    pub fn resolve<A>(episode: &Episode<A>) -> Result<Self>
    where
        A: FieldArray,
    {
        let specs = episode
            .iter()
            .map(|(name, value)| FieldSpec::of(name, value))
            .collect::<Vec<_>>();

        let mut names = BTreeSet::new();
        for spec in specs.iter() {
            for name in spec.storage_names() {
                if !names.insert(name) {
                    return Err(EpisodicBufferError::DimensionMismatch(format!(
                        "field `{}` appears more than once after flattening field `{}`",
                        name,
                        spec.name()
                    )));
                }
            }
        }

        Ok(Self { specs })
    }

    /// Returns the specs of the top-level fields, in name order.
    pub fn specs(&self) -> &[FieldSpec] {
        &self.specs
    }

    /// Returns the names of the fields in the buffer.
    pub fn storage_names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().flat_map(|spec| spec.storage_names())
    }

    /// Checks that the episode follows the layout and returns its number of steps.
    pub fn check<A>(&self, episode: &Episode<A>) -> Result<usize>
    where
        A: FieldArray,
    {
        let mismatch = || {
            EpisodicBufferError::DimensionMismatch(format!(
                "episode has fields {:?}, expected {:?}",
                describe_episode(episode),
                self.describe()
            ))
        };

        if episode.num_fields() != self.specs.len() {
            return Err(mismatch());
        }
        for (spec, (name, value)) in self.specs.iter().zip(episode.iter()) {
            if spec.name() != name || !spec.matches(value) {
                return Err(mismatch());
            }
        }

        episode.len()
    }

    /// Returns the per-step arrays of an episode keyed by their storage names.
    ///
    /// The episode must have passed [`FieldLayout::check`].
    pub fn arrays<'a, A>(&self, episode: &'a Episode<A>) -> Vec<(&'a str, &'a A)>
    where
        A: FieldArray,
    {
        episode
            .iter()
            .flat_map(|(name, value)| value.arrays(name))
            .collect()
    }

    pub(super) fn describe(&self) -> Vec<String> {
        self.specs.iter().map(describe_spec).collect()
    }
}

fn describe_spec(spec: &FieldSpec) -> String {
    match spec {
        FieldSpec::Flat(name) => name.clone(),
        FieldSpec::Nested { parent, keys } => format!("{}{{{}}}", parent, keys.join(",")),
    }
}

fn describe_episode<A>(episode: &Episode<A>) -> Vec<String>
where
    A: FieldArray,
{
    episode
        .iter()
        .map(|(name, value)| describe_spec(&FieldSpec::of(name, value)))
        .collect()
}

#[cfg(test)]
mod test {
    use super::{FieldLayout, FieldSpec};
    use crate::{episode::Episode, error::EpisodicBufferError};

    fn episode(len: usize) -> Episode<Vec<f32>> {
        Episode::new()
            .with_field("obs", vec![0.0; len])
            .with_nested("act", vec![("a", vec![0.0; len]), ("b", vec![0.0; len])])
    }

    #[test]
    fn test_resolve() {
        let layout = FieldLayout::resolve(&episode(2)).unwrap();
        assert_eq!(
            layout.specs(),
            &[
                FieldSpec::Nested {
                    parent: "act".to_string(),
                    keys: vec!["a".to_string(), "b".to_string()]
                },
                FieldSpec::Flat("obs".to_string()),
            ]
        );
        assert_eq!(layout.storage_names().collect::<Vec<_>>(), vec!["a", "b", "obs"]);
    }

    #[test]
    fn test_resolve_rejects_colliding_names() {
        let episode = Episode::new()
            .with_field("a", vec![0.0f32; 2])
            .with_nested("act", vec![("a", vec![0.0f32; 2])]);
        match FieldLayout::resolve(&episode) {
            Err(EpisodicBufferError::DimensionMismatch(_)) => {}
            r => panic!("unexpected result: {:?}", r),
        }
    }

    #[test]
    fn test_check() {
        let layout = FieldLayout::resolve(&episode(2)).unwrap();
        assert_eq!(layout.check(&episode(5)).unwrap(), 5);

        let flat_act = Episode::new()
            .with_field("obs", vec![0.0f32; 2])
            .with_field("act", vec![0.0f32; 2]);
        assert!(layout.check(&flat_act).is_err());

        let other_heads = Episode::new()
            .with_field("obs", vec![0.0f32; 2])
            .with_nested("act", vec![("a", vec![0.0f32; 2]), ("c", vec![0.0f32; 2])]);
        assert!(layout.check(&other_heads).is_err());

        let extra = episode(2).with_field("rew", vec![0.0f32; 2]);
        assert!(layout.check(&extra).is_err());
    }
}
