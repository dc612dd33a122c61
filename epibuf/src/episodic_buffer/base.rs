//! Episodic buffer.
use super::{
    iter::{draw_batch, FullBatches, RandomBatches, SequentialBatches},
    Batch, EpisodeCounting, EpisodicBufferConfig, FieldLayout, Fields,
};
use crate::{
    episode::Episode,
    error::{EpisodicBufferError, Result},
    ExperienceBufferBase, FieldArray, ReplayBufferBase,
};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::{
    collections::{BTreeMap, HashSet},
    iter,
};

/// In-memory buffer of steps from episodes, stored as one array per field.
///
/// Episodes are added in two phases: [`stage`](EpisodicBuffer::stage) hands a
/// sequence of episodes to the buffer and [`commit`](EpisodicBuffer::commit)
/// concatenates them onto the field storage. Steps of committed episodes are
/// stored back to back in the order of the episodes; episode boundaries are not
/// recorded.
///
/// The buffer is not meant to be shared between threads. Iterators created by
/// the buffer hold their own position, but those drawing random numbers borrow
/// the buffer mutably.
pub struct EpisodicBuffer<A> {
    /// Per-step arrays keyed by field name, all of the same length.
    fields: Fields<A>,

    /// Layout of the episode fields, fixed by the first commit.
    layout: Option<FieldLayout>,

    /// Number of episodes.
    num_episodes: usize,

    /// Episodes waiting for [`EpisodicBuffer::commit`].
    staged: Option<Vec<Episode<A>>>,

    /// Random number generator for shuffling and sampling.
    rng: StdRng,

    config: EpisodicBufferConfig,
}

impl<A: FieldArray> EpisodicBuffer<A> {
    /// Creates an empty buffer.
    pub fn new(config: &EpisodicBufferConfig) -> Self {
        Self {
            fields: BTreeMap::new(),
            layout: None,
            num_episodes: 0,
            staged: None,
            rng: StdRng::seed_from_u64(config.seed),
            config: config.clone(),
        }
    }

    /// Returns the configuration of the buffer.
    pub fn config(&self) -> &EpisodicBufferConfig {
        &self.config
    }

    /// Returns the number of steps stored in the buffer.
    pub fn num_steps(&self) -> usize {
        self.fields.values().next().map_or(0, |a| a.len())
    }

    /// Returns the number of episodes.
    ///
    /// See [`EpisodeCounting`] for when staged episodes are counted.
    pub fn num_episodes(&self) -> usize {
        self.num_episodes
    }

    /// Returns `true` if the buffer has no steps.
    pub fn is_empty(&self) -> bool {
        self.num_steps() == 0
    }

    /// Returns `true` if episodes are waiting for [`EpisodicBuffer::commit`].
    pub fn has_staged(&self) -> bool {
        self.staged.is_some()
    }

    /// Returns the field layout, if episodes have been committed.
    pub fn layout(&self) -> Option<&FieldLayout> {
        self.layout.as_ref()
    }

    /// Returns the names of the stored fields in name order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    /// Returns the array of a stored field.
    pub fn field(&self, name: &str) -> Option<&A> {
        self.fields.get(name)
    }

    /// Returns all stored arrays keyed by field name.
    pub fn fields(&self) -> &Fields<A> {
        &self.fields
    }

    /// Stages episodes for the next [`EpisodicBuffer::commit`].
    ///
    /// Episodes staged before and not committed yet are discarded. With
    /// [`EpisodeCounting::OnStage`], the episode count is increased here by the
    /// number of given episodes, even if they are never committed.
    pub fn stage(&mut self, episodes: impl IntoIterator<Item = Episode<A>>) {
        let episodes = episodes.into_iter().collect::<Vec<_>>();
        if let Some(prev) = &self.staged {
            log::warn!(
                "Discarding {} staged episodes that were not committed",
                prev.len()
            );
        }
        if self.config.episode_counting == EpisodeCounting::OnStage {
            self.num_episodes += episodes.len();
        }
        log::debug!("Staged {} episodes", episodes.len());
        self.staged = Some(episodes);
    }

    /// Concatenates the staged episodes onto the field storage.
    ///
    /// Flat fields are stored under their own names. Each sub-field of a nested
    /// field is stored under the name of the sub-field. The field layout of the
    /// first committed episode is required of every later episode.
    ///
    /// The buffer is left unchanged when an error is returned.
    ///
    /// # Errors
    ///
    /// * [`EpisodicBufferError::InvalidState`] if no episodes are staged.
    /// * [`EpisodicBufferError::DimensionMismatch`] if an episode does not follow
    ///   the field layout, has fields of different lengths, or has per-step
    ///   shapes that cannot be concatenated with the stored arrays.
    pub fn commit(&mut self) -> Result<()> {
        let staged = match self.staged.as_deref() {
            Some(staged) if !staged.is_empty() => staged,
            _ => {
                return Err(EpisodicBufferError::InvalidState(
                    "no episodes are staged".to_string(),
                ))
            }
        };

        let layout = match &self.layout {
            Some(layout) => layout.clone(),
            None => FieldLayout::resolve(&staged[0])?,
        };

        let mut num_new_steps = 0;
        for (i, episode) in staged.iter().enumerate() {
            num_new_steps += layout.check(episode).map_err(|e| in_episode(i, e))?;
        }

        let mut incoming: BTreeMap<&str, Vec<&A>> =
            layout.storage_names().map(|name| (name, vec![])).collect();
        for episode in staged.iter() {
            for (name, array) in layout.arrays(episode) {
                if let Some(parts) = incoming.get_mut(name) {
                    parts.push(array);
                }
            }
        }
        let fields = concat_fields(&self.fields, incoming, self.num_steps() + num_new_steps)?;
        let num_committed = staged.len();

        self.fields = fields;
        self.layout = Some(layout);
        self.staged = None;
        if self.config.episode_counting == EpisodeCounting::OnCommit {
            self.num_episodes += num_committed;
        }
        log::debug!(
            "Committed {} episodes with {} steps, {} steps in total",
            num_committed,
            num_new_steps,
            self.num_steps()
        );

        Ok(())
    }

    /// Appends the steps of another buffer and adds its episode count.
    ///
    /// Episodes staged in `other` are discarded. If this buffer has neither
    /// steps nor a field layout, it takes over the storage and the layout of
    /// `other`.
    ///
    /// # Errors
    ///
    /// Returns [`EpisodicBufferError::DimensionMismatch`] if both buffers hold
    /// steps and their field layouts differ, including the same stored fields
    /// grouped into different nested fields, or if the arrays cannot be
    /// concatenated.
    pub fn merge(&mut self, other: Self) -> Result<()> {
        if !other.fields.is_empty() {
            if self.fields.is_empty() && self.layout.is_none() {
                self.fields = other.fields;
                self.layout = other.layout;
            } else {
                if !self.fields.keys().eq(other.fields.keys()) {
                    return Err(EpisodicBufferError::DimensionMismatch(format!(
                        "cannot merge a buffer with fields {:?} into a buffer with fields {:?}",
                        other.fields.keys().collect::<Vec<_>>(),
                        self.fields.keys().collect::<Vec<_>>()
                    )));
                }
                if let (Some(ours), Some(theirs)) = (&self.layout, &other.layout) {
                    if ours != theirs {
                        return Err(EpisodicBufferError::DimensionMismatch(format!(
                            "cannot merge a buffer with layout {:?} into a buffer with layout {:?}",
                            theirs.describe(),
                            ours.describe()
                        )));
                    }
                }
                let expected = self.num_steps() + other.num_steps();
                let incoming = other
                    .fields
                    .iter()
                    .map(|(name, array)| (name.as_str(), vec![array]))
                    .collect();
                self.fields = concat_fields(&self.fields, incoming, expected)?;
            }
        }
        self.num_episodes += other.num_episodes;
        log::debug!(
            "Merged {} episodes, {} steps in total",
            other.num_episodes,
            self.num_steps()
        );

        Ok(())
    }

    /// Iterates over batches of consecutive entries of an index ordering.
    ///
    /// The ordering is built once when this method is called:
    ///
    /// 1. Takes `indices`, or all steps if `None`
    /// 2. Shuffles them with the random number generator of the buffer if
    ///    `shuffle` is `true`
    ///
    /// Each of `epochs` passes then yields `ordering.len() / batch_size`
    /// batches of consecutive entries; the remaining entries are not yielded.
    /// Every pass uses the same ordering, and the returned iterator keeps its
    /// own position in it.
    ///
    /// # Arguments
    ///
    /// * `batch_size` - Number of steps in a batch
    /// * `epochs` - Number of passes over the ordering
    /// * `indices` - Steps to iterate over, possibly with duplicates
    /// * `shuffle` - Whether the ordering is shuffled
    ///
    /// # Returns
    ///
    /// A [`SequentialBatches`] borrowing the stored arrays
    ///
    /// # Errors
    ///
    /// * [`EpisodicBufferError::InvalidArgument`] if `batch_size` is zero.
    /// * [`EpisodicBufferError::EmptyBuffer`] if the buffer has no steps.
    /// * [`EpisodicBufferError::IndexOutOfRange`] if `indices` refers to a step
    ///   outside the buffer.
    pub fn iter_sequential(
        &mut self,
        batch_size: usize,
        epochs: usize,
        indices: Option<Vec<usize>>,
        shuffle: bool,
    ) -> Result<SequentialBatches<'_, A>> {
        check_batch_size(batch_size)?;
        let mut order = self.index_set(indices)?;
        if shuffle {
            order.shuffle(&mut self.rng);
        }
        log::trace!(
            "Sequential iteration over {} indices, batch size {}, {} epochs",
            order.len(),
            batch_size,
            epochs
        );
        Ok(SequentialBatches::new(&self.fields, order, batch_size, epochs))
    }

    /// A single pass of [`EpisodicBuffer::iter_sequential`].
    pub fn iter_once(
        &mut self,
        batch_size: usize,
        indices: Option<Vec<usize>>,
        shuffle: bool,
    ) -> Result<SequentialBatches<'_, A>> {
        self.iter_sequential(batch_size, 1, indices, shuffle)
    }

    /// Draws a batch of steps at random, with replacement.
    ///
    /// Candidates are the entries of `indices`, or all steps if `None`. A
    /// candidate `i` is drawn only if `i + 1` is a candidate too, so that the
    /// step following a drawn step is available, e.g., for bootstrapping.
    ///
    /// This is how the last step of an episode is excluded, but it is only an
    /// approximation: episode boundaries are not recorded, so the last step of
    /// an episode followed by another episode is still drawn when the index
    /// set covers both. It is exact only when the index set ends where
    /// episodes end.
    ///
    /// An entry given more than once in `indices` is drawn proportionally
    /// more often.
    ///
    /// # Arguments
    ///
    /// * `batch_size` - Number of steps drawn
    /// * `indices` - Candidate steps, possibly with duplicates
    ///
    /// # Returns
    ///
    /// A [`Batch`] with the rows of the drawn steps and their indices
    ///
    /// # Errors
    ///
    /// * [`EpisodicBufferError::InvalidArgument`] if `batch_size` is zero.
    /// * [`EpisodicBufferError::EmptyBuffer`] if the buffer has no steps.
    /// * [`EpisodicBufferError::IndexOutOfRange`] if `indices` refers to a step
    ///   outside the buffer.
    /// * [`EpisodicBufferError::InvalidState`] if no candidate has its
    ///   successor among the candidates.
    pub fn sample_random(
        &mut self,
        batch_size: usize,
        indices: Option<Vec<usize>>,
    ) -> Result<Batch<A>> {
        check_batch_size(batch_size)?;
        let eligible = self.eligible_steps(indices)?;
        Ok(draw_batch(&self.fields, &mut self.rng, &eligible, batch_size))
    }

    /// Yields `epochs` independent batches of [`EpisodicBuffer::sample_random`].
    ///
    /// Errors are returned before any batch is drawn.
    pub fn sample_random_repeated(
        &mut self,
        batch_size: usize,
        epochs: usize,
        indices: Option<Vec<usize>>,
    ) -> Result<RandomBatches<'_, A>> {
        check_batch_size(batch_size)?;
        let eligible = self.eligible_steps(indices)?;
        Ok(RandomBatches::new(
            &self.fields,
            &mut self.rng,
            eligible,
            batch_size,
            epochs,
        ))
    }

    /// Yields the whole field storage `epochs` times.
    ///
    /// The storage is not copied: every item is a reference to the same map,
    /// and the buffer cannot be modified while the iterator is alive.
    ///
    /// # Errors
    ///
    /// Returns [`EpisodicBufferError::EmptyBuffer`] if the buffer has no steps.
    pub fn full_batches(&self, epochs: usize) -> Result<FullBatches<'_, A>> {
        if self.is_empty() {
            return Err(EpisodicBufferError::EmptyBuffer);
        }
        Ok(iter::repeat(&self.fields).take(epochs))
    }

    /// Returns `indices`, or all steps if `None`, after checking them.
    fn index_set(&self, indices: Option<Vec<usize>>) -> Result<Vec<usize>> {
        let num_steps = self.num_steps();
        if num_steps == 0 {
            return Err(EpisodicBufferError::EmptyBuffer);
        }
        match indices {
            None => Ok((0..num_steps).collect()),
            Some(indices) => match indices.iter().find(|&&ix| ix >= num_steps) {
                Some(&index) => Err(EpisodicBufferError::IndexOutOfRange { index, num_steps }),
                None => Ok(indices),
            },
        }
    }

    /// Returns the entries of the index set whose successor is in the set too.
    ///
    /// Duplicated entries are kept, so that drawing uniformly from the result
    /// is the same as drawing uniformly from the index set and rejecting
    /// entries without successor.
    fn eligible_steps(&self, indices: Option<Vec<usize>>) -> Result<Vec<usize>> {
        let candidates = self.index_set(indices)?;
        let members = candidates.iter().copied().collect::<HashSet<_>>();
        let eligible = candidates
            .iter()
            .copied()
            .filter(|ix| members.contains(&(ix + 1)))
            .collect::<Vec<_>>();
        if eligible.is_empty() {
            return Err(EpisodicBufferError::InvalidState(format!(
                "none of {} candidate steps has its successor among the candidates",
                candidates.len()
            )));
        }
        Ok(eligible)
    }
}

impl<A: FieldArray> Default for EpisodicBuffer<A> {
    fn default() -> Self {
        Self::new(&EpisodicBufferConfig::default())
    }
}

impl<A: FieldArray> ExperienceBufferBase for EpisodicBuffer<A> {
    type Item = Vec<Episode<A>>;

    /// Stages and commits the episodes.
    fn push(&mut self, tr: Self::Item) -> anyhow::Result<()> {
        self.stage(tr);
        self.commit()?;
        Ok(())
    }

    fn len(&self) -> usize {
        self.num_steps()
    }
}

impl<A: FieldArray> ReplayBufferBase for EpisodicBuffer<A> {
    type Config = EpisodicBufferConfig;
    type Batch = Batch<A>;

    fn build(config: &Self::Config) -> Self {
        Self::new(config)
    }

    /// Draws a batch with [`EpisodicBuffer::sample_random`] over all steps.
    fn batch(&mut self, size: usize) -> anyhow::Result<Self::Batch> {
        Ok(self.sample_random(size, None)?)
    }
}

fn check_batch_size(batch_size: usize) -> Result<()> {
    if batch_size == 0 {
        return Err(EpisodicBufferError::InvalidArgument(
            "batch size must be positive".to_string(),
        ));
    }
    Ok(())
}

fn in_episode(i: usize, e: EpisodicBufferError) -> EpisodicBufferError {
    match e {
        EpisodicBufferError::DimensionMismatch(msg) => {
            EpisodicBufferError::DimensionMismatch(format!("staged episode {}: {}", i, msg))
        }
        e => e,
    }
}

/// Concatenates arrays onto the stored ones, field by field.
///
/// Every resulting array must have `expected` steps.
fn concat_fields<A: FieldArray>(
    stored: &Fields<A>,
    incoming: BTreeMap<&str, Vec<&A>>,
    expected: usize,
) -> Result<Fields<A>> {
    let mut fields = BTreeMap::new();
    for (name, parts) in incoming {
        let mut all = Vec::with_capacity(parts.len() + 1);
        if let Some(array) = stored.get(name) {
            all.push(array);
        }
        all.extend(parts);

        let array = A::concat(&all).map_err(|e| match e {
            EpisodicBufferError::DimensionMismatch(msg) => {
                EpisodicBufferError::DimensionMismatch(format!("field `{}`: {}", name, msg))
            }
            e => e,
        })?;
        if array.len() != expected {
            return Err(EpisodicBufferError::DimensionMismatch(format!(
                "field `{}` has {} steps, expected {}",
                name,
                array.len(),
                expected
            )));
        }
        fields.insert(name.to_string(), array);
    }
    Ok(fields)
}

#[cfg(test)]
mod test {
    use super::EpisodicBuffer;
    use crate::{
        episode::Episode,
        error::EpisodicBufferError,
        episodic_buffer::{EpisodeCounting, EpisodicBufferConfig},
        ExperienceBufferBase, ReplayBufferBase,
    };
    use test_log::test;

    fn episode(start: usize, len: usize) -> Episode<Vec<usize>> {
        let steps = (start..start + len).collect::<Vec<_>>();
        Episode::new()
            .with_field("obs", steps.clone())
            .with_nested(
                "act",
                vec![
                    ("a", steps.iter().map(|s| s * 10).collect()),
                    ("b", steps.iter().map(|s| s * 100).collect::<Vec<_>>()),
                ],
            )
    }

    fn buffer(lens: &[usize]) -> EpisodicBuffer<Vec<usize>> {
        let mut buffer = EpisodicBuffer::default();
        let mut start = 0;
        let mut episodes = vec![];
        for &len in lens {
            episodes.push(episode(start, len));
            start += len;
        }
        buffer.stage(episodes);
        buffer.commit().unwrap();
        buffer
    }

    #[test]
    fn test_commit_flattens_nested_fields() {
        let buffer = buffer(&[2, 3, 4]);
        assert_eq!(buffer.num_steps(), 9);
        assert_eq!(buffer.num_episodes(), 3);
        assert_eq!(buffer.field_names().collect::<Vec<_>>(), vec!["a", "b", "obs"]);
        assert_eq!(buffer.field("obs"), Some(&(0..9).collect::<Vec<_>>()));
        assert_eq!(
            buffer.field("b"),
            Some(&(0..9).map(|s| s * 100).collect::<Vec<_>>())
        );
        assert!(!buffer.has_staged());
    }

    #[test]
    fn test_commit_appends_after_existing_steps() {
        let mut buffer = buffer(&[2]);
        buffer.stage(vec![episode(2, 3)]);
        buffer.commit().unwrap();
        assert_eq!(buffer.num_steps(), 5);
        assert_eq!(buffer.num_episodes(), 2);
        assert_eq!(buffer.field("obs"), Some(&vec![0, 1, 2, 3, 4]));
    }

    #[test]
    fn test_commit_without_staged_episodes() {
        let mut buffer = EpisodicBuffer::<Vec<f32>>::default();
        assert!(matches!(
            buffer.commit(),
            Err(EpisodicBufferError::InvalidState(_))
        ));

        buffer.stage(vec![]);
        assert!(matches!(
            buffer.commit(),
            Err(EpisodicBufferError::InvalidState(_))
        ));
    }

    #[test]
    fn test_commit_rejects_different_field_sets() {
        let mut buffer = EpisodicBuffer::default();
        buffer.stage(vec![
            episode(0, 2),
            Episode::new().with_field("obs", vec![0, 1]),
        ]);
        assert!(matches!(
            buffer.commit(),
            Err(EpisodicBufferError::DimensionMismatch(_))
        ));
        assert!(buffer.is_empty());
        assert!(buffer.has_staged());
        assert_eq!(buffer.num_episodes(), 0);
    }

    #[test]
    fn test_commit_rejects_later_layout_change() {
        let mut buffer = buffer(&[2]);
        buffer.stage(vec![Episode::new()
            .with_field("obs", vec![0, 1])
            .with_field("a", vec![0, 1])
            .with_field("b", vec![0, 1])]);
        assert!(matches!(
            buffer.commit(),
            Err(EpisodicBufferError::DimensionMismatch(_))
        ));
        assert_eq!(buffer.num_steps(), 2);
    }

    #[test]
    fn test_commit_rejects_ragged_episode() {
        let mut buffer = EpisodicBuffer::default();
        buffer.stage(vec![Episode::new()
            .with_field("obs", vec![0, 1, 2])
            .with_field("rew", vec![0, 1])]);
        match buffer.commit() {
            Err(EpisodicBufferError::DimensionMismatch(msg)) => {
                assert!(msg.starts_with("staged episode 0"))
            }
            r => panic!("unexpected result: {:?}", r),
        }
    }

    #[test]
    fn test_episode_counting_on_commit() {
        let mut buffer = EpisodicBuffer::default();
        buffer.stage(vec![episode(0, 2), episode(2, 2)]);
        buffer.stage(vec![episode(0, 3)]);
        assert_eq!(buffer.num_episodes(), 0);
        buffer.commit().unwrap();
        assert_eq!(buffer.num_episodes(), 1);
        assert_eq!(buffer.num_steps(), 3);
    }

    #[test]
    fn test_episode_counting_on_stage() {
        let config = EpisodicBufferConfig::default().episode_counting(EpisodeCounting::OnStage);
        let mut buffer = EpisodicBuffer::new(&config);
        buffer.stage(vec![episode(0, 2), episode(2, 2)]);
        buffer.stage(vec![episode(0, 3)]);
        assert_eq!(buffer.num_episodes(), 3);
        buffer.commit().unwrap();
        assert_eq!(buffer.num_episodes(), 3);
        assert_eq!(buffer.num_steps(), 3);
    }

    #[test]
    fn test_merge() {
        let mut b1 = buffer(&[2, 3]);
        let mut b2 = EpisodicBuffer::default();
        b2.stage(vec![episode(5, 4)]);
        b2.commit().unwrap();

        b1.merge(b2).unwrap();
        let expected = buffer(&[2, 3, 4]);
        assert_eq!(b1.num_steps(), 9);
        assert_eq!(b1.num_episodes(), 3);
        assert_eq!(b1.fields(), expected.fields());
    }

    #[test]
    fn test_merge_into_empty_buffer() {
        let mut b = EpisodicBuffer::default();
        b.merge(buffer(&[2, 3])).unwrap();
        assert_eq!(b.num_steps(), 5);
        assert_eq!(b.num_episodes(), 2);

        // The adopted layout is enforced on later commits
        b.stage(vec![Episode::new().with_field("obs", vec![0])]);
        assert!(b.commit().is_err());
    }

    #[test]
    fn test_merge_rejects_different_field_sets() {
        let mut b1 = buffer(&[2]);
        let mut b2 = EpisodicBuffer::default();
        b2.stage(vec![Episode::new().with_field("obs", vec![0, 1])]);
        b2.commit().unwrap();
        assert!(matches!(
            b1.merge(b2),
            Err(EpisodicBufferError::DimensionMismatch(_))
        ));
        assert_eq!(b1.num_steps(), 2);
        assert_eq!(b1.num_episodes(), 1);
    }

    #[test]
    fn test_merge_rejects_different_layout() {
        let mut b1 = buffer(&[2]);
        let mut b2 = EpisodicBuffer::default();
        b2.stage(vec![Episode::new()
            .with_field("obs", vec![2, 3])
            .with_field("a", vec![20, 30])
            .with_field("b", vec![200, 300])]);
        b2.commit().unwrap();
        assert!(b1.field_names().eq(b2.field_names()));

        match b1.merge(b2) {
            Err(EpisodicBufferError::DimensionMismatch(msg)) => {
                assert!(msg.contains("layout"), "{}", msg)
            }
            r => panic!("unexpected result: {:?}", r),
        }
        assert_eq!(b1.num_steps(), 2);
        assert_eq!(b1.num_episodes(), 1);
    }

    #[test]
    fn test_iter_sequential_without_shuffle() {
        let mut buffer = buffer(&[2, 3, 4]);
        let batches = buffer.iter_sequential(3, 1, None, false).unwrap();
        assert_eq!(batches.remaining(), Some(3));
        assert_eq!(batches.size_hint(), (3, Some(3)));
        let obs = batches
            .map(|b| b.get("obs").unwrap().clone())
            .collect::<Vec<_>>();
        assert_eq!(obs, vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8]]);
    }

    #[test]
    fn test_iter_sequential_drops_partial_batch() {
        let mut buffer = buffer(&[3, 4]);
        let batches = buffer.iter_sequential(3, 2, None, false).unwrap();
        let ixs = batches.map(|b| b.indices().to_vec()).collect::<Vec<_>>();
        assert_eq!(
            ixs,
            vec![vec![0, 1, 2], vec![3, 4, 5], vec![0, 1, 2], vec![3, 4, 5]]
        );
    }

    #[test]
    fn test_iter_sequential_with_shuffle() {
        let mut buffer = buffer(&[5, 6]);
        let mut batches = buffer.iter_sequential(4, 1, None, true).unwrap();
        let order = batches.order().to_vec();
        let mut seen = vec![];
        for batch in &mut batches {
            assert_eq!(batch.len(), 4);
            assert_eq!(batch.get("obs").unwrap(), &batch.indices().to_vec());
            seen.extend_from_slice(batch.indices());
        }
        assert_eq!(seen, order[..8].to_vec());

        let mut sorted = order;
        sorted.sort_unstable();
        assert_eq!(sorted, (0..11).collect::<Vec<_>>());
    }

    #[test]
    fn test_iter_sequential_with_many_epochs() {
        let mut buffer = buffer(&[4, 6]);
        let batches = buffer.iter_sequential(2, usize::MAX, None, false).unwrap();
        assert_eq!(batches.remaining(), None);
        assert_eq!(batches.size_hint(), (usize::MAX, None));
        let ixs = batches
            .take(7)
            .map(|b| b.indices().to_vec())
            .collect::<Vec<_>>();
        assert_eq!(ixs.len(), 7);
        assert_eq!(ixs[5], vec![0, 1]);

        let batches = buffer.iter_sequential(3, usize::MAX / 4, None, false).unwrap();
        assert_eq!(batches.remaining(), Some(usize::MAX / 4 * 3));
    }

    #[test]
    fn test_iter_sequential_shorter_than_batch() {
        let mut buffer = buffer(&[4]);
        let mut batches = buffer
            .iter_sequential(3, usize::MAX, Some(vec![0, 2]), false)
            .unwrap();
        assert_eq!(batches.remaining(), Some(0));
        assert!(batches.next().is_none());
        assert!(batches.next().is_none());

        let mut batches = buffer
            .iter_sequential(1, usize::MAX, Some(vec![]), true)
            .unwrap();
        assert!(batches.next().is_none());
    }

    #[test]
    fn test_iter_once_with_indices() {
        let mut buffer = buffer(&[10]);
        let batches = buffer
            .iter_once(2, Some(vec![7, 3, 5, 1, 9]), false)
            .unwrap()
            .map(|b| b.indices().to_vec())
            .collect::<Vec<_>>();
        assert_eq!(batches, vec![vec![7, 3], vec![5, 1]]);
    }

    #[test]
    fn test_iterators_are_independent() {
        let mut buffer = buffer(&[6]);
        let it1 = buffer.iter_once(2, None, false).unwrap().collect::<Vec<_>>();
        let it2 = buffer.iter_once(2, None, false).unwrap().collect::<Vec<_>>();
        assert_eq!(it1, it2);
        assert_eq!(it1.len(), 3);
    }

    #[test]
    fn test_iteration_errors() {
        let mut empty = EpisodicBuffer::<Vec<f32>>::default();
        assert!(matches!(
            empty.iter_once(1, None, true),
            Err(EpisodicBufferError::EmptyBuffer)
        ));
        assert!(matches!(
            empty.sample_random(1, None),
            Err(EpisodicBufferError::EmptyBuffer)
        ));
        assert!(matches!(
            empty.full_batches(1),
            Err(EpisodicBufferError::EmptyBuffer)
        ));

        let mut buffer = buffer(&[4]);
        assert!(matches!(
            buffer.iter_once(0, None, true),
            Err(EpisodicBufferError::InvalidArgument(_))
        ));
        assert!(matches!(
            buffer.iter_once(1, Some(vec![0, 4]), true),
            Err(EpisodicBufferError::IndexOutOfRange {
                index: 4,
                num_steps: 4
            })
        ));
    }

    #[test]
    fn test_sample_random_has_successor() {
        let mut buffer = buffer(&[5, 5]);
        let indices = vec![0, 1, 2, 3, 4, 6, 8, 9];
        for _ in 0..20 {
            let batch = buffer.sample_random(16, Some(indices.clone())).unwrap();
            assert_eq!(batch.len(), 16);
            assert_eq!(batch.get("obs").unwrap(), &batch.indices().to_vec());
            for &ix in batch.indices() {
                assert!(indices.contains(&(ix + 1)), "{} has no successor", ix);
            }
        }
    }

    #[test]
    fn test_sample_random_never_draws_last_step() {
        let mut buffer = buffer(&[3]);
        let batch = buffer.sample_random(64, None).unwrap();
        assert!(batch.indices().iter().all(|&ix| ix < 2));
    }

    #[test]
    fn test_sample_random_unsatisfiable() {
        let mut buffer = buffer(&[10]);
        assert!(matches!(
            buffer.sample_random(4, Some(vec![1, 3, 5])),
            Err(EpisodicBufferError::InvalidState(_))
        ));
        assert!(matches!(
            buffer.sample_random(4, Some(vec![])),
            Err(EpisodicBufferError::InvalidState(_))
        ));

        let mut single = self::buffer(&[1]);
        assert!(matches!(
            single.sample_random(1, None),
            Err(EpisodicBufferError::InvalidState(_))
        ));
    }

    #[test]
    fn test_sample_random_weights_duplicated_indices() {
        let mut buffer = buffer(&[10]);
        // Eligible entries are 0, 0, 0 and 5
        let batch = buffer
            .sample_random(4000, Some(vec![0, 0, 0, 1, 5, 6]))
            .unwrap();
        let n0 = batch.indices().iter().filter(|&&ix| ix == 0).count();
        let n5 = batch.indices().iter().filter(|&&ix| ix == 5).count();
        assert_eq!(n0 + n5, 4000);
        assert!((2700..3300).contains(&n0), "step 0 drawn {} times", n0);
    }

    #[test]
    fn test_sample_random_is_reproducible() {
        let mut b1 = buffer(&[8, 8]);
        let mut b2 = buffer(&[8, 8]);
        assert_eq!(
            b1.sample_random(10, None).unwrap(),
            b2.sample_random(10, None).unwrap()
        );
    }

    #[test]
    fn test_sample_random_repeated() {
        let mut buffer = buffer(&[4, 4]);
        let batches = buffer.sample_random_repeated(5, 3, None).unwrap();
        assert_eq!(batches.len(), 3);
        let batches = batches.collect::<Vec<_>>();
        assert_eq!(batches.len(), 3);
        for batch in batches.iter() {
            assert_eq!(batch.len(), 5);
            assert!(batch.indices().iter().all(|&ix| ix < 7));
        }
    }

    #[test]
    fn test_full_batches() {
        let buffer = buffer(&[2, 3]);
        let batches = buffer.full_batches(2).unwrap().collect::<Vec<_>>();
        assert_eq!(batches.len(), 2);
        assert!(std::ptr::eq(batches[0], batches[1]));
        assert!(std::ptr::eq(batches[0], buffer.fields()));
    }

    #[test]
    fn test_buffer_traits() {
        let mut buffer = EpisodicBuffer::build(&EpisodicBufferConfig::default());
        buffer.push(vec![episode(0, 3), episode(3, 3)]).unwrap();
        assert_eq!(ExperienceBufferBase::len(&buffer), 6);
        let batch = buffer.batch(4).unwrap();
        assert_eq!(batch.len(), 4);
        assert!(batch.indices().iter().all(|&ix| ix < 5));
    }
}
