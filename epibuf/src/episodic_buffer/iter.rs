//! Iterators over batches of the episodic buffer.
//!
//! Each iterator owns its index ordering and its position in it, so that
//! iterators created from the same buffer do not interfere with each other.
use super::{Batch, Fields};
use crate::FieldArray;
use rand::{rngs::StdRng, Rng};
use std::iter::{self, FusedIterator};

/// Batches of consecutive entries of a fixed index ordering, repeated over epochs.
///
/// Created by [`EpisodicBuffer::iter_sequential`](super::EpisodicBuffer::iter_sequential)
/// and [`EpisodicBuffer::iter_once`](super::EpisodicBuffer::iter_once).
/// The last entries of the ordering that do not fill a whole batch are not
/// yielded. The same ordering is used in every epoch.
///
/// The number of batches may exceed `usize::MAX` for a large number of epochs,
/// so the iterator does not implement [`ExactSizeIterator`]; see
/// [`SequentialBatches::remaining`].
#[derive(Debug)]
pub struct SequentialBatches<'a, A> {
    fields: &'a Fields<A>,
    order: Vec<usize>,
    batch_size: usize,
    cursor: usize,
    epochs_left: usize,
}

impl<'a, A> SequentialBatches<'a, A> {
    pub(super) fn new(
        fields: &'a Fields<A>,
        order: Vec<usize>,
        batch_size: usize,
        epochs: usize,
    ) -> Self {
        Self {
            fields,
            order,
            batch_size,
            cursor: 0,
            epochs_left: epochs,
        }
    }

    /// Returns the index ordering shared by all epochs.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Returns the number of batches yielded in a single epoch.
    pub fn batches_per_epoch(&self) -> usize {
        self.order.len() / self.batch_size
    }

    /// Returns the number of batches left, or `None` if it overflows `usize`.
    pub fn remaining(&self) -> Option<usize> {
        if self.epochs_left == 0 {
            return Some(0);
        }
        let in_epoch = (self.order.len() - self.cursor) / self.batch_size;
        self.batches_per_epoch()
            .checked_mul(self.epochs_left - 1)?
            .checked_add(in_epoch)
    }
}

impl<'a, A: FieldArray> Iterator for SequentialBatches<'a, A> {
    type Item = Batch<A>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.batches_per_epoch() == 0 {
            self.epochs_left = 0;
        }
        while self.epochs_left > 0 {
            let end = self.cursor + self.batch_size;
            if end <= self.order.len() {
                let ixs = self.order[self.cursor..end].to_vec();
                self.cursor = end;
                return Some(Batch::select(self.fields, ixs));
            }

            // End of epoch
            self.cursor = 0;
            self.epochs_left -= 1;
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.remaining() {
            Some(n) => (n, Some(n)),
            None => (usize::MAX, None),
        }
    }
}

impl<'a, A: FieldArray> FusedIterator for SequentialBatches<'a, A> {}

/// Independent random batches.
///
/// Created by [`EpisodicBuffer::sample_random_repeated`](super::EpisodicBuffer::sample_random_repeated).
#[derive(Debug)]
pub struct RandomBatches<'a, A> {
    fields: &'a Fields<A>,
    rng: &'a mut StdRng,
    eligible: Vec<usize>,
    batch_size: usize,
    remaining: usize,
}

impl<'a, A> RandomBatches<'a, A> {
    pub(super) fn new(
        fields: &'a Fields<A>,
        rng: &'a mut StdRng,
        eligible: Vec<usize>,
        batch_size: usize,
        epochs: usize,
    ) -> Self {
        Self {
            fields,
            rng,
            eligible,
            batch_size,
            remaining: epochs,
        }
    }
}

impl<'a, A: FieldArray> Iterator for RandomBatches<'a, A> {
    type Item = Batch<A>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(draw_batch(
            self.fields,
            &mut *self.rng,
            &self.eligible,
            self.batch_size,
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, A: FieldArray> ExactSizeIterator for RandomBatches<'a, A> {}

impl<'a, A: FieldArray> FusedIterator for RandomBatches<'a, A> {}

/// The whole field storage, repeated over epochs.
///
/// Created by [`EpisodicBuffer::full_batches`](super::EpisodicBuffer::full_batches).
pub type FullBatches<'a, A> = iter::Take<iter::Repeat<&'a Fields<A>>>;

/// Draws `batch_size` entries of `eligible` uniformly with replacement.
///
/// `eligible` must not be empty.
pub(super) fn draw_batch<A: FieldArray>(
    fields: &Fields<A>,
    rng: &mut StdRng,
    eligible: &[usize],
    batch_size: usize,
) -> Batch<A> {
    let ixs = (0..batch_size)
        .map(|_| eligible[rng.gen_range(0..eligible.len())])
        .collect::<Vec<_>>();
    Batch::select(fields, ixs)
}
