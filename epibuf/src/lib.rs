#![warn(missing_docs)]
//! An in-memory episodic buffer for training reinforcement learning agents.
//!
//! Episodes collected by interacting with environments are registered to an
//! [`EpisodicBuffer`], which keeps their steps as one flat array per field.
//! Training code then draws batches from the buffer by iterating over
//! mini-batches, sampling at random, or taking the whole storage.
//!
//! The stored arrays are generic over [`FieldArray`]; `Vec<T>` and
//! [`ndarray::ArrayD`] are supported out of the box.
pub mod episode;
pub mod episodic_buffer;
pub mod error;

mod base;
pub use base::{ExperienceBufferBase, FieldArray, ReplayBufferBase};
pub use episode::{Episode, FieldValue};
pub use episodic_buffer::{Batch, EpisodeCounting, EpisodicBuffer, EpisodicBufferConfig};
pub use error::EpisodicBufferError;
