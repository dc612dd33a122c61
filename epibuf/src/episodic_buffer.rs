//! Episodic buffer for on-policy and off-policy training.
//!
//! [`EpisodicBuffer`] receives whole episodes, each a set of named per-step
//! arrays, and stores their steps back to back in one array per field. Training
//! code reads the stored steps in one of the following ways:
//!
//! - [`EpisodicBuffer::iter_sequential`] / [`EpisodicBuffer::iter_once`]:
//!   mini-batches of a (shuffled) index ordering over one or more epochs
//! - [`EpisodicBuffer::sample_random`] / [`EpisodicBuffer::sample_random_repeated`]:
//!   batches drawn with replacement among steps whose next step is stored
//! - [`EpisodicBuffer::full_batches`]: the whole storage at once
//!
//! # Examples
//!
//! ```rust
//! use epibuf::{Episode, EpisodicBuffer, EpisodicBufferConfig};
//!
//! let mut buffer = EpisodicBuffer::new(&EpisodicBufferConfig::default().seed(0));
//! buffer.stage(vec![
//!     Episode::new()
//!         .with_field("obs", vec![0.0f32, 1.0])
//!         .with_nested("act", vec![("a", vec![0.0, 0.0]), ("b", vec![1.0, 1.0])]),
//!     Episode::new()
//!         .with_field("obs", vec![2.0f32, 3.0, 4.0])
//!         .with_nested("act", vec![("a", vec![0.0, 0.0, 0.0]), ("b", vec![1.0, 1.0, 1.0])]),
//! ]);
//! buffer.commit()?;
//! assert_eq!(buffer.num_steps(), 5);
//! assert_eq!(buffer.field_names().collect::<Vec<_>>(), vec!["a", "b", "obs"]);
//!
//! for batch in buffer.iter_sequential(2, 3, None, true)? {
//!     assert_eq!(batch.len(), 2);
//! }
//!
//! let batch = buffer.sample_random(8, None)?;
//! assert!(batch.indices().iter().all(|&ix| ix < 4));
//! # Ok::<(), epibuf::EpisodicBufferError>(())
//! ```
mod base;
mod batch;
mod config;
mod iter;
mod layout;
use std::collections::BTreeMap;

pub use base::EpisodicBuffer;
pub use batch::Batch;
pub use config::{EpisodeCounting, EpisodicBufferConfig};
pub use iter::{FullBatches, RandomBatches, SequentialBatches};
pub use layout::{FieldLayout, FieldSpec};

/// Per-step arrays keyed by field name.
pub type Fields<A> = BTreeMap<String, A>;
