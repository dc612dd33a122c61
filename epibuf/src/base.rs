//! Core abstractions.
mod field_array;
mod replay_buffer;
pub use field_array::FieldArray;
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase};
