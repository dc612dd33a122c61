//! Numeric arrays stored per field.
use crate::error::{EpisodicBufferError, Result};
use ndarray::{ArrayD, Axis};

/// A numeric array whose first axis is the step axis.
///
/// The buffer never looks inside the values of a field; it only needs to
/// concatenate arrays along the step axis and to gather rows at given step
/// indices. Where the array lives (host memory, device memory) is up to the
/// implementation.
///
/// # Examples
///
/// ```ignore
/// struct TensorField(Tensor);
///
/// impl FieldArray for TensorField {
///     fn len(&self) -> usize {
///         self.0.size()[0] as _
///     }
///
///     fn concat(parts: &[&Self]) -> Result<Self> {
///         // Concatenation along dim 0
///     }
///
///     fn select(&self, ixs: &[usize]) -> Self {
///         // Row gather along dim 0
///     }
/// }
/// ```
pub trait FieldArray: Sized {
    /// Returns the number of steps, i.e., the length of the first axis.
    fn len(&self) -> usize;

    /// Returns `true` if the array has no steps.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Concatenates arrays along the step axis, preserving the order of `parts`.
    ///
    /// # Errors
    ///
    /// Returns [`EpisodicBufferError::DimensionMismatch`] if the arrays cannot be
    /// concatenated, e.g., they differ in the shape of a single step.
    fn concat(parts: &[&Self]) -> Result<Self>;

    /// Gathers the steps at `ixs`, in the order of `ixs`.
    ///
    /// All indices must be smaller than [`FieldArray::len`].
    fn select(&self, ixs: &[usize]) -> Self;
}

/// One scalar per step.
impl<T: Clone> FieldArray for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn concat(parts: &[&Self]) -> Result<Self> {
        let n = parts.iter().map(|p| p.len()).sum();
        let mut out = Vec::with_capacity(n);
        for p in parts.iter() {
            out.extend_from_slice(p);
        }
        Ok(out)
    }

    fn select(&self, ixs: &[usize]) -> Self {
        ixs.iter().map(|&ix| self[ix].clone()).collect()
    }
}

/// An array of arbitrary shape per step.
impl<T: Clone> FieldArray for ArrayD<T> {
    fn len(&self) -> usize {
        self.shape().first().copied().unwrap_or(0)
    }

    fn concat(parts: &[&Self]) -> Result<Self> {
        let views = parts.iter().map(|p| p.view()).collect::<Vec<_>>();
        ndarray::concatenate(Axis(0), &views).map_err(|e| {
            let shapes = parts.iter().map(|p| p.shape()).collect::<Vec<_>>();
            EpisodicBufferError::DimensionMismatch(format!(
                "cannot concatenate arrays of shapes {:?} ({})",
                shapes, e
            ))
        })
    }

    fn select(&self, ixs: &[usize]) -> Self {
        ndarray::ArrayBase::select(self, Axis(0), ixs)
    }
}
