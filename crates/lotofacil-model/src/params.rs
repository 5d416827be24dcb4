use crate::ShapeMismatchError;

/// Ordered list of flat parameter tensors.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Parameters {
    tensors: Vec<Vec<f32>>,
}

impl Parameters {
    pub(crate) fn new(tensors: Vec<Vec<f32>>) -> Self {
        Self { tensors }
    }

    /// Wraps `tensors` after checking them against `lengths`.
    pub(crate) fn with_lengths(
        lengths: &[usize],
        tensors: Vec<Vec<f32>>,
    ) -> Result<Self, ShapeMismatchError> {
        check_lengths(lengths, &tensors)?;
        Ok(Self { tensors })
    }

    pub(crate) fn zeros_like(&self) -> Self {
        Self {
            tensors: self.tensors.iter().map(|t| vec![0.0; t.len()]).collect(),
        }
    }

    pub(crate) fn tensor(&self, index: usize) -> &[f32] {
        &self.tensors[index]
    }

    pub(crate) fn tensor_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.tensors[index]
    }

    pub(crate) fn tensors(&self) -> &[Vec<f32>] {
        &self.tensors
    }

    pub(crate) fn tensors_mut(&mut self) -> &mut [Vec<f32>] {
        &mut self.tensors
    }

    pub(crate) fn lengths(&self) -> Vec<usize> {
        self.tensors.iter().map(Vec::len).collect()
    }

    /// Replaces every tensor, rejecting any count or length change.
    pub(crate) fn assign(&mut self, tensors: &[Vec<f32>]) -> Result<(), ShapeMismatchError> {
        check_lengths(&self.lengths(), tensors)?;
        for (dst, src) in self.tensors.iter_mut().zip(tensors) {
            dst.copy_from_slice(src);
        }
        Ok(())
    }

    pub(crate) fn all_finite(&self) -> bool {
        self.tensors.iter().flatten().all(|v| v.is_finite())
    }

    /// Adds `other` element-wise. Both sets must have the same lengths.
    pub(crate) fn accumulate(&mut self, other: &Self) {
        for (dst, src) in self.tensors.iter_mut().zip(&other.tensors) {
            for (d, s) in dst.iter_mut().zip(src) {
                *d += s;
            }
        }
    }

    pub(crate) fn scale(&mut self, factor: f32) {
        for v in self.tensors.iter_mut().flatten() {
            *v *= factor;
        }
    }

    pub(crate) fn clamp(&mut self, limit: f32) {
        for v in self.tensors.iter_mut().flatten() {
            *v = v.clamp(-limit, limit);
        }
    }
}

pub(crate) fn check_lengths(
    lengths: &[usize],
    tensors: &[Vec<f32>],
) -> Result<(), ShapeMismatchError> {
    ShapeMismatchError::check("tensor count", lengths.len(), tensors.len())?;
    for (i, (&expected, tensor)) in lengths.iter().zip(tensors).enumerate() {
        ShapeMismatchError::check(format_args!("tensor {i} length"), expected, tensor.len())?;
    }
    Ok(())
}
