use crate::predict::tensor::InputTensor;
use anyhow::Result;

pub const NUM_CLASSES: usize = 10;

/// Anything that can turn a normalized drawing into class probabilities.
pub trait InferenceGateway {
    fn predict(&mut self, tensor: &InputTensor) -> Result<ProbabilityVector>;
}

impl<G: InferenceGateway + ?Sized> InferenceGateway for Box<G> {
    fn predict(&mut self, tensor: &InputTensor) -> Result<ProbabilityVector> {
        (**self).predict(tensor)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityVector(Vec<f32>);

impl ProbabilityVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Index of the largest probability; the first one wins on ties and NaN
    /// entries never win.
    pub fn argmax(&self) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (idx, &value) in self.0.iter().enumerate() {
            if value.is_nan() {
                continue;
            }
            match best {
                Some((_, current)) if value <= current => {}
                _ => best = Some((idx, value)),
            }
        }
        best.map(|(idx, _)| idx)
    }

    pub fn max(&self) -> Option<f32> {
        self.argmax().map(|idx| self.0[idx])
    }
}
