use crate::predict::tensor::InputTensor;
use std::collections::VecDeque;

pub const DIGIT_NAMES: [&str; 10] = [
    "Zero", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine",
];

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub digit: u8,
    pub label: &'static str,
    pub certainty: f32,
    /// Kept only when the session is configured to retain drawings.
    pub source_tensor: Option<InputTensor>,
}

impl PredictionResult {
    /// `None` when `digit` is not a decimal digit.
    pub fn new(digit: usize, certainty: f32, source_tensor: Option<InputTensor>) -> Option<Self> {
        let label = *DIGIT_NAMES.get(digit)?;
        Some(Self {
            digit: digit as u8,
            label,
            certainty: certainty.clamp(0.0, 1.0),
            source_tensor,
        })
    }

    pub fn message(&self) -> String {
        format!("The number drawn is {} ({})", self.digit, self.label)
    }
}

/// Ordered in-memory record of past predictions, oldest first.
#[derive(Debug, Clone, Default)]
pub struct PredictionLog {
    entries: VecDeque<PredictionResult>,
    limit: Option<usize>,
}

impl PredictionLog {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            limit,
        }
    }

    pub fn push(&mut self, result: PredictionResult) {
        if self.limit == Some(0) {
            return;
        }
        self.entries.push_back(result);
        if let Some(limit) = self.limit {
            while self.entries.len() > limit {
                self.entries.pop_front();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&PredictionResult> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PredictionResult> {
        self.entries.iter()
    }
}
