use crate::predict::gateway::{InferenceGateway, ProbabilityVector, NUM_CLASSES};
use crate::predict::tensor::InputTensor;
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Linear,
    Relu,
    Sigmoid,
    Softmax,
}

/// Fully connected layer; `weights[out][in]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
    #[serde(default)]
    pub activation: Activation,
}

impl DenseLayer {
    fn inputs(&self) -> usize {
        self.weights.first().map(Vec::len).unwrap_or(0)
    }

    fn outputs(&self) -> usize {
        self.weights.len()
    }

    fn forward(&self, input: &[f32]) -> Vec<f32> {
        let mut out: Vec<f32> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(row, bias)| row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>() + bias)
            .collect();
        apply_activation(self.activation, &mut out);
        out
    }
}

fn apply_activation(activation: Activation, values: &mut [f32]) {
    match activation {
        Activation::Linear => {}
        Activation::Relu => values.iter_mut().for_each(|v| *v = v.max(0.0)),
        Activation::Sigmoid => values
            .iter_mut()
            .for_each(|v| *v = 1.0 / (1.0 + (-*v).exp())),
        Activation::Softmax => {
            let peak = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let mut total = 0.0;
            for v in values.iter_mut() {
                *v = (*v - peak).exp();
                total += *v;
            }
            if total > 0.0 {
                values.iter_mut().for_each(|v| *v /= total);
            }
        }
    }
}

/// Feed-forward digit classifier stored as a JSON artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DenseModel {
    pub input_side: usize,
    pub layers: Vec<DenseLayer>,
}

impl DenseModel {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading model artifact {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("loading model {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let model: Self = serde_json::from_str(json).context("parsing model json")?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<()> {
        if self.layers.is_empty() {
            bail!("model has no layers");
        }
        let mut expected_inputs = self.input_side * self.input_side;
        for (idx, layer) in self.layers.iter().enumerate() {
            if layer.outputs() == 0 {
                bail!("layer {idx} has no outputs");
            }
            if layer.bias.len() != layer.outputs() {
                bail!(
                    "layer {idx} has {} bias values for {} outputs",
                    layer.bias.len(),
                    layer.outputs()
                );
            }
            if let Some(row) = layer.weights.iter().position(|r| r.len() != expected_inputs) {
                bail!(
                    "layer {idx} row {row} expects {} inputs, previous layer yields {expected_inputs}",
                    layer.weights[row].len()
                );
            }
            expected_inputs = layer.outputs();
        }
        if expected_inputs != NUM_CLASSES {
            bail!("model yields {expected_inputs} classes, expected {NUM_CLASSES}");
        }
        Ok(())
    }

    pub fn forward(&self, input: &[f32]) -> Vec<f32> {
        let mut activations = input.to_vec();
        for layer in &self.layers {
            activations = layer.forward(&activations);
        }
        activations
    }
}

impl InferenceGateway for DenseModel {
    fn predict(&mut self, tensor: &InputTensor) -> Result<ProbabilityVector> {
        if tensor.side() != self.input_side {
            bail!(
                "model expects {side}x{side} input, got {}x{}",
                tensor.side(),
                tensor.side(),
                side = self.input_side
            );
        }
        let Some(first) = self.layers.first() else {
            bail!("model has no layers");
        };
        let input = tensor.flattened();
        if first.inputs() != input.len() {
            bail!(
                "first layer takes {} inputs, tensor has {}",
                first.inputs(),
                input.len()
            );
        }
        Ok(ProbabilityVector::new(self.forward(&input)))
    }
}

/// Loads a [`DenseModel`] on a background thread so the UI keeps running.
pub struct ModelLoader;

impl ModelLoader {
    pub fn spawn(path: impl Into<PathBuf>) -> Result<PendingModel> {
        let path = path.into();
        let (tx, rx) = mpsc::channel();
        std::thread::Builder::new()
            .name("model-loader".into())
            .spawn(move || {
                let _ = tx.send(DenseModel::load(&path));
            })
            .context("spawning model loader thread")?;
        Ok(PendingModel { rx })
    }
}

pub struct PendingModel {
    rx: Receiver<Result<DenseModel>>,
}

impl PendingModel {
    /// `None` while loading; the result is handed out exactly once.
    pub fn try_take(&self) -> Option<Result<DenseModel>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                Some(Err(anyhow!("model loader exited without a result")))
            }
        }
    }
}
