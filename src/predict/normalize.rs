use crate::draw::bitmap::RgbaBuffer;
use crate::predict::tensor::InputTensor;
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgba};
use ndarray::Array4;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResampleFilter {
    #[default]
    Bilinear,
    Nearest,
}

impl From<ResampleFilter> for FilterType {
    fn from(filter: ResampleFilter) -> Self {
        match filter {
            ResampleFilter::Bilinear => FilterType::Triangle,
            ResampleFilter::Nearest => FilterType::Nearest,
        }
    }
}

/// Turns the canvas bitmap into the tensor the model was trained on: the
/// drawing is shrunk to `resize_side`, reduced to one intensity channel and
/// framed by `padding` empty pixels on every side.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizerSettings {
    #[serde(default = "default_resize_side")]
    pub resize_side: u32,
    #[serde(default = "default_padding")]
    pub padding: u32,
    #[serde(default)]
    pub filter: ResampleFilter,
}

fn default_resize_side() -> u32 {
    28
}

fn default_padding() -> u32 {
    2
}

impl Default for NormalizerSettings {
    fn default() -> Self {
        Self {
            resize_side: default_resize_side(),
            padding: default_padding(),
            filter: ResampleFilter::default(),
        }
    }
}

impl NormalizerSettings {
    pub fn input_side(&self) -> usize {
        (self.resize_side + 2 * self.padding) as usize
    }

    pub fn normalize(&self, bitmap: &RgbaBuffer) -> InputTensor {
        let side = self.input_side();
        let mut data = Array4::<f32>::zeros((1, side, side, 1));
        if bitmap.is_empty() || self.resize_side == 0 {
            return InputTensor::from_array(data);
        }

        let Some(source) = ImageBuffer::<Rgba<u8>, &[u8]>::from_raw(
            bitmap.width,
            bitmap.height,
            bitmap.pixels.as_slice(),
        ) else {
            tracing::warn!(
                width = bitmap.width,
                height = bitmap.height,
                "bitmap size does not match its pixel buffer; using a blank tensor"
            );
            return InputTensor::from_array(data);
        };

        let resized = imageops::resize(
            &source,
            self.resize_side,
            self.resize_side,
            self.filter.into(),
        );
        let pad = self.padding as usize;
        for (x, y, px) in resized.enumerate_pixels() {
            // Alpha is dropped, as a browser pixel read does.
            let intensity = (px[0] as f32 + px[1] as f32 + px[2] as f32) / 3.0;
            data[[0, y as usize + pad, x as usize + pad, 0]] = intensity / 255.0;
        }
        InputTensor::from_array(data)
    }
}
