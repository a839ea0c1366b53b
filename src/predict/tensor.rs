use ndarray::{Array4, ArrayView4};

/// Model input: shape `[1, side, side, 1]`, values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    data: Array4<f32>,
}

impl InputTensor {
    pub fn zeros(side: usize) -> Self {
        Self {
            data: Array4::zeros((1, side, side, 1)),
        }
    }

    pub(crate) fn from_array(data: Array4<f32>) -> Self {
        debug_assert_eq!(data.shape()[0], 1);
        debug_assert_eq!(data.shape()[3], 1);
        Self { data }
    }

    pub fn side(&self) -> usize {
        self.data.shape()[1]
    }

    pub fn shape(&self) -> [usize; 4] {
        let shape = self.data.shape();
        [shape[0], shape[1], shape[2], shape[3]]
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[[0, row, col, 0]]
    }

    pub fn sum(&self) -> f32 {
        self.data.sum()
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.data.view()
    }

    /// Row-major pixel values, the layout dense models consume.
    pub fn flattened(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }
}
