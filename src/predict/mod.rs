pub mod dense;
pub mod gateway;
pub mod normalize;
pub mod result;
pub mod scheduler;
pub mod state;
pub mod tensor;
pub mod view;

pub use gateway::{InferenceGateway, ProbabilityVector};
pub use result::{PredictionLog, PredictionResult};
pub use scheduler::{CycleOutcome, HaltReason, PredictionScheduler, StrokeEndSource};
pub use tensor::InputTensor;
