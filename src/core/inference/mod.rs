//! Structures and helpers for ONNX Runtime inference.
//!
//! [`OrtInfer`] is the low level engine every backend is built on; the
//! [`tensor`] module holds the tensor types backends exchange with the
//! inference strategies.

pub mod ort_infer;
pub mod session;
pub mod tensor;

pub use ort_infer::OrtInfer;
pub use session::{ModelSource, load_session};
pub use tensor::{Tensor4D, TensorOutputs};
