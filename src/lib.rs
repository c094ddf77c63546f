//! AIPP runtime support.
//!
//! A compiled model may carry opaque custom data in a tagged envelope in
//! front of its payload. When that data describes AIPP (AI pre-processing)
//! nodes, some model inputs take their preprocessing parameters from extra
//! tensors supplied by the caller at inference time.
//!
//! # Layers
//!
//! - [`model::custom_data`]: envelope encode/decode and file probing
//! - [`aipp::config`]: per-node configuration records
//! - [`aipp::converter`]: splits caller inputs into data inputs and packed
//!   [`AippPara`] buffers, and derives caller-facing descriptors
//! - [`model::BuiltModel`]: a compiled model plus its custom data

pub mod aipp;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod telemetry;
pub mod wire;

pub use aipp::{
    convert_input_tensor_descs, convert_inputs, extract_configs, AippPara, AippPreprocessConfig,
    ConvertedInputs, InputLayout,
};
pub use error::{AippError, Result};
pub use model::{BuiltModel, CustomModelData, TensorBuffer, TensorDesc};
