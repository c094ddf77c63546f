//! Model buffers: the custom-data envelope, tensor handles and built models.

pub mod built_model;
pub mod custom_data;
pub mod loader;
pub mod tensor;

pub use built_model::{BuiltModel, Capability, CompiledModel, ModelRestorer};
pub use custom_data::{
    decode, encode_into, encode_with_payload, parse_envelope, probe_file, write_custom_data,
    CustomModelData, ModelBuffer, CUSTOM_DATA_MAGIC, ENVELOPE_HEADER_LEN,
};
pub use loader::MappedModel;
pub use tensor::{
    DataType, Format, ImageInfo, ImageTensorBuffer, NdTensorBuffer, TensorBuffer, TensorDesc,
};
