//! AIPP (AI pre-processing) metadata and tensor remapping.
//!
//! Preprocessing parameters are either baked into a model as static
//! defaults or supplied at inference time as extra input tensors. This
//! module parses the per-node configuration a model carries, remaps caller
//! inputs around the dynamic parameter tensors and packs the resolved
//! parameters for the runtime.

pub mod config;
pub mod converter;
pub mod csc;
pub mod format;
pub mod layout;
pub mod para;
pub mod params;

pub use config::{
    encode_configs, extract_configs, AippConfigDataInfo, AippParamInfo, AippPreprocessConfig,
    ExtractedConfigs, AIPP_PREPROCESS_TYPE, MAX_AIPP_FUNC_SIZE,
};
pub use converter::{
    convert_descs_with_configs, convert_input_tensor_descs, convert_inputs,
    convert_inputs_with_configs, ConvertedInputs,
};
pub use format::{ImageColorSpace, ImageFormat};
pub use layout::{fill_unassigned, InputLayout, SlotRole};
pub use para::{AippPara, MAX_BATCH_COUNT};
pub use params::{
    AippFunc, ChannelSwapPara, CropPara, CscMatrixPara, CscPara, DtcPara, PadPara, ParamRecord,
    ResizePara, RotatePara,
};
