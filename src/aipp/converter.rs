//! Remapping between caller-facing inputs and the model's data-only inputs.
//!
//! [`convert_inputs`] runs at inference time: it splits the caller's tensors
//! into the data tensors the compiled model consumes and one resolved
//! [`AippPara`] per AIPP node. [`convert_input_tensor_descs`] is the
//! introspection-time inverse over descriptors. Both derive slot roles from
//! the same [`InputLayout`], and both return output only on success.

use std::sync::Arc;

use super::config::{extract_configs, AippPreprocessConfig};
use super::layout::{InputLayout, SlotRole};
use super::para::AippPara;
use super::params::{
    AippFunc, ChannelSwapPara, CropPara, CscMatrixPara, CscPara, DtcPara, PadPara, ParamRecord,
    ResizePara,
};
use crate::error::{AippError, Result};
use crate::model::custom_data::CustomModelData;
use crate::model::tensor::{TensorBuffer, TensorDesc};

/// Caller inputs split for execution.
#[derive(Debug, Clone)]
pub struct ConvertedInputs {
    /// Tensors in the compiled model's input order.
    pub data_inputs: Vec<Arc<dyn TensorBuffer>>,
    /// One entry per AIPP node, in config order.
    pub aipp_paras: Vec<AippPara>,
}

/// Split `inputs` according to the AIPP configs carried by `custom_data`.
///
/// Custom data of any other type leaves the inputs untouched.
pub fn convert_inputs(
    inputs: &[Arc<dyn TensorBuffer>],
    custom_data: &CustomModelData,
) -> Result<ConvertedInputs> {
    if !custom_data.is_aipp() {
        return Ok(ConvertedInputs {
            data_inputs: inputs.to_vec(),
            aipp_paras: Vec::new(),
        });
    }
    let extracted = extract_configs(&custom_data.value)?;
    convert_inputs_with_configs(inputs, &extracted.configs)
}

/// [`convert_inputs`] over already extracted configs.
pub fn convert_inputs_with_configs(
    inputs: &[Arc<dyn TensorBuffer>],
    configs: &[AippPreprocessConfig],
) -> Result<ConvertedInputs> {
    let layout = InputLayout::plan(configs, inputs.len())?;

    let aipp_paras = configs
        .iter()
        .enumerate()
        .map(|(node, config)| resolve_node(node, config, inputs))
        .collect::<Result<Vec<_>>>()?;
    let data_inputs = layout
        .data_sources()
        .iter()
        .map(|&slot| Arc::clone(&inputs[slot]))
        .collect();

    tracing::debug!(
        inputs = inputs.len(),
        configs = configs.len(),
        dynamic_inputs = inputs.len() - layout.data_len(),
        "converted AIPP inputs"
    );
    Ok(ConvertedInputs {
        data_inputs,
        aipp_paras,
    })
}

/// Expand the model's data-only descriptors into the caller-facing list.
///
/// Dynamic parameter slots get a `[1, size, 1, 1]` UINT8 NCHW descriptor.
/// Custom data of any other type returns `data_descs` unchanged.
pub fn convert_input_tensor_descs(
    custom_data: &CustomModelData,
    data_descs: &[TensorDesc],
) -> Result<Vec<TensorDesc>> {
    if !custom_data.is_aipp() {
        return Ok(data_descs.to_vec());
    }
    let extracted = extract_configs(&custom_data.value)?;
    convert_descs_with_configs(&extracted.configs, data_descs)
}

/// [`convert_input_tensor_descs`] over already extracted configs.
pub fn convert_descs_with_configs(
    configs: &[AippPreprocessConfig],
    data_descs: &[TensorDesc],
) -> Result<Vec<TensorDesc>> {
    let layout = InputLayout::plan_for_data(configs, data_descs.len())?;
    layout
        .roles()
        .iter()
        .map(|role| match *role {
            SlotRole::AippData { tensor_idx, .. } | SlotRole::Data { tensor_idx } => {
                Ok(data_descs[tensor_idx].clone())
            }
            SlotRole::Dynamic { func, .. } => func
                .param_size()
                .map(TensorDesc::bytes)
                .ok_or_else(|| AippError::Unsupported(format!("{:?} has no parameter size", func))),
        })
        .collect()
}

/// Parse the dynamic tensor configuring `func`, if the node has one.
fn dynamic_param<P: ParamRecord>(
    config: &AippPreprocessConfig,
    func: AippFunc,
    inputs: &[Arc<dyn TensorBuffer>],
) -> Result<Option<P>> {
    let Some(idx) = config.dynamic_input(func) else {
        return Ok(None);
    };
    let tensor = inputs
        .get(idx)
        .ok_or_else(|| AippError::out_of_range("dynamic input", idx as i64, inputs.len()))?;
    P::from_bytes(tensor.data()).map(Some).map_err(|e| {
        tracing::error!(func = ?func, size = tensor.size(), expected = P::ENCODED_LEN, "bad dynamic AIPP parameter");
        e
    })
}

fn check_extent(what: &str, w: u32, h: u32, max_w: u32, max_h: u32) -> Result<()> {
    if w > max_w || h > max_h {
        tracing::error!(what, w, h, max_w, max_h, "dynamic AIPP extent exceeds configured maximum");
        return Err(AippError::ConstraintViolation(format!(
            "{} {}x{} exceeds configured {}x{}",
            what, w, h, max_w, max_h
        )));
    }
    Ok(())
}

fn resolve_node(
    node: usize,
    config: &AippPreprocessConfig,
    inputs: &[Arc<dyn TensorBuffer>],
) -> Result<AippPara> {
    let info = &config.aipp_param_info;
    let mut para = AippPara::new(1)?;
    para.set_input_aipp_index(node as u32);
    para.set_input_index(config.tensor_data_idx as u32);

    if let Some(image) = inputs[config.graph_data_idx as usize].image() {
        if let Err(e) = para.set_input_format(image.format) {
            tracing::warn!(node, error = %e, "image input format not applied");
        }
        para.set_input_shape(image.width, image.height);
    }

    match dynamic_param::<CropPara>(config, AippFunc::Crop, inputs)? {
        Some(crop) => {
            let max = &info.crop_para;
            check_extent("crop size", crop.crop_size_w, crop.crop_size_h, max.crop_size_w, max.crop_size_h)?;
            para.set_crop(0, &crop)?;
        }
        None if info.enable_crop => para.set_crop(0, &info.crop_para)?,
        None => {}
    }

    let swap = dynamic_param::<ChannelSwapPara>(config, AippFunc::ChannelSwap, inputs)?
        .unwrap_or(info.channel_swap_para);
    para.set_channel_swap(&swap);

    resolve_csc(&mut para, config, inputs)?;

    match dynamic_param::<ResizePara>(config, AippFunc::Resize, inputs)? {
        Some(resize) => {
            let max = &info.resize_para;
            check_extent(
                "resize output",
                resize.resize_output_size_w,
                resize.resize_output_size_h,
                max.resize_output_size_w,
                max.resize_output_size_h,
            )?;
            para.set_resize(0, &resize)?;
        }
        None if info.enable_resize => para.set_resize(0, &info.resize_para)?,
        None => {}
    }

    match dynamic_param::<DtcPara>(config, AippFunc::DataTypeConversion, inputs)? {
        Some(dtc) => para.set_dtc(0, &dtc)?,
        None if info.enable_dtc => para.set_dtc(0, &info.dtc_para)?,
        None => {}
    }

    match dynamic_param::<PadPara>(config, AippFunc::Padding, inputs)? {
        Some(pad) => para.set_padding(0, &pad)?,
        None if info.enable_padding => para.set_padding(0, &info.padding_para)?,
        None => {}
    }

    Ok(para)
}

/// A dynamic csc tensor holds either a full matrix or a target format plus
/// colour space; the record size tells them apart.
fn resolve_csc(
    para: &mut AippPara,
    config: &AippPreprocessConfig,
    inputs: &[Arc<dyn TensorBuffer>],
) -> Result<()> {
    let info = &config.aipp_param_info;
    let Some(idx) = config.dynamic_input(AippFunc::ColorSpaceConversion) else {
        if info.enable_csc {
            para.set_csc_matrix(&info.csc_matrix_para);
        }
        return Ok(());
    };
    let tensor = inputs
        .get(idx)
        .ok_or_else(|| AippError::out_of_range("dynamic input", idx as i64, inputs.len()))?;

    match tensor.size() {
        CscMatrixPara::ENCODED_LEN => {
            para.set_csc_matrix(&CscMatrixPara::from_bytes(tensor.data())?);
            Ok(())
        }
        CscPara::ENCODED_LEN => {
            let csc = CscPara::from_bytes(tensor.data())?;
            let expected = info.csc_matrix_para.output_format;
            if csc.output_format != expected {
                tracing::error!(
                    output = csc.output_format.name(),
                    expected = expected.name(),
                    "dynamic CSC output format differs from the model"
                );
                return Err(AippError::ConstraintViolation(format!(
                    "CSC output format {} does not match configured {}",
                    csc.output_format.name(),
                    expected.name()
                )));
            }
            para.set_csc(csc.output_format, csc.image_color_space)
        }
        actual => {
            tracing::error!(size = actual, "dynamic CSC parameter has unexpected size");
            Err(AippError::SizeMismatch {
                what: CscPara::NAME,
                expected: CscPara::ENCODED_LEN,
                actual,
            })
        }
    }
}
