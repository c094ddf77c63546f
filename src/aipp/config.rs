//! Per-node preprocessing configuration records and their extraction from a
//! model's custom data.
//!
//! The custom-data value is a packed array of [`AippPreprocessConfig`]
//! records, each exactly [`AippPreprocessConfig::ENCODED_LEN`] bytes.

use serde::Serialize;

use super::format::ImageFormat;
use super::params::{
    AippFunc, ChannelSwapPara, CropPara, CscMatrixPara, CscPara, DtcPara, PadPara, ParamRecord,
    ResizePara, RotatePara,
};
use crate::error::{AippError, Result};
use crate::wire::{ByteReader, ByteWriter};

/// Discriminator of custom data carrying preprocessing configuration.
pub const AIPP_PREPROCESS_TYPE: &str = "AippPreprocessConfig";

/// Maximum number of dynamic parameter inputs per AIPP node.
pub const MAX_AIPP_FUNC_SIZE: usize = 7;

/// One dynamic parameter input of a node: where it sits in the caller's
/// input list and which feature it configures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AippConfigDataInfo {
    pub idx: i32,
    pub func: AippFunc,
}

/// Static parameters baked in at build time, with per-feature enable flags.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AippParamInfo {
    pub input_format: ImageFormat,
    pub enable_crop: bool,
    pub crop_para: CropPara,
    pub channel_swap_para: ChannelSwapPara,
    pub enable_csc: bool,
    pub csc_para: CscPara,
    pub csc_matrix_para: CscMatrixPara,
    pub enable_resize: bool,
    pub resize_para: ResizePara,
    pub enable_dtc: bool,
    pub dtc_para: DtcPara,
    pub enable_padding: bool,
    pub padding_para: PadPara,
    pub enable_rotate: bool,
    pub rotate_para: RotatePara,
}

fn put_flag(w: &mut ByteWriter, flag: bool) {
    w.put_bool(flag);
    w.put_zeros(3);
}

fn read_flag(r: &mut ByteReader<'_>, field: &str) -> Result<bool> {
    let flag = r.read_bool(field)?;
    r.skip(3, field)?;
    Ok(flag)
}

impl ParamRecord for AippParamInfo {
    const NAME: &'static str = "AippParamInfo";
    // Input format plus six padded enable flags, then the records.
    const ENCODED_LEN: usize = 4
        + 6 * 4
        + CropPara::ENCODED_LEN
        + ChannelSwapPara::ENCODED_LEN
        + CscPara::ENCODED_LEN
        + CscMatrixPara::ENCODED_LEN
        + ResizePara::ENCODED_LEN
        + DtcPara::ENCODED_LEN
        + PadPara::ENCODED_LEN
        + RotatePara::ENCODED_LEN;

    fn write_to(&self, w: &mut ByteWriter) {
        w.put_i32(self.input_format.code());
        put_flag(w, self.enable_crop);
        self.crop_para.write_to(w);
        self.channel_swap_para.write_to(w);
        put_flag(w, self.enable_csc);
        self.csc_para.write_to(w);
        self.csc_matrix_para.write_to(w);
        put_flag(w, self.enable_resize);
        self.resize_para.write_to(w);
        put_flag(w, self.enable_dtc);
        self.dtc_para.write_to(w);
        put_flag(w, self.enable_padding);
        self.padding_para.write_to(w);
        put_flag(w, self.enable_rotate);
        self.rotate_para.write_to(w);
    }

    fn read_from(r: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            input_format: ImageFormat::from_code(r.read_i32("param_info.input_format")?),
            enable_crop: read_flag(r, "param_info.enable_crop")?,
            crop_para: CropPara::read_from(r)?,
            channel_swap_para: ChannelSwapPara::read_from(r)?,
            enable_csc: read_flag(r, "param_info.enable_csc")?,
            csc_para: CscPara::read_from(r)?,
            csc_matrix_para: CscMatrixPara::read_from(r)?,
            enable_resize: read_flag(r, "param_info.enable_resize")?,
            resize_para: ResizePara::read_from(r)?,
            enable_dtc: read_flag(r, "param_info.enable_dtc")?,
            dtc_para: DtcPara::read_from(r)?,
            enable_padding: read_flag(r, "param_info.enable_padding")?,
            padding_para: PadPara::read_from(r)?,
            enable_rotate: read_flag(r, "param_info.enable_rotate")?,
            rotate_para: RotatePara::read_from(r)?,
        })
    }
}

/// Configuration of one AIPP-enabled graph input node.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AippPreprocessConfig {
    /// Index into the caller-facing input list.
    pub graph_data_idx: i32,
    /// Index into the data-only input list the compiled model consumes.
    pub tensor_data_idx: i32,
    /// Dynamic parameter inputs, at most [`MAX_AIPP_FUNC_SIZE`].
    pub config_data: Vec<AippConfigDataInfo>,
    pub aipp_param_info: AippParamInfo,
}

impl AippPreprocessConfig {
    /// Index of the dynamic input configuring `func`, if any.
    pub fn dynamic_input(&self, func: AippFunc) -> Option<usize> {
        self.config_data
            .iter()
            .find(|info| info.func == func && info.idx >= 0)
            .map(|info| info.idx as usize)
    }
}

impl ParamRecord for AippPreprocessConfig {
    const NAME: &'static str = "AippPreprocessConfig";
    const ENCODED_LEN: usize = 12 + MAX_AIPP_FUNC_SIZE * 8 + AippParamInfo::ENCODED_LEN;

    /// Only the first [`MAX_AIPP_FUNC_SIZE`] entries of `config_data` are
    /// representable; use [`encode_configs`] to reject longer lists.
    fn write_to(&self, w: &mut ByteWriter) {
        let count = self.config_data.len().min(MAX_AIPP_FUNC_SIZE);
        if count < self.config_data.len() {
            tracing::warn!(
                entries = self.config_data.len(),
                max = MAX_AIPP_FUNC_SIZE,
                "dynamic config entries truncated"
            );
        }
        w.put_i32(self.graph_data_idx);
        w.put_i32(self.tensor_data_idx);
        w.put_i32(count as i32);
        for info in &self.config_data[..count] {
            w.put_i32(info.idx);
            w.put_i32(info.func.code());
        }
        w.put_zeros((MAX_AIPP_FUNC_SIZE - count) * 8);
        self.aipp_param_info.write_to(w);
    }

    fn read_from(r: &mut ByteReader<'_>) -> Result<Self> {
        let graph_data_idx = r.read_i32("config.graph_data_idx")?;
        let tensor_data_idx = r.read_i32("config.tensor_data_idx")?;
        let raw_count = r.read_i32("config.config_data_cnt")?;
        if raw_count > MAX_AIPP_FUNC_SIZE as i32 {
            return Err(AippError::InvalidArgument(format!(
                "config_data_cnt {} exceeds {}",
                raw_count, MAX_AIPP_FUNC_SIZE
            )));
        }
        let count = raw_count.max(0) as usize;

        let mut config_data = Vec::with_capacity(count);
        for slot in 0..MAX_AIPP_FUNC_SIZE {
            let idx = r.read_i32("config.data_info.idx")?;
            let func = r.read_i32("config.data_info.type")?;
            if slot < count {
                config_data.push(AippConfigDataInfo {
                    idx,
                    func: AippFunc::from_code(func)?,
                });
            }
        }

        Ok(Self {
            graph_data_idx,
            tensor_data_idx,
            config_data,
            aipp_param_info: AippParamInfo::read_from(r)?,
        })
    }
}

/// Configs of every AIPP node plus the number of dynamic inputs they declare.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractedConfigs {
    pub configs: Vec<AippPreprocessConfig>,
    pub dynamic_input_count: usize,
}

/// Interpret a custom-data value as a packed array of config records.
pub fn extract_configs(value: &[u8]) -> Result<ExtractedConfigs> {
    let record_len = AippPreprocessConfig::ENCODED_LEN;
    if value.len() % record_len != 0 {
        tracing::warn!(
            len = value.len(),
            record_len,
            "AIPP config value is not a whole number of records"
        );
        return Err(AippError::Corrupt(format!(
            "config value of {} bytes is not a multiple of {}",
            value.len(),
            record_len
        )));
    }

    let configs = value
        .chunks_exact(record_len)
        .map(AippPreprocessConfig::from_bytes)
        .collect::<Result<Vec<_>>>()?;
    let dynamic_input_count = configs.iter().map(|c| c.config_data.len()).sum();

    tracing::debug!(configs = configs.len(), dynamic_input_count, "extracted AIPP configs");
    Ok(ExtractedConfigs {
        configs,
        dynamic_input_count,
    })
}

/// Pack config records into a custom-data value.
///
/// Fails with `InvalidArgument` if a node declares more than
/// [`MAX_AIPP_FUNC_SIZE`] dynamic inputs.
pub fn encode_configs(configs: &[AippPreprocessConfig]) -> Result<Vec<u8>> {
    if let Some((node, config)) = configs
        .iter()
        .enumerate()
        .find(|(_, c)| c.config_data.len() > MAX_AIPP_FUNC_SIZE)
    {
        return Err(AippError::InvalidArgument(format!(
            "node {} declares {} dynamic inputs, at most {} fit in a record",
            node,
            config.config_data.len(),
            MAX_AIPP_FUNC_SIZE
        )));
    }
    let mut w = ByteWriter::with_capacity(configs.len() * AippPreprocessConfig::ENCODED_LEN);
    for config in configs {
        config.write_to(&mut w);
    }
    Ok(w.into_inner())
}
