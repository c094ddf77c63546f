//! A compiled model together with the custom data it carries.

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use super::custom_data::{self, CustomModelData};
use super::loader::MappedModel;
use super::tensor::{TensorBuffer, TensorDesc};
use crate::aipp::config::{extract_configs, AippPreprocessConfig};
use crate::aipp::converter::{self, ConvertedInputs};
use crate::error::{AippError, Result};

/// Compiled model owned by the NPU runtime.
pub trait CompiledModel: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn set_name(&mut self, name: &str);

    /// Data-only input descriptors, as the compiled graph consumes them.
    fn input_tensor_descs(&self) -> Vec<TensorDesc>;

    fn output_tensor_descs(&self) -> Vec<TensorDesc>;

    /// Serialized model payload.
    fn serialize(&self) -> Result<Vec<u8>>;
}

/// Rebuilds a [`CompiledModel`] from a serialized payload.
pub trait ModelRestorer {
    fn restore(&self, payload: &[u8]) -> Result<Box<dyn CompiledModel>>;
}

/// What the attached custom data enables.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Capability {
    #[default]
    Base,
    /// Model inputs are preprocessed by the given AIPP nodes.
    Aipp(Vec<AippPreprocessConfig>),
}

impl Capability {
    fn resolve(custom_data: &CustomModelData) -> Result<Self> {
        if !custom_data.is_aipp() {
            return Ok(Self::Base);
        }
        Ok(Self::Aipp(extract_configs(&custom_data.value)?.configs))
    }
}

#[derive(Debug)]
pub struct BuiltModel {
    compiled: Box<dyn CompiledModel>,
    custom_data: CustomModelData,
    capability: Capability,
}

impl BuiltModel {
    pub fn new(compiled: Box<dyn CompiledModel>) -> Self {
        Self {
            compiled,
            custom_data: CustomModelData::default(),
            capability: Capability::Base,
        }
    }

    pub fn with_custom_data(
        compiled: Box<dyn CompiledModel>,
        custom_data: CustomModelData,
    ) -> Result<Self> {
        let mut model = Self::new(compiled);
        model.set_custom_data(custom_data)?;
        Ok(model)
    }

    /// Attach custom data. AIPP configs are parsed here, so a malformed
    /// value is rejected and the previous data is kept.
    pub fn set_custom_data(&mut self, custom_data: CustomModelData) -> Result<()> {
        self.capability = Capability::resolve(&custom_data)?;
        self.custom_data = custom_data;
        Ok(())
    }

    pub fn custom_data(&self) -> &CustomModelData {
        &self.custom_data
    }

    pub fn capability(&self) -> &Capability {
        &self.capability
    }

    pub fn aipp_configs(&self) -> Option<&[AippPreprocessConfig]> {
        match &self.capability {
            Capability::Aipp(configs) => Some(configs),
            Capability::Base => None,
        }
    }

    pub fn compiled(&self) -> &dyn CompiledModel {
        self.compiled.as_ref()
    }

    pub fn name(&self) -> &str {
        self.compiled.name()
    }

    pub fn set_name(&mut self, name: &str) {
        self.compiled.set_name(name);
    }

    /// Caller-facing input descriptors, dynamic AIPP slots included.
    pub fn input_tensor_descs(&self) -> Result<Vec<TensorDesc>> {
        let data_descs = self.compiled.input_tensor_descs();
        match &self.capability {
            Capability::Base => Ok(data_descs),
            Capability::Aipp(configs) => converter::convert_descs_with_configs(configs, &data_descs),
        }
    }

    pub fn output_tensor_descs(&self) -> Vec<TensorDesc> {
        self.compiled.output_tensor_descs()
    }

    /// Split caller inputs into model data inputs and AIPP parameters.
    pub fn convert_inputs(&self, inputs: &[Arc<dyn TensorBuffer>]) -> Result<ConvertedInputs> {
        match &self.capability {
            Capability::Base => Ok(ConvertedInputs {
                data_inputs: inputs.to_vec(),
                aipp_paras: Vec::new(),
            }),
            Capability::Aipp(configs) => converter::convert_inputs_with_configs(inputs, configs),
        }
    }

    /// Envelope followed by the serialized model.
    pub fn save_to_buffer(&self) -> Result<Vec<u8>> {
        let payload = self.compiled.serialize()?;
        custom_data::encode_with_payload(&self.custom_data, &payload)
    }

    /// Save into a caller buffer smaller than `max_bytes`. Returns the
    /// number of bytes written.
    pub fn save_to_external_buffer(&self, buffer: &mut [u8], max_bytes: u64) -> Result<usize> {
        if buffer.len() as u64 >= max_bytes {
            return Err(AippError::InvalidArgument(format!(
                "external buffer of {} bytes exceeds limit {}",
                buffer.len(),
                max_bytes
            )));
        }
        let mut offset = 0;
        if !self.custom_data.is_empty() {
            custom_data::encode_into(buffer, &mut offset, &self.custom_data)?;
        }

        let payload = self.compiled.serialize()?;
        let available = buffer.len() - offset;
        if payload.len() > available {
            tracing::error!(
                payload_len = payload.len(),
                available,
                "external buffer too small for model"
            );
            return Err(AippError::InvalidArgument(format!(
                "model payload of {} bytes does not fit in {} bytes",
                payload.len(),
                available
            )));
        }
        buffer[offset..offset + payload.len()].copy_from_slice(&payload);
        Ok(offset + payload.len())
    }

    /// Stream the envelope and the serialized model to `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        custom_data::write_custom_data(writer, &self.custom_data)?;
        writer.write_all(&self.compiled.serialize()?)?;
        Ok(())
    }

    /// Restore from a buffer that may start with a custom-data envelope.
    pub fn restore_from_buffer(buffer: &[u8], restorer: &dyn ModelRestorer) -> Result<Self> {
        let decoded = custom_data::decode(buffer)?;
        let compiled = restorer.restore(decoded.payload)?;
        match decoded.custom_data {
            Some(data) => Self::with_custom_data(compiled, data),
            None => Ok(Self::new(compiled)),
        }
    }

    /// Restore from a model file of at most `max_bytes` bytes.
    pub fn restore_from_file(
        path: impl AsRef<Path>,
        restorer: &dyn ModelRestorer,
        max_bytes: u64,
    ) -> Result<Self> {
        let path = path.as_ref();
        let tagged = custom_data::probe_file(path);
        tracing::debug!(path = %path.display(), tagged, "restoring model file");

        let mapped = MappedModel::open(path, max_bytes)?;
        if !tagged {
            return Ok(Self::new(restorer.restore(mapped.as_bytes())?));
        }
        Self::restore_from_buffer(mapped.as_bytes(), restorer)
    }
}
