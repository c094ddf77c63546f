//! Tensor descriptors and the tensor handles the remappers move around.
//!
//! Buffers are shared behind `Arc<dyn TensorBuffer>` so remapping reorders
//! handles without copying tensor bytes.

use std::fmt;

use serde::Serialize;

use crate::aipp::format::ImageFormat;
use crate::error::{AippError, Result};

/// Element type of a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    Uint8,
    Float32,
    Float16,
    Int32,
    Int8,
    Int16,
    Bool,
    Int64,
    Uint32,
    Double,
}

impl DataType {
    pub fn code(self) -> i32 {
        match self {
            Self::Uint8 => 0,
            Self::Float32 => 1,
            Self::Float16 => 2,
            Self::Int32 => 3,
            Self::Int8 => 4,
            Self::Int16 => 5,
            Self::Bool => 6,
            Self::Int64 => 7,
            Self::Uint32 => 8,
            Self::Double => 9,
        }
    }

    pub fn from_code(code: i32) -> Result<Self> {
        Ok(match code {
            0 => Self::Uint8,
            1 => Self::Float32,
            2 => Self::Float16,
            3 => Self::Int32,
            4 => Self::Int8,
            5 => Self::Int16,
            6 => Self::Bool,
            7 => Self::Int64,
            8 => Self::Uint32,
            9 => Self::Double,
            other => {
                return Err(AippError::Unsupported(format!("data type code {}", other)));
            }
        })
    }

    /// Size in bytes of one element.
    pub fn element_size(self) -> usize {
        match self {
            Self::Uint8 | Self::Int8 | Self::Bool => 1,
            Self::Float16 | Self::Int16 => 2,
            Self::Float32 | Self::Int32 | Self::Uint32 => 4,
            Self::Int64 | Self::Double => 8,
        }
    }
}

/// Memory layout of a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Format {
    #[default]
    Nchw,
    Nhwc,
    Nd,
}

/// Shape and type metadata for one tensor slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TensorDesc {
    pub dims: Vec<i32>,
    pub data_type: DataType,
    pub format: Format,
}

impl TensorDesc {
    pub fn new(dims: Vec<i32>, data_type: DataType, format: Format) -> Self {
        Self {
            dims,
            data_type,
            format,
        }
    }

    /// Descriptor of a raw byte tensor: `[1, size, 1, 1]`, UINT8, NCHW.
    /// Dynamic AIPP parameter slots are described this way.
    pub fn bytes(size: usize) -> Self {
        let size = i32::try_from(size).unwrap_or(i32::MAX);
        Self::new(vec![1, size, 1, 1], DataType::Uint8, Format::Nchw)
    }

    /// Number of elements, or `None` if a dimension is negative or the
    /// product overflows.
    pub fn element_count(&self) -> Option<usize> {
        self.dims.iter().try_fold(1usize, |acc, &d| {
            usize::try_from(d).ok().and_then(|d| acc.checked_mul(d))
        })
    }

    pub fn byte_size(&self) -> Option<usize> {
        self.element_count()?.checked_mul(self.data_type.element_size())
    }
}

impl fmt::Display for TensorDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {:?} {:?}", self.dims, self.data_type, self.format)
    }
}

/// Image metadata carried by image tensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub width: i32,
    pub height: i32,
}

/// A caller-owned tensor: contiguous bytes plus optional image metadata.
pub trait TensorBuffer: fmt::Debug + Send + Sync {
    fn data(&self) -> &[u8];

    fn size(&self) -> usize {
        self.data().len()
    }

    /// Image metadata, if this tensor holds an image.
    fn image(&self) -> Option<ImageInfo> {
        None
    }
}

/// Plain n-dimensional tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct NdTensorBuffer {
    desc: TensorDesc,
    data: Vec<u8>,
}

impl NdTensorBuffer {
    /// Wrap `data`, which must match the descriptor's byte size.
    pub fn new(desc: TensorDesc, data: Vec<u8>) -> Result<Self> {
        match desc.byte_size() {
            Some(expected) if expected == data.len() => Ok(Self { desc, data }),
            Some(expected) => Err(AippError::SizeMismatch {
                what: "tensor data",
                expected,
                actual: data.len(),
            }),
            None => Err(AippError::InvalidArgument(format!(
                "tensor dims {:?} have no valid size",
                desc.dims
            ))),
        }
    }

    /// Raw byte tensor described by [`TensorDesc::bytes`].
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            desc: TensorDesc::bytes(data.len()),
            data,
        }
    }

    pub fn desc(&self) -> &TensorDesc {
        &self.desc
    }
}

impl TensorBuffer for NdTensorBuffer {
    fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Image tensor with its format and extent.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensorBuffer {
    info: ImageInfo,
    data: Vec<u8>,
}

impl ImageTensorBuffer {
    pub fn new(format: ImageFormat, width: i32, height: i32, data: Vec<u8>) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(AippError::InvalidArgument(format!(
                "image extent {}x{} must be positive",
                width, height
            )));
        }
        Ok(Self {
            info: ImageInfo {
                format,
                width,
                height,
            },
            data,
        })
    }

    pub fn info(&self) -> ImageInfo {
        self.info
    }
}

impl TensorBuffer for ImageTensorBuffer {
    fn data(&self) -> &[u8] {
        &self.data
    }

    fn image(&self) -> Option<ImageInfo> {
        Some(self.info)
    }
}
