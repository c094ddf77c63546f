//! Image formats and colour spaces understood by the preprocessing stage.

use serde::Serialize;

use crate::error::{AippError, Result};

/// Pixel layout of an image input or of a conversion target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageFormat {
    Yuv420sp,
    Xrgb8888,
    Yuv400,
    Argb8888,
    Yuyv,
    Yuv422sp,
    Ayuv444,
    Rgb888,
    Bgr888,
    Yuv444sp,
    Yvu444sp,
    #[default]
    Invalid,
}

impl ImageFormat {
    /// Stored code of this format.
    pub fn code(self) -> i32 {
        match self {
            Self::Yuv420sp => 0,
            Self::Xrgb8888 => 1,
            Self::Yuv400 => 2,
            Self::Argb8888 => 3,
            Self::Yuyv => 4,
            Self::Yuv422sp => 5,
            Self::Ayuv444 => 6,
            Self::Rgb888 => 7,
            Self::Bgr888 => 8,
            Self::Yuv444sp => 9,
            Self::Yvu444sp => 10,
            Self::Invalid => 255,
        }
    }

    /// Decode a stored code. Unknown codes map to [`ImageFormat::Invalid`].
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Yuv420sp,
            1 => Self::Xrgb8888,
            2 => Self::Yuv400,
            3 => Self::Argb8888,
            4 => Self::Yuyv,
            5 => Self::Yuv422sp,
            6 => Self::Ayuv444,
            7 => Self::Rgb888,
            8 => Self::Bgr888,
            9 => Self::Yuv444sp,
            10 => Self::Yvu444sp,
            _ => Self::Invalid,
        }
    }

    /// Formats that carry luma/chroma planes.
    pub fn is_yuv(self) -> bool {
        matches!(
            self,
            Self::Yuv420sp | Self::Yuv422sp | Self::Yuyv | Self::Ayuv444
        )
    }

    /// Packed RGB-family formats.
    pub fn is_rgb(self) -> bool {
        matches!(
            self,
            Self::Xrgb8888 | Self::Rgb888 | Self::Argb8888 | Self::Bgr888
        )
    }

    /// Code the NPU runtime uses for this format in the packed parameter
    /// header. Only formats the runtime accepts as AIPP inputs have one.
    pub fn runtime_input_code(self) -> Option<u8> {
        match self {
            Self::Yuv420sp => Some(1),
            Self::Xrgb8888 => Some(2),
            Self::Rgb888 => Some(5),
            Self::Argb8888 => Some(6),
            Self::Yuyv => Some(7),
            Self::Yuv422sp => Some(8),
            Self::Ayuv444 => Some(9),
            Self::Yuv400 => Some(10),
            _ => None,
        }
    }

    /// Inverse of [`ImageFormat::runtime_input_code`].
    pub fn from_runtime_input_code(code: u8) -> Self {
        match code {
            1 => Self::Yuv420sp,
            2 => Self::Xrgb8888,
            5 => Self::Rgb888,
            6 => Self::Argb8888,
            7 => Self::Yuyv,
            8 => Self::Yuv422sp,
            9 => Self::Ayuv444,
            10 => Self::Yuv400,
            _ => Self::Invalid,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Yuv420sp => "YUV420SP_U8",
            Self::Xrgb8888 => "XRGB8888_U8",
            Self::Yuv400 => "YUV400_U8",
            Self::Argb8888 => "ARGB8888_U8",
            Self::Yuyv => "YUYV_U8",
            Self::Yuv422sp => "YUV422SP_U8",
            Self::Ayuv444 => "AYUV444_U8",
            Self::Rgb888 => "RGB888_U8",
            Self::Bgr888 => "BGR888_U8",
            Self::Yuv444sp => "YUV444SP_U8",
            Self::Yvu444sp => "YVU444SP_U8",
            Self::Invalid => "undefined",
        }
    }
}

/// Colour standard selecting one of the fixed conversion matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageColorSpace {
    #[default]
    Jpeg,
    Bt601Narrow,
    Bt601Full,
    Bt709Narrow,
}

impl ImageColorSpace {
    pub fn code(self) -> i32 {
        self.table_index() as i32
    }

    /// Row of the conversion tables in `csc` for this colour space.
    pub(crate) fn table_index(self) -> usize {
        match self {
            Self::Jpeg => 0,
            Self::Bt601Narrow => 1,
            Self::Bt601Full => 2,
            Self::Bt709Narrow => 3,
        }
    }

    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(Self::Jpeg),
            1 => Ok(Self::Bt601Narrow),
            2 => Ok(Self::Bt601Full),
            3 => Ok(Self::Bt709Narrow),
            other => Err(AippError::Unsupported(format!(
                "color space code {}",
                other
            ))),
        }
    }
}
