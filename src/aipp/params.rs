//! Fixed-size preprocessing parameter records.
//!
//! Each record has an explicit little-endian layout with a fixed encoded
//! length. A dynamic parameter tensor is the encoded image of exactly one
//! record, so its byte size must equal the record's `ENCODED_LEN`.

use serde::Serialize;

use super::format::{ImageColorSpace, ImageFormat};
use crate::error::{AippError, Result};
use crate::wire::{ByteReader, ByteWriter};

/// A parameter record with a fixed wire size.
pub trait ParamRecord: Sized {
    /// Human-readable record name used in errors.
    const NAME: &'static str;
    /// Exact encoded size in bytes.
    const ENCODED_LEN: usize;

    fn write_to(&self, w: &mut ByteWriter);

    fn read_from(r: &mut ByteReader<'_>) -> Result<Self>;

    /// Parse a record from a buffer that must hold exactly one record.
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::ENCODED_LEN {
            return Err(AippError::SizeMismatch {
                what: Self::NAME,
                expected: Self::ENCODED_LEN,
                actual: bytes.len(),
            });
        }
        Self::read_from(&mut ByteReader::new(bytes))
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(Self::ENCODED_LEN);
        self.write_to(&mut w);
        debug_assert_eq!(w.len(), Self::ENCODED_LEN);
        w.into_inner()
    }
}

fn read_format(r: &mut ByteReader<'_>, field: &str) -> Result<ImageFormat> {
    Ok(ImageFormat::from_code(r.read_i32(field)?))
}

fn read_color_space(r: &mut ByteReader<'_>, field: &str) -> Result<ImageColorSpace> {
    ImageColorSpace::from_code(r.read_i32(field)?)
}

/// Preprocessing feature selector used by dynamic parameter inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AippFunc {
    Crop,
    ChannelSwap,
    ColorSpaceConversion,
    Resize,
    DataTypeConversion,
    Rotation,
    Padding,
}

impl AippFunc {
    pub const ALL: [AippFunc; 7] = [
        Self::Crop,
        Self::ChannelSwap,
        Self::ColorSpaceConversion,
        Self::Resize,
        Self::DataTypeConversion,
        Self::Rotation,
        Self::Padding,
    ];

    pub fn code(self) -> i32 {
        match self {
            Self::Crop => 0,
            Self::ChannelSwap => 1,
            Self::ColorSpaceConversion => 2,
            Self::Resize => 3,
            Self::DataTypeConversion => 4,
            Self::Rotation => 5,
            Self::Padding => 6,
        }
    }

    pub fn from_code(code: i32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.code() == code)
            .ok_or_else(|| AippError::Unsupported(format!("AIPP function type {}", code)))
    }

    /// Byte size of the dynamic parameter tensor for this feature.
    ///
    /// Rotation has no dynamic parameter record.
    pub fn param_size(self) -> Option<usize> {
        match self {
            Self::Crop => Some(CropPara::ENCODED_LEN),
            Self::ChannelSwap => Some(ChannelSwapPara::ENCODED_LEN),
            Self::ColorSpaceConversion => Some(CscPara::ENCODED_LEN),
            Self::Resize => Some(ResizePara::ENCODED_LEN),
            Self::DataTypeConversion => Some(DtcPara::ENCODED_LEN),
            Self::Padding => Some(PadPara::ENCODED_LEN),
            Self::Rotation => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CropPara {
    pub image_format: ImageFormat,
    pub crop_start_pos_w: u32,
    pub crop_start_pos_h: u32,
    pub crop_size_w: u32,
    pub crop_size_h: u32,
}

impl ParamRecord for CropPara {
    const NAME: &'static str = "CropPara";
    const ENCODED_LEN: usize = 20;

    fn write_to(&self, w: &mut ByteWriter) {
        w.put_i32(self.image_format.code());
        w.put_u32(self.crop_start_pos_w);
        w.put_u32(self.crop_start_pos_h);
        w.put_u32(self.crop_size_w);
        w.put_u32(self.crop_size_h);
    }

    fn read_from(r: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            image_format: read_format(r, "crop.image_format")?,
            crop_start_pos_w: r.read_u32("crop.start_w")?,
            crop_start_pos_h: r.read_u32("crop.start_h")?,
            crop_size_w: r.read_u32("crop.size_w")?,
            crop_size_h: r.read_u32("crop.size_h")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ResizePara {
    pub image_format: ImageFormat,
    pub resize_output_size_w: u32,
    pub resize_output_size_h: u32,
}

impl ParamRecord for ResizePara {
    const NAME: &'static str = "ResizePara";
    const ENCODED_LEN: usize = 12;

    fn write_to(&self, w: &mut ByteWriter) {
        w.put_i32(self.image_format.code());
        w.put_u32(self.resize_output_size_w);
        w.put_u32(self.resize_output_size_h);
    }

    fn read_from(r: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            image_format: read_format(r, "resize.image_format")?,
            resize_output_size_w: r.read_u32("resize.output_w")?,
            resize_output_size_h: r.read_u32("resize.output_h")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ChannelSwapPara {
    pub image_format: ImageFormat,
    pub rbuv_swap_switch: bool,
    pub ax_swap_switch: bool,
}

impl ParamRecord for ChannelSwapPara {
    const NAME: &'static str = "ChannelSwapPara";
    const ENCODED_LEN: usize = 8;

    fn write_to(&self, w: &mut ByteWriter) {
        w.put_i32(self.image_format.code());
        w.put_bool(self.rbuv_swap_switch);
        w.put_bool(self.ax_swap_switch);
        w.put_zeros(2);
    }

    fn read_from(r: &mut ByteReader<'_>) -> Result<Self> {
        let para = Self {
            image_format: read_format(r, "channel_swap.image_format")?,
            rbuv_swap_switch: r.read_bool("channel_swap.rbuv")?,
            ax_swap_switch: r.read_bool("channel_swap.ax")?,
        };
        r.skip(2, "channel_swap.reserved")?;
        Ok(para)
    }
}

/// Explicit 3x3 colour conversion matrix with biases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CscMatrixPara {
    pub output_format: ImageFormat,
    pub color_space: ImageColorSpace,
    /// Row-major `[r0c0, r0c1, r0c2, r1c0, ..., r2c2]`.
    pub matrix: [i32; 9],
    pub output_bias: [i32; 3],
    pub input_bias: [i32; 3],
}

impl Default for CscMatrixPara {
    fn default() -> Self {
        Self {
            output_format: ImageFormat::Rgb888,
            color_space: ImageColorSpace::Jpeg,
            matrix: [0; 9],
            output_bias: [0; 3],
            input_bias: [0; 3],
        }
    }
}

impl ParamRecord for CscMatrixPara {
    const NAME: &'static str = "CscMatrixPara";
    const ENCODED_LEN: usize = 68;

    fn write_to(&self, w: &mut ByteWriter) {
        w.put_i32(self.output_format.code());
        w.put_i32(self.color_space.code());
        for v in self.matrix.iter().chain(&self.output_bias).chain(&self.input_bias) {
            w.put_i32(*v);
        }
    }

    fn read_from(r: &mut ByteReader<'_>) -> Result<Self> {
        let output_format = read_format(r, "csc_matrix.output_format")?;
        let color_space = read_color_space(r, "csc_matrix.color_space")?;
        let mut matrix = [0i32; 9];
        for v in matrix.iter_mut() {
            *v = r.read_i32("csc_matrix.matrix")?;
        }
        let mut output_bias = [0i32; 3];
        for v in output_bias.iter_mut() {
            *v = r.read_i32("csc_matrix.output_bias")?;
        }
        let mut input_bias = [0i32; 3];
        for v in input_bias.iter_mut() {
            *v = r.read_i32("csc_matrix.input_bias")?;
        }
        Ok(Self {
            output_format,
            color_space,
            matrix,
            output_bias,
            input_bias,
        })
    }
}

/// Colour conversion expressed as a target format and colour standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CscPara {
    pub image_format: ImageFormat,
    pub output_format: ImageFormat,
    pub image_color_space: ImageColorSpace,
}

impl Default for CscPara {
    fn default() -> Self {
        Self {
            image_format: ImageFormat::Invalid,
            output_format: ImageFormat::Rgb888,
            image_color_space: ImageColorSpace::Jpeg,
        }
    }
}

impl ParamRecord for CscPara {
    const NAME: &'static str = "CscPara";
    const ENCODED_LEN: usize = 12;

    fn write_to(&self, w: &mut ByteWriter) {
        w.put_i32(self.image_format.code());
        w.put_i32(self.output_format.code());
        w.put_i32(self.image_color_space.code());
    }

    fn read_from(r: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            image_format: read_format(r, "csc.image_format")?,
            output_format: read_format(r, "csc.output_format")?,
            image_color_space: read_color_space(r, "csc.color_space")?,
        })
    }
}

/// Data type conversion: `(pixel - mean - min) * var_reci` per channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DtcPara {
    pub image_format: ImageFormat,
    pub pixel_mean: [i16; 4],
    pub pixel_min: [f32; 4],
    pub pixel_var_reci: [f32; 4],
}

impl Default for DtcPara {
    fn default() -> Self {
        Self {
            image_format: ImageFormat::Invalid,
            pixel_mean: [0; 4],
            pixel_min: [0.0; 4],
            pixel_var_reci: [1.0; 4],
        }
    }
}

impl ParamRecord for DtcPara {
    const NAME: &'static str = "DtcPara";
    const ENCODED_LEN: usize = 4 + 4 * 2 + 8 * 4;

    fn write_to(&self, w: &mut ByteWriter) {
        w.put_i32(self.image_format.code());
        for v in self.pixel_mean {
            w.put_i16(v);
        }
        for v in self.pixel_min.iter().chain(&self.pixel_var_reci) {
            w.put_f32(*v);
        }
    }

    fn read_from(r: &mut ByteReader<'_>) -> Result<Self> {
        let image_format = read_format(r, "dtc.image_format")?;
        let mut pixel_mean = [0i16; 4];
        for v in pixel_mean.iter_mut() {
            *v = r.read_i16("dtc.mean")?;
        }
        let mut pixel_min = [0f32; 4];
        for v in pixel_min.iter_mut() {
            *v = r.read_f32("dtc.min")?;
        }
        let mut pixel_var_reci = [0f32; 4];
        for v in pixel_var_reci.iter_mut() {
            *v = r.read_f32("dtc.var_reci")?;
        }
        Ok(Self {
            image_format,
            pixel_mean,
            pixel_min,
            pixel_var_reci,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RotatePara {
    pub image_format: ImageFormat,
    pub rotation_angle: f32,
    pub rotate: bool,
}

impl Default for RotatePara {
    fn default() -> Self {
        Self {
            image_format: ImageFormat::Invalid,
            rotation_angle: 0.0,
            rotate: true,
        }
    }
}

impl ParamRecord for RotatePara {
    const NAME: &'static str = "RotatePara";
    const ENCODED_LEN: usize = 12;

    fn write_to(&self, w: &mut ByteWriter) {
        w.put_i32(self.image_format.code());
        w.put_f32(self.rotation_angle);
        w.put_bool(self.rotate);
        w.put_zeros(3);
    }

    fn read_from(r: &mut ByteReader<'_>) -> Result<Self> {
        let para = Self {
            image_format: read_format(r, "rotate.image_format")?,
            rotation_angle: r.read_f32("rotate.angle")?,
            rotate: r.read_bool("rotate.enable")?,
        };
        r.skip(3, "rotate.reserved")?;
        Ok(para)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PadPara {
    pub image_format: ImageFormat,
    pub padding_size_top: u32,
    pub padding_size_bottom: u32,
    pub padding_size_left: u32,
    pub padding_size_right: u32,
    pub padding_value: [f32; 4],
}

impl ParamRecord for PadPara {
    const NAME: &'static str = "PadPara";
    const ENCODED_LEN: usize = 36;

    fn write_to(&self, w: &mut ByteWriter) {
        w.put_i32(self.image_format.code());
        w.put_u32(self.padding_size_top);
        w.put_u32(self.padding_size_bottom);
        w.put_u32(self.padding_size_left);
        w.put_u32(self.padding_size_right);
        for v in self.padding_value {
            w.put_f32(v);
        }
    }

    fn read_from(r: &mut ByteReader<'_>) -> Result<Self> {
        let image_format = read_format(r, "padding.image_format")?;
        let padding_size_top = r.read_u32("padding.top")?;
        let padding_size_bottom = r.read_u32("padding.bottom")?;
        let padding_size_left = r.read_u32("padding.left")?;
        let padding_size_right = r.read_u32("padding.right")?;
        let mut padding_value = [0f32; 4];
        for v in padding_value.iter_mut() {
            *v = r.read_f32("padding.value")?;
        }
        Ok(Self {
            image_format,
            padding_size_top,
            padding_size_bottom,
            padding_size_left,
            padding_size_right,
            padding_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_lengths_match_constants() {
        assert_eq!(CropPara::default().to_bytes().len(), CropPara::ENCODED_LEN);
        assert_eq!(ResizePara::default().to_bytes().len(), ResizePara::ENCODED_LEN);
        assert_eq!(ChannelSwapPara::default().to_bytes().len(), ChannelSwapPara::ENCODED_LEN);
        assert_eq!(CscMatrixPara::default().to_bytes().len(), CscMatrixPara::ENCODED_LEN);
        assert_eq!(CscPara::default().to_bytes().len(), CscPara::ENCODED_LEN);
        assert_eq!(DtcPara::default().to_bytes().len(), DtcPara::ENCODED_LEN);
        assert_eq!(RotatePara::default().to_bytes().len(), RotatePara::ENCODED_LEN);
        assert_eq!(PadPara::default().to_bytes().len(), PadPara::ENCODED_LEN);
    }

    #[test]
    fn from_bytes_requires_exact_size() {
        let mut bytes = CropPara::default().to_bytes();
        bytes.push(0);
        let err = CropPara::from_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err,
            AippError::SizeMismatch { expected: 20, actual: 21, .. }
        ));
    }

    #[test]
    fn crop_layout_is_little_endian_fields() {
        let crop = CropPara {
            image_format: ImageFormat::Yuv420sp,
            crop_start_pos_w: 1,
            crop_start_pos_h: 2,
            crop_size_w: 0x0102,
            crop_size_h: 4,
        };
        let bytes = crop.to_bytes();
        assert_eq!(&bytes[0..4], &[0, 0, 0, 0]);
        assert_eq!(&bytes[12..16], &[0x02, 0x01, 0, 0]);
        assert_eq!(CropPara::from_bytes(&bytes).unwrap(), crop);
    }

    #[test]
    fn dtc_layout_is_format_means_mins_reciprocals() {
        let dtc = DtcPara {
            image_format: ImageFormat::Rgb888,
            pixel_mean: [1, -2, 3, 0x0102],
            pixel_min: [0.5, 0.0, 0.0, 0.0],
            pixel_var_reci: [1.0, 1.0, 1.0, 2.0],
        };
        let bytes = dtc.to_bytes();
        assert_eq!(DtcPara::ENCODED_LEN, 44);
        assert_eq!(bytes.len(), 44);
        assert_eq!(&bytes[0..4], &7i32.to_le_bytes());
        assert_eq!(&bytes[4..6], &1i16.to_le_bytes());
        assert_eq!(&bytes[6..8], &(-2i16).to_le_bytes());
        assert_eq!(&bytes[10..12], &[0x02, 0x01]);
        assert_eq!(&bytes[12..16], &0.5f32.to_le_bytes());
        assert_eq!(&bytes[28..32], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[40..44], &2.0f32.to_le_bytes());
        assert_eq!(DtcPara::from_bytes(&bytes).unwrap(), dtc);
        assert_eq!(AippFunc::DataTypeConversion.param_size(), Some(44));
    }

    #[test]
    fn dtc_default_variance_reciprocal_is_one() {
        let dtc = DtcPara::from_bytes(&DtcPara::default().to_bytes()).unwrap();
        assert_eq!(dtc.pixel_var_reci, [1.0; 4]);
    }

    #[test]
    fn func_codes_and_sizes() {
        for func in AippFunc::ALL {
            assert_eq!(AippFunc::from_code(func.code()).unwrap(), func);
        }
        assert!(AippFunc::from_code(7).is_err());
        assert_eq!(AippFunc::Crop.param_size(), Some(20));
        assert_eq!(AippFunc::ColorSpaceConversion.param_size(), Some(12));
        assert_eq!(AippFunc::Rotation.param_size(), None);
    }
}
