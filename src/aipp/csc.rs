//! Colour space conversion matrix selection.
//!
//! Matrices are fixed-point with a scale of 256 and are indexed by
//! [`ImageColorSpace`]. The target format picks the row order.

use super::format::{ImageColorSpace, ImageFormat};
use super::params::CscMatrixPara;
use crate::error::{AippError, Result};

const YUV_TO_RGB: [[[i32; 3]; 3]; 4] = [
    [[256, 0, 359], [256, -88, -183], [256, 454, 0]],
    [[298, 0, 409], [298, -100, -208], [298, 516, 0]],
    [[256, 0, 359], [256, -88, -183], [256, 454, 0]],
    [[298, 0, 460], [298, -55, -137], [298, 541, 0]],
];

const RGB_TO_YUV: [[[i32; 3]; 3]; 4] = [
    [[77, 150, 29], [-43, -85, 128], [128, -107, -21]],
    [[66, 129, 25], [-38, -74, 112], [112, -94, -18]],
    [[77, 150, 29], [-43, -85, 128], [128, -107, -21]],
    [[47, 157, 16], [-26, -87, 112], [112, -102, -10]],
];

/// Target formats a conversion can produce.
pub const CSC_TARGET_FORMATS: [ImageFormat; 5] = [
    ImageFormat::Yvu444sp,
    ImageFormat::Yuv444sp,
    ImageFormat::Rgb888,
    ImageFormat::Bgr888,
    ImageFormat::Yuv400,
];

fn luma_bias(color_space: ImageColorSpace) -> i32 {
    if color_space == ImageColorSpace::Jpeg {
        0
    } else {
        16
    }
}

fn unrepresentable(input: ImageFormat, target: ImageFormat) -> AippError {
    tracing::error!(
        input = input.name(),
        target = target.name(),
        "cannot convert image by CSC"
    );
    AippError::Unsupported(format!(
        "cannot convert from {} image to {} by CSC",
        input.name(),
        target.name()
    ))
}

fn permuted(table: &[[i32; 3]; 3], rows: [usize; 3]) -> [i32; 9] {
    let mut matrix = [0i32; 9];
    for (out, row) in matrix.chunks_exact_mut(3).zip(rows) {
        out.copy_from_slice(&table[row]);
    }
    matrix
}

/// Resolve the conversion from `input` to `target` under `color_space`.
///
/// `input` is the image format the parameters will be applied to and must
/// be a known format.
pub fn resolve_matrix(
    input: ImageFormat,
    target: ImageFormat,
    color_space: ImageColorSpace,
) -> Result<CscMatrixPara> {
    if input == ImageFormat::Invalid {
        return Err(AippError::InvalidArgument(
            "input format must be set before selecting a CSC target".into(),
        ));
    }
    if !CSC_TARGET_FORMATS.contains(&target) {
        tracing::error!(target = target.name(), "invalid CSC target format");
        return Err(AippError::Unsupported(format!(
            "CSC target {} is not one of YVU444SP, YUV444SP, RGB888, BGR888, YUV400",
            target.name()
        )));
    }

    let space = color_space.table_index();
    let mut para = CscMatrixPara {
        output_format: target,
        color_space,
        ..CscMatrixPara::default()
    };

    match target {
        ImageFormat::Rgb888 | ImageFormat::Bgr888 => {
            if input.is_rgb() || input == ImageFormat::Yuv400 {
                return Err(unrepresentable(input, target));
            }
            let rows = if target == ImageFormat::Rgb888 { [0, 1, 2] } else { [2, 1, 0] };
            para.matrix = permuted(&YUV_TO_RGB[space], rows);
            para.input_bias = [luma_bias(color_space), 128, 128];
        }
        ImageFormat::Yuv444sp | ImageFormat::Yvu444sp => {
            if input.is_yuv() || input == ImageFormat::Yuv400 {
                return Err(unrepresentable(input, target));
            }
            let rows = if target == ImageFormat::Yuv444sp { [0, 1, 2] } else { [0, 2, 1] };
            para.matrix = permuted(&RGB_TO_YUV[space], rows);
            para.output_bias = [luma_bias(color_space), 128, 128];
        }
        _ => {
            if input == ImageFormat::Yuv400 {
                return Err(unrepresentable(input, target));
            }
            if input.is_yuv() {
                para.matrix[0] = 256;
            } else {
                para.matrix[..3].copy_from_slice(&[76, 150, 30]);
            }
        }
    }
    Ok(para)
}
