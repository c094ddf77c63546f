//! Resolved preprocessing parameters for one AIPP node.
//!
//! [`AippPara`] mirrors the packed buffer the NPU runtime consumes: one
//! 64-byte common header followed by `batch_count` records of 96 bytes.
//! Floating-point fields are stored as IEEE-754 half precision bit patterns,
//! clamped to the half range before conversion.

use half::f16;

use super::csc;
use super::format::{ImageColorSpace, ImageFormat};
use super::params::{ChannelSwapPara, CropPara, CscMatrixPara, DtcPara, PadPara, ResizePara};
use crate::error::{AippError, Result};
use crate::wire::{ByteReader, ByteWriter};

/// Largest batch count the packed header can describe.
pub const MAX_BATCH_COUNT: usize = 127;

const FP16_MAX: f32 = 65504.0;

fn to_fp16_bits(value: f32) -> u16 {
    f16::from_f32(value.clamp(-FP16_MAX, FP16_MAX)).to_bits()
}

fn from_fp16_bits(bits: u16) -> f32 {
    f16::from_bits(bits).to_f32()
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct CommonPara {
    input_format: u8,
    csc_switch: i8,
    rbuv_swap_switch: i8,
    ax_swap_switch: i8,
    batch_num: u8,
    src_image_size_w: i32,
    src_image_size_h: i32,
    csc_matrix: [i16; 9],
    csc_output_bias: [u8; 3],
    csc_input_bias: [u8; 3],
}

impl CommonPara {
    const ENCODED_LEN: usize = 64;

    fn write_to(&self, w: &mut ByteWriter) {
        w.put_u8(self.input_format);
        w.put_i8(self.csc_switch);
        w.put_i8(self.rbuv_swap_switch);
        w.put_i8(self.ax_swap_switch);
        w.put_u8(self.batch_num);
        w.put_zeros(3);
        w.put_i32(self.src_image_size_w);
        w.put_i32(self.src_image_size_h);
        for v in self.csc_matrix {
            w.put_i16(v);
        }
        w.put_zeros(6);
        w.put_bytes(&self.csc_output_bias);
        w.put_bytes(&self.csc_input_bias);
        w.put_zeros(2 + 16);
    }

    fn read_from(r: &mut ByteReader<'_>) -> Result<Self> {
        let input_format = r.read_u8("common.input_format")?;
        let csc_switch = r.read_i8("common.csc_switch")?;
        let rbuv_swap_switch = r.read_i8("common.rbuv_swap")?;
        let ax_swap_switch = r.read_i8("common.ax_swap")?;
        let batch_num = r.read_u8("common.batch_num")?;
        r.skip(3, "common.reserved")?;
        let src_image_size_w = r.read_i32("common.src_w")?;
        let src_image_size_h = r.read_i32("common.src_h")?;
        let mut csc_matrix = [0i16; 9];
        for v in csc_matrix.iter_mut() {
            *v = r.read_i16("common.csc_matrix")?;
        }
        r.skip(6, "common.reserved")?;
        let mut csc_output_bias = [0u8; 3];
        csc_output_bias.copy_from_slice(r.take(3, "common.csc_output_bias")?);
        let mut csc_input_bias = [0u8; 3];
        csc_input_bias.copy_from_slice(r.take(3, "common.csc_input_bias")?);
        r.skip(2 + 16, "common.reserved")?;
        Ok(Self {
            input_format,
            csc_switch,
            rbuv_swap_switch,
            ax_swap_switch,
            batch_num,
            src_image_size_w,
            src_image_size_h,
            csc_matrix,
            csc_output_bias,
            csc_input_bias,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct BatchPara {
    crop_switch: i8,
    scf_switch: i8,
    padding_switch: i8,
    rotate_switch: i8,
    crop_start_pos_w: u32,
    crop_start_pos_h: u32,
    crop_size_w: u32,
    crop_size_h: u32,
    scf_input_size_w: i32,
    scf_input_size_h: i32,
    scf_output_size_w: u32,
    scf_output_size_h: u32,
    /// top, bottom, left, right
    padding_size: [u32; 4],
    dtc_pixel_mean: [i16; 4],
    dtc_pixel_min: [u16; 4],
    dtc_pixel_var_reci: [u16; 4],
    padding_value: [u16; 4],
}

impl Default for BatchPara {
    fn default() -> Self {
        Self {
            crop_switch: 0,
            scf_switch: 0,
            padding_switch: 0,
            rotate_switch: 0,
            crop_start_pos_w: 0,
            crop_start_pos_h: 0,
            crop_size_w: 0,
            crop_size_h: 0,
            scf_input_size_w: 0,
            scf_input_size_h: 0,
            scf_output_size_w: 0,
            scf_output_size_h: 0,
            padding_size: [0; 4],
            dtc_pixel_mean: [0; 4],
            dtc_pixel_min: [0; 4],
            dtc_pixel_var_reci: [to_fp16_bits(1.0); 4],
            padding_value: [0; 4],
        }
    }
}

impl BatchPara {
    const ENCODED_LEN: usize = 96;

    fn write_to(&self, w: &mut ByteWriter) {
        w.put_i8(self.crop_switch);
        w.put_i8(self.scf_switch);
        w.put_i8(self.padding_switch);
        w.put_i8(self.rotate_switch);
        w.put_zeros(4);
        w.put_u32(self.crop_start_pos_w);
        w.put_u32(self.crop_start_pos_h);
        w.put_u32(self.crop_size_w);
        w.put_u32(self.crop_size_h);
        w.put_i32(self.scf_input_size_w);
        w.put_i32(self.scf_input_size_h);
        w.put_u32(self.scf_output_size_w);
        w.put_u32(self.scf_output_size_h);
        for v in self.padding_size {
            w.put_u32(v);
        }
        for v in self.dtc_pixel_mean {
            w.put_i16(v);
        }
        for v in self
            .dtc_pixel_min
            .iter()
            .chain(&self.dtc_pixel_var_reci)
            .chain(&self.padding_value)
        {
            w.put_u16(*v);
        }
        w.put_zeros(8);
    }

    fn read_from(r: &mut ByteReader<'_>) -> Result<Self> {
        let crop_switch = r.read_i8("batch.crop_switch")?;
        let scf_switch = r.read_i8("batch.scf_switch")?;
        let padding_switch = r.read_i8("batch.padding_switch")?;
        let rotate_switch = r.read_i8("batch.rotate_switch")?;
        r.skip(4, "batch.reserved")?;
        let crop_start_pos_w = r.read_u32("batch.crop_start_w")?;
        let crop_start_pos_h = r.read_u32("batch.crop_start_h")?;
        let crop_size_w = r.read_u32("batch.crop_size_w")?;
        let crop_size_h = r.read_u32("batch.crop_size_h")?;
        let scf_input_size_w = r.read_i32("batch.scf_input_w")?;
        let scf_input_size_h = r.read_i32("batch.scf_input_h")?;
        let scf_output_size_w = r.read_u32("batch.scf_output_w")?;
        let scf_output_size_h = r.read_u32("batch.scf_output_h")?;
        let mut padding_size = [0u32; 4];
        for v in padding_size.iter_mut() {
            *v = r.read_u32("batch.padding_size")?;
        }
        let mut dtc_pixel_mean = [0i16; 4];
        for v in dtc_pixel_mean.iter_mut() {
            *v = r.read_i16("batch.dtc_mean")?;
        }
        let mut halves = [[0u16; 4]; 3];
        for v in halves.iter_mut().flatten() {
            *v = r.read_u16("batch.fp16")?;
        }
        r.skip(8, "batch.reserved")?;
        let [dtc_pixel_min, dtc_pixel_var_reci, padding_value] = halves;
        Ok(Self {
            crop_switch,
            scf_switch,
            padding_switch,
            rotate_switch,
            crop_start_pos_w,
            crop_start_pos_h,
            crop_size_w,
            crop_size_h,
            scf_input_size_w,
            scf_input_size_h,
            scf_output_size_w,
            scf_output_size_h,
            padding_size,
            dtc_pixel_mean,
            dtc_pixel_min,
            dtc_pixel_var_reci,
            padding_value,
        })
    }

    fn apply_crop(&mut self, crop: &CropPara) {
        self.crop_switch = 1;
        self.crop_start_pos_w = crop.crop_start_pos_w;
        self.crop_start_pos_h = crop.crop_start_pos_h;
        self.crop_size_w = crop.crop_size_w;
        self.crop_size_h = crop.crop_size_h;
        if self.scf_switch != 0 {
            self.scf_input_size_w = self.crop_size_w as i32;
            self.scf_input_size_h = self.crop_size_h as i32;
        }
    }

    fn apply_resize(&mut self, resize: &ResizePara, src_w: i32, src_h: i32) {
        self.scf_switch = 1;
        if self.crop_switch != 0 {
            self.scf_input_size_w = self.crop_size_w as i32;
            self.scf_input_size_h = self.crop_size_h as i32;
        } else {
            self.scf_input_size_w = src_w;
            self.scf_input_size_h = src_h;
        }
        self.scf_output_size_w = resize.resize_output_size_w;
        self.scf_output_size_h = resize.resize_output_size_h;
    }

    fn apply_padding(&mut self, pad: &PadPara) {
        self.padding_switch = 1;
        self.padding_size = [
            pad.padding_size_top,
            pad.padding_size_bottom,
            pad.padding_size_left,
            pad.padding_size_right,
        ];
        self.padding_value = pad.padding_value.map(to_fp16_bits);
    }

    fn apply_dtc(&mut self, dtc: &DtcPara) {
        self.dtc_pixel_mean = dtc.pixel_mean;
        self.dtc_pixel_min = dtc.pixel_min.map(to_fp16_bits);
        self.dtc_pixel_var_reci = dtc.pixel_var_reci.map(to_fp16_bits);
    }
}

/// Per-node preprocessing parameters for `batch_count` batches.
#[derive(Debug, Clone, PartialEq)]
pub struct AippPara {
    common: CommonPara,
    batches: Vec<BatchPara>,
    input_index: Option<u32>,
    input_aipp_index: Option<u32>,
    enable_crop: bool,
    enable_resize: bool,
    enable_csc: bool,
    enable_padding: bool,
}

impl AippPara {
    /// Size of the shared header in the packed buffer.
    pub const COMMON_LEN: usize = CommonPara::ENCODED_LEN;
    /// Size of one per-batch record in the packed buffer.
    pub const BATCH_LEN: usize = BatchPara::ENCODED_LEN;

    /// Create parameters for `batch_count` batches, `1..=127`.
    pub fn new(batch_count: usize) -> Result<Self> {
        if !(1..=MAX_BATCH_COUNT).contains(&batch_count) {
            tracing::error!(batch_count, "batch count must be in [1, {}]", MAX_BATCH_COUNT);
            return Err(AippError::InvalidArgument(format!(
                "batch count {} not in [1, {}]",
                batch_count, MAX_BATCH_COUNT
            )));
        }
        Ok(Self {
            common: CommonPara {
                batch_num: batch_count as u8,
                ..CommonPara::default()
            },
            batches: vec![BatchPara::default(); batch_count],
            input_index: None,
            input_aipp_index: None,
            enable_crop: false,
            enable_resize: false,
            enable_csc: false,
            enable_padding: false,
        })
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Size of the packed runtime buffer.
    pub fn byte_len(&self) -> usize {
        Self::COMMON_LEN + Self::BATCH_LEN * self.batches.len()
    }

    fn batch(&self, index: usize) -> Result<&BatchPara> {
        let len = self.batches.len();
        self.batches
            .get(index)
            .ok_or_else(|| AippError::out_of_range("batch", index as i64, len))
    }

    fn batch_mut(&mut self, index: usize) -> Result<&mut BatchPara> {
        let len = self.batches.len();
        self.batches
            .get_mut(index)
            .ok_or_else(|| AippError::out_of_range("batch", index as i64, len))
    }

    pub fn set_input_index(&mut self, index: u32) {
        self.input_index = Some(index);
    }

    /// Position of this node's data tensor in the model's data-only inputs.
    pub fn input_index(&self) -> Option<u32> {
        self.input_index
    }

    pub fn set_input_aipp_index(&mut self, index: u32) {
        self.input_aipp_index = Some(index);
    }

    /// Position of this node among the model's AIPP configs.
    pub fn input_aipp_index(&self) -> Option<u32> {
        self.input_aipp_index
    }

    /// Set the source image format. Only formats with a runtime input code
    /// are accepted.
    pub fn set_input_format(&mut self, format: ImageFormat) -> Result<()> {
        let code = format.runtime_input_code().ok_or_else(|| {
            AippError::Unsupported(format!("{} is not an AIPP input format", format.name()))
        })?;
        self.common.input_format = code;
        Ok(())
    }

    pub fn input_format(&self) -> ImageFormat {
        ImageFormat::from_runtime_input_code(self.common.input_format)
    }

    pub fn set_input_shape(&mut self, width: i32, height: i32) {
        self.common.src_image_size_w = width;
        self.common.src_image_size_h = height;
    }

    /// Source image `[width, height]`.
    pub fn input_shape(&self) -> [i32; 2] {
        [self.common.src_image_size_w, self.common.src_image_size_h]
    }

    pub fn set_channel_swap(&mut self, para: &ChannelSwapPara) {
        self.common.rbuv_swap_switch = i8::from(para.rbuv_swap_switch);
        self.common.ax_swap_switch = i8::from(para.ax_swap_switch);
    }

    pub fn channel_swap(&self) -> ChannelSwapPara {
        ChannelSwapPara {
            image_format: self.input_format(),
            rbuv_swap_switch: self.common.rbuv_swap_switch != 0,
            ax_swap_switch: self.common.ax_swap_switch != 0,
        }
    }

    /// Select a conversion matrix for the current input format.
    ///
    /// The input format must be set first. Leaves the parameters untouched
    /// on error.
    pub fn set_csc(&mut self, target: ImageFormat, color_space: ImageColorSpace) -> Result<()> {
        let matrix = csc::resolve_matrix(self.input_format(), target, color_space)?;
        self.set_csc_matrix(&matrix);
        Ok(())
    }

    /// Install an explicit matrix. Coefficients are narrowed to 16 bits and
    /// biases to 8 bits; values that do not fit wrap and are logged.
    pub fn set_csc_matrix(&mut self, para: &CscMatrixPara) {
        let wide_coefficients = para.matrix.iter().filter(|&&v| i16::try_from(v).is_err()).count();
        let wide_biases = para
            .output_bias
            .iter()
            .chain(&para.input_bias)
            .filter(|&&v| u8::try_from(v).is_err())
            .count();
        if wide_coefficients + wide_biases > 0 {
            tracing::warn!(
                wide_coefficients,
                wide_biases,
                "CSC matrix values exceed the packed field width and will wrap"
            );
        }
        self.common.csc_switch = 1;
        self.common.csc_matrix = para.matrix.map(|v| v as i16);
        self.common.csc_output_bias = para.output_bias.map(|v| v as u8);
        self.common.csc_input_bias = para.input_bias.map(|v| v as u8);
        self.enable_csc = true;
    }

    /// The installed matrix. Output format and colour space are not part of
    /// the packed buffer and come back as defaults.
    pub fn csc_matrix(&self) -> CscMatrixPara {
        CscMatrixPara {
            matrix: self.common.csc_matrix.map(i32::from),
            output_bias: self.common.csc_output_bias.map(i32::from),
            input_bias: self.common.csc_input_bias.map(i32::from),
            ..CscMatrixPara::default()
        }
    }

    pub fn set_crop(&mut self, batch: usize, para: &CropPara) -> Result<()> {
        self.batch_mut(batch)?.apply_crop(para);
        self.enable_crop = true;
        Ok(())
    }

    pub fn set_crop_all(&mut self, para: &CropPara) {
        for batch in &mut self.batches {
            batch.apply_crop(para);
        }
        self.enable_crop = true;
    }

    pub fn crop(&self, batch: usize) -> Result<CropPara> {
        let b = self.batch(batch)?;
        Ok(CropPara {
            image_format: self.input_format(),
            crop_start_pos_w: b.crop_start_pos_w,
            crop_start_pos_h: b.crop_start_pos_h,
            crop_size_w: b.crop_size_w,
            crop_size_h: b.crop_size_h,
        })
    }

    pub fn set_resize(&mut self, batch: usize, para: &ResizePara) -> Result<()> {
        let (w, h) = (self.common.src_image_size_w, self.common.src_image_size_h);
        self.batch_mut(batch)?.apply_resize(para, w, h);
        self.enable_resize = true;
        Ok(())
    }

    pub fn set_resize_all(&mut self, para: &ResizePara) {
        let (w, h) = (self.common.src_image_size_w, self.common.src_image_size_h);
        for batch in &mut self.batches {
            batch.apply_resize(para, w, h);
        }
        self.enable_resize = true;
    }

    pub fn resize(&self, batch: usize) -> Result<ResizePara> {
        let b = self.batch(batch)?;
        Ok(ResizePara {
            image_format: self.input_format(),
            resize_output_size_w: b.scf_output_size_w,
            resize_output_size_h: b.scf_output_size_h,
        })
    }

    /// Input extent `[width, height]` the scaler reads for `batch`.
    pub fn resize_input_size(&self, batch: usize) -> Result<[i32; 2]> {
        let b = self.batch(batch)?;
        Ok([b.scf_input_size_w, b.scf_input_size_h])
    }

    pub fn set_padding(&mut self, batch: usize, para: &PadPara) -> Result<()> {
        self.batch_mut(batch)?.apply_padding(para);
        self.enable_padding = true;
        Ok(())
    }

    pub fn set_padding_all(&mut self, para: &PadPara) {
        for batch in &mut self.batches {
            batch.apply_padding(para);
        }
        self.enable_padding = true;
    }

    pub fn padding(&self, batch: usize) -> Result<PadPara> {
        let b = self.batch(batch)?;
        let [top, bottom, left, right] = b.padding_size;
        Ok(PadPara {
            image_format: self.input_format(),
            padding_size_top: top,
            padding_size_bottom: bottom,
            padding_size_left: left,
            padding_size_right: right,
            padding_value: b.padding_value.map(from_fp16_bits),
        })
    }

    pub fn set_dtc(&mut self, batch: usize, para: &DtcPara) -> Result<()> {
        self.batch_mut(batch)?.apply_dtc(para);
        Ok(())
    }

    pub fn set_dtc_all(&mut self, para: &DtcPara) {
        for batch in &mut self.batches {
            batch.apply_dtc(para);
        }
    }

    pub fn dtc(&self, batch: usize) -> Result<DtcPara> {
        let b = self.batch(batch)?;
        Ok(DtcPara {
            image_format: self.input_format(),
            pixel_mean: b.dtc_pixel_mean,
            pixel_min: b.dtc_pixel_min.map(from_fp16_bits),
            pixel_var_reci: b.dtc_pixel_var_reci.map(from_fp16_bits),
        })
    }

    pub fn enable_crop(&self) -> bool {
        self.enable_crop
    }

    pub fn set_enable_crop(&mut self, enable: bool) {
        self.enable_crop = enable;
    }

    pub fn enable_resize(&self) -> bool {
        self.enable_resize
    }

    pub fn set_enable_resize(&mut self, enable: bool) {
        self.enable_resize = enable;
    }

    pub fn enable_csc(&self) -> bool {
        self.enable_csc
    }

    pub fn set_enable_csc(&mut self, enable: bool) {
        self.enable_csc = enable;
    }

    pub fn enable_padding(&self) -> bool {
        self.enable_padding
    }

    pub fn set_enable_padding(&mut self, enable: bool) {
        self.enable_padding = enable;
    }

    /// Pack into the runtime buffer layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(self.byte_len());
        self.common.write_to(&mut w);
        for batch in &self.batches {
            batch.write_to(&mut w);
        }
        w.into_inner()
    }

    /// Parse a packed runtime buffer. Node indices are not part of the
    /// buffer and come back unset; enable flags follow the stored switches.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(bytes);
        let common = CommonPara::read_from(&mut r)?;
        let batch_count = usize::from(common.batch_num);
        if !(1..=MAX_BATCH_COUNT).contains(&batch_count) {
            return Err(AippError::Corrupt(format!(
                "packed batch count {} not in [1, {}]",
                batch_count, MAX_BATCH_COUNT
            )));
        }
        let expected = Self::COMMON_LEN + Self::BATCH_LEN * batch_count;
        if bytes.len() != expected {
            return Err(AippError::SizeMismatch {
                what: "AippPara",
                expected,
                actual: bytes.len(),
            });
        }
        let batches = (0..batch_count)
            .map(|_| BatchPara::read_from(&mut r))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            enable_crop: batches.iter().any(|b| b.crop_switch != 0),
            enable_resize: batches.iter().any(|b| b.scf_switch != 0),
            enable_padding: batches.iter().any(|b| b.padding_switch != 0),
            enable_csc: common.csc_switch != 0,
            common,
            batches,
            input_index: None,
            input_aipp_index: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// Log sink shared with a scoped subscriber.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn with_captured_logs(f: impl FnOnce()) -> String {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        logs.text()
    }

    #[test]
    fn narrowed_csc_values_are_logged() {
        let mut para = AippPara::new(1).unwrap();
        let logs = with_captured_logs(|| {
            para.set_csc_matrix(&CscMatrixPara {
                matrix: [40000, 0, 0, 0, 0, 0, 0, 0, 0],
                output_bias: [0, 0, 256],
                ..Default::default()
            });
        });
        assert!(logs.contains("wrap"), "{}", logs);
        assert!(logs.contains("wide_coefficients=1"), "{}", logs);
        assert!(logs.contains("wide_biases=1"), "{}", logs);

        let mut para = AippPara::new(1).unwrap();
        let logs = with_captured_logs(|| {
            para.set_csc_matrix(&CscMatrixPara::default());
        });
        assert!(logs.is_empty(), "{}", logs);
    }

    #[test]
    fn batch_count_bounds() {
        assert!(AippPara::new(0).is_err());
        assert!(AippPara::new(128).is_err());
        assert_eq!(AippPara::new(127).unwrap().batch_count(), 127);
    }

    #[test]
    fn packed_size() {
        let para = AippPara::new(3).unwrap();
        assert_eq!(para.byte_len(), 64 + 3 * 96);
        assert_eq!(para.to_bytes().len(), para.byte_len());
    }

    #[test]
    fn variance_reciprocal_starts_at_one() {
        let para = AippPara::new(2).unwrap();
        assert_eq!(para.dtc(1).unwrap().pixel_var_reci, [1.0; 4]);
        let bytes = para.to_bytes();
        // 1.0 in half precision, first var_reci of batch 0
        assert_eq!(&bytes[64 + 72..64 + 74], &[0x00, 0x3c]);
    }

    #[test]
    fn fp16_values_are_clamped() {
        let mut para = AippPara::new(1).unwrap();
        let pad = PadPara {
            padding_value: [1e9, -1e9, 0.5, 3.0],
            ..PadPara::default()
        };
        para.set_padding(0, &pad).unwrap();
        assert_eq!(
            para.padding(0).unwrap().padding_value,
            [65504.0, -65504.0, 0.5, 3.0]
        );
        assert!(para.enable_padding());
    }

    #[test]
    fn batch_index_is_checked() {
        let mut para = AippPara::new(2).unwrap();
        let err = para.set_crop(2, &CropPara::default()).unwrap_err();
        assert!(matches!(err, AippError::OutOfRange { index: 2, len: 2, .. }));
        assert!(!para.enable_crop());
        assert!(para.dtc(5).is_err());
    }

    #[test]
    fn resize_input_follows_crop() {
        let mut para = AippPara::new(1).unwrap();
        para.set_input_shape(640, 480);
        let resize = ResizePara {
            resize_output_size_w: 224,
            resize_output_size_h: 224,
            ..ResizePara::default()
        };
        para.set_resize(0, &resize).unwrap();
        assert_eq!(para.resize_input_size(0).unwrap(), [640, 480]);

        let crop = CropPara {
            crop_size_w: 300,
            crop_size_h: 200,
            ..CropPara::default()
        };
        para.set_crop(0, &crop).unwrap();
        assert_eq!(para.resize_input_size(0).unwrap(), [300, 200]);
    }

    #[test]
    fn set_csc_requires_input_format() {
        let mut para = AippPara::new(1).unwrap();
        assert!(para.set_csc(ImageFormat::Rgb888, ImageColorSpace::Jpeg).is_err());
        assert!(!para.enable_csc());

        para.set_input_format(ImageFormat::Yuv420sp).unwrap();
        para.set_csc(ImageFormat::Rgb888, ImageColorSpace::Jpeg).unwrap();
        let matrix = para.csc_matrix();
        assert_eq!(matrix.matrix, [256, 0, 359, 256, -88, -183, 256, 454, 0]);
        assert_eq!(matrix.input_bias, [0, 128, 128]);
        assert!(para.enable_csc());
    }

    #[test]
    fn input_format_uses_runtime_codes() {
        let mut para = AippPara::new(1).unwrap();
        para.set_input_format(ImageFormat::Rgb888).unwrap();
        assert_eq!(para.to_bytes()[0], 5);
        assert_eq!(para.input_format(), ImageFormat::Rgb888);
        assert!(matches!(
            para.set_input_format(ImageFormat::Bgr888),
            Err(AippError::Unsupported(_))
        ));
        assert_eq!(para.input_format(), ImageFormat::Rgb888);
    }

    #[test]
    fn packed_buffer_parses_back() {
        let mut para = AippPara::new(2).unwrap();
        para.set_input_format(ImageFormat::Yuv420sp).unwrap();
        para.set_input_shape(32, 16);
        para.set_crop_all(&CropPara {
            crop_size_w: 8,
            crop_size_h: 8,
            ..CropPara::default()
        });
        para.set_dtc(1, &DtcPara {
            pixel_mean: [1, 2, 3, 4],
            ..DtcPara::default()
        })
        .unwrap();

        let parsed = AippPara::from_bytes(&para.to_bytes()).unwrap();
        assert_eq!(parsed.input_shape(), [32, 16]);
        assert_eq!(parsed.crop(1).unwrap().crop_size_w, 8);
        assert_eq!(parsed.dtc(1).unwrap().pixel_mean, [1, 2, 3, 4]);
        assert!(parsed.enable_crop());
        assert!(!parsed.enable_resize());
    }

    #[test]
    fn truncated_buffer_is_rejected() {
        let bytes = AippPara::new(2).unwrap().to_bytes();
        assert!(AippPara::from_bytes(&bytes[..bytes.len() - 1]).is_err());
        assert!(AippPara::from_bytes(&bytes[..10]).unwrap_err().is_corruption());
    }
}
