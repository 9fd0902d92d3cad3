/*
 * Copyright (c) Radzivon Bartoshyk, 10/2024. All rights reserved.
 *
 * Redistribution and use in source and binary forms, with or without modification,
 * are permitted provided that the following conditions are met:
 *
 * 1.  Redistributions of source code must retain the above copyright notice, this
 * list of conditions and the following disclaimer.
 *
 * 2.  Redistributions in binary form must reproduce the above copyright notice,
 * this list of conditions and the following disclaimer in the documentation
 * and/or other materials provided with the distribution.
 *
 * 3.  Neither the name of the copyright holder nor the names of its
 * contributors may be used to endorse or promote products derived from
 * this software without specific prior written permission.
 *
 * THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS"
 * AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
 * IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
 * DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE
 * FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL
 * DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
 * SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER
 * CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY,
 * OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
 * OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.
 */
use crate::depth_convert::get_scale_offset;
use crate::errors::PipelineError;
use crate::filter::{FilterFlags, ImageFilter};
use crate::image_buffer::{PlaneBuffer, PlaneBufferMut};
use crate::pixel::{ImageAttributes, PixelFormat, PixelType};

#[inline(always)]
fn diffuse_line<T: Copy + Into<f32>, U: Copy>(
    src: &[T],
    dst: &mut [U],
    error_top: &[f32],
    error_cur: &mut [f32],
    quantize: impl Fn(f32) -> (U, f32),
    scale: f32,
    offset: f32,
    bits: u32,
) {
    let max_value = ((1u64 << bits) - 1) as f32;

    for (j, (d, &x)) in dst.iter_mut().zip(src.iter()).enumerate() {
        // Error rows are padded by one cell on each side.
        let j_err = j + 1;

        let mut v = x.into() * scale + offset;

        let mut err = 0f32;
        err += error_cur[j_err - 1] * (7.0 / 16.0);
        err += error_top[j_err + 1] * (3.0 / 16.0);
        err += error_top[j_err] * (5.0 / 16.0);
        err += error_top[j_err - 1] * (1.0 / 16.0);

        v = (v + err).clamp(0.0, max_value);

        let (q, residual) = quantize(v);
        *d = q;
        error_cur[j_err] = residual;
    }
}

/// Floyd-Steinberg error diffusion to an integer format.
///
/// Stateful and entire-row: the per-execution context carries two padded
/// error rows, with row parity selecting which half is "top".
pub struct ErrorDiffusion {
    attr: ImageAttributes,
    ty_in: PixelType,
    scale: f32,
    offset: f32,
    depth: u32,
}

impl ErrorDiffusion {
    pub fn new(
        width: u32,
        height: u32,
        pixel_in: &PixelFormat,
        pixel_out: &PixelFormat,
    ) -> Result<Self, PipelineError> {
        if !pixel_out.ty.is_integer() {
            return Err(PipelineError::Logic("cannot dither to non-integer format"));
        }
        if pixel_in.ty == PixelType::F16 {
            return Err(PipelineError::Logic("dither input must be widened first"));
        }

        let (scale, offset) = get_scale_offset(pixel_in, pixel_out);
        Ok(ErrorDiffusion {
            attr: ImageAttributes::new(width, height, pixel_out.ty),
            ty_in: pixel_in.ty,
            scale,
            offset,
            depth: pixel_out.depth,
        })
    }

    fn error_row_len(&self) -> usize {
        self.attr.width as usize + 2
    }
}

impl ImageFilter for ErrorDiffusion {
    fn flags(&self) -> FilterFlags {
        let mut flags = FilterFlags::SAME_ROW | FilterFlags::ENTIRE_ROW | FilterFlags::STATEFUL;
        if self.ty_in.size() == self.attr.ty.size() {
            flags |= FilterFlags::IN_PLACE;
        }
        flags
    }

    fn image_attributes(&self) -> ImageAttributes {
        self.attr
    }

    fn required_col_range(&self, _left: u32, _right: u32) -> std::ops::Range<u32> {
        0..self.attr.width
    }

    fn context_size(&self) -> usize {
        self.error_row_len() * std::mem::size_of::<f32>() * 2
    }

    fn process(
        &self,
        ctx: &mut [u8],
        src: &[PlaneBuffer<'_>],
        dst: &mut [PlaneBufferMut<'_>],
        _tmp: &mut [u8],
        i: u32,
        _left: u32,
        _right: u32,
    ) {
        let width = self.attr.width as usize;
        let row_len = self.error_row_len();

        let errors: &mut [f32] = bytemuck::cast_slice_mut(ctx);
        let (error_a, error_b) = errors.split_at_mut(row_len);
        let (error_top, error_cur) = if i % 2 != 0 {
            (&*error_a, error_b)
        } else {
            (&*error_b, error_a)
        };

        let (scale, offset, bits) = (self.scale, self.offset, self.depth);

        match (self.ty_in, self.attr.ty) {
            (PixelType::U8, PixelType::U8) => diffuse_line(
                src[0].row::<u8>(i, 0, width),
                dst[0].row_mut::<u8>(i, 0, width),
                error_top,
                error_cur,
                |v| {
                    let q = v.round_ties_even();
                    (q as u8, v - q)
                },
                scale,
                offset,
                bits,
            ),
            (PixelType::U8, PixelType::U16) => diffuse_line(
                src[0].row::<u8>(i, 0, width),
                dst[0].row_mut::<u16>(i, 0, width),
                error_top,
                error_cur,
                |v| {
                    let q = v.round_ties_even();
                    (q as u16, v - q)
                },
                scale,
                offset,
                bits,
            ),
            (PixelType::U16, PixelType::U8) => diffuse_line(
                src[0].row::<u16>(i, 0, width),
                dst[0].row_mut::<u8>(i, 0, width),
                error_top,
                error_cur,
                |v| {
                    let q = v.round_ties_even();
                    (q as u8, v - q)
                },
                scale,
                offset,
                bits,
            ),
            (PixelType::U16, PixelType::U16) => diffuse_line(
                src[0].row::<u16>(i, 0, width),
                dst[0].row_mut::<u16>(i, 0, width),
                error_top,
                error_cur,
                |v| {
                    let q = v.round_ties_even();
                    (q as u16, v - q)
                },
                scale,
                offset,
                bits,
            ),
            (PixelType::F32, PixelType::U8) => diffuse_line(
                src[0].row::<f32>(i, 0, width),
                dst[0].row_mut::<u8>(i, 0, width),
                error_top,
                error_cur,
                |v| {
                    let q = v.round_ties_even();
                    (q as u8, v - q)
                },
                scale,
                offset,
                bits,
            ),
            (PixelType::F32, PixelType::U16) => diffuse_line(
                src[0].row::<f32>(i, 0, width),
                dst[0].row_mut::<u16>(i, 0, width),
                error_top,
                error_cur,
                |v| {
                    let q = v.round_ties_even();
                    (q as u16, v - q)
                },
                scale,
                offset,
                bits,
            ),
            _ => unreachable!("no conversion between pixel types"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_buffer::AlignedBuffer;

    fn run_frame(width: usize, height: usize, value: f32, depth: u32) -> Vec<u8> {
        let f32_fmt = PixelFormat::new(PixelType::F32);
        let mut out_fmt = PixelFormat::new(PixelType::U8).with_depth(depth);
        out_fmt.fullrange = true;
        let filter = ErrorDiffusion::new(width as u32, height as u32, &f32_fmt, &out_fmt).unwrap();

        let row_stride = crate::align::ceil_n(width * 4, 32);
        let mut src_store = AlignedBuffer::new(row_stride * height);
        {
            let mut plane = PlaneBufferMut::new(src_store.as_bytes_mut(), row_stride as isize);
            for i in 0..height {
                let row: &mut [f32] = plane.row_mut(i as u32, 0, width);
                row.fill(value);
            }
        }
        let dst_stride = crate::align::ceil_n(width, 32);
        let mut dst_store = AlignedBuffer::new(dst_stride * height);

        let mut ctx = AlignedBuffer::new(filter.context_size());
        filter.init_context(ctx.as_bytes_mut());

        let src = [PlaneBuffer::new(src_store.as_bytes(), row_stride as isize)];
        {
            let mut dst = [PlaneBufferMut::new(dst_store.as_bytes_mut(), dst_stride as isize)];
            for i in 0..height {
                filter.process(
                    ctx.as_bytes_mut(),
                    &src,
                    &mut dst,
                    &mut [],
                    i as u32,
                    0,
                    width as u32,
                );
            }
        }

        let mut out = Vec::with_capacity(width * height);
        let plane = PlaneBuffer::new(dst_store.as_bytes(), dst_stride as isize);
        for i in 0..height {
            out.extend_from_slice(&plane.line(i as u32)[..width]);
        }
        out
    }

    #[test]
    fn uniform_half_dithers_to_half_ones() {
        // A 0.5 grey frame to one bit: the population must split evenly.
        let (w, h) = (256, 256);
        let out = run_frame(w, h, 0.5, 1);
        let ones = out.iter().filter(|&&v| v == 1).count();
        let total = w * h;
        let diff = ones as i64 - (total / 2) as i64;
        assert!(diff.abs() <= (total / 1000) as i64, "ones = {ones}");
    }

    #[test]
    fn preserves_mean_of_flat_field() {
        let (w, h) = (128, 64);
        let out = run_frame(w, h, 100.25 / 255.0, 8);
        let sum: u64 = out.iter().map(|&v| u64::from(v)).sum();
        let mean = sum as f64 / (w * h) as f64;
        assert!((mean - 100.25).abs() < 0.01, "mean = {mean}");
    }

    #[test]
    fn exact_values_pass_through() {
        let out = run_frame(64, 8, 37.0 / 255.0, 8);
        assert!(out.iter().all(|&v| v == 37));
    }
}
