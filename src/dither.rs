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
use crate::errors::PipelineError;
use crate::filter::{FilterFlags, ImageFilter};
use crate::image_buffer::{PlaneBuffer, PlaneBufferMut};
use crate::pixel::{ImageAttributes, PixelFormat, PixelType};
use rand::{RngCore, SeedableRng};
use rand_xorshift::XorShiftRng;

/// Rounding mode applied when converting to an integer format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DitherType {
    #[default]
    None,
    Ordered,
    Random,
    ErrorDiffusion,
}

const BAYER_TABLE_LEN: usize = 8;

const BAYER_TABLE: [u8; BAYER_TABLE_LEN * BAYER_TABLE_LEN] = [
    1, 49, 13, 61, 4, 52, 16, 64, //
    33, 17, 45, 29, 36, 20, 48, 32, //
    9, 57, 5, 53, 12, 60, 8, 56, //
    41, 25, 37, 21, 44, 28, 40, 24, //
    3, 51, 15, 63, 2, 50, 14, 62, //
    35, 19, 47, 31, 34, 18, 46, 30, //
    11, 59, 7, 55, 10, 58, 6, 54, //
    43, 27, 39, 23, 42, 26, 38, 22,
];

const BAYER_TABLE_SCALE: f32 = 65.0;

const RAND_NUM: usize = 1 << 14;

/// Greatest magnitude such that `rint(65535.0 + x)` still yields 65535.
const RAND_SAFE_LIMIT: f32 = f32::from_bits(0x3efe_ffff);

pub(crate) enum DitherTable {
    None,
    Bayer(Vec<f32>),
    Random {
        table: Vec<f32>,
        row_offset: Vec<u32>,
    },
}

impl DitherTable {
    pub(crate) fn create(ty: DitherType, height: u32) -> Result<DitherTable, PipelineError> {
        match ty {
            DitherType::None => Ok(DitherTable::None),
            DitherType::Ordered => {
                let table = BAYER_TABLE
                    .iter()
                    .map(|&v| f32::from(v) / BAYER_TABLE_SCALE - 0.5)
                    .collect();
                Ok(DitherTable::Bayer(table))
            }
            DitherType::Random => {
                let mut rng = XorShiftRng::seed_from_u64(0);
                let table = (0..RAND_NUM)
                    .map(|_| {
                        let x = rng.next_u32() as f64 / f64::from(u32::MAX) - 0.5;
                        (x as f32).clamp(-RAND_SAFE_LIMIT, RAND_SAFE_LIMIT)
                    })
                    .collect();
                let row_offset = (0..height)
                    .map(|i| {
                        let mut row_rng = XorShiftRng::seed_from_u64(u64::from(i));
                        row_rng.next_u32() & !7
                    })
                    .collect();
                Ok(DitherTable::Random { table, row_offset })
            }
            DitherType::ErrorDiffusion => Err(PipelineError::Logic(
                "error diffusion is not an ordered dither",
            )),
        }
    }

    /// Dither coefficients for row `i`: `(table, offset, mask)`, indexed by
    /// `(offset + column) & mask`.
    fn coeffs(&self, i: u32) -> (&[f32], u32, u32) {
        const ZEROS: [f32; BAYER_TABLE_LEN] = [0f32; BAYER_TABLE_LEN];
        match self {
            DitherTable::None => (&ZEROS, 0, BAYER_TABLE_LEN as u32 - 1),
            DitherTable::Bayer(table) => {
                let row = i as usize % BAYER_TABLE_LEN;
                (
                    &table[row * BAYER_TABLE_LEN..(row + 1) * BAYER_TABLE_LEN],
                    0,
                    BAYER_TABLE_LEN as u32 - 1,
                )
            }
            DitherTable::Random { table, row_offset } => (
                table,
                row_offset[i as usize % row_offset.len()],
                RAND_NUM as u32 - 1,
            ),
        }
    }
}

#[inline(always)]
fn dither_line<T: Copy + Into<f32>, U: Copy>(
    dither: &[f32],
    dither_offset: u32,
    dither_mask: u32,
    src: &[T],
    dst: &mut [U],
    quantize: impl Fn(f32) -> U,
    scale: f32,
    offset: f32,
    bits: u32,
    left: u32,
) {
    let max_value = ((1u64 << bits) - 1) as f32;
    for (j, (d, &x)) in dst.iter_mut().zip(src.iter()).enumerate() {
        let col = left + j as u32;
        let v = x.into() * scale + offset + dither[((dither_offset + col) & dither_mask) as usize];
        *d = quantize(v.clamp(0.0, max_value));
    }
}

/// Ordered (or plain rounding) conversion to an integer format.
pub struct OrderedDither {
    table: DitherTable,
    attr: ImageAttributes,
    ty_in: PixelType,
    scale: f32,
    offset: f32,
    depth: u32,
}

impl OrderedDither {
    pub fn new(
        ty: DitherType,
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

        let (scale, offset) = crate::depth_convert::get_scale_offset(pixel_in, pixel_out);
        Ok(OrderedDither {
            table: DitherTable::create(ty, height)?,
            attr: ImageAttributes::new(width, height, pixel_out.ty),
            ty_in: pixel_in.ty,
            scale,
            offset,
            depth: pixel_out.depth,
        })
    }
}

impl ImageFilter for OrderedDither {
    fn flags(&self) -> FilterFlags {
        let mut flags = FilterFlags::SAME_ROW;
        if self.ty_in.size() == self.attr.ty.size() {
            flags |= FilterFlags::IN_PLACE;
        }
        flags
    }

    fn image_attributes(&self) -> ImageAttributes {
        self.attr
    }

    fn process(
        &self,
        _ctx: &mut [u8],
        src: &[PlaneBuffer<'_>],
        dst: &mut [PlaneBufferMut<'_>],
        _tmp: &mut [u8],
        i: u32,
        left: u32,
        right: u32,
    ) {
        let (l, r) = (left as usize, right as usize);
        let (dither, offset, mask) = self.table.coeffs(i);
        let (scale, shift, bits) = (self.scale, self.offset, self.depth);

        match (self.ty_in, self.attr.ty) {
            (PixelType::U8, PixelType::U8) => dither_line(
                dither,
                offset,
                mask,
                src[0].row::<u8>(i, l, r),
                dst[0].row_mut::<u8>(i, l, r),
                |v| v.round_ties_even() as u8,
                scale,
                shift,
                bits,
                left,
            ),
            (PixelType::U8, PixelType::U16) => dither_line(
                dither,
                offset,
                mask,
                src[0].row::<u8>(i, l, r),
                dst[0].row_mut::<u16>(i, l, r),
                |v| v.round_ties_even() as u16,
                scale,
                shift,
                bits,
                left,
            ),
            (PixelType::U16, PixelType::U8) => dither_line(
                dither,
                offset,
                mask,
                src[0].row::<u16>(i, l, r),
                dst[0].row_mut::<u8>(i, l, r),
                |v| v.round_ties_even() as u8,
                scale,
                shift,
                bits,
                left,
            ),
            (PixelType::U16, PixelType::U16) => dither_line(
                dither,
                offset,
                mask,
                src[0].row::<u16>(i, l, r),
                dst[0].row_mut::<u16>(i, l, r),
                |v| v.round_ties_even() as u16,
                scale,
                shift,
                bits,
                left,
            ),
            (PixelType::F32, PixelType::U8) => dither_line(
                dither,
                offset,
                mask,
                src[0].row::<f32>(i, l, r),
                dst[0].row_mut::<u8>(i, l, r),
                |v| v.round_ties_even() as u8,
                scale,
                shift,
                bits,
                left,
            ),
            (PixelType::F32, PixelType::U16) => dither_line(
                dither,
                offset,
                mask,
                src[0].row::<f32>(i, l, r),
                dst[0].row_mut::<u16>(i, l, r),
                |v| v.round_ties_even() as u16,
                scale,
                shift,
                bits,
                left,
            ),
            _ => unreachable!("no conversion between pixel types"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_buffer::AlignedBuffer;

    #[test]
    fn bayer_table_is_zero_mean() {
        let table = match DitherTable::create(DitherType::Ordered, 8).unwrap() {
            DitherTable::Bayer(t) => t,
            _ => unreachable!(),
        };
        let sum: f32 = table.iter().sum();
        assert!(sum.abs() < 1e-4, "sum = {sum}");
        assert!(table.iter().all(|&v| (-0.5..=0.5).contains(&v)));
    }

    #[test]
    fn random_table_is_deterministic_and_bounded() {
        let a = DitherTable::create(DitherType::Random, 16).unwrap();
        let b = DitherTable::create(DitherType::Random, 16).unwrap();
        match (&a, &b) {
            (
                DitherTable::Random { table: ta, row_offset: ra },
                DitherTable::Random { table: tb, row_offset: rb },
            ) => {
                assert_eq!(ta, tb);
                assert_eq!(ra, rb);
                assert!(ta.iter().all(|v| v.abs() <= RAND_SAFE_LIMIT));
                assert!(ra.iter().all(|&o| o % 8 == 0));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn none_dither_round_trips_u8_through_f32() {
        let u8_fmt = PixelFormat::new(PixelType::U8);
        let f32_fmt = PixelFormat::new(PixelType::F32);
        let (up_scale, up_offset) = crate::depth_convert::get_scale_offset(&u8_fmt, &f32_fmt);

        let filter = OrderedDither::new(DitherType::None, 256, 1, &f32_fmt, &u8_fmt).unwrap();

        let mut src_store = AlignedBuffer::new(256 * 4);
        {
            let mut plane = PlaneBufferMut::new(src_store.as_bytes_mut(), 256 * 4);
            let row: &mut [f32] = plane.row_mut(0, 0, 256);
            for (v, px) in row.iter_mut().enumerate() {
                *px = v as f32 * up_scale + up_offset;
            }
        }
        let mut dst_store = AlignedBuffer::new(256);

        let src = [PlaneBuffer::new(src_store.as_bytes(), 256 * 4)];
        let mut dst = [PlaneBufferMut::new(dst_store.as_bytes_mut(), 256)];
        filter.process(&mut [], &src, &mut dst, &mut [], 0, 0, 256);
        drop(dst);

        for (v, &out) in dst_store.as_bytes()[..256].iter().enumerate() {
            assert_eq!(out as usize, v);
        }
    }

    #[test]
    fn ordered_dither_stays_within_one_step() {
        let u16_fmt = PixelFormat::new(PixelType::U16).with_depth(16);
        let u8_fmt = PixelFormat::new(PixelType::U8);
        let filter = OrderedDither::new(DitherType::Ordered, 64, 8, &u16_fmt, &u8_fmt).unwrap();

        let mut src_store = AlignedBuffer::new(64 * 2);
        {
            let mut plane = PlaneBufferMut::new(src_store.as_bytes_mut(), 128);
            let row: &mut [u16] = plane.row_mut(0, 0, 64);
            // 128.5 in 8-bit terms, the worst case for plain rounding.
            row.fill(0x8080);
        }
        let mut dst_store = AlignedBuffer::new(64);

        let src = [PlaneBuffer::with_mask(src_store.as_bytes(), 128, 0)];
        let mut dst = [PlaneBufferMut::with_mask(dst_store.as_bytes_mut(), 64, 0)];
        let mut low = 0usize;
        let mut high = 0usize;
        for i in 0..8 {
            filter.process(&mut [], &src, &mut dst, &mut [], i, 0, 64);
            for &v in dst[0].as_const().line(i).iter().take(64) {
                assert!(v == 128 || v == 129, "value {v}");
                if v == 128 {
                    low += 1;
                } else {
                    high += 1;
                }
            }
        }
        // The Bayer matrix splits a half-step value both ways.
        assert!(low > 0 && high > 0);
        assert_eq!(low, high);
    }
}
