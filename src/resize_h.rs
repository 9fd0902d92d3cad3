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
use crate::filter::{FilterFlags, ImageFilter};
use crate::image_buffer::{PlaneBuffer, PlaneBufferMut};
use crate::pixel::{ImageAttributes, PixelType};
use crate::resize_table::{FilterTable, COEFF_PRECISION};

#[inline(always)]
pub(crate) fn unpack_pixel_u16(x: u16) -> i32 {
    i32::from(x) + i32::from(i16::MIN)
}

#[inline(always)]
pub(crate) fn pack_pixel_u16(x: i32, pixel_max: i32) -> u16 {
    let x = ((x + (1 << (COEFF_PRECISION - 1))) >> COEFF_PRECISION) - i32::from(i16::MIN);
    x.clamp(0, pixel_max) as u16
}

fn resize_line_h_u16(
    table: &FilterTable,
    src: &[u16],
    dst: &mut [u16],
    left: u32,
    right: u32,
    pixel_max: i32,
) {
    for j in left..right {
        let top = table.left[j as usize] as usize;
        let mut accum = 0i32;

        for (k, &coeff) in table.row_i16(j).iter().enumerate() {
            accum += i32::from(coeff) * unpack_pixel_u16(src[top + k]);
        }

        dst[j as usize] = pack_pixel_u16(accum, pixel_max);
    }
}

fn resize_line_h_f32(table: &FilterTable, src: &[f32], dst: &mut [f32], left: u32, right: u32) {
    for j in left..right {
        let top = table.left[j as usize] as usize;
        let mut accum = 0f32;

        for (k, &coeff) in table.row_f32(j).iter().enumerate() {
            accum += coeff * src[top + k];
        }

        dst[j as usize] = accum;
    }
}

/// Horizontal polyphase resampler over one plane.
pub struct ResizeHorizontal {
    table: FilterTable,
    attr: ImageAttributes,
    pixel_max: i32,
    sorted: bool,
}

impl ResizeHorizontal {
    pub fn new(table: FilterTable, height: u32, ty: PixelType, depth: u32) -> Self {
        debug_assert!(
            matches!(ty, PixelType::U16 | PixelType::F32),
            "pixel type not supported"
        );
        let sorted = table.is_sorted();
        ResizeHorizontal {
            attr: ImageAttributes::new(table.filter_rows, height, ty),
            pixel_max: (1i64 << depth) as i32 - 1,
            sorted,
            table,
        }
    }
}

impl ImageFilter for ResizeHorizontal {
    fn flags(&self) -> FilterFlags {
        let mut flags = FilterFlags::SAME_ROW;
        if !self.sorted {
            flags |= FilterFlags::ENTIRE_ROW;
        }
        flags
    }

    fn image_attributes(&self) -> ImageAttributes {
        self.attr
    }

    fn required_col_range(&self, left: u32, right: u32) -> std::ops::Range<u32> {
        if self.sorted {
            let col_left = self.table.left[left as usize];
            let col_right =
                self.table.left[right as usize - 1] + self.table.filter_width;
            col_left..col_right
        } else {
            0..self.table.input_width
        }
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
        let in_width = self.table.input_width as usize;
        let out_width = self.attr.width as usize;

        match self.attr.ty {
            PixelType::U16 => {
                let src_row: &[u16] = src[0].row(i, 0, in_width);
                let dst_row: &mut [u16] = dst[0].row_mut(i, 0, out_width);
                resize_line_h_u16(&self.table, src_row, dst_row, left, right, self.pixel_max);
            }
            PixelType::F32 => {
                let src_row: &[f32] = src[0].row(i, 0, in_width);
                let dst_row: &mut [f32] = dst[0].row_mut(i, 0, out_width);
                resize_line_h_f32(&self.table, src_row, dst_row, left, right);
            }
            _ => unreachable!("pixel type not supported"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_buffer::AlignedBuffer;
    use crate::resize_table::compute_filter;
    use crate::sampler::Kernel;

    #[test]
    fn pack_rounds_and_clamps() {
        assert_eq!(pack_pixel_u16(unpack_pixel_u16(100) << COEFF_PRECISION, 255), 100);
        assert_eq!(pack_pixel_u16(unpack_pixel_u16(400) << COEFF_PRECISION, 255), 255);
        assert_eq!(pack_pixel_u16(i32::from(i16::MIN) << COEFF_PRECISION, 65535), 0);
    }

    #[test]
    fn doubles_a_u16_ramp() {
        let table = compute_filter(&Kernel::Bilinear, 8, 16, 0.0, 8.0).unwrap();
        let filter = ResizeHorizontal::new(table, 1, PixelType::U16, 16);

        let mut src_store = AlignedBuffer::new(32);
        {
            let mut plane = PlaneBufferMut::new(src_store.as_bytes_mut(), 32);
            let row: &mut [u16] = plane.row_mut(0, 0, 8);
            for (j, px) in row.iter_mut().enumerate() {
                *px = j as u16 * 1000;
            }
        }
        let mut dst_store = AlignedBuffer::new(32);

        let src = [PlaneBuffer::new(src_store.as_bytes(), 32)];
        let mut dst = [PlaneBufferMut::new(dst_store.as_bytes_mut(), 32)];
        filter.process(&mut [], &src, &mut dst, &mut [], 0, 0, 16);
        drop(dst);

        let out = PlaneBuffer::new(dst_store.as_bytes(), 32);
        let row: &[u16] = out.row(0, 0, 16);
        // Interior samples interpolate the ramp halfway between neighbours.
        assert_eq!(row[2], 750);
        assert_eq!(row[3], 1250);
        assert_eq!(row[8], 3750);
        // Edges clamp to the boundary sample.
        assert_eq!(row[0], 0);
        assert_eq!(row[15], 7000);
    }

    #[test]
    fn partial_range_leaves_other_columns() {
        let table = compute_filter(&Kernel::Bilinear, 8, 8, 0.0, 8.0).unwrap();
        let filter = ResizeHorizontal::new(table, 1, PixelType::F32, 32);

        let mut src_store = AlignedBuffer::new(32);
        {
            let mut plane = PlaneBufferMut::new(src_store.as_bytes_mut(), 32);
            let row: &mut [f32] = plane.row_mut(0, 0, 8);
            row.copy_from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        }
        let mut dst_store = AlignedBuffer::new(32);

        let src = [PlaneBuffer::new(src_store.as_bytes(), 32)];
        let mut dst = [PlaneBufferMut::new(dst_store.as_bytes_mut(), 32)];
        filter.process(&mut [], &src, &mut dst, &mut [], 0, 2, 6);
        drop(dst);

        let out = PlaneBuffer::new(dst_store.as_bytes(), 32);
        let row: &[f32] = out.row(0, 0, 8);
        assert_eq!(&row[2..6], &[3.0, 4.0, 5.0, 6.0]);
        assert_eq!(row[0], 0.0);
        assert_eq!(row[7], 0.0);
    }
}
