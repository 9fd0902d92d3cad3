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
use crate::resize_h::{pack_pixel_u16, unpack_pixel_u16};
use crate::resize_table::FilterTable;

fn resize_line_v_u16(
    table: &FilterTable,
    src: &PlaneBuffer<'_>,
    dst_row: &mut [u16],
    i: u32,
    left: u32,
    right: u32,
    pixel_max: i32,
) {
    let top = table.left[i as usize];
    let coeffs = table.row_i16(i);

    let rows: Vec<&[u16]> = coeffs
        .iter()
        .enumerate()
        .map(|(k, _)| src.row::<u16>(top + k as u32, left as usize, right as usize))
        .collect();

    for j in 0..(right - left) as usize {
        let mut accum = 0i32;
        for (row, &coeff) in rows.iter().zip(coeffs.iter()) {
            accum += i32::from(coeff) * unpack_pixel_u16(row[j]);
        }
        dst_row[j] = pack_pixel_u16(accum, pixel_max);
    }
}

fn resize_line_v_f32(
    table: &FilterTable,
    src: &PlaneBuffer<'_>,
    dst_row: &mut [f32],
    i: u32,
    left: u32,
    right: u32,
) {
    let top = table.left[i as usize];
    let coeffs = table.row_f32(i);

    let rows: Vec<&[f32]> = coeffs
        .iter()
        .enumerate()
        .map(|(k, _)| src.row::<f32>(top + k as u32, left as usize, right as usize))
        .collect();

    for j in 0..(right - left) as usize {
        let mut accum = 0f32;
        for (row, &coeff) in rows.iter().zip(coeffs.iter()) {
            accum += coeff * row[j];
        }
        dst_row[j] = accum;
    }
}

/// Vertical polyphase resampler over one plane, pulling taps from the
/// parent's circular row window.
pub struct ResizeVertical {
    table: FilterTable,
    attr: ImageAttributes,
    pixel_max: i32,
    sorted: bool,
}

impl ResizeVertical {
    pub fn new(table: FilterTable, width: u32, ty: PixelType, depth: u32) -> Self {
        debug_assert!(
            matches!(ty, PixelType::U16 | PixelType::F32),
            "pixel type not supported"
        );
        let sorted = table.is_sorted();
        ResizeVertical {
            attr: ImageAttributes::new(width, table.filter_rows, ty),
            pixel_max: (1i64 << depth) as i32 - 1,
            sorted,
            table,
        }
    }
}

impl ImageFilter for ResizeVertical {
    fn flags(&self) -> FilterFlags {
        if self.sorted {
            FilterFlags::empty()
        } else {
            FilterFlags::ENTIRE_ROW
        }
    }

    fn image_attributes(&self) -> ImageAttributes {
        self.attr
    }

    fn required_row_range(&self, i: u32) -> std::ops::Range<u32> {
        let bot = (i + self.simultaneous_lines()).min(self.attr.height);

        if self.sorted {
            let row_top = self.table.left[i as usize];
            let row_bot = self.table.left[bot as usize - 1];
            row_top..row_bot + self.table.filter_width
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
        match self.attr.ty {
            PixelType::U16 => {
                let dst_row: &mut [u16] = dst[0].row_mut(i, left as usize, right as usize);
                resize_line_v_u16(&self.table, &src[0], dst_row, i, left, right, self.pixel_max);
            }
            PixelType::F32 => {
                let dst_row: &mut [f32] = dst[0].row_mut(i, left as usize, right as usize);
                resize_line_v_f32(&self.table, &src[0], dst_row, i, left, right);
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

    fn fill_rows_f32(store: &mut AlignedBuffer, stride: usize, rows: usize, cols: usize) {
        let mut plane = PlaneBufferMut::new(store.as_bytes_mut(), stride as isize);
        for i in 0..rows {
            let row: &mut [f32] = plane.row_mut(i as u32, 0, cols);
            for px in row.iter_mut() {
                *px = i as f32;
            }
        }
    }

    #[test]
    fn halves_row_count() {
        let table = compute_filter(&Kernel::Bilinear, 8, 4, 0.0, 8.0).unwrap();
        let filter = ResizeVertical::new(table, 4, PixelType::F32, 32);
        assert_eq!(filter.image_attributes().height, 4);

        let mut src_store = AlignedBuffer::new(8 * 32);
        fill_rows_f32(&mut src_store, 32, 8, 4);
        let mut dst_store = AlignedBuffer::new(4 * 32);

        let src = [PlaneBuffer::new(src_store.as_bytes(), 32)];
        let mut dst = [PlaneBufferMut::new(dst_store.as_bytes_mut(), 32)];
        for i in 0..4 {
            filter.process(&mut [], &src, &mut dst, &mut [], i, 0, 4);
        }
        drop(dst);

        let out = PlaneBuffer::new(dst_store.as_bytes(), 32);
        // Interior output row i sits at source position 2i + 0.5; the
        // extremal rows pick up the mirrored boundary taps.
        for i in 1..3 {
            let row: &[f32] = out.row(i, 0, 4);
            assert!((row[0] - (2.0 * i as f32 + 0.5)).abs() < 1e-6, "row {i}: {}", row[0]);
        }
        let first: &[f32] = out.row(0, 0, 4);
        assert!((first[0] - 0.625).abs() < 1e-6, "row 0: {}", first[0]);
        let last: &[f32] = out.row(3, 0, 4);
        assert!((last[0] - 6.375).abs() < 1e-6, "row 3: {}", last[0]);
    }

    #[test]
    fn row_ranges_follow_taps() {
        let table = compute_filter(&Kernel::Bilinear, 8, 4, 0.0, 8.0).unwrap();
        let filter = ResizeVertical::new(table, 4, PixelType::F32, 32);
        for i in 0..4 {
            let range = filter.required_row_range(i);
            assert!(range.start < range.end);
            assert!(range.end <= 8);
        }
    }

    #[test]
    fn reads_circular_source_window() {
        let table = compute_filter(&Kernel::Bilinear, 8, 8, 0.0, 8.0).unwrap();
        let filter = ResizeVertical::new(table, 4, PixelType::F32, 32);

        // Identity resize through a 2-row circular window: each output row
        // only needs its own source row, so a mask of 1 suffices.
        let mut src_store = AlignedBuffer::new(2 * 32);
        let mut dst_store = AlignedBuffer::new(8 * 32);

        for i in 0..8u32 {
            {
                let mut plane = PlaneBufferMut::with_mask(src_store.as_bytes_mut(), 32, 1);
                let row: &mut [f32] = plane.row_mut(i, 0, 4);
                row.fill(i as f32 * 10.0);
            }
            let src = [PlaneBuffer::with_mask(src_store.as_bytes(), 32, 1)];
            let mut dst = [PlaneBufferMut::new(dst_store.as_bytes_mut(), 32)];
            filter.process(&mut [], &src, &mut dst, &mut [], i, 0, 4);
        }

        let out = PlaneBuffer::new(dst_store.as_bytes(), 32);
        for i in 0..8u32 {
            let row: &[f32] = out.row(i, 0, 4);
            assert_eq!(row[0], i as f32 * 10.0);
        }
    }
}
