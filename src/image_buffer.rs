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
use bytemuck::{AnyBitPattern, NoUninit};

/// Mask value selecting a fully allocated, non-circular buffer.
pub const BUFFER_MAX: u32 = u32::MAX;

/// Plane count of an image buffer: Y/U/V/A (or R/G/B/A, X/Y/Z/A).
pub const MAX_PLANES: usize = 4;

pub const PLANE_Y: usize = 0;
pub const PLANE_U: usize = 1;
pub const PLANE_V: usize = 2;
pub const PLANE_A: usize = 3;

/// Smallest mask `2^k - 1` such that `2^k >= count`, or [BUFFER_MAX] when
/// the next power of two would not fit in 32 bits.
pub fn select_buffer_mask(count: u32) -> u32 {
    if count != 0 && (count - 1) & (1u32 << 31) != 0 {
        return BUFFER_MAX;
    }

    for i in (1..32).rev() {
        if (count.wrapping_sub(1)) & (1u32 << (i - 1)) != 0 {
            return (1u32 << i) - 1;
        }
    }

    0
}

/// Byte storage with 8-byte base alignment, so rows laid out on 32-byte
/// stride boundaries can be reinterpreted as `u16`/`f32` samples.
#[derive(Debug, Clone, Default)]
pub struct AlignedBuffer {
    raw: Vec<u64>,
    len: usize,
}

impl AlignedBuffer {
    pub fn new(len_bytes: usize) -> Self {
        AlignedBuffer {
            raw: vec![0u64; len_bytes.div_ceil(8)],
            len: len_bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &bytemuck::cast_slice(&self.raw)[..self.len]
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut(&mut self.raw)[..self.len]
    }
}

#[inline(always)]
fn row_span(data_len: usize, base: usize, stride: isize, mask: u32, i: u32) -> (usize, usize) {
    let row_bytes = stride.unsigned_abs();
    let offset = base as isize + ((i & mask) as isize) * stride;
    debug_assert!(offset >= 0, "row offset out of bounds");
    let start = offset as usize;
    let end = (start + row_bytes).min(data_len);
    (start, end)
}

/// Read-only view of one image plane.
///
/// Row `i` lives at `base + (i & mask) * stride`; the mask is either
/// [BUFFER_MAX] for a whole image or `2^k - 1` selecting a circular window
/// of `2^k` rows.
#[derive(Debug, Clone, Copy)]
pub struct PlaneBuffer<'a> {
    data: &'a [u8],
    stride: isize,
    mask: u32,
    base: usize,
}

impl<'a> PlaneBuffer<'a> {
    pub fn new(data: &'a [u8], stride: isize) -> Self {
        Self::with_mask(data, stride, BUFFER_MAX)
    }

    pub fn with_mask(data: &'a [u8], stride: isize, mask: u32) -> Self {
        let base = if stride < 0 {
            data.len().saturating_sub(stride.unsigned_abs())
        } else {
            0
        };
        PlaneBuffer {
            data,
            stride,
            mask,
            base,
        }
    }

    /// Absent plane.
    pub fn empty() -> Self {
        PlaneBuffer {
            data: &[],
            stride: 0,
            mask: BUFFER_MAX,
            base: 0,
        }
    }

    pub fn is_null(&self) -> bool {
        self.data.is_empty()
    }

    pub fn stride(&self) -> isize {
        self.stride
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Largest power-of-two alignment of the backing storage address.
    pub(crate) fn data_align(&self) -> usize {
        let addr = self.data.as_ptr() as usize;
        addr & addr.wrapping_neg()
    }

    #[inline(always)]
    pub fn line(&self, i: u32) -> &'a [u8] {
        if self.data.is_empty() {
            return &[];
        }
        let (start, end) = row_span(self.data.len(), self.base, self.stride, self.mask, i);
        &self.data[start..end]
    }

    /// Samples `left..right` of row `i` reinterpreted as `T`.
    #[inline(always)]
    pub fn row<T: AnyBitPattern>(&self, i: u32, left: usize, right: usize) -> &'a [T] {
        let sz = core::mem::size_of::<T>();
        bytemuck::cast_slice(&self.line(i)[left * sz..right * sz])
    }
}

/// Writable view of one image plane. Addressing follows [PlaneBuffer].
#[derive(Debug)]
pub struct PlaneBufferMut<'a> {
    data: &'a mut [u8],
    stride: isize,
    mask: u32,
    base: usize,
}

impl<'a> PlaneBufferMut<'a> {
    pub fn new(data: &'a mut [u8], stride: isize) -> Self {
        Self::with_mask(data, stride, BUFFER_MAX)
    }

    pub fn with_mask(data: &'a mut [u8], stride: isize, mask: u32) -> Self {
        let base = if stride < 0 {
            data.len().saturating_sub(stride.unsigned_abs())
        } else {
            0
        };
        PlaneBufferMut {
            data,
            stride,
            mask,
            base,
        }
    }

    pub fn empty() -> Self {
        PlaneBufferMut {
            data: &mut [],
            stride: 0,
            mask: BUFFER_MAX,
            base: 0,
        }
    }

    pub fn is_null(&self) -> bool {
        self.data.is_empty()
    }

    pub fn stride(&self) -> isize {
        self.stride
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Shared view of the same plane.
    pub fn as_const(&self) -> PlaneBuffer<'_> {
        PlaneBuffer {
            data: self.data,
            stride: self.stride,
            mask: self.mask,
            base: self.base,
        }
    }

    /// Reborrowed writable view with a shorter lifetime.
    pub fn reborrow(&mut self) -> PlaneBufferMut<'_> {
        PlaneBufferMut {
            data: self.data,
            stride: self.stride,
            mask: self.mask,
            base: self.base,
        }
    }

    #[inline(always)]
    pub fn line_mut(&mut self, i: u32) -> &mut [u8] {
        if self.data.is_empty() {
            return &mut [];
        }
        let (start, end) = row_span(self.data.len(), self.base, self.stride, self.mask, i);
        &mut self.data[start..end]
    }

    #[inline(always)]
    pub fn row_mut<T: AnyBitPattern + NoUninit>(
        &mut self,
        i: u32,
        left: usize,
        right: usize,
    ) -> &mut [T] {
        let sz = core::mem::size_of::<T>();
        bytemuck::cast_slice_mut(&mut self.line_mut(i)[left * sz..right * sz])
    }
}

/// Read-only image: up to four planes, absent ones empty.
#[derive(Debug, Clone, Copy)]
pub struct ImageBufferRef<'a> {
    pub planes: [PlaneBuffer<'a>; MAX_PLANES],
}

impl<'a> ImageBufferRef<'a> {
    pub fn new(planes: [PlaneBuffer<'a>; MAX_PLANES]) -> Self {
        ImageBufferRef { planes }
    }
}

/// Writable image: up to four planes, absent ones empty.
#[derive(Debug)]
pub struct ImageBufferMut<'a> {
    pub planes: [PlaneBufferMut<'a>; MAX_PLANES],
}

impl<'a> ImageBufferMut<'a> {
    pub fn new(planes: [PlaneBufferMut<'a>; MAX_PLANES]) -> Self {
        ImageBufferMut { planes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_mask_selection() {
        assert_eq!(select_buffer_mask(0), 0);
        assert_eq!(select_buffer_mask(1), 0);
        assert_eq!(select_buffer_mask(2), 1);
        assert_eq!(select_buffer_mask(3), 3);
        assert_eq!(select_buffer_mask(4), 3);
        assert_eq!(select_buffer_mask(5), 7);
        assert_eq!(select_buffer_mask(17), 31);
        assert_eq!(select_buffer_mask(u32::MAX), BUFFER_MAX);
    }

    #[test]
    fn circular_addressing_wraps_into_window() {
        let mut storage = AlignedBuffer::new(4 * 32);
        for (i, b) in storage.as_bytes_mut().iter_mut().enumerate() {
            *b = (i / 32) as u8;
        }
        let plane = PlaneBuffer::with_mask(storage.as_bytes(), 32, 3);
        assert_eq!(plane.line(0)[0], 0);
        assert_eq!(plane.line(3)[0], 3);
        assert_eq!(plane.line(4)[0], 0);
        assert_eq!(plane.line(7)[0], 3);
        assert_eq!(plane.line(9)[0], 1);
    }

    #[test]
    fn degenerate_mask_holds_one_line() {
        let mut storage = AlignedBuffer::new(32);
        storage.as_bytes_mut()[0] = 42;
        let plane = PlaneBuffer::with_mask(storage.as_bytes(), 32, 0);
        for i in 0..16 {
            assert_eq!(plane.line(i)[0], 42);
        }
    }

    #[test]
    fn negative_stride_walks_backwards() {
        let mut storage = AlignedBuffer::new(3 * 32);
        for (i, b) in storage.as_bytes_mut().iter_mut().enumerate() {
            *b = (i / 32) as u8;
        }
        let plane = PlaneBuffer::new(storage.as_bytes(), -32);
        assert_eq!(plane.line(0)[0], 2);
        assert_eq!(plane.line(1)[0], 1);
        assert_eq!(plane.line(2)[0], 0);
    }

    #[test]
    fn typed_rows() {
        let mut storage = AlignedBuffer::new(64);
        {
            let mut plane = PlaneBufferMut::new(storage.as_bytes_mut(), 32);
            let row: &mut [u16] = plane.row_mut(0, 0, 16);
            for (j, px) in row.iter_mut().enumerate() {
                *px = j as u16 * 3;
            }
        }
        let plane = PlaneBuffer::new(storage.as_bytes(), 32);
        let row: &[u16] = plane.row(0, 4, 8);
        assert_eq!(row, &[12, 15, 18, 21]);
    }
}
