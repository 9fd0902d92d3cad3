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

/// Pass-through stage. Materializes a dedicated output buffer when the
/// terminal node would otherwise alias the caller's source.
pub struct CopyFilter {
    attr: ImageAttributes,
}

impl CopyFilter {
    pub fn new(width: u32, height: u32, ty: PixelType) -> Self {
        CopyFilter {
            attr: ImageAttributes::new(width, height, ty),
        }
    }
}

impl ImageFilter for CopyFilter {
    fn flags(&self) -> FilterFlags {
        FilterFlags::SAME_ROW | FilterFlags::IN_PLACE
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
        let sz = self.attr.ty.size();
        let span = left as usize * sz..right as usize * sz;
        dst[0].line_mut(i)[span.clone()].copy_from_slice(&src[0].line(i)[span]);
    }
}

/// Wraps a single-plane filter and applies it to each plane of a color
/// image. The inner filter gets a private context per plane.
pub struct MuxFilter {
    inner: Box<dyn ImageFilter>,
}

impl MuxFilter {
    pub fn new(inner: Box<dyn ImageFilter>) -> Self {
        debug_assert!(!inner.flags().contains(FilterFlags::COLOR));
        MuxFilter { inner }
    }
}

impl ImageFilter for MuxFilter {
    fn flags(&self) -> FilterFlags {
        self.inner.flags() | FilterFlags::COLOR
    }

    fn image_attributes(&self) -> ImageAttributes {
        self.inner.image_attributes()
    }

    fn simultaneous_lines(&self) -> u32 {
        self.inner.simultaneous_lines()
    }

    fn required_row_range(&self, i: u32) -> std::ops::Range<u32> {
        self.inner.required_row_range(i)
    }

    fn required_col_range(&self, left: u32, right: u32) -> std::ops::Range<u32> {
        self.inner.required_col_range(left, right)
    }

    fn context_size(&self) -> usize {
        self.inner.context_size() * 3
    }

    fn tmp_size(&self, left: u32, right: u32) -> usize {
        self.inner.tmp_size(left, right)
    }

    fn init_context(&self, ctx: &mut [u8]) {
        let n = self.inner.context_size();
        for chunk in ctx.chunks_mut(n.max(1)) {
            self.inner.init_context(chunk);
        }
    }

    fn process(
        &self,
        ctx: &mut [u8],
        src: &[PlaneBuffer<'_>],
        dst: &mut [PlaneBufferMut<'_>],
        tmp: &mut [u8],
        i: u32,
        left: u32,
        right: u32,
    ) {
        let n = self.inner.context_size();
        for (p, plane) in dst.iter_mut().enumerate() {
            let ctx_p = if n > 0 { &mut ctx[p * n..(p + 1) * n] } else { &mut ctx[0..0] };
            self.inner.process(
                ctx_p,
                &src[p..p + 1],
                std::slice::from_mut(plane),
                tmp,
                i,
                left,
                right,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_buffer::AlignedBuffer;

    #[test]
    fn copy_moves_only_requested_columns() {
        let mut src_store = AlignedBuffer::new(64);
        src_store.as_bytes_mut()[..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let mut dst_store = AlignedBuffer::new(64);

        let filter = CopyFilter::new(8, 1, PixelType::U8);
        let src = [PlaneBuffer::new(src_store.as_bytes(), 32)];
        let mut dst = [PlaneBufferMut::new(dst_store.as_bytes_mut(), 32)];
        filter.process(&mut [], &src, &mut dst, &mut [], 0, 2, 6);

        assert_eq!(&dst_store.as_bytes()[..8], &[0, 0, 3, 4, 5, 6, 0, 0]);
    }

    #[test]
    fn mux_applies_inner_per_plane() {
        let filter = MuxFilter::new(Box::new(CopyFilter::new(4, 1, PixelType::U8)));
        assert!(filter.flags().contains(FilterFlags::COLOR));

        let mut stores: Vec<AlignedBuffer> = (0..3)
            .map(|p| {
                let mut s = AlignedBuffer::new(32);
                s.as_bytes_mut()[..4].copy_from_slice(&[p as u8 + 1; 4]);
                s
            })
            .collect();
        let mut outs: Vec<AlignedBuffer> = (0..3).map(|_| AlignedBuffer::new(32)).collect();

        let src: Vec<PlaneBuffer> = stores.iter_mut().map(|s| PlaneBuffer::new(s.as_bytes(), 32)).collect();
        let mut dst: Vec<PlaneBufferMut> = outs
            .iter_mut()
            .map(|s| PlaneBufferMut::new(s.as_bytes_mut(), 32))
            .collect();

        filter.process(&mut [], &src, &mut dst, &mut [], 0, 0, 4);
        drop(dst);
        for (p, out) in outs.iter().enumerate() {
            assert_eq!(&out.as_bytes()[..4], &[p as u8 + 1; 4]);
        }
    }
}
