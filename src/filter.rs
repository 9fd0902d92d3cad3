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
use crate::image_buffer::{PlaneBuffer, PlaneBufferMut};
use crate::pixel::ImageAttributes;
use std::ops::Range;

bitflags::bitflags! {
    /// Capabilities a line filter advertises to the scheduler.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FilterFlags: u32 {
        /// Output row `i` depends only on input row `i`.
        const SAME_ROW = 1 << 0;
        /// Output may alias input when the pixel sizes match.
        const IN_PLACE = 1 << 1;
        /// Processes all three color planes as a unit.
        const COLOR = 1 << 2;
        /// Output row depends on the entire input row.
        const ENTIRE_ROW = 1 << 3;
        /// Output depends on prior rows having been materialized.
        const STATEFUL = 1 << 4;
    }
}

/// One stage of the pipeline, producing output lines from parent lines.
///
/// Filters are immutable after construction; per-execution state lives in
/// the byte context the scheduler hands to [ImageFilter::process], so a
/// built graph can be shared across threads.
pub trait ImageFilter: Send + Sync {
    fn flags(&self) -> FilterFlags;

    /// Output plane dimensions and storage type.
    fn image_attributes(&self) -> ImageAttributes;

    /// Rows produced per `process` invocation.
    fn simultaneous_lines(&self) -> u32 {
        1
    }

    /// Input rows needed to produce the group starting at output row `i`.
    fn required_row_range(&self, i: u32) -> Range<u32> {
        let attr = self.image_attributes();
        i..(i + self.simultaneous_lines()).min(attr.height)
    }

    /// Input columns needed for an output column range.
    fn required_col_range(&self, left: u32, right: u32) -> Range<u32> {
        left..right
    }

    /// Per-instance mutable state in bytes.
    fn context_size(&self) -> usize {
        0
    }

    /// Per-call scratch bytes for the given column range.
    fn tmp_size(&self, _left: u32, _right: u32) -> usize {
        0
    }

    /// Reset the per-execution context before a strip is run.
    fn init_context(&self, ctx: &mut [u8]) {
        ctx.fill(0);
    }

    /// Produce output rows `i..i + simultaneous_lines()` over columns
    /// `[left, right)`. `src` and `dst` carry one plane, or three for
    /// COLOR filters.
    #[allow(clippy::too_many_arguments)]
    fn process(
        &self,
        ctx: &mut [u8],
        src: &[PlaneBuffer<'_>],
        dst: &mut [PlaneBufferMut<'_>],
        tmp: &mut [u8],
        i: u32,
        left: u32,
        right: u32,
    );
}
