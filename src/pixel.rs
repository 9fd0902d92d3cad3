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
use crate::align::{floor_n, ALIGNMENT};

/// Storage type of a single plane sample.
///
/// `U8` and `U16` are unsigned integer containers, `F16` is IEEE 754
/// binary16 and `F32` is binary32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PixelType {
    U8,
    U16,
    F16,
    F32,
}

impl PixelType {
    /// Size of one sample in bytes.
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            PixelType::U8 => 1,
            PixelType::U16 | PixelType::F16 => 2,
            PixelType::F32 => 4,
        }
    }

    /// Maximum bit depth the container can hold.
    #[inline]
    pub const fn depth(self) -> u32 {
        match self {
            PixelType::U8 => 8,
            PixelType::U16 | PixelType::F16 => 16,
            PixelType::F32 => 32,
        }
    }

    /// Alignment of the type in units of samples per 32-byte vector.
    #[inline]
    pub const fn alignment(self) -> usize {
        ALIGNMENT / self.size()
    }

    #[inline]
    pub const fn is_integer(self) -> bool {
        matches!(self, PixelType::U8 | PixelType::U16)
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        !self.is_integer()
    }

    /// Widest image the type supports without overflowing 32-bit
    /// intermediate row products.
    #[inline]
    pub const fn max_width(self) -> u32 {
        floor_n((u32::MAX as usize) / self.size(), self.alignment()) as u32
    }
}

/// Set of parameters required to convert between sample encodings.
#[derive(Debug, Clone, Copy)]
pub struct PixelFormat {
    pub ty: PixelType,
    pub depth: u32,
    pub fullrange: bool,
    pub chroma: bool,
    pub ycgco: bool,
}

impl PixelFormat {
    /// Limited-range luma format with the maximum depth of the type.
    pub const fn new(ty: PixelType) -> Self {
        PixelFormat {
            ty,
            depth: ty.depth(),
            fullrange: false,
            chroma: false,
            ycgco: false,
        }
    }

    pub const fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub const fn with_chroma(mut self, chroma: bool) -> Self {
        self.chroma = chroma;
        self
    }

    pub const fn with_fullrange(mut self, fullrange: bool) -> Self {
        self.fullrange = fullrange;
        self
    }
}

/// Integer formats are equal when all fields match; floating-point formats
/// are defined only by their type and chroma flag.
impl PartialEq for PixelFormat {
    fn eq(&self, other: &Self) -> bool {
        if self.ty.is_float() {
            self.ty == other.ty && self.chroma == other.chroma
        } else {
            self.ty == other.ty
                && self.depth == other.depth
                && self.fullrange == other.fullrange
                && self.chroma == other.chroma
        }
    }
}

impl Eq for PixelFormat {}

/// Dimensions and storage type of one plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageAttributes {
    pub width: u32,
    pub height: u32,
    pub ty: PixelType,
}

impl ImageAttributes {
    pub const fn new(width: u32, height: u32, ty: PixelType) -> Self {
        ImageAttributes { width, height, ty }
    }

    #[inline]
    pub(crate) fn row_bytes(&self) -> usize {
        self.width as usize * self.ty.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_traits() {
        assert_eq!(PixelType::U8.size(), 1);
        assert_eq!(PixelType::F16.size(), 2);
        assert_eq!(PixelType::F32.size(), 4);
        assert_eq!(PixelType::U16.depth(), 16);
        assert!(PixelType::U16.is_integer());
        assert!(PixelType::F16.is_float());
        assert_eq!(PixelType::U8.alignment(), 32);
        assert_eq!(PixelType::F32.alignment(), 8);
    }

    #[test]
    fn integer_format_equality_uses_all_fields() {
        let a = PixelFormat::new(PixelType::U16).with_depth(10);
        let b = PixelFormat::new(PixelType::U16).with_depth(12);
        assert_ne!(a, b);
        let c = PixelFormat::new(PixelType::U16).with_depth(10).with_fullrange(true);
        assert_ne!(a, c);
    }

    #[test]
    fn float_format_equality_ignores_depth_and_range() {
        let a = PixelFormat::new(PixelType::F32).with_depth(32);
        let mut b = PixelFormat::new(PixelType::F32).with_depth(16);
        b.fullrange = true;
        assert_eq!(a, b);
        let c = PixelFormat::new(PixelType::F32).with_chroma(true);
        assert_ne!(a, c);
    }
}
