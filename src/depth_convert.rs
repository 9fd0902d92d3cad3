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
use crate::half::{float_to_half, half_to_float};
use crate::image_buffer::{PlaneBuffer, PlaneBufferMut};
use crate::pixel::{ImageAttributes, PixelFormat, PixelType};

pub(crate) fn numeric_max(bits: u32) -> i64 {
    (1i64 << bits) - 1
}

/// Black-level offset of an integer encoding, in code values.
pub(crate) fn integer_offset(format: &PixelFormat) -> f64 {
    if format.ty.is_float() {
        0.0
    } else if format.chroma {
        (1i64 << (format.depth - 1)) as f64
    } else if !format.fullrange {
        (16i64 << (format.depth - 8)) as f64
    } else {
        0.0
    }
}

/// Nominal peak-to-peak range of an encoding, in code values. YCgCo chroma
/// shares the luma range.
pub(crate) fn integer_range(format: &PixelFormat) -> f64 {
    if format.ty.is_float() {
        1.0
    } else if format.fullrange {
        numeric_max(format.depth) as f64
    } else if format.chroma && !format.ycgco {
        (224i64 << (format.depth - 8)) as f64
    } else {
        (219i64 << (format.depth - 8)) as f64
    }
}

/// Scale and offset mapping samples of `pixel_in` onto `pixel_out`.
pub(crate) fn get_scale_offset(pixel_in: &PixelFormat, pixel_out: &PixelFormat) -> (f32, f32) {
    let range_in = integer_range(pixel_in);
    let offset_in = integer_offset(pixel_in);
    let range_out = integer_range(pixel_out);
    let offset_out = integer_offset(pixel_out);

    let scale = range_out / range_in;
    let offset = -offset_in * range_out / range_in + offset_out;

    (scale as f32, offset as f32)
}

/// Integer widening by `dst_depth - src_depth` bit positions.
pub struct IntegerLeftShift {
    attr: ImageAttributes,
    ty_in: PixelType,
    shift: u32,
}

impl IntegerLeftShift {
    pub fn new(
        width: u32,
        height: u32,
        pixel_in: &PixelFormat,
        pixel_out: &PixelFormat,
    ) -> Result<Self, PipelineError> {
        if !pixel_in.ty.is_integer() || !pixel_out.ty.is_integer() {
            return Err(PipelineError::Logic("cannot left shift floating point types"));
        }
        if pixel_in.fullrange || pixel_out.fullrange {
            return Err(PipelineError::Logic("cannot left shift full-range format"));
        }
        if pixel_in.chroma != pixel_out.chroma {
            return Err(PipelineError::Logic("cannot convert between luma and chroma"));
        }
        if pixel_in.depth > pixel_out.depth {
            return Err(PipelineError::Logic("cannot reduce depth by left shifting"));
        }
        if pixel_out.depth > pixel_out.ty.depth() {
            return Err(PipelineError::BitDepthOverflow);
        }

        Ok(IntegerLeftShift {
            attr: ImageAttributes::new(width, height, pixel_out.ty),
            ty_in: pixel_in.ty,
            shift: pixel_out.depth - pixel_in.depth,
        })
    }
}

impl ImageFilter for IntegerLeftShift {
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
        let (left, right) = (left as usize, right as usize);
        let shift = self.shift;

        match (self.ty_in, self.attr.ty) {
            (PixelType::U8, PixelType::U8) => {
                let s: &[u8] = src[0].row(i, left, right);
                let d: &mut [u8] = dst[0].row_mut(i, left, right);
                for (d, &x) in d.iter_mut().zip(s) {
                    *d = x << shift;
                }
            }
            (PixelType::U8, PixelType::U16) => {
                let s: &[u8] = src[0].row(i, left, right);
                let d: &mut [u16] = dst[0].row_mut(i, left, right);
                for (d, &x) in d.iter_mut().zip(s) {
                    *d = u16::from(x) << shift;
                }
            }
            (PixelType::U16, PixelType::U16) => {
                let s: &[u16] = src[0].row(i, left, right);
                let d: &mut [u16] = dst[0].row_mut(i, left, right);
                for (d, &x) in d.iter_mut().zip(s) {
                    *d = x << shift;
                }
            }
            _ => unreachable!("no conversion between pixel types"),
        }
    }
}

/// Conversion of integer or half samples to `f32` working precision with
/// the scale and offset derived from the encodings.
pub struct ConvertToFloat {
    attr: ImageAttributes,
    ty_in: PixelType,
    scale: f32,
    offset: f32,
}

impl ConvertToFloat {
    pub fn new(
        width: u32,
        height: u32,
        pixel_in: &PixelFormat,
        pixel_out: &PixelFormat,
    ) -> Result<Self, PipelineError> {
        if !pixel_out.ty.is_float() {
            return Err(PipelineError::Logic("conversion target must be floating point"));
        }

        let (scale, offset) = get_scale_offset(pixel_in, pixel_out);
        Ok(ConvertToFloat {
            attr: ImageAttributes::new(width, height, PixelType::F32),
            ty_in: pixel_in.ty,
            scale,
            offset,
        })
    }
}

impl ImageFilter for ConvertToFloat {
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
        let (left, right) = (left as usize, right as usize);
        let (scale, offset) = (self.scale, self.offset);
        let d: &mut [f32] = dst[0].row_mut(i, left, right);

        match self.ty_in {
            PixelType::U8 => {
                let s: &[u8] = src[0].row(i, left, right);
                for (d, &x) in d.iter_mut().zip(s) {
                    *d = f32::from(x) * scale + offset;
                }
            }
            PixelType::U16 => {
                let s: &[u16] = src[0].row(i, left, right);
                for (d, &x) in d.iter_mut().zip(s) {
                    *d = f32::from(x) * scale + offset;
                }
            }
            PixelType::F16 => {
                let s: &[u16] = src[0].row(i, left, right);
                for (d, &x) in d.iter_mut().zip(s) {
                    *d = half_to_float(x);
                }
            }
            PixelType::F32 => unreachable!("no conversion between pixel types"),
        }
    }
}

/// `f32` to IEEE binary16 narrowing stage.
pub struct ConvertToHalf {
    attr: ImageAttributes,
}

impl ConvertToHalf {
    pub fn new(width: u32, height: u32) -> Self {
        ConvertToHalf {
            attr: ImageAttributes::new(width, height, PixelType::F16),
        }
    }
}

impl ImageFilter for ConvertToHalf {
    fn flags(&self) -> FilterFlags {
        FilterFlags::SAME_ROW
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
        let (left, right) = (left as usize, right as usize);
        let s: &[f32] = src[0].row(i, left, right);
        let d: &mut [u16] = dst[0].row_mut(i, left, right);
        for (d, &x) in d.iter_mut().zip(s) {
            *d = float_to_half(x);
        }
    }
}
