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

#![forbid(unsafe_code)]
#![allow(clippy::manual_clamp)]

mod align;
mod builder;
mod colorspace;
mod colorspace_filter;
mod colorspace_graph;
mod colorspace_param;
mod copy_filter;
mod depth_convert;
mod dither;
mod error_diffusion;
mod errors;
mod filter;
mod gamma;
mod graph;
mod half;
mod image_buffer;
mod matrix3;
mod operation;
mod params;
mod pixel;
mod resize_h;
mod resize_table;
mod resize_v;
mod sampler;

pub use align::ALIGNMENT;
pub use builder::GraphBuilder;
pub use colorspace::{
    ColorPrimaries, Colorspace, MatrixCoefficients, TransferCharacteristics,
};
pub use colorspace_filter::ColorspaceConversion;
pub use colorspace_graph::{ColorspaceGraph, ConversionStep};
pub use copy_filter::{CopyFilter, MuxFilter};
pub use depth_convert::{ConvertToFloat, ConvertToHalf, IntegerLeftShift};
pub use dither::{DitherType, OrderedDither};
pub use error_diffusion::ErrorDiffusion;
pub use errors::PipelineError;
pub use filter::{FilterFlags, ImageFilter};
pub use gamma::*;
pub use graph::{Callback, ExecutionState, FilterGraph, HORIZONTAL_STEP, TILE_MIN};
pub use half::{float_to_half, half_to_float};
pub use image_buffer::{
    select_buffer_mask, AlignedBuffer, ImageBufferMut, ImageBufferRef, PlaneBuffer,
    PlaneBufferMut, BUFFER_MAX, MAX_PLANES, PLANE_A, PLANE_U, PLANE_V, PLANE_Y,
};
pub use operation::{Operation, OperationParams};
pub use params::{
    make_api_version, matrix_from_itu, primaries_from_itu, transfer_from_itu, ActiveRegion,
    AlphaMode, BuilderParams, ChromaLocation, ColorFamily, CpuClass, FieldParity, ImageFormat,
    PixelRange, API_VERSION,
};
pub use pixel::{ImageAttributes, PixelFormat, PixelType};
pub use resize_h::ResizeHorizontal;
pub use resize_table::FilterTable;
pub use resize_v::ResizeVertical;
pub use sampler::ResampleFilter;
