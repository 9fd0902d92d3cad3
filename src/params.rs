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
use crate::colorspace::{
    ColorPrimaries, Colorspace, MatrixCoefficients, TransferCharacteristics,
};
use crate::dither::DitherType;
use crate::errors::PipelineError;
use crate::pixel::PixelType;
use crate::sampler::ResampleFilter;

/// `(major << 8) | minor` API version tags carried by parameter blocks.
pub const fn make_api_version(major: u32, minor: u32) -> u32 {
    (major << 8) | minor
}

pub const API_VERSION_2_0: u32 = make_api_version(2, 0);
pub const API_VERSION_2_1: u32 = make_api_version(2, 1);
pub const API_VERSION_2_2: u32 = make_api_version(2, 2);
pub const API_VERSION_2_4: u32 = make_api_version(2, 4);

/// Current parameter block version.
pub const API_VERSION: u32 = API_VERSION_2_4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorFamily {
    #[default]
    Grey,
    Rgb,
    Yuv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelRange {
    #[default]
    Limited,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldParity {
    #[default]
    Progressive,
    Top,
    Bottom,
}

/// Sub-pixel siting of chroma samples on the 4:4:4 grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChromaLocation {
    #[default]
    Left,
    Center,
    TopLeft,
    Top,
    BottomLeft,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum ChromaLocationW {
    #[default]
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum ChromaLocationH {
    Top,
    #[default]
    Center,
    Bottom,
}

impl ChromaLocation {
    pub(crate) fn split(self) -> (ChromaLocationW, ChromaLocationH) {
        match self {
            ChromaLocation::Left => (ChromaLocationW::Left, ChromaLocationH::Center),
            ChromaLocation::Center => (ChromaLocationW::Center, ChromaLocationH::Center),
            ChromaLocation::TopLeft => (ChromaLocationW::Left, ChromaLocationH::Top),
            ChromaLocation::Top => (ChromaLocationW::Center, ChromaLocationH::Top),
            ChromaLocation::BottomLeft => (ChromaLocationW::Left, ChromaLocationH::Bottom),
            ChromaLocation::Bottom => (ChromaLocationW::Center, ChromaLocationH::Bottom),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaMode {
    #[default]
    None,
    Straight,
    Premultiplied,
}

/// Capability ceiling for kernel selection. The scalar kernels satisfy
/// every level, so this is validated and recorded only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CpuClass {
    None,
    #[default]
    Auto,
}

/// Active subwindow of the source image in subpixel coordinates. NaN
/// fields default to the full plane.
#[derive(Debug, Clone, Copy)]
pub struct ActiveRegion {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for ActiveRegion {
    fn default() -> Self {
        ActiveRegion {
            left: f64::NAN,
            top: f64::NAN,
            width: f64::NAN,
            height: f64::NAN,
        }
    }
}

/// Versioned image format block. Fields past a block's version read as
/// their defaults: `active_region` since 2.1, `alpha` since 2.4.
#[derive(Debug, Clone, Copy)]
pub struct ImageFormat {
    pub version: u32,
    pub width: u32,
    pub height: u32,
    pub pixel_type: PixelType,
    pub subsample_w: u32,
    pub subsample_h: u32,
    pub color_family: ColorFamily,
    pub matrix: MatrixCoefficients,
    pub transfer: TransferCharacteristics,
    pub primaries: ColorPrimaries,
    /// Bits per sample; 0 selects the container depth.
    pub depth: u32,
    pub pixel_range: PixelRange,
    pub field_parity: FieldParity,
    pub chroma_location: ChromaLocation,
    pub active_region: ActiveRegion,
    pub alpha: AlphaMode,
}

impl ImageFormat {
    pub fn new(width: u32, height: u32, pixel_type: PixelType) -> Self {
        ImageFormat {
            version: API_VERSION,
            width,
            height,
            pixel_type,
            subsample_w: 0,
            subsample_h: 0,
            color_family: ColorFamily::default(),
            matrix: MatrixCoefficients::default(),
            transfer: TransferCharacteristics::default(),
            primaries: ColorPrimaries::default(),
            depth: 0,
            pixel_range: PixelRange::default(),
            field_parity: FieldParity::default(),
            chroma_location: ChromaLocation::default(),
            active_region: ActiveRegion::default(),
            alpha: AlphaMode::default(),
        }
    }
}

/// Versioned graph builder parameter block.
/// `nominal_peak_luminance` is honored since 2.2.
#[derive(Debug, Clone, Copy)]
pub struct BuilderParams {
    pub version: u32,
    pub resample_filter: ResampleFilter,
    pub filter_param_a: f64,
    pub filter_param_b: f64,
    pub resample_filter_uv: ResampleFilter,
    pub filter_param_a_uv: f64,
    pub filter_param_b_uv: f64,
    pub dither_type: DitherType,
    pub cpu_type: CpuClass,
    /// cd/m² of the HDR signal peak.
    pub nominal_peak_luminance: f64,
    pub allow_approximate_gamma: bool,
}

impl Default for BuilderParams {
    fn default() -> Self {
        BuilderParams {
            version: API_VERSION,
            resample_filter: ResampleFilter::Bicubic,
            filter_param_a: f64::NAN,
            filter_param_b: f64::NAN,
            resample_filter_uv: ResampleFilter::Bilinear,
            filter_param_a_uv: f64::NAN,
            filter_param_b_uv: f64::NAN,
            dither_type: DitherType::None,
            cpu_type: CpuClass::default(),
            nominal_peak_luminance: 100.0,
            allow_approximate_gamma: false,
        }
    }
}

/// Translate an ITU-T H.273 matrix coefficients code. Recognized aliases
/// collapse onto the internal constants; syntactically valid but
/// unsupported codes report no available conversion.
pub fn matrix_from_itu(code: u32) -> Result<MatrixCoefficients, PipelineError> {
    if code > 255 {
        return Err(PipelineError::EnumOutOfRange(
            "unrecognized matrix coefficients",
        ));
    }
    match code {
        0 => Ok(MatrixCoefficients::Rgb),
        1 => Ok(MatrixCoefficients::Rec709),
        2 => Ok(MatrixCoefficients::Unspecified),
        5 | 6 => Ok(MatrixCoefficients::Rec601),
        8 => Ok(MatrixCoefficients::Ycgco),
        9 => Ok(MatrixCoefficients::Rec2020Ncl),
        10 => Ok(MatrixCoefficients::Rec2020Cl),
        _ => Err(PipelineError::NoColorspaceConversion),
    }
}

/// Translate an ITU-T H.273 transfer characteristics code.
pub fn transfer_from_itu(code: u32) -> Result<TransferCharacteristics, PipelineError> {
    if code > 255 {
        return Err(PipelineError::EnumOutOfRange(
            "unrecognized transfer characteristics",
        ));
    }
    match code {
        1 | 6 | 14 | 15 => Ok(TransferCharacteristics::Rec709),
        2 => Ok(TransferCharacteristics::Unspecified),
        8 => Ok(TransferCharacteristics::Linear),
        13 => Ok(TransferCharacteristics::Srgb),
        16 => Ok(TransferCharacteristics::St2084),
        18 => Ok(TransferCharacteristics::AribB67),
        _ => Err(PipelineError::NoColorspaceConversion),
    }
}

/// Translate an ITU-T H.273 colour primaries code.
pub fn primaries_from_itu(code: u32) -> Result<ColorPrimaries, PipelineError> {
    if code > 255 {
        return Err(PipelineError::EnumOutOfRange("unrecognized color primaries"));
    }
    match code {
        1 => Ok(ColorPrimaries::Rec709),
        2 => Ok(ColorPrimaries::Unspecified),
        6 | 7 => Ok(ColorPrimaries::SmpteC),
        9 => Ok(ColorPrimaries::Rec2020),
        12 => Ok(ColorPrimaries::DciP3D65),
        _ => Err(PipelineError::NoColorspaceConversion),
    }
}

/// Internal builder state distilled from one [ImageFormat].
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GraphState {
    pub width: u32,
    pub height: u32,
    pub ty: PixelType,
    pub subsample_w: u32,
    pub subsample_h: u32,
    pub color: ColorFamily,
    pub colorspace: Colorspace,
    pub depth: u32,
    pub fullrange: bool,
    pub parity: FieldParity,
    pub chroma_location_w: ChromaLocationW,
    pub chroma_location_h: ChromaLocationH,
    pub active_left: f64,
    pub active_top: f64,
    pub active_width: f64,
    pub active_height: f64,
    pub alpha: AlphaMode,
}

fn import_state_common(format: &ImageFormat) -> Result<GraphState, PipelineError> {
    if format.version < API_VERSION_2_0 || (format.version >> 8) != 2 {
        return Err(PipelineError::IllegalArgument("unsupported API version"));
    }

    let depth = if format.depth != 0 {
        format.depth
    } else {
        format.pixel_type.depth()
    };
    if depth > format.pixel_type.depth() || depth == 0 {
        return Err(PipelineError::BitDepthOverflow);
    }
    if format.pixel_type.is_float() && depth != format.pixel_type.depth() {
        return Err(PipelineError::BitDepthOverflow);
    }

    let (chroma_location_w, chroma_location_h) = format.chroma_location.split();

    let region = if format.version >= API_VERSION_2_1 {
        format.active_region
    } else {
        ActiveRegion::default()
    };
    let active_left = if region.left.is_nan() { 0.0 } else { region.left };
    let active_top = if region.top.is_nan() { 0.0 } else { region.top };
    let active_width = if region.width.is_nan() {
        f64::from(format.width)
    } else {
        region.width
    };
    let active_height = if region.height.is_nan() {
        f64::from(format.height)
    } else {
        region.height
    };

    if active_width <= 0.0 || active_height <= 0.0 || !active_left.is_finite() || !active_top.is_finite() {
        return Err(PipelineError::IllegalArgument("invalid active region"));
    }

    let alpha = if format.version >= API_VERSION_2_4 {
        format.alpha
    } else {
        AlphaMode::None
    };

    Ok(GraphState {
        width: format.width,
        height: format.height,
        ty: format.pixel_type,
        subsample_w: format.subsample_w,
        subsample_h: format.subsample_h,
        color: format.color_family,
        colorspace: Colorspace::new(format.matrix, format.transfer, format.primaries),
        depth,
        fullrange: format.pixel_range == PixelRange::Full,
        parity: format.field_parity,
        chroma_location_w,
        chroma_location_h,
        active_left,
        active_top,
        active_width,
        active_height,
        alpha,
    })
}

/// Translate a pair of format blocks into builder states. Endpoints
/// carrying an identical (even unenumerated) colorspace degrade to
/// `UNSPECIFIED` so the basic no-op case is always accepted.
pub(crate) fn import_graph_state(
    src: &ImageFormat,
    dst: &ImageFormat,
) -> Result<(GraphState, GraphState), PipelineError> {
    let mut src_state = import_state_common(src)?;
    let mut dst_state = import_state_common(dst)?;

    if src.color_family == dst.color_family
        && src.matrix == dst.matrix
        && src.transfer == dst.transfer
        && src.primaries == dst.primaries
    {
        src_state.colorspace = Colorspace::default();
        dst_state.colorspace = Colorspace::default();
    } else if !src_state.colorspace.is_valid() || !dst_state.colorspace.is_valid() {
        return Err(PipelineError::NoColorspaceConversion);
    }

    Ok((src_state, dst_state))
}
