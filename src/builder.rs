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
use crate::colorspace_filter::ColorspaceConversion;
use crate::colorspace_graph::ColorspaceGraph;
use crate::depth_convert::{ConvertToFloat, ConvertToHalf, IntegerLeftShift};
use crate::dither::{DitherType, OrderedDither};
use crate::error_diffusion::ErrorDiffusion;
use crate::errors::PipelineError;
use crate::filter::ImageFilter;
use crate::graph::FilterGraph;
use crate::operation::OperationParams;
use crate::params::{
    import_graph_state, AlphaMode, BuilderParams, ChromaLocationH, ChromaLocationW, ColorFamily,
    GraphState, ImageFormat, API_VERSION_2_2,
};
use crate::pixel::{PixelFormat, PixelType};
use crate::resize_h::ResizeHorizontal;
use crate::resize_table::{compute_filter, FilterTable};
use crate::resize_v::ResizeVertical;
use crate::sampler::Kernel;
use log::debug;

fn luma_format(state: &GraphState) -> PixelFormat {
    PixelFormat {
        ty: state.ty,
        depth: state.depth,
        fullrange: state.fullrange,
        chroma: false,
        ycgco: false,
    }
}

fn chroma_format(state: &GraphState) -> PixelFormat {
    let chroma = state.color == ColorFamily::Yuv;
    PixelFormat {
        ty: state.ty,
        depth: state.depth,
        fullrange: state.fullrange,
        chroma,
        ycgco: chroma
            && state.colorspace.matrix == crate::colorspace::MatrixCoefficients::Ycgco,
    }
}

fn alpha_format(state: &GraphState) -> PixelFormat {
    luma_format(state)
}

/// Sub-pixel offset of the chroma grid origin, in chroma samples.
fn chroma_offset_w(loc: ChromaLocationW, subsample: u32) -> f64 {
    match loc {
        ChromaLocationW::Left => -0.5 * (1.0 - 1.0 / f64::from(1u32 << subsample)),
        ChromaLocationW::Center => 0.0,
    }
}

fn chroma_offset_h(loc: ChromaLocationH, subsample: u32) -> f64 {
    match loc {
        ChromaLocationH::Top => -0.5 * (1.0 - 1.0 / f64::from(1u32 << subsample)),
        ChromaLocationH::Center => 0.0,
        ChromaLocationH::Bottom => 0.5 * (1.0 - 1.0 / f64::from(1u32 << subsample)),
    }
}

/// Shift and subwindow of a chroma resample that follows the luma mapping
/// `x_src = x_dst / (dst_dim / subdim) + shift` between differently sited
/// chroma grids.
fn chroma_resize_params(
    offset_in: f64,
    offset_out: f64,
    subsample_in: u32,
    subsample_out: u32,
    luma_shift: f64,
    luma_subdim: f64,
    luma_dst_dim: u32,
) -> (f64, f64) {
    let k = f64::from(1u32 << subsample_out) * luma_subdim
        / (f64::from(1u32 << subsample_in) * f64::from(luma_dst_dim));
    let shift = luma_shift / f64::from(1u32 << subsample_in) - offset_in + offset_out * k;
    let subdim = luma_subdim / f64::from(1u32 << subsample_in);
    (shift, subdim)
}

fn working_depth(ty: PixelType) -> u32 {
    match ty {
        PixelType::U16 => 16,
        _ => 32,
    }
}

fn resize_h_filter(
    kernel: &Kernel,
    src_dim: u32,
    dst_dim: u32,
    shift: f64,
    width: f64,
    height: u32,
    ty: PixelType,
) -> Result<(FilterTable, Box<dyn ImageFilter>), PipelineError> {
    let table = compute_filter(kernel, src_dim, dst_dim, shift, width)?;
    let filter = ResizeHorizontal::new(table.clone(), height, ty, working_depth(ty));
    Ok((table, Box::new(filter)))
}

fn resize_v_filter(
    kernel: &Kernel,
    src_dim: u32,
    dst_dim: u32,
    shift: f64,
    height: f64,
    width: u32,
    ty: PixelType,
) -> Result<(FilterTable, Box<dyn ImageFilter>), PipelineError> {
    let table = compute_filter(kernel, src_dim, dst_dim, shift, height)?;
    let filter = ResizeVertical::new(table.clone(), width, ty, working_depth(ty));
    Ok((table, Box::new(filter)))
}

/// Translates a pair of image formats into an executable [FilterGraph],
/// inserting depth, chroma-grid, colorspace, resize and dither stages as
/// required.
pub struct GraphBuilder<'a> {
    src: ImageFormat,
    dst: ImageFormat,
    params: BuilderParams,
    csp_graph: Option<&'a ColorspaceGraph>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(src: ImageFormat, dst: ImageFormat) -> Self {
        GraphBuilder {
            src,
            dst,
            params: BuilderParams::default(),
            csp_graph: None,
        }
    }

    pub fn with_params(mut self, params: BuilderParams) -> Self {
        self.params = params;
        self
    }

    /// Inject a prebuilt colorspace registry; otherwise a private one is
    /// constructed for this build.
    pub fn with_colorspace_graph(mut self, graph: &'a ColorspaceGraph) -> Self {
        self.csp_graph = Some(graph);
        self
    }

    fn validate_pair(src: &GraphState, dst: &GraphState) -> Result<(), PipelineError> {
        if src.parity != dst.parity {
            return Err(PipelineError::NoFieldParityConversion);
        }

        for state in [src, dst] {
            match state.color {
                ColorFamily::Grey => {
                    if state.subsample_w != 0 || state.subsample_h != 0 {
                        return Err(PipelineError::GreyscaleSubsampling);
                    }
                }
                ColorFamily::Rgb => {
                    if state.subsample_w != 0 || state.subsample_h != 0 {
                        return Err(PipelineError::UnsupportedSubsampling);
                    }
                    if !matches!(
                        state.colorspace.matrix,
                        crate::colorspace::MatrixCoefficients::Rgb
                            | crate::colorspace::MatrixCoefficients::Unspecified
                    ) {
                        return Err(PipelineError::ColorFamilyMismatch(
                            "RGB family requires an RGB matrix",
                        ));
                    }
                }
                ColorFamily::Yuv => {
                    if state.colorspace.matrix == crate::colorspace::MatrixCoefficients::Rgb {
                        return Err(PipelineError::ColorFamilyMismatch(
                            "YUV family can not carry an RGB matrix",
                        ));
                    }
                }
            }
        }

        let src_grey = src.color == ColorFamily::Grey;
        let dst_grey = dst.color == ColorFamily::Grey;
        if src_grey != dst_grey {
            return Err(PipelineError::ColorFamilyMismatch(
                "cannot convert between greyscale and color",
            ));
        }
        if src_grey && src.colorspace != dst.colorspace {
            return Err(PipelineError::NoColorspaceConversion);
        }

        if src.alpha != dst.alpha {
            return Err(PipelineError::UnsupportedOperation(
                "alpha plane conversion not implemented",
            ));
        }

        if dst.active_left != 0.0
            || dst.active_top != 0.0
            || dst.active_width != f64::from(dst.width)
            || dst.active_height != f64::from(dst.height)
        {
            return Err(PipelineError::IllegalArgument(
                "active region applies to the source image only",
            ));
        }

        Ok(())
    }

    fn convert_to_float_stages(
        graph: &mut FilterGraph,
        state: &mut GraphState,
    ) -> Result<(), PipelineError> {
        if state.ty == PixelType::F32 {
            return Ok(());
        }

        debug!("convert {:?} to working f32", state.ty);

        let out_luma = PixelFormat::new(PixelType::F32);
        graph.attach_filter(Box::new(ConvertToFloat::new(
            state.width,
            state.height,
            &luma_format(state),
            &out_luma,
        )?))?;

        if state.color != ColorFamily::Grey {
            let out_chroma =
                PixelFormat::new(PixelType::F32).with_chroma(state.color == ColorFamily::Yuv);
            graph.attach_filter_uv(Box::new(ConvertToFloat::new(
                state.width >> state.subsample_w,
                state.height >> state.subsample_h,
                &chroma_format(state),
                &out_chroma,
            )?))?;
        }
        if state.alpha != AlphaMode::None {
            graph.attach_filter_alpha(Box::new(ConvertToFloat::new(
                state.width,
                state.height,
                &alpha_format(state),
                &out_luma,
            )?))?;
        }

        state.ty = PixelType::F32;
        state.depth = 32;
        state.fullrange = false;
        Ok(())
    }

    fn left_shift_stages(
        graph: &mut FilterGraph,
        state: &mut GraphState,
    ) -> Result<(), PipelineError> {
        if state.ty == PixelType::U16 && state.depth == 16 {
            return Ok(());
        }

        debug!("widen {:?}/{} to working u16", state.ty, state.depth);

        let out_luma = PixelFormat::new(PixelType::U16);
        graph.attach_filter(Box::new(IntegerLeftShift::new(
            state.width,
            state.height,
            &luma_format(state),
            &out_luma,
        )?))?;

        if state.color != ColorFamily::Grey {
            let out_chroma =
                PixelFormat::new(PixelType::U16).with_chroma(state.color == ColorFamily::Yuv);
            graph.attach_filter_uv(Box::new(IntegerLeftShift::new(
                state.width >> state.subsample_w,
                state.height >> state.subsample_h,
                &chroma_format(state),
                &out_chroma,
            )?))?;
        }
        if state.alpha != AlphaMode::None {
            graph.attach_filter_alpha(Box::new(IntegerLeftShift::new(
                state.width,
                state.height,
                &alpha_format(state),
                &out_luma,
            )?))?;
        }

        state.ty = PixelType::U16;
        state.depth = 16;
        Ok(())
    }

    fn upsample_chroma_to_444(
        graph: &mut FilterGraph,
        state: &mut GraphState,
        kernel_uv: &Kernel,
    ) -> Result<(), PipelineError> {
        if state.subsample_w == 0 && state.subsample_h == 0 {
            return Ok(());
        }

        debug!(
            "upsample chroma {}x{} to 4:4:4",
            1 << state.subsample_w,
            1 << state.subsample_h
        );

        let chroma_w = state.width >> state.subsample_w;
        let chroma_h = state.height >> state.subsample_h;

        if state.subsample_h != 0 {
            let offset = chroma_offset_h(state.chroma_location_h, state.subsample_h);
            let (shift, subdim) = chroma_resize_params(
                offset,
                0.0,
                state.subsample_h,
                0,
                0.0,
                f64::from(state.height),
                state.height,
            );
            let (_, filter) = resize_v_filter(
                kernel_uv,
                chroma_h,
                state.height,
                shift,
                subdim,
                chroma_w,
                state.ty,
            )?;
            graph.attach_filter_uv(filter)?;
        }

        if state.subsample_w != 0 {
            let offset = chroma_offset_w(state.chroma_location_w, state.subsample_w);
            let (shift, subdim) = chroma_resize_params(
                offset,
                0.0,
                state.subsample_w,
                0,
                0.0,
                f64::from(state.width),
                state.width,
            );
            let (_, filter) = resize_h_filter(
                kernel_uv,
                chroma_w,
                state.width,
                shift,
                subdim,
                state.height,
                state.ty,
            )?;
            graph.attach_filter_uv(filter)?;
        }

        state.subsample_w = 0;
        state.subsample_h = 0;
        Ok(())
    }

    fn resize_stages(
        graph: &mut FilterGraph,
        state: &mut GraphState,
        dst_state: &GraphState,
        kernel: &Kernel,
        kernel_uv: &Kernel,
    ) -> Result<(), PipelineError> {
        let has_alpha = state.alpha != AlphaMode::None;

        // The luma mapping feeding the chroma shifts below.
        let luma_shift_w = state.active_left;
        let luma_subw = state.active_width;
        let luma_shift_h = state.active_top;
        let luma_subh = state.active_height;

        let (src_w, src_h) = (state.width, state.height);
        let (dst_w, dst_h) = (dst_state.width, dst_state.height);

        let do_h = src_w != dst_w || luma_shift_w != 0.0 || luma_subw != f64::from(src_w);
        let do_v = src_h != dst_h || luma_shift_h != 0.0 || luma_subh != f64::from(src_h);

        // Pick the order with the smaller intermediate plane.
        let h_first = u64::from(dst_w) * u64::from(src_h) <= u64::from(src_w) * u64::from(dst_h);

        let attach_luma_h = |graph: &mut FilterGraph,
                             state: &mut GraphState|
         -> Result<(), PipelineError> {
            if !do_h {
                return Ok(());
            }
            debug!("resize luma horizontal {} -> {}", state.width, dst_w);
            let (table, filter) = resize_h_filter(
                kernel,
                state.width,
                dst_w,
                luma_shift_w,
                luma_subw,
                state.height,
                state.ty,
            )?;
            graph.attach_filter(filter)?;
            if has_alpha {
                graph.attach_filter_alpha(Box::new(ResizeHorizontal::new(
                    table,
                    state.height,
                    state.ty,
                    working_depth(state.ty),
                )))?;
            }
            state.width = dst_w;
            Ok(())
        };
        let attach_luma_v = |graph: &mut FilterGraph,
                             state: &mut GraphState|
         -> Result<(), PipelineError> {
            if !do_v {
                return Ok(());
            }
            debug!("resize luma vertical {} -> {}", state.height, dst_h);
            let (table, filter) = resize_v_filter(
                kernel,
                state.height,
                dst_h,
                luma_shift_h,
                luma_subh,
                state.width,
                state.ty,
            )?;
            graph.attach_filter(filter)?;
            if has_alpha {
                graph.attach_filter_alpha(Box::new(ResizeVertical::new(
                    table,
                    state.width,
                    state.ty,
                    working_depth(state.ty),
                )))?;
            }
            state.height = dst_h;
            Ok(())
        };

        if h_first {
            attach_luma_h(graph, state)?;
            attach_luma_v(graph, state)?;
        } else {
            attach_luma_v(graph, state)?;
            attach_luma_h(graph, state)?;
        }

        if state.color != ColorFamily::Grey {
            // RGB planes are resampled like luma; the chroma kernel is for
            // real chroma grids only.
            let plane_kernel = if state.color == ColorFamily::Yuv {
                kernel_uv
            } else {
                kernel
            };

            let (uv_shift_w, uv_subw) = chroma_resize_params(
                chroma_offset_w(state.chroma_location_w, state.subsample_w),
                chroma_offset_w(dst_state.chroma_location_w, dst_state.subsample_w),
                state.subsample_w,
                dst_state.subsample_w,
                luma_shift_w,
                luma_subw,
                dst_w,
            );
            let (uv_shift_h, uv_subh) = chroma_resize_params(
                chroma_offset_h(state.chroma_location_h, state.subsample_h),
                chroma_offset_h(dst_state.chroma_location_h, dst_state.subsample_h),
                state.subsample_h,
                dst_state.subsample_h,
                luma_shift_h,
                luma_subh,
                dst_h,
            );

            let uv_src_w = src_w >> state.subsample_w;
            let uv_src_h = src_h >> state.subsample_h;
            let uv_dst_w = dst_w >> dst_state.subsample_w;
            let uv_dst_h = dst_h >> dst_state.subsample_h;

            let do_uv_h =
                uv_src_w != uv_dst_w || uv_shift_w != 0.0 || uv_subw != f64::from(uv_src_w);
            let do_uv_v =
                uv_src_h != uv_dst_h || uv_shift_h != 0.0 || uv_subh != f64::from(uv_src_h);

            let mut cur_w = uv_src_w;
            let mut cur_h = uv_src_h;

            let attach_uv_h = |graph: &mut FilterGraph,
                               cur_w: &mut u32,
                               cur_h: u32|
             -> Result<(), PipelineError> {
                if !do_uv_h {
                    return Ok(());
                }
                debug!("resize chroma horizontal {} -> {}", *cur_w, uv_dst_w);
                let (_, filter) = resize_h_filter(
                    plane_kernel, *cur_w, uv_dst_w, uv_shift_w, uv_subw, cur_h, state.ty,
                )?;
                graph.attach_filter_uv(filter)?;
                *cur_w = uv_dst_w;
                Ok(())
            };
            let attach_uv_v = |graph: &mut FilterGraph,
                               cur_w: u32,
                               cur_h: &mut u32|
             -> Result<(), PipelineError> {
                if !do_uv_v {
                    return Ok(());
                }
                debug!("resize chroma vertical {} -> {}", *cur_h, uv_dst_h);
                let (_, filter) = resize_v_filter(
                    plane_kernel, *cur_h, uv_dst_h, uv_shift_h, uv_subh, cur_w, state.ty,
                )?;
                graph.attach_filter_uv(filter)?;
                *cur_h = uv_dst_h;
                Ok(())
            };

            let uv_h_first = u64::from(uv_dst_w) * u64::from(uv_src_h)
                <= u64::from(uv_src_w) * u64::from(uv_dst_h);
            if uv_h_first {
                attach_uv_h(graph, &mut cur_w, cur_h)?;
                attach_uv_v(graph, cur_w, &mut cur_h)?;
            } else {
                attach_uv_v(graph, cur_w, &mut cur_h)?;
                attach_uv_h(graph, &mut cur_w, cur_h)?;
            }

            state.subsample_w = dst_state.subsample_w;
            state.subsample_h = dst_state.subsample_h;
            state.chroma_location_w = dst_state.chroma_location_w;
            state.chroma_location_h = dst_state.chroma_location_h;
        }

        state.active_left = 0.0;
        state.active_top = 0.0;
        state.active_width = f64::from(dst_w);
        state.active_height = f64::from(dst_h);
        Ok(())
    }

    fn pack_stages(
        graph: &mut FilterGraph,
        state: &mut GraphState,
        dst_state: &GraphState,
        dither: DitherType,
    ) -> Result<(), PipelineError> {
        match dst_state.ty {
            PixelType::U8 | PixelType::U16 => {
                let in_luma = luma_format(state);
                let out_luma = luma_format(dst_state);

                let make = |width: u32,
                            height: u32,
                            pixel_in: &PixelFormat,
                            pixel_out: &PixelFormat|
                 -> Result<Box<dyn ImageFilter>, PipelineError> {
                    if dither == DitherType::ErrorDiffusion {
                        Ok(Box::new(ErrorDiffusion::new(
                            width, height, pixel_in, pixel_out,
                        )?))
                    } else {
                        Ok(Box::new(OrderedDither::new(
                            dither, width, height, pixel_in, pixel_out,
                        )?))
                    }
                };

                if in_luma != out_luma {
                    debug!("dither luma to {:?}/{}", dst_state.ty, dst_state.depth);
                    graph.attach_filter(make(
                        state.width,
                        state.height,
                        &in_luma,
                        &out_luma,
                    )?)?;
                }

                if state.color != ColorFamily::Grey {
                    let in_chroma = chroma_format(state);
                    let out_chroma = chroma_format(dst_state);
                    if in_chroma != out_chroma {
                        graph.attach_filter_uv(make(
                            state.width >> state.subsample_w,
                            state.height >> state.subsample_h,
                            &in_chroma,
                            &out_chroma,
                        )?)?;
                    }
                }
                if state.alpha != AlphaMode::None {
                    let in_alpha = alpha_format(state);
                    let out_alpha = alpha_format(dst_state);
                    if in_alpha != out_alpha {
                        graph.attach_filter_alpha(make(
                            state.width,
                            state.height,
                            &in_alpha,
                            &out_alpha,
                        )?)?;
                    }
                }
            }
            PixelType::F16 => {
                debug!("narrow to f16");
                graph.attach_filter(Box::new(ConvertToHalf::new(state.width, state.height)))?;
                if state.color != ColorFamily::Grey {
                    graph.attach_filter_uv(Box::new(ConvertToHalf::new(
                        state.width >> state.subsample_w,
                        state.height >> state.subsample_h,
                    )))?;
                }
                if state.alpha != AlphaMode::None {
                    graph.attach_filter_alpha(Box::new(ConvertToHalf::new(
                        state.width,
                        state.height,
                    )))?;
                }
            }
            PixelType::F32 => {}
        }

        state.ty = dst_state.ty;
        state.depth = dst_state.depth;
        state.fullrange = dst_state.fullrange;
        Ok(())
    }

    /// Translate the format pair into a complete, executable graph.
    pub fn build(self) -> Result<FilterGraph, PipelineError> {
        let (src_state, dst_state) = import_graph_state(&self.src, &self.dst)?;
        Self::validate_pair(&src_state, &dst_state)?;

        let kernel = Kernel::from_filter(
            self.params.resample_filter,
            self.params.filter_param_a,
            self.params.filter_param_b,
        )?;
        let kernel_uv = Kernel::from_filter(
            self.params.resample_filter_uv,
            self.params.filter_param_a_uv,
            self.params.filter_param_b_uv,
        )?;

        let peak_luminance = if self.params.version >= API_VERSION_2_2 {
            self.params.nominal_peak_luminance
        } else {
            100.0
        };
        if !(peak_luminance > 0.0) || !peak_luminance.is_finite() {
            return Err(PipelineError::IllegalArgument(
                "nominal peak luminance must be positive",
            ));
        }
        let op_params = OperationParams {
            peak_luminance,
            approximate_gamma: self.params.allow_approximate_gamma,
            scene_referred: false,
        };

        let color = src_state.color != ColorFamily::Grey;
        let has_alpha = src_state.alpha != AlphaMode::None;
        let mut graph = FilterGraph::new(
            src_state.width,
            src_state.height,
            src_state.ty,
            src_state.subsample_w,
            src_state.subsample_h,
            color,
            has_alpha,
        )?;

        let mut state = src_state;

        if state != dst_state {
            let csp_needed = state.colorspace != dst_state.colorspace;
            let float_path = csp_needed
                || state.ty.is_float()
                || dst_state.ty.is_float()
                || state.fullrange
                || dst_state.fullrange;

            if float_path {
                Self::convert_to_float_stages(&mut graph, &mut state)?;
            } else {
                Self::left_shift_stages(&mut graph, &mut state)?;
            }

            if csp_needed {
                Self::upsample_chroma_to_444(&mut graph, &mut state, &kernel_uv)?;

                let owned_graph;
                let csp_graph = match self.csp_graph {
                    Some(graph) => graph,
                    None => {
                        owned_graph = ColorspaceGraph::new();
                        &owned_graph
                    }
                };

                debug!(
                    "colorspace {:?} -> {:?}",
                    state.colorspace, dst_state.colorspace
                );
                let filter = ColorspaceConversion::new(
                    state.width,
                    state.height,
                    &state.colorspace,
                    &dst_state.colorspace,
                    &op_params,
                    csp_graph,
                )?;
                graph.attach_filter(Box::new(filter))?;
                state.colorspace = dst_state.colorspace;
                state.color = dst_state.color;
            }

            Self::resize_stages(&mut graph, &mut state, &dst_state, &kernel, &kernel_uv)?;
            Self::pack_stages(&mut graph, &mut state, &dst_state, self.params.dither_type)?;
        }

        graph.complete()?;
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colorspace::{
        ColorPrimaries, MatrixCoefficients, TransferCharacteristics,
    };
    use crate::params::ChromaLocation;
    use float_cmp::assert_approx_eq;

    #[test]
    fn chroma_offsets() {
        assert_eq!(chroma_offset_w(ChromaLocationW::Center, 1), 0.0);
        assert_approx_eq!(f64, chroma_offset_w(ChromaLocationW::Left, 1), -0.25, epsilon = 1e-12);
        assert_approx_eq!(f64, chroma_offset_w(ChromaLocationW::Left, 2), -0.375, epsilon = 1e-12);
        assert_eq!(chroma_offset_w(ChromaLocationW::Left, 0), 0.0);
        assert_approx_eq!(f64, chroma_offset_h(ChromaLocationH::Bottom, 1), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn chroma_upsample_mapping_is_cosited_for_left() {
        // 4:2:0 MPEG-2 chroma upsampled to 4:4:4: sample 0 must stay
        // co-sited with luma 0.
        let (shift, subdim) =
            chroma_resize_params(chroma_offset_w(ChromaLocationW::Left, 1), 0.0, 1, 0, 0.0, 64.0, 64);
        assert_approx_eq!(f64, shift, 0.25, epsilon = 1e-12);
        assert_approx_eq!(f64, subdim, 32.0, epsilon = 1e-12);
        // c(0) = (0 + 0.5) * (32/64) + 0.25 = 0.5: the centre of chroma 0.
        let c0 = 0.5 * (subdim / 64.0) + shift;
        assert_approx_eq!(f64, c0, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn chroma_downsample_mapping_is_inverse() {
        let (shift, subdim) =
            chroma_resize_params(0.0, chroma_offset_w(ChromaLocationW::Left, 1), 0, 1, 0.0, 64.0, 64);
        assert_approx_eq!(f64, shift, -0.5, epsilon = 1e-12);
        assert_approx_eq!(f64, subdim, 64.0, epsilon = 1e-12);
    }

    #[test]
    fn rejects_field_parity_conversion() {
        let mut src = ImageFormat::new(64, 64, PixelType::U8);
        let mut dst = ImageFormat::new(64, 64, PixelType::U8);
        src.field_parity = crate::params::FieldParity::Top;
        dst.field_parity = crate::params::FieldParity::Progressive;
        assert_eq!(
            GraphBuilder::new(src, dst).build().err(),
            Some(PipelineError::NoFieldParityConversion)
        );
    }

    #[test]
    fn rejects_family_mixture() {
        let mut src = ImageFormat::new(64, 64, PixelType::U8);
        src.color_family = ColorFamily::Grey;
        let mut dst = ImageFormat::new(64, 64, PixelType::U8);
        dst.color_family = ColorFamily::Yuv;
        dst.matrix = MatrixCoefficients::Rec709;
        dst.transfer = TransferCharacteristics::Rec709;
        dst.primaries = ColorPrimaries::Rec709;
        assert!(matches!(
            GraphBuilder::new(src, dst).build(),
            Err(PipelineError::ColorFamilyMismatch(_))
        ));
    }

    #[test]
    fn rejects_rgb_subsampling() {
        let mut src = ImageFormat::new(64, 64, PixelType::U8);
        src.color_family = ColorFamily::Rgb;
        src.subsample_w = 1;
        let mut dst = src;
        dst.subsample_w = 1;
        assert_eq!(
            GraphBuilder::new(src, dst).build().err(),
            Some(PipelineError::UnsupportedSubsampling)
        );
    }

    #[test]
    fn rejects_unreachable_colorspace() {
        let mut src = ImageFormat::new(64, 64, PixelType::F32);
        src.color_family = ColorFamily::Yuv;
        src.matrix = MatrixCoefficients::Unspecified;
        src.transfer = TransferCharacteristics::Unspecified;
        src.primaries = ColorPrimaries::Unspecified;
        let mut dst = src;
        dst.matrix = MatrixCoefficients::Rec709;
        dst.transfer = TransferCharacteristics::Rec709;
        dst.primaries = ColorPrimaries::Rec709;
        assert_eq!(
            GraphBuilder::new(src, dst).build().err(),
            Some(PipelineError::NoColorspaceConversion)
        );
    }

    #[test]
    fn builds_yuv420_identity() {
        let mut fmt = ImageFormat::new(128, 96, PixelType::U8);
        fmt.color_family = ColorFamily::Yuv;
        fmt.subsample_w = 1;
        fmt.subsample_h = 1;
        fmt.chroma_location = ChromaLocation::Left;
        let graph = GraphBuilder::new(fmt, fmt).build().unwrap();
        assert!(graph.tmp_size().is_ok());
    }

    #[test]
    fn builds_full_conversion() {
        // 4:2:0 BT.709 8-bit to 4:4:4 BT.2020 10-bit with resize.
        let mut src = ImageFormat::new(192, 128, PixelType::U8);
        src.color_family = ColorFamily::Yuv;
        src.subsample_w = 1;
        src.subsample_h = 1;
        src.matrix = MatrixCoefficients::Rec709;
        src.transfer = TransferCharacteristics::Rec709;
        src.primaries = ColorPrimaries::Rec709;

        let mut dst = ImageFormat::new(96, 64, PixelType::U16);
        dst.depth = 10;
        dst.color_family = ColorFamily::Yuv;
        dst.matrix = MatrixCoefficients::Rec2020Ncl;
        dst.transfer = TransferCharacteristics::Rec709;
        dst.primaries = ColorPrimaries::Rec2020;

        let graph = GraphBuilder::new(src, dst).build().unwrap();
        assert!(graph.output_buffering().unwrap() >= 1);
    }
}
