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
use crate::colorspace::Colorspace;
use crate::colorspace_graph::ColorspaceGraph;
use crate::errors::PipelineError;
use crate::filter::{FilterFlags, ImageFilter};
use crate::image_buffer::{PlaneBuffer, PlaneBufferMut};
use crate::operation::{Operation, OperationParams};
use crate::pixel::{ImageAttributes, PixelType};

/// Colorspace conversion filter: runs the operation chain found by the
/// path search over three synchronized `f32` rows.
pub struct ColorspaceConversion {
    operations: Vec<Box<dyn Operation>>,
    attr: ImageAttributes,
}

impl ColorspaceConversion {
    pub fn new(
        width: u32,
        height: u32,
        csp_in: &Colorspace,
        csp_out: &Colorspace,
        params: &OperationParams,
        graph: &ColorspaceGraph,
    ) -> Result<Self, PipelineError> {
        // Identical endpoints yield an empty path; the filter then degrades
        // to a three-plane copy.
        let path = graph.shortest_path(csp_in, csp_out)?;

        let mut operations = Vec::with_capacity(path.len());
        for step in &path {
            operations.push(step.create_operation(params)?);
        }

        Ok(ColorspaceConversion {
            operations,
            attr: ImageAttributes::new(width, height, PixelType::F32),
        })
    }
}

impl ImageFilter for ColorspaceConversion {
    fn flags(&self) -> FilterFlags {
        FilterFlags::SAME_ROW | FilterFlags::IN_PLACE | FilterFlags::COLOR
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
        let (l, r) = (left as usize, right as usize);

        let (d0, rest) = dst.split_at_mut(1);
        let (d1, d2) = rest.split_at_mut(1);

        let mut rows: [&mut [f32]; 3] = [
            d0[0].row_mut(i, l, r),
            d1[0].row_mut(i, l, r),
            d2[0].row_mut(i, l, r),
        ];

        for (p, row) in rows.iter_mut().enumerate() {
            row.copy_from_slice(src[p].row::<f32>(i, l, r));
        }

        // Rows were copied starting at `left`, so the operations run over
        // the whole borrowed span.
        let span = r - l;
        for op in &self.operations {
            op.process(&mut rows, 0, span);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colorspace::{ColorPrimaries, MatrixCoefficients, TransferCharacteristics};
    use crate::image_buffer::AlignedBuffer;

    fn convert_pixel(csp_in: Colorspace, csp_out: Colorspace, px: [f32; 3]) -> [f32; 3] {
        let graph = ColorspaceGraph::new();
        let filter = ColorspaceConversion::new(
            8,
            1,
            &csp_in,
            &csp_out,
            &OperationParams::default(),
            &graph,
        )
        .unwrap();

        let mut src_stores: Vec<AlignedBuffer> = (0..3)
            .map(|p| {
                let mut s = AlignedBuffer::new(32);
                {
                    let mut plane = PlaneBufferMut::new(s.as_bytes_mut(), 32);
                    let row: &mut [f32] = plane.row_mut(0, 0, 8);
                    row.fill(px[p]);
                }
                s
            })
            .collect();
        let mut dst_stores: Vec<AlignedBuffer> = (0..3).map(|_| AlignedBuffer::new(32)).collect();

        let src: Vec<PlaneBuffer> = src_stores
            .iter_mut()
            .map(|s| PlaneBuffer::new(s.as_bytes(), 32))
            .collect();
        {
            let mut dst: Vec<PlaneBufferMut> = dst_stores
                .iter_mut()
                .map(|s| PlaneBufferMut::new(s.as_bytes_mut(), 32))
                .collect();
            filter.process(&mut [], &src, &mut dst, &mut [], 0, 0, 8);
        }

        let mut out = [0f32; 3];
        for (p, store) in dst_stores.iter().enumerate() {
            let plane = PlaneBuffer::new(store.as_bytes(), 32);
            out[p] = plane.row::<f32>(0, 0, 8)[0];
        }
        out
    }

    #[test]
    fn yuv_grey_maps_to_rgb_grey() {
        let yuv = Colorspace::new(
            MatrixCoefficients::Rec709,
            TransferCharacteristics::Rec709,
            ColorPrimaries::Rec709,
        );
        let rgb = yuv.to_rgb();
        let out = convert_pixel(yuv, rgb, [0.5, 0.0, 0.0]);
        for c in out {
            assert!((c - 0.5).abs() < 1e-6, "{out:?}");
        }
    }

    #[test]
    fn there_and_back_again() {
        let a = Colorspace::new(
            MatrixCoefficients::Rec709,
            TransferCharacteristics::Rec709,
            ColorPrimaries::Rec709,
        );
        let b = Colorspace::new(
            MatrixCoefficients::Rec2020Ncl,
            TransferCharacteristics::Rec709,
            ColorPrimaries::Rec2020,
        );
        let px = [0.45, 0.1, -0.08];
        let mid = convert_pixel(a, b, px);
        let back = convert_pixel(b, a, mid);
        for (orig, got) in px.iter().zip(back.iter()) {
            assert!((orig - got).abs() < 1e-5, "{px:?} -> {mid:?} -> {back:?}");
        }
    }
}
