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
use crate::colorspace_param::{gamut_matrix, ncl_rgb_to_yuv_matrix, ncl_yuv_to_rgb_matrix};
use crate::errors::PipelineError;
use crate::gamma::select_transfer_function;
use crate::operation::{
    GammaToLinearOperation, LinearToGammaOperation, LutOperation, MatrixOperation, Operation,
    OperationParams, Rec2020ClToRgbOperation, Rec2020ClToYuvOperation,
};
use std::collections::VecDeque;

/// One conversion step between two adjacent colorspace vertices. Turned
/// into a concrete [Operation] only when a path is instantiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStep {
    NclRgbToYuv(MatrixCoefficients),
    NclYuvToRgb(MatrixCoefficients),
    ClRgbToYuv,
    ClYuvToRgb,
    GammaToLinear(TransferCharacteristics),
    LinearToGamma(TransferCharacteristics),
    Gamut(ColorPrimaries, ColorPrimaries),
}

impl ConversionStep {
    /// Instantiate the numeric operation for this step.
    pub(crate) fn create_operation(
        &self,
        params: &OperationParams,
    ) -> Result<Box<dyn Operation>, PipelineError> {
        match *self {
            ConversionStep::NclRgbToYuv(matrix) => Ok(Box::new(MatrixOperation::new(
                &ncl_rgb_to_yuv_matrix(matrix)?,
            ))),
            ConversionStep::NclYuvToRgb(matrix) => Ok(Box::new(MatrixOperation::new(
                &ncl_yuv_to_rgb_matrix(matrix)?,
            ))),
            ConversionStep::ClRgbToYuv => Ok(Box::new(Rec2020ClToYuvOperation)),
            ConversionStep::ClYuvToRgb => Ok(Box::new(Rec2020ClToRgbOperation)),
            ConversionStep::GammaToLinear(transfer) => {
                let func =
                    select_transfer_function(transfer, params.peak_luminance, params.scene_referred)?;
                if params.approximate_gamma {
                    Ok(Box::new(LutOperation::to_linear(&func)))
                } else {
                    Ok(Box::new(GammaToLinearOperation::new(&func)))
                }
            }
            ConversionStep::LinearToGamma(transfer) => {
                let func =
                    select_transfer_function(transfer, params.peak_luminance, params.scene_referred)?;
                if params.approximate_gamma {
                    Ok(Box::new(LutOperation::to_gamma(&func)))
                } else {
                    Ok(Box::new(LinearToGammaOperation::new(&func)))
                }
            }
            ConversionStep::Gamut(primaries_in, primaries_out) => Ok(Box::new(
                MatrixOperation::new(&gamut_matrix(primaries_in, primaries_out)?),
            )),
        }
    }
}

/// Registry of colorspace vertices and conversion edges.
///
/// Built once and immutable afterwards; the builder takes it by reference
/// so one registry can serve many pipelines.
pub struct ColorspaceGraph {
    vertices: Vec<Colorspace>,
    edges: Vec<Vec<(usize, ConversionStep)>>,
}

impl Default for ColorspaceGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorspaceGraph {
    pub fn new() -> Self {
        let mut vertices = Vec::new();

        for &matrix in &MatrixCoefficients::ALL {
            for &transfer in &TransferCharacteristics::ALL {
                for &primaries in &ColorPrimaries::ALL {
                    let csp = Colorspace::new(matrix, transfer, primaries);
                    if csp.is_valid() {
                        vertices.push(csp);
                    }
                }
            }
        }

        let mut graph = ColorspaceGraph {
            edges: vec![Vec::new(); vertices.len()],
            vertices,
        };

        // Find all possible conversions.
        for idx in 0..graph.vertices.len() {
            let csp = graph.vertices[idx];

            if csp.matrix == MatrixCoefficients::Rgb {
                // RGB can be converted to YUV.
                for &matrix in &MatrixCoefficients::ALL {
                    if matrix == MatrixCoefficients::Rec2020Cl
                        && csp.transfer == TransferCharacteristics::Linear
                    {
                        // Only linear RGB can be converted to CL.
                        graph.link(
                            csp,
                            csp.with_matrix(matrix)
                                .with_transfer(TransferCharacteristics::Rec709),
                            ConversionStep::ClRgbToYuv,
                        );
                    } else if matrix != MatrixCoefficients::Rgb
                        && matrix != MatrixCoefficients::Rec2020Cl
                        && matrix != MatrixCoefficients::Unspecified
                    {
                        graph.link(
                            csp,
                            csp.with_matrix(matrix),
                            ConversionStep::NclRgbToYuv(matrix),
                        );
                    }
                }

                if csp.transfer == TransferCharacteristics::Linear {
                    // Linear RGB can be converted to gamma and to other
                    // primaries.
                    for &transfer in &TransferCharacteristics::ALL {
                        if transfer != csp.transfer
                            && transfer != TransferCharacteristics::Unspecified
                        {
                            graph.link(
                                csp,
                                csp.with_transfer(transfer),
                                ConversionStep::LinearToGamma(transfer),
                            );
                        }
                    }
                    if csp.primaries != ColorPrimaries::Unspecified {
                        for &primaries in &ColorPrimaries::ALL {
                            if primaries != csp.primaries && primaries != ColorPrimaries::Unspecified
                            {
                                graph.link(
                                    csp,
                                    csp.with_primaries(primaries),
                                    ConversionStep::Gamut(csp.primaries, primaries),
                                );
                            }
                        }
                    }
                } else if csp.transfer != TransferCharacteristics::Unspecified {
                    // Gamma RGB can be converted to linear.
                    graph.link(
                        csp,
                        csp.to_linear(),
                        ConversionStep::GammaToLinear(csp.transfer),
                    );
                }
            } else if csp.matrix == MatrixCoefficients::Rec2020Cl {
                graph.link(csp, csp.to_rgb().to_linear(), ConversionStep::ClYuvToRgb);
            } else if csp.matrix != MatrixCoefficients::Unspecified {
                // YUV can only be converted to RGB.
                graph.link(
                    csp,
                    csp.to_rgb(),
                    ConversionStep::NclYuvToRgb(csp.matrix),
                );
            }
        }

        graph
    }

    fn index_of(&self, csp: &Colorspace) -> Result<usize, PipelineError> {
        self.vertices
            .iter()
            .position(|v| v == csp)
            .ok_or(PipelineError::NoColorspaceConversion)
    }

    fn link(&mut self, a: Colorspace, b: Colorspace, step: ConversionStep) {
        let from = self.index_of(&a).expect("link source not in database");
        let to = self.index_of(&b).expect("link target not in database");
        self.edges[from].push((to, step));
    }

    /// Breadth-first search from `csp_in` to `csp_out`, visiting edges in
    /// insertion order so the returned path is deterministic.
    pub fn shortest_path(
        &self,
        csp_in: &Colorspace,
        csp_out: &Colorspace,
    ) -> Result<Vec<ConversionStep>, PipelineError> {
        let src = self.index_of(csp_in)?;
        let dst = self.index_of(csp_out)?;

        let mut queue = VecDeque::new();
        let mut visited = vec![false; self.vertices.len()];
        let mut parents: Vec<Option<(usize, ConversionStep)>> = vec![None; self.vertices.len()];

        visited[src] = true;
        queue.push_back(src);

        while let Some(vertex) = queue.pop_front() {
            if vertex == dst {
                let mut path = Vec::new();
                let mut tail = vertex;

                while tail != src {
                    let (prev, step) = parents[tail].expect("missing link in traversal path");
                    path.push(step);
                    tail = prev;
                }

                path.reverse();
                return Ok(path);
            }

            for &(adj, step) in &self.edges[vertex] {
                if !visited[adj] {
                    visited[adj] = true;
                    parents[adj] = Some((vertex, step));
                    queue.push_back(adj);
                }
            }
        }

        Err(PipelineError::NoColorspaceConversion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csp(
        matrix: MatrixCoefficients,
        transfer: TransferCharacteristics,
        primaries: ColorPrimaries,
    ) -> Colorspace {
        Colorspace::new(matrix, transfer, primaries)
    }

    #[test]
    fn single_hop_yuv_to_rgb() {
        let graph = ColorspaceGraph::new();
        let path = graph
            .shortest_path(
                &csp(
                    MatrixCoefficients::Rec709,
                    TransferCharacteristics::Rec709,
                    ColorPrimaries::Rec709,
                ),
                &csp(
                    MatrixCoefficients::Rgb,
                    TransferCharacteristics::Rec709,
                    ColorPrimaries::Rec709,
                ),
            )
            .unwrap();
        assert_eq!(
            path,
            vec![ConversionStep::NclYuvToRgb(MatrixCoefficients::Rec709)]
        );
    }

    #[test]
    fn bt709_to_bt2020_goes_through_linear() {
        let graph = ColorspaceGraph::new();
        let path = graph
            .shortest_path(
                &csp(
                    MatrixCoefficients::Rec709,
                    TransferCharacteristics::Rec709,
                    ColorPrimaries::Rec709,
                ),
                &csp(
                    MatrixCoefficients::Rec2020Ncl,
                    TransferCharacteristics::Rec709,
                    ColorPrimaries::Rec2020,
                ),
            )
            .unwrap();
        assert_eq!(
            path,
            vec![
                ConversionStep::NclYuvToRgb(MatrixCoefficients::Rec709),
                ConversionStep::GammaToLinear(TransferCharacteristics::Rec709),
                ConversionStep::Gamut(ColorPrimaries::Rec709, ColorPrimaries::Rec2020),
                ConversionStep::LinearToGamma(TransferCharacteristics::Rec709),
                ConversionStep::NclRgbToYuv(MatrixCoefficients::Rec2020Ncl),
            ]
        );
    }

    #[test]
    fn cl_2020_is_reachable_only_through_linear_rgb() {
        let graph = ColorspaceGraph::new();
        let path = graph
            .shortest_path(
                &csp(
                    MatrixCoefficients::Rgb,
                    TransferCharacteristics::Linear,
                    ColorPrimaries::Rec2020,
                ),
                &csp(
                    MatrixCoefficients::Rec2020Cl,
                    TransferCharacteristics::Rec709,
                    ColorPrimaries::Rec2020,
                ),
            )
            .unwrap();
        assert_eq!(path, vec![ConversionStep::ClRgbToYuv]);

        let back = graph
            .shortest_path(
                &csp(
                    MatrixCoefficients::Rec2020Cl,
                    TransferCharacteristics::Rec709,
                    ColorPrimaries::Rec2020,
                ),
                &csp(
                    MatrixCoefficients::Rgb,
                    TransferCharacteristics::Linear,
                    ColorPrimaries::Rec2020,
                ),
            )
            .unwrap();
        assert_eq!(back, vec![ConversionStep::ClYuvToRgb]);
    }

    #[test]
    fn unknown_vertex_is_rejected() {
        let graph = ColorspaceGraph::new();
        // CL with a non-709 transfer fails the validity predicate.
        let bad = csp(
            MatrixCoefficients::Rec2020Cl,
            TransferCharacteristics::Linear,
            ColorPrimaries::Rec2020,
        );
        let good = csp(
            MatrixCoefficients::Rgb,
            TransferCharacteristics::Linear,
            ColorPrimaries::Rec2020,
        );
        assert_eq!(
            graph.shortest_path(&bad, &good),
            Err(PipelineError::NoColorspaceConversion)
        );
    }

    #[test]
    fn unspecified_has_no_outgoing_path() {
        let graph = ColorspaceGraph::new();
        let unspec = Colorspace::default();
        let rgb = csp(
            MatrixCoefficients::Rgb,
            TransferCharacteristics::Rec709,
            ColorPrimaries::Rec709,
        );
        assert_eq!(
            graph.shortest_path(&unspec, &rgb),
            Err(PipelineError::NoColorspaceConversion)
        );
    }

    #[test]
    fn paths_are_symmetric_and_invertible() {
        let graph = ColorspaceGraph::new();
        let endpoints = [
            csp(
                MatrixCoefficients::Rec601,
                TransferCharacteristics::Rec709,
                ColorPrimaries::SmpteC,
            ),
            csp(
                MatrixCoefficients::Rec709,
                TransferCharacteristics::Rec709,
                ColorPrimaries::Rec709,
            ),
            csp(
                MatrixCoefficients::Rec2020Ncl,
                TransferCharacteristics::St2084,
                ColorPrimaries::Rec2020,
            ),
            csp(
                MatrixCoefficients::Rgb,
                TransferCharacteristics::Srgb,
                ColorPrimaries::Rec709,
            ),
            csp(
                MatrixCoefficients::Rec2020Cl,
                TransferCharacteristics::Rec709,
                ColorPrimaries::Rec2020,
            ),
        ];

        for a in &endpoints {
            for b in &endpoints {
                if a == b {
                    continue;
                }
                let fwd = graph.shortest_path(a, b);
                let rev = graph.shortest_path(b, a);
                assert!(fwd.is_ok(), "no path {a:?} -> {b:?}");
                assert!(rev.is_ok(), "no path {b:?} -> {a:?}");
            }
        }
    }

    #[test]
    fn same_endpoints_yield_empty_path() {
        let graph = ColorspaceGraph::new();
        let a = csp(
            MatrixCoefficients::Rec709,
            TransferCharacteristics::Rec709,
            ColorPrimaries::Rec709,
        );
        assert_eq!(graph.shortest_path(&a, &a).unwrap(), vec![]);
    }
}
