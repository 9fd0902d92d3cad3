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
use crate::align::{ceil_n, floor_n, ALIGNMENT};
use crate::copy_filter::CopyFilter;
use crate::errors::PipelineError;
use crate::filter::{FilterFlags, ImageFilter};
use crate::image_buffer::{
    select_buffer_mask, AlignedBuffer, ImageBufferMut, ImageBufferRef, PlaneBuffer,
    PlaneBufferMut, BUFFER_MAX, PLANE_A, PLANE_U, PLANE_Y,
};
use crate::pixel::{ImageAttributes, PixelType};
use log::{debug, trace};

/// Nominal column-strip width in output pixels.
pub const HORIZONTAL_STEP: u32 = 512;
/// The final strip is merged into its neighbour rather than running
/// narrower than this.
pub const TILE_MIN: u32 = 64;

/// Caller-supplied unpack/pack hook: `(row, left, right)`. A failure stops
/// the execution with [PipelineError::UserCallbackFailed].
pub type Callback<'a> = &'a mut dyn FnMut(u32, u32, u32) -> Result<(), ()>;

#[derive(Debug, Clone, Copy)]
struct SourceInfo {
    width: u32,
    height: u32,
    ty: PixelType,
    subsample_w: u32,
    subsample_h: u32,
    color: bool,
    alpha: bool,
}

enum NodeKind {
    Source(SourceInfo),
    /// Luma or color node.
    Filter {
        filter: Box<dyn ImageFilter>,
        parent: usize,
        parent_uv: Option<usize>,
    },
    /// Single-plane filter applied to U and V with private contexts.
    FilterUv {
        filter: Box<dyn ImageFilter>,
        parent: usize,
    },
    /// Single-plane filter on the alpha plane.
    FilterAlpha {
        filter: Box<dyn ImageFilter>,
        parent: usize,
    },
}

struct GraphNode {
    kind: NodeKind,
    /// Circular window the node needs, as a line count (power of two), or
    /// [BUFFER_MAX] for a fully allocated plane.
    cache_lines: u32,
    ref_count: u32,
}

impl GraphNode {
    fn filter(&self) -> Option<&dyn ImageFilter> {
        match &self.kind {
            NodeKind::Source(_) => None,
            NodeKind::Filter { filter, .. }
            | NodeKind::FilterUv { filter, .. }
            | NodeKind::FilterAlpha { filter, .. } => Some(filter.as_ref()),
        }
    }

    fn step(&self) -> u32 {
        match &self.kind {
            NodeKind::Source(info) => 1 << info.subsample_h,
            _ => self.filter().map(|f| f.simultaneous_lines()).unwrap_or(1),
        }
    }

    fn image_attributes(&self, uv: bool) -> ImageAttributes {
        match &self.kind {
            NodeKind::Source(info) => {
                let width = info.width >> if uv { info.subsample_w } else { 0 };
                let height = info.height >> if uv { info.subsample_h } else { 0 };
                ImageAttributes::new(width, height, info.ty)
            }
            _ => self.filter().map(|f| f.image_attributes()).expect("filter node"),
        }
    }

    /// Planes held in this node's cache.
    fn num_planes(&self) -> usize {
        match &self.kind {
            NodeKind::Source(_) => 0,
            NodeKind::Filter { filter, .. } => {
                if filter.flags().contains(FilterFlags::COLOR) {
                    3
                } else {
                    1
                }
            }
            NodeKind::FilterUv { .. } => 2,
            NodeKind::FilterAlpha { .. } => 1,
        }
    }

    fn set_cache_lines(&mut self, n: u32) {
        if n > self.cache_lines {
            let height = self.image_attributes(matches!(self.kind, NodeKind::FilterUv { .. }))
                .height;
            self.cache_lines = if n >= height {
                BUFFER_MAX
            } else {
                select_buffer_mask(n) + 1
            };
        }
    }

    fn real_cache_lines(&self) -> u32 {
        if self.cache_lines == BUFFER_MAX {
            self.image_attributes(matches!(self.kind, NodeKind::FilterUv { .. })).height
        } else {
            self.cache_lines
        }
    }

    fn cache_mask(&self) -> u32 {
        if self.cache_lines == BUFFER_MAX {
            BUFFER_MAX
        } else {
            self.cache_lines.wrapping_sub(1)
        }
    }
}

struct SimulationState {
    cache_pos: Vec<u32>,
}

impl SimulationState {
    fn new(size: usize) -> Self {
        SimulationState {
            cache_pos: vec![0; size],
        }
    }
}

struct NodeState {
    cache: Vec<AlignedBuffer>,
    stride: usize,
    mask: u32,
    cursor: u32,
    source_left: u32,
    source_right: u32,
    ctx: AlignedBuffer,
    ctx2: AlignedBuffer,
}

impl NodeState {
    fn plane_view(&self, p: usize) -> PlaneBuffer<'_> {
        PlaneBuffer::with_mask(self.cache[p].as_bytes(), self.stride as isize, self.mask)
    }
}

/// Per-execution state: circular caches, cursors, filter contexts and the
/// shared scratch buffer. Created once per graph and reusable across
/// `process_with` calls.
pub struct ExecutionState {
    nodes: Vec<NodeState>,
    tmp: AlignedBuffer,
}

impl ExecutionState {
    pub fn new(graph: &FilterGraph) -> Result<Self, PipelineError> {
        graph.check_complete()?;

        let mut nodes = Vec::with_capacity(graph.nodes.len());
        for node in &graph.nodes {
            let num_planes = node.num_planes();
            let (stride, lines) = if num_planes != 0 {
                let attr = node.image_attributes(matches!(node.kind, NodeKind::FilterUv { .. }));
                (ceil_n(attr.row_bytes(), ALIGNMENT), node.real_cache_lines())
            } else {
                (0, 0)
            };

            let cache = (0..num_planes)
                .map(|_| AlignedBuffer::new(stride * lines as usize))
                .collect();
            let ctx_size = node.filter().map(|f| f.context_size()).unwrap_or(0);
            let ctx2_size = if matches!(node.kind, NodeKind::FilterUv { .. }) {
                ctx_size
            } else {
                0
            };

            nodes.push(NodeState {
                cache,
                stride,
                mask: node.cache_mask(),
                cursor: 0,
                source_left: 0,
                source_right: 0,
                ctx: AlignedBuffer::new(ctx_size),
                ctx2: AlignedBuffer::new(ctx2_size),
            });
        }

        Ok(ExecutionState {
            nodes,
            tmp: AlignedBuffer::new(graph.tmp_size()?),
        })
    }
}

struct Io<'a, 'b> {
    src: &'b ImageBufferRef<'a>,
    dst: &'b mut ImageBufferMut<'a>,
    unpack_cb: Option<&'b mut dyn FnMut(u32, u32, u32) -> Result<(), ()>>,
    pack_cb: Option<&'b mut dyn FnMut(u32, u32, u32) -> Result<(), ()>>,
}

/// Which planes of the full image a node produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlanePath {
    Luma,
    Color,
    Uv,
    Alpha,
}

/// A directed acyclic graph of per-plane line filters with a pull-based
/// scheduler.
///
/// Nodes live in a flat table indexed by id; parents always precede their
/// children. Execution walks the output column-strip by column-strip and
/// row by row, pulling each node's inputs through circular row windows
/// sized by a dry-run simulation at [FilterGraph::complete] time.
pub struct FilterGraph {
    nodes: Vec<GraphNode>,
    head: usize,
    node: usize,
    node_uv: Option<usize>,
    node_alpha: Option<usize>,
    subsample_w: u32,
    subsample_h: u32,
    is_complete: bool,
}

impl FilterGraph {
    pub fn new(
        width: u32,
        height: u32,
        ty: PixelType,
        subsample_w: u32,
        subsample_h: u32,
        color: bool,
        alpha: bool,
    ) -> Result<Self, PipelineError> {
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidImageSize("zero image dimension"));
        }
        if width > ty.max_width() {
            return Err(PipelineError::InvalidImageSize("image width too great"));
        }
        if !color && (subsample_w != 0 || subsample_h != 0) {
            return Err(PipelineError::GreyscaleSubsampling);
        }
        if subsample_w > 2 || subsample_h > 2 {
            return Err(PipelineError::UnsupportedSubsampling);
        }
        if width % (1 << subsample_w) != 0 || height % (1 << subsample_h) != 0 {
            return Err(PipelineError::ImageNotDivisible);
        }

        let source = GraphNode {
            kind: NodeKind::Source(SourceInfo {
                width,
                height,
                ty,
                subsample_w,
                subsample_h,
                color,
                alpha,
            }),
            cache_lines: 1 << subsample_h,
            ref_count: 0,
        };

        Ok(FilterGraph {
            nodes: vec![source],
            head: 0,
            node: 0,
            node_uv: if color { Some(0) } else { None },
            node_alpha: if alpha { Some(0) } else { None },
            subsample_w: 0,
            subsample_h: 0,
            is_complete: false,
        })
    }

    fn check_incomplete(&self) -> Result<(), PipelineError> {
        if self.is_complete {
            Err(PipelineError::Logic("cannot modify completed graph"))
        } else {
            Ok(())
        }
    }

    fn check_complete(&self) -> Result<(), PipelineError> {
        if !self.is_complete {
            Err(PipelineError::Logic(
                "cannot query properties on incomplete graph",
            ))
        } else {
            Ok(())
        }
    }

    /// Append a luma or color filter at the head of the graph.
    pub fn attach_filter(&mut self, filter: Box<dyn ImageFilter>) -> Result<(), PipelineError> {
        self.check_incomplete()?;

        let flags = filter.flags();
        let parent = self.node;
        let mut parent_uv = None;

        if flags.contains(FilterFlags::COLOR) {
            let uv = self.node_uv.ok_or(PipelineError::ColorFamilyMismatch(
                "cannot use color filter in greyscale graph",
            ))?;
            let attr = self.nodes[parent].image_attributes(false);
            let attr_uv = self.nodes[uv].image_attributes(uv == self.head);
            if attr != attr_uv {
                return Err(PipelineError::ColorFamilyMismatch(
                    "cannot use color filter with mismatching Y and UV format",
                ));
            }
            parent_uv = Some(uv);
        }

        debug!(
            "attach filter: {:?} -> {:?}",
            self.nodes[parent].image_attributes(false),
            filter.image_attributes()
        );

        self.nodes.push(GraphNode {
            kind: NodeKind::Filter {
                filter,
                parent,
                parent_uv,
            },
            cache_lines: 0,
            ref_count: 0,
        });
        let id = self.nodes.len() - 1;

        self.nodes[parent].ref_count += 1;
        if let Some(uv) = parent_uv {
            self.nodes[uv].ref_count += 1;
        }

        self.node = id;
        if flags.contains(FilterFlags::COLOR) {
            self.node_uv = Some(id);
        }
        Ok(())
    }

    /// Append a single-plane filter on the chroma planes.
    pub fn attach_filter_uv(&mut self, filter: Box<dyn ImageFilter>) -> Result<(), PipelineError> {
        self.check_incomplete()?;

        if filter.flags().contains(FilterFlags::COLOR) {
            return Err(PipelineError::ColorFamilyMismatch(
                "cannot use color filter as UV filter",
            ));
        }
        let parent = self.node_uv.ok_or(PipelineError::ColorFamilyMismatch(
            "cannot attach UV filter in greyscale graph",
        ))?;

        debug!("attach UV filter: -> {:?}", filter.image_attributes());

        self.nodes.push(GraphNode {
            kind: NodeKind::FilterUv { filter, parent },
            cache_lines: 0,
            ref_count: 0,
        });
        self.nodes[parent].ref_count += 1;
        self.node_uv = Some(self.nodes.len() - 1);
        Ok(())
    }

    /// Append a single-plane filter on the alpha plane.
    pub fn attach_filter_alpha(
        &mut self,
        filter: Box<dyn ImageFilter>,
    ) -> Result<(), PipelineError> {
        self.check_incomplete()?;

        if filter.flags().contains(FilterFlags::COLOR) {
            return Err(PipelineError::ColorFamilyMismatch(
                "cannot use color filter as alpha filter",
            ));
        }
        let parent = self.node_alpha.ok_or(PipelineError::ColorFamilyMismatch(
            "cannot attach alpha filter without an alpha plane",
        ))?;

        debug!("attach alpha filter: -> {:?}", filter.image_attributes());

        self.nodes.push(GraphNode {
            kind: NodeKind::FilterAlpha { filter, parent },
            cache_lines: 0,
            ref_count: 0,
        });
        self.nodes[parent].ref_count += 1;
        self.node_alpha = Some(self.nodes.len() - 1);
        Ok(())
    }

    fn plane_path(&self, id: usize) -> PlanePath {
        match &self.nodes[id].kind {
            NodeKind::Source(_) => PlanePath::Luma,
            NodeKind::Filter { filter, .. } => {
                if filter.flags().contains(FilterFlags::COLOR) {
                    PlanePath::Color
                } else {
                    PlanePath::Luma
                }
            }
            NodeKind::FilterUv { .. } => PlanePath::Uv,
            NodeKind::FilterAlpha { .. } => PlanePath::Alpha,
        }
    }

    /// Finish construction: verify subsampling consistency, materialize
    /// aliased terminals through a copy, simulate the row schedule and
    /// size every circular window.
    pub fn complete(&mut self) -> Result<(), PipelineError> {
        self.check_incomplete()?;

        let node_attr = self.nodes[self.node].image_attributes(false);
        let node_attr_uv = match self.node_uv {
            Some(uv) => self.nodes[uv].image_attributes(uv == self.head),
            None => node_attr,
        };

        let mut subsample_w = 0;
        let mut subsample_h = 0;
        for ss in 0..3 {
            if node_attr.width == node_attr_uv.width << ss {
                subsample_w = ss;
            }
            if node_attr.height == node_attr_uv.height << ss {
                subsample_h = ss;
            }
        }

        if node_attr.width != node_attr_uv.width << subsample_w {
            return Err(PipelineError::UnsupportedSubsampling);
        }
        if node_attr.height != node_attr_uv.height << subsample_h {
            return Err(PipelineError::UnsupportedSubsampling);
        }
        if node_attr.ty != node_attr_uv.ty {
            return Err(PipelineError::Logic("UV pixel type can not differ"));
        }
        if let Some(alpha) = self.node_alpha {
            let attr_alpha = self.nodes[alpha].image_attributes(false);
            let mut expected = node_attr;
            expected.ty = attr_alpha.ty;
            if attr_alpha != expected {
                return Err(PipelineError::Logic(
                    "alpha plane must match the luma dimensions",
                ));
            }
        }

        // Terminal nodes write the caller's buffer; a source or shared node
        // must not alias it.
        if self.node == self.head || self.nodes[self.node].ref_count > 0 {
            self.attach_filter(Box::new(CopyFilter::new(
                node_attr.width,
                node_attr.height,
                node_attr.ty,
            )))?;
        }
        if let Some(uv) = self.node_uv {
            if uv == self.head || self.nodes[uv].ref_count > 0 {
                self.attach_filter_uv(Box::new(CopyFilter::new(
                    node_attr_uv.width,
                    node_attr_uv.height,
                    node_attr_uv.ty,
                )))?;
            }
        }
        if let Some(alpha) = self.node_alpha {
            if alpha == self.head || self.nodes[alpha].ref_count > 0 {
                let attr_alpha = self.nodes[alpha].image_attributes(false);
                self.attach_filter_alpha(Box::new(CopyFilter::new(
                    attr_alpha.width,
                    attr_alpha.height,
                    attr_alpha.ty,
                )))?;
            }
        }

        let mut sim = SimulationState::new(self.nodes.len());

        for i in (0..node_attr.height).step_by(1usize << subsample_h) {
            self.simulate(&mut sim, self.node, i, i + (1 << subsample_h), false);

            if let Some(uv) = self.node_uv {
                self.simulate(&mut sim, uv, i >> subsample_h, (i >> subsample_h) + 1, true);
            }
            if let Some(alpha) = self.node_alpha {
                self.simulate(&mut sim, alpha, i, i + (1 << subsample_h), false);
            }
        }

        self.subsample_w = subsample_w;
        self.subsample_h = subsample_h;
        self.is_complete = true;

        for (id, node) in self.nodes.iter().enumerate() {
            trace!("node {id}: cache lines {}", node.cache_lines);
        }

        Ok(())
    }

    fn simulate(&mut self, sim: &mut SimulationState, id: usize, first: u32, last: u32, uv: bool) {
        match &self.nodes[id].kind {
            NodeKind::Source(info) => {
                let step = 1u32 << info.subsample_h;
                let shift = if uv { info.subsample_h } else { 0 };
                let first = first << shift;
                let last = last << shift;

                let mut pos = sim.cache_pos[id];
                if pos < last {
                    pos = floor_n((last - 1) as usize, step as usize) as u32 + step;
                }

                sim.cache_pos[id] = pos;
                self.nodes[id].set_cache_lines(pos - first);
            }
            NodeKind::Filter { .. } | NodeKind::FilterUv { .. } | NodeKind::FilterAlpha { .. } => {
                let (parent, parent_uv, parent_is_uv) = match &self.nodes[id].kind {
                    NodeKind::Filter { parent, parent_uv, .. } => (*parent, *parent_uv, false),
                    NodeKind::FilterUv { parent, .. } => (*parent, None, true),
                    NodeKind::FilterAlpha { parent, .. } => (*parent, None, false),
                    NodeKind::Source(_) => unreachable!(),
                };
                let step = self.nodes[id].step();

                let mut pos = sim.cache_pos[id];
                while pos < last {
                    let range = self.nodes[id]
                        .filter()
                        .expect("filter node")
                        .required_row_range(pos);

                    self.simulate(sim, parent, range.start, range.end, parent_is_uv);
                    if let Some(p_uv) = parent_uv {
                        self.simulate(sim, p_uv, range.start, range.end, true);
                    }

                    pos += step;
                }

                sim.cache_pos[id] = pos;
                self.nodes[id].set_cache_lines(pos - first);
            }
        }
    }

    fn entire_row(&self, id: usize) -> bool {
        match &self.nodes[id].kind {
            NodeKind::Source(_) => false,
            NodeKind::Filter {
                filter,
                parent,
                parent_uv,
            } => {
                filter.flags().contains(FilterFlags::ENTIRE_ROW)
                    || self.entire_row(*parent)
                    || parent_uv.map(|uv| self.entire_row(uv)).unwrap_or(false)
            }
            NodeKind::FilterUv { filter, parent } | NodeKind::FilterAlpha { filter, parent } => {
                filter.flags().contains(FilterFlags::ENTIRE_ROW) || self.entire_row(*parent)
            }
        }
    }

    fn horizontal_step(&self) -> u32 {
        let head_attr = self.nodes[self.head].image_attributes(false);
        let tail_attr = self.nodes[self.node].image_attributes(false);

        let entire_row = self.entire_row(self.node)
            || self.node_uv.map(|uv| self.entire_row(uv)).unwrap_or(false)
            || self
                .node_alpha
                .map(|a| self.entire_row(a))
                .unwrap_or(false);

        if entire_row {
            tail_attr.width
        } else {
            let scale = (f64::from(tail_attr.width) / f64::from(head_attr.width)).max(1.0);
            let step = floor_n(
                (f64::from(HORIZONTAL_STEP) * scale).round() as usize,
                ALIGNMENT,
            ) as u32;
            step.min(tail_attr.width)
        }
    }

    /// Output column strips, final one merged to at least [TILE_MIN] wide.
    fn strips(&self) -> Vec<(u32, u32)> {
        let width = self.nodes[self.node].image_attributes(false).width;
        let h_step = self.horizontal_step();

        let mut out = Vec::new();
        let mut j = 0;
        while j < width {
            let mut j_end = (j + h_step).min(width);
            if width - j_end < TILE_MIN {
                j_end = width;
            }
            out.push((j, j_end));
            j = j_end;
        }
        out
    }

    fn node_tmp_size(&self, id: usize, left: u32, right: u32) -> usize {
        match &self.nodes[id].kind {
            NodeKind::Source(_) => 0,
            NodeKind::Filter {
                filter,
                parent,
                parent_uv,
            } => {
                let range = filter.required_col_range(left, right);
                let mut size = filter.tmp_size(left, right);
                size = size.max(self.node_tmp_size(*parent, range.start, range.end));
                if let Some(uv) = parent_uv {
                    size = size.max(self.node_tmp_size(*uv, range.start, range.end));
                }
                size
            }
            NodeKind::FilterUv { filter, parent } | NodeKind::FilterAlpha { filter, parent } => {
                let range = filter.required_col_range(left, right);
                filter
                    .tmp_size(left, right)
                    .max(self.node_tmp_size(*parent, range.start, range.end))
            }
        }
    }

    /// Size of the shared scratch region for the worst-case strip.
    pub fn tmp_size(&self) -> Result<usize, PipelineError> {
        self.check_complete()?;

        let mut size = 0;
        for (j, j_end) in self.strips() {
            size = size.max(self.node_tmp_size(self.node, j, j_end));
            if let Some(uv) = self.node_uv {
                size = size.max(self.node_tmp_size(
                    uv,
                    j >> self.subsample_w,
                    j_end >> self.subsample_w,
                ));
            }
            if let Some(alpha) = self.node_alpha {
                size = size.max(self.node_tmp_size(alpha, j, j_end));
            }
        }
        Ok(size)
    }

    /// Lines of the input image that must stay addressable at once.
    pub fn input_buffering(&self) -> Result<u32, PipelineError> {
        self.check_complete()?;
        Ok(self.nodes[self.head].cache_lines)
    }

    /// Lines of the output image that must stay addressable at once.
    pub fn output_buffering(&self) -> Result<u32, PipelineError> {
        self.check_complete()?;

        let mut lines = self.nodes[self.node].cache_lines;
        if let Some(uv) = self.node_uv {
            let lines_uv = self.nodes[uv].cache_lines;
            let lines_uv = if lines_uv == BUFFER_MAX {
                lines_uv
            } else {
                lines_uv << self.subsample_h
            };
            lines = lines.max(lines_uv);
        }
        Ok(lines)
    }

    fn reset_state(&self, state: &mut ExecutionState) {
        for (node, st) in self.nodes.iter().zip(state.nodes.iter_mut()) {
            st.cursor = 0;
            let attr = node.image_attributes(matches!(node.kind, NodeKind::FilterUv { .. }));
            st.source_left = attr.width;
            st.source_right = 0;
            if let Some(filter) = node.filter() {
                filter.init_context(st.ctx.as_bytes_mut());
                if !st.ctx2.is_empty() {
                    filter.init_context(st.ctx2.as_bytes_mut());
                }
            }
        }
    }

    fn set_tile_region(&self, state: &mut ExecutionState, id: usize, left: u32, right: u32, uv: bool) {
        match &self.nodes[id].kind {
            NodeKind::Source(info) => {
                let shift = if uv { info.subsample_w } else { 0 };
                let st = &mut state.nodes[id];
                st.source_left = st.source_left.min(left << shift);
                st.source_right = st.source_right.max(right << shift);
            }
            NodeKind::Filter {
                filter,
                parent,
                parent_uv,
            } => {
                let range = filter.required_col_range(left, right);
                self.set_tile_region(state, *parent, range.start, range.end, false);
                if let Some(p_uv) = parent_uv {
                    self.set_tile_region(state, *p_uv, range.start, range.end, true);
                }
                let st = &mut state.nodes[id];
                st.source_left = st.source_left.min(left);
                st.source_right = st.source_right.max(right);
            }
            NodeKind::FilterUv { filter, parent } => {
                let range = filter.required_col_range(left, right);
                self.set_tile_region(state, *parent, range.start, range.end, true);
                let st = &mut state.nodes[id];
                st.source_left = st.source_left.min(left);
                st.source_right = st.source_right.max(right);
            }
            NodeKind::FilterAlpha { filter, parent } => {
                let range = filter.required_col_range(left, right);
                self.set_tile_region(state, *parent, range.start, range.end, false);
                let st = &mut state.nodes[id];
                st.source_left = st.source_left.min(left);
                st.source_right = st.source_right.max(right);
            }
        }
    }

    /// Resolve the output view of `id` for image plane `plane`.
    fn parent_plane_view<'s>(
        &self,
        states: &'s [NodeState],
        src: &ImageBufferRef<'s>,
        id: usize,
        plane: usize,
    ) -> PlaneBuffer<'s> {
        if matches!(self.nodes[id].kind, NodeKind::Source(_)) {
            return src.planes[plane];
        }
        match self.plane_path(id) {
            PlanePath::Luma | PlanePath::Alpha => states[id].plane_view(0),
            PlanePath::Color => states[id].plane_view(plane),
            PlanePath::Uv => states[id].plane_view(plane - 1),
        }
    }

    fn generate_line(
        &self,
        state: &mut ExecutionState,
        io: &mut Io<'_, '_>,
        id: usize,
        i: u32,
        uv: bool,
        external: bool,
    ) -> Result<(), PipelineError> {
        match &self.nodes[id].kind {
            NodeKind::Source(info) => {
                let step = 1u32 << info.subsample_h;
                let line = if uv { i * step } else { i };
                let st = &mut state.nodes[id];

                if line >= st.cursor {
                    let mut pos = st.cursor;
                    if let Some(cb) = io.unpack_cb.as_deref_mut() {
                        while pos <= line {
                            cb(pos, st.source_left, st.source_right)
                                .map_err(|_| PipelineError::UserCallbackFailed)?;
                            pos += step;
                        }
                    } else {
                        pos = floor_n(line as usize, step as usize) as u32 + step;
                    }
                    st.cursor = pos;
                }
                Ok(())
            }
            NodeKind::Filter {
                parent, parent_uv, ..
            } => {
                let (parent, parent_uv) = (*parent, *parent_uv);
                let step = self.nodes[id].step();

                let mut pos = state.nodes[id].cursor;
                while pos <= i {
                    let range = self.nodes[id]
                        .filter()
                        .expect("filter node")
                        .required_row_range(pos);

                    for ii in range {
                        self.generate_line(state, io, parent, ii, false, false)?;
                        if let Some(p_uv) = parent_uv {
                            self.generate_line(state, io, p_uv, ii, true, false)?;
                        }
                    }

                    self.invoke_filter(state, io, id, pos, external);
                    pos += step;
                }
                state.nodes[id].cursor = pos;
                Ok(())
            }
            NodeKind::FilterUv { parent, .. } | NodeKind::FilterAlpha { parent, .. } => {
                let parent = *parent;
                let parent_is_uv = matches!(self.nodes[id].kind, NodeKind::FilterUv { .. });
                let step = self.nodes[id].step();

                let mut pos = state.nodes[id].cursor;
                while pos <= i {
                    let range = self.nodes[id]
                        .filter()
                        .expect("filter node")
                        .required_row_range(pos);

                    for ii in range {
                        self.generate_line(state, io, parent, ii, parent_is_uv, false)?;
                    }

                    self.invoke_filter(state, io, id, pos, external);
                    pos += step;
                }
                state.nodes[id].cursor = pos;
                Ok(())
            }
        }
    }

    fn invoke_filter(
        &self,
        state: &mut ExecutionState,
        io: &mut Io<'_, '_>,
        id: usize,
        pos: u32,
        external: bool,
    ) {
        let ExecutionState { nodes, tmp } = state;
        let (before, rest) = nodes.split_at_mut(id);
        let own = &mut rest[0];

        let left = own.source_left;
        let right = own.source_right;
        let (stride, mask) = (own.stride as isize, own.mask);
        let src_img = io.src;

        match &self.nodes[id].kind {
            NodeKind::Source(_) => unreachable!("source has no filter"),
            NodeKind::Filter {
                filter,
                parent,
                parent_uv,
            } => {
                let color = filter.flags().contains(FilterFlags::COLOR);

                let src: Vec<PlaneBuffer<'_>> = if color {
                    let uv = parent_uv.unwrap_or(*parent);
                    vec![
                        self.parent_plane_view(before, src_img, *parent, PLANE_Y),
                        self.parent_plane_view(before, src_img, uv, PLANE_U),
                        self.parent_plane_view(before, src_img, uv, PLANE_U + 1),
                    ]
                } else {
                    vec![self.parent_plane_view(before, src_img, *parent, PLANE_Y)]
                };

                let mut dst: Vec<PlaneBufferMut<'_>> = if external {
                    let planes = if color { PLANE_Y..3 } else { PLANE_Y..1 };
                    io.dst.planes[planes].iter_mut().map(|p| p.reborrow()).collect()
                } else {
                    own.cache
                        .iter_mut()
                        .map(|c| PlaneBufferMut::with_mask(c.as_bytes_mut(), stride, mask))
                        .collect()
                };

                filter.process(
                    own.ctx.as_bytes_mut(),
                    &src,
                    &mut dst,
                    tmp.as_bytes_mut(),
                    pos,
                    left,
                    right,
                );
            }
            NodeKind::FilterUv { filter, parent } => {
                for p in 0..2 {
                    let src = [self.parent_plane_view(before, src_img, *parent, PLANE_U + p)];

                    let mut dst = if external {
                        [io.dst.planes[PLANE_U + p].reborrow()]
                    } else {
                        [PlaneBufferMut::with_mask(own.cache[p].as_bytes_mut(), stride, mask)]
                    };

                    let ctx = if p == 0 {
                        own.ctx.as_bytes_mut()
                    } else {
                        own.ctx2.as_bytes_mut()
                    };

                    filter.process(ctx, &src, &mut dst, tmp.as_bytes_mut(), pos, left, right);
                }
            }
            NodeKind::FilterAlpha { filter, parent } => {
                let src = [self.parent_plane_view(before, src_img, *parent, PLANE_A)];

                let mut dst = if external {
                    [io.dst.planes[PLANE_A].reborrow()]
                } else {
                    [PlaneBufferMut::with_mask(own.cache[0].as_bytes_mut(), stride, mask)]
                };

                filter.process(
                    own.ctx.as_bytes_mut(),
                    &src,
                    &mut dst,
                    tmp.as_bytes_mut(),
                    pos,
                    left,
                    right,
                );
            }
        }
    }

    fn validate_plane(
        plane: &PlaneBuffer<'_>,
        attr: &ImageAttributes,
        what: &'static str,
    ) -> Result<(), PipelineError> {
        if plane.is_null() {
            return Err(PipelineError::IllegalArgument(what));
        }
        if plane.stride().unsigned_abs() < attr.row_bytes()
            || plane.stride().unsigned_abs() % ALIGNMENT != 0
        {
            return Err(PipelineError::IllegalArgument(what));
        }
        if plane.data_align() < attr.ty.size() {
            return Err(PipelineError::IllegalArgument(what));
        }
        let mask = plane.mask();
        if mask != BUFFER_MAX && !mask.wrapping_add(1).is_power_of_two() {
            return Err(PipelineError::IllegalArgument(what));
        }
        Ok(())
    }

    fn validate_buffers(
        &self,
        src: &ImageBufferRef<'_>,
        dst: &ImageBufferMut<'_>,
    ) -> Result<(), PipelineError> {
        let src_info = match &self.nodes[self.head].kind {
            NodeKind::Source(info) => *info,
            _ => unreachable!("head is always a source"),
        };

        let src_luma = ImageAttributes::new(src_info.width, src_info.height, src_info.ty);
        Self::validate_plane(&src.planes[PLANE_Y], &src_luma, "bad source luma plane")?;
        if src_info.color {
            let src_chroma = ImageAttributes::new(
                src_info.width >> src_info.subsample_w,
                src_info.height >> src_info.subsample_h,
                src_info.ty,
            );
            for p in [PLANE_U, PLANE_U + 1] {
                Self::validate_plane(&src.planes[p], &src_chroma, "bad source chroma plane")?;
            }
        }
        if src_info.alpha {
            Self::validate_plane(&src.planes[PLANE_A], &src_luma, "bad source alpha plane")?;
        }

        let dst_attr = self.nodes[self.node].image_attributes(false);
        Self::validate_plane(&dst.planes[PLANE_Y].as_const(), &dst_attr, "bad target luma plane")?;
        if let Some(uv) = self.node_uv {
            let attr_uv = self.nodes[uv].image_attributes(false);
            for p in [PLANE_U, PLANE_U + 1] {
                Self::validate_plane(&dst.planes[p].as_const(), &attr_uv, "bad target chroma plane")?;
            }
        }
        if let Some(alpha) = self.node_alpha {
            let attr_alpha = self.nodes[alpha].image_attributes(false);
            Self::validate_plane(
                &dst.planes[PLANE_A].as_const(),
                &attr_alpha,
                "bad target alpha plane",
            )?;
        }
        Ok(())
    }

    /// Run the graph over the caller's buffers with a fresh state.
    pub fn process<'a, 'b>(
        &self,
        src: &'b ImageBufferRef<'a>,
        dst: &'b mut ImageBufferMut<'a>,
        unpack_cb: Option<Callback<'b>>,
        pack_cb: Option<Callback<'b>>,
    ) -> Result<(), PipelineError> {
        let mut state = ExecutionState::new(self)?;
        self.process_with(&mut state, src, dst, unpack_cb, pack_cb)
    }

    /// Run the graph, reusing a previously created [ExecutionState].
    pub fn process_with<'a, 'b>(
        &self,
        state: &mut ExecutionState,
        src: &'b ImageBufferRef<'a>,
        dst: &'b mut ImageBufferMut<'a>,
        unpack_cb: Option<Callback<'b>>,
        pack_cb: Option<Callback<'b>>,
    ) -> Result<(), PipelineError> {
        self.check_complete()?;
        self.validate_buffers(src, dst)?;

        let attr = self.nodes[self.node].image_attributes(false);
        let v_step = 1u32 << self.subsample_h;

        let mut io = Io {
            src,
            dst,
            unpack_cb,
            pack_cb,
        };

        for (j, j_end) in self.strips() {
            self.reset_state(state);

            self.set_tile_region(state, self.node, j, j_end, false);
            if let Some(uv) = self.node_uv {
                self.set_tile_region(
                    state,
                    uv,
                    j >> self.subsample_w,
                    j_end >> self.subsample_w,
                    true,
                );
            }
            if let Some(alpha) = self.node_alpha {
                self.set_tile_region(state, alpha, j, j_end, false);
            }

            let mut i = 0;
            while i < attr.height {
                for ii in i..i + v_step {
                    self.generate_line(state, &mut io, self.node, ii, false, true)?;
                }
                if let Some(uv) = self.node_uv {
                    self.generate_line(state, &mut io, uv, i >> self.subsample_h, true, true)?;
                }
                if let Some(alpha) = self.node_alpha {
                    for ii in i..i + v_step {
                        self.generate_line(state, &mut io, alpha, ii, false, true)?;
                    }
                }

                if let Some(cb) = io.pack_cb.as_deref_mut() {
                    cb(i, j, j_end).map_err(|_| PipelineError::UserCallbackFailed)?;
                }

                i += v_step;
            }
        }

        Ok(())
    }
}
