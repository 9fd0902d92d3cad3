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
use crate::align::ceil_n;
use crate::errors::PipelineError;
use crate::sampler::Kernel;

/// Fixed-point fraction bits of the `i16` coefficient layout.
pub const COEFF_PRECISION: u32 = 14;
pub const COEFF_ONE: i32 = 1 << COEFF_PRECISION;

/// Immutable polyphase coefficient table.
///
/// For each output sample `i`, `left[i]` is the first input sample tapped
/// and `filter_width` contiguous coefficients follow at `i * stride` in
/// the float layout and `i * stride_i16` in the 1.14 fixed-point layout.
#[derive(Debug, Clone)]
pub struct FilterTable {
    pub filter_width: u32,
    pub filter_rows: u32,
    pub input_width: u32,
    pub stride: u32,
    pub stride_i16: u32,
    pub data: Vec<f32>,
    pub data_i16: Vec<i16>,
    pub left: Vec<u32>,
}

impl FilterTable {
    /// Synthesize the table for a resampling kernel over the active
    /// subwindow `[shift, shift + width)`. NaN kernel parameters select
    /// the kernel's defaults.
    pub fn compute(
        filter: crate::sampler::ResampleFilter,
        param_a: f64,
        param_b: f64,
        src_dim: u32,
        dst_dim: u32,
        shift: f64,
        width: f64,
    ) -> Result<FilterTable, PipelineError> {
        let kernel = Kernel::from_filter(filter, param_a, param_b)?;
        compute_filter(&kernel, src_dim, dst_dim, shift, width)
    }

    pub(crate) fn is_sorted(&self) -> bool {
        self.left.windows(2).all(|w| w[0] <= w[1])
    }

    pub(crate) fn row_f32(&self, i: u32) -> &[f32] {
        let start = i as usize * self.stride as usize;
        &self.data[start..start + self.filter_width as usize]
    }

    pub(crate) fn row_i16(&self, i: u32) -> &[i16] {
        let start = i as usize * self.stride_i16 as usize;
        &self.data_i16[start..start + self.filter_width as usize]
    }
}

/// Round half away from zero with the sign preserved.
///
/// When rounding on the pixel grid the invariant
/// `round(x - 1) == round(x) - 1` must hold, which precludes
/// half-to-even rounding.
pub(crate) fn round_half_up(x: f64) -> f64 {
    let negative = x.is_sign_negative();
    let v = x.abs().round();
    if negative {
        -v
    } else {
        v
    }
}

struct SparseRow {
    left: usize,
    coeffs: Vec<f64>,
}

fn synthesize_row(kernel: &Kernel, src_dim: u32, pos: f64, step: f64, filter_size: i32) -> SparseRow {
    let begin_pos = round_half_up(pos - filter_size as f64 / 2.0) + 0.5;

    let mut total = 0.0;
    for j in 0..filter_size {
        let xpos = begin_pos + j as f64;
        total += kernel.eval((xpos - pos) * step);
    }

    let mut min_idx = usize::MAX;
    let mut max_idx = 0usize;
    let mut taps = Vec::with_capacity(filter_size as usize);

    for j in 0..filter_size {
        let xpos = begin_pos + j as f64;

        // Mirror the position if it goes beyond image bounds.
        let real_pos = if xpos < 0.0 {
            -xpos
        } else if xpos >= src_dim as f64 {
            (2.0 * src_dim as f64 - xpos).min(src_dim as f64 - 0.5)
        } else {
            xpos
        };

        let idx = real_pos.floor() as usize;
        min_idx = min_idx.min(idx);
        max_idx = max_idx.max(idx);
        taps.push((idx, kernel.eval((xpos - pos) * step) / total));
    }

    let mut coeffs = vec![0f64; max_idx - min_idx + 1];
    for (idx, w) in taps {
        coeffs[idx - min_idx] += w;
    }

    SparseRow {
        left: min_idx,
        coeffs,
    }
}

/// Quantize the normalized rows into the float and 1.14 fixed-point
/// layouts with dithered rounding: the running error is carried so the row
/// keeps summing to one, and the fixed-point residual is folded into the
/// greatest-magnitude tap.
fn quantize_rows(rows: &[SparseRow], src_dim: u32) -> FilterTable {
    let width = rows.iter().map(|r| r.coeffs.len()).max().unwrap_or(0);
    debug_assert!(width != 0, "empty matrix");

    let stride = ceil_n(width, 8);
    let stride_i16 = ceil_n(width, 16);

    let mut table = FilterTable {
        filter_width: width as u32,
        filter_rows: rows.len() as u32,
        input_width: src_dim,
        stride: stride as u32,
        stride_i16: stride_i16 as u32,
        data: vec![0f32; stride * rows.len()],
        data_i16: vec![0i16; stride_i16 * rows.len()],
        left: vec![0u32; rows.len()],
    };

    for (i, row) in rows.iter().enumerate() {
        let left = row.left.min(src_dim as usize - width);

        let mut f32_err = 0f64;
        let mut i16_err = 0f64;

        let mut i16_sum = 0i32;
        let mut i16_greatest = 0i16;
        let mut i16_greatest_idx = 0usize;

        for j in 0..width {
            let abs_idx = left + j;
            let coeff = if abs_idx >= row.left && abs_idx < row.left + row.coeffs.len() {
                row.coeffs[abs_idx - row.left]
            } else {
                0.0
            };

            let coeff_expected_f32 = coeff - f32_err;
            let coeff_expected_i16 = coeff * f64::from(COEFF_ONE) - i16_err;

            let coeff_f32 = coeff_expected_f32 as f32;
            let coeff_i16 = coeff_expected_i16.round_ties_even() as i16;

            f32_err = f64::from(coeff_f32) - coeff_expected_f32;
            i16_err = f64::from(coeff_i16) - coeff_expected_i16;

            if coeff_i16.unsigned_abs() > i16_greatest.unsigned_abs() {
                i16_greatest = coeff_i16;
                i16_greatest_idx = j;
            }

            i16_sum += i32::from(coeff_i16);

            table.data[i * stride + j] = coeff_f32;
            table.data_i16[i * stride_i16 + j] = coeff_i16;
        }

        // The float sum may still be off by a few ULP, which depends on the
        // summation order and can not be repaired. The integer residual can
        // be added to the greatest coefficient.
        table.data_i16[i * stride_i16 + i16_greatest_idx] += (COEFF_ONE - i16_sum) as i16;
        table.left[i] = left as u32;
    }

    table
}

/// Compute the polyphase table mapping `src_dim` samples onto `dst_dim`
/// samples of the active subwindow `[shift, shift + width)`.
pub(crate) fn compute_filter(
    kernel: &Kernel,
    src_dim: u32,
    dst_dim: u32,
    shift: f64,
    width: f64,
) -> Result<FilterTable, PipelineError> {
    let scale = f64::from(dst_dim) / width;
    let step = scale.min(1.0);
    let support = f64::from(kernel.support()) / step;
    let filter_size = ((support.ceil() as i32) * 2).max(1);

    if shift.abs() >= f64::from(src_dim) || shift + width >= 2.0 * f64::from(src_dim) {
        return Err(PipelineError::ResamplingNotAvailable(
            "image shift or subwindow too great",
        ));
    }
    if f64::from(src_dim) <= support || width <= support {
        return Err(PipelineError::ResamplingNotAvailable(
            "filter width too great for image dimensions",
        ));
    }

    let mut rows = Vec::with_capacity(dst_dim as usize);

    for i in 0..dst_dim {
        // Position of output sample on input grid.
        let pos = (f64::from(i) + 0.5) / scale + shift;
        rows.push(synthesize_row(kernel, src_dim, pos, step, filter_size));
    }

    Ok(quantize_rows(&rows, src_dim))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::ResampleFilter;

    fn sum_f32(table: &FilterTable, i: u32) -> f32 {
        table.row_f32(i).iter().sum()
    }

    fn sum_i16(table: &FilterTable, i: u32) -> i32 {
        table.row_i16(i).iter().map(|&c| i32::from(c)).sum()
    }

    #[test]
    fn round_half_up_preserves_grid_invariant() {
        for x in [-3.5, -2.5, -1.5, -0.5, 0.5, 1.5, 2.5, 0.25, -0.25, 7.75] {
            assert_eq!(round_half_up(x - 1.0), round_half_up(x) - 1.0, "x = {x}");
        }
        assert_eq!(round_half_up(0.5), 1.0);
        assert_eq!(round_half_up(-0.5), -1.0);
        assert_eq!(round_half_up(2.5), 3.0);
    }

    #[test]
    fn rows_sum_to_unity() {
        let kernels = [
            Kernel::Point,
            Kernel::Bilinear,
            Kernel::bicubic(1.0 / 3.0, 1.0 / 3.0),
            Kernel::Spline16,
            Kernel::Spline36,
            Kernel::Lanczos { taps: 4 },
        ];
        for kernel in kernels {
            for (src, dst) in [(100, 37), (37, 100), (512, 512), (64, 9), (7, 1024)] {
                let table = compute_filter(&kernel, src, dst, 0.0, f64::from(src)).unwrap();
                assert_eq!(table.filter_rows, dst);
                for i in 0..dst {
                    assert!(
                        (sum_f32(&table, i) - 1.0).abs() <= 4.0 * f32::EPSILON,
                        "f32 sum of row {i} for {src}->{dst}"
                    );
                    assert_eq!(sum_i16(&table, i), COEFF_ONE, "i16 sum of row {i} for {src}->{dst}");
                }
            }
        }
    }

    #[test]
    fn taps_stay_in_bounds() {
        let kernel = Kernel::Lanczos { taps: 3 };
        for (src, dst) in [(16, 4096), (4096, 16), (1024, 1023), (7, 4096)] {
            let table = compute_filter(&kernel, src, dst, 0.0, f64::from(src)).unwrap();
            for i in 0..dst {
                let left = table.left[i as usize];
                assert!(left + table.filter_width <= src, "row {i} of {src}->{dst}");
            }
        }
    }

    #[test]
    fn identity_scale_bilinear_is_unit_taps() {
        let table = compute_filter(&Kernel::Bilinear, 16, 16, 0.0, 16.0).unwrap();
        for i in 0..16 {
            let row = table.row_f32(i);
            let lead = (i - u32::from(table.left[i as usize])) as usize;
            assert_eq!(row[lead], 1.0);
            assert_eq!(table.row_i16(i)[lead], COEFF_ONE as i16);
        }
    }

    #[test]
    fn point_filter_picks_nearest() {
        let table = compute_filter(&Kernel::Point, 4, 8, 0.0, 4.0).unwrap();
        assert_eq!(table.filter_width, 1);
        let picks: Vec<u32> = (0..8).map(|i| table.left[i as usize]).collect();
        assert_eq!(picks, vec![0, 0, 1, 1, 2, 2, 3, 3]);
    }

    #[test]
    fn rejects_out_of_range_subwindows() {
        let kernel = Kernel::from_filter(ResampleFilter::Bicubic, f64::NAN, f64::NAN).unwrap();
        assert!(matches!(
            compute_filter(&kernel, 100, 50, 100.0, 50.0),
            Err(PipelineError::ResamplingNotAvailable(_))
        ));
        assert!(matches!(
            compute_filter(&kernel, 100, 50, 99.0, 101.5),
            Err(PipelineError::ResamplingNotAvailable(_))
        ));
        assert!(matches!(
            compute_filter(&kernel, 2, 50, 0.0, 2.0),
            Err(PipelineError::ResamplingNotAvailable(_))
        ));
    }

    #[test]
    fn downscale_reads_within_source() {
        // Mirrors §line-exactness: extremal rows only touch valid lines.
        for (src, dst) in [(1080, 720), (4096, 5), (4, 2), (4095, 17)] {
            let table = compute_filter(&Kernel::Bilinear, src, dst, 0.0, f64::from(src)).unwrap();
            assert_eq!(table.filter_rows, dst);
            assert!(table.left[0] < src);
            let last = table.left[dst as usize - 1];
            assert!(last + table.filter_width <= src);
        }
    }
}
