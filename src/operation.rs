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
use crate::colorspace_param::{REC_2020_KB, REC_2020_KR};
use crate::gamma::{rec_709_inverse_oetf, rec_709_oetf, TransferFunction};
use crate::matrix3::Matrix3x3;

/// Parameters shared by all colorspace operations.
#[derive(Debug, Clone, Copy)]
pub struct OperationParams {
    pub peak_luminance: f64,
    pub approximate_gamma: bool,
    pub scene_referred: bool,
}

impl Default for OperationParams {
    fn default() -> Self {
        OperationParams {
            peak_luminance: 100.0,
            approximate_gamma: false,
            scene_referred: false,
        }
    }
}

/// One numeric step of a colorspace conversion, applied in place to three
/// synchronized `f32` plane rows over `[left, right)`.
pub trait Operation: Send + Sync {
    fn process(&self, planes: &mut [&mut [f32]; 3], left: usize, right: usize);
}

/// Per-pixel 3x3 matrix multiplication, accumulating in `f32`.
pub(crate) struct MatrixOperation {
    matrix: [[f32; 3]; 3],
}

impl MatrixOperation {
    pub(crate) fn new(m: &Matrix3x3) -> Self {
        let mut matrix = [[0f32; 3]; 3];
        for (dst, src) in matrix.iter_mut().zip(m.iter()) {
            for (d, s) in dst.iter_mut().zip(src.iter()) {
                *d = *s as f32;
            }
        }
        MatrixOperation { matrix }
    }
}

impl Operation for MatrixOperation {
    fn process(&self, planes: &mut [&mut [f32]; 3], left: usize, right: usize) {
        let m = &self.matrix;

        for i in left..right {
            let a = planes[0][i];
            let b = planes[1][i];
            let c = planes[2][i];

            planes[0][i] = m[0][0] * a + m[0][1] * b + m[0][2] * c;
            planes[1][i] = m[1][0] * a + m[1][1] * b + m[1][2] * c;
            planes[2][i] = m[2][0] * a + m[2][1] * b + m[2][2] * c;
        }
    }
}

/// Non-linear to linear conversion: `postscale * func(x)`.
pub(crate) struct GammaToLinearOperation {
    func: fn(f32) -> f32,
    postscale: f32,
}

impl GammaToLinearOperation {
    pub(crate) fn new(func: &TransferFunction) -> Self {
        GammaToLinearOperation {
            func: func.to_linear,
            postscale: func.to_linear_scale,
        }
    }
}

impl Operation for GammaToLinearOperation {
    fn process(&self, planes: &mut [&mut [f32]; 3], left: usize, right: usize) {
        for plane in planes.iter_mut() {
            for x in plane[left..right].iter_mut() {
                *x = self.postscale * (self.func)(*x);
            }
        }
    }
}

/// Linear to non-linear conversion: `func(prescale * x)`.
pub(crate) struct LinearToGammaOperation {
    func: fn(f32) -> f32,
    prescale: f32,
}

impl LinearToGammaOperation {
    pub(crate) fn new(func: &TransferFunction) -> Self {
        LinearToGammaOperation {
            func: func.to_gamma,
            prescale: func.to_gamma_scale,
        }
    }
}

impl Operation for LinearToGammaOperation {
    fn process(&self, planes: &mut [&mut [f32]; 3], left: usize, right: usize) {
        for plane in planes.iter_mut() {
            for x in plane[left..right].iter_mut() {
                *x = (self.func)(self.prescale * *x);
            }
        }
    }
}

pub(crate) const LUT_DEPTH: u32 = 15;
const LUT_SIZE: usize = 1 << LUT_DEPTH;

/// Approximate curve evaluation through a `2^15`-entry table over the
/// scaled unit domain. Inputs outside the domain clamp to the table ends.
pub(crate) struct LutOperation {
    table: Vec<f32>,
    scale: f32,
}

impl LutOperation {
    pub(crate) fn to_linear(func: &TransferFunction) -> Self {
        let postscale = func.to_linear_scale;
        let to_linear = func.to_linear;
        let table = (0..LUT_SIZE)
            .map(|k| postscale * to_linear(k as f32 / (LUT_SIZE - 1) as f32))
            .collect();
        LutOperation {
            table,
            scale: (LUT_SIZE - 1) as f32,
        }
    }

    pub(crate) fn to_gamma(func: &TransferFunction) -> Self {
        let prescale = func.to_gamma_scale;
        let to_gamma = func.to_gamma;
        let table = (0..LUT_SIZE)
            .map(|k| to_gamma(k as f32 / (LUT_SIZE - 1) as f32))
            .collect();
        LutOperation {
            table,
            // The table spans the pre-scaled domain [0, 1/prescale].
            scale: (LUT_SIZE - 1) as f32 * prescale,
        }
    }
}

impl Operation for LutOperation {
    fn process(&self, planes: &mut [&mut [f32]; 3], left: usize, right: usize) {
        let top = (self.table.len() - 1) as f32;

        for plane in planes.iter_mut() {
            for x in plane[left..right].iter_mut() {
                let idx = (*x * self.scale).clamp(0.0, top) as usize;
                *x = self.table[idx];
            }
        }
    }
}

const CL_PB: f32 = 0.7909854;
const CL_NB: f32 = -0.9701716;
const CL_PR: f32 = 0.4969147;
const CL_NR: f32 = -0.8591209;

/// BT.2020 constant-luminance decode: YUV to linear RGB.
pub(crate) struct Rec2020ClToRgbOperation;

impl Operation for Rec2020ClToRgbOperation {
    fn process(&self, planes: &mut [&mut [f32]; 3], left: usize, right: usize) {
        let kr = REC_2020_KR as f32;
        let kb = REC_2020_KB as f32;
        let kg = 1.0 - kr - kb;

        for i in left..right {
            let mut y = planes[0][i];
            let u = planes[1][i];
            let v = planes[2][i];

            let b_minus_y = if u < 0.0 {
                u * 2.0 * -CL_NB
            } else {
                u * 2.0 * CL_PB
            };
            let r_minus_y = if v < 0.0 {
                v * 2.0 * -CL_NR
            } else {
                v * 2.0 * CL_PR
            };

            let b = rec_709_inverse_oetf(b_minus_y + y);
            let r = rec_709_inverse_oetf(r_minus_y + y);

            y = rec_709_inverse_oetf(y);
            let g = (y - kr * r - kb * b) / kg;

            planes[0][i] = r;
            planes[1][i] = g;
            planes[2][i] = b;
        }
    }
}

/// BT.2020 constant-luminance encode: linear RGB to YUV.
pub(crate) struct Rec2020ClToYuvOperation;

impl Operation for Rec2020ClToYuvOperation {
    fn process(&self, planes: &mut [&mut [f32]; 3], left: usize, right: usize) {
        let kr = REC_2020_KR as f32;
        let kb = REC_2020_KB as f32;
        let kg = 1.0 - kr - kb;

        for i in left..right {
            let mut r = planes[0][i];
            let g = planes[1][i];
            let mut b = planes[2][i];

            let y = rec_709_oetf(kr * r + kg * g + kb * b);

            b = rec_709_oetf(b);
            r = rec_709_oetf(r);

            let u = if b - y < 0.0 {
                (b - y) / (2.0 * -CL_NB)
            } else {
                (b - y) / (2.0 * CL_PB)
            };
            let v = if r - y < 0.0 {
                (r - y) / (2.0 * -CL_NR)
            } else {
                (r - y) / (2.0 * CL_PR)
            };

            planes[0][i] = y;
            planes[1][i] = u;
            planes[2][i] = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colorspace::TransferCharacteristics;
    use crate::colorspace_param::ncl_rgb_to_yuv_matrix;
    use crate::gamma::select_transfer_function;
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;

    fn run(op: &dyn Operation, rgb: [f32; 3]) -> [f32; 3] {
        let mut a = [rgb[0]];
        let mut b = [rgb[1]];
        let mut c = [rgb[2]];
        {
            let mut planes: [&mut [f32]; 3] = [&mut a, &mut b, &mut c];
            op.process(&mut planes, 0, 1);
        }
        [a[0], b[0], c[0]]
    }

    #[test]
    fn matrix_operation_on_grey() {
        let m = ncl_rgb_to_yuv_matrix(crate::colorspace::MatrixCoefficients::Rec709).unwrap();
        let op = MatrixOperation::new(&m);
        let yuv = run(&op, [0.5, 0.5, 0.5]);
        assert!((yuv[0] - 0.5).abs() < 1e-6);
        assert!(yuv[1].abs() < 1e-6);
        assert!(yuv[2].abs() < 1e-6);
    }

    #[test]
    fn cl_2020_roundtrip() {
        let encode = Rec2020ClToYuvOperation;
        let decode = Rec2020ClToRgbOperation;

        let mut rng = XorShiftRng::seed_from_u64(42);
        for _ in 0..1000 {
            let rgb = [rng.gen::<f32>(), rng.gen::<f32>(), rng.gen::<f32>()];
            let decoded = run(&decode, run(&encode, rgb));
            for (orig, got) in rgb.iter().zip(decoded.iter()) {
                assert!((orig - got).abs() < 1e-4, "{rgb:?} -> {decoded:?}");
            }
        }
    }

    #[test]
    fn lut_tracks_exact_curve() {
        let func =
            select_transfer_function(TransferCharacteristics::Srgb, 100.0, false).unwrap();
        let exact = GammaToLinearOperation::new(&func);
        let lut = LutOperation::to_linear(&func);

        for k in 0..=1000 {
            let x = k as f32 / 1000.0;
            let e = run(&exact, [x, x, x])[0];
            let l = run(&lut, [x, x, x])[0];
            assert!((e - l).abs() < 2e-4, "x = {x}: exact {e}, lut {l}");
        }
    }

    #[test]
    fn lut_scaled_gamma_domain() {
        // ST.2084 at 1000 nits: linear 1.0 is peak white, the table covers
        // the 10x pre-scaled domain.
        let func =
            select_transfer_function(TransferCharacteristics::St2084, 1000.0, false).unwrap();
        let exact = LinearToGammaOperation::new(&func);
        let lut = LutOperation::to_gamma(&func);

        for k in 0..=100 {
            let x = k as f32 / 100.0;
            let e = run(&exact, [x, x, x])[0];
            let l = run(&lut, [x, x, x])[0];
            assert!((e - l).abs() < 5e-3, "x = {x}: exact {e}, lut {l}");
        }
    }
}
