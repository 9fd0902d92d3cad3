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
use crate::colorspace::{ColorPrimaries, MatrixCoefficients};
use crate::errors::PipelineError;
use crate::matrix3::{inverse, matrix_mul, matrix_mul_vector, transpose, Matrix3x3, Vector3};

// Kr and Kb YUV<-->RGB constants.
pub(crate) const REC_601_KR: f64 = 0.299;
pub(crate) const REC_601_KB: f64 = 0.114;
pub(crate) const REC_709_KR: f64 = 0.2126;
pub(crate) const REC_709_KB: f64 = 0.0722;
pub(crate) const REC_2020_KR: f64 = 0.2627;
pub(crate) const REC_2020_KB: f64 = 0.0593;

// R, G, B primaries in xy.
const SMPTE_C_PRIMARIES: [[f64; 2]; 3] = [[0.630, 0.340], [0.310, 0.595], [0.155, 0.070]];
const REC_709_PRIMARIES: [[f64; 2]; 3] = [[0.640, 0.330], [0.300, 0.600], [0.150, 0.060]];
const REC_2020_PRIMARIES: [[f64; 2]; 3] = [[0.708, 0.292], [0.170, 0.797], [0.131, 0.046]];
const DCI_P3_PRIMARIES: [[f64; 2]; 3] = [[0.680, 0.320], [0.265, 0.690], [0.150, 0.060]];

// D65 white point in xy.
const ILLUMINANT_D65: [f64; 2] = [0.3127, 0.3290];

fn get_yuv_constants(matrix: MatrixCoefficients) -> Result<(f64, f64), PipelineError> {
    match matrix {
        MatrixCoefficients::Rgb => Ok((0.0, 0.0)),
        MatrixCoefficients::Rec601 => Ok((REC_601_KR, REC_601_KB)),
        MatrixCoefficients::Rec709 => Ok((REC_709_KR, REC_709_KB)),
        MatrixCoefficients::Rec2020Ncl | MatrixCoefficients::Rec2020Cl => {
            Ok((REC_2020_KR, REC_2020_KB))
        }
        _ => Err(PipelineError::IllegalArgument(
            "unrecognized matrix coefficients",
        )),
    }
}

fn xy_to_xyz(x: f64, y: f64) -> Vector3 {
    [x / y, 1.0, (1.0 - x - y) / y]
}

fn get_d65_xyz() -> Vector3 {
    xy_to_xyz(ILLUMINANT_D65[0], ILLUMINANT_D65[1])
}

fn get_primaries_xy(primaries: ColorPrimaries) -> Result<[[f64; 2]; 3], PipelineError> {
    match primaries {
        ColorPrimaries::SmpteC => Ok(SMPTE_C_PRIMARIES),
        ColorPrimaries::Rec709 => Ok(REC_709_PRIMARIES),
        ColorPrimaries::Rec2020 => Ok(REC_2020_PRIMARIES),
        ColorPrimaries::DciP3D65 => Ok(DCI_P3_PRIMARIES),
        _ => Err(PipelineError::IllegalArgument("unrecognized primaries")),
    }
}

fn get_primaries_xyz(primaries: ColorPrimaries) -> Result<Matrix3x3, PipelineError> {
    // Columns: R G B. Rows: X Y Z.
    let xy = get_primaries_xy(primaries)?;
    let ret = [
        xy_to_xyz(xy[0][0], xy[0][1]),
        xy_to_xyz(xy[1][0], xy[1][1]),
        xy_to_xyz(xy[2][0], xy[2][1]),
    ];
    Ok(transpose(&ret))
}

pub(crate) fn ncl_rgb_to_yuv_matrix(
    matrix: MatrixCoefficients,
) -> Result<Matrix3x3, PipelineError> {
    if matrix == MatrixCoefficients::Ycgco {
        return Ok([
            [0.25, 0.5, 0.25],
            [-0.25, 0.5, -0.25],
            [0.5, 0.0, -0.5],
        ]);
    }

    let (kr, kb) = get_yuv_constants(matrix)?;
    let kg = 1.0 - kr - kb;
    let uscale = 1.0 / (2.0 - 2.0 * kb);
    let vscale = 1.0 / (2.0 - 2.0 * kr);

    Ok([
        [kr, kg, kb],
        [-kr * uscale, -kg * uscale, (1.0 - kb) * uscale],
        [(1.0 - kr) * vscale, -kg * vscale, -kb * vscale],
    ])
}

pub(crate) fn ncl_yuv_to_rgb_matrix(
    matrix: MatrixCoefficients,
) -> Result<Matrix3x3, PipelineError> {
    Ok(inverse(&ncl_rgb_to_yuv_matrix(matrix)?))
}

/// LMS to ICtCp fixed-point constants from Rec. 2100, scaled by 1/4096.
/// No graph edges are registered for ICtCp by default; callers wanting the
/// path must add them explicitly.
pub(crate) fn lms_to_ictcp_matrix() -> Matrix3x3 {
    [
        [2048.0 / 4096.0, 2048.0 / 4096.0, 0.0],
        [6610.0 / 4096.0, -13613.0 / 4096.0, 7003.0 / 4096.0],
        [17933.0 / 4096.0, -17390.0 / 4096.0, -543.0 / 4096.0],
    ]
}

pub(crate) fn ictcp_to_lms_matrix() -> Matrix3x3 {
    inverse(&lms_to_ictcp_matrix())
}

// http://www.brucelindbloom.com/Eqn_RGB_XYZ_Matrix.html
pub(crate) fn gamut_rgb_to_xyz_matrix(
    primaries: ColorPrimaries,
) -> Result<Matrix3x3, PipelineError> {
    let xyz_matrix = get_primaries_xyz(primaries)?;
    let white_xyz = get_d65_xyz();

    let s = matrix_mul_vector(&inverse(&xyz_matrix), &white_xyz);
    let mut m = xyz_matrix;
    for row in m.iter_mut() {
        for (v, sv) in row.iter_mut().zip(s.iter()) {
            *v *= sv;
        }
    }

    Ok(m)
}

pub(crate) fn gamut_xyz_to_rgb_matrix(
    primaries: ColorPrimaries,
) -> Result<Matrix3x3, PipelineError> {
    Ok(inverse(&gamut_rgb_to_xyz_matrix(primaries)?))
}

/// `xyz_to_rgb(dst) * rgb_to_xyz(src)` gamut conversion through D65 XYZ.
pub(crate) fn gamut_matrix(
    primaries_in: ColorPrimaries,
    primaries_out: ColorPrimaries,
) -> Result<Matrix3x3, PipelineError> {
    Ok(matrix_mul(
        &gamut_xyz_to_rgb_matrix(primaries_out)?,
        &gamut_rgb_to_xyz_matrix(primaries_in)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn rec709_luma_row() {
        let m = ncl_rgb_to_yuv_matrix(MatrixCoefficients::Rec709).unwrap();
        assert_approx_eq!(f64, m[0][0], 0.2126, epsilon = 1e-12);
        assert_approx_eq!(f64, m[0][1], 0.7152, epsilon = 1e-12);
        assert_approx_eq!(f64, m[0][2], 0.0722, epsilon = 1e-12);
        // Chroma rows must cancel on grey.
        for row in &m[1..] {
            assert_approx_eq!(f64, row.iter().sum::<f64>(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn yuv_matrices_invert() {
        for matrix in [
            MatrixCoefficients::Rec601,
            MatrixCoefficients::Rec709,
            MatrixCoefficients::Ycgco,
            MatrixCoefficients::Rec2020Ncl,
        ] {
            let fwd = ncl_rgb_to_yuv_matrix(matrix).unwrap();
            let back = ncl_yuv_to_rgb_matrix(matrix).unwrap();
            let prod = crate::matrix3::matrix_mul(&back, &fwd);
            for (i, row) in prod.iter().enumerate() {
                for (j, v) in row.iter().enumerate() {
                    let expected = if i == j { 1.0 } else { 0.0 };
                    assert_approx_eq!(f64, *v, expected, epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn rgb_to_xyz_maps_white_to_d65() {
        let m = gamut_rgb_to_xyz_matrix(ColorPrimaries::Rec709).unwrap();
        let white = matrix_mul_vector(&m, &[1.0, 1.0, 1.0]);
        assert_approx_eq!(f64, white[1], 1.0, epsilon = 1e-10);
        assert_approx_eq!(f64, white[0], 0.3127 / 0.3290, epsilon = 1e-10);
    }

    #[test]
    fn gamut_matrix_identity_for_same_primaries() {
        let m = gamut_matrix(ColorPrimaries::Rec2020, ColorPrimaries::Rec2020).unwrap();
        for (i, row) in m.iter().enumerate() {
            for (j, v) in row.iter().enumerate() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_approx_eq!(f64, *v, expected, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn gamut_matrix_preserves_grey() {
        let m = gamut_matrix(ColorPrimaries::Rec709, ColorPrimaries::Rec2020).unwrap();
        let grey = matrix_mul_vector(&m, &[0.5, 0.5, 0.5]);
        for c in grey {
            assert_approx_eq!(f64, c, 0.5, epsilon = 1e-10);
        }
    }

    #[test]
    fn ictcp_matrices_invert() {
        let prod = crate::matrix3::matrix_mul(&ictcp_to_lms_matrix(), &lms_to_ictcp_matrix());
        for (i, row) in prod.iter().enumerate() {
            for (j, v) in row.iter().enumerate() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_approx_eq!(f64, *v, expected, epsilon = 1e-10);
            }
        }
    }
}
