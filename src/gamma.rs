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
#![allow(clippy::excessive_precision)]

use crate::colorspace::TransferCharacteristics;
use crate::errors::PipelineError;

pub(crate) const REC709_ALPHA: f32 = 1.09929682680944;
pub(crate) const REC709_BETA: f32 = 0.018053968510807;

const SRGB_ALPHA: f32 = 1.055;
const SRGB_BETA: f32 = 0.0031308;

const ST2084_M1: f32 = 0.1593017578125;
const ST2084_M2: f32 = 78.84375;
const ST2084_C1: f32 = 0.8359375;
const ST2084_C2: f32 = 18.8515625;
const ST2084_C3: f32 = 18.6875;

const ARIB_B67_A: f32 = 0.17883277;
const ARIB_B67_B: f32 = 0.28466892;
const ARIB_B67_C: f32 = 0.55991073;

pub(crate) const ST2084_PEAK_LUMINANCE: f64 = 10000.0;

fn ootf_1_2(x: f32) -> f32 {
    if x < 0.0 {
        x
    } else {
        x.powf(1.2)
    }
}

fn inverse_ootf_1_2(x: f32) -> f32 {
    if x < 0.0 {
        x
    } else {
        x.powf(1.0 / 1.2)
    }
}

pub fn rec_709_oetf(x: f32) -> f32 {
    if x < REC709_BETA {
        x * 4.5
    } else {
        REC709_ALPHA * x.powf(0.45) - (REC709_ALPHA - 1.0)
    }
}

pub fn rec_709_inverse_oetf(x: f32) -> f32 {
    if x < 4.5 * REC709_BETA {
        x / 4.5
    } else {
        ((x + (REC709_ALPHA - 1.0)) / REC709_ALPHA).powf(1.0 / 0.45)
    }
}

// Ignore the BT.1886 provisions for limited contrast and assume an ideal CRT.
pub fn rec_1886_eotf(x: f32) -> f32 {
    if x < 0.0 {
        0.0
    } else {
        x.powf(2.4)
    }
}

pub fn rec_1886_inverse_eotf(x: f32) -> f32 {
    if x < 0.0 {
        0.0
    } else {
        x.powf(1.0 / 2.4)
    }
}

pub fn srgb_eotf(x: f32) -> f32 {
    if x < 12.92 * SRGB_BETA {
        x / 12.92
    } else {
        ((x + (SRGB_ALPHA - 1.0)) / SRGB_ALPHA).powf(2.4)
    }
}

pub fn srgb_inverse_eotf(x: f32) -> f32 {
    if x < SRGB_BETA {
        x * 12.92
    } else {
        SRGB_ALPHA * x.powf(1.0 / 2.4) - (SRGB_ALPHA - 1.0)
    }
}

pub fn st_2084_eotf(x: f32) -> f32 {
    // Filter negative values to avoid NAN.
    if x > 0.0 {
        let xpow = x.powf(1.0 / ST2084_M2);
        let num = (xpow - ST2084_C1).max(0.0);
        let den = (ST2084_C2 - ST2084_C3 * xpow).max(f32::MIN_POSITIVE);
        (num / den).powf(1.0 / ST2084_M1)
    } else {
        0.0
    }
}

pub fn st_2084_inverse_eotf(x: f32) -> f32 {
    // Filter negative values to avoid NAN, and also special-case 0 so that
    // (f(g(0)) == 0).
    if x > 0.0 {
        let xpow = x.powf(ST2084_M1);
        // More stable arrangement that avoids some cancellation error over
        // the formulation in SMPTE ST 2084:2014.
        let num = (ST2084_C1 - 1.0) + (ST2084_C2 - ST2084_C3) * xpow;
        let den = 1.0 + ST2084_C3 * xpow;
        (1.0 + num / den).powf(ST2084_M2)
    } else {
        0.0
    }
}

pub fn arib_b67_oetf(x: f32) -> f32 {
    // Prevent negative pixels from yielding NAN.
    let x = x.max(0.0);

    if x <= 1.0 / 12.0 {
        (3.0 * x).sqrt()
    } else {
        ARIB_B67_A * (12.0 * x - ARIB_B67_B).ln() + ARIB_B67_C
    }
}

pub fn arib_b67_inverse_oetf(x: f32) -> f32 {
    // Prevent negative pixels expanding into positive values.
    let x = x.max(0.0);

    if x <= 0.5 {
        (x * x) * (1.0 / 3.0)
    } else {
        (((x - ARIB_B67_C) / ARIB_B67_A).exp() + ARIB_B67_B) / 12.0
    }
}

// Applies a per-channel 1.2-power OOTF instead of the iterative method
// specified in Rec. 2100.
pub fn arib_b67_eotf(x: f32) -> f32 {
    ootf_1_2(arib_b67_inverse_oetf(x))
}

pub fn arib_b67_inverse_eotf(x: f32) -> f32 {
    arib_b67_oetf(inverse_ootf_1_2(x))
}

pub fn st_2084_oetf(x: f32) -> f32 {
    st_2084_inverse_eotf(ootf_1_2(x))
}

pub fn st_2084_inverse_oetf(x: f32) -> f32 {
    inverse_ootf_1_2(st_2084_eotf(x))
}

/// Scalar curve pair with the scales applied around it: `to_linear_scale`
/// multiplies the linear output, `to_gamma_scale` the linear input.
#[derive(Clone, Copy)]
pub(crate) struct TransferFunction {
    pub to_linear: fn(f32) -> f32,
    pub to_gamma: fn(f32) -> f32,
    pub to_linear_scale: f32,
    pub to_gamma_scale: f32,
}

pub(crate) fn select_transfer_function(
    transfer: TransferCharacteristics,
    peak_luminance: f64,
    scene_referred: bool,
) -> Result<TransferFunction, PipelineError> {
    let mut func = TransferFunction {
        to_linear: rec_1886_eotf,
        to_gamma: rec_1886_inverse_eotf,
        to_linear_scale: 1.0,
        to_gamma_scale: 1.0,
    };

    match transfer {
        TransferCharacteristics::Rec709 => {
            func.to_linear = if scene_referred {
                rec_709_inverse_oetf
            } else {
                rec_1886_eotf
            };
            func.to_gamma = if scene_referred {
                rec_709_oetf
            } else {
                rec_1886_inverse_eotf
            };
        }
        TransferCharacteristics::Srgb => {
            func.to_linear = srgb_eotf;
            func.to_gamma = srgb_inverse_eotf;
        }
        TransferCharacteristics::St2084 => {
            func.to_linear = if scene_referred {
                st_2084_inverse_oetf
            } else {
                st_2084_eotf
            };
            func.to_gamma = if scene_referred {
                st_2084_oetf
            } else {
                st_2084_inverse_eotf
            };
            func.to_linear_scale = (ST2084_PEAK_LUMINANCE / peak_luminance) as f32;
            func.to_gamma_scale = (peak_luminance / ST2084_PEAK_LUMINANCE) as f32;
        }
        TransferCharacteristics::AribB67 => {
            func.to_linear = if scene_referred {
                arib_b67_inverse_oetf
            } else {
                arib_b67_eotf
            };
            func.to_gamma = if scene_referred {
                arib_b67_oetf
            } else {
                arib_b67_inverse_eotf
            };
            func.to_linear_scale = 12.0;
            func.to_gamma_scale = 1.0 / 12.0;
        }
        _ => {
            return Err(PipelineError::Logic("invalid transfer characteristics"));
        }
    }

    Ok(func)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn roundtrip(fwd: fn(f32) -> f32, inv: fn(f32) -> f32, samples: u32, tol: f32) {
        for k in 0..=samples {
            let x = k as f32 / samples as f32;
            let y = inv(fwd(x));
            assert!((y - x).abs() <= tol, "x = {x}, roundtrip = {y}");
        }
    }

    #[test]
    fn curves_roundtrip_on_unit_interval() {
        roundtrip(rec_709_oetf, rec_709_inverse_oetf, 512, 2e-6);
        roundtrip(rec_709_inverse_oetf, rec_709_oetf, 512, 2e-6);
        roundtrip(srgb_eotf, srgb_inverse_eotf, 512, 2e-6);
        roundtrip(srgb_inverse_eotf, srgb_eotf, 512, 2e-6);
        roundtrip(rec_1886_eotf, rec_1886_inverse_eotf, 512, 2e-6);
        roundtrip(st_2084_eotf, st_2084_inverse_eotf, 512, 5e-4);
        roundtrip(arib_b67_oetf, arib_b67_inverse_oetf, 512, 2e-6);
        roundtrip(arib_b67_eotf, arib_b67_inverse_eotf, 512, 1e-4);
    }

    #[test]
    fn endpoints_are_fixed() {
        assert_eq!(rec_709_oetf(0.0), 0.0);
        assert_approx_eq!(f32, rec_709_oetf(1.0), 1.0, epsilon = 1e-6);
        assert_eq!(srgb_eotf(0.0), 0.0);
        assert_approx_eq!(f32, srgb_eotf(1.0), 1.0, epsilon = 1e-6);
        assert_eq!(st_2084_eotf(0.0), 0.0);
        assert_approx_eq!(f32, st_2084_eotf(1.0), 1.0, epsilon = 1e-4);
        assert_eq!(st_2084_inverse_eotf(0.0), 0.0);
        assert_eq!(arib_b67_oetf(0.0), 0.0);
        assert_approx_eq!(f32, arib_b67_oetf(1.0), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn negative_inputs_do_not_produce_nan() {
        for f in [
            rec_1886_eotf,
            st_2084_eotf,
            st_2084_inverse_eotf,
            arib_b67_oetf,
            arib_b67_inverse_oetf,
            arib_b67_eotf,
        ] {
            assert!(!f(-0.25).is_nan());
        }
    }

    #[test]
    fn st2084_known_point() {
        // PQ 0.5 decodes to about 92.3 nits of the 10000-nit reference.
        let linear = st_2084_eotf(0.5);
        assert!((linear - 0.009231).abs() < 1e-5, "linear = {linear}");
    }

    #[test]
    fn transfer_selection_scales_hdr_curves() {
        let func = select_transfer_function(TransferCharacteristics::St2084, 1000.0, false).unwrap();
        assert_eq!(func.to_linear_scale, 10.0);
        assert_eq!(func.to_gamma_scale, 0.1);

        let func = select_transfer_function(TransferCharacteristics::AribB67, 1000.0, false).unwrap();
        assert_eq!(func.to_linear_scale, 12.0);

        assert!(select_transfer_function(TransferCharacteristics::Linear, 100.0, false).is_err());
    }
}
