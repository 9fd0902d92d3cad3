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

const MANT_SHIFT: u32 = 23 - 10;
const EXP_ADJUST: u32 = 127 - 15;

/// Scalar IEEE 754 binary16 to binary32 conversion. Signaling NaNs are
/// quieted, denormals renormalized.
pub fn half_to_float(f16w: u16) -> f32 {
    const EXP_NONFINITE_F16: u16 = 0x1f;
    const EXP_NONFINITE_F32: u32 = 0xff;
    const MANT_QNAN_F32: u32 = 0x0040_0000;

    let sign = u32::from(f16w >> 15);
    let exp = (f16w & 0x7c00) >> 10;
    let mant = f16w & 0x03ff;

    let exp_f32;
    let mant_f32;

    if exp == EXP_NONFINITE_F16 {
        exp_f32 = EXP_NONFINITE_F32;
        mant_f32 = if mant != 0 {
            (u32::from(mant) << MANT_SHIFT) | MANT_QNAN_F32
        } else {
            0
        };
    } else if exp == 0 {
        if mant == 0 {
            exp_f32 = 0;
            mant_f32 = 0;
        } else {
            let mut mant_adjust = mant;
            let mut renorm = 0;
            while mant_adjust & 0x0400 == 0 {
                mant_adjust <<= 1;
                renorm += 1;
            }
            mant_adjust &= !0x0400;
            exp_f32 = EXP_ADJUST - renorm + 1;
            mant_f32 = u32::from(mant_adjust) << MANT_SHIFT;
        }
    } else {
        exp_f32 = u32::from(exp) + EXP_ADJUST;
        mant_f32 = u32::from(mant) << MANT_SHIFT;
    }

    f32::from_bits((sign << 31) | (exp_f32 << 23) | mant_f32)
}

/// Scalar binary32 to binary16 conversion with round half to even.
pub fn float_to_half(f32v: f32) -> u16 {
    const EXP_NONFINITE_F32: u32 = 0xff;
    const EXP_NONFINITE_F16: u32 = 0x1f;
    const MANT_QNAN_F16: u32 = 0x0200;
    const MANT_MAX_F16: u32 = 0x03ff;

    let f32dw = f32v.to_bits();
    let sign = f32dw >> 31;
    let exp = (f32dw & 0x7f80_0000) >> 23;
    let mant = f32dw & 0x007f_ffff;

    let mut exp_f16;
    let mut mant_f16;

    if exp == EXP_NONFINITE_F32 {
        exp_f16 = EXP_NONFINITE_F16;
        mant_f16 = if mant != 0 {
            (mant >> MANT_SHIFT) | MANT_QNAN_F16
        } else {
            0
        };
    } else {
        let mant_adjust;
        let shift;

        if exp <= EXP_ADJUST {
            shift = (MANT_SHIFT + EXP_ADJUST - exp + 1).min(31);
            mant_adjust = mant | (1 << 23);
            exp_f16 = 0;
        } else {
            shift = MANT_SHIFT;
            mant_adjust = mant;
            exp_f16 = exp - EXP_ADJUST;
        }

        let half = 1u32 << (shift - 1);
        mant_f16 = (mant_adjust + half - 1 + ((mant_adjust >> shift) & 1)) >> shift;

        if mant_f16 > MANT_MAX_F16 {
            mant_f16 &= MANT_MAX_F16;
            exp_f16 += 1;
        }
        if exp_f16 >= EXP_NONFINITE_F16 {
            exp_f16 = EXP_NONFINITE_F16;
            mant_f16 = 0;
        }
    }

    ((sign << 15) | (exp_f16 << 10) | mant_f16) as u16
}
