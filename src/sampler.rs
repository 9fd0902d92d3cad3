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

use crate::errors::PipelineError;

const PI: f64 = std::f64::consts::PI;

#[inline]
fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        (x * PI).sin() / (x * PI)
    }
}

#[inline]
fn sq(x: f64) -> f64 {
    x * x
}

#[inline]
fn cube(x: f64) -> f64 {
    x * x * x
}

/// Describes the resampling kernel that will be used.
#[derive(Debug, Copy, Clone, Default, Ord, PartialOrd, Eq, PartialEq)]
pub enum ResampleFilter {
    Point,
    Bilinear,
    #[default]
    Bicubic,
    Spline16,
    Spline36,
    Lanczos,
}

/// Concrete kernel with its parameters resolved.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Kernel {
    Point,
    Bilinear,
    Bicubic {
        p0: f64,
        p2: f64,
        p3: f64,
        q0: f64,
        q1: f64,
        q2: f64,
        q3: f64,
    },
    Spline16,
    Spline36,
    Lanczos {
        taps: i32,
    },
}

impl Kernel {
    /// Resolve a kernel from builder parameters. NaN parameters select the
    /// defaults: `b = c = 1/3` for bicubic, 3 taps for Lanczos.
    pub(crate) fn from_filter(
        filter: ResampleFilter,
        param_a: f64,
        param_b: f64,
    ) -> Result<Kernel, PipelineError> {
        match filter {
            ResampleFilter::Point => Ok(Kernel::Point),
            ResampleFilter::Bilinear => Ok(Kernel::Bilinear),
            ResampleFilter::Bicubic => {
                let b = if param_a.is_nan() { 1.0 / 3.0 } else { param_a };
                let c = if param_b.is_nan() { 1.0 / 3.0 } else { param_b };
                Ok(Kernel::bicubic(b, c))
            }
            ResampleFilter::Spline16 => Ok(Kernel::Spline16),
            ResampleFilter::Spline36 => Ok(Kernel::Spline36),
            ResampleFilter::Lanczos => {
                let taps = if param_a.is_nan() { 3.0 } else { param_a.floor() };
                if taps <= 0.0 || taps > 128.0 {
                    return Err(PipelineError::IllegalArgument(
                        "lanczos tap count must be positive",
                    ));
                }
                Ok(Kernel::Lanczos { taps: taps as i32 })
            }
        }
    }

    pub(crate) fn bicubic(b: f64, c: f64) -> Kernel {
        Kernel::Bicubic {
            p0: (6.0 - 2.0 * b) / 6.0,
            p2: (-18.0 + 12.0 * b + 6.0 * c) / 6.0,
            p3: (12.0 - 9.0 * b - 6.0 * c) / 6.0,
            q0: (8.0 * b + 24.0 * c) / 6.0,
            q1: (-12.0 * b - 48.0 * c) / 6.0,
            q2: (6.0 * b + 30.0 * c) / 6.0,
            q3: (-b - 6.0 * c) / 6.0,
        }
    }

    /// One-sided extent of the kernel in source samples.
    pub(crate) fn support(&self) -> i32 {
        match self {
            Kernel::Point => 0,
            Kernel::Bilinear => 1,
            Kernel::Bicubic { .. } => 2,
            Kernel::Spline16 => 2,
            Kernel::Spline36 => 3,
            Kernel::Lanczos { taps } => *taps,
        }
    }

    pub(crate) fn eval(&self, x: f64) -> f64 {
        match *self {
            Kernel::Point => 1.0,
            Kernel::Bilinear => (1.0 - x.abs()).max(0.0),
            Kernel::Bicubic {
                p0,
                p2,
                p3,
                q0,
                q1,
                q2,
                q3,
            } => {
                let x = x.abs();
                if x < 1.0 {
                    p0 + p2 * sq(x) + p3 * cube(x)
                } else if x < 2.0 {
                    q0 + q1 * x + q2 * sq(x) + q3 * cube(x)
                } else {
                    0.0
                }
            }
            Kernel::Spline16 => {
                let mut x = x.abs();
                if x < 1.0 {
                    1.0 - (1.0 / 5.0 * x) - (9.0 / 5.0 * sq(x)) + cube(x)
                } else if x < 2.0 {
                    x -= 1.0;
                    (-7.0 / 15.0 * x) + (4.0 / 5.0 * sq(x)) - (1.0 / 3.0 * cube(x))
                } else {
                    0.0
                }
            }
            Kernel::Spline36 => {
                let mut x = x.abs();
                if x < 1.0 {
                    1.0 - (3.0 / 209.0 * x) - (453.0 / 209.0 * sq(x)) + (13.0 / 11.0 * cube(x))
                } else if x < 2.0 {
                    x -= 1.0;
                    (-156.0 / 209.0 * x) + (270.0 / 209.0 * sq(x)) - (6.0 / 11.0 * cube(x))
                } else if x < 3.0 {
                    x -= 2.0;
                    (26.0 / 209.0 * x) - (45.0 / 209.0 * sq(x)) + (1.0 / 11.0 * cube(x))
                } else {
                    0.0
                }
            }
            Kernel::Lanczos { taps } => {
                let x = x.abs();
                if x < taps as f64 {
                    sinc(x) * sinc(x / taps as f64)
                } else {
                    0.0
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn kernels_are_unity_at_zero() {
        let kernels = [
            Kernel::Bilinear,
            Kernel::bicubic(1.0 / 3.0, 1.0 / 3.0),
            Kernel::Spline16,
            Kernel::Spline36,
            Kernel::Lanczos { taps: 3 },
        ];
        for k in kernels {
            assert_approx_eq!(f64, k.eval(0.0), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn kernels_vanish_past_support() {
        let kernels = [
            Kernel::Bilinear,
            Kernel::bicubic(1.0 / 3.0, 1.0 / 3.0),
            Kernel::Spline16,
            Kernel::Spline36,
            Kernel::Lanczos { taps: 4 },
        ];
        for k in kernels {
            let s = k.support() as f64;
            assert_eq!(k.eval(s + 0.25), 0.0);
            assert_eq!(k.eval(-s - 0.25), 0.0);
        }
    }

    #[test]
    fn spline_kernels_interpolate() {
        // Interpolating kernels are zero at the other integer knots.
        for k in [Kernel::Spline16, Kernel::Spline36, Kernel::Lanczos { taps: 3 }] {
            for knot in 1..k.support() {
                assert_approx_eq!(f64, k.eval(knot as f64), 0.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn lanczos_defaults_to_three_taps() {
        let k = Kernel::from_filter(ResampleFilter::Lanczos, f64::NAN, f64::NAN).unwrap();
        assert_eq!(k.support(), 3);
        assert!(Kernel::from_filter(ResampleFilter::Lanczos, 0.0, f64::NAN).is_err());
    }

    #[test]
    fn bicubic_catmull_rom_interpolates() {
        let k = Kernel::bicubic(0.0, 0.5);
        assert_approx_eq!(f64, k.eval(0.0), 1.0, epsilon = 1e-12);
        assert_approx_eq!(f64, k.eval(1.0), 0.0, epsilon = 1e-12);
        assert_approx_eq!(f64, k.eval(2.0), 0.0, epsilon = 1e-12);
    }
}
