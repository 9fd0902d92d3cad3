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

/// RGB/YUV matrix coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum MatrixCoefficients {
    #[default]
    Unspecified,
    Rgb,
    Rec601,
    Rec709,
    Ycgco,
    Rec2020Ncl,
    Rec2020Cl,
}

impl MatrixCoefficients {
    pub(crate) const ALL: [MatrixCoefficients; 7] = [
        MatrixCoefficients::Unspecified,
        MatrixCoefficients::Rgb,
        MatrixCoefficients::Rec601,
        MatrixCoefficients::Rec709,
        MatrixCoefficients::Ycgco,
        MatrixCoefficients::Rec2020Ncl,
        MatrixCoefficients::Rec2020Cl,
    ];
}

/// Transfer characteristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum TransferCharacteristics {
    #[default]
    Unspecified,
    Linear,
    Rec709,
    Srgb,
    St2084,
    AribB67,
}

impl TransferCharacteristics {
    pub(crate) const ALL: [TransferCharacteristics; 6] = [
        TransferCharacteristics::Unspecified,
        TransferCharacteristics::Linear,
        TransferCharacteristics::Rec709,
        TransferCharacteristics::Srgb,
        TransferCharacteristics::St2084,
        TransferCharacteristics::AribB67,
    ];
}

/// Color primaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ColorPrimaries {
    #[default]
    Unspecified,
    SmpteC,
    Rec709,
    Rec2020,
    DciP3D65,
}

impl ColorPrimaries {
    pub(crate) const ALL: [ColorPrimaries; 5] = [
        ColorPrimaries::Unspecified,
        ColorPrimaries::SmpteC,
        ColorPrimaries::Rec709,
        ColorPrimaries::Rec2020,
        ColorPrimaries::DciP3D65,
    ];
}

/// Complete colorspace descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Colorspace {
    pub matrix: MatrixCoefficients,
    pub transfer: TransferCharacteristics,
    pub primaries: ColorPrimaries,
}

impl Colorspace {
    pub const fn new(
        matrix: MatrixCoefficients,
        transfer: TransferCharacteristics,
        primaries: ColorPrimaries,
    ) -> Self {
        Colorspace {
            matrix,
            transfer,
            primaries,
        }
    }

    pub(crate) fn with_matrix(self, matrix: MatrixCoefficients) -> Self {
        Colorspace { matrix, ..self }
    }

    pub(crate) fn with_transfer(self, transfer: TransferCharacteristics) -> Self {
        Colorspace { transfer, ..self }
    }

    pub(crate) fn with_primaries(self, primaries: ColorPrimaries) -> Self {
        Colorspace { primaries, ..self }
    }

    pub(crate) fn to_rgb(self) -> Self {
        self.with_matrix(MatrixCoefficients::Rgb)
    }

    pub(crate) fn to_linear(self) -> Self {
        self.with_transfer(TransferCharacteristics::Linear)
    }

    /// Validity rules for the descriptor:
    /// constant luminance binds to its BT.709 gamma curve, and an
    /// unspecified field forces the fields after it unspecified too.
    pub fn is_valid(&self) -> bool {
        !(self.matrix == MatrixCoefficients::Rec2020Cl
            && self.transfer != TransferCharacteristics::Rec709)
            && !(self.matrix == MatrixCoefficients::Unspecified
                && self.transfer != TransferCharacteristics::Unspecified)
            && !(self.transfer == TransferCharacteristics::Unspecified
                && self.primaries != ColorPrimaries::Unspecified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_rules() {
        assert!(!Colorspace::new(
            MatrixCoefficients::Rec2020Cl,
            TransferCharacteristics::Linear,
            ColorPrimaries::Rec2020
        )
        .is_valid());
        assert!(!Colorspace::new(
            MatrixCoefficients::Rec709,
            TransferCharacteristics::Unspecified,
            ColorPrimaries::Rec709
        )
        .is_valid());
        assert!(!Colorspace::new(
            MatrixCoefficients::Unspecified,
            TransferCharacteristics::Rec709,
            ColorPrimaries::Rec709
        )
        .is_valid());
        assert!(Colorspace::new(
            MatrixCoefficients::Rec2020Cl,
            TransferCharacteristics::Rec709,
            ColorPrimaries::Rec2020
        )
        .is_valid());
        assert!(Colorspace::default().is_valid());
        assert!(Colorspace::new(
            MatrixCoefficients::Rec709,
            TransferCharacteristics::Unspecified,
            ColorPrimaries::Unspecified
        )
        .is_valid());
    }
}
