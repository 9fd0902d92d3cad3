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
use thiserror::Error;

/// Every failure the engine can surface.
///
/// Each variant maps to a stable numeric code via [PipelineError::code],
/// grouped in bands: `1024` for logical inconsistencies, `2048` for illegal
/// arguments and `3072` for unsupported operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("unknown error: {0}")]
    Unknown(&'static str),
    #[error("out of memory")]
    OutOfMemory,
    #[error("user callback failed")]
    UserCallbackFailed,

    #[error("logic error: {0}")]
    Logic(&'static str),
    #[error("greyscale images can not be subsampled")]
    GreyscaleSubsampling,
    #[error("color family mismatch: {0}")]
    ColorFamilyMismatch(&'static str),
    #[error("image dimensions not divisible by subsampling")]
    ImageNotDivisible,
    #[error("bit depth exceeds container size")]
    BitDepthOverflow,

    #[error("illegal argument: {0}")]
    IllegalArgument(&'static str),
    #[error("enum out of range: {0}")]
    EnumOutOfRange(&'static str),
    #[error("invalid image size: {0}")]
    InvalidImageSize(&'static str),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
    #[error("subsampling factor must not exceed 4")]
    UnsupportedSubsampling,
    #[error("no path between colorspaces")]
    NoColorspaceConversion,
    #[error("no field parity conversion available")]
    NoFieldParityConversion,
    #[error("resampling not available: {0}")]
    ResamplingNotAvailable(&'static str),
}

impl PipelineError {
    /// Stable numeric code for the public boundary.
    pub fn code(&self) -> i32 {
        match self {
            PipelineError::Unknown(_) => -1,
            PipelineError::OutOfMemory => 1,
            PipelineError::UserCallbackFailed => 2,
            PipelineError::Logic(_) => 1024,
            PipelineError::GreyscaleSubsampling => 1024 + 1,
            PipelineError::ColorFamilyMismatch(_) => 1024 + 2,
            PipelineError::ImageNotDivisible => 1024 + 3,
            PipelineError::BitDepthOverflow => 1024 + 4,
            PipelineError::IllegalArgument(_) => 2048,
            PipelineError::EnumOutOfRange(_) => 2048 + 1,
            PipelineError::InvalidImageSize(_) => 2048 + 2,
            PipelineError::UnsupportedOperation(_) => 3072,
            PipelineError::UnsupportedSubsampling => 3072 + 1,
            PipelineError::NoColorspaceConversion => 3072 + 2,
            PipelineError::NoFieldParityConversion => 3072 + 3,
            PipelineError::ResamplingNotAvailable(_) => 3072 + 4,
        }
    }
}
