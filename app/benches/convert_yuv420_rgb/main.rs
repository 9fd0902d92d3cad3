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
use criterion::{criterion_group, criterion_main, Criterion};
use pic_convert_safe::{
    AlignedBuffer, ColorFamily, ColorPrimaries, ExecutionState, GraphBuilder, ImageBufferMut,
    ImageBufferRef, ImageFormat, MatrixCoefficients, PixelType, PlaneBuffer, PlaneBufferMut,
    TransferCharacteristics, ALIGNMENT,
};

fn plane(width: usize, height: usize) -> (AlignedBuffer, usize) {
    let stride = width.div_ceil(ALIGNMENT) * ALIGNMENT;
    (AlignedBuffer::new(stride * height), stride)
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let (width, height) = (1920usize, 1080usize);

    let mut src_fmt = ImageFormat::new(width as u32, height as u32, PixelType::U8);
    src_fmt.color_family = ColorFamily::Yuv;
    src_fmt.subsample_w = 1;
    src_fmt.subsample_h = 1;
    src_fmt.matrix = MatrixCoefficients::Rec709;
    src_fmt.transfer = TransferCharacteristics::Rec709;
    src_fmt.primaries = ColorPrimaries::Rec709;

    let mut dst_fmt = ImageFormat::new(width as u32, height as u32, PixelType::U8);
    dst_fmt.color_family = ColorFamily::Rgb;
    dst_fmt.matrix = MatrixCoefficients::Rgb;
    dst_fmt.transfer = TransferCharacteristics::Rec709;
    dst_fmt.primaries = ColorPrimaries::Rec709;

    let graph = GraphBuilder::new(src_fmt, dst_fmt).build().unwrap();
    let mut state = ExecutionState::new(&graph).unwrap();

    let (mut y, y_stride) = plane(width, height);
    let (u, u_stride) = plane(width / 2, height / 2);
    let (v, v_stride) = plane(width / 2, height / 2);
    for (k, px) in y.as_bytes_mut().iter_mut().enumerate() {
        *px = (k % 219) as u8 + 16;
    }

    let (mut r, r_stride) = plane(width, height);
    let (mut g, g_stride) = plane(width, height);
    let (mut b, b_stride) = plane(width, height);

    c.bench_function("yuv420 u8 1080p to rgb", |bench| {
        bench.iter(|| {
            let src = ImageBufferRef::new([
                PlaneBuffer::new(y.as_bytes(), y_stride as isize),
                PlaneBuffer::new(u.as_bytes(), u_stride as isize),
                PlaneBuffer::new(v.as_bytes(), v_stride as isize),
                PlaneBuffer::empty(),
            ]);
            let mut dst = ImageBufferMut::new([
                PlaneBufferMut::new(r.as_bytes_mut(), r_stride as isize),
                PlaneBufferMut::new(g.as_bytes_mut(), g_stride as isize),
                PlaneBufferMut::new(b.as_bytes_mut(), b_stride as isize),
                PlaneBufferMut::empty(),
            ]);
            graph
                .process_with(&mut state, &src, &mut dst, None, None)
                .unwrap();
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
