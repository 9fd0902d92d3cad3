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
    AlignedBuffer, BuilderParams, ExecutionState, GraphBuilder, ImageBufferMut, ImageBufferRef,
    ImageFormat, PixelType, PlaneBuffer, PlaneBufferMut, ResampleFilter, ALIGNMENT,
};

fn plane(width: usize, height: usize, ps: usize) -> (AlignedBuffer, usize) {
    let stride = (width * ps).div_ceil(ALIGNMENT) * ALIGNMENT;
    (AlignedBuffer::new(stride * height), stride)
}

fn bench_resize(c: &mut Criterion, name: &str, ty: PixelType, ps: usize) {
    let (sw, sh) = (3840usize, 2160usize);
    let (dw, dh) = (1920usize, 1080usize);

    let src_fmt = ImageFormat::new(sw as u32, sh as u32, ty);
    let dst_fmt = ImageFormat::new(dw as u32, dh as u32, ty);
    let mut params = BuilderParams::default();
    params.resample_filter = ResampleFilter::Lanczos;

    let graph = GraphBuilder::new(src_fmt, dst_fmt)
        .with_params(params)
        .build()
        .unwrap();
    let mut state = ExecutionState::new(&graph).unwrap();

    let (mut src, src_stride) = plane(sw, sh, ps);
    if ty.is_integer() {
        for (k, px) in src.as_bytes_mut().iter_mut().enumerate() {
            *px = (k % 251) as u8;
        }
    }
    let (mut dst_store, dst_stride) = plane(dw, dh, ps);

    c.bench_function(name, |bench| {
        bench.iter(|| {
            let src_buf = ImageBufferRef::new([
                PlaneBuffer::new(src.as_bytes(), src_stride as isize),
                PlaneBuffer::empty(),
                PlaneBuffer::empty(),
                PlaneBuffer::empty(),
            ]);
            let mut dst_buf = ImageBufferMut::new([
                PlaneBufferMut::new(dst_store.as_bytes_mut(), dst_stride as isize),
                PlaneBufferMut::empty(),
                PlaneBufferMut::empty(),
                PlaneBufferMut::empty(),
            ]);
            graph
                .process_with(&mut state, &src_buf, &mut dst_buf, None, None)
                .unwrap();
        });
    });
}

pub fn criterion_benchmark(c: &mut Criterion) {
    bench_resize(c, "lanczos 4k to 1080p u8 plane", PixelType::U8, 1);
    bench_resize(c, "lanczos 4k to 1080p u16 plane", PixelType::U16, 2);
    bench_resize(c, "lanczos 4k to 1080p f32 plane", PixelType::F32, 4);
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
