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
use image::RgbImage;
use pic_convert_safe::{
    AlignedBuffer, BuilderParams, ColorFamily, ColorPrimaries, GraphBuilder, ImageBufferMut,
    ImageBufferRef, ImageFormat, MatrixCoefficients, PixelType, PlaneBuffer, PlaneBufferMut,
    ResampleFilter, TransferCharacteristics, ALIGNMENT,
};
use std::time::Instant;

struct Plane {
    store: AlignedBuffer,
    stride: usize,
}

impl Plane {
    fn new(width: usize, height: usize, ps: usize) -> Plane {
        let stride = (width * ps).div_ceil(ALIGNMENT) * ALIGNMENT;
        Plane {
            store: AlignedBuffer::new(stride * height),
            stride,
        }
    }
}

fn synthesize_yuv420(
    width: usize,
    height: usize,
) -> (Plane, Plane, Plane) {
    let mut y = Plane::new(width, height, 1);
    let mut u = Plane::new(width / 2, height / 2, 1);
    let mut v = Plane::new(width / 2, height / 2, 1);

    for i in 0..height {
        let row = &mut y.store.as_bytes_mut()[i * y.stride..i * y.stride + width];
        for (j, px) in row.iter_mut().enumerate() {
            let bar = (j * 8 / width) as u8;
            *px = 16 + bar * 28 + (i % 16) as u8;
        }
    }
    for i in 0..height / 2 {
        let row_u = &mut u.store.as_bytes_mut()[i * u.stride..i * u.stride + width / 2];
        for (j, px) in row_u.iter_mut().enumerate() {
            *px = (128 + ((j * 180) / (width / 2)) as i32 - 90) as u8;
        }
        let row_v = &mut v.store.as_bytes_mut()[i * v.stride..i * v.stride + width / 2];
        row_v.fill((128 + ((i * 160) / (height / 2)) as i32 - 80) as u8);
    }

    (y, u, v)
}

fn main() {
    let (width, height) = (1280usize, 720usize);
    let (out_width, out_height) = (640usize, 360usize);

    let mut src_fmt = ImageFormat::new(width as u32, height as u32, PixelType::U8);
    src_fmt.color_family = ColorFamily::Yuv;
    src_fmt.subsample_w = 1;
    src_fmt.subsample_h = 1;
    src_fmt.matrix = MatrixCoefficients::Rec709;
    src_fmt.transfer = TransferCharacteristics::Rec709;
    src_fmt.primaries = ColorPrimaries::Rec709;

    let mut dst_fmt = ImageFormat::new(out_width as u32, out_height as u32, PixelType::U8);
    dst_fmt.color_family = ColorFamily::Rgb;
    dst_fmt.matrix = MatrixCoefficients::Rgb;
    dst_fmt.transfer = TransferCharacteristics::Rec709;
    dst_fmt.primaries = ColorPrimaries::Rec709;

    let mut params = BuilderParams::default();
    params.resample_filter = ResampleFilter::Spline36;
    params.resample_filter_uv = ResampleFilter::Bilinear;

    let graph = GraphBuilder::new(src_fmt, dst_fmt)
        .with_params(params)
        .build()
        .expect("graph construction");

    let (y, u, v) = synthesize_yuv420(width, height);
    let mut r = Plane::new(out_width, out_height, 1);
    let mut g = Plane::new(out_width, out_height, 1);
    let mut b = Plane::new(out_width, out_height, 1);

    let src = ImageBufferRef::new([
        PlaneBuffer::new(y.store.as_bytes(), y.stride as isize),
        PlaneBuffer::new(u.store.as_bytes(), u.stride as isize),
        PlaneBuffer::new(v.store.as_bytes(), v.stride as isize),
        PlaneBuffer::empty(),
    ]);

    let start = Instant::now();
    {
        let mut dst = ImageBufferMut::new([
            PlaneBufferMut::new(r.store.as_bytes_mut(), r.stride as isize),
            PlaneBufferMut::new(g.store.as_bytes_mut(), g.stride as isize),
            PlaneBufferMut::new(b.store.as_bytes_mut(), b.stride as isize),
            PlaneBufferMut::empty(),
        ]);
        graph.process(&src, &mut dst, None, None).expect("process");
    }
    let elapsed = start.elapsed();
    println!(
        "{}x{} YUV 4:2:0 -> {}x{} RGB in {:?}",
        width, height, out_width, out_height, elapsed
    );

    let mut img = RgbImage::new(out_width as u32, out_height as u32);
    for (i, row) in img.rows_mut().enumerate() {
        let rr = &r.store.as_bytes()[i * r.stride..];
        let gg = &g.store.as_bytes()[i * g.stride..];
        let bb = &b.store.as_bytes()[i * b.stride..];
        for (j, px) in row.enumerate() {
            *px = image::Rgb([rr[j], gg[j], bb[j]]);
        }
    }
    img.save("converted.png").expect("png encode");
    println!("wrote converted.png");
}
