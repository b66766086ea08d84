// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the per-frame work in autocrop-vision: classifying
// a detection, rectifying a capture, and the CPU rectangle detector.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};

use autocrop_core::{ClassifierConfig, Quadrilateral};
use autocrop_vision::{HoughDetector, classify, rectify};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Dark 640x480 frame with a bright document from (160, 90) to (480, 390).
fn document_frame() -> RgbaImage {
    RgbaImage::from_fn(640, 480, |x, y| {
        if (160..480).contains(&x) && (90..390).contains(&y) {
            Rgba([235, 235, 230, 255])
        } else {
            Rgba([35, 30, 30, 255])
        }
    })
}

fn keystone() -> Quadrilateral {
    Quadrilateral::from_coords([0.2, 0.8, 0.8, 0.8, 0.1, 0.2, 0.9, 0.2])
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Classification runs on every frame, so it has to stay far below the
/// frame interval.
fn bench_classify(c: &mut Criterion) {
    let config = ClassifierConfig::default();
    let quad = keystone();

    c.bench_function("classify", |b| {
        b.iter(|| black_box(classify(black_box(Some(&quad)), &config)));
    });
}

/// Rectify a keystoned quadrilateral out of a 640x480 frame.
fn bench_rectify(c: &mut Criterion) {
    let frame = document_frame();
    let quad = keystone();

    c.bench_function("rectify keystone (640x480)", |b| {
        b.iter(|| {
            let rectified = rectify(black_box(&quad), black_box(&frame)).expect("rectify");
            black_box(rectified.into_image());
        });
    });
}

/// Full Canny + Hough detection on a 640x480 frame.
fn bench_detect(c: &mut Criterion) {
    let frame = document_frame();
    let detector = HoughDetector::default();

    c.bench_function("hough detect (640x480)", |b| {
        b.iter(|| black_box(detector.find_rectangle(black_box(&frame))));
    });
}

criterion_group!(benches, bench_classify, bench_rectify, bench_detect);
criterion_main!(benches);
