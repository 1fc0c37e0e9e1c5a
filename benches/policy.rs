use criterion::{black_box, criterion_group, criterion_main, Criterion};
use style_preview::capture::{Camera, CaptureConfig, MockCamera};
use style_preview::control::{ComputeUnits, ControlSnapshot, ProcessingMode, StyleId};
use style_preview::{FramePolicy, StyleRegistry, SyntheticRunner};

fn bench_policy(c: &mut Criterion) {
    let mut camera = MockCamera::new();
    camera.open(&CaptureConfig::default()).unwrap();
    let frame = camera.capture().unwrap();

    let mut policy = FramePolicy::new(StyleRegistry::new("models"), SyntheticRunner::new(), 1);

    let raw = ControlSnapshot::new(ProcessingMode::PassThrough, StyleId::Style1);
    c.bench_function("pass_through_medium", |b| {
        b.iter(|| policy.process(black_box(&frame), raw).unwrap())
    });

    let styled = ControlSnapshot::new(ProcessingMode::Infer(ComputeUnits::Automatic), StyleId::Style3);
    policy.process(&frame, styled).unwrap();
    c.bench_function("cached_synthetic_inference_medium", |b| {
        b.iter(|| policy.process(black_box(&frame), styled).unwrap())
    });
}

criterion_group!(benches, bench_policy);
criterion_main!(benches);
