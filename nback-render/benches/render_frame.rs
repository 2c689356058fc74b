use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Duration;

use nback_core::{TaskPhase, TaskView};
use nback_render::TaskRenderer;
use tiny_skia::{Color, Pixmap};

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;

/// One solid stand-in stimulus; frames render it like a decoded image.
fn prepare_renderer() -> TaskRenderer {
    let mut stimulus = Pixmap::new(200, 200).unwrap();
    stimulus.fill(Color::from_rgba8(200, 120, 40, 255));
    TaskRenderer::new(WIDTH, HEIGHT, vec![stimulus]).expect("renderer")
}

pub fn bench_render_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_frame");
    group
        .sample_size(50)
        .measurement_time(Duration::from_secs(10))
        .warm_up_time(Duration::from_secs(2));

    group.bench_function("countdown", |b| {
        let mut renderer = prepare_renderer();
        let mut frame = vec![0u8; (WIDTH * HEIGHT * 4) as usize];
        let view = TaskView {
            phase: TaskPhase::Countdown,
            countdown_remaining: 5,
            stimulus: None,
            score: 0,
        };
        b.iter(|| {
            renderer
                .render_frame(black_box(&view), &mut frame)
                .expect("render");
        });
    });

    group.bench_function("stimulus_with_score", |b| {
        let mut renderer = prepare_renderer();
        let mut frame = vec![0u8; (WIDTH * HEIGHT * 4) as usize];
        let view = TaskView {
            phase: TaskPhase::Task,
            countdown_remaining: 0,
            stimulus: Some(0),
            score: 7,
        };
        b.iter(|| {
            renderer
                .render_frame(black_box(&view), &mut frame)
                .expect("render");
        });
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .confidence_level(0.95)
        .noise_threshold(0.02)
        .significance_level(0.05);
    targets = bench_render_frame
}

criterion_main!(benches);
