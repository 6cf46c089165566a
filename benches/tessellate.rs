use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vecplot::basics::{PointD, PointEquality};
use vecplot::chord_table::ArcKind;
use vecplot::tessellator::{circular_arc_matrix, elliptic_arc_matrix, tessellate_arc};
use vecplot::{ArcCapability, PlotterConfig, PlotterCore, RecordingBackend, TransAffine};

fn criterion_benchmark(c: &mut Criterion) {
    let device = TransAffine::new_scaling(300.0, 200.0);
    let turn = circular_arc_matrix(true, &device).unwrap();
    let row = ArcKind::Quarter.chord_row();

    c.bench_function("tessellate-quarter-circle", move |b| {
        b.iter(|| {
            tessellate_arc(
                black_box(PointD::new(300.0, 0.0)),
                black_box(PointD::new(0.0, 200.0)),
                &turn,
                &row,
                PointEquality::Real,
            )
        })
    });

    c.bench_function("tessellate-user-defined-arc", move |b| {
        b.iter(|| {
            let row = ArcKind::from_angle(black_box(1.2)).chord_row();
            tessellate_arc(
                PointD::new(300.0, 0.0),
                PointD::new(108.7, 186.4),
                &turn,
                &row,
                PointEquality::Raster,
            )
        })
    });

    let ellipse = elliptic_arc_matrix(PointD::new(40.0, 10.0), PointD::new(-5.0, 20.0)).unwrap();
    c.bench_function("tessellate-elliptic-arc", move |b| {
        b.iter(|| {
            tessellate_arc(
                black_box(PointD::new(40.0, 10.0)),
                black_box(PointD::new(-5.0, 20.0)),
                &ellipse,
                &ArcKind::Quarter.chord_row(),
                PointEquality::Real,
            )
        })
    });

    c.bench_function("plotter-circles", |b| {
        let mut config = PlotterConfig::default();
        config.device.viewport = [0.0, 0.0, 1000.0, 1000.0];
        b.iter(|| {
            let mut backend = RecordingBackend::new(ArcCapability::None);
            let mut plotter = PlotterCore::new(&mut backend, config.clone());
            plotter.open().unwrap();
            for i in 0..16 {
                let r = 0.02 * (i + 1) as f64;
                plotter.circle(0.5, 0.5, r).unwrap();
            }
            plotter.close().unwrap();
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
