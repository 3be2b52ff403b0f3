//! Benchmarks for layout calculations
//!
//! These benchmarks measure the tiling layouts on their own and a full arrange
//! pass through the engine, which runs after every map, unmap and drag motion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use strata_core::client::{Client, ClientAttrs};
use strata_core::config::{Config, DecorationConfig, LayoutConfig};
use strata_core::event::CoreEvent;
use strata_core::geometry::{ClientGeometry, Geometry};
use strata_core::layout::{Layout, Tileable};
use strata_core::registry::ClientArena;
use strata_core::view::View;
use strata_core::{Command, Core, ScreenId, WindowId};

const WORKAREA: Geometry = Geometry::new(0, 0, 1920, 1080);

fn tileables(n: usize) -> Vec<Tileable> {
    let mut arena = ClientArena::new();
    (0..n)
        .map(|i| {
            let id = arena.insert(Client::new(
                WindowId(i as u64 + 1),
                ScreenId(0),
                ClientAttrs::default(),
                &DecorationConfig::default(),
            ));
            Tileable {
                id,
                border: 1,
                title: 18,
                shaded: false,
            }
        })
        .collect()
}

fn layout_calculation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");

    for layout in [Layout::TileRight, Layout::Grid, Layout::Monocle] {
        let view = View::new(
            0,
            &LayoutConfig {
                default_layout: layout,
                nmaster: 2,
                ..LayoutConfig::default()
            },
        );
        for num_windows in [1, 5, 10, 20, 50, 100] {
            let clients = tileables(num_windows);
            group.bench_with_input(
                BenchmarkId::new(format!("{layout:?}"), num_windows),
                &clients,
                |b, clients| {
                    b.iter(|| layout.arrange(black_box(&view), black_box(WORKAREA), clients));
                },
            );
        }
    }

    group.finish();
}

fn populated_core(n: u64) -> Core {
    let mut core = Core::new(Config::default());
    core.handle_event(CoreEvent::ScreenAdded {
        screen: ScreenId(0),
        monitors: vec![WORKAREA],
    });
    for w in 1..=n {
        core.handle_event(CoreEvent::WindowMapped {
            screen: ScreenId(0),
            window: WindowId(w),
            attrs: ClientAttrs {
                geometry: ClientGeometry::new(0, 0, 400, 300, 0),
                ..ClientAttrs::default()
            },
        });
    }
    core
}

fn arrange_pass_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("arrange");

    for num_windows in [5, 20, 100] {
        group.bench_with_input(
            BenchmarkId::new("adjust_mwfact", num_windows),
            &num_windows,
            |b, &n| {
                let mut core = populated_core(n);
                let mut delta = 0.05;
                b.iter(|| {
                    delta = -delta;
                    black_box(core.exec(ScreenId(0), Command::AdjustMwfact { monitor: 0, delta }))
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, layout_calculation_benchmark, arrange_pass_benchmark);
criterion_main!(benches);
