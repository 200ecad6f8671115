use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ferrous_wire::*;
use std::sync::Arc;

// ===== Test Graph =====

trait Store: Send + Sync {
    fn len(&self) -> usize;
}

#[derive(Default)]
struct Config {
    port: u16,
}
impl Component for Config {}
injectable!(Config {});

#[derive(Default)]
struct MemStore {
    rows: Vec<u64>,
}
impl Component for MemStore {}
injectable!(MemStore {});
impl Store for MemStore {
    fn len(&self) -> usize {
        self.rows.len()
    }
}
interface!(Store = [MemStore]);

#[derive(Default)]
struct Service {
    store: Wired<Arc<dyn Store>>,
    config: Wired<Arc<Config>>,
}
impl Component for Service {}
impl Constructible for Service {
    type Deps = (Arc<dyn Store>, Arc<Config>);
    fn construct(&mut self, (store, config): Self::Deps) {
        self.store.set(store);
        self.config.set(config);
    }
}

/// Distinct leaf types for wide graphs
#[derive(Default)]
struct Leaf<const N: usize>;
impl<const N: usize> Component for Leaf<N> {}
impl<const N: usize> Injectable for Leaf<N> {
    fn inject(&mut self, _fields: &mut Fields<'_, '_>) -> DiResult<()> {
        Ok(())
    }
}

fn graph() -> Container {
    let container = Container::new();
    container
        .register(Blueprint::injected::<Config>())
        .register(Blueprint::injected::<MemStore>())
        .register(Blueprint::constructed::<Service>());
    container
}

fn wide_graph(width: usize) -> Container {
    let leaves: [fn() -> Blueprint; 8] = [
        Blueprint::injected::<Leaf<0>>,
        Blueprint::injected::<Leaf<1>>,
        Blueprint::injected::<Leaf<2>>,
        Blueprint::injected::<Leaf<3>>,
        Blueprint::injected::<Leaf<4>>,
        Blueprint::injected::<Leaf<5>>,
        Blueprint::injected::<Leaf<6>>,
        Blueprint::injected::<Leaf<7>>,
    ];

    let container = graph();
    container.register_all(leaves.iter().take(width).map(|leaf| leaf()));
    container
}

// ===== Micro Benchmarks =====

fn bench_singleton_hit(c: &mut Criterion) {
    let container = graph();
    container.build();

    c.bench_function("singleton_hit", |b| {
        b.iter(|| {
            let service = container.load::<Service>();
            black_box(service.config.port);
        })
    });
}

fn bench_interface_hit(c: &mut Criterion) {
    let container = graph();
    container.build();
    let _ = container.load::<dyn Store>();

    c.bench_function("interface_hit", |b| {
        b.iter(|| {
            let store = container.load::<dyn Store>();
            black_box(store.len());
        })
    });
}

fn bench_try_load(c: &mut Criterion) {
    let container = graph();
    container.build();

    c.bench_function("try_load_hit", |b| {
        b.iter(|| black_box(container.try_load::<Service>().is_some()))
    });
}

// ===== Macro Benchmarks =====

fn bench_cold_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("cold_build");

    for width in [0usize, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, &width| {
            b.iter_batched(
                || wide_graph(width),
                |container| {
                    container.build();
                    black_box(container.is_built());
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_exec(c: &mut Criterion) {
    let container = graph();
    container.build();

    c.bench_function("exec_two_params", |b| {
        b.iter(|| {
            container.exec(|service: Arc<Service>, store: Arc<dyn Store>| {
                black_box(service.config.port as usize + store.len());
            })
        })
    });
}

criterion_group!(
    micro_benches,
    bench_singleton_hit,
    bench_interface_hit,
    bench_try_load
);

criterion_group!(macro_benches, bench_cold_build, bench_exec);

criterion_main!(micro_benches, macro_benches);
