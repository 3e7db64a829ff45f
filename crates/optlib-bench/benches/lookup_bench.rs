//! Symbol lookup benchmarks: direct dlsym vs the memoizing front ends.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use optlib_loader::{LazySymbol, LibraryDescriptor, LibraryId, Registry, SymbolCache, SystemLoader};

const LIBM: LibraryId = LibraryId::new(0);

fn bench_lookup(c: &mut Criterion) {
    static COS: LazySymbol = LazySymbol::new(LIBM, c"cos");

    let mut registry = Registry::new(SystemLoader, [LibraryDescriptor::new("libm.so.6")]);
    if registry.load().degraded {
        eprintln!("Skipping lookup benchmarks: libm.so.6 not loadable");
        return;
    }
    let cache = SymbolCache::new();
    let mut group = c.benchmark_group("lookup");

    group.bench_function("registry_hit", |b| {
        b.iter(|| black_box(registry.lookup(LIBM, black_box(c"cos"))));
    });
    group.bench_function("registry_miss", |b| {
        b.iter(|| black_box(registry.lookup(LIBM, black_box(c"optlib_no_such_fn"))));
    });
    group.bench_function("lazy_symbol", |b| {
        b.iter(|| black_box(COS.get(&registry)));
    });
    group.bench_function("symbol_cache_hit", |b| {
        b.iter(|| black_box(cache.get(&registry, LIBM, black_box(c"cos"))));
    });
    group.bench_function("symbol_cache_miss", |b| {
        b.iter(|| black_box(cache.get(&registry, LIBM, black_box(c"optlib_no_such_fn"))));
    });
    group.finish();
}

criterion_group!(benches, bench_lookup);
criterion_main!(benches);
