#![allow(missing_docs, reason = "No need for API documentation in benchmark code")]

use std::hint::black_box;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use criterion::{Criterion, criterion_group, criterion_main};
use resource_pool::ResourcePool;

criterion_group!(benches, entrypoint);
criterion_main!(benches);

fn open_pool(resources: usize) -> Arc<ResourcePool<usize>> {
    let pool = Arc::new(ResourcePool::with_capacity(resources));
    pool.open();
    for resource in 0..resources {
        pool.add(resource).unwrap();
    }
    pool
}

fn entrypoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("resource_pool");

    let pool = open_pool(16);
    group.bench_function("acquire_release", |b| {
        b.iter(|| {
            let resource = pool.acquire().unwrap();
            pool.release(black_box(resource)).unwrap();
        });
    });

    group.bench_function("lease", |b| {
        b.iter(|| {
            let lease = pool.lease().unwrap();
            black_box(*lease);
        });
    });

    group.bench_function("acquire_timeout_empty", |b| {
        let empty = open_pool(1);
        let _held = empty.acquire().unwrap();
        b.iter(|| black_box(empty.acquire_timeout(Duration::ZERO).unwrap()));
    });

    group.bench_function("add_remove", |b| {
        let pool = open_pool(1);
        pool.close_now().unwrap();
        b.iter(|| {
            pool.add(black_box(7)).unwrap();
            pool.remove(&7).unwrap();
        });
    });

    group.bench_function("add_remove_now", |b| {
        let pool = open_pool(16);
        pool.remove(&0).unwrap();
        b.iter(|| {
            pool.add(black_box(0)).unwrap();
            pool.remove_now(&0).unwrap();
        });
    });

    for threads in [2, 4, 8] {
        let pool = open_pool(4);
        group.bench_function(format!("contended_acquire_release_{threads}_threads"), |b| {
            b.iter(|| {
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let pool = pool.clone();
                        thread::spawn(move || {
                            for _ in 0..100 {
                                let resource = pool.acquire().unwrap();
                                pool.release(resource).unwrap();
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
            });
        });
    }

    group.finish();
}
