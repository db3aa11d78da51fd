use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use mqtt_transport::callback::operation_callback;
use mqtt_transport::{Mid, OperationManager};
use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

fn benchmark_establish_complete(c: &mut Criterion) {
    let mut group = c.benchmark_group("establish_complete");

    for count in [10u16, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::new("establish_then_complete", count),
            count,
            |b, &count| {
                let manager = OperationManager::new();
                let counter = Arc::new(AtomicU64::new(0));

                b.iter(|| {
                    for mid in 1..=count {
                        let counter = Arc::clone(&counter);
                        manager
                            .establish_operation(
                                mid,
                                Some(operation_callback(move |_| {
                                    counter.fetch_add(1, Ordering::Relaxed);
                                    Ok(())
                                })),
                            )
                            .unwrap();
                    }
                    for mid in 1..=count {
                        manager.complete_operation(black_box(mid)).unwrap();
                    }
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("complete_then_establish", count),
            count,
            |b, &count| {
                let manager = OperationManager::new();

                b.iter(|| {
                    for mid in 1..=count {
                        manager.complete_operation(mid).unwrap();
                    }
                    for mid in 1..=count {
                        manager
                            .establish_operation(black_box(mid), None)
                            .unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

fn benchmark_cancel_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("cancel_all");

    for count in [10u16, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("pending", count), count, |b, &count| {
            let manager = OperationManager::new();

            b.iter(|| {
                for mid in 1..=count {
                    manager
                        .establish_operation(mid, Some(operation_callback(|_| Ok(()))))
                        .unwrap();
                }
                manager.cancel_all_operations().unwrap();
            });
        });
    }

    group.finish();
}

// Benchmark contention between an issuing thread and a completing thread
fn benchmark_concurrent_completion(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_completion");

    for count in [100u16, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::new("two_threads", count),
            count,
            |b, &count| {
                let manager = Arc::new(OperationManager::new());

                b.iter(|| {
                    let issuer = Arc::clone(&manager);
                    let completer = Arc::clone(&manager);

                    let issuing = thread::spawn(move || {
                        for mid in 1..=count {
                            issuer.establish_operation(mid, None).unwrap();
                        }
                    });
                    let completing = thread::spawn(move || {
                        for mid in (1..=count).rev() {
                            completer.complete_operation(mid).unwrap();
                        }
                    });

                    issuing.join().unwrap();
                    completing.join().unwrap();
                    black_box(manager.pending_count());
                });
            },
        );
    }

    group.finish();
}

fn mids(count: Mid) -> impl Iterator<Item = Mid> {
    1..=count
}

fn benchmark_mid_lookup(c: &mut Criterion) {
    let manager = OperationManager::new();
    for mid in mids(1000) {
        manager.establish_operation(mid, None).unwrap();
    }

    c.bench_function("is_pending", |b| {
        b.iter(|| {
            for mid in mids(1000) {
                black_box(manager.is_pending(mid));
            }
        });
    });
}

criterion_group!(
    benches,
    benchmark_establish_complete,
    benchmark_cancel_all,
    benchmark_concurrent_completion,
    benchmark_mid_lookup
);
criterion_main!(benches);
