//! Benchmarks for treesame
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

fn benchmark_fabric_roundtrip(c: &mut Criterion) {
    use std::time::Duration;
    use treesame::lockstep::RoundFabric;

    c.bench_function("fabric_roundtrip", |b| {
        let fabric = RoundFabric::new(1);
        let (port, mut agent_ports) = fabric.split();
        let agent = agent_ports.pop().unwrap();

        // One full lockstep cycle: acquire, publish, drain, release
        b.iter(|| {
            agent.acquire().unwrap();
            agent.publish("/tree/entry".into()).unwrap();
            let arrival = port.recv_timeout(Duration::from_secs(1)).unwrap().unwrap();
            black_box(&arrival);
            port.release(0).unwrap();
        })
    });
}

fn benchmark_compare_session(c: &mut Criterion) {
    use std::path::PathBuf;
    use std::sync::Arc;
    use treesame::config::CompareConfig;
    use treesame::listing::{ChildEntry, DirLister, StaticLister};
    use treesame::lockstep::CompareCoordinator;

    c.bench_function("compare_session_3x100", |b| {
        let children: Vec<ChildEntry> = (0..100)
            .map(|i| ChildEntry::file(format!("file_{i:04}")))
            .collect();
        let lister: Arc<dyn DirLister> = Arc::new(
            StaticLister::new()
                .with_dir("/r0", children.clone())
                .with_dir("/r1", children.clone())
                .with_dir("/r2", children),
        );
        let roots = vec![
            PathBuf::from("/r0"),
            PathBuf::from("/r1"),
            PathBuf::from("/r2"),
        ];

        b.iter_batched(
            || {
                let config = CompareConfig::new(roots.clone());
                CompareCoordinator::with_lister(config, Arc::clone(&lister))
            },
            |coordinator| {
                let report = coordinator.run().unwrap();
                black_box(report);
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, benchmark_fabric_roundtrip, benchmark_compare_session);
criterion_main!(benches);
