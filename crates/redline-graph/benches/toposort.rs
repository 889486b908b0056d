use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use redline_graph::{DocumentGraph, GraphBuilder};
use redline_model::{DependencyKind, GovernanceTier, Section, SectionContent, SectionId};

/// Layered DAG: `width` sections per tier, every section deriving from each
/// section of the tier above plus a summarizing tail.
fn layered_graph(tiers: usize, width: usize) -> DocumentGraph {
    let mut builder = GraphBuilder::new();
    for tier in 0..tiers {
        for slot in 0..width {
            let governance = if tier == 0 {
                GovernanceTier::Locked
            } else {
                GovernanceTier::Generated
            };
            builder
                .add_section(Section::new(
                    SectionId::new(format!("t{tier:02}s{slot:02}")),
                    governance,
                    SectionContent::text(format!("tier {tier} slot {slot}")),
                ))
                .unwrap();
        }
    }
    for tier in 1..tiers {
        for slot in 0..width {
            for parent in 0..width {
                builder
                    .add_edge(
                        format!("t{:02}s{parent:02}", tier - 1),
                        format!("t{tier:02}s{slot:02}"),
                        DependencyKind::DerivesFrom,
                    )
                    .unwrap();
            }
        }
    }
    builder.publish()
}

fn bench_topological_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("topological_order");
    for (tiers, width) in [(4usize, 5usize), (8, 10), (16, 16)] {
        let graph = layered_graph(tiers, width);
        let nodes = tiers * width;

        group.throughput(Throughput::Elements(nodes as u64));
        group.bench_with_input(BenchmarkId::from_parameter(nodes), &nodes, |b, _| {
            b.iter(|| black_box(&graph).topological_order());
        });
    }
    group.finish();
}

fn bench_descendants(c: &mut Criterion) {
    let mut group = c.benchmark_group("descendants_of");
    for (tiers, width) in [(4usize, 5usize), (8, 10), (16, 16)] {
        let graph = layered_graph(tiers, width);
        let root = SectionId::new("t00s00");
        let nodes = tiers * width;

        group.throughput(Throughput::Elements(nodes as u64));
        group.bench_with_input(BenchmarkId::from_parameter(nodes), &nodes, |b, _| {
            b.iter(|| black_box(&graph).descendants_of(black_box(&root)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_topological_order, bench_descendants);
criterion_main!(benches);
