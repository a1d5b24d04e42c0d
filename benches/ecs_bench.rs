//! Benchmarks for core ECS operations.
//!
//! Run with: cargo bench
//!
//! Covers the throughput of the operations the storage design exists to make fast:
//! entity creation, component add/remove (archetype migration), destruction (row
//! vacation), and query iteration across a mix of archetypes.

use archetype_ecs_core::World;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

#[derive(Debug, Clone, Copy)]
struct Position {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Debug, Clone, Copy)]
struct Velocity {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Debug, Clone, Copy)]
struct Health(u32);

fn bench_create(c: &mut Criterion) {
    let mut group = c.benchmark_group("create");

    for count in [1_000, 10_000, 100_000].iter() {
        group.bench_with_input(BenchmarkId::new("create_empty", count), count, |b, &count| {
            b.iter(|| {
                let mut world = World::new();
                for _ in 0..count {
                    black_box(world.create_entity());
                }
            });
        });

        group.bench_with_input(
            BenchmarkId::new("create_with_three_components", count),
            count,
            |b, &count| {
                b.iter(|| {
                    let mut world = World::new();
                    for i in 0..count {
                        let e = world.create_entity();
                        world
                            .add(
                                e,
                                Position {
                                    x: i as f32,
                                    y: 0.0,
                                    z: 0.0,
                                },
                            )
                            .unwrap();
                        world
                            .add(
                                e,
                                Velocity {
                                    x: 1.0,
                                    y: 0.0,
                                    z: 0.0,
                                },
                            )
                            .unwrap();
                        world.add(e, Health(100)).unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_despawn(c: &mut Criterion) {
    let mut group = c.benchmark_group("despawn");

    group.bench_function("destroy_1k_entities", |b| {
        b.iter_batched(
            || {
                let mut world = World::new();
                let entities: Vec<_> = (0..1_000)
                    .map(|i| {
                        let e = world.create_entity();
                        world
                            .add(
                                e,
                                Position {
                                    x: i as f32,
                                    y: 0.0,
                                    z: 0.0,
                                },
                            )
                            .unwrap();
                        world.add(e, Health(100)).unwrap();
                        e
                    })
                    .collect();
                (world, entities)
            },
            |(mut world, entities)| {
                for entity in entities {
                    world.destroy_entity(entity);
                }
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_migration(c: &mut Criterion) {
    let mut group = c.benchmark_group("migration");

    group.bench_function("add_component_1k", |b| {
        b.iter_batched(
            || {
                let mut world = World::new();
                let entities: Vec<_> = (0..1_000)
                    .map(|i| {
                        let e = world.create_entity();
                        world
                            .add(
                                e,
                                Position {
                                    x: i as f32,
                                    y: 0.0,
                                    z: 0.0,
                                },
                            )
                            .unwrap();
                        e
                    })
                    .collect();
                (world, entities)
            },
            |(mut world, entities)| {
                for entity in entities {
                    world
                        .add(
                            entity,
                            Velocity {
                                x: 1.0,
                                y: 0.0,
                                z: 0.0,
                            },
                        )
                        .unwrap();
                }
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.bench_function("remove_component_1k", |b| {
        b.iter_batched(
            || {
                let mut world = World::new();
                let entities: Vec<_> = (0..1_000)
                    .map(|i| {
                        let e = world.create_entity();
                        world
                            .add(
                                e,
                                Position {
                                    x: i as f32,
                                    y: 0.0,
                                    z: 0.0,
                                },
                            )
                            .unwrap();
                        world
                            .add(
                                e,
                                Velocity {
                                    x: 1.0,
                                    y: 0.0,
                                    z: 0.0,
                                },
                            )
                            .unwrap();
                        e
                    })
                    .collect();
                (world, entities)
            },
            |(mut world, entities)| {
                for entity in entities {
                    world.remove::<Velocity>(entity).unwrap();
                }
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_archetype_segregation(c: &mut Criterion) {
    c.bench_function("archetype_segregation_1k", |b| {
        b.iter(|| {
            let mut world = World::new();

            for i in 0..250 {
                let e = world.create_entity();
                world
                    .add(
                        e,
                        Position {
                            x: i as f32,
                            y: 0.0,
                            z: 0.0,
                        },
                    )
                    .unwrap();
                world
                    .add(
                        e,
                        Velocity {
                            x: 1.0,
                            y: 0.0,
                            z: 0.0,
                        },
                    )
                    .unwrap();
            }

            for i in 0..250 {
                let e = world.create_entity();
                world
                    .add(
                        e,
                        Position {
                            x: i as f32,
                            y: 0.0,
                            z: 0.0,
                        },
                    )
                    .unwrap();
                world.add(e, Health(100)).unwrap();
            }

            for i in 0..250 {
                let e = world.create_entity();
                world
                    .add(
                        e,
                        Position {
                            x: i as f32,
                            y: 0.0,
                            z: 0.0,
                        },
                    )
                    .unwrap();
                world
                    .add(
                        e,
                        Velocity {
                            x: 1.0,
                            y: 0.0,
                            z: 0.0,
                        },
                    )
                    .unwrap();
                world.add(e, Health(100)).unwrap();
            }

            for i in 0..250 {
                let e = world.create_entity();
                world
                    .add(
                        e,
                        Position {
                            x: i as f32,
                            y: 0.0,
                            z: 0.0,
                        },
                    )
                    .unwrap();
            }

            black_box(&world);
        });
    });
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");

    group.bench_function("iterate_two_components_100k", |b| {
        let mut world = World::new();
        for i in 0..100_000 {
            let e = world.create_entity();
            world
                .add(
                    e,
                    Position {
                        x: i as f32,
                        y: 0.0,
                        z: 0.0,
                    },
                )
                .unwrap();
            world
                .add(
                    e,
                    Velocity {
                        x: 1.0,
                        y: 0.0,
                        z: 0.0,
                    },
                )
                .unwrap();
            world.add(e, Health(100)).unwrap();
        }

        b.iter(|| {
            let mut sum = 0.0f32;
            for (_, (pos, vel)) in &world.query::<(Position, Velocity)>() {
                sum += pos.x + vel.x;
            }
            black_box(sum);
        });
    });

    group.bench_function("count_single_component_100k", |b| {
        let mut world = World::new();
        for i in 0..100_000 {
            let e = world.create_entity();
            world
                .add(
                    e,
                    Position {
                        x: i as f32,
                        y: 0.0,
                        z: 0.0,
                    },
                )
                .unwrap();
        }

        b.iter(|| {
            black_box(world.query::<(Position,)>().count());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_create,
    bench_despawn,
    bench_migration,
    bench_archetype_segregation,
    bench_query
);

criterion_main!(benches);
