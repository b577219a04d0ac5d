//! Benchmarks for the frame solver

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fea_engine::prelude::*;

fn create_continuous_beam(spans: usize) -> FEModel {
    let mut model = FEModel::new();

    model.set_material("Concrete", Material::concrete()).unwrap();
    model
        .set_section("Beam", Section::rectangular("Concrete", 0.3, 0.5))
        .unwrap();
    model.add_load_case(LoadCase::dead()).unwrap();
    model.set_active_dofs(ActiveDofs::plane_xz());

    for i in 0..=spans {
        let name = format!("N{}", i);
        model.add_node(&name, Node::new(i as f64 * 5.0, 0.0, 0.0)).unwrap();
        model.set_support(&name, Support::pinned()).unwrap();
    }
    for i in 0..spans {
        let name = format!("M{}", i);
        model
            .add_member(&name, Member::new(&format!("N{}", i), &format!("N{}", i + 1), "Beam"))
            .unwrap();
        model
            .add_member_dist_load(&name, DistributedLoad::uniform(20.0, LoadDirection::Gravity, "DEAD"))
            .unwrap();
    }

    model
}

fn create_plane_frame(stories: usize, bays: usize) -> FEModel {
    let mut model = FEModel::new();

    model.set_material("Steel", Material::steel()).unwrap();
    model
        .set_section("Column", Section::rectangular("Steel", 0.4, 0.4))
        .unwrap();
    model
        .set_section("Beam", Section::rectangular("Steel", 0.3, 0.6))
        .unwrap();
    model.add_load_case(LoadCase::dead()).unwrap();
    model.set_active_dofs(ActiveDofs::plane_xz());

    let story_height = 3.5;
    let bay_width = 6.0;

    for story in 0..=stories {
        for bay in 0..=bays {
            let name = format!("N{}_{}", story, bay);
            let x = bay as f64 * bay_width;
            let z = story as f64 * story_height;
            model.add_node(&name, Node::new(x, 0.0, z)).unwrap();
        }
    }

    for story in 0..stories {
        for bay in 0..=bays {
            let name = format!("Col{}_{}", story, bay);
            let i_node = format!("N{}_{}", story, bay);
            let j_node = format!("N{}_{}", story + 1, bay);
            model.add_member(&name, Member::new(&i_node, &j_node, "Column")).unwrap();
        }
    }

    for story in 1..=stories {
        for bay in 0..bays {
            let name = format!("Beam{}_{}", story, bay);
            let i_node = format!("N{}_{}", story, bay);
            let j_node = format!("N{}_{}", story, bay + 1);
            model.add_member(&name, Member::new(&i_node, &j_node, "Beam")).unwrap();
        }
    }

    for bay in 0..=bays {
        model.set_support(&format!("N0_{}", bay), Support::fixed()).unwrap();
    }

    for story in 1..=stories {
        model
            .add_node_load(&format!("N{}_0", story), NodeLoad::force(10.0, 0.0, 0.0, "DEAD"))
            .unwrap();
    }

    model
}

fn benchmark_two_span_beam(c: &mut Criterion) {
    c.bench_function("beam_2span_linear", |b| {
        b.iter(|| {
            let mut model = create_continuous_beam(2);
            model.analyze(&AnalysisOptions::linear()).unwrap();
            black_box(&model);
        })
    });
}

fn benchmark_long_beam(c: &mut Criterion) {
    c.bench_function("beam_20span_linear", |b| {
        b.iter(|| {
            let mut model = create_continuous_beam(20);
            model.analyze(&AnalysisOptions::linear()).unwrap();
            black_box(&model);
        })
    });
}

fn benchmark_plane_frame(c: &mut Criterion) {
    c.bench_function("frame_10story_5bay_linear", |b| {
        b.iter(|| {
            let mut model = create_plane_frame(10, 5);
            model.analyze(&AnalysisOptions::linear()).unwrap();
            black_box(&model);
        })
    });
}

fn benchmark_station_forces(c: &mut Criterion) {
    let mut model = create_continuous_beam(20);
    model.analyze(&AnalysisOptions::linear()).unwrap();
    c.bench_function("beam_20span_station_forces", |b| {
        b.iter(|| {
            for i in 0..20 {
                black_box(model.member_station_forces(&format!("M{}", i), "DEAD").unwrap());
            }
        })
    });
}

criterion_group!(
    benches,
    benchmark_two_span_beam,
    benchmark_long_beam,
    benchmark_plane_frame,
    benchmark_station_forces,
);

criterion_main!(benches);
