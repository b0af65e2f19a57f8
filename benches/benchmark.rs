use criterion::{Criterion, criterion_group, criterion_main};
use protracted_speciation::compiler::compile_lineage_tree;
use protracted_speciation::{ProtractedSpeciationProcess, SampleOptions, SpeciationRates};
use std::hint::black_box;

const MAX_TIME_SCENARIOS: &[(&str, f64)] = &[("MaxTime3", 3.0), ("MaxTime5", 5.0)];

const LINEAGE_COUNT_SCENARIOS: &[(&str, usize)] = &[("Lineages50", 50), ("Lineages200", 200)];

fn rates() -> SpeciationRates {
    SpeciationRates::new(0.8, 0.8, 0.4, 0.1, 0.1)
}

fn sample_max_time(c: &mut Criterion) {
    for (name, max_time) in MAX_TIME_SCENARIOS {
        let mut process = ProtractedSpeciationProcess::builder(rates())
            .with_seed(1)
            .build()
            .unwrap();
        c.bench_function(name, |b| {
            b.iter(|| {
                process
                    .generate_sample(SampleOptions::for_max_time(*max_time))
                    .unwrap()
            });
        });
    }
}

fn sample_lineage_counts(c: &mut Criterion) {
    for (name, num) in LINEAGE_COUNT_SCENARIOS {
        let mut process = ProtractedSpeciationProcess::builder(rates())
            .with_seed(2)
            .build()
            .unwrap();
        c.bench_function(name, |b| {
            b.iter(|| {
                process
                    .generate_sample(SampleOptions::for_num_extant_lineages(*num))
                    .unwrap()
            });
        });
    }
}

fn compile_large_history(c: &mut Criterion) {
    let mut process = ProtractedSpeciationProcess::builder(rates())
        .with_seed(3)
        .build()
        .unwrap();
    let sample = process
        .generate_sample(SampleOptions::for_num_extant_lineages(1000))
        .unwrap();
    let lineages = sample.lineages();
    let final_time = sample.final_time();

    c.bench_function("CompileLineages1000", |b| {
        b.iter(|| compile_lineage_tree(black_box(lineages), final_time, true).unwrap());
    });
}

criterion_group!(regression, sample_max_time, compile_large_history);
criterion_group! {
    name = reporting;
    config = Criterion::default().sample_size(10);
    targets = sample_lineage_counts
}
criterion_main!(regression, reporting);
