use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pkh_eligibility_core::classifier::{LogisticArtifact, LogisticRegression};
use pkh_eligibility_core::{
    predict, ApplicantRecord, AffineScaler, FeatureSchema, InferenceContext, OneHotEncoder,
};

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn sample_context() -> InferenceContext {
    // Four numeric fields plus three encoded columns
    let schema = FeatureSchema::new(
        names(&["Umur", "Jumlah Tanggungan", "Penghasilan", "Jumlah Anak Sekolah"]),
        names(&["Pekerjaan", "L/P"]),
        names(&[
            "Umur",
            "Jumlah Tanggungan",
            "Penghasilan",
            "Jumlah Anak Sekolah",
            "Pekerjaan_BURUH",
            "Pekerjaan_PEGAWAI",
            "L/P_P",
        ]),
    )
    .unwrap();
    let encoder = OneHotEncoder::from_json(
        r#"{"feature_names_in":["Pekerjaan","L/P"],"categories":[["BURUH","PEDAGANG","PEGAWAI","TIDAK ADA"],["L","P"]]}"#,
    )
    .unwrap();
    let scaler = AffineScaler::from_json(
        r#"{"kind":"standard","mean":[44.7,3.1,1850000.0,1.4,0.3,0.07,0.5],"scale":[12.9,1.6,1120000.0,1.1,0.46,0.255,0.5]}"#,
    )
    .unwrap();
    let classifier = LogisticRegression::from_artifact(LogisticArtifact {
        coef: vec![0.21, -0.84, 1.37, -0.62, -0.4, 1.12, -0.1],
        intercept: -0.35,
    })
    .unwrap();
    InferenceContext::new(schema, Box::new(encoder), Box::new(scaler), Box::new(classifier)).unwrap()
}

fn sample_batch(size: usize) -> Vec<ApplicantRecord> {
    let jobs = ["BURUH", "PEDAGANG", "PEGAWAI", "TIDAK ADA"];
    (0..size)
        .map(|i| {
            ApplicantRecord::new()
                .with("Umur", 25 + (i % 50) as i64)
                .with("Jumlah Tanggungan", (i % 7) as i64)
                .with("Penghasilan", 250_000 * (i % 20) as i64)
                .with("Jumlah Anak Sekolah", (i % 4) as i64)
                .with("Pekerjaan", jobs[i % jobs.len()])
                .with("L/P", if i % 2 == 0 { "L" } else { "P" })
        })
        .collect()
}

fn bench_batch_predict(c: &mut Criterion) {
    let ctx = sample_context();
    let mut group = c.benchmark_group("pkh_batch_predict");
    for size in [1usize, 100, 1_000] {
        let batch = sample_batch(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &batch, |b, batch| {
            b.iter(|| {
                let results = predict(&ctx, black_box(batch)).unwrap();
                black_box(results);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_batch_predict);
criterion_main!(benches);
