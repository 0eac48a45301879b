// Criterion benchmarks for ARV Comps

use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use arv_comps::core::{
    address::normalize_address,
    distance::haversine_miles,
    enrich::EnrichmentIndex,
    ppsf::estimate_arv,
    valuate_subject,
};
use arv_comps::models::{ComparableSale, EstimatorParams, PropertyAttributes, SubjectProperty};

fn create_comp(id: usize, lat: f64, lon: f64) -> ComparableSale {
    ComparableSale {
        address: format!("{} Comp St", id),
        attributes: PropertyAttributes {
            bedrooms: Some(2 + (id % 3) as u32),
            bathrooms: Some(1.0 + (id % 2) as f64),
            living_square_feet: Some(900.0 + (id % 40) as f64 * 25.0),
            latitude: Some(lat),
            longitude: Some(lon),
            ..Default::default()
        },
        last_sale_amount: Some(180_000.0 + (id % 50) as f64 * 4_000.0),
        last_sale_date: None,
    }
}

fn create_subject(comp_count: usize) -> SubjectProperty {
    let comps = (0..comp_count)
        .map(|i| {
            let offset = (i as f64 * 0.001) % 0.1;
            create_comp(i, 25.7617 + offset, -80.1918 - offset)
        })
        .collect();

    SubjectProperty::new("100 Biscayne Blvd, Miami, FL 33132")
        .with_attributes(PropertyAttributes {
            living_square_feet: Some(1400.0),
            latitude: Some(25.7617),
            longitude: Some(-80.1918),
            ..Default::default()
        })
        .with_comps(comps)
}

fn bench_haversine_miles(c: &mut Criterion) {
    c.bench_function("haversine_miles", |b| {
        b.iter(|| {
            haversine_miles(
                black_box(25.7617),
                black_box(-80.1918),
                black_box(25.79),
                black_box(-80.13),
            )
        });
    });
}

fn bench_normalize_address(c: &mut Criterion) {
    c.bench_function("normalize_address", |b| {
        b.iter(|| normalize_address(black_box("  4500 NW 7th Ave Ste 210, Miami, FL 33127 ")));
    });
}

fn bench_estimate(c: &mut Criterion) {
    let params = EstimatorParams::default();
    let mut group = c.benchmark_group("estimate_arv");

    for comp_count in [10, 50, 100, 500].iter() {
        let subject = create_subject(*comp_count);

        group.bench_with_input(
            BenchmarkId::new("comps", comp_count),
            comp_count,
            |b, _| {
                b.iter(|| {
                    estimate_arv(
                        black_box(&subject.comps),
                        black_box(Some(1400.0)),
                        black_box(&params),
                    )
                });
            },
        );
    }

    group.finish();
}

fn bench_valuate_subject(c: &mut Criterion) {
    let subject = create_subject(50);
    let mut index = EnrichmentIndex::new();
    index.insert(
        "100 Biscayne Boulevard, Miami, Florida 33132",
        PropertyAttributes {
            bedrooms: Some(3),
            year_built: Some(1998),
            ..Default::default()
        },
    );
    let params = EstimatorParams::default();

    c.bench_function("valuate_subject_50_comps", |b| {
        b.iter(|| valuate_subject(black_box(&subject), black_box(&index), black_box(&params)));
    });
}

criterion_group!(
    benches,
    bench_haversine_miles,
    bench_normalize_address,
    bench_estimate,
    bench_valuate_subject
);

criterion_main!(benches);
