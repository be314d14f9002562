//! Animal Search Benchmarks
//!
//! Benchmarks for the search path:
//! - Building statement text and parameters from a query
//! - Executing an unfiltered search over the sample store
//! - Executing a search that uses every filter kind

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use getpet::query::animal_search;
use getpet::{Color, Gender, Persistence, SearchQuery, Size, Species};

fn full_query() -> SearchQuery {
    SearchQuery::new()
        .species(Species::Dog)
        .genders([Gender::Male, Gender::Female])
        .breed("Retriever")
        .colors([Color::Gold, Color::Black, Color::Brown])
        .sizes([Size::Medium, Size::Large])
        .cage_number(9)
        .vaccinated(true)
        .spay_neuter(true)
}

fn seeded_store(extra_copies: usize) -> Persistence {
    let persistence = Persistence::open_in_memory().expect("Failed to open store");
    persistence.apply_sample_data().expect("Failed to seed store");

    let sample = persistence.search(&SearchQuery::default()).expect("Failed to read sample");
    for _ in 0..extra_copies {
        for animal in &sample {
            persistence.new_animal(animal).expect("Failed to insert");
        }
    }
    persistence
}

fn bench_statement_building(c: &mut Criterion) {
    let query = full_query();

    c.bench_function("build_search_statement", |b| {
        b.iter(|| animal_search(black_box(&query)));
    });
}

fn bench_search_execution(c: &mut Criterion) {
    let persistence = seeded_store(100);
    let empty = SearchQuery::default();
    let full = full_query();

    c.bench_function("search_unfiltered_909_rows", |b| {
        b.iter(|| {
            let results = persistence.search(black_box(&empty)).expect("search failed");
            assert_eq!(results.len(), 909);
            results
        });
    });

    c.bench_function("search_all_filters", |b| {
        b.iter(|| persistence.search(black_box(&full)).expect("search failed"));
    });
}

criterion_group!(benches, bench_statement_building, bench_search_execution);
criterion_main!(benches);
