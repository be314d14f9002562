//! Persistence Engine Scenario Tests
//!
//! End-to-end scenarios against a seeded in-memory store:
//! - Insert, read, update and delete semantics (absence is never an error)
//! - Search filters, ordering and the fixed seed fixture
//! - Cage aggregation before and after inserts
//! - File-backed stores surviving a close and reopen

use getpet::{
    Animal, AnimalBuilder, Cage, Color, Gender, Persistence, SearchQuery, ShelterConfig,
    ShelterError, Size, Species,
};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

// ============================================================================
// Test Helpers
// ============================================================================

/// Open an in-memory store holding the nine sample animals
fn seeded() -> Persistence {
    let persistence = Persistence::open_in_memory().expect("Failed to open in-memory store");
    assert_eq!(persistence.apply_sample_data().expect("Failed to apply sample data"), 9);
    persistence
}

fn doge() -> AnimalBuilder {
    Animal::builder()
        .cage_number(5)
        .species(Species::Dog)
        .breed("Shiba Inu")
        .size(Size::Medium)
        .colors([Color::Gold])
        .gender(Gender::Male)
        .weight(42.0)
        .vaccinated(true)
        .spay_neuter(true)
        .name("Doge")
        .missing(false)
}

fn garfield() -> AnimalBuilder {
    Animal::builder()
        .cage_number(6)
        .species(Species::Cat)
        .breed("Tabby")
        .size(Size::Small)
        .colors([Color::Gold, Color::White])
        .gender(Gender::Male)
        .weight(22.0)
        .vaccinated(true)
        .spay_neuter(true)
        .name("Garfield")
        .missing(false)
}

fn names(animals: &[Animal]) -> Vec<&str> {
    animals.iter().map(Animal::name).collect()
}

fn seed_cages() -> Vec<Cage> {
    vec![
        Cage::new(0, 1, 0),
        Cage::new(1, 0, 1),
        Cage::new(2, 2, 2),
        Cage::new(8, 1, 0),
        Cage::new(9, 1, 0),
        Cage::new(13, 1, 0),
    ]
}

fn temp_db_path(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("getpet_{name}_{}.db", std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}

// ============================================================================
// Point Operations
// ============================================================================

#[test]
fn test_get_existing_animal() {
    let persistence = seeded();

    let animal = persistence.get_animal(1).unwrap().expect("intake 1 is seeded");
    assert_eq!(animal.intake_number(), Some(1));
    assert_eq!(animal.name(), "Doge");
    assert_eq!(animal.species(), Species::Dog);
    assert_eq!(animal.gender(), Gender::Male);
    assert_eq!(animal.colors(), &[Color::Gold]);
}

#[test]
fn test_get_missing_animal_is_absent() {
    let persistence = seeded();
    assert_eq!(persistence.get_animal(20).unwrap(), None);
}

#[test]
fn test_new_animal_round_trip() {
    let persistence = seeded();
    let animal = garfield().build().unwrap();

    let intake = persistence.new_animal(&animal).unwrap();
    let stored = persistence.get_animal(intake).unwrap().expect("inserted animal is readable");

    assert_eq!(stored.intake_number(), Some(intake));
    assert_eq!(stored.with_intake_number(None), animal);
}

#[test]
fn test_new_animal_ignores_supplied_intake_number() {
    let persistence = seeded();
    let animal = doge().intake_number(1).build().unwrap();

    let intake = persistence.new_animal(&animal).unwrap();
    assert_eq!(intake, 10);

    // The seeded intake 1 is untouched
    let original = persistence.get_animal(1).unwrap().unwrap();
    assert_eq!(original.cage_number(), 2);
}

#[test]
fn test_duplicate_insert_gets_distinct_keys() {
    let persistence = seeded();
    let animal = doge().build().unwrap();

    let first = persistence.new_animal(&animal).unwrap();
    let second = persistence.new_animal(&animal).unwrap();

    assert_ne!(first, second);
    assert_eq!(persistence.search(&SearchQuery::default()).unwrap().len(), 11);
}

#[test]
fn test_update_then_read() {
    let persistence = seeded();
    let replacement = garfield().build().unwrap();

    assert!(persistence.update_animal(1, &replacement).unwrap());

    let stored = persistence.get_animal(1).unwrap().unwrap();
    assert_eq!(stored, replacement.with_intake_number(Some(1)));
}

#[test]
fn test_update_missing_animal_returns_false() {
    let persistence = seeded();

    assert!(!persistence.update_animal(20, &garfield().build().unwrap()).unwrap());
    assert_eq!(persistence.get_animal(20).unwrap(), None);
}

#[test]
fn test_delete_is_idempotent() {
    let persistence = seeded();

    assert!(persistence.delete_animal(1).unwrap());
    assert_eq!(persistence.get_animal(1).unwrap(), None);
    assert!(!persistence.delete_animal(1).unwrap());
}

#[test]
fn test_delete_nonexistent_animal() {
    let persistence = seeded();

    assert_eq!(persistence.get_animal(20).unwrap(), None);
    assert!(!persistence.delete_animal(20).unwrap());
    assert_eq!(persistence.get_animal(20).unwrap(), None);
}

#[test]
fn test_delete_then_add_back() {
    let persistence = seeded();
    let animal = persistence.get_animal(2).unwrap().unwrap();

    assert!(persistence.delete_animal(2).unwrap());
    let intake = persistence.new_animal(&animal).unwrap();

    assert_ne!(intake, 2);
    let stored = persistence.get_animal(intake).unwrap().unwrap();
    assert_eq!(stored.with_intake_number(None), animal.with_intake_number(None));
}

// ============================================================================
// Search
// ============================================================================

#[test]
fn test_empty_query_returns_every_animal_by_name() {
    let results = seeded().search(&SearchQuery::default()).unwrap();

    assert_eq!(
        names(&results),
        vec!["Biscuit", "Daisy", "Doge", "Luna", "Max", "Pepper", "Rocky", "Shadow", "Whiskers"]
    );
}

#[test]
fn test_narrow_query_matches_one_animal() {
    let query = SearchQuery::new()
        .species(Species::Dog)
        .genders([Gender::Male])
        .breed("Shiba Inu")
        .colors([Color::Gold])
        .sizes([Size::Medium])
        .cage_number(2)
        .vaccinated(true)
        .spay_neuter(true);

    let results = seeded().search(&query).unwrap();
    assert_eq!(names(&results), vec!["Doge"]);
}

#[test]
fn test_color_filter_matches_any_listed_color() {
    let persistence = seeded();

    let black = persistence.search(&SearchQuery::new().colors([Color::Black])).unwrap();
    assert_eq!(names(&black), vec!["Biscuit", "Max", "Pepper", "Rocky", "Shadow"]);

    let gold_or_gray = persistence
        .search(&SearchQuery::new().colors([Color::Gold, Color::DarkGray]))
        .unwrap();
    assert_eq!(names(&gold_or_gray), vec!["Daisy", "Doge", "Luna"]);
}

#[test]
fn test_list_filters_match_any_member() {
    let persistence = seeded();

    let query = SearchQuery::new().species(Species::Dog).sizes([Size::Small, Size::Large]);
    assert_eq!(
        names(&persistence.search(&query).unwrap()),
        vec!["Biscuit", "Daisy", "Max", "Pepper", "Rocky"]
    );

    let females = persistence.search(&SearchQuery::new().genders([Gender::Female])).unwrap();
    assert_eq!(names(&females), vec!["Biscuit", "Daisy", "Luna", "Whiskers"]);
}

#[test]
fn test_breed_filter_is_substring_match() {
    let persistence = seeded();

    let retrievers = persistence.search(&SearchQuery::new().breed("Retriever")).unwrap();
    assert_eq!(names(&retrievers), vec!["Daisy", "Max"]);

    // SQLite LIKE ignores ASCII case
    let shiba = persistence.search(&SearchQuery::new().breed("shiba")).unwrap();
    assert_eq!(names(&shiba), vec!["Doge"]);
}

#[test]
fn test_breed_wildcards_are_not_escaped() {
    let persistence = seeded();

    let results = persistence.search(&SearchQuery::new().breed("B_agle")).unwrap();
    assert_eq!(names(&results), vec!["Biscuit"]);

    let results = persistence.search(&SearchQuery::new().breed("%")).unwrap();
    assert_eq!(results.len(), 9);
}

#[test]
fn test_cage_and_species_filters() {
    let query = SearchQuery::new().species(Species::Cat).cage_number(2);
    assert_eq!(names(&seeded().search(&query).unwrap()), vec!["Luna", "Whiskers"]);
}

#[test]
fn test_flags_only_constrain_when_set() {
    let persistence = seeded();
    let unvaccinated = garfield().vaccinated(false).build().unwrap();
    persistence.new_animal(&unvaccinated).unwrap();

    assert_eq!(persistence.search(&SearchQuery::default()).unwrap().len(), 10);

    let vaccinated = persistence.search(&SearchQuery::new().vaccinated(true)).unwrap();
    assert_eq!(vaccinated.len(), 9);
    assert!(!names(&vaccinated).contains(&"Garfield"));

    let fixed = persistence.search(&SearchQuery::new().spay_neuter(true)).unwrap();
    assert_eq!(fixed.len(), 10);
}

#[test]
fn test_missing_animals_are_not_filtered() {
    let persistence = seeded();
    let lost = persistence
        .get_animal(5)
        .unwrap()
        .unwrap()
        .to_builder()
        .missing(true)
        .build()
        .unwrap();
    assert!(persistence.update_animal(5, &lost).unwrap());

    let results = persistence.search(&SearchQuery::default()).unwrap();
    assert_eq!(results.len(), 9);
    assert!(results.iter().any(|animal| animal.missing()));
}

#[test]
fn test_search_with_no_matches_is_empty() {
    let query = SearchQuery::new().species(Species::Cat).sizes([Size::Large]);
    assert!(seeded().search(&query).unwrap().is_empty());
}

// ============================================================================
// Cage Aggregation
// ============================================================================

#[test]
fn test_seed_cages() {
    assert_eq!(seeded().get_cages().unwrap(), seed_cages());
}

#[test]
fn test_cages_after_new_animal() {
    let persistence = seeded();
    persistence.new_animal(&garfield().build().unwrap()).unwrap();

    let mut expected = seed_cages();
    expected.insert(3, Cage::new(6, 0, 1));
    assert_eq!(persistence.get_cages().unwrap(), expected);
}

#[test]
fn test_emptied_cage_disappears() {
    let persistence = seeded();
    assert!(persistence.delete_animal(6).unwrap());

    let cages = persistence.get_cages().unwrap();
    assert!(cages.iter().all(|cage| cage.cage_number != 1));
    assert_eq!(cages.len(), 5);
}

#[test]
fn test_empty_store_has_no_cages() {
    let persistence = Persistence::open_in_memory().unwrap();
    assert!(persistence.get_cages().unwrap().is_empty());
    assert!(persistence.search(&SearchQuery::default()).unwrap().is_empty());
}

// ============================================================================
// File-Backed Stores
// ============================================================================

#[test]
fn test_file_store_survives_reopen() {
    let path = temp_db_path("reopen");
    let config = ShelterConfig {
        database: path.clone(),
        sample_data: false,
        busy_timeout_ms: Some(1000),
    };

    let persistence = Persistence::from_config(&config).unwrap();
    let intake = persistence.new_animal(&garfield().build().unwrap()).unwrap();
    assert_eq!(intake, 1);
    persistence.close().unwrap();

    let reopened = Persistence::open(&path).unwrap();
    let stored = reopened.get_animal(intake).unwrap().expect("row persisted to disk");
    assert_eq!(stored.name(), "Garfield");
    assert_eq!(reopened.get_cages().unwrap(), vec![Cage::new(6, 0, 1)]);
    reopened.close().unwrap();

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_sample_data_skipped_for_populated_file() {
    let path = temp_db_path("populated");
    let config = ShelterConfig {
        database: path.clone(),
        sample_data: true,
        busy_timeout_ms: None,
    };

    let persistence = Persistence::from_config(&config).unwrap();
    assert!(persistence.delete_animal(1).unwrap());
    persistence.close().unwrap();

    // Reopening with sample data enabled does not resurrect deleted rows
    let reopened = Persistence::from_config(&config).unwrap();
    assert_eq!(reopened.get_animal(1).unwrap(), None);
    assert_eq!(reopened.search(&SearchQuery::default()).unwrap().len(), 8);
    reopened.close().unwrap();

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_ignored_insert_is_a_write_failure() {
    let path = temp_db_path("ignored-insert");
    Persistence::open(&path).unwrap().close().unwrap();

    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER skip BEFORE INSERT ON Animals BEGIN SELECT RAISE(IGNORE); END;",
    )
    .unwrap();
    conn.close().unwrap();

    let persistence = Persistence::open(&path).unwrap();
    let err = persistence.new_animal(&garfield().build().unwrap()).unwrap_err();
    assert!(matches!(err, ShelterError::WriteFailed(_)));
    assert_eq!(err.error_code(), "WRITE_FAILED");
    assert!(persistence.get_cages().unwrap().is_empty());
    persistence.close().unwrap();

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_open_waits_for_locked_file() {
    let path = temp_db_path("locked");
    Persistence::open(&path).unwrap().close().unwrap();

    let locker = rusqlite::Connection::open(&path).unwrap();
    locker.execute_batch("BEGIN EXCLUSIVE").unwrap();
    let release = thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        locker.execute_batch("COMMIT").unwrap();
        locker.close().unwrap();
    });

    let config = ShelterConfig {
        database: path.clone(),
        sample_data: false,
        busy_timeout_ms: Some(5000),
    };
    let persistence = Persistence::from_config(&config).unwrap();
    release.join().unwrap();

    assert!(persistence.get_cages().unwrap().is_empty());
    persistence.close().unwrap();

    let _ = std::fs::remove_file(&path);
}
