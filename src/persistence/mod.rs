//! `SQLite` Persistence Engine
//!
//! [`Persistence`] owns the single database connection and exposes the shelter
//! operations: point lookup, search, insert, update, delete and cage
//! aggregation. Every operation issues exactly one statement.
//!
//! # Lifecycle
//! A `Persistence` is connected from construction until [`Persistence::close`]
//! (or drop). Opening fails with `ConnectionFailed` when the store cannot be
//! reached. There is no reconnection; a failure on a later statement surfaces
//! as a `Persistence` error for that call.
//!
//! # Concurrency
//! `rusqlite::Connection` is `Send` but not `Sync`, and so is `Persistence`:
//! it can be moved to a worker thread but never shared between threads.
//! See [`crate::service`] for the serialized multi-caller front end.
//!
//! # Row Mapping
//! - `color` holds the color list joined with [`crate::model::COLOR_DELIMITER`]
//! - `vaccinated`, `spayNeuter` and `missing` hold 0/1 integers
//! - enum columns hold their storage strings; unknown strings are rejected

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;
use std::time::Duration;

use crate::config::ShelterConfig;
use crate::error::{Result, ShelterError};
use crate::model::{Animal, Cage, Color, Gender, SearchQuery, Size, Species, StorageEnum};
use crate::query::{animal_search, SELECT_ANIMALS};

/// Table definition, applied on every open
const SCHEMA: &str = include_str!("schema.sql");

/// Seed rows for demonstration and test environments
const SAMPLE_DATA: &str = include_str!("sample-data.sql");

const SELECT_ANIMAL_BY_KEY: &str = "WHERE intakeNumber = ?1";

const INSERT_ANIMAL: &str = "INSERT INTO Animals \
     (cageNumber, species, breed, size, color, gender, weight, \
     vaccinated, spayNeuter, name, missing) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)";

const UPDATE_ANIMAL: &str = "UPDATE Animals SET \
     cageNumber = ?1, species = ?2, breed = ?3, size = ?4, color = ?5, gender = ?6, \
     weight = ?7, vaccinated = ?8, spayNeuter = ?9, name = ?10, missing = ?11 \
     WHERE intakeNumber = ?12";

const DELETE_ANIMAL: &str = "DELETE FROM Animals WHERE intakeNumber = ?1";

const COUNT_ANIMALS: &str = "SELECT COUNT(*) FROM Animals";

const CAGE_OCCUPANCY: &str = "SELECT cageNumber, species, COUNT(*) AS count FROM Animals \
     GROUP BY cageNumber, species ORDER BY cageNumber, species";

/// Shelter persistence engine backed by one `SQLite` connection
#[derive(Debug)]
pub struct Persistence {
    conn: Connection,
}

impl Persistence {
    /// Open (or create) a database file; `:memory:` opens a private in-memory database
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path.as_ref(), None)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            ShelterError::connection_failed(format!("Failed to open in-memory database: {e}"))
        })?;

        Self::with_connection(conn, None)
    }

    /// Open the database described by a configuration, applying sample data if requested
    pub fn from_config(config: &ShelterConfig) -> Result<Self> {
        if config.is_in_memory() {
            tracing::warn!("Using an in-memory database; changes are lost on exit");
        }

        let busy_timeout = config.busy_timeout_ms.map(Duration::from_millis);
        let persistence = Self::open_with(&config.database, busy_timeout)?;

        if config.sample_data {
            persistence.apply_sample_data()?;
        }

        Ok(persistence)
    }

    fn open_with(path: &Path, busy_timeout: Option<Duration>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| {
            ShelterError::connection_failed(format!(
                "Failed to open SQLite database '{}': {e}",
                path.display()
            ))
        })?;

        tracing::info!(database = %path.display(), "Opened shelter database");
        Self::with_connection(conn, busy_timeout)
    }

    fn with_connection(conn: Connection, busy_timeout: Option<Duration>) -> Result<Self> {
        // Must precede the schema so table creation also waits on a locked file
        if let Some(timeout) = busy_timeout {
            conn.busy_timeout(timeout)
                .map_err(|e| ShelterError::persistence("Failed to set busy timeout", e))?;
        }

        conn.execute_batch(SCHEMA)
            .map_err(|e| ShelterError::persistence("Failed to create Animals table", e))?;

        Ok(Self { conn })
    }

    /// Load the bundled sample animals into an empty store
    ///
    /// Returns the number of rows inserted; a store that already holds animals
    /// is left untouched and 0 is returned.
    pub fn apply_sample_data(&self) -> Result<usize> {
        let existing: i64 = self
            .conn
            .query_row(COUNT_ANIMALS, [], |row| row.get(0))
            .map_err(|e| ShelterError::persistence("Failed to count animals", e))?;

        if existing > 0 {
            tracing::debug!(existing, "Store is not empty, skipping sample data");
            return Ok(0);
        }

        self.conn
            .execute_batch(SAMPLE_DATA)
            .map_err(|e| ShelterError::persistence("Failed to apply sample data", e))?;

        let inserted = self.conn.changes();
        tracing::info!(inserted, "Applied sample data");
        Ok(usize::try_from(inserted).unwrap_or(usize::MAX))
    }

    /// Close the connection
    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| ShelterError::persistence("Failed to close database connection", e))
    }

    /// Occupancy of every cage holding at least one animal, by ascending cage number
    ///
    /// A species absent from an occupied cage is reported with a count of 0.
    pub fn get_cages(&self) -> Result<Vec<Cage>> {
        tracing::debug!(sql = CAGE_OCCUPANCY, "Executing cage occupancy query");

        let mut stmt = self
            .conn
            .prepare(CAGE_OCCUPANCY)
            .map_err(|e| ShelterError::persistence("Failed to prepare cage query", e))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, u32>(2)?))
            })
            .map_err(|e| ShelterError::persistence("Failed to execute cage query", e))?;

        let mut cages: Vec<Cage> = Vec::new();
        for row in rows {
            let (cage_number, species, count) =
                row.map_err(|e| ShelterError::persistence("Failed to read cage row", e))?;
            let species = Species::from_storage(&species)?;

            match cages.last_mut() {
                Some(cage) if cage.cage_number == cage_number => cage.set_count(species, count),
                _ => {
                    let mut cage = Cage::empty(cage_number);
                    cage.set_count(species, count);
                    cages.push(cage);
                }
            }
        }

        Ok(cages)
    }

    /// Look up an animal by intake number; `None` when no row matches
    pub fn get_animal(&self, intake_number: i64) -> Result<Option<Animal>> {
        let sql = format!("{SELECT_ANIMALS} {SELECT_ANIMAL_BY_KEY}");
        tracing::debug!(%sql, "Executing animal lookup");

        let row = self
            .conn
            .query_row(&sql, [intake_number], AnimalRow::from_row)
            .optional()
            .map_err(|e| ShelterError::persistence("Failed to execute animal lookup", e))?;

        row.map(AnimalRow::into_animal).transpose()
    }

    /// Animals matching every constraint of `query`, ordered by name
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<Animal>> {
        let statement = animal_search(query);
        tracing::debug!(
            sql = %statement.sql,
            params = statement.params.len(),
            "Executing animal search"
        );

        let mut stmt = self
            .conn
            .prepare(&statement.sql)
            .map_err(|e| ShelterError::persistence("Failed to prepare animal search", e))?;

        let rows = stmt
            .query_map(params_from_iter(statement.params.iter()), AnimalRow::from_row)
            .map_err(|e| ShelterError::persistence("Failed to execute animal search", e))?;

        let mut animals = Vec::new();
        for row in rows {
            let row = row.map_err(|e| ShelterError::persistence("Failed to read animal row", e))?;
            animals.push(row.into_animal()?);
        }

        Ok(animals)
    }

    /// Insert an animal and return the intake number assigned by the store
    ///
    /// Any intake number already set on `animal` is ignored.
    pub fn new_animal(&self, animal: &Animal) -> Result<i64> {
        if let Some(ignored) = animal.intake_number() {
            tracing::debug!(ignored, "Ignoring caller-supplied intake number on insert");
        }
        tracing::debug!(sql = INSERT_ANIMAL, "Executing animal insert");

        let changed = self
            .conn
            .execute(INSERT_ANIMAL, params_from_iter(record_params(animal)))
            .map_err(|e| ShelterError::persistence("Failed to insert animal", e))?;

        if changed == 0 {
            return Err(ShelterError::write_failed("Animal insert affected no rows"));
        }

        Ok(self.conn.last_insert_rowid())
    }

    /// Replace every stored field of an animal; `false` when no such animal exists
    pub fn update_animal(&self, intake_number: i64, animal: &Animal) -> Result<bool> {
        tracing::debug!(sql = UPDATE_ANIMAL, intake_number, "Executing animal update");

        let mut params = record_params(animal);
        params.push(Value::Integer(intake_number));

        let changed = self
            .conn
            .execute(UPDATE_ANIMAL, params_from_iter(params))
            .map_err(|e| ShelterError::persistence("Failed to update animal", e))?;

        Ok(changed != 0)
    }

    /// Remove an animal; `false` when no such animal exists
    pub fn delete_animal(&self, intake_number: i64) -> Result<bool> {
        tracing::debug!(sql = DELETE_ANIMAL, intake_number, "Executing animal delete");

        let changed = self
            .conn
            .execute(DELETE_ANIMAL, [intake_number])
            .map_err(|e| ShelterError::persistence("Failed to delete animal", e))?;

        Ok(changed != 0)
    }
}

/// Bound values for the eleven stored fields, in column order
fn record_params(animal: &Animal) -> Vec<Value> {
    vec![
        Value::Integer(animal.cage_number()),
        animal.species().into(),
        Value::Text(animal.breed().to_string()),
        animal.size().into(),
        Value::Text(Color::join(animal.colors())),
        animal.gender().into(),
        Value::Real(animal.weight()),
        flag(animal.vaccinated()),
        flag(animal.spay_neuter()),
        Value::Text(animal.name().to_string()),
        flag(animal.missing()),
    ]
}

fn flag(value: bool) -> Value {
    Value::Integer(i64::from(value))
}

/// Raw column values of one `Animals` row
struct AnimalRow {
    intake_number: i64,
    cage_number: i64,
    species: String,
    breed: String,
    size: String,
    color: String,
    gender: String,
    weight: f64,
    vaccinated: i64,
    spay_neuter: i64,
    name: String,
    missing: i64,
}

impl AnimalRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            intake_number: row.get("intakeNumber")?,
            cage_number: row.get("cageNumber")?,
            species: row.get("species")?,
            breed: row.get("breed")?,
            size: row.get("size")?,
            color: row.get("color")?,
            gender: row.get("gender")?,
            weight: row.get("weight")?,
            vaccinated: row.get("vaccinated")?,
            spay_neuter: row.get("spayNeuter")?,
            name: row.get("name")?,
            missing: row.get("missing")?,
        })
    }

    fn into_animal(self) -> Result<Animal> {
        Animal::builder()
            .intake_number(self.intake_number)
            .cage_number(self.cage_number)
            .species(Species::from_storage(&self.species)?)
            .breed(self.breed)
            .size(Size::from_storage(&self.size)?)
            .colors(Color::split(&self.color)?)
            .gender(Gender::from_storage(&self.gender)?)
            .weight(self.weight)
            .vaccinated(self.vaccinated != 0)
            .spay_neuter(self.spay_neuter != 0)
            .name(self.name)
            .missing(self.missing != 0)
            .build()
    }
}
