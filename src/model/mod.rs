//! Shelter Record Model
//!
//! This module defines the value types handled by the persistence engine:
//! - Closed enumerations (`Species`, `Gender`, `Size`, `Color`) with a fixed
//!   mapping to and from their stored string form
//! - [`Animal`] records, built through [`AnimalBuilder`]
//! - [`Cage`] occupancy aggregates
//! - [`SearchQuery`] filter specifications
//!
//! # Storage Strings
//! Enum members are stored and serialized with short lowercase names
//! (`dog`, `m`, `medium`, `dGray`, ...). Parsing a string that names no member
//! fails with [`ShelterError::UnknownEnumValue`]; it is never coerced to a default.

use rusqlite::types::{ToSql, ToSqlOutput, Value};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, ShelterError};

mod animal;

pub use animal::{Animal, AnimalBuilder};

/// Delimiter used when a color list is stored as a single column
pub const COLOR_DELIMITER: char = ',';

/// Closed enumeration with a fixed string representation in storage
pub trait StorageEnum: Sized + Copy + 'static {
    /// Name of the enumeration, used in error messages
    const KIND: &'static str;

    /// Every member, in declaration order
    const ALL: &'static [Self];

    /// The stored string for this member
    fn as_str(&self) -> &'static str;

    /// Parse a stored string back into a member
    fn from_storage(value: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|member| member.as_str() == value)
            .ok_or_else(|| ShelterError::unknown_enum_value(Self::KIND, value))
    }
}

macro_rules! storage_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant ),+
        }

        impl StorageEnum for $name {
            const KIND: &'static str = $kind;
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ShelterError;

            fn from_str(s: &str) -> Result<Self> {
                Self::from_storage(s)
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl From<$name> for Value {
            fn from(member: $name) -> Self {
                Value::Text(member.as_str().to_string())
            }
        }
    };
}

storage_enum! {
    /// Animal species accepted by the shelter
    Species, "species" {
        Dog => "dog",
        Cat => "cat",
    }
}

storage_enum! {
    /// Animal gender
    Gender, "gender" {
        Male => "m",
        Female => "f",
    }
}

storage_enum! {
    /// Animal size class
    Size, "size" {
        Small => "small",
        Medium => "medium",
        Large => "large",
    }
}

storage_enum! {
    /// Coat color
    Color, "color" {
        Black => "black",
        White => "white",
        Brown => "brown",
        Gold => "gold",
        DarkGray => "dGray",
        LightGray => "lGray",
    }
}

impl Color {
    /// Join colors into their stored, delimited form
    #[must_use]
    pub fn join(colors: &[Self]) -> String {
        colors.iter().map(Self::as_str).collect::<Vec<_>>().join(&COLOR_DELIMITER.to_string())
    }

    /// Split a stored, delimited color column
    ///
    /// An empty column is rejected: every stored animal has at least one color.
    pub fn split(stored: &str) -> Result<Vec<Self>> {
        stored.split(COLOR_DELIMITER).map(|part| Self::from_storage(part.trim())).collect()
    }
}

/// Occupancy of one cage, computed from the animals currently housed in it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cage {
    /// Cage number
    pub cage_number: i64,

    /// Number of dogs in the cage
    pub dog_count: u32,

    /// Number of cats in the cage
    pub cat_count: u32,
}

impl Cage {
    /// Create a cage record
    #[must_use]
    pub const fn new(cage_number: i64, dog_count: u32, cat_count: u32) -> Self {
        Self {
            cage_number,
            dog_count,
            cat_count,
        }
    }

    /// An occupancy record with no animals counted yet
    #[must_use]
    pub const fn empty(cage_number: i64) -> Self {
        Self::new(cage_number, 0, 0)
    }

    /// Set the count for one species
    pub fn set_count(&mut self, species: Species, count: u32) {
        match species {
            Species::Dog => self.dog_count = count,
            Species::Cat => self.cat_count = count,
        }
    }
}

/// Filter specification for an animal search
///
/// Absent or empty fields impose no constraint. `vaccinated` and `spay_neuter`
/// only constrain the search when `true`; `false` means "either".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchQuery {
    /// Exact species
    pub species: Option<Species>,

    /// Any of these genders
    #[serde(deserialize_with = "null_as_empty")]
    pub genders: Vec<Gender>,

    /// Breed substring
    pub breed: Option<String>,

    /// Any of these colors
    #[serde(deserialize_with = "null_as_empty")]
    pub colors: Vec<Color>,

    /// Any of these sizes
    #[serde(deserialize_with = "null_as_empty")]
    pub sizes: Vec<Size>,

    /// Exact cage number
    pub cage_number: Option<i64>,

    /// Only vaccinated animals
    pub vaccinated: bool,

    /// Only spayed or neutered animals
    pub spay_neuter: bool,
}

impl SearchQuery {
    /// A query with no constraints
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn species(mut self, species: Species) -> Self {
        self.species = Some(species);
        self
    }

    #[must_use]
    pub fn genders(mut self, genders: impl IntoIterator<Item = Gender>) -> Self {
        self.genders = genders.into_iter().collect();
        self
    }

    #[must_use]
    pub fn breed(mut self, breed: impl Into<String>) -> Self {
        self.breed = Some(breed.into());
        self
    }

    #[must_use]
    pub fn colors(mut self, colors: impl IntoIterator<Item = Color>) -> Self {
        self.colors = colors.into_iter().collect();
        self
    }

    #[must_use]
    pub fn sizes(mut self, sizes: impl IntoIterator<Item = Size>) -> Self {
        self.sizes = sizes.into_iter().collect();
        self
    }

    #[must_use]
    pub const fn cage_number(mut self, cage_number: i64) -> Self {
        self.cage_number = Some(cage_number);
        self
    }

    #[must_use]
    pub const fn vaccinated(mut self, vaccinated: bool) -> Self {
        self.vaccinated = vaccinated;
        self
    }

    #[must_use]
    pub const fn spay_neuter(mut self, spay_neuter: bool) -> Self {
        self.spay_neuter = spay_neuter;
        self
    }
}

/// Accept `null` wherever a list filter is expected
fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}
