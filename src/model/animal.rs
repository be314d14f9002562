use serde::{Deserialize, Serialize};

use super::{Color, Gender, Size, Species};
use crate::error::{Result, ShelterError};

/// One shelter intake record
///
/// `Animal` is an immutable value. The only way to obtain one is
/// [`AnimalBuilder::build`], which refuses partially specified records, so
/// every `Animal` in circulation can be persisted as-is. Equality covers every
/// field, including the intake number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "AnimalBuilder")]
pub struct Animal {
    #[serde(skip_serializing_if = "Option::is_none")]
    intake_number: Option<i64>,
    cage_number: i64,
    species: Species,
    breed: String,
    size: Size,
    colors: Vec<Color>,
    gender: Gender,
    weight: f64,
    vaccinated: bool,
    spay_neuter: bool,
    name: String,
    missing: bool,
}

impl Animal {
    /// Start building a new record
    #[must_use]
    pub fn builder() -> AnimalBuilder {
        AnimalBuilder::default()
    }

    /// A builder pre-filled with every field of this record
    #[must_use]
    pub fn to_builder(&self) -> AnimalBuilder {
        AnimalBuilder {
            intake_number: self.intake_number,
            cage_number: Some(self.cage_number),
            species: Some(self.species),
            breed: Some(self.breed.clone()),
            size: Some(self.size),
            colors: Some(self.colors.clone()),
            gender: Some(self.gender),
            weight: Some(self.weight),
            vaccinated: Some(self.vaccinated),
            spay_neuter: Some(self.spay_neuter),
            name: Some(self.name.clone()),
            missing: Some(self.missing),
        }
    }

    /// The same record with a different (or no) intake number
    #[must_use]
    pub fn with_intake_number(mut self, intake_number: Option<i64>) -> Self {
        self.intake_number = intake_number;
        self
    }

    /// Primary key assigned by storage, absent until the record is inserted
    #[must_use]
    pub const fn intake_number(&self) -> Option<i64> {
        self.intake_number
    }

    #[must_use]
    pub const fn cage_number(&self) -> i64 {
        self.cage_number
    }

    #[must_use]
    pub const fn species(&self) -> Species {
        self.species
    }

    #[must_use]
    pub fn breed(&self) -> &str {
        &self.breed
    }

    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Coat colors, never empty
    #[must_use]
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    #[must_use]
    pub const fn gender(&self) -> Gender {
        self.gender
    }

    #[must_use]
    pub const fn weight(&self) -> f64 {
        self.weight
    }

    #[must_use]
    pub const fn vaccinated(&self) -> bool {
        self.vaccinated
    }

    #[must_use]
    pub const fn spay_neuter(&self) -> bool {
        self.spay_neuter
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn missing(&self) -> bool {
        self.missing
    }
}

/// Fluent builder for [`Animal`]
///
/// Also the wire shape of an animal: JSON payloads are decoded into a builder
/// and then validated by [`AnimalBuilder::build`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimalBuilder {
    intake_number: Option<i64>,
    cage_number: Option<i64>,
    species: Option<Species>,
    breed: Option<String>,
    size: Option<Size>,
    colors: Option<Vec<Color>>,
    gender: Option<Gender>,
    weight: Option<f64>,
    vaccinated: Option<bool>,
    spay_neuter: Option<bool>,
    name: Option<String>,
    missing: Option<bool>,
}

impl AnimalBuilder {
    #[must_use]
    pub const fn intake_number(mut self, intake_number: i64) -> Self {
        self.intake_number = Some(intake_number);
        self
    }

    #[must_use]
    pub const fn cage_number(mut self, cage_number: i64) -> Self {
        self.cage_number = Some(cage_number);
        self
    }

    #[must_use]
    pub const fn species(mut self, species: Species) -> Self {
        self.species = Some(species);
        self
    }

    #[must_use]
    pub fn breed(mut self, breed: impl Into<String>) -> Self {
        self.breed = Some(breed.into());
        self
    }

    #[must_use]
    pub const fn size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn colors(mut self, colors: impl IntoIterator<Item = Color>) -> Self {
        self.colors = Some(colors.into_iter().collect());
        self
    }

    #[must_use]
    pub const fn gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    #[must_use]
    pub const fn weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    #[must_use]
    pub const fn vaccinated(mut self, vaccinated: bool) -> Self {
        self.vaccinated = Some(vaccinated);
        self
    }

    #[must_use]
    pub const fn spay_neuter(mut self, spay_neuter: bool) -> Self {
        self.spay_neuter = Some(spay_neuter);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub const fn missing(mut self, missing: bool) -> Self {
        self.missing = Some(missing);
        self
    }

    /// Validate and produce the record
    ///
    /// # Errors
    /// - `MissingField` naming an unset field (the intake number is optional)
    /// - `InvalidField` for an empty or repeated color list, or a negative or
    ///   non-finite weight
    pub fn build(self) -> Result<Animal> {
        let colors = self.colors.ok_or(ShelterError::MissingField("colors"))?;
        if colors.is_empty() {
            return Err(ShelterError::invalid_field("colors", "at least one color is required"));
        }
        for (i, color) in colors.iter().enumerate() {
            if colors[..i].contains(color) {
                return Err(ShelterError::invalid_field(
                    "colors",
                    format!("{color} is listed twice"),
                ));
            }
        }

        let weight = self.weight.ok_or(ShelterError::MissingField("weight"))?;
        if !weight.is_finite() || weight < 0.0 {
            return Err(ShelterError::invalid_field(
                "weight",
                format!("must be a non-negative number, got {weight}"),
            ));
        }

        Ok(Animal {
            intake_number: self.intake_number,
            cage_number: self.cage_number.ok_or(ShelterError::MissingField("cageNumber"))?,
            species: self.species.ok_or(ShelterError::MissingField("species"))?,
            breed: self.breed.ok_or(ShelterError::MissingField("breed"))?,
            size: self.size.ok_or(ShelterError::MissingField("size"))?,
            colors,
            gender: self.gender.ok_or(ShelterError::MissingField("gender"))?,
            weight,
            vaccinated: self.vaccinated.ok_or(ShelterError::MissingField("vaccinated"))?,
            spay_neuter: self.spay_neuter.ok_or(ShelterError::MissingField("spayNeuter"))?,
            name: self.name.ok_or(ShelterError::MissingField("name"))?,
            missing: self.missing.ok_or(ShelterError::MissingField("missing"))?,
        })
    }
}

impl TryFrom<AnimalBuilder> for Animal {
    type Error = ShelterError;

    fn try_from(builder: AnimalBuilder) -> Result<Self> {
        builder.build()
    }
}
