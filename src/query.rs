//! Parameterized WHERE Clause Builder
//!
//! Search filters are assembled as an ordered list of typed predicates. Each
//! predicate renders its own SQL fragment with `?` placeholders and contributes
//! its bound values in the same order, so the statement text and the parameter
//! list can never drift apart. User-supplied values only ever travel as bound
//! parameters; column names are static identifiers chosen by this crate.
//!
//! # Predicate Kinds
//! - `Is`: `column = ?`
//! - `Like`: `column LIKE ?`, value wrapped as `%value%`
//! - `In`: `column IN (?, ?, ...)`, one placeholder per value
//! - `Has`: `(column LIKE ? OR column LIKE ? ...)`, each value wrapped as `%value%`
//!
//! `LIKE` wildcards typed by the user (`%`, `_`) are not escaped and keep their
//! wildcard meaning.

use rusqlite::types::Value;

use crate::model::{SearchQuery, StorageEnum};

/// Column list shared by every statement that materializes an `Animal`
pub const SELECT_ANIMALS: &str = "SELECT intakeNumber, cageNumber, species, breed, size, color, \
     gender, weight, vaccinated, spayNeuter, name, missing FROM Animals";

/// Fragment used when no predicate was added
const ALWAYS_TRUE: &str = "TRUE";

/// One boolean condition of a WHERE clause
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column = ?`
    Is { column: &'static str, value: Value },

    /// `column LIKE ?` against `%value%`
    Like { column: &'static str, value: String },

    /// `column IN (?, ...)`; never constructed empty
    In { column: &'static str, values: Vec<Value> },

    /// Any of the values occurs as a substring of `column`; never constructed empty
    Has { column: &'static str, values: Vec<String> },
}

impl Predicate {
    /// Append this predicate's SQL fragment
    fn write_sql(&self, sql: &mut String) {
        match self {
            Self::Is { column, .. } => {
                sql.push_str(column);
                sql.push_str(" = ?");
            }
            Self::Like { column, .. } => {
                sql.push_str(column);
                sql.push_str(" LIKE ?");
            }
            Self::In { column, values } => {
                sql.push_str(column);
                sql.push_str(" IN (");
                sql.push_str(&vec!["?"; values.len()].join(", "));
                sql.push(')');
            }
            Self::Has { column, values } => {
                let alternatives = vec![format!("{column} LIKE ?"); values.len()];
                sql.push('(');
                sql.push_str(&alternatives.join(" OR "));
                sql.push(')');
            }
        }
    }

    /// Append this predicate's bound values, in placeholder order
    fn push_params(&self, params: &mut Vec<Value>) {
        match self {
            Self::Is { value, .. } => params.push(value.clone()),
            Self::Like { value, .. } => params.push(Value::Text(contains_pattern(value))),
            Self::In { values, .. } => params.extend(values.iter().cloned()),
            Self::Has { values, .. } => {
                params.extend(values.iter().map(|value| Value::Text(contains_pattern(value))));
            }
        }
    }

    /// Number of placeholders in the rendered fragment
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        match self {
            Self::Is { .. } | Self::Like { .. } => 1,
            Self::In { values, .. } => values.len(),
            Self::Has { values, .. } => values.len(),
        }
    }
}

/// Wrap a value for a substring `LIKE` match
fn contains_pattern(value: &str) -> String {
    format!("%{value}%")
}

/// Ordered conjunction of predicates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    predicates: Vec<Predicate>,
}

impl WhereClause {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `column = value` when a value is present
    pub fn is<V: Into<Value>>(&mut self, column: &'static str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.predicates.push(Predicate::Is {
                column,
                value: value.into(),
            });
        }
        self
    }

    /// Require `column` to contain `value` when a value is present
    pub fn like(&mut self, column: &'static str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.predicates.push(Predicate::Like {
                column,
                value: value.to_string(),
            });
        }
        self
    }

    /// Require `column` to equal one of `values` when there are any
    pub fn is_in<V: Into<Value>>(
        &mut self,
        column: &'static str,
        values: impl IntoIterator<Item = V>,
    ) -> &mut Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if !values.is_empty() {
            self.predicates.push(Predicate::In { column, values });
        }
        self
    }

    /// Require `column` to contain at least one of `values` when there are any
    pub fn has<S: Into<String>>(
        &mut self,
        column: &'static str,
        values: impl IntoIterator<Item = S>,
    ) -> &mut Self {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if !values.is_empty() {
            self.predicates.push(Predicate::Has { column, values });
        }
        self
    }

    /// Predicates in the order they were added
    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Render the clause body (without the `WHERE` keyword)
    ///
    /// An empty clause renders as a literal always-true fragment so the
    /// resulting statement stays valid.
    #[must_use]
    pub fn to_sql(&self) -> String {
        if self.predicates.is_empty() {
            return ALWAYS_TRUE.to_string();
        }

        let mut sql = String::new();
        for (i, predicate) in self.predicates.iter().enumerate() {
            if i > 0 {
                sql.push_str(" AND ");
            }
            predicate.write_sql(&mut sql);
        }
        sql
    }

    /// Bound values for every placeholder of [`WhereClause::to_sql`], in order
    #[must_use]
    pub fn params(&self) -> Vec<Value> {
        let capacity = self.predicates.iter().map(Predicate::placeholder_count).sum();
        let mut params = Vec::with_capacity(capacity);
        for predicate in &self.predicates {
            predicate.push_params(&mut params);
        }
        params
    }
}

/// Statement text plus its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    /// Select animals matching `clause`, ordered by name
    #[must_use]
    pub fn select_animals(clause: &WhereClause) -> Self {
        Self {
            sql: format!("{SELECT_ANIMALS} WHERE {} ORDER BY name", clause.to_sql()),
            params: clause.params(),
        }
    }
}

/// Translate a search query into its WHERE clause
///
/// Constraints are added in a fixed order: species, gender, breed, color,
/// size, cage number, vaccinated, spay/neuter.
#[must_use]
pub fn search_clause(query: &SearchQuery) -> WhereClause {
    let mut clause = WhereClause::new();
    clause
        .is("species", query.species)
        .is_in("gender", query.genders.iter().copied())
        .like("breed", query.breed.as_deref())
        .has("color", query.colors.iter().map(|color| color.as_str()))
        .is_in("size", query.sizes.iter().copied())
        .is("cageNumber", query.cage_number)
        .is("vaccinated", query.vaccinated.then_some(1_i64))
        .is("spayNeuter", query.spay_neuter.then_some(1_i64));
    clause
}

/// Build the full search statement for a query
#[must_use]
pub fn animal_search(query: &SearchQuery) -> Statement {
    Statement::select_animals(&search_clause(query))
}
