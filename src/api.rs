//! Request/Response Boundary
//!
//! Transport-neutral request and response bodies shared by the RPC server and
//! the CLI. A request names a method and carries its parameters as an object:
//!
//! ```json
//! {"method": "animal/get", "params": {"intakeNumber": 1}}
//! {"method": "search", "params": {"species": "dog", "colors": ["gold"]}}
//! ```
//!
//! Response bodies are single-key objects: `cages`, `animal`, `results`,
//! `intakeNumber`, `updated` or `deleted`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, ShelterError};
use crate::model::{Animal, Cage, SearchQuery};
use crate::service::ShelterService;

/// A call against the shelter store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum Request {
    /// Occupancy of every occupied cage
    #[serde(rename = "cages")]
    Cages {},

    /// One animal by intake number
    #[serde(rename = "animal/get", rename_all = "camelCase")]
    GetAnimal { intake_number: i64 },

    /// Insert an animal
    #[serde(rename = "animal/new")]
    NewAnimal { animal: Animal },

    /// Replace an animal
    #[serde(rename = "animal/update", rename_all = "camelCase")]
    UpdateAnimal { intake_number: i64, animal: Animal },

    /// Remove an animal
    #[serde(rename = "animal/delete", rename_all = "camelCase")]
    DeleteAnimal { intake_number: i64 },

    /// Filtered search
    #[serde(rename = "search")]
    Search(SearchQuery),
}

impl Request {
    /// Every method name accepted by [`Request::from_parts`]
    pub const METHODS: &'static [&'static str] =
        &["cages", "animal/get", "animal/new", "animal/update", "animal/delete", "search"];

    /// Build a request from a method name and optional parameters
    ///
    /// Absent or `null` parameters are treated as an empty object.
    pub fn from_parts(
        method: &str,
        params: Option<Value>,
    ) -> std::result::Result<Self, RequestError> {
        if !Self::METHODS.contains(&method) {
            return Err(RequestError::UnknownMethod(method.to_string()));
        }

        let params = match params {
            None | Some(Value::Null) => Value::Object(serde_json::Map::new()),
            Some(params) => params,
        };

        serde_json::from_value(serde_json::json!({ "method": method, "params": params }))
            .map_err(|e| RequestError::InvalidParams(e.to_string()))
    }

    /// Method name of this request
    #[must_use]
    pub const fn method(&self) -> &'static str {
        match self {
            Self::Cages {} => "cages",
            Self::GetAnimal { .. } => "animal/get",
            Self::NewAnimal { .. } => "animal/new",
            Self::UpdateAnimal { .. } => "animal/update",
            Self::DeleteAnimal { .. } => "animal/delete",
            Self::Search(_) => "search",
        }
    }
}

/// Why a request could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),
}

impl From<RequestError> for ShelterError {
    fn from(err: RequestError) -> Self {
        Self::invalid_input(err.to_string())
    }
}

/// Result body of a successful request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Cages {
        cages: Vec<Cage>,
    },
    Animal {
        animal: Option<Animal>,
    },
    Results {
        results: Vec<Animal>,
    },
    IntakeNumber {
        #[serde(rename = "intakeNumber")]
        intake_number: i64,
    },
    Updated {
        updated: bool,
    },
    Deleted {
        deleted: bool,
    },
}

/// Execute a request against the service
pub async fn handle(service: &ShelterService, request: Request) -> Result<Response> {
    let response = match request {
        Request::Cages {} => Response::Cages {
            cages: service.get_cages().await?,
        },
        Request::GetAnimal { intake_number } => Response::Animal {
            animal: service.get_animal(intake_number).await?,
        },
        Request::NewAnimal { animal } => Response::IntakeNumber {
            intake_number: service.new_animal(animal).await?,
        },
        Request::UpdateAnimal {
            intake_number,
            animal,
        } => Response::Updated {
            updated: service.update_animal(intake_number, animal).await?,
        },
        Request::DeleteAnimal { intake_number } => Response::Deleted {
            deleted: service.delete_animal(intake_number).await?,
        },
        Request::Search(query) => Response::Results {
            results: service.search(query).await?,
        },
    };

    Ok(response)
}
