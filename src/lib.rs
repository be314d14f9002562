//! GetPet - Animal Shelter Records
//!
//! GetPet keeps intake records for the animals housed in a shelter: one row per
//! animal, stored in `SQLite`, with filtered search and per-cage occupancy.
//!
//! # Architecture
//! The [`persistence`] engine owns the database connection and runs every
//! operation as a single parameterized statement built by [`query`]. The
//! [`service`] layer moves the engine onto a worker thread so async callers can
//! share it, and the CLI and the JSON-RPC server are thin wrappers over [`api`].
//!
//! # Module Organization
//! - [`error`] - Error types and handling
//! - [`model`] - Animals, cages, search queries and stored enum values
//! - [`query`] - Parameterized WHERE clause builder
//! - [`persistence`] - `SQLite` persistence engine
//! - [`service`] - Serialized async access to the engine
//! - [`api`] - Transport-neutral requests and responses
//! - [`rpc`] - JSON-RPC 2.0 server over stdio
//! - [`output`] - JSON output envelopes for the CLI
//! - [`config`] - Configuration management
//! - [`logging`] - Log subscriber setup

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod output;
pub mod persistence;
pub mod query;
pub mod rpc;
pub mod service;

pub use config::{ConfigLocation, ShelterConfig};
pub use error::{Result, ShelterError};
pub use model::{
    Animal, AnimalBuilder, Cage, Color, Gender, SearchQuery, Size, Species, StorageEnum,
};
pub use output::{ErrorEnvelope, ErrorInfo, Metadata, SuccessEnvelope};
pub use persistence::Persistence;
pub use service::ShelterService;
