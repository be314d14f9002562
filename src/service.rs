//! Serialized Access to the Persistence Engine
//!
//! [`Persistence`] cannot be shared between threads, so [`ShelterService`]
//! moves it onto a dedicated worker thread and talks to it over a bounded
//! command queue. Each command carries a `oneshot` channel for its reply.
//!
//! # Guarantees
//! - Operations run strictly one at a time, in the order they were queued
//! - The handle is cheap to clone; every clone feeds the same worker
//! - Dropping every handle (or calling [`ShelterService::shutdown`]) stops the
//!   worker and closes the connection
//! - Once the worker is gone, every call fails with `ServiceUnavailable`

use std::thread;
use tokio::sync::{mpsc, oneshot};

use crate::error::{Result, ShelterError};
use crate::model::{Animal, Cage, SearchQuery};
use crate::persistence::Persistence;

/// Maximum number of commands waiting for the worker
const QUEUE_CAPACITY: usize = 64;

type Reply<T> = oneshot::Sender<Result<T>>;

/// Work item executed by the persistence worker
enum Command {
    Cages { reply: Reply<Vec<Cage>> },
    GetAnimal {
        intake_number: i64,
        reply: Reply<Option<Animal>>,
    },
    Search {
        query: SearchQuery,
        reply: Reply<Vec<Animal>>,
    },
    NewAnimal { animal: Animal, reply: Reply<i64> },
    UpdateAnimal {
        intake_number: i64,
        animal: Animal,
        reply: Reply<bool>,
    },
    DeleteAnimal {
        intake_number: i64,
        reply: Reply<bool>,
    },
    Shutdown { reply: Reply<()> },
}

impl Command {
    const fn name(&self) -> &'static str {
        match self {
            Self::Cages { .. } => "cages",
            Self::GetAnimal { .. } => "get_animal",
            Self::Search { .. } => "search",
            Self::NewAnimal { .. } => "new_animal",
            Self::UpdateAnimal { .. } => "update_animal",
            Self::DeleteAnimal { .. } => "delete_animal",
            Self::Shutdown { .. } => "shutdown",
        }
    }
}

/// Cloneable async handle to the shelter persistence worker
#[derive(Debug, Clone)]
pub struct ShelterService {
    sender: mpsc::Sender<Command>,
}

impl ShelterService {
    /// Move `persistence` onto a new worker thread
    pub fn start(persistence: Persistence) -> Result<Self> {
        let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);

        thread::Builder::new()
            .name("getpet-persistence".to_string())
            .spawn(move || worker_loop(persistence, receiver))
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to spawn persistence worker");
                ShelterError::ServiceUnavailable
            })?;

        Ok(Self { sender })
    }

    /// Occupancy of every occupied cage
    pub async fn get_cages(&self) -> Result<Vec<Cage>> {
        self.request(|reply| Command::Cages { reply }).await
    }

    /// Look up one animal by intake number
    pub async fn get_animal(&self, intake_number: i64) -> Result<Option<Animal>> {
        self.request(|reply| Command::GetAnimal {
            intake_number,
            reply,
        })
        .await
    }

    /// Animals matching a query, ordered by name
    pub async fn search(&self, query: SearchQuery) -> Result<Vec<Animal>> {
        self.request(|reply| Command::Search { query, reply }).await
    }

    /// Insert an animal, returning its new intake number
    pub async fn new_animal(&self, animal: Animal) -> Result<i64> {
        self.request(|reply| Command::NewAnimal { animal, reply }).await
    }

    /// Replace a stored animal; `false` when it does not exist
    pub async fn update_animal(&self, intake_number: i64, animal: Animal) -> Result<bool> {
        self.request(|reply| Command::UpdateAnimal {
            intake_number,
            animal,
            reply,
        })
        .await
    }

    /// Remove a stored animal; `false` when it does not exist
    pub async fn delete_animal(&self, intake_number: i64) -> Result<bool> {
        self.request(|reply| Command::DeleteAnimal {
            intake_number,
            reply,
        })
        .await
    }

    /// Stop the worker after the commands already queued, closing the connection
    ///
    /// Every handle fails with `ServiceUnavailable` afterwards.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    async fn request<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(command(reply))
            .await
            .map_err(|_| ShelterError::ServiceUnavailable)?;

        response.await.map_err(|_| ShelterError::ServiceUnavailable)?
    }
}

/// Execute commands until every handle is dropped or a shutdown arrives
fn worker_loop(persistence: Persistence, mut receiver: mpsc::Receiver<Command>) {
    tracing::debug!("Persistence worker started");

    while let Some(command) = receiver.blocking_recv() {
        tracing::debug!(command = command.name(), "Executing command");

        // A dropped reply receiver means the caller gave up; the result is discarded
        match command {
            Command::Cages { reply } => {
                let _ = reply.send(persistence.get_cages());
            }
            Command::GetAnimal { intake_number, reply } => {
                let _ = reply.send(persistence.get_animal(intake_number));
            }
            Command::Search { query, reply } => {
                let _ = reply.send(persistence.search(&query));
            }
            Command::NewAnimal { animal, reply } => {
                let _ = reply.send(persistence.new_animal(&animal));
            }
            Command::UpdateAnimal { intake_number, animal, reply } => {
                let _ = reply.send(persistence.update_animal(intake_number, &animal));
            }
            Command::DeleteAnimal { intake_number, reply } => {
                let _ = reply.send(persistence.delete_animal(intake_number));
            }
            Command::Shutdown { reply } => {
                receiver.close();
                let _ = reply.send(persistence.close());
                tracing::debug!("Persistence worker stopped on request");
                return;
            }
        }
    }

    if let Err(e) = persistence.close() {
        tracing::warn!(error = %e, "Failed to close database on worker exit");
    }
    tracing::debug!("Persistence worker stopped");
}
