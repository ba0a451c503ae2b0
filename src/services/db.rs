//! # Database Services
//!
//! This module provides the core functionality for interacting with the database within the
//! piletas-sync service. It includes the `DatabaseService`, which owns the connection pool and
//! hands out repositories for the timer, display-order and bay tables.

use std::sync::Arc;
use secrecy::ExposeSecret;
use crate::config::Settings;
use crate::errors::PiletasResult;
use crate::repositories::{MssqlBayRepository, MssqlDisplayOrderRepository, MssqlTimerRepository};
use crate::services::DatabaseClient;

/// Provides access to the persisted timer, display-order and bay tables.
pub struct DatabaseService {
    /// The database client for the local database
    client: DatabaseClient,
    /// The application settings containing database configuration
    settings: Arc<Settings>,
}

impl DatabaseService {
    /// Creates a new `DatabaseService`
    ///
    /// Initializes the service by establishing a connection pool to the local database
    ///
    /// # Arguments
    ///
    /// * `settings`: The application settings containing the database configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Self)`: The initialized `DatabaseService` instance
    /// * `Err(PiletasError)`: If there's an error establishing the database connection
    pub async fn new(settings: Arc<Settings>) -> PiletasResult<Self> {
        let client = DatabaseClient::new(
            settings.database.connection_string().expose_secret(),
            &settings.database.app_name,
        )
        .await?;

        Ok(Self { client, settings })
    }

    /// A repository over the active-timer table.
    pub fn timers(&self) -> MssqlTimerRepository {
        MssqlTimerRepository::new(self.client.clone())
    }

    /// A repository over the display-order table.
    pub fn display_orders(&self) -> MssqlDisplayOrderRepository {
        MssqlDisplayOrderRepository::new(self.client.clone())
    }

    /// A repository over the fixed cooling-bay table.
    pub fn bays(&self) -> MssqlBayRepository {
        MssqlBayRepository::new(self.client.clone())
    }

    pub fn settings(&self) -> Arc<Settings> {
        Arc::clone(&self.settings)
    }
}
