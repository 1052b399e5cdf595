//! Composition root wiring every component together.

use std::sync::Arc;

use toastd_core::{Clock, Identity};
use toastd_storage::Database;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::NotificationApi;
use crate::center::CenterController;
use crate::client_events::ClientEventController;
use crate::clients::{ClientRegistry, Environment, LocalEnvironment, Transport};
use crate::config::{AppConfig, StorageBackend};
use crate::error::StoreError;
use crate::event_pump::EventPump;
use crate::expiry::ExpiryController;
use crate::persistor::Persistor;
use crate::store::Store;

pub struct NotificationServiceBuilder {
    config: AppConfig,
    transport: Arc<dyn Transport>,
    environment: Option<Arc<dyn Environment>>,
    database: Option<Database>,
    clock: Option<Clock>,
}

impl NotificationServiceBuilder {
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_environment(mut self, environment: Arc<dyn Environment>) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Overrides the database selected by `storage.backend`.
    pub fn with_database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Loads persisted state, connects every store listener and schedules
    /// pending expiries.
    pub async fn build(self) -> Result<NotificationService, StoreError> {
        let config = self.config;
        let clock = self.clock.unwrap_or_default();
        let database = self.database.unwrap_or_else(|| match config.storage.backend {
            StorageBackend::Memory => Database::in_memory(),
        });
        let environment = self.environment.unwrap_or_else(|| {
            Arc::new(LocalEnvironment::always_running()) as Arc<dyn Environment>
        });
        let transport = self.transport;

        let store = Arc::new(Store::new(database.clone()));
        store.init().await?;

        let registry = Arc::new(ClientRegistry::new(&store, environment));
        let pump = Arc::new(EventPump::new(
            transport.clone(),
            registry.clone(),
            config.events.replay_limit,
        ));
        EventPump::connect(&pump).await;

        // Listeners run in this order. Persisting and announcing a created
        // note must finish before expiry may remove it again.
        store
            .on_action()
            .connect(Arc::new(Persistor::new(database)))
            .await;
        store
            .on_action()
            .connect(Arc::new(ClientEventController::new(pump.clone())))
            .await;
        let expiry = if config.expiry.enabled {
            let expiry = ExpiryController::new(&store, clock);
            store.on_action().connect(expiry.clone()).await;
            Some(expiry)
        } else {
            info!("Notification expiry disabled");
            None
        };

        let center = Arc::new(CenterController::new(
            store.clone(),
            config.blur_toggle_block(),
            config.toggle_blur_block(),
        ));

        let connections = transport.subscribe();
        for identity in transport.client_connections() {
            registry.on_connection(&identity).await;
        }
        let registry_task = tokio::spawn(registry.clone().run(connections));

        if let Some(expiry) = &expiry
            && let Err(e) = expiry.init().await
        {
            warn!(error = %e, "Failed to expire overdue notifications on startup");
        }

        info!(
            notifications = store.state().notifications.len(),
            expiry = config.expiry.enabled,
            "Notification service started"
        );

        Ok(NotificationService {
            config,
            clock,
            store,
            registry,
            pump,
            center,
            expiry,
            registry_task,
        })
    }
}

/// A running notification service.
pub struct NotificationService {
    config: AppConfig,
    clock: Clock,
    store: Arc<Store>,
    registry: Arc<ClientRegistry>,
    pump: Arc<EventPump>,
    center: Arc<CenterController>,
    expiry: Option<Arc<ExpiryController>>,
    registry_task: JoinHandle<()>,
}

impl NotificationService {
    pub fn builder(transport: Arc<dyn Transport>) -> NotificationServiceBuilder {
        NotificationServiceBuilder {
            config: AppConfig::default(),
            transport,
            environment: None,
            database: None,
            clock: None,
        }
    }

    /// API handle acting on behalf of `identity`.
    pub fn api(&self, identity: Identity) -> NotificationApi {
        NotificationApi::new(
            identity,
            self.store.clone(),
            self.registry.clone(),
            self.center.clone(),
            self.clock,
        )
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn center(&self) -> &Arc<CenterController> {
        &self.center
    }

    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    pub fn pump(&self) -> &Arc<EventPump> {
        &self.pump
    }

    pub fn expiry(&self) -> Option<&Arc<ExpiryController>> {
        self.expiry.as_ref()
    }
}

impl Drop for NotificationService {
    fn drop(&mut self) {
        self.registry_task.abort();
    }
}

impl std::fmt::Debug for NotificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationService")
            .field("store", &self.store)
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}
