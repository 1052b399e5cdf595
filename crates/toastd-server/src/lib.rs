pub mod api;
pub mod center;
pub mod client_events;
pub mod clients;
pub mod config;
pub mod error;
pub mod event_pump;
pub mod expiry;
pub mod host;
pub mod observability;
pub mod persistor;
pub mod service;
pub mod store;

#[cfg(test)]
mod testing;

pub use api::{NotificationApi, NotificationOptions};
pub use center::CenterController;
pub use clients::{
    ClientRegistry, ConnectionEvent, Delivery, Environment, LocalEnvironment, LocalTransport,
    Transport,
};
pub use config::AppConfig;
pub use error::{ApiError, EnvironmentError, StoreError, TransportError};
pub use event_pump::EventPump;
pub use expiry::ExpiryController;
pub use service::{NotificationService, NotificationServiceBuilder};
pub use store::{ActionEvent, RootAction, RootState, Store};
