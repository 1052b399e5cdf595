//! # toastd-storage
//!
//! Persistence contract for the toastd notification service.
//!
//! The store only relies on plain keyed CRUD over two collections:
//! notifications (keyed by the composite `"{appId}:{notificationId}"` id)
//! and applications (keyed by application uuid). Any backend that can
//! implement [`Collection`] can back the service.
//!
//! ## Example
//!
//! ```ignore
//! use toastd_storage::{Collection, Database};
//!
//! let db = Database::in_memory();
//! db.notifications.upsert(&[stored]).await?;
//! let all = db.notifications.get_all().await?;
//! ```

mod error;
pub mod memory;
mod traits;

pub use error::DatabaseError;
pub use memory::InMemoryCollection;
pub use traits::{Collection, Database, Record};
