pub mod clock;
pub mod error;
pub mod events;
pub mod model;
pub mod ordered_list;
pub mod signal;
pub mod timer;
pub mod toggle_filter;

pub use clock::Clock;
pub use error::{CoreError, Result};
pub use events::{ActionTrigger, EventType, NotificationEvent};
pub use model::{
    ActionResult, ButtonOptions, Identity, Notification, StoredApplication, StoredNotification,
    composite_id,
};
pub use ordered_list::OrderedList;
pub use signal::{HookError, Listener, ListenerFailure, Signal};
pub use timer::Timer;
pub use toggle_filter::{ToggleFilter, ToggleSource};
