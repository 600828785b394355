//! Realtime order-status notifications
//!
//! Writes that touch orders publish row-level change events on the
//! [`ChangeFeed`]. An [`OrderNotificationListener`] tails that feed for one
//! customer phone number and turns matching status transitions into toasts
//! and sound cues.

mod feed;
mod listener;
mod status;

pub use feed::{ChangeEvent, ChangeFeed, ChangeKind};
pub use listener::{
    AudioCue, DbOrderLookup, NotifyError, OrderContact, OrderLookup, OrderNotificationListener,
    SoundCue, Subscription, Toast, ToastSink,
};
pub use status::{status_message, StatusMessage};
