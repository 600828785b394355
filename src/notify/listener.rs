//! Order-status notification listener
//!
//! Tails the change feed for status-history inserts, resolves the parent
//! order and notifies the customer whose phone number matches.

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::feed::{ChangeEvent, ChangeFeed, ChangeKind};
use super::status::status_message;
use crate::entity::{order, order_status_history};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("order lookup failed: {0}")]
    Lookup(#[from] DbErr),

    #[error("notification channel closed")]
    ChannelClosed,

    #[error("audio playback failed: {0}")]
    Audio(String),
}

/// Customer-facing notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub title: String,
    pub message: String,
    #[serde(rename = "orderNumber")]
    pub order_number: i64,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SoundCue {
    OrderStatus,
}

/// The fields of an order the listener needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderContact {
    pub order_number: i64,
    pub customer_phone: Option<String>,
}

#[async_trait]
pub trait OrderLookup: Send + Sync {
    async fn order_contact(&self, order_id: i64) -> Result<Option<OrderContact>, NotifyError>;
}

pub trait ToastSink: Send + Sync {
    fn show(&self, toast: Toast) -> Result<(), NotifyError>;
}

pub trait AudioCue: Send + Sync {
    fn play(&self, cue: SoundCue) -> Result<(), NotifyError>;
}

/// Looks orders up in the database
#[derive(Clone)]
pub struct DbOrderLookup {
    db: Arc<DatabaseConnection>,
}

impl DbOrderLookup {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrderLookup for DbOrderLookup {
    async fn order_contact(&self, order_id: i64) -> Result<Option<OrderContact>, NotifyError> {
        let found = order::Entity::find_by_id(order_id).one(&*self.db).await?;
        Ok(found.map(|o| OrderContact {
            order_number: o.order_number,
            customer_phone: o.customer_phone,
        }))
    }
}

#[derive(Clone)]
pub struct OrderNotificationListener {
    lookup: Arc<dyn OrderLookup>,
    toasts: Arc<dyn ToastSink>,
    audio: Arc<dyn AudioCue>,
}

impl OrderNotificationListener {
    pub fn new(
        lookup: Arc<dyn OrderLookup>,
        toasts: Arc<dyn ToastSink>,
        audio: Arc<dyn AudioCue>,
    ) -> Self {
        Self { lookup, toasts, audio }
    }

    /// Start tailing the feed for `phone`.
    ///
    /// Returns `None` without subscribing when the phone is absent or blank.
    pub fn subscribe(&self, feed: &ChangeFeed, phone: Option<&str>) -> Option<Subscription> {
        let phone = phone.map(str::trim).filter(|p| !p.is_empty())?.to_string();
        let mut rx = feed.subscribe();
        let listener = self.clone();
        let task_phone = phone.clone();

        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        listener.handle_event(&task_phone, &event).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Order listener lagged, {} events skipped", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        tracing::debug!("Order notifications subscribed for {}", phone);
        Some(Subscription { phone, handle })
    }

    /// Keep `current` if it already tails `phone`, otherwise close it and
    /// subscribe again.
    pub fn resubscribe(
        &self,
        feed: &ChangeFeed,
        current: Option<Subscription>,
        phone: Option<&str>,
    ) -> Option<Subscription> {
        let wanted = phone.map(str::trim).filter(|p| !p.is_empty());
        match current {
            Some(sub) if Some(sub.phone()) == wanted => Some(sub),
            other => {
                drop(other);
                self.subscribe(feed, wanted)
            }
        }
    }

    /// Process one change event for `phone`; returns whether a toast was shown.
    pub async fn handle_event(&self, phone: &str, event: &ChangeEvent) -> bool {
        if event.kind != ChangeKind::Insert || event.table != order_status_history::TABLE_NAME {
            return false;
        }

        let row: order_status_history::Model = match serde_json::from_value(event.record.clone()) {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!("Malformed status history event: {}", e);
                return false;
            }
        };

        let contact = match self.lookup.order_contact(row.order_id).await {
            Ok(Some(contact)) => contact,
            Ok(None) => {
                tracing::debug!("Order {} not found, status event dropped", row.order_id);
                return false;
            }
            Err(e) => {
                tracing::error!("Failed to load order {}: {}", row.order_id, e);
                return false;
            }
        };

        if contact.customer_phone.as_deref() != Some(phone) {
            return false;
        }

        let Some(msg) = status_message(&row.status, contact.order_number) else {
            return false;
        };

        let toast = Toast {
            title: msg.title.to_string(),
            message: msg.message,
            order_number: contact.order_number,
            status: row.status,
        };
        if let Err(e) = self.toasts.show(toast) {
            tracing::warn!("Failed to deliver toast: {}", e);
            return false;
        }

        if let Err(e) = self.audio.play(SoundCue::OrderStatus) {
            tracing::warn!("Could not play notification sound: {}", e);
        }

        true
    }
}

/// A live subscription; dropping it stops the listener task
pub struct Subscription {
    phone: String,
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn close(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
        tracing::debug!("Order notifications closed for {}", self.phone);
    }
}
