//! WebSocket Hub implementation
//!
//! Two kinds of sockets live here: customer order-tracking sessions keyed by
//! phone number, and staff search-as-you-type sessions.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
    Extension,
};
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::middleware::auth::CurrentUser;
use crate::notify::{
    AudioCue, ChangeFeed, DbOrderLookup, NotifyError, OrderNotificationListener, SoundCue,
    Subscription, Toast, ToastSink,
};
use crate::search::{run_debounced, SearchResults};
use crate::state::AppState;

/// Global WebSocket hub instance
pub static HUB: std::sync::LazyLock<Hub> = std::sync::LazyLock::new(Hub::new);

/// Server to client messages
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    #[serde(rename = "toast")]
    Toast(Toast),
    #[serde(rename = "playSound")]
    PlaySound(SoundCue),
    #[serde(rename = "results")]
    Results(SearchResults),
    #[serde(rename = "pong")]
    Pong,
}

/// Client to server messages
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    #[serde(rename = "query")]
    Query(String),
    /// Track a different phone number
    #[serde(rename = "phone")]
    Phone(String),
    #[serde(rename = "ping")]
    Ping,
}

/// Open order-tracking sockets, counted per phone number
pub struct Hub {
    clients: DashMap<String, usize>,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
        }
    }

    pub fn register(&self, phone: &str) {
        *self.clients.entry(phone.to_string()).or_default() += 1;
        tracing::debug!("Tracking client registered for {}", phone);
    }

    pub fn unregister(&self, phone: &str) {
        self.clients.remove_if_mut(phone, |_, count| {
            *count = count.saturating_sub(1);
            *count == 0
        });
        tracing::debug!("Tracking client unregistered for {}", phone);
    }

    /// Number of open tracking sockets
    pub fn connection_count(&self) -> usize {
        self.clients.iter().map(|c| *c.value()).sum()
    }

    /// Distinct phone numbers being tracked
    pub fn tracked_phones(&self) -> usize {
        self.clients.len()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

/// Delivers toasts and sound cues to one socket
pub struct SocketNotifier {
    tx: mpsc::UnboundedSender<ServerMessage>,
}

impl SocketNotifier {
    pub fn new(tx: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self { tx }
    }
}

impl ToastSink for SocketNotifier {
    fn show(&self, toast: Toast) -> Result<(), NotifyError> {
        self.tx
            .send(ServerMessage::Toast(toast))
            .map_err(|_| NotifyError::ChannelClosed)
    }
}

impl AudioCue for SocketNotifier {
    fn play(&self, cue: SoundCue) -> Result<(), NotifyError> {
        self.tx
            .send(ServerMessage::PlaySound(cue))
            .map_err(|_| NotifyError::Audio("socket closed".to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    pub phone: Option<String>,
}

/// GET /api/track/ws?phone=...
pub async fn serve_track_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<TrackQuery>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_track_socket(socket, state, query.phone))
}

/// Follows one phone number for a tracking socket, keeping the hub entry in
/// step with the live subscription
struct Tracker {
    listener: OrderNotificationListener,
    feed: ChangeFeed,
    subscription: Option<Subscription>,
}

impl Tracker {
    fn new(listener: OrderNotificationListener, feed: ChangeFeed) -> Self {
        Self {
            listener,
            feed,
            subscription: None,
        }
    }

    fn phone(&self) -> Option<&str> {
        self.subscription.as_ref().map(|s| s.phone())
    }

    fn follow(&mut self, phone: Option<&str>) {
        let previous = self.phone().map(str::to_string);
        self.subscription = self
            .listener
            .resubscribe(&self.feed, self.subscription.take(), phone);

        if previous.as_deref() != self.phone() {
            if let Some(old) = previous {
                HUB.unregister(&old);
            }
            if let Some(new) = self.phone() {
                HUB.register(new);
            }
        }
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        if let Some(sub) = self.subscription.take() {
            HUB.unregister(sub.phone());
        }
    }
}

async fn handle_track_socket(socket: WebSocket, state: AppState, phone: Option<String>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let notifier = Arc::new(SocketNotifier::new(tx.clone()));
    let listener = OrderNotificationListener::new(
        Arc::new(DbOrderLookup::new(state.db.clone())),
        notifier.clone(),
        notifier,
    );
    let mut tracker = Tracker::new(listener, state.feed.clone());
    tracker.follow(phone.as_deref());

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let text = serde_json::to_string(&msg).unwrap_or_default();
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Phone(phone)) => tracker.follow(Some(&phone)),
                    Ok(ClientMessage::Ping) => {
                        let _ = tx.send(ServerMessage::Pong);
                    }
                    Ok(ClientMessage::Query(_)) => {}
                    Err(e) => tracing::debug!("Ignoring tracking message: {}", e),
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}

/// GET /api/search/ws
pub async fn serve_search_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_search_socket(socket, state, user))
}

async fn handle_search_socket(socket: WebSocket, state: AppState, user: CurrentUser) {
    let (mut sender, mut receiver) = socket.split();
    let (query_tx, query_rx) = mpsc::channel::<String>(32);
    let (results_tx, mut results_rx) = mpsc::channel::<SearchResults>(8);
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let session = tokio::spawn(run_debounced(
        state.search.clone(),
        state.search_debounce(),
        query_rx,
        results_tx,
    ));

    let mut send_task = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                Some(results) = results_rx.recv() => ServerMessage::Results(results),
                Some(msg) = rx.recv() => msg,
                else => break,
            };
            let text = serde_json::to_string(&msg).unwrap_or_default();
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Query(q)) => {
                        if query_tx.send(q).await.is_err() {
                            break;
                        }
                    }
                    Ok(ClientMessage::Ping) => {
                        let _ = tx.send(ServerMessage::Pong);
                    }
                    Ok(ClientMessage::Phone(_)) => {}
                    Err(e) => tracing::debug!("Ignoring search message: {}", e),
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    session.abort();
    tracing::debug!("Search socket closed for {}", user.username);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_notifier_messages() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let notifier = SocketNotifier::new(tx);

        notifier
            .show(Toast {
                title: "Order ready!".to_string(),
                message: "Order #7 is ready.".to_string(),
                order_number: 7,
                status: "ready".to_string(),
            })
            .unwrap();
        notifier.play(SoundCue::OrderStatus).unwrap();

        let toast = serde_json::to_value(rx.try_recv().unwrap()).unwrap();
        assert_eq!(toast["type"], "toast");
        assert_eq!(toast["data"]["orderNumber"], 7);
        assert_eq!(toast["data"]["title"], "Order ready!");

        let sound = serde_json::to_value(rx.try_recv().unwrap()).unwrap();
        assert_eq!(sound, json!({"type": "playSound", "data": "order-status"}));
    }

    #[test]
    fn test_closed_socket_reports_errors() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let notifier = SocketNotifier::new(tx);

        assert!(matches!(
            notifier.play(SoundCue::OrderStatus),
            Err(NotifyError::Audio(_))
        ));
    }

    #[test]
    fn test_client_messages() {
        let q: ClientMessage = serde_json::from_str(r#"{"type":"query","data":"piz"}"#).unwrap();
        assert_eq!(q, ClientMessage::Query("piz".to_string()));
        let ping: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(ping, ClientMessage::Ping);
        let phone: ClientMessage =
            serde_json::from_str(r#"{"type":"phone","data":"11999990000"}"#).unwrap();
        assert_eq!(phone, ClientMessage::Phone("11999990000".to_string()));
    }

    struct NoOrders;

    #[async_trait::async_trait]
    impl crate::notify::OrderLookup for NoOrders {
        async fn order_contact(
            &self,
            _order_id: i64,
        ) -> Result<Option<crate::notify::OrderContact>, NotifyError> {
            Ok(None)
        }
    }

    fn tracker() -> Tracker {
        let (tx, _rx) = mpsc::unbounded_channel();
        let notifier = Arc::new(SocketNotifier::new(tx));
        let listener = OrderNotificationListener::new(Arc::new(NoOrders), notifier.clone(), notifier);
        Tracker::new(listener, ChangeFeed::new(4))
    }

    #[tokio::test]
    async fn test_tracker_follows_phone_changes() {
        let mut t = tracker();

        t.follow(Some("   "));
        assert_eq!(t.phone(), None);

        t.follow(Some("5511900000001"));
        assert_eq!(t.phone(), Some("5511900000001"));
        assert!(HUB.clients.contains_key("5511900000001"));

        t.follow(Some("5511900000002"));
        assert!(!HUB.clients.contains_key("5511900000001"));
        assert!(HUB.clients.contains_key("5511900000002"));

        drop(t);
        assert!(!HUB.clients.contains_key("5511900000002"));
    }

    #[test]
    fn test_hub_registration() {
        let hub = Hub::new();
        hub.register("119");
        hub.register("119");
        hub.register("120");
        assert_eq!(hub.connection_count(), 3);
        assert_eq!(hub.tracked_phones(), 2);

        hub.unregister("119");
        assert_eq!(hub.connection_count(), 2);
        hub.unregister("119");
        assert_eq!(hub.tracked_phones(), 1);
        assert!(!hub.clients.contains_key("119"));

        // a stray unregister never goes negative
        hub.unregister("119");
        assert_eq!(hub.connection_count(), 1);
    }
}
