use std::time::Duration;
use tokio::sync::mpsc;

use super::aggregator::{SearchAggregator, SearchResults};

/// Drive a search session from a stream of query edits.
///
/// A search fires once `delay` has passed without a new edit, using the
/// latest query. Fired searches run to completion. The session ends when
/// either channel closes; an edit still waiting for its quiet period is
/// dropped.
pub async fn run_debounced(
    aggregator: SearchAggregator,
    delay: Duration,
    mut input: mpsc::Receiver<String>,
    output: mpsc::Sender<SearchResults>,
) {
    let mut pending: Option<String> = None;

    loop {
        let armed = pending.is_some();
        let quiet = async move {
            if armed {
                tokio::time::sleep(delay).await;
            } else {
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            edit = input.recv() => match edit {
                Some(query) => pending = Some(query),
                None => break,
            },
            _ = quiet => {
                let Some(query) = pending.take() else { continue };
                let hits = aggregator.search(&query).await;
                if output.send(SearchResults { query, hits }).await.is_err() {
                    break;
                }
            }
        }
    }

    tracing::debug!("Search session closed");
}
