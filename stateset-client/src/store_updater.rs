use std::pin::pin;

use error_stack::Result;
use thiserror::Error;
use tokio::select;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::query::QueryClient;
use crate::store::{CacheStore, Store};

#[derive(Error, Debug)]
pub enum Error {
    #[error("block stream closed unexpectedly")]
    StreamClosed,
}

/// Replays the store's subscriptions once for every new block.
pub struct StoreUpdater<Q, C> {
    store: Store<Q, C>,
}

impl<Q, C> StoreUpdater<Q, C>
where
    Q: QueryClient,
    C: CacheStore,
{
    pub fn new(store: Store<Q, C>) -> Self {
        Self { store }
    }

    pub async fn run<S>(self, blocks: S, token: CancellationToken) -> Result<(), Error>
    where
        S: Stream<Item = Result<u64, BroadcastStreamRecvError>>,
    {
        let mut blocks = pin!(blocks);

        loop {
            select! {
                block = blocks.next() => match block {
                    Some(Ok(height)) => self.update(height).await,
                    Some(Err(err)) => warn!(err = ?err, "store updater fell behind the block stream"),
                    None if token.is_cancelled() => return Ok(()),
                    None => return Err(Error::StreamClosed.into()),
                },
                _ = token.cancelled() => {
                    info!("store updater exiting");

                    return Ok(())
                },
            }
        }
    }

    /// Failed replays are logged by the store, only the tally is reported here.
    async fn update(&self, height: u64) {
        let outcomes = self.store.store_update().await;
        let failed = outcomes
            .iter()
            .filter(|outcome| outcome.result.is_err())
            .count();

        debug!(
            height,
            subscriptions = outcomes.len(),
            failed,
            "store updated"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use error_stack::report;
    use tokio::sync::mpsc;
    use tokio_stream::wrappers::ReceiverStream;
    use tracing_test::traced_test;

    use super::*;
    use crate::query::{self, Filter, MockQueryClient, QueryRequest, QueryResponse};
    use crate::store::{InMemoryCache, QueryOptions};
    use crate::types::refund::QueryAllRefundResponse;

    fn subscribe() -> QueryOptions {
        QueryOptions {
            subscribe: true,
            all: false,
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn replays_subscriptions_for_each_block() {
        let mut client = MockQueryClient::new();
        client
            .expect_query()
            .times(3)
            .returning(|_, _| Ok(QueryResponse::RefundAll(QueryAllRefundResponse::default())));
        let store = Store::builder()
            .client(client)
            .cache(InMemoryCache::default())
            .build();
        store
            .query(QueryRequest::RefundAll, Filter::new(), subscribe())
            .await
            .unwrap();

        let (tx, rx) = mpsc::channel(10);
        tx.send(Ok(1)).await.unwrap();
        tx.send(Ok(2)).await.unwrap();
        drop(tx);

        let err = StoreUpdater::new(store)
            .run(ReceiverStream::new(rx), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err.current_context(), Error::StreamClosed));
        assert!(logs_contain("store updated"));
    }

    #[tokio::test]
    #[traced_test]
    async fn logs_failed_replays_and_keeps_going() {
        let mut client = MockQueryClient::new();
        let mut calls = 0u32;
        client.expect_query().returning(move |_, _| {
            calls = calls.saturating_add(1);
            if calls == 1 {
                Ok(QueryResponse::RefundAll(QueryAllRefundResponse::default()))
            } else {
                Err(report!(query::Error::Transport))
            }
        });
        let store = Store::builder()
            .client(client)
            .cache(InMemoryCache::default())
            .build();
        store
            .query(QueryRequest::RefundAll, Filter::new(), subscribe())
            .await
            .unwrap();

        let (tx, rx) = mpsc::channel(10);
        tx.send(Ok(1)).await.unwrap();
        tx.send(Err(report!(BroadcastStreamRecvError::Lagged(3))))
            .await
            .unwrap();
        tx.send(Ok(5)).await.unwrap();
        drop(tx);

        let result = StoreUpdater::new(store.clone())
            .run(ReceiverStream::new(rx), CancellationToken::new())
            .await;

        assert!(result.is_err());
        assert!(logs_contain("failed to replay subscription"));
        assert!(logs_contain("failed=1"));
        assert!(logs_contain("store updater fell behind the block stream"));
        assert_eq!(store.subscriptions().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_on_cancellation() {
        let mut client = MockQueryClient::new();
        client.expect_query().never();
        let store = Store::builder()
            .client(client)
            .cache(InMemoryCache::default())
            .build();

        let (_tx, rx) = mpsc::channel::<Result<u64, BroadcastStreamRecvError>>(10);
        let token = CancellationToken::new();
        let handle = tokio::spawn(
            StoreUpdater::new(store).run(ReceiverStream::new(rx), token.child_token()),
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();

        assert!(handle.await.unwrap().is_ok());
    }
}
