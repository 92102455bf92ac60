use std::time::Duration;

use error_stack::{ensure, Report, Result, ResultExt};
use futures::TryStreamExt;
use thiserror::Error;
use tokio::sync::broadcast::{self, Sender};
use tokio::{select, time};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::tm_client::TmClient;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to query the latest block")]
    LatestBlock,
    #[error("block stream capacity must be greater than zero")]
    ZeroCapacity,
    #[error("block poll interval must be greater than zero")]
    ZeroPollInterval,
}

/// Hands out streams of new block heights.
pub struct BlockSubscriber {
    tx: Sender<u64>,
}

impl BlockSubscriber {
    pub fn subscribe(
        &self,
    ) -> impl Stream<Item = Result<u64, BroadcastStreamRecvError>> + Send + 'static {
        BroadcastStream::new(self.tx.subscribe()).map_err(Report::from)
    }
}

/// Polls the node for its latest height and publishes every height it has not published yet, in
/// order.
pub struct BlockPublisher<T: TmClient + Sync> {
    tm_client: T,
    poll_interval: Duration,
    tx: Sender<u64>,
}

impl<T: TmClient + Sync> BlockPublisher<T> {
    pub fn new(
        client: T,
        poll_interval: Duration,
        capacity: usize,
    ) -> Result<(Self, BlockSubscriber), Error> {
        ensure!(capacity > 0, Error::ZeroCapacity);
        ensure!(!poll_interval.is_zero(), Error::ZeroPollInterval);

        let (tx, _) = broadcast::channel(capacity);
        let publisher = BlockPublisher {
            tm_client: client,
            poll_interval,
            tx: tx.clone(),
        };
        let subscriber = BlockSubscriber { tx };

        Ok((publisher, subscriber))
    }

    /// Starts after the height that is current when it is called. Fails only if that first height
    /// cannot be read; later poll failures are retried on the next tick.
    pub async fn run(self, token: CancellationToken) -> Result<(), Error> {
        let mut curr_height = self.latest_block_height().await?;
        info!(height = curr_height, "block publisher started");

        let mut interval = time::interval(self.poll_interval);

        loop {
            select! {
                _ = interval.tick() => {
                    match self.latest_block_height().await {
                        Ok(latest) => curr_height = self.publish_blocks(curr_height, latest, &token),
                        Err(err) => warn!(err = ?err, "failed to poll the latest block"),
                    }
                },
                _ = token.cancelled() => {
                    info!("block publisher exiting");

                    return Ok(())
                },
            }
        }
    }

    async fn latest_block_height(&self) -> Result<u64, Error> {
        self.tm_client
            .latest_block_height()
            .await
            .change_context(Error::LatestBlock)
    }

    /// Publishes the heights after `from` up to `to`, returning the last one published.
    fn publish_blocks(&self, from: u64, to: u64, token: &CancellationToken) -> u64 {
        let mut height = from;

        while height < to && !token.is_cancelled() {
            height = height.saturating_add(1);

            // skip publishing if there are no subscribers
            if self.tx.receiver_count() == 0 {
                continue;
            }

            debug!(height, "publishing block");
            // ignore the error if the last subscriber went away in the meantime
            let _ = self.tx.send(height);
        }

        height
    }
}
