//! Client for the stateset chain modules (agreement, invoice, purchaseorder, refund).
//!
//! Queries go through a [Store](store::Store) that caches responses and replays subscribed queries
//! on every new block. Transactions are signed and broadcast by a [TxClient](tx::TxClient).

use cosmrs::crypto::secp256k1::SigningKey;
use cosmrs::Denom;
use error_stack::{report, FutureExt, Result, ResultExt};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::block_sub::BlockPublisher;
use crate::config::Config;
use crate::cosmos::CosmosGrpcClient;
use crate::query::{QueryClient, RestQueryClient};
use crate::signer::CosmosSigner;
use crate::store::{CacheStore, InMemoryCache, Store};
use crate::store_updater::StoreUpdater;
use crate::tx::TxClient;

#[cfg(test)]
macro_rules! assert_err_contains {
    ($expression:expr, $error_type:ty, $pattern:pat $(,)?) => {
        match &$expression {
            Ok(_) => panic!("expected an error, got Ok"),
            Err(report) => assert!(
                report
                    .frames()
                    .filter_map(|frame| frame.downcast_ref::<$error_type>())
                    .any(|err| matches!(err, $pattern)),
                "expected report to contain {}, got {:?}",
                stringify!($pattern),
                report
            ),
        }
    };
}

pub mod block_sub;
pub mod codec;
pub mod config;
mod cosmos;
pub mod logging;
pub mod query;
pub mod signer;
pub mod store;
pub mod store_updater;
mod tm_client;
pub mod tx;
pub mod types;

pub use cosmos::CosmosClient;
pub use tm_client::TmClient;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to connect to the node")]
    Connection,
    #[error("invalid fee denomination")]
    FeeDenom,
    #[error("block publisher failed")]
    BlockPublisher,
    #[error("store updater failed")]
    StoreUpdater,
}

/// A store over the configured REST gateway with an empty in-memory cache.
pub fn connect_store(cfg: &Config) -> Store<RestQueryClient, InMemoryCache> {
    Store::builder()
        .client(RestQueryClient::new(cfg.api_cosmos.clone()))
        .cache(InMemoryCache::default())
        .build()
}

/// A transaction client signing with `key`, or a read-only one that refuses to send without it.
pub async fn connect_tx_client(
    cfg: &Config,
    key: Option<SigningKey>,
) -> Result<TxClient<CosmosSigner<CosmosGrpcClient>>, Error> {
    let fee_denom = cfg
        .fee_denom
        .parse::<Denom>()
        .map_err(|_| report!(Error::FeeDenom))
        .attach_printable_lazy(|| cfg.fee_denom.clone())?;

    let signer = match key {
        Some(key) => {
            let client = CosmosGrpcClient::new(cfg.grpc.as_str())
                .await
                .change_context(Error::Connection)?;

            Some(
                CosmosSigner::builder()
                    .client(client)
                    .key(key)
                    .chain_id(cfg.chain_id.clone())
                    .prefix(cfg.address_prefix.clone())
                    .build(),
            )
        }
        None => None,
    };

    Ok(TxClient::new(signer, fee_denom, cfg.default_gas))
}

/// Keeps `store` fresh by replaying its subscriptions on every new block until `token` is
/// cancelled.
pub async fn watch<Q, C>(
    store: Store<Q, C>,
    cfg: &Config,
    token: CancellationToken,
) -> Result<(), Error>
where
    Q: QueryClient,
    C: CacheStore,
{
    let tm_client = tendermint_rpc::HttpClient::new(cfg.api_tendermint.as_str())
        .change_context(Error::Connection)
        .attach_printable(cfg.api_tendermint.clone())?;

    let (publisher, subscriber) =
        BlockPublisher::new(tm_client, cfg.block_poll_interval, cfg.block_stream_buffer)
            .change_context(Error::BlockPublisher)?;
    let blocks = subscriber.subscribe();

    futures::try_join!(
        publisher
            .run(token.child_token())
            .change_context(Error::BlockPublisher),
        StoreUpdater::new(store)
            .run(blocks, token.child_token())
            .change_context(Error::StoreUpdater),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Filter, QueryRequest};

    #[tokio::test]
    async fn read_only_tx_client_needs_no_connection() {
        let cfg = Config {
            grpc: "http://unreachable.invalid:9090".parse().unwrap(),
            ..Config::default()
        };

        let client = connect_tx_client(&cfg, None).await.unwrap();

        assert_eq!(client.fee(0).gas_limit, cfg.default_gas);
    }

    #[tokio::test]
    async fn invalid_fee_denom_is_rejected() {
        let cfg = Config {
            fee_denom: "1".to_string(),
            ..Config::default()
        };

        let result = connect_tx_client(&cfg, None).await;

        assert_err_contains!(result, Error, Error::FeeDenom);
    }

    #[tokio::test]
    async fn watch_fails_on_an_empty_block_stream() {
        let cfg = Config {
            block_stream_buffer: 0,
            ..Config::default()
        };

        let result = watch(connect_store(&cfg), &cfg, CancellationToken::new()).await;

        assert_err_contains!(result, block_sub::Error, block_sub::Error::ZeroCapacity);
    }

    #[tokio::test]
    async fn connected_store_starts_empty() {
        let store = connect_store(&Config::default());

        assert!(store.subscriptions().await.is_empty());
        assert_eq!(
            store.get(&QueryRequest::AgreementAll, &Filter::new()).await,
            None
        );
    }
}
