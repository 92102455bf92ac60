use async_trait::async_trait;
use cosmrs::crypto::secp256k1::SigningKey;
use cosmrs::proto::cosmos::base::abci::v1beta1::TxResponse;
use cosmrs::proto::cosmos::tx::v1beta1::{BroadcastMode, BroadcastTxRequest};
use cosmrs::tendermint::chain;
use cosmrs::tx::{BodyBuilder, Fee, SignDoc, SignerInfo};
use cosmrs::{AccountId, Any};
use error_stack::{ensure, report, IntoReportCompat, Result, ResultExt};
use mockall::automock;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;
use typed_builder::TypedBuilder;

use crate::cosmos::{self, CosmosClient};

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to derive the account address")]
    Address,
    #[error("failed to query the signer account")]
    AccountQuery,
    #[error("failed to sign the transaction")]
    Signing,
    #[error("failed to broadcast the transaction")]
    Broadcast,
    #[error("broadcast response is missing the tx response")]
    MissingTxResponse,
    #[error("transaction {tx_hash} failed with code {code}: {log}")]
    Execution {
        tx_hash: String,
        code: u32,
        log: String,
    },
}

/// Signs and broadcasts transactions on behalf of the accounts it holds keys for.
#[automock]
#[async_trait]
pub trait SigningClient: Send + Sync {
    async fn accounts(&self) -> Result<Vec<AccountId>, Error>;

    async fn sign_and_broadcast(
        &self,
        address: &AccountId,
        msgs: Vec<Any>,
        fee: Fee,
        memo: String,
    ) -> Result<TxResponse, Error>;
}

/// A [SigningClient] backed by a single secp256k1 key, talking to the node over gRPC.
#[derive(TypedBuilder)]
pub struct CosmosSigner<T> {
    #[builder(setter(transform = |client: T| Mutex::new(client)))]
    client: Mutex<T>,
    key: SigningKey,
    chain_id: chain::Id,
    #[builder(setter(into))]
    prefix: String,
}

impl<T> CosmosSigner<T> {
    fn address(&self) -> Result<AccountId, Error> {
        self.key
            .public_key()
            .account_id(&self.prefix)
            .into_report()
            .map_err(|report| report.change_context(Error::Address))
            .attach_printable_lazy(|| format!("{{ prefix = {} }}", self.prefix))
    }
}

#[async_trait]
impl<T> SigningClient for CosmosSigner<T>
where
    T: CosmosClient + Send,
{
    async fn accounts(&self) -> Result<Vec<AccountId>, Error> {
        Ok(vec![self.address()?])
    }

    async fn sign_and_broadcast(
        &self,
        address: &AccountId,
        msgs: Vec<Any>,
        fee: Fee,
        memo: String,
    ) -> Result<TxResponse, Error> {
        let mut client = self.client.lock().await;

        let account = cosmos::account(&mut *client, address)
            .await
            .change_context(Error::AccountQuery)
            .attach_printable_lazy(|| format!("{{ address = {address} }}"))?;

        let body = BodyBuilder::new().msgs(msgs).memo(memo).finish();
        let auth_info =
            SignerInfo::single_direct(Some(self.key.public_key()), account.sequence).auth_info(fee);
        let tx_bytes = SignDoc::new(&body, &auth_info, &self.chain_id, account.account_number)
            .and_then(|sign_doc| sign_doc.sign(&self.key))
            .and_then(|tx| tx.to_bytes())
            .into_report()
            .map_err(|report| report.change_context(Error::Signing))?;

        let response = client
            .broadcast_tx(BroadcastTxRequest {
                tx_bytes,
                mode: BroadcastMode::Sync as i32,
            })
            .await
            .change_context(Error::Broadcast)?
            .tx_response
            .ok_or(report!(Error::MissingTxResponse))?;

        ensure!(
            response.code == 0,
            Error::Execution {
                tx_hash: response.txhash.clone(),
                code: response.code,
                log: response.raw_log.clone(),
            }
        );

        info!(
            tx_hash = response.txhash.as_str(),
            sequence = account.sequence,
            "broadcasted transaction"
        );

        Ok(response)
    }
}
