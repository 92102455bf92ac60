use cosmrs::proto::cosmos::base::abci::v1beta1::TxResponse;
use cosmrs::tx::Fee;
use cosmrs::{Any, Coin, Denom};
use error_stack::{report, Result, ResultExt};
use itertools::Itertools;
use prost::Message;
use thiserror::Error;
use tracing::debug;

use crate::signer::SigningClient;
use crate::types::{agreement, invoice, purchaseorder, refund};

pub const DEFAULT_GAS: u64 = 200000;

#[derive(Error, Debug)]
pub enum Error {
    #[error("TxClient:{msg}:Init wallet is required")]
    MissingWallet { msg: String },
    #[error("TxClient:{msg}:Send could not broadcast tx")]
    Send { msg: String },
}

/// A transaction message of one of the stateset modules.
pub trait TxMsg: Message + Sized {
    const TYPE_URL: &'static str;

    fn to_any(&self) -> Any {
        Any {
            type_url: Self::TYPE_URL.to_string(),
            value: self.encode_to_vec(),
        }
    }
}

/// Message name without the package, e.g. `MsgPayInvoice`.
fn msg_name(type_url: &str) -> &str {
    type_url
        .rsplit_once('.')
        .map_or(type_url, |(_, name)| name)
}

/// Type URLs of every message the stateset modules accept.
pub fn registry() -> Vec<&'static str> {
    agreement::TYPE_URLS
        .iter()
        .chain(invoice::TYPE_URLS)
        .chain(purchaseorder::TYPE_URLS)
        .chain(refund::TYPE_URLS)
        .copied()
        .collect()
}

/// Signs and broadcasts stateset messages with the first account of the wallet.
///
/// The wallet is optional so that a read-only client can be built up front; every send then fails
/// with [Error::MissingWallet] before touching the network.
pub struct TxClient<S> {
    wallet: Option<S>,
    fee_denom: Denom,
    gas: u64,
}

impl<S> TxClient<S>
where
    S: SigningClient,
{
    pub fn new(wallet: Option<S>, fee_denom: Denom, gas: u64) -> Self {
        Self {
            wallet,
            fee_denom,
            gas,
        }
    }

    /// No fee coins for a zero amount.
    pub fn fee(&self, amount: u128) -> Fee {
        let coins = if amount == 0 {
            vec![]
        } else {
            vec![Coin {
                denom: self.fee_denom.clone(),
                amount,
            }]
        };

        Fee {
            amount: coins,
            gas_limit: self.gas,
            payer: None,
            granter: None,
        }
    }

    pub async fn send<M>(&self, msg: M, fee_amount: u128, memo: &str) -> Result<TxResponse, Error>
    where
        M: TxMsg,
    {
        self.sign_and_broadcast(vec![msg.to_any()], self.fee(fee_amount), memo)
            .await
    }

    pub async fn sign_and_broadcast(
        &self,
        msgs: Vec<Any>,
        fee: Fee,
        memo: &str,
    ) -> Result<TxResponse, Error> {
        let msg = msgs
            .iter()
            .map(|msg| msg_name(&msg.type_url))
            .join(",");

        let wallet = self
            .wallet
            .as_ref()
            .ok_or_else(|| report!(Error::MissingWallet { msg: msg.clone() }))?;

        let accounts = wallet
            .accounts()
            .await
            .change_context_lazy(|| Error::Send { msg: msg.clone() })?;
        let address = accounts
            .first()
            .ok_or_else(|| report!(Error::MissingWallet { msg: msg.clone() }))?;

        debug!(%address, msg = msg.as_str(), "signing and broadcasting tx");

        wallet
            .sign_and_broadcast(address, msgs, fee, memo.to_string())
            .await
            .change_context_lazy(|| Error::Send { msg })
    }
}
