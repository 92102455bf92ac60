use async_trait::async_trait;
use error_stack::{Report, Result};
use mockall::automock;
use tendermint_rpc::{Client, HttpClient};

pub type Error = tendermint_rpc::Error;

#[automock]
#[async_trait]
pub trait TmClient {
    async fn latest_block_height(&self) -> Result<u64, Error>;
}

#[async_trait]
impl TmClient for HttpClient {
    async fn latest_block_height(&self) -> Result<u64, Error> {
        Client::latest_block(self)
            .await
            .map(|res| res.block.header.height.value())
            .map_err(Report::from)
    }
}
