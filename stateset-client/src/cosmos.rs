use async_trait::async_trait;
use cosmrs::proto::cosmos::auth::v1beta1::query_client::QueryClient as AuthQueryClient;
use cosmrs::proto::cosmos::auth::v1beta1::{
    BaseAccount, QueryAccountRequest, QueryAccountResponse,
};
use cosmrs::proto::cosmos::tx::v1beta1::service_client::ServiceClient;
use cosmrs::proto::cosmos::tx::v1beta1::{BroadcastTxRequest, BroadcastTxResponse};
use cosmrs::{AccountId, Any};
use error_stack::{report, ResultExt};
use mockall::mock;
use prost::Message;
use thiserror::Error;
use tonic::transport::{Channel, Endpoint};
use tonic::Response;

type Result<T> = error_stack::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to connect to the grpc endpoint")]
    GrpcConnection,
    #[error("failed to make the grpc request")]
    GrpcRequest,
    #[error("account is missing in the query response")]
    AccountMissing,
    #[error("failed to decode the query response")]
    MalformedResponse,
}

mock! {
    #[derive(Debug)]
    pub CosmosClient{}

    impl Clone for CosmosClient {
        fn clone(&self) -> Self;
    }

    #[async_trait]
    impl CosmosClient for CosmosClient {
        async fn broadcast_tx(&mut self, req: BroadcastTxRequest) -> Result<BroadcastTxResponse>;
        async fn account(&mut self, req: QueryAccountRequest) -> Result<QueryAccountResponse>;
    }
}

/// The node services a signer needs: account lookup and transaction broadcast.
#[async_trait]
pub trait CosmosClient {
    async fn broadcast_tx(&mut self, req: BroadcastTxRequest) -> Result<BroadcastTxResponse>;
    async fn account(&mut self, req: QueryAccountRequest) -> Result<QueryAccountResponse>;
}

/// Clones share the underlying connection.
#[derive(Clone)]
pub struct CosmosGrpcClient {
    auth: AuthQueryClient<Channel>,
    service: ServiceClient<Channel>,
}

impl CosmosGrpcClient {
    pub async fn new(url: &str) -> Result<Self> {
        let endpoint = url
            .parse::<Endpoint>()
            .change_context(Error::GrpcConnection)
            .attach_printable_lazy(|| url.to_string())?;
        let conn = endpoint
            .connect()
            .await
            .change_context(Error::GrpcConnection)
            .attach_printable_lazy(|| url.to_string())?;

        Ok(Self {
            auth: AuthQueryClient::new(conn.clone()),
            service: ServiceClient::new(conn),
        })
    }
}

#[async_trait]
impl CosmosClient for CosmosGrpcClient {
    async fn broadcast_tx(&mut self, req: BroadcastTxRequest) -> Result<BroadcastTxResponse> {
        self.service
            .broadcast_tx(req)
            .await
            .map(Response::into_inner)
            .change_context(Error::GrpcRequest)
    }

    async fn account(&mut self, req: QueryAccountRequest) -> Result<QueryAccountResponse> {
        self.auth
            .account(req)
            .await
            .map(Response::into_inner)
            .change_context(Error::GrpcRequest)
    }
}

pub async fn account<T>(client: &mut T, address: &AccountId) -> Result<BaseAccount>
where
    T: CosmosClient,
{
    client
        .account(QueryAccountRequest {
            address: address.to_string(),
        })
        .await
        .and_then(|res| res.account.ok_or(report!(Error::AccountMissing)))
        .and_then(decode_base_account)
}

fn decode_base_account(account: Any) -> Result<BaseAccount> {
    BaseAccount::decode(&account.value[..]).change_context(Error::MalformedResponse)
}

#[cfg(test)]
pub(crate) mod tests {
    use cosmrs::crypto::secp256k1::SigningKey;
    use mockall::predicate;

    use super::*;

    pub(crate) fn base_account_any(account: &BaseAccount) -> Any {
        Any {
            type_url: "/cosmos.auth.v1beta1.BaseAccount".to_string(),
            value: account.encode_to_vec(),
        }
    }

    fn address() -> AccountId {
        SigningKey::from_slice(&[3u8; 32])
            .unwrap()
            .public_key()
            .account_id("stateset")
            .unwrap()
    }

    #[tokio::test]
    async fn account_success() {
        let address = address();
        let base_account = BaseAccount {
            address: address.to_string(),
            pub_key: None,
            account_number: 42,
            sequence: 10,
        };
        let account_any = base_account_any(&base_account);

        let mut mock_client = MockCosmosClient::new();
        mock_client
            .expect_account()
            .with(predicate::eq(QueryAccountRequest {
                address: address.to_string(),
            }))
            .return_once(move |_| {
                Ok(QueryAccountResponse {
                    account: Some(account_any),
                })
            });

        let actual = account(&mut mock_client, &address).await;

        assert_eq!(actual.unwrap(), base_account);
    }

    #[tokio::test]
    async fn account_missing() {
        let mut mock_client = MockCosmosClient::new();
        mock_client
            .expect_account()
            .return_once(|_| Ok(QueryAccountResponse { account: None }));

        let actual = account(&mut mock_client, &address()).await;

        assert_err_contains!(actual, Error, Error::AccountMissing);
    }

    #[tokio::test]
    async fn account_malformed_response() {
        let mut mock_client = MockCosmosClient::new();
        mock_client.expect_account().return_once(|_| {
            Ok(QueryAccountResponse {
                account: Some(Any {
                    type_url: "/cosmos.auth.v1beta1.BaseAccount".to_string(),
                    value: vec![0xff, 0xff, 0xff],
                }),
            })
        });

        let actual = account(&mut mock_client, &address()).await;

        assert_err_contains!(actual, Error, Error::MalformedResponse);
    }

    #[tokio::test]
    async fn invalid_url_fails_to_connect() {
        let actual = CosmosGrpcClient::new("not a url").await;

        assert_err_contains!(actual, Error, Error::GrpcConnection);
    }
}
