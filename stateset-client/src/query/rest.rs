use async_trait::async_trait;
use error_stack::{report, Result, ResultExt};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::{Error, Filter, QueryClient, QueryRequest, QueryResponse};

const API_PREFIX: &str = "stateset/core";

/// Queries a node's REST gateway.
#[derive(Clone, Debug)]
pub struct RestQueryClient {
    api_url: Url,
    client: reqwest::Client,
}

impl RestQueryClient {
    pub fn new(api_url: Url) -> Self {
        RestQueryClient {
            api_url,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.api_url.as_str().trim_end_matches('/'),
            API_PREFIX,
            path
        )
    }

    async fn get<R>(&self, path: &str, filter: &Filter) -> Result<R, Error>
    where
        R: DeserializeOwned,
    {
        let endpoint = self.endpoint(path);
        debug!(%endpoint, ?filter, "querying API node");

        let response = self
            .client
            .get(&endpoint)
            .query(filter)
            .send()
            .await
            .change_context(Error::Transport)
            .attach_printable_lazy(|| endpoint.clone())?;

        let status = response.status();
        if !status.is_success() {
            return Err(report!(Error::Status(status.as_u16())).attach_printable(endpoint));
        }

        response
            .json::<R>()
            .await
            .change_context(Error::MalformedResponse)
            .attach_printable(endpoint)
    }
}

fn path(request: &QueryRequest) -> String {
    match request {
        QueryRequest::Agreement { id } => format!("agreement/agreement/{id}"),
        QueryRequest::AgreementAll => "agreement/agreement".to_string(),
        QueryRequest::SentAgreement { id } => format!("agreement/sentAgreement/{id}"),
        QueryRequest::SentAgreementAll => "agreement/sentAgreement".to_string(),
        QueryRequest::TimedoutAgreement { id } => format!("agreement/timedoutAgreement/{id}"),
        QueryRequest::TimedoutAgreementAll => "agreement/timedoutAgreement".to_string(),
        QueryRequest::Invoice { id } => format!("invoice/invoice/{id}"),
        QueryRequest::InvoiceAll => "invoice/invoice".to_string(),
        QueryRequest::SentInvoice { id } => format!("invoice/sentInvoice/{id}"),
        QueryRequest::SentInvoiceAll => "invoice/sentInvoice".to_string(),
        QueryRequest::TimedoutInvoice { id } => format!("invoice/timedoutInvoice/{id}"),
        QueryRequest::TimedoutInvoiceAll => "invoice/timedoutInvoice".to_string(),
        QueryRequest::Purchaseorder { id } => format!("purchaseorder/purchaseorder/{id}"),
        QueryRequest::PurchaseorderAll => "purchaseorder/purchaseorder".to_string(),
        QueryRequest::SentPurchaseorder { id } => {
            format!("purchaseorder/sentPurchaseorder/{id}")
        }
        QueryRequest::SentPurchaseorderAll => "purchaseorder/sentPurchaseorder".to_string(),
        QueryRequest::TimedoutPurchaseorder { id } => {
            format!("purchaseorder/timedoutPurchaseorder/{id}")
        }
        QueryRequest::TimedoutPurchaseorderAll => {
            "purchaseorder/timedoutPurchaseorder".to_string()
        }
        QueryRequest::Params => "refund/params".to_string(),
        QueryRequest::Refund { id } => format!("refund/refund/{id}"),
        QueryRequest::RefundAll => "refund/refund".to_string(),
    }
}

#[async_trait]
impl QueryClient for RestQueryClient {
    async fn query(&self, request: &QueryRequest, filter: &Filter) -> Result<QueryResponse, Error> {
        let path = path(request);

        match request {
            QueryRequest::Agreement { .. } => {
                self.get(&path, filter).await.map(QueryResponse::Agreement)
            }
            QueryRequest::AgreementAll => {
                self.get(&path, filter).await.map(QueryResponse::AgreementAll)
            }
            QueryRequest::SentAgreement { .. } => {
                self.get(&path, filter).await.map(QueryResponse::SentAgreement)
            }
            QueryRequest::SentAgreementAll => {
                self.get(&path, filter).await.map(QueryResponse::SentAgreementAll)
            }
            QueryRequest::TimedoutAgreement { .. } => self
                .get(&path, filter)
                .await
                .map(QueryResponse::TimedoutAgreement),
            QueryRequest::TimedoutAgreementAll => self
                .get(&path, filter)
                .await
                .map(QueryResponse::TimedoutAgreementAll),
            QueryRequest::Invoice { .. } => {
                self.get(&path, filter).await.map(QueryResponse::Invoice)
            }
            QueryRequest::InvoiceAll => {
                self.get(&path, filter).await.map(QueryResponse::InvoiceAll)
            }
            QueryRequest::SentInvoice { .. } => {
                self.get(&path, filter).await.map(QueryResponse::SentInvoice)
            }
            QueryRequest::SentInvoiceAll => {
                self.get(&path, filter).await.map(QueryResponse::SentInvoiceAll)
            }
            QueryRequest::TimedoutInvoice { .. } => {
                self.get(&path, filter).await.map(QueryResponse::TimedoutInvoice)
            }
            QueryRequest::TimedoutInvoiceAll => self
                .get(&path, filter)
                .await
                .map(QueryResponse::TimedoutInvoiceAll),
            QueryRequest::Purchaseorder { .. } => {
                self.get(&path, filter).await.map(QueryResponse::Purchaseorder)
            }
            QueryRequest::PurchaseorderAll => {
                self.get(&path, filter).await.map(QueryResponse::PurchaseorderAll)
            }
            QueryRequest::SentPurchaseorder { .. } => self
                .get(&path, filter)
                .await
                .map(QueryResponse::SentPurchaseorder),
            QueryRequest::SentPurchaseorderAll => self
                .get(&path, filter)
                .await
                .map(QueryResponse::SentPurchaseorderAll),
            QueryRequest::TimedoutPurchaseorder { .. } => self
                .get(&path, filter)
                .await
                .map(QueryResponse::TimedoutPurchaseorder),
            QueryRequest::TimedoutPurchaseorderAll => self
                .get(&path, filter)
                .await
                .map(QueryResponse::TimedoutPurchaseorderAll),
            QueryRequest::Params => self.get(&path, filter).await.map(QueryResponse::Params),
            QueryRequest::Refund { .. } => self.get(&path, filter).await.map(QueryResponse::Refund),
            QueryRequest::RefundAll => self.get(&path, filter).await.map(QueryResponse::RefundAll),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    use super::*;
    use crate::query::PAGINATION_KEY;
    use crate::types::agreement::Agreement;
    use crate::types::invoice::QueryAllSentInvoiceResponse;
    use crate::types::PageResponse;

    async fn serve(router: Router) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

        format!("http://{addr}").parse().unwrap()
    }

    #[test]
    fn paths_follow_the_gateway_routes() {
        assert_eq!(
            path(&QueryRequest::SentAgreement { id: 3 }),
            "agreement/sentAgreement/3"
        );
        assert_eq!(
            path(&QueryRequest::TimedoutPurchaseorderAll),
            "purchaseorder/timedoutPurchaseorder"
        );
        assert_eq!(path(&QueryRequest::Params), "refund/params");
    }

    #[test]
    fn endpoint_ignores_trailing_slash_of_api_url() {
        let client = RestQueryClient::new("http://localhost:1317/".parse().unwrap());

        assert_eq!(
            client.endpoint("refund/refund"),
            "http://localhost:1317/stateset/core/refund/refund"
        );
    }

    #[tokio::test]
    async fn get_one_decodes_typed_response() {
        let router = Router::new().route(
            "/stateset/core/agreement/agreement/:id",
            get(|Path(id): Path<String>| async move {
                Json(json!({ "Agreement": { "id": id, "did": "did:stateset:a", "state": "active" } }))
            }),
        );
        let client = RestQueryClient::new(serve(router).await);

        let response = client
            .query(&QueryRequest::Agreement { id: 12 }, &Filter::new())
            .await
            .unwrap();

        let QueryResponse::Agreement(response) = response else {
            panic!("unexpected response kind")
        };
        assert_eq!(
            response.agreement,
            Some(Agreement {
                id: 12,
                did: "did:stateset:a".to_string(),
                state: "active".to_string(),
                ..Agreement::default()
            })
        );
    }

    #[tokio::test]
    async fn filter_is_sent_as_query_string() {
        let router = Router::new().route(
            "/stateset/core/agreement/agreement",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let ids: Vec<Value> = params
                    .get("pagination.limit")
                    .map(|limit| vec![json!({ "id": limit })])
                    .unwrap_or_default();
                Json(json!({
                    "Agreement": ids,
                    "pagination": { "next_key": params.get(PAGINATION_KEY), "total": "1" }
                }))
            }),
        );
        let client = RestQueryClient::new(serve(router).await);
        let filter = Filter::from([
            ("pagination.limit".to_string(), "7".to_string()),
            (PAGINATION_KEY.to_string(), "AQI=".to_string()),
        ]);

        let response = client
            .query(&QueryRequest::AgreementAll, &filter)
            .await
            .unwrap();

        let QueryResponse::AgreementAll(response) = response else {
            panic!("unexpected response kind")
        };
        assert_eq!(response.agreement.len(), 1);
        assert_eq!(response.agreement[0].id, 7);
        assert_eq!(
            response.pagination,
            Some(PageResponse {
                next_key: vec![1, 2],
                total: 1
            })
        );
    }

    #[tokio::test]
    async fn null_list_is_an_empty_page() {
        let router = Router::new().route(
            "/stateset/core/invoice/sentInvoice",
            get(|| async { Json(json!({ "SentInvoice": null, "pagination": null })) }),
        );
        let client = RestQueryClient::new(serve(router).await);

        let response = client
            .query(&QueryRequest::SentInvoiceAll, &Filter::new())
            .await
            .unwrap();

        assert_eq!(
            response,
            QueryResponse::SentInvoiceAll(QueryAllSentInvoiceResponse::default())
        );
        assert_eq!(response.next_key(), None);
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let router = Router::new().route(
            "/stateset/core/refund/params",
            get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );
        let client = RestQueryClient::new(serve(router).await);

        let err = client
            .query(&QueryRequest::Params, &Filter::new())
            .await
            .unwrap_err();

        assert!(matches!(err.current_context(), Error::Status(503)));
    }

    #[tokio::test]
    async fn unexpected_body_is_malformed() {
        let router = Router::new().route(
            "/stateset/core/refund/refund/:id",
            get(|| async { Json(json!({ "Refund": { "id": "not a number" } })) }),
        );
        let client = RestQueryClient::new(serve(router).await);

        let err = client
            .query(&QueryRequest::Refund { id: 1 }, &Filter::new())
            .await
            .unwrap_err();

        assert!(matches!(err.current_context(), Error::MalformedResponse));
    }

    #[tokio::test]
    async fn unreachable_node_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = RestQueryClient::new(format!("http://{addr}").parse().unwrap());

        let err = client
            .query(&QueryRequest::InvoiceAll, &Filter::new())
            .await
            .unwrap_err();

        assert!(matches!(err.current_context(), Error::Transport));
    }
}
