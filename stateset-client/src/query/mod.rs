use std::collections::BTreeMap;

use async_trait::async_trait;
use error_stack::Result;
use mockall::automock;
use strum::{Display, EnumDiscriminants};
use thiserror::Error;

use crate::types::agreement::{
    QueryAllAgreementResponse, QueryAllSentAgreementResponse, QueryAllTimedoutAgreementResponse,
    QueryGetAgreementResponse, QueryGetSentAgreementResponse, QueryGetTimedoutAgreementResponse,
};
use crate::types::invoice::{
    QueryAllInvoiceResponse, QueryAllSentInvoiceResponse, QueryAllTimedoutInvoiceResponse,
    QueryGetInvoiceResponse, QueryGetSentInvoiceResponse, QueryGetTimedoutInvoiceResponse,
};
use crate::types::purchaseorder::{
    QueryAllPurchaseorderResponse, QueryAllSentPurchaseorderResponse,
    QueryAllTimedoutPurchaseorderResponse, QueryGetPurchaseorderResponse,
    QueryGetSentPurchaseorderResponse, QueryGetTimedoutPurchaseorderResponse,
};
use crate::types::refund::{QueryAllRefundResponse, QueryGetRefundResponse, QueryParamsResponse};
use crate::types::Paginated;

mod rest;

pub use rest::RestQueryClient;

/// Query-string parameters passed through to the node, e.g. `pagination.limit`.
pub type Filter = BTreeMap<String, String>;

pub const PAGINATION_KEY: &str = "pagination.key";

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to reach the API node")]
    Transport,
    #[error("API node returned status {0}")]
    Status(u16),
    #[error("received malformed response from the API node")]
    MalformedResponse,
}

/// One query the node can answer. Get-one variants carry the record id, list variants page through
/// all records.
#[derive(Clone, Debug, PartialEq, Eq, Hash, EnumDiscriminants)]
#[strum_discriminants(name(QueryKind), derive(Hash, Display))]
pub enum QueryRequest {
    Agreement { id: u64 },
    AgreementAll,
    SentAgreement { id: u64 },
    SentAgreementAll,
    TimedoutAgreement { id: u64 },
    TimedoutAgreementAll,
    Invoice { id: u64 },
    InvoiceAll,
    SentInvoice { id: u64 },
    SentInvoiceAll,
    TimedoutInvoice { id: u64 },
    TimedoutInvoiceAll,
    Purchaseorder { id: u64 },
    PurchaseorderAll,
    SentPurchaseorder { id: u64 },
    SentPurchaseorderAll,
    TimedoutPurchaseorder { id: u64 },
    TimedoutPurchaseorderAll,
    Params,
    Refund { id: u64 },
    RefundAll,
}

impl QueryRequest {
    pub fn kind(&self) -> QueryKind {
        self.into()
    }

    /// Path parameters of the request.
    pub fn params(&self) -> BTreeMap<String, String> {
        match self {
            Self::Agreement { id }
            | Self::SentAgreement { id }
            | Self::TimedoutAgreement { id }
            | Self::Invoice { id }
            | Self::SentInvoice { id }
            | Self::TimedoutInvoice { id }
            | Self::Purchaseorder { id }
            | Self::SentPurchaseorder { id }
            | Self::TimedoutPurchaseorder { id }
            | Self::Refund { id } => BTreeMap::from([("id".to_string(), id.to_string())]),
            _ => BTreeMap::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryResponse {
    Agreement(QueryGetAgreementResponse),
    AgreementAll(QueryAllAgreementResponse),
    SentAgreement(QueryGetSentAgreementResponse),
    SentAgreementAll(QueryAllSentAgreementResponse),
    TimedoutAgreement(QueryGetTimedoutAgreementResponse),
    TimedoutAgreementAll(QueryAllTimedoutAgreementResponse),
    Invoice(QueryGetInvoiceResponse),
    InvoiceAll(QueryAllInvoiceResponse),
    SentInvoice(QueryGetSentInvoiceResponse),
    SentInvoiceAll(QueryAllSentInvoiceResponse),
    TimedoutInvoice(QueryGetTimedoutInvoiceResponse),
    TimedoutInvoiceAll(QueryAllTimedoutInvoiceResponse),
    Purchaseorder(QueryGetPurchaseorderResponse),
    PurchaseorderAll(QueryAllPurchaseorderResponse),
    SentPurchaseorder(QueryGetSentPurchaseorderResponse),
    SentPurchaseorderAll(QueryAllSentPurchaseorderResponse),
    TimedoutPurchaseorder(QueryGetTimedoutPurchaseorderResponse),
    TimedoutPurchaseorderAll(QueryAllTimedoutPurchaseorderResponse),
    Params(QueryParamsResponse),
    Refund(QueryGetRefundResponse),
    RefundAll(QueryAllRefundResponse),
}

macro_rules! paginated_responses {
    ($($variant:ident),+ $(,)?) => {
        impl QueryResponse {
            /// Cursor of the next page, if this is a list response with more pages to fetch.
            pub fn next_key(&self) -> Option<&[u8]> {
                match self {
                    $(Self::$variant(res) => res.next_key(),)+
                    _ => None,
                }
            }

            /// Folds the next page into this response. Hands the page back if it is not a page of
            /// the same list.
            pub fn merge(&mut self, page: Self) -> std::result::Result<(), Self> {
                match (self, page) {
                    $((Self::$variant(acc), Self::$variant(page)) => {
                        acc.append_page(page);
                        Ok(())
                    })+
                    (_, page) => Err(page),
                }
            }
        }
    };
}

paginated_responses!(
    AgreementAll,
    SentAgreementAll,
    TimedoutAgreementAll,
    InvoiceAll,
    SentInvoiceAll,
    TimedoutInvoiceAll,
    PurchaseorderAll,
    SentPurchaseorderAll,
    TimedoutPurchaseorderAll,
    RefundAll,
);

#[automock]
#[async_trait]
pub trait QueryClient: Send + Sync {
    async fn query(&self, request: &QueryRequest, filter: &Filter) -> Result<QueryResponse, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::agreement::Agreement;
    use crate::types::PageResponse;

    #[test]
    fn kind_is_named_after_the_query() {
        assert_eq!(QueryRequest::AgreementAll.kind().to_string(), "AgreementAll");
        assert_eq!(
            QueryRequest::TimedoutPurchaseorder { id: 4 }.kind().to_string(),
            "TimedoutPurchaseorder"
        );
        assert_eq!(
            QueryRequest::Agreement { id: 1 }.kind(),
            QueryRequest::Agreement { id: 2 }.kind()
        );
    }

    #[test]
    fn params_hold_the_record_id() {
        assert_eq!(
            QueryRequest::Refund { id: 9 }.params(),
            BTreeMap::from([("id".to_string(), "9".to_string())])
        );
        assert!(QueryRequest::RefundAll.params().is_empty());
        assert!(QueryRequest::Params.params().is_empty());
    }

    #[test]
    fn merge_rejects_pages_of_another_list() {
        let mut acc = QueryResponse::AgreementAll(QueryAllAgreementResponse {
            agreement: vec![Agreement::default()],
            pagination: Some(PageResponse {
                next_key: b"next".to_vec(),
                total: 2,
            }),
        });
        assert_eq!(acc.next_key(), Some(b"next".as_slice()));

        let foreign = QueryResponse::RefundAll(QueryAllRefundResponse::default());
        assert_eq!(acc.merge(foreign.clone()), Err(foreign));

        let single = QueryResponse::Agreement(QueryGetAgreementResponse::default());
        assert_eq!(single.next_key(), None);
    }
}
