use prost::Message;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};

use super::JsonU64;

#[serde_as]
#[derive(Clone, PartialEq, Eq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Refund {
    #[prost(uint64, tag = "1")]
    #[serde_as(as = "JsonU64")]
    pub id: u64,
    #[prost(string, tag = "2")]
    #[serde_as(as = "DefaultOnNull")]
    pub creator: String,
    #[prost(string, tag = "3")]
    #[serde_as(as = "DefaultOnNull")]
    pub did: String,
    #[prost(string, tag = "4")]
    #[serde_as(as = "DefaultOnNull")]
    pub amount: String,
    #[prost(string, tag = "5")]
    #[serde_as(as = "DefaultOnNull")]
    pub fee: String,
    #[prost(string, tag = "6")]
    #[serde_as(as = "DefaultOnNull")]
    pub deadline: String,
    #[prost(string, tag = "7")]
    #[serde_as(as = "DefaultOnNull")]
    pub state: String,
}

/// Module parameters. The refund module currently defines none.
#[derive(Clone, PartialEq, Eq, Message, Serialize, Deserialize)]
pub struct Params {}

#[derive(Clone, PartialEq, Eq, Message, Serialize, Deserialize)]
pub struct QueryParamsRequest {}

#[derive(Clone, PartialEq, Eq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryParamsResponse {
    #[prost(message, optional, tag = "1")]
    pub params: Option<Params>,
}

#[serde_as]
#[derive(Clone, PartialEq, Eq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct MsgRequestRefund {
    #[prost(string, tag = "1")]
    #[serde_as(as = "DefaultOnNull")]
    pub creator: String,
    #[prost(string, tag = "2")]
    #[serde_as(as = "DefaultOnNull")]
    pub did: String,
    #[prost(string, tag = "3")]
    #[serde_as(as = "DefaultOnNull")]
    pub amount: String,
    #[prost(string, tag = "4")]
    #[serde_as(as = "DefaultOnNull")]
    pub fee: String,
    #[prost(string, tag = "5")]
    #[serde_as(as = "DefaultOnNull")]
    pub deadline: String,
}

#[derive(Clone, PartialEq, Eq, Message, Serialize, Deserialize)]
pub struct MsgRequestRefundResponse {}

transition_msgs!(
    MsgApproveRefund => MsgApproveRefundResponse,
    MsgRejectRefund => MsgRejectRefundResponse,
);

entity_queries!(Refund as "Refund", refund {
    get: QueryGetRefundRequest => QueryGetRefundResponse,
    all: QueryAllRefundRequest => QueryAllRefundResponse,
});

tx_msgs!("stateset.core.refund":
    MsgRequestRefund,
    MsgApproveRefund,
    MsgRejectRefund,
);
