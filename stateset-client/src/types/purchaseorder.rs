use prost::Message;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};

use super::JsonU64;

#[serde_as]
#[derive(Clone, PartialEq, Eq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Purchaseorder {
    #[prost(uint64, tag = "1")]
    #[serde_as(as = "JsonU64")]
    pub id: u64,
    #[prost(string, tag = "2")]
    #[serde_as(as = "DefaultOnNull")]
    pub did: String,
    #[prost(string, tag = "3")]
    #[serde_as(as = "DefaultOnNull")]
    pub uri: String,
    #[prost(string, tag = "4")]
    #[serde_as(as = "DefaultOnNull")]
    pub amount: String,
    #[prost(string, tag = "5")]
    #[serde_as(as = "DefaultOnNull")]
    pub state: String,
}

#[serde_as]
#[derive(Clone, PartialEq, Eq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct MsgRequestPurchaseorder {
    #[prost(string, tag = "1")]
    #[serde_as(as = "DefaultOnNull")]
    pub creator: String,
    #[prost(string, tag = "2")]
    #[serde_as(as = "DefaultOnNull")]
    pub did: String,
    #[prost(string, tag = "3")]
    #[serde_as(as = "DefaultOnNull")]
    pub uri: String,
    #[prost(string, tag = "4")]
    #[serde_as(as = "DefaultOnNull")]
    pub amount: String,
    #[prost(string, tag = "5")]
    #[serde_as(as = "DefaultOnNull")]
    pub state: String,
}

#[derive(Clone, PartialEq, Eq, Message, Serialize, Deserialize)]
pub struct MsgRequestPurchaseorderResponse {}

cross_chain_record!(SentPurchaseorder {
    create: MsgCreateSentPurchaseorder => MsgCreateSentPurchaseorderResponse,
    update: MsgUpdateSentPurchaseorder => MsgUpdateSentPurchaseorderResponse,
    delete: MsgDeleteSentPurchaseorder => MsgDeleteSentPurchaseorderResponse,
});

cross_chain_record!(TimedoutPurchaseorder {
    create: MsgCreateTimedoutPurchaseorder => MsgCreateTimedoutPurchaseorderResponse,
    update: MsgUpdateTimedoutPurchaseorder => MsgUpdateTimedoutPurchaseorderResponse,
    delete: MsgDeleteTimedoutPurchaseorder => MsgDeleteTimedoutPurchaseorderResponse,
});

transition_msgs!(
    MsgFinancePurchaseorder => MsgFinancePurchaseorderResponse,
    MsgCompletePurchaseorder => MsgCompletePurchaseorderResponse,
    MsgCancelPurchaseorder => MsgCancelPurchaseorderResponse,
);

entity_queries!(Purchaseorder as "Purchaseorder", purchaseorder {
    get: QueryGetPurchaseorderRequest => QueryGetPurchaseorderResponse,
    all: QueryAllPurchaseorderRequest => QueryAllPurchaseorderResponse,
});

entity_queries!(SentPurchaseorder as "SentPurchaseorder", sent_purchaseorder {
    get: QueryGetSentPurchaseorderRequest => QueryGetSentPurchaseorderResponse,
    all: QueryAllSentPurchaseorderRequest => QueryAllSentPurchaseorderResponse,
});

entity_queries!(TimedoutPurchaseorder as "TimedoutPurchaseorder", timedout_purchaseorder {
    get: QueryGetTimedoutPurchaseorderRequest => QueryGetTimedoutPurchaseorderResponse,
    all: QueryAllTimedoutPurchaseorderRequest => QueryAllTimedoutPurchaseorderResponse,
});

tx_msgs!("stateset.core.purchaseorder":
    MsgRequestPurchaseorder,
    MsgFinancePurchaseorder,
    MsgCompletePurchaseorder,
    MsgCancelPurchaseorder,
    MsgCreateSentPurchaseorder,
    MsgUpdateSentPurchaseorder,
    MsgDeleteSentPurchaseorder,
    MsgCreateTimedoutPurchaseorder,
    MsgUpdateTimedoutPurchaseorder,
    MsgDeleteTimedoutPurchaseorder,
);
