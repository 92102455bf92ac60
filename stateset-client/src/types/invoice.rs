use prost::Message;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};

use super::JsonU64;

#[serde_as]
#[derive(Clone, PartialEq, Eq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Invoice {
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

/// The caller picks the invoice id, so unlike the other records it travels as a string here.
#[serde_as]
#[derive(Clone, PartialEq, Eq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct MsgCreateInvoice {
    #[prost(string, tag = "1")]
    #[serde_as(as = "DefaultOnNull")]
    pub creator: String,
    #[prost(string, tag = "2")]
    #[serde_as(as = "DefaultOnNull")]
    pub id: String,
    #[prost(string, tag = "3")]
    #[serde_as(as = "DefaultOnNull")]
    pub did: String,
    #[prost(string, tag = "4")]
    #[serde_as(as = "DefaultOnNull")]
    pub amount: String,
    #[prost(string, tag = "5")]
    #[serde_as(as = "DefaultOnNull")]
    pub state: String,
    #[prost(string, tag = "6")]
    #[serde_as(as = "DefaultOnNull")]
    pub seller: String,
    #[prost(string, tag = "7")]
    #[serde_as(as = "DefaultOnNull")]
    pub purchaser: String,
}

#[derive(Clone, PartialEq, Eq, Message, Serialize, Deserialize)]
pub struct MsgCreateInvoiceResponse {}

cross_chain_record!(SentInvoice {
    create: MsgCreateSentInvoice => MsgCreateSentInvoiceResponse,
    update: MsgUpdateSentInvoice => MsgUpdateSentInvoiceResponse,
    delete: MsgDeleteSentInvoice => MsgDeleteSentInvoiceResponse,
});

cross_chain_record!(TimedoutInvoice {
    create: MsgCreateTimedoutInvoice => MsgCreateTimedoutInvoiceResponse,
    update: MsgUpdateTimedoutInvoice => MsgUpdateTimedoutInvoiceResponse,
    delete: MsgDeleteTimedoutInvoice => MsgDeleteTimedoutInvoiceResponse,
});

transition_msgs!(
    MsgFactorInvoice => MsgFactorInvoiceResponse,
    MsgPayInvoice => MsgPayInvoiceResponse,
    MsgVoidInvoice => MsgVoidInvoiceResponse,
);

entity_queries!(Invoice as "Invoice", invoice {
    get: QueryGetInvoiceRequest => QueryGetInvoiceResponse,
    all: QueryAllInvoiceRequest => QueryAllInvoiceResponse,
});

entity_queries!(SentInvoice as "SentInvoice", sent_invoice {
    get: QueryGetSentInvoiceRequest => QueryGetSentInvoiceResponse,
    all: QueryAllSentInvoiceRequest => QueryAllSentInvoiceResponse,
});

entity_queries!(TimedoutInvoice as "TimedoutInvoice", timedout_invoice {
    get: QueryGetTimedoutInvoiceRequest => QueryGetTimedoutInvoiceResponse,
    all: QueryAllTimedoutInvoiceRequest => QueryAllTimedoutInvoiceResponse,
});

tx_msgs!("stateset.core.invoice":
    MsgCreateInvoice,
    MsgFactorInvoice,
    MsgPayInvoice,
    MsgVoidInvoice,
    MsgCreateSentInvoice,
    MsgUpdateSentInvoice,
    MsgDeleteSentInvoice,
    MsgCreateTimedoutInvoice,
    MsgUpdateTimedoutInvoice,
    MsgDeleteTimedoutInvoice,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Codec;

    #[test]
    fn create_invoice_keeps_string_id() {
        let msg = MsgCreateInvoice {
            creator: "stateset1seller".to_string(),
            id: "inv-001".to_string(),
            seller: "stateset1seller".to_string(),
            purchaser: "stateset1buyer".to_string(),
            ..MsgCreateInvoice::default()
        };

        let json = msg.to_json().unwrap();
        assert_eq!(json["id"], serde_json::json!("inv-001"));
        assert_eq!(MsgCreateInvoice::from_bytes(&msg.to_bytes()).unwrap(), msg);
    }
}
