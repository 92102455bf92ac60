use prost::Message;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};

use super::JsonU64;

#[serde_as]
#[derive(Clone, PartialEq, Eq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Agreement {
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

cross_chain_record!(SentAgreement {
    create: MsgCreateSentAgreement => MsgCreateSentAgreementResponse,
    update: MsgUpdateSentAgreement => MsgUpdateSentAgreementResponse,
    delete: MsgDeleteSentAgreement => MsgDeleteSentAgreementResponse,
});

cross_chain_record!(TimedoutAgreement {
    create: MsgCreateTimedoutAgreement => MsgCreateTimedoutAgreementResponse,
    update: MsgUpdateTimedoutAgreement => MsgUpdateTimedoutAgreementResponse,
    delete: MsgDeleteTimedoutAgreement => MsgDeleteTimedoutAgreementResponse,
});

transition_msgs!(
    MsgActivateAgreement => MsgActivateAgreementResponse,
    MsgExpireAgreement => MsgExpireAgreementResponse,
    MsgRenewAgreement => MsgRenewAgreementResponse,
    MsgTerminateAgreement => MsgTerminateAgreementResponse,
);

entity_queries!(Agreement as "Agreement", agreement {
    get: QueryGetAgreementRequest => QueryGetAgreementResponse,
    all: QueryAllAgreementRequest => QueryAllAgreementResponse,
});

entity_queries!(SentAgreement as "SentAgreement", sent_agreement {
    get: QueryGetSentAgreementRequest => QueryGetSentAgreementResponse,
    all: QueryAllSentAgreementRequest => QueryAllSentAgreementResponse,
});

entity_queries!(TimedoutAgreement as "TimedoutAgreement", timedout_agreement {
    get: QueryGetTimedoutAgreementRequest => QueryGetTimedoutAgreementResponse,
    all: QueryAllTimedoutAgreementRequest => QueryAllTimedoutAgreementResponse,
});

tx_msgs!("stateset.core.agreement":
    MsgActivateAgreement,
    MsgExpireAgreement,
    MsgRenewAgreement,
    MsgTerminateAgreement,
    MsgCreateSentAgreement,
    MsgUpdateSentAgreement,
    MsgDeleteSentAgreement,
    MsgCreateTimedoutAgreement,
    MsgUpdateTimedoutAgreement,
    MsgDeleteTimedoutAgreement,
);
