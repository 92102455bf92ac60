//! Wire types of the stateset modules.
//!
//! Each module mirrors one `stateset.core.<module>` protobuf package: its records, its query
//! request/response pairs and the transaction messages it accepts.

use prost::Message;
use serde::{Deserialize, Serialize};
use serde_with::base64::Base64;
use serde_with::{serde_as, DefaultOnNull, DisplayFromStr, PickFirst, Same};

/// Records that are tracked across chains share one shape (`Sent*` and `Timedout*` variants), and
/// each of them comes with create, update and delete messages.
macro_rules! cross_chain_record {
    ($record:ident {
        create: $create:ident => $create_res:ident,
        update: $update:ident => $update_res:ident,
        delete: $delete:ident => $delete_res:ident $(,)?
    }) => {
        #[::serde_with::serde_as]
        #[derive(Clone, PartialEq, Eq, ::prost::Message, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(default)]
        pub struct $record {
            #[prost(uint64, tag = "1")]
            #[serde_as(as = "crate::types::JsonU64")]
            pub id: u64,
            #[prost(string, tag = "2")]
            #[serde_as(as = "::serde_with::DefaultOnNull")]
            pub did: String,
            #[prost(string, tag = "3")]
            #[serde_as(as = "::serde_with::DefaultOnNull")]
            pub chain: String,
            #[prost(string, tag = "4")]
            #[serde_as(as = "::serde_with::DefaultOnNull")]
            pub creator: String,
        }

        #[::serde_with::serde_as]
        #[derive(Clone, PartialEq, Eq, ::prost::Message, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(default)]
        pub struct $create {
            #[prost(string, tag = "1")]
            #[serde_as(as = "::serde_with::DefaultOnNull")]
            pub creator: String,
            #[prost(string, tag = "2")]
            #[serde_as(as = "::serde_with::DefaultOnNull")]
            pub did: String,
            #[prost(string, tag = "3")]
            #[serde_as(as = "::serde_with::DefaultOnNull")]
            pub chain: String,
        }

        #[::serde_with::serde_as]
        #[derive(Clone, PartialEq, Eq, ::prost::Message, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(default)]
        pub struct $create_res {
            #[prost(uint64, tag = "1")]
            #[serde_as(as = "crate::types::JsonU64")]
            pub id: u64,
        }

        #[::serde_with::serde_as]
        #[derive(Clone, PartialEq, Eq, ::prost::Message, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(default)]
        pub struct $update {
            #[prost(string, tag = "1")]
            #[serde_as(as = "::serde_with::DefaultOnNull")]
            pub creator: String,
            #[prost(uint64, tag = "2")]
            #[serde_as(as = "crate::types::JsonU64")]
            pub id: u64,
            #[prost(string, tag = "3")]
            #[serde_as(as = "::serde_with::DefaultOnNull")]
            pub did: String,
            #[prost(string, tag = "4")]
            #[serde_as(as = "::serde_with::DefaultOnNull")]
            pub chain: String,
        }

        #[derive(Clone, PartialEq, Eq, ::prost::Message, ::serde::Serialize, ::serde::Deserialize)]
        pub struct $update_res {}

        #[::serde_with::serde_as]
        #[derive(Clone, PartialEq, Eq, ::prost::Message, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(default)]
        pub struct $delete {
            #[prost(string, tag = "1")]
            #[serde_as(as = "::serde_with::DefaultOnNull")]
            pub creator: String,
            #[prost(uint64, tag = "2")]
            #[serde_as(as = "crate::types::JsonU64")]
            pub id: u64,
        }

        #[derive(Clone, PartialEq, Eq, ::prost::Message, ::serde::Serialize, ::serde::Deserialize)]
        pub struct $delete_res {}
    };
}

/// State transitions that only need the signer and the record id (activate, pay, cancel, ...).
macro_rules! transition_msgs {
    ($($msg:ident => $res:ident),+ $(,)?) => {
        $(
            #[::serde_with::serde_as]
            #[derive(Clone, PartialEq, Eq, ::prost::Message, ::serde::Serialize, ::serde::Deserialize)]
            #[serde(default)]
            pub struct $msg {
                #[prost(string, tag = "1")]
                #[serde_as(as = "::serde_with::DefaultOnNull")]
                pub creator: String,
                #[prost(uint64, tag = "2")]
                #[serde_as(as = "crate::types::JsonU64")]
                pub id: u64,
            }

            #[derive(Clone, PartialEq, Eq, ::prost::Message, ::serde::Serialize, ::serde::Deserialize)]
            pub struct $res {}
        )+
    };
}

/// The get-one and list query pairs of an entity. The REST gateway names the entity field after the
/// entity itself, capitalised.
macro_rules! entity_queries {
    ($entity:ident as $json:tt, $field:ident {
        get: $get_req:ident => $get_res:ident,
        all: $all_req:ident => $all_res:ident $(,)?
    }) => {
        #[::serde_with::serde_as]
        #[derive(Clone, PartialEq, Eq, ::prost::Message, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(default)]
        pub struct $get_req {
            #[prost(uint64, tag = "1")]
            #[serde_as(as = "crate::types::JsonU64")]
            pub id: u64,
        }

        #[derive(Clone, PartialEq, Eq, ::prost::Message, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(default)]
        pub struct $get_res {
            #[prost(message, optional, tag = "1")]
            #[serde(rename = $json)]
            pub $field: Option<$entity>,
        }

        #[derive(Clone, PartialEq, Eq, ::prost::Message, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(default)]
        pub struct $all_req {
            #[prost(message, optional, tag = "1")]
            #[serde(skip_serializing_if = "Option::is_none")]
            pub pagination: Option<$crate::types::PageRequest>,
        }

        #[::serde_with::serde_as]
        #[derive(Clone, PartialEq, Eq, ::prost::Message, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(default)]
        pub struct $all_res {
            #[prost(message, repeated, tag = "1")]
            #[serde_as(as = "::serde_with::DefaultOnNull")]
            #[serde(rename = $json)]
            pub $field: Vec<$entity>,
            #[prost(message, optional, tag = "2")]
            #[serde(skip_serializing_if = "Option::is_none")]
            pub pagination: Option<$crate::types::PageResponse>,
        }

        impl $crate::types::Paginated for $all_res {
            fn pagination(&self) -> Option<&$crate::types::PageResponse> {
                self.pagination.as_ref()
            }

            fn append_page(&mut self, page: Self) {
                self.$field.extend(page.$field);
                self.pagination = page.pagination;
            }
        }
    };
}

/// Implements [TxMsg](crate::tx::TxMsg) for every listed message of a protobuf package and exports
/// the package's type URLs.
macro_rules! tx_msgs {
    ($package:tt: $($msg:ident),+ $(,)?) => {
        $(
            impl $crate::tx::TxMsg for $msg {
                const TYPE_URL: &'static str = concat!("/", $package, ".", stringify!($msg));
            }
        )+

        pub const TYPE_URLS: &[&str] = &[$(concat!("/", $package, ".", stringify!($msg))),+];
    };
}

/// JSON form of a `uint64`: a decimal string, or a number on input. `null` reads as zero.
pub(crate) type JsonU64 = DefaultOnNull<PickFirst<(DisplayFromStr, Same)>>;

pub mod agreement;
pub mod invoice;
pub mod purchaseorder;
pub mod refund;

#[serde_as]
#[derive(Clone, PartialEq, Eq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRequest {
    #[prost(bytes = "vec", tag = "1")]
    #[serde_as(as = "DefaultOnNull<Base64>")]
    pub key: Vec<u8>,
    #[prost(uint64, tag = "2")]
    #[serde_as(as = "JsonU64")]
    pub offset: u64,
    #[prost(uint64, tag = "3")]
    #[serde_as(as = "JsonU64")]
    pub limit: u64,
    #[prost(bool, tag = "4")]
    #[serde_as(as = "DefaultOnNull")]
    pub count_total: bool,
    #[prost(bool, tag = "5")]
    #[serde_as(as = "DefaultOnNull")]
    pub reverse: bool,
}

#[serde_as]
#[derive(Clone, PartialEq, Eq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct PageResponse {
    /// Opaque cursor of the next page. Empty on the last page.
    #[prost(bytes = "vec", tag = "1")]
    #[serde_as(as = "DefaultOnNull<Base64>")]
    pub next_key: Vec<u8>,
    #[prost(uint64, tag = "2")]
    #[serde_as(as = "JsonU64")]
    pub total: u64,
}

/// A list response that can be assembled from several pages.
pub trait Paginated {
    fn pagination(&self) -> Option<&PageResponse>;

    /// Appends the entries of `page` and takes over its pagination.
    fn append_page(&mut self, page: Self);

    fn next_key(&self) -> Option<&[u8]> {
        self.pagination()
            .map(|pagination| pagination.next_key.as_slice())
            .filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::agreement::{Agreement, QueryAllAgreementResponse};
    use super::*;

    fn page(ids: &[u64], next_key: &[u8]) -> QueryAllAgreementResponse {
        QueryAllAgreementResponse {
            agreement: ids
                .iter()
                .map(|id| Agreement {
                    id: *id,
                    ..Agreement::default()
                })
                .collect(),
            pagination: Some(PageResponse {
                next_key: next_key.to_vec(),
                total: 5,
            }),
        }
    }

    #[test]
    fn appended_pages_keep_entries_in_page_order() {
        let mut acc = page(&[1, 2], b"k1");
        acc.append_page(page(&[3, 4], b"k2"));
        acc.append_page(page(&[4, 5], b""));

        let ids: Vec<_> = acc.agreement.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 4, 5]);
        assert_eq!(acc.next_key(), None);
    }

    #[test]
    fn next_key_is_absent_without_pagination() {
        let mut response = page(&[1], b"cursor");
        assert_eq!(response.next_key(), Some(b"cursor".as_slice()));

        response.pagination = None;
        assert_eq!(response.next_key(), None);
    }
}
