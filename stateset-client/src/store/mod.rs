//! Cached view of the chain state, refreshed by replaying subscribed queries.

use std::collections::HashSet;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use error_stack::{bail, report, Result, ResultExt};
use futures::future::join_all;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use typed_builder::TypedBuilder;

use crate::query::{Filter, QueryClient, QueryKind, QueryRequest, QueryResponse, PAGINATION_KEY};

mod cache;

pub use cache::{CacheStore, InMemoryCache, RequestKey};

#[derive(Error, Debug)]
pub enum Error {
    #[error("QueryClient:Query{kind} API node unavailable, could not perform query")]
    Query { kind: QueryKind },
    #[error("QueryClient:Query{kind} received a page that does not belong to the query")]
    MismatchedPage { kind: QueryKind },
    #[error("QueryClient:Query{kind} pagination cursor repeated a page already fetched")]
    StalledCursor { kind: QueryKind },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Replay the query on every store update.
    pub subscribe: bool,
    /// Follow the pagination cursor and merge all pages into one response.
    pub all: bool,
}

/// A query that is replayed on every store update.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub request: QueryRequest,
    pub filter: Filter,
    pub all: bool,
}

#[derive(Debug)]
pub struct ReplayOutcome {
    pub subscription: Subscription,
    pub result: Result<QueryResponse, Error>,
}

#[derive(TypedBuilder)]
pub struct Store<Q, C> {
    #[builder(setter(transform = |client: Q| Arc::new(client)))]
    client: Arc<Q>,
    #[builder(setter(transform = |cache: C| Arc::new(RwLock::new(cache))))]
    cache: Arc<RwLock<C>>,
    /// In registration order.
    #[builder(default, setter(skip))]
    subscriptions: Arc<RwLock<Vec<Subscription>>>,
}

impl<Q, C> Clone for Store<Q, C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            cache: self.cache.clone(),
            subscriptions: self.subscriptions.clone(),
        }
    }
}

impl<Q, C> Store<Q, C>
where
    Q: QueryClient,
    C: CacheStore,
{
    /// Runs the query, caches the response and, if asked to, subscribes to it.
    ///
    /// Nothing is cached or subscribed when the query fails.
    pub async fn query(
        &self,
        request: QueryRequest,
        filter: Filter,
        options: QueryOptions,
    ) -> Result<QueryResponse, Error> {
        let response = self.fetch(&request, &filter, options.all).await?;

        self.cache.write().await.insert(
            request.kind(),
            RequestKey::new(&request, &filter),
            response.clone(),
        );

        if options.subscribe {
            let subscription = Subscription {
                request,
                filter,
                all: options.all,
            };
            let mut subscriptions = self.subscriptions.write().await;
            if !subscriptions.contains(&subscription) {
                subscriptions.push(subscription);
            }
        }

        Ok(response)
    }

    /// Last cached response for the request, if it was ever queried.
    pub async fn get(&self, request: &QueryRequest, filter: &Filter) -> Option<QueryResponse> {
        self.cache
            .read()
            .await
            .get(request.kind(), &RequestKey::new(request, filter))
            .cloned()
    }

    /// Drops every cached response and subscription.
    pub async fn reset_state(&self) {
        self.cache.write().await.clear();
        self.subscriptions.write().await.clear();
    }

    pub async fn unsubscribe(&self, subscription: &Subscription) -> bool {
        let mut subscriptions = self.subscriptions.write().await;
        let len = subscriptions.len();
        subscriptions.retain(|s| s != subscription);

        subscriptions.len() != len
    }

    pub async fn subscriptions(&self) -> Vec<Subscription> {
        self.subscriptions.read().await.clone()
    }

    /// Replays all subscriptions concurrently. A failing replay is logged and reported in its
    /// outcome without affecting the others. Outcomes are in registration order.
    pub async fn store_update(&self) -> Vec<ReplayOutcome> {
        let subscriptions = self.subscriptions().await;

        join_all(subscriptions.into_iter().map(|subscription| async move {
            let options = QueryOptions {
                subscribe: false,
                all: subscription.all,
            };
            let result = self
                .query(
                    subscription.request.clone(),
                    subscription.filter.clone(),
                    options,
                )
                .await
                .attach_printable_lazy(|| format!("{{ subscription = {subscription:?} }}"));

            if let Err(err) = &result {
                warn!(
                    kind = %subscription.request.kind(),
                    err = ?err,
                    "failed to replay subscription"
                );
            }

            ReplayOutcome {
                subscription,
                result,
            }
        }))
        .await
    }

    async fn fetch(
        &self,
        request: &QueryRequest,
        filter: &Filter,
        all: bool,
    ) -> Result<QueryResponse, Error> {
        let kind = request.kind();
        let mut response = self
            .client
            .query(request, filter)
            .await
            .change_context(Error::Query { kind })?;

        if !all {
            return Ok(response);
        }

        let mut page_filter = filter.clone();
        let mut sent_cursors: HashSet<String> =
            filter.get(PAGINATION_KEY).cloned().into_iter().collect();
        while let Some(next_key) = response.next_key() {
            let cursor = STANDARD.encode(next_key);
            if !sent_cursors.insert(cursor.clone()) {
                bail!(Error::StalledCursor { kind });
            }

            debug!(%kind, %cursor, "fetching next page");
            page_filter.insert(PAGINATION_KEY.to_string(), cursor);

            let page = self
                .client
                .query(request, &page_filter)
                .await
                .change_context(Error::Query { kind })?;
            response
                .merge(page)
                .map_err(|_| report!(Error::MismatchedPage { kind }))?;
        }

        Ok(response)
    }
}
