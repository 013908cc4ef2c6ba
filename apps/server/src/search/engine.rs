//! The search engine: primary executor plus fallback orchestration.
//!
//! One parametrized engine serves every request shape; the variations
//! (proximity, distance sort, fee sort) are routing decisions, not separate
//! implementations.

use std::sync::Arc;

use crate::config::SearchConfig;
use crate::db::store::{
    AcademyStore, FailureKind, FindOptions, NearQuery, StoreError, StoreSort, StoreSortKey,
};
use crate::error::Result;
use crate::search::fallback;
use crate::search::filter::{self, CompiledQuery};
use crate::search::page::SearchPage;
use crate::search::params::{SearchParams, SortMode};

pub struct SearchEngine<S> {
    store: Arc<S>,
    config: SearchConfig,
}

impl<S: AcademyStore> SearchEngine<S> {
    pub fn new(store: Arc<S>, config: SearchConfig) -> Self {
        Self { store, config }
    }

    /// Resolve one search request to a result page.
    pub async fn search(&self, params: &SearchParams) -> Result<SearchPage> {
        let query = filter::compile(params, &self.config);

        // Orderings the store cannot provide natively always take the
        // in-memory path, index health notwithstanding: fee comparisons, and
        // distance ranking (which must stay deterministic and radius-optional).
        if query.sort.is_fee_sort() || (query.sort == SortMode::Distance && query.geo.is_some()) {
            let page = fallback::execute(
                self.store.as_ref(),
                &query.predicate,
                query.geo.as_ref(),
                query.sort,
                &query.page,
            )
            .await?;
            return Ok(page);
        }

        match self.native(&query).await {
            Ok(page) => Ok(page),
            Err(err)
                if query.geo.is_some() && err.kind() == FailureKind::IndexMissing =>
            {
                tracing::warn!(
                    error = %err,
                    "native proximity query unavailable, using in-memory fallback"
                );
                let page = fallback::execute(
                    self.store.as_ref(),
                    &query.predicate,
                    query.geo.as_ref(),
                    query.sort,
                    &query.page,
                )
                .await?;
                Ok(page)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Native path: store-side filtering, sort, pagination, and (when
    /// requested) proximity. Result and total come from the same predicate so
    /// the page math stays consistent.
    async fn native(&self, query: &CompiledQuery) -> std::result::Result<SearchPage, StoreError> {
        let near = query.geo.as_ref().map(|geo| NearQuery {
            center: geo.center,
            max_distance_m: geo.radius_meters(),
        });

        let opts = FindOptions {
            skip: query.page.skip(),
            limit: query.page.limit,
            sort: native_sort(query.sort),
            near,
        };

        let results = self.store.find(&query.predicate, &opts).await?;
        let total = self.store.count(&query.predicate, near.as_ref()).await?;

        Ok(SearchPage::assemble(results, &query.page, total))
    }
}

fn native_sort(sort: SortMode) -> Option<StoreSort> {
    match sort {
        SortMode::Newest => Some(StoreSort {
            key: StoreSortKey::CreatedAt,
            ascending: false,
        }),
        SortMode::StartedNewest => Some(StoreSort {
            key: StoreSortKey::StartedAt,
            ascending: false,
        }),
        SortMode::StartedOldest => Some(StoreSort {
            key: StoreSortKey::StartedAt,
            ascending: true,
        }),
        // Relevance keeps natural (or nearest-first) order; distance and fee
        // sorts never reach the native path with their ordering intact.
        SortMode::Relevance | SortMode::Distance | SortMode::PriceLowHigh | SortMode::PriceHighLow => {
            None
        }
    }
}
