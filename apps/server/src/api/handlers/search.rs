//! Search endpoint.
//!
//! `GET /api/search?q=...&type=...&minRating=...&lat=...&lng=...&sort=...`
//!
//! Every parameter is optional; malformed values normalize instead of
//! rejecting the request, so this handler never returns 400 for documented
//! parameters. Hard store failures surface as a generic 500.

use axum::extract::{RawQuery, State};
use axum::Json;

use crate::search::{SearchPage, SearchParams};
use crate::state::AppState;
use crate::Result;

pub async fn search(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<SearchPage>> {
    let items = parse_query_items(raw_query.as_deref().unwrap_or(""));
    let params = SearchParams::from_items(&items);

    tracing::debug!(
        q = params.q.as_deref().unwrap_or(""),
        sort = ?params.sort,
        geo = params.has_geo(),
        "search request"
    );

    let page = state.engine.search(&params).await?;
    Ok(Json(page))
}

/// Query string items in request order, with form-urlencoded semantics
/// (including '+' as space).
fn parse_query_items(raw: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(raw.as_bytes())
        .into_owned()
        .collect()
}
