//! PostgreSQL `AcademyStore`.
//!
//! Documents live in a single JSONB column; the predicate compiles to SQL
//! with positional binds. Proximity rides on the `cube`/`earthdistance`
//! extensions — when they are absent the query fails with an error the
//! classifier maps to `IndexMissing`, and the engine recomputes in memory.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::PgPool;

use crate::db::store::{
    AcademyStore, FindOptions, NearQuery, StoreError, StoreResult, StoreSort, StoreSortKey,
};
use crate::models::AcademyRecord;
use crate::search::filter::{Predicate, RatingBucket};

pub struct PgAcademyStore {
    pool: PgPool,
}

impl PgAcademyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Bind values for `sqlx` queries.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    Float(f64),
}

fn push_text(bind_params: &mut Vec<BindValue>, value: String) -> usize {
    bind_params.push(BindValue::Text(value));
    bind_params.len()
}

fn push_float(bind_params: &mut Vec<BindValue>, value: f64) -> usize {
    bind_params.push(BindValue::Float(value));
    bind_params.len()
}

/// Escape SQL LIKE meta-characters so user input is treated literally.
fn escape_like_pattern(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' | '%' | '_' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

fn contains_pattern(value: &str) -> String {
    format!("%{}%", escape_like_pattern(value))
}

const LAT_EXPR: &str = "(a.doc#>>'{location,coordinates,1}')::float8";
const LNG_EXPR: &str = "(a.doc#>>'{location,coordinates,0}')::float8";

/// Only documents with an exactly-2-element numeric pair take part in
/// proximity math; everything else is excluded, not an error.
const VALID_COORDS: &str = "jsonb_typeof(a.doc#>'{location,coordinates}') = 'array' \
     AND jsonb_array_length(a.doc#>'{location,coordinates}') = 2 \
     AND jsonb_typeof(a.doc#>'{location,coordinates,0}') = 'number' \
     AND jsonb_typeof(a.doc#>'{location,coordinates,1}') = 'number'";

/// A program array defensively coerced to an array (documents are not
/// trusted to carry the right shape).
fn program_array(field: &str) -> String {
    format!(
        "CASE WHEN jsonb_typeof(a.doc->'{field}') = 'array' THEN a.doc->'{field}' ELSE '[]'::jsonb END"
    )
}

fn build_clauses(predicate: &Predicate, bind_params: &mut Vec<BindValue>) -> Vec<String> {
    let mut clauses = Vec::new();

    if let Some(needle) = &predicate.text {
        let pattern = contains_pattern(needle);
        let mut parts = Vec::new();
        for field in ["name", "type", "phone"] {
            let idx = push_text(bind_params, pattern.clone());
            parts.push(format!("a.doc->>'{field}' ILIKE ${idx}"));
        }
        let idx = push_text(bind_params, pattern.clone());
        parts.push(format!("a.doc#>>'{{address,city}}' ILIKE ${idx}"));
        for (array, name_field) in [("artprogram", "art_name"), ("sportsprogram", "sport_name")] {
            let idx = push_text(bind_params, pattern.clone());
            parts.push(format!(
                "EXISTS (SELECT 1 FROM jsonb_array_elements({}) p WHERE p->>'{name_field}' ILIKE ${idx})",
                program_array(array)
            ));
        }
        clauses.push(format!("({})", parts.join(" OR ")));
    }

    if let Some(kind) = &predicate.kind {
        let idx = push_text(bind_params, kind.clone());
        clauses.push(format!("a.doc->>'type' = ${idx}"));
    }

    if let Some(id) = &predicate.external_id {
        let idx = push_text(bind_params, id.clone());
        clauses.push(format!("a.doc->>'id' = ${idx}"));
    }

    if let Some(state) = &predicate.state {
        let idx = push_text(bind_params, contains_pattern(state));
        clauses.push(format!("a.doc#>>'{{address,state}}' ILIKE ${idx}"));
    }

    if let Some(country) = &predicate.country {
        let idx = push_text(bind_params, contains_pattern(country));
        clauses.push(format!("a.doc#>>'{{address,country}}' ILIKE ${idx}"));
    }

    if let Some(bucket) = &predicate.rating {
        let rating = "(a.doc->>'average_rating')::float8";
        let guard = "jsonb_typeof(a.doc->'average_rating') = 'number'";
        match bucket {
            RatingBucket::Band { min, below } => {
                let min_idx = push_float(bind_params, *min);
                let below_idx = push_float(bind_params, *below);
                clauses.push(format!(
                    "({guard} AND {rating} >= ${min_idx} AND {rating} < ${below_idx})"
                ));
            }
            RatingBucket::Exactly(value) => {
                let idx = push_float(bind_params, *value);
                clauses.push(format!("({guard} AND {rating} = ${idx})"));
            }
        }
    }

    if let Some(fee) = &predicate.fee {
        let mut parts = Vec::new();
        for array in ["artprogram", "sportsprogram"] {
            let mut bounds = Vec::new();
            if let Some(min) = fee.min {
                let idx = push_float(bind_params, min);
                bounds.push(format!("(p->>'fees_per_month')::float8 >= ${idx}"));
            }
            if let Some(max) = fee.max {
                let idx = push_float(bind_params, max);
                bounds.push(format!("(p->>'fees_per_month')::float8 <= ${idx}"));
            }
            parts.push(format!(
                "EXISTS (SELECT 1 FROM jsonb_array_elements({}) p WHERE (p->>'fees_per_month') ~ '^-?\\d+(\\.\\d+)?$' AND {})",
                program_array(array),
                bounds.join(" AND ")
            ));
        }
        clauses.push(format!("({})", parts.join(" OR ")));
    }

    clauses
}

fn near_clause(near: &NearQuery, bind_params: &mut Vec<BindValue>) -> String {
    let lat_idx = push_float(bind_params, near.center.lat);
    let lng_idx = push_float(bind_params, near.center.lng);
    let dist_idx = push_float(bind_params, near.max_distance_m);
    format!(
        "({VALID_COORDS} \
         AND earth_box(ll_to_earth(${lat_idx}, ${lng_idx}), ${dist_idx}) @> ll_to_earth({LAT_EXPR}, {LNG_EXPR}) \
         AND earth_distance(ll_to_earth(${lat_idx}, ${lng_idx}), ll_to_earth({LAT_EXPR}, {LNG_EXPR})) <= ${dist_idx})"
    )
}

fn order_by(opts: &FindOptions, bind_params: &mut Vec<BindValue>) -> Option<String> {
    if let Some(StoreSort { key, ascending }) = opts.sort {
        let column = match key {
            StoreSortKey::CreatedAt => "a.created_at",
            StoreSortKey::StartedAt => "a.started_at",
        };
        let dir = if ascending { "ASC" } else { "DESC" };
        // Missing timestamps sort as epoch zero; id keeps ordering
        // deterministic across pages.
        return Some(format!(
            "COALESCE({column}, 'epoch'::timestamptz) {dir}, a.id ASC"
        ));
    }

    if let Some(near) = &opts.near {
        let lat_idx = push_float(bind_params, near.center.lat);
        let lng_idx = push_float(bind_params, near.center.lng);
        return Some(format!(
            "earth_distance(ll_to_earth(${lat_idx}, ${lng_idx}), ll_to_earth({LAT_EXPR}, {LNG_EXPR})) ASC"
        ));
    }

    None
}

fn build_find_sql(predicate: &Predicate, opts: &FindOptions) -> (String, Vec<BindValue>) {
    let mut bind_params = Vec::new();
    let mut clauses = build_clauses(predicate, &mut bind_params);
    if let Some(near) = &opts.near {
        clauses.push(near_clause(near, &mut bind_params));
    }

    let mut sql = String::from("SELECT a.doc FROM academies a");
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    if let Some(order) = order_by(opts, &mut bind_params) {
        sql.push_str(" ORDER BY ");
        sql.push_str(&order);
    }
    if opts.limit > 0 {
        sql.push_str(&format!(" LIMIT {} OFFSET {}", opts.limit, opts.skip));
    }

    (sql, bind_params)
}

fn build_count_sql(predicate: &Predicate, near: Option<&NearQuery>) -> (String, Vec<BindValue>) {
    let mut bind_params = Vec::new();
    let mut clauses = build_clauses(predicate, &mut bind_params);
    if let Some(near) = near {
        clauses.push(near_clause(near, &mut bind_params));
    }

    let mut sql = String::from("SELECT COUNT(*) FROM academies a");
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }

    (sql, bind_params)
}

fn bind_all<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    bind_params: Vec<BindValue>,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    for value in bind_params {
        query = match value {
            BindValue::Text(v) => query.bind(v),
            BindValue::Float(v) => query.bind(v),
        };
    }
    query
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Io(e) => StoreError::Connection(e.to_string()),
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            StoreError::Connection(err.to_string())
        }
        sqlx::Error::Database(db) => StoreError::Backend(db.message().to_string()),
        other => StoreError::Backend(other.to_string()),
    }
}

/// Rows whose documents no longer deserialize are skipped, not fatal.
fn rows_to_records(rows: Vec<sqlx::postgres::PgRow>) -> Vec<AcademyRecord> {
    use sqlx::Row;
    rows.iter()
        .filter_map(|row| row.try_get::<JsonValue, _>("doc").ok())
        .filter_map(|doc| serde_json::from_value(doc).ok())
        .collect()
}

#[async_trait]
impl AcademyStore for PgAcademyStore {
    async fn find(
        &self,
        predicate: &Predicate,
        opts: &FindOptions,
    ) -> StoreResult<Vec<AcademyRecord>> {
        let (sql, bind_params) = build_find_sql(predicate, opts);
        let rows = bind_all(sqlx::query(&sql), bind_params)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows_to_records(rows))
    }

    async fn count(&self, predicate: &Predicate, near: Option<&NearQuery>) -> StoreResult<u64> {
        let (sql, bind_params) = build_count_sql(predicate, near);
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for value in bind_params {
            query = match value {
                BindValue::Text(v) => query.bind(v),
                BindValue::Float(v) => query.bind(v),
            };
        }
        let total = query
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(total.max(0) as u64)
    }

    async fn find_all(&self, predicate: &Predicate) -> StoreResult<Vec<AcademyRecord>> {
        let opts = FindOptions::default();
        let (sql, bind_params) = build_find_sql(predicate, &opts);
        let rows = bind_all(sqlx::query(&sql), bind_params)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows_to_records(rows))
    }

    async fn get(&self, key: &str) -> StoreResult<Option<AcademyRecord>> {
        let rows = sqlx::query(
            "SELECT a.doc FROM academies a WHERE a.id = $1 OR a.doc->>'id' = $1 LIMIT 1",
        )
        .bind(key)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(rows_to_records(rows).into_iter().next())
    }
}
