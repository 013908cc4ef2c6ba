//! Storage layer: the `AcademyStore` trait and its backends.

pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::MemoryAcademyStore;
pub use postgres::PgAcademyStore;
pub use store::{
    AcademyStore, FailureKind, FindOptions, NearQuery, StoreError, StoreSort, StoreSortKey,
};
