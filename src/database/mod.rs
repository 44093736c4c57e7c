pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use memory::{Fault, MemoryStore};
pub use postgres::PgStore;
pub use store::{ShowcaseOrder, Store, StoreError, StoreResult, StoreTx};
