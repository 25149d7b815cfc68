//! Database layer: pool lifecycle, batched introspection, DDL synthesis,
//! and the schema engine tying them together.

pub mod ddl;
pub mod engine;
pub mod introspect;
pub mod pool;
pub mod validate;

pub use engine::{ConnectUrl, EngineOptions, SchemaEngine};
pub use pool::{Drainable, PoolManager};
