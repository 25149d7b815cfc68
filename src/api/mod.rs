//! HTTP boundary: routing, JSON envelope, and server bootstrap.

pub mod handlers;
pub mod server;

pub use handlers::router;
pub use server::serve;
