//! Data access layer: row models, repository operations, and the
//! scope-bound transaction manager.

pub mod models;
pub mod operations;
pub mod scope;

pub use models::{Book, User};
pub use operations::{BookStore, UserStore};
pub use scope::{with_scope, LockMode, TxScope};
