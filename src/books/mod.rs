//! Books resource: bearer-gated CRUD over the transactional store.

pub mod handlers;
