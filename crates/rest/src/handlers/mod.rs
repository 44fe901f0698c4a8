//! HTTP request handlers.
//!
//! One module per resource. Handlers are generic over the
//! [`ReferenceStore`](bioref_store::ReferenceStore) implementation behind
//! [`AppState`](crate::state::AppState).

pub mod details;
pub mod export;
pub mod health;
pub mod search;
pub mod suggestions;
