//! Evidence-gathering agents.
//!
//! Two retrieval strategies feed the loop: live web search
//! ([`web::WebAgent`]) and embedding lookup against the knowledge store
//! ([`knowledge::KnowledgeAgent`]). Both are failure-tolerant by contract:
//! they log and return what they have, never an error.

pub mod knowledge;
pub mod web;

pub use knowledge::KnowledgeAgent;
pub use web::{plan_queries, WebAgent};
