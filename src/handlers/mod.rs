// handlers/mod.rs - HTTP handlers grouped by access tier
//
// Public (no cookie) -> Protected (session cookie) -> Pages (edge gated)

pub mod pages;
pub mod protected;
pub mod public;
pub mod system;
