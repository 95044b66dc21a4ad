// handlers/public/mod.rs - Public handlers (no session cookie required)
//
// Token acquisition and release. Everything else under /api needs the cookie.

pub mod session;

pub use session::{login_post, logout_post};
