// handlers/protected/mod.rs - Protected handlers (session cookie required)
//
// Every handler here passes through the session gate before anything is sent
// upstream. Most routes are rows in `proxy::ROUTES`; the modules beside it
// cover the few operations that need more than one call or a local store.

pub mod proxy;
pub mod session;
pub mod users;
pub mod visits;

pub use session::me_get;
pub use users::assign_role_put;
pub use visits::{visits_get, visits_post};
