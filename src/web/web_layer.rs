// Web layer - the platform adapter. Translates HTTP requests into core
// calls; no business logic lives here.

#[path = "routes.rs"]
pub mod routes;

#[path = "page.rs"]
pub mod page;

pub use routes::{router, AppState};
