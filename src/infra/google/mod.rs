pub mod auth;

pub use auth::ServiceAccountAuth;
