//! Users services: a backend answering a fixed roster and a front that forwards to it through discovery.

pub mod api;
pub mod backend;
pub mod front;

pub use api::{users_client, DiscoveredUsers, UsersApi};
pub use backend::{backend_module, UserDirectory};
pub use front::front_module;

/// Logical name the backend registers under and the front depends on.
pub const BACKEND_SERVICE: &str = "service2";
pub const FRONT_SERVICE: &str = "service1";
pub const USERS_PATH: &str = "users";
