//! Backend: owns `GET /users`.

use std::sync::Arc;

use meshwork_rs::{CoreError, HttpModule};
use serde_json::json;
use tracing::info;

use crate::USERS_PATH;

/// Fixed roster. Names are inserted at the head, so the last inserted comes first.
pub struct UserDirectory;

impl UserDirectory {
    pub fn users() -> Vec<String> {
        let mut users = Vec::new();
        users.insert(0, "Alice".to_string());
        users.insert(0, "Bob".to_string());
        users
    }
}

/// `GET /users` answering the roster; logs `instance_id` on every call.
pub fn backend_module(instance_id: impl Into<String>) -> HttpModule {
    let instance_id: Arc<str> = Arc::from(instance_id.into());
    HttpModule::new("users", Some("/")).route(
        USERS_PATH,
        move |_| {
            let instance_id = Arc::clone(&instance_id);
            async move {
                info!(%instance_id, "GET /users");
                Ok::<_, CoreError>(json!(UserDirectory::users()))
            }
        },
        &["GET"],
    )
}
