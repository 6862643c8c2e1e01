//! Front: owns `GET /users` and forwards to the users capability unchanged.

use std::sync::Arc;

use meshwork_rs::{CoreError, HttpModule};
use serde_json::json;
use tracing::info;

use crate::api::UsersApi;
use crate::USERS_PATH;

/// `GET /users` delegating to `users`. Dependency failures surface as 503 (unavailable) or 502 (call failed).
pub fn front_module(instance_id: impl Into<String>, users: Arc<dyn UsersApi>) -> HttpModule {
    let instance_id: Arc<str> = Arc::from(instance_id.into());
    HttpModule::new("users", Some("/")).route(
        USERS_PATH,
        move |_| {
            let instance_id = Arc::clone(&instance_id);
            let users = Arc::clone(&users);
            async move {
                info!(%instance_id, "GET /users");
                let list = users.get_users().await?;
                Ok::<_, CoreError>(json!(list))
            }
        },
        &["GET"],
    )
}
