//! Module: register into app.

use meshwork_core::CoreError;

use super::app::Application;

/// Module: register routes or adapters into the app.
pub trait Module {
    fn register_into(&mut self, app: &mut Application) -> Result<(), CoreError>;
}
