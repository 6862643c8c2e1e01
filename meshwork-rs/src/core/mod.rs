//! Core: Application, Module, HttpModule.

pub mod app;
pub mod module;
pub mod routing;

pub use app::{Application, BoundApplication, Handler, HandlerFuture, Registration, StartupError};
pub use module::Module;
pub use routing::HttpModule;
