pub mod app;
pub mod capture;
pub mod commands;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod inputs;
pub mod locate;
pub mod output;
pub mod place;
pub mod runtime;
pub mod signature;

pub use app::run;
