pub mod command;
pub mod config;
pub mod dedupe;
pub mod discovery;
pub mod error;
pub mod import;
pub mod lifecycle;
pub mod openclaw;
pub mod remove;
pub mod store;
pub mod sync;
pub mod terminal;
pub mod timezone;
