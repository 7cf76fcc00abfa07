pub mod config;
pub mod error;
pub mod models;
pub mod panel;
pub mod supervisor;
pub mod xmlrpc;
