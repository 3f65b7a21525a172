pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod filter;
pub mod launch;
pub mod output;
pub mod pagination;
pub mod runner;
pub mod sentinel;
pub mod session;
pub mod source;
pub mod view;

#[cfg(test)]
mod tests;
