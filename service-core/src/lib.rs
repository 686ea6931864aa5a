//! Shared infrastructure for AskRoom services: the error type, bind
//! configuration, HTTP middleware, and tracing setup.

pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
