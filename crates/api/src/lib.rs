//! HTTP API: the job facade and the axum application that serves it.

pub mod app;
pub mod config;
pub mod facade;
