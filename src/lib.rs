//! Library exports for the URL shortener application
//!
//! This module exposes internal components for testing and potential library usage.

pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod handler;
pub mod middleware;
pub mod model;
pub mod route;
pub mod shortcode;
pub mod store;
