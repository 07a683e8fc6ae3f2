//! Parabola Tutor API Library Crate
//!
//! This library contains the web service around the tutoring proxy: the
//! application state, configuration, HTTP models, handlers and routing. The
//! `api` binary is a thin wrapper around this library.

pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
