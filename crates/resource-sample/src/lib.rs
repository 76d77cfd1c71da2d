//! # Resource Recipe Blog Library
//!
//! A small blog built on `resource_framework`, exposing its modules for
//! integration testing.

pub mod handlers;
pub mod lifecycle;
pub mod model;
pub mod schema;
pub mod store;
