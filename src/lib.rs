#![doc = "The `taskdeck` library crate."]
#![doc = ""]
#![doc = "Authentication (register/login/refresh/logout with JWT access tokens and"]
#![doc = "store-persisted refresh tokens), per-user task CRUD with filtering and"]
#![doc = "pagination, the middleware gate protecting task routes, and the shared"]
#![doc = "error taxonomy. The binary (`main.rs`) wires these modules into the"]
#![doc = "running HTTP server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
