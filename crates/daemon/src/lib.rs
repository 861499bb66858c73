#![forbid(unsafe_code)]

//! PulseOps daemon: corridor monitoring, incident store and plan drafting
//! behind an HTTP API.

pub mod catalog;
pub mod config;
pub mod external;
pub mod gtfs;
pub mod http;
pub mod learning_log;
pub mod monitor;
pub mod planner;
pub mod service;
pub mod store;
pub mod world;
