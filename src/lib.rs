#![doc = "The `learntrack` library crate."]
#![doc = ""]
#![doc = "This crate contains the identity and access core of the LearnTrack demo:"]
#![doc = "credential storage and verification, session-token minting and checking,"]
#![doc = "Google identity reconciliation, the admin bootstrap, and the request-time"]
#![doc = "access guard, plus the routing and error handling around them. It is used"]
#![doc = "by the main binary (`main.rs`) to construct and run the application."]

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod store;
