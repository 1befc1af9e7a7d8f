pub mod config;
pub mod error;
pub mod learner;
pub mod listener;
pub mod metrics;
pub mod narrator;
pub mod round;
mod routes;
pub mod session;
pub mod session_factory;
pub mod startup;
pub mod vocabulary;
pub mod websocket;
