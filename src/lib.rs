//! FibRouter - Fibonacci-based trading signal router
//!
//! This library turns market snapshots into trading decisions: strategy
//! sources derive Fibonacci support/resistance levels and propose signals,
//! an aggregator merges them, and a router gates the result through a
//! decision smoother before handing BUY/SELL actions to an executor.

pub mod api;
pub mod bus;
pub mod config;
pub mod constants;
pub mod data;
pub mod error;
pub mod events;
pub mod execution;
pub mod fibonacci;
pub mod services;
pub mod strategies;

// Re-export commonly used types
pub use bus::EventBus;
pub use config::AppConfig;
pub use events::{Action, Event, ExecutionReport, FinalDecision, Signal};

#[cfg(test)]
mod events_tests;
