//! Core application primitives (server, runtime, scheduling, wiring)

pub mod bootstrap;
pub mod http;
pub mod runtime;
pub mod scheduler;

pub use http::*;
pub use runtime::*;
pub use scheduler::*;
