//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Capacity Monitor: Logs store usage and warns when it nears the budget

mod monitor;

pub use monitor::{check_capacity, spawn_capacity_monitor};
