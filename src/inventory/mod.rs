//! Ad inventory availability estimation.

pub mod calculator;
pub mod config;
pub mod resolver;

pub use calculator::{
    FormatInventoryBreakdown, InventoryAvailabilityCalculator, InventoryEstimate,
    InventoryRequest, InventoryStatus,
};
pub use config::{FormatAlias, InventoryConfig};
pub use resolver::{FormatKeyResolution, FormatKeyResolver};
