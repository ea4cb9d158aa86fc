//! Background Tasks Module
//!
//! Off-critical-path work: periodic cache warming.

mod warming;

pub use warming::{WarmingScheduler, WarmingStrategy};
