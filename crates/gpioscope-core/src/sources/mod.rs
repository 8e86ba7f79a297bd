//! Line reader implementations.

pub mod mcp23017;
pub mod simulated;
pub mod sysfs;

pub use mcp23017::Mcp23017;
pub use simulated::SimulatedLines;
pub use sysfs::SysfsGpio;
