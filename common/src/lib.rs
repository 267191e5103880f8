//! Pieces shared between the simulator core and its driver.

pub mod cli;
pub mod program;
pub mod util;
