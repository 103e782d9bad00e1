//! Ledge domain — граф climb points и environment probes
//!
//! Содержит:
//! - ClimbPoint / Neighbour / ConnectionType (граф, read-only в runtime)
//! - nearest_climb_point (контакт с уступом → узел графа)
//! - EnvironmentScanner (forward/drop/obstacle probes) + RayScanner по умолчанию

pub mod graph;
pub mod scanner;

pub use graph::*;
pub use scanner::*;
