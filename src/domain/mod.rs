// Domain layer - Panel definitions, render options, resolution outcomes
pub mod dashboard;
pub mod error;
pub mod options;
pub mod resolution;
