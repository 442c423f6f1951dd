// Presentation layer - User-facing command surface
pub mod cli;
