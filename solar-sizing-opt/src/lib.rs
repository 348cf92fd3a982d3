pub mod general;
pub mod server;
pub mod sizing;

// Re-export commonly used items for convenience
pub use sizing::error::{SizingError, SolutionStatus};
pub use sizing::sizing_opt::{SizingResult, run_sizing, run_sizing_from_request};
