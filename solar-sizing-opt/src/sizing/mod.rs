pub mod error;
pub mod plot;
pub mod sizing_opt;
