pub mod panel_angle;
pub mod savings;
