pub mod parameters;
pub mod payload;

pub use parameters::{BatteryParameters, CostParameters, ForecastSeries};
pub use payload::{
    PanelAngleRequest, PanelHourRecord, SavingsRequest, SavingsResponse, SizingRequest,
    SizingResponse,
};
