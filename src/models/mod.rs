// Data models for Volvo Cars API responses

pub mod fields;
pub mod vehicle;

pub use fields::{ValueField, ValueStatusField};
pub use vehicle::{
    AvailableCommand, CommandResult, ErrorResult, InvokeStatus, Location, LocationGeometry,
    LocationProperties, Vehicle, VehicleCommand, VehicleDescriptions, VehicleImages,
};
