// Domain layer - Pure types shared by every other layer
pub mod bucket;
pub mod calendar;
pub mod error;
pub mod forecast;
pub mod page;
pub mod reading;
