mod client;
mod request;

pub use client::{FileHistoryClient, HttpHistoryClient, PriceHistoryClient};
pub use request::{FrequencyType, PeriodType, PriceHistoryRequest};
