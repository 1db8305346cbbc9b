pub mod cost;
pub mod filters;
pub mod interning;
pub mod itinerary_filter;
pub mod models;
pub mod priority_groups;
pub mod request;
pub mod response;
pub mod time;
pub mod timetables;
pub mod transfer_cache;
pub mod transfers;
pub mod transit_data;
pub mod trip_times;

pub use chrono;
pub use chrono::NaiveDate;
pub use time::PositiveDuration;
pub use tracing;

pub use cost::{Cost, CostCalculator, CostParams};
pub use itinerary_filter::{ItineraryFilterChain, ItineraryFilterChainBuilder};
pub use models::{ModelBuilder, TransitLayer};
pub use request::RequestInput;
pub use response::{routing_errors, Itinerary, RoutingError};
pub use transit_data::{RequestTransitData, TransitData, TransitDataIters};
