// Copyright  (C) 2020, Kisio Digital and/or its affiliates. All rights reserved.
//
// This file is part of Navitia,
// the software to build cool stuff with public transport.
//
// Hope you'll enjoy and contribute to this project,
// powered by Kisio Digital (www.kisio.com).
// Help us simplify mobility and open public transport:
// a non ending quest to the responsive locomotion way of traveling!
//
// This contribution is a part of the research and development work of the
// IVA Project which aims to enhance traveler information and is carried out
// under the leadership of the Technological Research Institute SystemX,
// with the partnership and support of the transport organization authority
// Ile-De-France Mobilités (IDFM), SNCF, and public funds
// under the scope of the French Program "Investissements d’Avenir".
//
// LICENCE: This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.
//
// Stay tuned using
// twitter @navitia
// channel `#navitia` on riot https://riot.im/app/#/room/#navitia:matrix.org
// https://groups.google.com/d/forum/navitia
// www.navitia.io

use std::fmt;

use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::cost::CostParams;
use crate::filters::{TransitFilter, TripSelectorConfig};
use crate::itinerary_filter::ItineraryFilterParams;
use crate::priority_groups::PriorityGroupSelector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchDirection {
    DepartAfter,
    ArriveBefore,
}

impl Default for SearchDirection {
    fn default() -> Self {
        SearchDirection::DepartAfter
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreetMode {
    Walk,
    Bike,
    BikeRental,
    Car,
    CarPark,
}

impl Default for StreetMode {
    fn default() -> Self {
        StreetMode::Walk
    }
}

impl fmt::Display for StreetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreetMode::Walk => "walk",
            StreetMode::Bike => "bike",
            StreetMode::BikeRental => "bike_rental",
            StreetMode::Car => "car",
            StreetMode::CarPark => "car_park",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationType {
    Quick,
    Safe,
    Flat,
}

impl Default for OptimizationType {
    fn default() -> Self {
        OptimizationType::Quick
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    StreetAndArrivalTime,
    StreetAndDepartureTime,
}

/// Which end of the sorted itinerary list is cropped when it exceeds
/// the maximum number of itineraries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropSide {
    Head,
    Tail,
}

impl Default for CropSide {
    fn default() -> Self {
        CropSide::Tail
    }
}

pub const DEFAULT_WALK_SPEED: f64 = 1.33;
pub const DEFAULT_BIKE_SPEED: f64 = 5.0;
pub const DEFAULT_WALK_RELUCTANCE: f64 = 2.0;
pub const DEFAULT_BIKE_RELUCTANCE: f64 = 2.0;
pub const DEFAULT_MAX_WHEELCHAIR_SLOPE: f64 = 0.083;
pub const DEFAULT_ELEVATOR_COST: u32 = 90;
pub const DEFAULT_STAIRS_RELUCTANCE: f64 = 2.0;

fn default_walk_speed() -> OrderedFloat<f64> {
    OrderedFloat(DEFAULT_WALK_SPEED)
}

fn default_bike_speed() -> OrderedFloat<f64> {
    OrderedFloat(DEFAULT_BIKE_SPEED)
}

fn default_walk_reluctance() -> OrderedFloat<f64> {
    OrderedFloat(DEFAULT_WALK_RELUCTANCE)
}

fn default_bike_reluctance() -> OrderedFloat<f64> {
    OrderedFloat(DEFAULT_BIKE_RELUCTANCE)
}

fn default_max_wheelchair_slope() -> OrderedFloat<f64> {
    OrderedFloat(DEFAULT_MAX_WHEELCHAIR_SLOPE)
}

fn default_elevator_cost() -> u32 {
    DEFAULT_ELEVATOR_COST
}

fn default_stairs_reluctance() -> OrderedFloat<f64> {
    OrderedFloat(DEFAULT_STAIRS_RELUCTANCE)
}

/// Exactly the request fields that change transfer durations and costs.
///
/// Two requests with equal street options must share one compiled
/// transfer index, so this struct is the structural part of the transfer
/// cache key. Floats are wrapped to make the whole struct hashable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreetOptions {
    #[serde(default)]
    pub mode: StreetMode,

    #[serde(default)]
    pub optimization: OptimizationType,

    /// walking speed in meters per second
    #[serde(default = "default_walk_speed")]
    pub walk_speed: OrderedFloat<f64>,

    /// cycling speed in meters per second
    #[serde(default = "default_bike_speed")]
    pub bike_speed: OrderedFloat<f64>,

    #[serde(default = "default_walk_reluctance")]
    pub walk_reluctance: OrderedFloat<f64>,

    #[serde(default = "default_bike_reluctance")]
    pub bike_reluctance: OrderedFloat<f64>,

    /// steepest slope a wheelchair user accepts, as a gradient
    #[serde(default = "default_max_wheelchair_slope")]
    pub max_wheelchair_slope: OrderedFloat<f64>,

    /// fixed cost of taking an elevator, in seconds
    #[serde(default = "default_elevator_cost")]
    pub elevator_cost: u32,

    #[serde(default = "default_stairs_reluctance")]
    pub stairs_reluctance: OrderedFloat<f64>,

    #[serde(default)]
    pub wheelchair: bool,
}

impl Default for StreetOptions {
    fn default() -> Self {
        Self {
            mode: StreetMode::default(),
            optimization: OptimizationType::default(),
            walk_speed: default_walk_speed(),
            bike_speed: default_bike_speed(),
            walk_reluctance: default_walk_reluctance(),
            bike_reluctance: default_bike_reluctance(),
            max_wheelchair_slope: default_max_wheelchair_slope(),
            elevator_cost: default_elevator_cost(),
            stairs_reluctance: default_stairs_reluctance(),
            wheelchair: false,
        }
    }
}

pub const DEFAULT_NB_OF_DAYS_BEFORE: u16 = 1;
pub const DEFAULT_NB_OF_DAYS_AFTER: u16 = 1;
pub const DEFAULT_MAX_NB_OF_ITINERARIES: usize = 50;

fn default_nb_of_days_before() -> u16 {
    DEFAULT_NB_OF_DAYS_BEFORE
}

fn default_nb_of_days_after() -> u16 {
    DEFAULT_NB_OF_DAYS_AFTER
}

fn default_max_nb_of_itineraries() -> usize {
    DEFAULT_MAX_NB_OF_ITINERARIES
}

/// Everything the caller decides about one trip search, parsed and
/// validated upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestInput {
    /// the instant the search is anchored on
    pub datetime: DateTime<Utc>,

    #[serde(default)]
    pub direction: SearchDirection,

    /// service days considered before the requested date
    #[serde(default = "default_nb_of_days_before")]
    pub nb_of_days_before: u16,

    /// service days considered after the requested date
    #[serde(default = "default_nb_of_days_after")]
    pub nb_of_days_after: u16,

    #[serde(default)]
    pub wheelchair_only: bool,

    /// the traveler carries a bike that must ride along
    #[serde(default)]
    pub bike_carriage: bool,

    #[serde(default)]
    pub banned_trips: Vec<String>,

    #[serde(default)]
    pub transit_filters: Vec<TransitFilter>,

    #[serde(default)]
    pub trip_selectors: Vec<TripSelectorConfig>,

    #[serde(default)]
    pub include_planned_cancellations: bool,

    #[serde(default)]
    pub include_realtime_cancellations: bool,

    /// patterns matched here keep the base priority group
    #[serde(default)]
    pub base_priority_selectors: Vec<PriorityGroupSelector>,

    /// patterns matched here get one priority group per agency
    #[serde(default)]
    pub per_agency_priority_selectors: Vec<PriorityGroupSelector>,

    /// patterns matched here share one priority group per selector
    #[serde(default)]
    pub global_priority_selectors: Vec<PriorityGroupSelector>,

    #[serde(default)]
    pub cost_params: CostParams,

    /// when absent, derived from `direction`
    #[serde(default)]
    pub sort_order: Option<SortOrder>,

    #[serde(default = "default_max_nb_of_itineraries")]
    pub max_nb_of_itineraries: usize,

    #[serde(default)]
    pub crop_side: CropSide,

    /// keep filtered itineraries, tagged instead of removed
    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub street_options: StreetOptions,

    #[serde(default)]
    pub filter_params: ItineraryFilterParams,
}

impl RequestInput {
    /// A request anchored on `datetime` with every preference at its
    /// default value.
    pub fn new(datetime: DateTime<Utc>) -> Self {
        Self {
            datetime,
            direction: SearchDirection::default(),
            nb_of_days_before: default_nb_of_days_before(),
            nb_of_days_after: default_nb_of_days_after(),
            wheelchair_only: false,
            bike_carriage: false,
            banned_trips: Vec::new(),
            transit_filters: Vec::new(),
            trip_selectors: Vec::new(),
            include_planned_cancellations: false,
            include_realtime_cancellations: false,
            base_priority_selectors: Vec::new(),
            per_agency_priority_selectors: Vec::new(),
            global_priority_selectors: Vec::new(),
            cost_params: CostParams::default(),
            sort_order: None,
            max_nb_of_itineraries: default_max_nb_of_itineraries(),
            crop_side: CropSide::default(),
            debug: false,
            street_options: StreetOptions::default(),
            filter_params: ItineraryFilterParams::default(),
        }
    }

    pub fn effective_sort_order(&self) -> SortOrder {
        self.sort_order.unwrap_or(match self.direction {
            SearchDirection::DepartAfter => SortOrder::StreetAndArrivalTime,
            SearchDirection::ArriveBefore => SortOrder::StreetAndDepartureTime,
        })
    }
}
