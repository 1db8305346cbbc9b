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

pub mod base_model;
pub mod model_builder;

pub use base_model::{Agency, Pattern, Route, Stop, TransitLayer, Trip, ValidityPeriod};
pub use model_builder::ModelBuilder;

use serde::{Deserialize, Serialize};
use std::fmt;

pub type Timezone = chrono_tz::Tz;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StopIdx {
    pub idx: usize, // position in TransitLayer.stops
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AgencyIdx {
    pub idx: usize, // position in TransitLayer.agencies
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteIdx {
    pub idx: usize, // position in TransitLayer.routes
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PatternIdx {
    pub idx: usize, // position in TransitLayer.patterns
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TripIdx {
    pub idx: usize, // position in TransitLayer.trips
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitMode {
    Bus,
    Coach,
    Tram,
    Subway,
    Rail,
    Ferry,
    CableCar,
    Gondola,
    Funicular,
    Trolleybus,
    Taxi,
}

impl fmt::Display for TransitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransitMode::Bus => "bus",
            TransitMode::Coach => "coach",
            TransitMode::Tram => "tram",
            TransitMode::Subway => "subway",
            TransitMode::Rail => "rail",
            TransitMode::Ferry => "ferry",
            TransitMode::CableCar => "cable_car",
            TransitMode::Gondola => "gondola",
            TransitMode::Funicular => "funicular",
            TransitMode::Trolleybus => "trolleybus",
            TransitMode::Taxi => "taxi",
        };
        write!(f, "{}", name)
    }
}

/// Wheelchair accessibility of a trip or a stop, as declared by the data
/// producer. `NoInformation` is the default when the source says nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessibility {
    Possible,
    NotPossible,
    NoInformation,
}

impl Default for Accessibility {
    fn default() -> Self {
        Accessibility::NoInformation
    }
}

/// Planned (schedule-time) alteration of a trip, known before any realtime
/// feed is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripAlteration {
    Planned,
    Cancellation,
    Replaced,
}

impl TripAlteration {
    pub fn is_canceled_or_replaced(&self) -> bool {
        matches!(
            self,
            TripAlteration::Cancellation | TripAlteration::Replaced
        )
    }
}

impl Default for TripAlteration {
    fn default() -> Self {
        TripAlteration::Planned
    }
}
