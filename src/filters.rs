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

use std::collections::HashSet;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{
    base_model::{TransitLayer, Trip},
    Accessibility, PatternIdx, TransitMode, TripIdx,
};
use crate::request::RequestInput;
use crate::trip_times::TripTimes;

/// One allow-selector over patterns. Present fields are combined with
/// AND; an absent field is no constraint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransitFilter {
    #[serde(default)]
    pub mode: Option<TransitMode>,

    #[serde(default)]
    pub route_id: Option<String>,

    #[serde(default)]
    pub agency_id: Option<String>,
}

impl TransitFilter {
    pub fn applies_on(&self, pattern_idx: PatternIdx, layer: &TransitLayer) -> bool {
        let route = layer.route_of_pattern(pattern_idx);
        if let Some(mode) = &self.mode {
            if route.mode != *mode {
                return false;
            }
        }
        if let Some(route_id) = &self.route_id {
            if route.id != *route_id {
                return false;
            }
        }
        if let Some(agency_id) = &self.agency_id {
            if layer.agency_of_route(route).id != *agency_id {
                return false;
            }
        }
        true
    }
}

/// The serializable form of a per-trip selector. The sub-mode pattern is
/// compiled when the request is assembled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripSelectorConfig {
    #[serde(default)]
    pub mode: Option<TransitMode>,

    #[serde(default)]
    pub agency_id: Option<String>,

    /// regular expression matched against the trip's sub-mode
    pub sub_mode_regex: String,
}

#[derive(Debug)]
pub enum FilterError {
    BadSubModeRegex {
        pattern: String,
        source: regex::Error,
    },
}

impl std::error::Error for FilterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FilterError::BadSubModeRegex { source, .. } => Some(source),
        }
    }
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::BadSubModeRegex { pattern, .. } => {
                write!(f, "bad sub-mode regular expression `{}`", pattern)
            }
        }
    }
}

/// A per-trip selector, needed because trips of one pattern may be
/// operated with different vehicles. Fields are combined with AND.
#[derive(Debug)]
pub struct TripSelector {
    mode: Option<TransitMode>,
    agency_id: Option<String>,
    sub_mode: Regex,
}

impl TripSelector {
    pub fn new(config: &TripSelectorConfig) -> Result<Self, FilterError> {
        let sub_mode =
            Regex::new(&config.sub_mode_regex).map_err(|source| FilterError::BadSubModeRegex {
                pattern: config.sub_mode_regex.clone(),
                source,
            })?;
        Ok(Self {
            mode: config.mode,
            agency_id: config.agency_id.clone(),
            sub_mode,
        })
    }

    pub fn applies_on(&self, trip: &Trip, layer: &TransitLayer) -> bool {
        if let Some(mode) = &self.mode {
            if layer.effective_mode(trip) != *mode {
                return false;
            }
        }
        if let Some(agency_id) = &self.agency_id {
            let route = layer.route_of_pattern(trip.pattern);
            if layer.agency_of_route(route).id != *agency_id {
                return false;
            }
        }
        match layer.effective_sub_mode(trip) {
            Some(sub_mode) => self.sub_mode.is_match(sub_mode),
            None => false,
        }
    }
}

/// The predicate pair of one request : a pattern-level filter and a
/// trip-level filter, both pure over immutable inputs.
pub struct RequestFilters {
    transit_filters: Vec<TransitFilter>,
    trip_selectors: Vec<TripSelector>,
    banned_trips: HashSet<TripIdx>,
    wheelchair_only: bool,
    bike_carriage: bool,
    include_planned_cancellations: bool,
    include_realtime_cancellations: bool,
}

impl RequestFilters {
    pub fn new(request: &RequestInput, layer: &TransitLayer) -> Result<Self, FilterError> {
        let trip_selectors = request
            .trip_selectors
            .iter()
            .map(TripSelector::new)
            .collect::<Result<Vec<_>, _>>()?;

        let mut banned_trips = HashSet::new();
        for trip_id in &request.banned_trips {
            match layer.trip_idx(trip_id) {
                Some(trip_idx) => {
                    banned_trips.insert(trip_idx);
                }
                None => {
                    warn!(
                        "Banned trip id {} is unknown in the transit layer. I ignore it.",
                        trip_id
                    );
                }
            }
        }

        Ok(Self {
            transit_filters: request.transit_filters.clone(),
            trip_selectors,
            banned_trips,
            wheelchair_only: request.wheelchair_only,
            bike_carriage: request.bike_carriage,
            include_planned_cancellations: request.include_planned_cancellations,
            include_realtime_cancellations: request.include_realtime_cancellations,
        })
    }

    /// A pattern is valid when at least one transit filter matches it.
    /// No configured filter means everything is valid.
    pub fn is_pattern_valid(&self, pattern_idx: PatternIdx, layer: &TransitLayer) -> bool {
        if self.transit_filters.is_empty() {
            return true;
        }
        self.transit_filters
            .iter()
            .any(|filter| filter.applies_on(pattern_idx, layer))
    }

    /// Trip-level rejections that cannot be decided on the pattern alone.
    pub fn is_trip_valid(&self, trip_times: &TripTimes, layer: &TransitLayer) -> bool {
        let trip_idx = trip_times.trip();
        let trip = layer.trip(trip_idx);

        if self.bike_carriage && !layer.effective_bikes_allowed(trip) {
            return false;
        }
        if self.wheelchair_only && trip.wheelchair_accessible != Accessibility::Possible {
            return false;
        }
        if trip.alteration.is_canceled_or_replaced() && !self.include_planned_cancellations {
            return false;
        }
        if trip_times.is_canceled() && !self.include_realtime_cancellations {
            return false;
        }
        if self.banned_trips.contains(&trip_idx) {
            return false;
        }
        // when per-trip selectors are configured, the trip must
        // additionally match at least one of them
        if !self.trip_selectors.is_empty() {
            return self
                .trip_selectors
                .iter()
                .any(|selector| selector.applies_on(trip, layer));
        }
        true
    }
}
