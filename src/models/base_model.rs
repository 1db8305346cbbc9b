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

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;

use crate::models::{
    Accessibility, AgencyIdx, PatternIdx, RouteIdx, StopIdx, Timezone, TransitMode, TripAlteration,
    TripIdx,
};
use crate::timetables::TripPatternForDate;
use crate::transfers::TransferTopology;

#[derive(Debug, Clone)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub wheelchair_boarding: Accessibility,
}

#[derive(Debug, Clone)]
pub struct Agency {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Route {
    pub id: String,
    pub name: String,
    pub mode: TransitMode,
    pub sub_mode: Option<Arc<str>>,
    pub agency: AgencyIdx,
    pub bikes_allowed: Option<bool>,
}

/// The ordered stop sequence shared by all trips of the pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub route: RouteIdx,
    pub stops: Arc<[StopIdx]>,
}

#[derive(Debug, Clone)]
pub struct Trip {
    pub id: String,
    pub pattern: PatternIdx,
    pub headsign: Option<Arc<str>>,
    // mode/sub-mode override the route's values when present, since
    // trips of one route may be operated with different vehicles
    pub mode: Option<TransitMode>,
    pub sub_mode: Option<Arc<str>>,
    pub wheelchair_accessible: Accessibility,
    pub bikes_allowed: Option<bool>,
    pub alteration: TripAlteration,
}

#[derive(Debug, Clone)]
pub struct ValidityPeriod {
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
}

/// The static transit layer : stops, routes, patterns, trips with their
/// per-date prebuilt instances, and the default street transfer topology.
///
/// Built once by an external producer (tests use
/// [`ModelBuilder`](super::ModelBuilder)) and then shared read-only
/// between requests.
pub struct TransitLayer {
    pub(super) stops: Vec<Stop>,
    pub(super) agencies: Vec<Agency>,
    pub(super) routes: Vec<Route>,
    pub(super) patterns: Vec<Pattern>,
    pub(super) trips: Vec<Trip>,
    pub(super) stop_id_to_idx: HashMap<String, StopIdx>,
    pub(super) trip_id_to_idx: HashMap<String, TripIdx>,
    pub(super) patterns_by_date: BTreeMap<NaiveDate, Vec<Arc<TripPatternForDate>>>,
    pub(super) validity_period: ValidityPeriod,
    pub(super) timezone: Timezone,
    pub(super) transfer_topology: Arc<TransferTopology>,
}

impl TransitLayer {
    pub fn nb_of_stops(&self) -> usize {
        self.stops.len()
    }

    pub fn stop(&self, stop_idx: StopIdx) -> &Stop {
        &self.stops[stop_idx.idx]
    }

    pub fn stop_name(&self, stop_idx: StopIdx) -> &str {
        &self.stops[stop_idx.idx].name
    }

    pub fn stop_idx(&self, id: &str) -> Option<StopIdx> {
        self.stop_id_to_idx.get(id).copied()
    }

    pub fn agency(&self, agency_idx: AgencyIdx) -> &Agency {
        &self.agencies[agency_idx.idx]
    }

    pub fn route(&self, route_idx: RouteIdx) -> &Route {
        &self.routes[route_idx.idx]
    }

    pub fn pattern(&self, pattern_idx: PatternIdx) -> &Pattern {
        &self.patterns[pattern_idx.idx]
    }

    pub fn nb_of_patterns(&self) -> usize {
        self.patterns.len()
    }

    pub fn nb_of_trips(&self) -> usize {
        self.trips.len()
    }

    pub fn trip(&self, trip_idx: TripIdx) -> &Trip {
        &self.trips[trip_idx.idx]
    }

    pub fn trip_idx(&self, id: &str) -> Option<TripIdx> {
        self.trip_id_to_idx.get(id).copied()
    }

    pub fn route_of_pattern(&self, pattern_idx: PatternIdx) -> &Route {
        self.route(self.patterns[pattern_idx.idx].route)
    }

    pub fn agency_of_route(&self, route: &Route) -> &Agency {
        self.agency(route.agency)
    }

    /// The trip's mode, falling back to its route's mode.
    pub fn effective_mode(&self, trip: &Trip) -> TransitMode {
        trip.mode
            .unwrap_or_else(|| self.route_of_pattern(trip.pattern).mode)
    }

    /// The trip's sub-mode, falling back to its route's sub-mode.
    pub fn effective_sub_mode<'a>(&'a self, trip: &'a Trip) -> Option<&'a str> {
        trip.sub_mode
            .as_deref()
            .or_else(|| self.route_of_pattern(trip.pattern).sub_mode.as_deref())
    }

    /// Whether bikes can be carried on the trip, falling back to the
    /// route flag, and to "no" when neither says anything.
    pub fn effective_bikes_allowed(&self, trip: &Trip) -> bool {
        trip.bikes_allowed
            .or_else(|| self.route_of_pattern(trip.pattern).bikes_allowed)
            .unwrap_or(false)
    }

    /// The prebuilt pattern instances active on `date`, empty when the
    /// date has no service or lies outside the validity period.
    pub fn patterns_for_date(&self, date: &NaiveDate) -> &[Arc<TripPatternForDate>] {
        self.patterns_by_date
            .get(date)
            .map(|patterns| patterns.as_slice())
            .unwrap_or(&[])
    }

    pub fn validity_period(&self) -> &ValidityPeriod {
        &self.validity_period
    }

    pub fn timezone(&self) -> &Timezone {
        &self.timezone
    }

    pub fn transfer_topology(&self) -> &Arc<TransferTopology> {
        &self.transfer_topology
    }
}
