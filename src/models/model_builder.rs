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

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::warn;

use crate::interning::Deduplicator;
use crate::models::base_model::{
    Agency, Pattern, Route, Stop, TransitLayer, Trip, ValidityPeriod,
};
use crate::models::{
    Accessibility, AgencyIdx, PatternIdx, RouteIdx, StopIdx, Timezone, TransitMode, TripAlteration,
    TripIdx,
};
use crate::time::PositiveDuration;
use crate::timetables::TripPatternForDate;
use crate::transfers::{TransferEdge, TransferTopology};
use crate::trip_times::{
    FlowDirection, FrequencyEntry, ScheduledStopTime, ScheduledTripTimes, TripTimes,
};

const DEFAULT_CALENDAR_ID: &str = "default_service";
const DEFAULT_ROUTE_ID: &str = "default_route";
const DEFAULT_AGENCY_ID: &str = "default_agency";

pub const DEFAULT_TIMEZONE: Timezone = chrono_tz::UTC;

/// Builder used to easily create a `TransitLayer`
/// Note: if not explicitly set all the trips
/// will be attached to a default calendar covering the whole
/// validity period
///
pub struct ModelBuilder {
    validity_period: ValidityPeriod,
    timezone: Timezone,
    stops: Vec<(String, StopSpec)>,
    stop_ids: HashMap<String, usize>,
    agencies: Vec<(String, AgencySpec)>,
    agency_ids: HashMap<String, usize>,
    routes: Vec<(String, RouteSpec)>,
    route_ids: HashMap<String, usize>,
    trips: Vec<TripSpec>,
    trip_ids: HashMap<String, usize>,
    calendars: HashMap<String, BTreeSet<NaiveDate>>,
    transfers: Vec<(String, String, TransferSpec)>,
}

/// Builder used to create and modify a new Trip
/// Note: if not explicitly set, the trip
/// will be attached to the default calendar and the default route
pub struct TripBuilder<'a> {
    model: &'a mut ModelBuilder,
    trip: usize,
}

#[derive(Debug, Clone)]
pub struct StopSpec {
    pub name: String,
    pub wheelchair_boarding: Accessibility,
}

#[derive(Debug, Clone)]
pub struct AgencySpec {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct RouteSpec {
    pub name: String,
    pub mode: TransitMode,
    pub sub_mode: Option<String>,
    pub agency_id: String,
    pub bikes_allowed: Option<bool>,
}

impl Default for RouteSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            mode: TransitMode::Bus,
            sub_mode: None,
            agency_id: DEFAULT_AGENCY_ID.to_string(),
            bikes_allowed: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StopTimeSpec {
    stop: usize,
    pub arrival: u32,
    pub departure: u32,
    pub flow: FlowDirection,
}

#[derive(Debug, Clone)]
struct FrequencySpec {
    start_time: u32,
    end_time: u32,
    headway: u32,
}

struct TripSpec {
    id: String,
    route_id: String,
    service_id: String,
    headsign: Option<String>,
    mode: Option<TransitMode>,
    sub_mode: Option<String>,
    wheelchair_accessible: Accessibility,
    bikes_allowed: Option<bool>,
    alteration: TripAlteration,
    stop_times: Vec<StopTimeSpec>,
    frequency: Option<FrequencySpec>,
}

/// The street attributes of one transfer, before compilation.
/// `wheelchair_viable` left to `None` means "derive it from the
/// wheelchair boarding flags of the two endpoint stops".
#[derive(Debug, Clone)]
pub struct TransferSpec {
    pub distance: f64,
    pub walk_viable: bool,
    pub bike_viable: bool,
    pub wheelchair_viable: Option<bool>,
    pub max_slope: f64,
    pub has_stairs: bool,
    pub has_elevator: bool,
}

impl Default for TransferSpec {
    fn default() -> Self {
        Self {
            distance: 0.0,
            walk_viable: true,
            bike_viable: true,
            wheelchair_viable: None,
            max_slope: 0.0,
            has_stairs: false,
            has_elevator: false,
        }
    }
}

impl Default for ModelBuilder {
    fn default() -> Self {
        let date = "2020-01-01";
        Self::new(date, date)
    }
}

impl ModelBuilder {
    pub fn new(start_validity_period: impl AsDate, end_validity_period: impl AsDate) -> Self {
        let start_date = start_validity_period.as_date();
        let end_date = end_validity_period.as_date();
        let model_builder = Self {
            validity_period: ValidityPeriod {
                first_date: start_date,
                last_date: end_date,
            },
            timezone: DEFAULT_TIMEZONE,
            stops: Vec::new(),
            stop_ids: HashMap::new(),
            agencies: Vec::new(),
            agency_ids: HashMap::new(),
            routes: Vec::new(),
            route_ids: HashMap::new(),
            trips: Vec::new(),
            trip_ids: HashMap::new(),
            calendars: HashMap::new(),
            transfers: Vec::new(),
        };

        assert!(start_date <= end_date);
        let dates: Vec<_> = start_date
            .iter_days()
            .take_while(|date| *date <= end_date)
            .collect();

        model_builder.default_calendar(&dates)
    }

    pub fn timezone(mut self, timezone: &Timezone) -> Self {
        self.timezone = *timezone;
        self
    }

    /// Add a new Trip to the model
    ///
    /// ```
    /// # use forseti::models::ModelBuilder;
    ///
    /// # fn main() {
    /// let layer = ModelBuilder::default()
    ///        .vj("toto", |vj_builder| {
    ///            vj_builder
    ///                .st("A", "10:00:00")
    ///                .st("B", "11:00:00");
    ///        })
    ///        .vj("tata", |vj_builder| {
    ///            vj_builder
    ///                .st("C", "08:00:00")
    ///                .st("B", "09:00:00");
    ///        })
    ///        .build();
    /// # }
    /// ```
    pub fn vj<F>(mut self, name: &str, mut vj_initer: F) -> Self
    where
        F: FnMut(TripBuilder),
    {
        assert!(
            !self.trip_ids.contains_key(name),
            "vj {} already exists",
            name
        );
        let trip = self.trips.len();
        self.trips.push(TripSpec {
            id: name.to_string(),
            route_id: DEFAULT_ROUTE_ID.to_string(),
            service_id: DEFAULT_CALENDAR_ID.to_string(),
            headsign: None,
            mode: None,
            sub_mode: None,
            wheelchair_accessible: Accessibility::NoInformation,
            bikes_allowed: None,
            alteration: TripAlteration::Planned,
            stop_times: Vec::new(),
            frequency: None,
        });
        self.trip_ids.insert(name.to_string(), trip);

        let vj_builder = TripBuilder {
            model: &mut self,
            trip,
        };

        vj_initer(vj_builder);
        self
    }

    /// Add a new Stop to the model, or modify an existing one
    ///
    /// ```
    /// # use forseti::models::{Accessibility, ModelBuilder};
    ///
    /// # fn main() {
    /// let layer = ModelBuilder::default()
    ///      .stop("A", |s| {
    ///             s.wheelchair_boarding = Accessibility::Possible;
    ///         })
    ///      .vj("toto", |vj| {
    ///          vj.st("A", "10:00:00")
    ///            .st("B", "11:00:00");
    ///      })
    ///      .build();
    /// # }
    /// ```
    pub fn stop<F>(mut self, id: &str, mut stop_initer: F) -> Self
    where
        F: FnMut(&mut StopSpec),
    {
        let idx = find_or_create_stop(&mut self.stops, &mut self.stop_ids, id);
        stop_initer(&mut self.stops[idx].1);
        self
    }

    /// Add a new Route to the model
    ///
    /// ```
    /// # use forseti::models::ModelBuilder;
    ///
    /// # fn main() {
    /// let layer = ModelBuilder::default()
    ///      .route("l1", |r| {
    ///             r.name = "ligne 1".to_owned();
    ///         })
    ///      .vj("toto", |vj| {
    ///          vj.route("l1")
    ///            .st("A", "10:00:00")
    ///            .st("B", "11:00:00");
    ///      })
    ///      .build();
    /// # }
    /// ```
    pub fn route<F>(mut self, id: &str, mut route_initer: F) -> Self
    where
        F: FnMut(&mut RouteSpec),
    {
        if !self.route_ids.contains_key(id) {
            let mut r = RouteSpec::default();
            route_initer(&mut r);
            self.route_ids.insert(id.to_string(), self.routes.len());
            self.routes.push((id.to_string(), r));
        }
        self
    }

    pub fn agency<F>(mut self, id: &str, mut agency_initer: F) -> Self
    where
        F: FnMut(&mut AgencySpec),
    {
        if !self.agency_ids.contains_key(id) {
            let mut a = AgencySpec {
                name: id.to_string(),
            };
            agency_initer(&mut a);
            self.agency_ids.insert(id.to_string(), self.agencies.len());
            self.agencies.push((id.to_string(), a));
        }
        self
    }

    /// Add a new Calendar or change an existing one
    ///
    /// Note: if the dates are in strings not in the right format, this conversion will fail
    ///
    /// ```
    /// # use forseti::models::ModelBuilder;
    ///
    /// # fn main() {
    /// let layer = ModelBuilder::new("2020-01-01", "2020-01-02")
    ///      .calendar("c1", &["2020-01-01", "2020-01-02"])
    ///      .vj("toto", |vj| {
    ///          vj.calendar("c1")
    ///            .st("A", "10:00:00")
    ///            .st("B", "11:00:00");
    ///      })
    ///      .build();
    /// # }
    /// ```
    pub fn calendar(mut self, id: &str, dates: &[impl AsDate]) -> Self {
        {
            let c = self.calendars.entry(id.to_string()).or_default();
            for d in dates {
                c.insert(d.as_date());
            }
        }
        self
    }

    /// Change the default Calendar
    /// If not explicitly set, all trips will be linked
    /// to this calendar
    ///
    /// ```
    /// # use forseti::models::ModelBuilder;
    ///
    /// # fn main() {
    /// let layer = ModelBuilder::default()
    ///      .default_calendar(&["2020-01-01"])
    ///      .vj("toto", |vj| {
    ///          vj
    ///            .st("A", "10:00:00")
    ///            .st("B", "11:00:00");
    ///      })
    ///      .build();
    /// # }
    /// ```
    pub fn default_calendar(self, dates: &[impl AsDate]) -> Self {
        self.calendar(DEFAULT_CALENDAR_ID, dates)
    }

    /// Add a street transfer between two stops, in both directions.
    pub fn transfer(self, from_stop_id: &str, to_stop_id: &str, distance: f64) -> Self {
        self.transfer_mut(from_stop_id, to_stop_id, distance, |_spec| {})
    }

    pub fn transfer_mut<F>(
        mut self,
        from_stop_id: &str,
        to_stop_id: &str,
        distance: f64,
        spec_muter: F,
    ) -> Self
    where
        F: FnOnce(&mut TransferSpec),
    {
        let mut spec = TransferSpec {
            distance,
            ..TransferSpec::default()
        };
        spec_muter(&mut spec);
        self.transfers
            .push((from_stop_id.to_string(), to_stop_id.to_string(), spec));
        self
    }

    /// Consume the builder to create a transit layer
    pub fn build(self) -> TransitLayer {
        let Self {
            validity_period,
            timezone,
            stops,
            stop_ids,
            mut agencies,
            mut agency_ids,
            routes,
            route_ids,
            trips,
            trip_ids: _,
            calendars,
            transfers,
        } = self;

        // agencies referenced by a route but never declared get created
        // with their id as name
        for (_, route_spec) in &routes {
            if !agency_ids.contains_key(&route_spec.agency_id) {
                agency_ids.insert(route_spec.agency_id.clone(), agencies.len());
                agencies.push((
                    route_spec.agency_id.clone(),
                    AgencySpec {
                        name: route_spec.agency_id.clone(),
                    },
                ));
            }
        }

        let mut deduplicator = Deduplicator::new();

        let layer_agencies: Vec<Agency> = agencies
            .into_iter()
            .map(|(id, spec)| Agency {
                id,
                name: spec.name,
            })
            .collect();

        let layer_routes: Vec<Route> = routes
            .into_iter()
            .map(|(id, spec)| {
                let name = if spec.name.is_empty() {
                    id.clone()
                } else {
                    spec.name
                };
                Route {
                    id,
                    name,
                    mode: spec.mode,
                    sub_mode: spec
                        .sub_mode
                        .as_deref()
                        .map(|s| deduplicator.intern_string(s)),
                    agency: AgencyIdx {
                        idx: agency_ids[&spec.agency_id],
                    },
                    bikes_allowed: spec.bikes_allowed,
                }
            })
            .collect();

        let mut patterns: Vec<Pattern> = Vec::new();
        let mut pattern_of_sequence: HashMap<(RouteIdx, Vec<StopIdx>), PatternIdx> =
            HashMap::new();
        let mut layer_trips: Vec<Trip> = Vec::new();
        let mut trip_id_to_idx: HashMap<String, TripIdx> = HashMap::new();
        let mut instances: BTreeMap<NaiveDate, BTreeMap<PatternIdx, InstanceSpec>> =
            BTreeMap::new();

        for trip_spec in trips {
            let stop_times: Vec<ScheduledStopTime> = trip_spec
                .stop_times
                .iter()
                .map(|st| ScheduledStopTime {
                    arrival: st.arrival,
                    departure: st.departure,
                    flow: st.flow,
                })
                .collect();

            let trip_idx = TripIdx {
                idx: layer_trips.len(),
            };
            let scheduled =
                match ScheduledTripTimes::new(trip_idx, &stop_times, &mut deduplicator) {
                    Ok(scheduled) => Arc::new(scheduled),
                    Err(err) => {
                        warn!(
                            "Trip {} has invalid stop times : {}. I ignore it.",
                            trip_spec.id, err
                        );
                        continue;
                    }
                };

            let route_idx = RouteIdx {
                idx: route_ids[&trip_spec.route_id],
            };
            let stop_sequence: Vec<StopIdx> = trip_spec
                .stop_times
                .iter()
                .map(|st| StopIdx { idx: st.stop })
                .collect();
            let pattern_idx = match pattern_of_sequence.get(&(route_idx, stop_sequence.clone())) {
                Some(pattern_idx) => *pattern_idx,
                None => {
                    let pattern_idx = PatternIdx {
                        idx: patterns.len(),
                    };
                    patterns.push(Pattern {
                        route: route_idx,
                        stops: Arc::from(stop_sequence.clone()),
                    });
                    pattern_of_sequence.insert((route_idx, stop_sequence), pattern_idx);
                    pattern_idx
                }
            };

            layer_trips.push(Trip {
                id: trip_spec.id.clone(),
                pattern: pattern_idx,
                headsign: trip_spec
                    .headsign
                    .as_deref()
                    .map(|s| deduplicator.intern_string(s)),
                mode: trip_spec.mode,
                sub_mode: trip_spec
                    .sub_mode
                    .as_deref()
                    .map(|s| deduplicator.intern_string(s)),
                wheelchair_accessible: trip_spec.wheelchair_accessible,
                bikes_allowed: trip_spec.bikes_allowed,
                alteration: trip_spec.alteration,
            });
            trip_id_to_idx.insert(trip_spec.id.clone(), trip_idx);

            let dates = match calendars.get(&trip_spec.service_id) {
                Some(dates) => dates,
                None => {
                    warn!(
                        "Trip {} uses the unknown calendar {}. I ignore it.",
                        trip_spec.id, trip_spec.service_id
                    );
                    continue;
                }
            };
            for date in dates {
                if *date < validity_period.first_date || *date > validity_period.last_date {
                    continue;
                }
                let instance = instances
                    .entry(*date)
                    .or_default()
                    .entry(pattern_idx)
                    .or_default();
                match &trip_spec.frequency {
                    Some(frequency) => instance.frequencies.push(FrequencyEntry::new(
                        Arc::clone(&scheduled),
                        frequency.start_time,
                        frequency.end_time,
                        PositiveDuration::from_seconds(frequency.headway),
                    )),
                    None => instance.trips.push(TripTimes::new(Arc::clone(&scheduled))),
                }
            }
        }

        let patterns_by_date: BTreeMap<NaiveDate, Vec<Arc<TripPatternForDate>>> = instances
            .into_iter()
            .map(|(date, by_pattern)| {
                let instances_of_date = by_pattern
                    .into_iter()
                    .map(|(pattern_idx, instance)| {
                        Arc::new(TripPatternForDate::new(
                            pattern_idx,
                            date,
                            instance.trips,
                            instance.frequencies,
                        ))
                    })
                    .collect();
                (date, instances_of_date)
            })
            .collect();

        let mut edges: Vec<TransferEdge> = Vec::new();
        for (from_id, to_id, spec) in transfers {
            let from_stop = *stop_ids
                .get(&from_id)
                .unwrap_or_else(|| panic!("transfer references the unknown stop {}", from_id));
            let to_stop = *stop_ids
                .get(&to_id)
                .unwrap_or_else(|| panic!("transfer references the unknown stop {}", to_id));
            let wheelchair_viable = spec.wheelchair_viable.unwrap_or_else(|| {
                stops[from_stop].1.wheelchair_boarding != Accessibility::NotPossible
                    && stops[to_stop].1.wheelchair_boarding != Accessibility::NotPossible
            });
            let forward = TransferEdge {
                from_stop: StopIdx { idx: from_stop },
                to_stop: StopIdx { idx: to_stop },
                distance: spec.distance,
                walk_viable: spec.walk_viable,
                bike_viable: spec.bike_viable,
                wheelchair_viable,
                max_slope: spec.max_slope,
                has_stairs: spec.has_stairs,
                has_elevator: spec.has_elevator,
            };
            let backward = TransferEdge {
                from_stop: forward.to_stop,
                to_stop: forward.from_stop,
                ..forward
            };
            edges.push(forward);
            edges.push(backward);
        }
        let transfer_topology = Arc::new(TransferTopology::new(stops.len(), edges));

        let layer_stops: Vec<Stop> = stops
            .into_iter()
            .map(|(id, spec)| Stop {
                id,
                name: spec.name,
                wheelchair_boarding: spec.wheelchair_boarding,
            })
            .collect();
        let stop_id_to_idx: HashMap<String, StopIdx> = stop_ids
            .into_iter()
            .map(|(id, idx)| (id, StopIdx { idx }))
            .collect();

        TransitLayer {
            stops: layer_stops,
            agencies: layer_agencies,
            routes: layer_routes,
            patterns,
            trips: layer_trips,
            stop_id_to_idx,
            trip_id_to_idx,
            patterns_by_date,
            validity_period,
            timezone,
            transfer_topology,
        }
    }
}

#[derive(Default)]
struct InstanceSpec {
    trips: Vec<TripTimes>,
    frequencies: Vec<FrequencyEntry>,
}

fn find_or_create_stop(
    stops: &mut Vec<(String, StopSpec)>,
    stop_ids: &mut HashMap<String, usize>,
    id: &str,
) -> usize {
    match stop_ids.get(id) {
        Some(idx) => *idx,
        None => {
            let idx = stops.len();
            stops.push((
                id.to_string(),
                StopSpec {
                    name: id.to_string(),
                    wheelchair_boarding: Accessibility::NoInformation,
                },
            ));
            stop_ids.insert(id.to_string(), idx);
            idx
        }
    }
}

pub trait IntoTime {
    fn into_time(&self) -> u32;
}

impl IntoTime for u32 {
    fn into_time(&self) -> u32 {
        *self
    }
}

impl IntoTime for PositiveDuration {
    fn into_time(&self) -> u32 {
        self.total_seconds()
    }
}

impl IntoTime for &str {
    // Note: if the string is not in the right "HH:MM:SS" format, this
    // conversion will fail. Hours above 23 are allowed, for services
    // running past midnight.
    fn into_time(&self) -> u32 {
        let mut parts = self.splitn(3, ':');
        let hours: u32 = parts
            .next()
            .and_then(|s| s.parse().ok())
            .expect("invalid time format");
        let minutes: u32 = parts
            .next()
            .and_then(|s| s.parse().ok())
            .expect("invalid time format");
        let seconds: u32 = parts
            .next()
            .and_then(|s| s.parse().ok())
            .expect("invalid time format");
        assert!(minutes < 60 && seconds < 60, "invalid time format");
        hours * 3600 + minutes * 60 + seconds
    }
}

pub trait AsDate {
    fn as_date(&self) -> NaiveDate;
}

impl AsDate for NaiveDate {
    fn as_date(&self) -> NaiveDate {
        *self
    }
}

impl AsDate for &NaiveDate {
    fn as_date(&self) -> NaiveDate {
        **self
    }
}

impl AsDate for &str {
    // Note: if the string is not in the right format, this conversion will fail
    fn as_date(&self) -> NaiveDate {
        self.parse().expect("invalid date format")
    }
}

impl<'a> TripBuilder<'a> {
    fn spec(&mut self) -> &mut TripSpec {
        &mut self.model.trips[self.trip]
    }

    /// add a StopTime to the trip
    ///
    /// Note: if the arrival/departure are given in string
    /// not in the right format, this conversion will fail
    ///
    /// ```
    /// # use forseti::models::ModelBuilder;
    ///
    /// # fn main() {
    /// let layer = ModelBuilder::default()
    ///        .vj("toto", |vj_builder| {
    ///            vj_builder
    ///                .st("A", "10:00:00")
    ///                .st("B", "11:00:00");
    ///        })
    ///        .build();
    /// # }
    /// ```
    pub fn st(self, name: &str, arrival: impl IntoTime) -> Self {
        self.st_mut(name, arrival.into_time(), arrival.into_time(), |_st| {})
    }

    pub fn st_mut<F>(
        mut self,
        name: &str,
        arrival: impl IntoTime,
        departure: impl IntoTime,
        st_muter: F,
    ) -> Self
    where
        F: FnOnce(&mut StopTimeSpec),
    {
        {
            let stop = find_or_create_stop(
                &mut self.model.stops,
                &mut self.model.stop_ids,
                name,
            );
            let mut stop_time = StopTimeSpec {
                stop,
                arrival: arrival.into_time(),
                departure: departure.into_time(),
                flow: FlowDirection::BoardAndDebark,
            };
            st_muter(&mut stop_time);

            self.spec().stop_times.push(stop_time);
        }

        self
    }

    /// Set the route of the trip
    ///
    /// ```
    /// # use forseti::models::ModelBuilder;
    ///
    /// # fn main() {
    /// let layer = ModelBuilder::default()
    ///        .route("1", |r| {
    ///            r.name = "bob".into();
    ///        })
    ///        .vj("toto", |vj_builder| {
    ///            vj_builder
    ///                .route("1")
    ///                .st("A", "10:00:00")
    ///                .st("B", "11:00:00");
    ///        })
    ///        .build();
    /// # }
    /// ```
    pub fn route(mut self, id: &str) -> Self {
        self.spec().route_id = id.to_string();
        self
    }

    /// Set the calendar (service_id) of the trip
    ///
    /// ```
    /// # use forseti::models::ModelBuilder;
    ///
    /// # fn main() {
    /// let layer = ModelBuilder::new("2021-01-01", "2021-01-31")
    ///        .calendar("c1", &["2021-01-07"])
    ///        .vj("toto", |vj_builder| {
    ///            vj_builder
    ///                .calendar("c1")
    ///                .st("A", "10:00:00")
    ///                .st("B", "11:00:00");
    ///        })
    ///        .build();
    /// # }
    /// ```
    pub fn calendar(mut self, id: &str) -> Self {
        self.spec().service_id = id.to_string();
        self
    }

    pub fn headsign(mut self, headsign: &str) -> Self {
        self.spec().headsign = Some(headsign.to_string());
        self
    }

    pub fn mode(mut self, mode: TransitMode) -> Self {
        self.spec().mode = Some(mode);
        self
    }

    pub fn sub_mode(mut self, sub_mode: &str) -> Self {
        self.spec().sub_mode = Some(sub_mode.to_string());
        self
    }

    pub fn wheelchair_accessible(mut self, accessibility: Accessibility) -> Self {
        self.spec().wheelchair_accessible = accessibility;
        self
    }

    pub fn bikes_allowed(mut self, allowed: bool) -> Self {
        self.spec().bikes_allowed = Some(allowed);
        self
    }

    pub fn alteration(mut self, alteration: TripAlteration) -> Self {
        self.spec().alteration = alteration;
        self
    }

    /// Turn the trip into a frequency service : its stop times become a
    /// template, re-departed every `headway` inside `[start, end)`.
    pub fn frequency(
        mut self,
        start: impl IntoTime,
        end: impl IntoTime,
        headway: impl IntoTime,
    ) -> Self {
        self.spec().frequency = Some(FrequencySpec {
            start_time: start.into_time(),
            end_time: end.into_time(),
            headway: headway.into_time(),
        });
        self
    }
}

impl<'a> Drop for TripBuilder<'a> {
    fn drop(&mut self) {
        // add the missing objects to the model (route, calendar, ...)
        let route_id = self.model.trips[self.trip].route_id.clone();
        if !self.model.route_ids.contains_key(&route_id) {
            self.model
                .route_ids
                .insert(route_id.clone(), self.model.routes.len());
            self.model.routes.push((route_id, RouteSpec::default()));
        }
        let service_id = self.model.trips[self.trip].service_id.clone();
        self.model.calendars.entry(service_id).or_default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trips_with_the_same_stop_sequence_share_a_pattern() {
        let layer = ModelBuilder::new("2024-05-01", "2024-05-01")
            .vj("first", |vj| {
                vj.st("A", "10:00:00").st("B", "10:30:00");
            })
            .vj("second", |vj| {
                vj.st("A", "11:00:00").st("B", "11:30:00");
            })
            .vj("other_way", |vj| {
                vj.st("B", "12:00:00").st("A", "12:30:00");
            })
            .build();

        assert_eq!(layer.nb_of_trips(), 3);
        assert_eq!(layer.nb_of_patterns(), 2);
        let first = layer.trip_idx("first").unwrap();
        let second = layer.trip_idx("second").unwrap();
        let other_way = layer.trip_idx("other_way").unwrap();
        assert_eq!(layer.trip(first).pattern, layer.trip(second).pattern);
        assert_ne!(layer.trip(first).pattern, layer.trip(other_way).pattern);
    }

    #[test]
    fn trips_are_instantiated_on_their_calendar_dates() {
        let layer = ModelBuilder::new("2024-05-01", "2024-05-07")
            .calendar("c1", &["2024-05-01", "2024-05-03"])
            .vj("toto", |vj| {
                vj.calendar("c1").st("A", "10:00:00").st("B", "11:00:00");
            })
            .build();

        let may_1st = "2024-05-01".as_date();
        let may_2nd = "2024-05-02".as_date();
        let may_3rd = "2024-05-03".as_date();
        assert_eq!(layer.patterns_for_date(&may_1st).len(), 1);
        assert_eq!(layer.patterns_for_date(&may_2nd).len(), 0);
        assert_eq!(layer.patterns_for_date(&may_3rd).len(), 1);

        let instance = &layer.patterns_for_date(&may_1st)[0];
        assert_eq!(instance.nb_of_trips(), 1);
        assert_eq!(instance.trip(0).trip(), layer.trip_idx("toto").unwrap());
    }

    #[test]
    fn a_trip_with_decreasing_times_is_dropped() {
        let layer = ModelBuilder::new("2024-05-01", "2024-05-01")
            .vj("broken", |vj| {
                vj.st("A", "10:00:00").st("B", "09:00:00");
            })
            .vj("valid", |vj| {
                vj.st("A", "10:00:00").st("B", "11:00:00");
            })
            .build();

        assert_eq!(layer.nb_of_trips(), 1);
        assert!(layer.trip_idx("broken").is_none());
        assert!(layer.trip_idx("valid").is_some());
    }

    #[test]
    fn transfers_are_materialized_in_both_directions() {
        let layer = ModelBuilder::new("2024-05-01", "2024-05-01")
            .stop("B", |s| {
                s.wheelchair_boarding = Accessibility::NotPossible;
            })
            .vj("toto", |vj| {
                vj.st("A", "10:00:00").st("B", "11:00:00");
            })
            .transfer("A", "B", 150.0)
            .build();

        let topology = layer.transfer_topology();
        assert_eq!(topology.edges().len(), 2);
        let a = layer.stop_idx("A").unwrap();
        let b = layer.stop_idx("B").unwrap();
        assert!(topology
            .edges()
            .iter()
            .any(|edge| edge.from_stop == a && edge.to_stop == b));
        assert!(topology
            .edges()
            .iter()
            .any(|edge| edge.from_stop == b && edge.to_stop == a));
        // stop B forbids wheelchairs, so both directions do
        assert!(topology.edges().iter().all(|edge| !edge.wheelchair_viable));
    }

    #[test]
    fn a_frequency_trip_contributes_entries_instead_of_trips() {
        let layer = ModelBuilder::new("2024-05-01", "2024-05-01")
            .vj("shuttle", |vj| {
                vj.st("A", "06:00:00")
                    .st("B", "06:10:00")
                    .frequency("06:00:00", "09:00:00", 600u32);
            })
            .build();

        let date = "2024-05-01".as_date();
        let instances = layer.patterns_for_date(&date);
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].nb_of_trips(), 0);
        assert_eq!(instances[0].frequencies().len(), 1);
        assert_eq!(
            instances[0].frequencies()[0].headway(),
            &PositiveDuration::from_seconds(600)
        );
    }

    #[test]
    #[should_panic(expected = "already exists")]
    fn duplicate_trip_names_are_rejected() {
        ModelBuilder::new("2024-05-01", "2024-05-01")
            .vj("toto", |vj| {
                vj.st("A", "10:00:00").st("B", "11:00:00");
            })
            .vj("toto", |vj| {
                vj.st("A", "12:00:00").st("B", "13:00:00");
            })
            .build();
    }

    #[test]
    fn sub_modes_are_interned_across_routes() {
        let layer = ModelBuilder::new("2024-05-01", "2024-05-01")
            .route("r1", |r| {
                r.sub_mode = Some("night_bus".to_string());
            })
            .route("r2", |r| {
                r.sub_mode = Some("night_bus".to_string());
            })
            .vj("toto", |vj| {
                vj.route("r1").st("A", "10:00:00").st("B", "11:00:00");
            })
            .vj("tata", |vj| {
                vj.route("r2").st("C", "10:00:00").st("D", "11:00:00");
            })
            .build();

        let first = layer.route(RouteIdx { idx: 0 }).sub_mode.as_ref().unwrap();
        let second = layer.route(RouteIdx { idx: 1 }).sub_mode.as_ref().unwrap();
        assert!(Arc::ptr_eq(first, second));
    }
}
