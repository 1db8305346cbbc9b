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

//! Request time assembly of the data consumed by the journey search.
//!
//! [`RequestTransitData`] merges, for one request, the prebuilt per date
//! pattern instances of the transit layer over the request's day window,
//! drops what the request's filters exclude, and serves the result
//! through the [`data_interface`] traits.

pub mod data_interface;

pub use data_interface::{
    NoRules, PatternData, RouteData, TimetableData, TransferConstraint, TransferRulesService,
    TransitData, TransitDataIters,
};

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::cost::CostCalculator;
use crate::filters::{FilterError, RequestFilters};
use crate::models::{PatternIdx, StopIdx, TransitLayer, TripIdx};
use crate::priority_groups::{PriorityGroupConfigurator, PriorityGroupError};
use crate::request::RequestInput;
use crate::time::{day_offset, local_midnight, DayWindow, DayWindowError, SecondsSinceTimeZero};
use crate::timetables::{TripPatternForDate, TripPatternForDates};
use crate::transfers::{TransferIndex, TransfersAtStop};

#[derive(Debug)]
pub enum TransitDataError {
    Filter(FilterError),
    DayWindow(DayWindowError),
    PriorityGroup(PriorityGroupError),
}

impl fmt::Display for TransitDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitDataError::Filter(err) => {
                write!(f, "Bad request filters : {}", err)
            }
            TransitDataError::DayWindow(err) => {
                write!(f, "Bad search window : {}", err)
            }
            TransitDataError::PriorityGroup(err) => {
                write!(f, "Bad priority group selectors : {}", err)
            }
        }
    }
}

impl Error for TransitDataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TransitDataError::Filter(err) => Some(err),
            TransitDataError::DayWindow(err) => Some(err),
            TransitDataError::PriorityGroup(err) => Some(err),
        }
    }
}

impl From<FilterError> for TransitDataError {
    fn from(err: FilterError) -> Self {
        TransitDataError::Filter(err)
    }
}

impl From<DayWindowError> for TransitDataError {
    fn from(err: DayWindowError) -> Self {
        TransitDataError::DayWindow(err)
    }
}

impl From<PriorityGroupError> for TransitDataError {
    fn from(err: PriorityGroupError) -> Self {
        TransitDataError::PriorityGroup(err)
    }
}

/// The transit data of one request : the merged patterns active on the
/// request's day window, restricted by its filters, with all times on
/// the request's time zero axis.
///
/// Assembly touches only the dates of the day window, so its cost is
/// proportional to the window, not to the whole validity period of the
/// transit layer.
pub struct RequestTransitData<'layer, Rules = NoRules> {
    transit_layer: &'layer TransitLayer,
    transfer_index: Arc<TransferIndex>,
    patterns: Vec<TripPatternForDates>,
    // positions in `patterns`, per stop
    patterns_at_stop: Vec<Vec<usize>>,
    window: DayWindow,
    time_zero: DateTime<Utc>,
    valid_start: SecondsSinceTimeZero,
    valid_end: SecondsSinceTimeZero,
    request_time: SecondsSinceTimeZero,
    cost_calculator: CostCalculator,
    transfer_rules: Rules,
}

impl<'layer> RequestTransitData<'layer, NoRules> {
    pub fn new(
        transit_layer: &'layer TransitLayer,
        transfer_index: Arc<TransferIndex>,
        request: &RequestInput,
    ) -> Result<Self, TransitDataError> {
        Self::with_transfer_rules(transit_layer, transfer_index, request, NoRules)
    }
}

impl<'layer, Rules> RequestTransitData<'layer, Rules>
where
    Rules: TransferRulesService,
{
    pub fn with_transfer_rules(
        transit_layer: &'layer TransitLayer,
        transfer_index: Arc<TransferIndex>,
        request: &RequestInput,
        transfer_rules: Rules,
    ) -> Result<Self, TransitDataError> {
        let filters = RequestFilters::new(request, transit_layer)?;

        let timezone = transit_layer.timezone();
        let reference_date = request.datetime.with_timezone(timezone).date_naive();
        let validity = transit_layer.validity_period();
        let window =
            DayWindow::new(reference_date, request.nb_of_days_before, request.nb_of_days_after)
                .restrict_to(validity.first_date, validity.last_date)?;

        let time_zero = local_midnight(timezone, window.first_date()).with_timezone(&Utc);

        let mut priority_groups = PriorityGroupConfigurator::new(
            &request.base_priority_selectors,
            &request.per_agency_priority_selectors,
            &request.global_priority_selectors,
        )?;

        let mut buckets_of_pattern: BTreeMap<
            PatternIdx,
            Vec<(Arc<TripPatternForDate>, SecondsSinceTimeZero)>,
        > = BTreeMap::new();
        let mut nb_of_rejected_instances = 0usize;
        let mut nb_of_dropped_trips = 0usize;

        for date in window.dates() {
            // unwrap is safe here : every date of the window is at most
            // MAX_DAYS_IN_SEARCH_WINDOW days away from time_zero, so its
            // offset fits in an i32
            let offset = day_offset(&time_zero, timezone, date).unwrap();
            for instance in transit_layer.patterns_for_date(&date) {
                let pattern_idx = instance.pattern();
                if !filters.is_pattern_valid(pattern_idx, transit_layer) {
                    nb_of_rejected_instances += 1;
                    continue;
                }
                let nb_of_trips_before = instance.nb_of_trips();
                let kept = instance
                    .filtered(|trip_times| filters.is_trip_valid(trip_times, transit_layer));
                match kept {
                    Some(kept) => {
                        nb_of_dropped_trips += nb_of_trips_before - kept.nb_of_trips();
                        let bucket = if kept.nb_of_trips() == nb_of_trips_before {
                            // nothing was dropped, share the prebuilt instance
                            Arc::clone(instance)
                        } else {
                            Arc::new(kept)
                        };
                        buckets_of_pattern
                            .entry(pattern_idx)
                            .or_insert_with(Vec::new)
                            .push((bucket, offset));
                    }
                    None => {
                        nb_of_dropped_trips += nb_of_trips_before;
                        nb_of_rejected_instances += 1;
                    }
                }
            }
        }

        let mut patterns = Vec::with_capacity(buckets_of_pattern.len());
        let mut patterns_at_stop = vec![Vec::new(); transit_layer.nb_of_stops()];
        for (pattern_idx, day_buckets) in buckets_of_pattern {
            let priority_group_mask =
                priority_groups.group_of_pattern(pattern_idx, transit_layer)?;
            let pattern = transit_layer.pattern(pattern_idx);
            let route = transit_layer.route(pattern.route);
            let merged = TripPatternForDates::new(
                pattern_idx,
                pattern.route,
                route.mode,
                Arc::clone(&pattern.stops),
                day_buckets,
                priority_group_mask,
            );
            let position = patterns.len();
            for stop in merged.stops() {
                let at_stop = &mut patterns_at_stop[stop.idx];
                // a loop pattern can serve the same stop twice
                if !at_stop.contains(&position) {
                    at_stop.push(position);
                }
            }
            patterns.push(merged);
        }

        // unwraps are safe here : the window spans at most
        // MAX_DAYS_IN_SEARCH_WINDOW days, so the boundary offsets fit in
        // an i32, and its last date is nowhere near the calendar's end
        let valid_start = day_offset(&time_zero, timezone, window.first_date()).unwrap();
        let day_after_window = window.last_date().succ_opt().unwrap();
        let valid_end = day_offset(&time_zero, timezone, day_after_window).unwrap();

        // the requested datetime is at most MAX_DAYS_IN_SEARCH_WINDOW
        // days away from time_zero, so the difference fits in an i32
        let request_time = SecondsSinceTimeZero::from_seconds(
            request.datetime.signed_duration_since(time_zero).num_seconds() as i32,
        );

        debug!(
            "Assembled request transit data : {} patterns over {} days, \
             {} pattern instances rejected, {} trips dropped",
            patterns.len(),
            window.nb_of_days(),
            nb_of_rejected_instances,
            nb_of_dropped_trips
        );

        Ok(Self {
            transit_layer,
            transfer_index,
            patterns,
            patterns_at_stop,
            window,
            time_zero,
            valid_start,
            valid_end,
            request_time,
            cost_calculator: CostCalculator::new(request.cost_params.clone()),
            transfer_rules,
        })
    }
}

impl<'layer, Rules> RequestTransitData<'layer, Rules> {
    pub fn transit_layer(&self) -> &'layer TransitLayer {
        self.transit_layer
    }

    pub fn transfer_index(&self) -> &Arc<TransferIndex> {
        &self.transfer_index
    }

    pub fn nb_of_patterns(&self) -> usize {
        self.patterns.len()
    }

    pub fn patterns(&self) -> &[TripPatternForDates] {
        &self.patterns
    }

    pub fn pattern_at(&self, position: usize) -> &TripPatternForDates {
        &self.patterns[position]
    }

    pub fn day_window(&self) -> &DayWindow {
        &self.window
    }

    /// The UTC instant all `SecondsSinceTimeZero` of this request count
    /// from.
    pub fn time_zero(&self) -> &DateTime<Utc> {
        &self.time_zero
    }

    /// The requested datetime, on the time zero axis.
    pub fn request_time(&self) -> SecondsSinceTimeZero {
        self.request_time
    }

    pub fn to_datetime(&self, time: &SecondsSinceTimeZero) -> DateTime<Utc> {
        self.time_zero + Duration::seconds(i64::from(time.seconds()))
    }
}

impl<'layer, Rules> TransitData for RequestTransitData<'layer, Rules>
where
    Rules: TransferRulesService,
{
    fn nb_of_stops(&self) -> usize {
        self.transit_layer.nb_of_stops()
    }

    fn stop_name(&self, stop: StopIdx) -> &str {
        self.transit_layer.stop_name(stop)
    }

    fn valid_window(&self) -> (SecondsSinceTimeZero, SecondsSinceTimeZero) {
        (self.valid_start, self.valid_end)
    }

    fn cost_calculator(&self) -> &CostCalculator {
        &self.cost_calculator
    }

    fn constrained_transfer(
        &self,
        from_trip: TripIdx,
        to_trip: TripIdx,
        stop: StopIdx,
    ) -> Option<TransferConstraint> {
        self.transfer_rules.constraint(from_trip, to_trip, stop)
    }
}

impl<'a, 'layer: 'a, Rules> TransitDataIters<'a> for RequestTransitData<'layer, Rules> {
    type TransfersAtStop = TransfersAtStop<'a>;

    fn transfers_from(&'a self, from_stop: StopIdx) -> Self::TransfersAtStop {
        self.transfer_index.outgoing_transfers_at(from_stop)
    }

    fn transfers_to(&'a self, to_stop: StopIdx) -> Self::TransfersAtStop {
        self.transfer_index.incoming_transfers_at(to_stop)
    }

    type PatternsTouching = PatternsTouching<'a>;

    fn patterns_touching(&'a self, stops: &[StopIdx]) -> Self::PatternsTouching {
        let mut visited = vec![false; self.patterns.len()];
        let mut order = Vec::new();
        for stop in stops {
            for position in &self.patterns_at_stop[stop.idx] {
                if !visited[*position] {
                    visited[*position] = true;
                    order.push(*position);
                }
            }
        }
        PatternsTouching {
            patterns: &self.patterns,
            order: order.into_iter(),
        }
    }
}

/// Iterator over the merged patterns touching a set of stops. Each
/// pattern appears once, in assembly order of the first queried stop
/// that touches it.
pub struct PatternsTouching<'data> {
    patterns: &'data [TripPatternForDates],
    order: std::vec::IntoIter<usize>,
}

impl<'data> Iterator for PatternsTouching<'data> {
    type Item = &'data TripPatternForDates;

    fn next(&mut self) -> Option<Self::Item> {
        self.order.next().map(|position| &self.patterns[position])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl<'data> ExactSizeIterator for PatternsTouching<'data> {}
