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
use std::sync::Arc;

use crate::interning::Deduplicator;
use crate::models::TripIdx;
use crate::time::PositiveDuration;

/// Whether a trip can be boarded and/or debarked at a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowDirection {
    BoardAndDebark,
    BoardOnly,
    DebarkOnly,
    NoBoardDebark,
}

impl FlowDirection {
    pub fn allows_board(&self) -> bool {
        matches!(self, FlowDirection::BoardAndDebark | FlowDirection::BoardOnly)
    }

    pub fn allows_debark(&self) -> bool {
        matches!(
            self,
            FlowDirection::BoardAndDebark | FlowDirection::DebarkOnly
        )
    }
}

/// One stop of a trip as provided by the data producer : times in seconds
/// since the service date's local midnight.
#[derive(Debug, Clone, Copy)]
pub struct ScheduledStopTime {
    pub arrival: u32,
    pub departure: u32,
    pub flow: FlowDirection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TripTimesError {
    /// `departure < arrival` at this stop position.
    NegativeDwellTime { position: usize },
    /// Arrival at `position + 1` is before the departure at `position`.
    NegativeRunningTime { position: usize },
    EmptyTrip,
}

impl std::error::Error for TripTimesError {}

impl fmt::Display for TripTimesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TripTimesError::NegativeDwellTime { position } => write!(
                f,
                "departure time is before arrival time at stop position {}",
                position
            ),
            TripTimesError::NegativeRunningTime { position } => write!(
                f,
                "arrival time at stop position {} is before the departure time at stop position {}",
                position + 1,
                position
            ),
            TripTimesError::EmptyTrip => write!(f, "trip has no stop times"),
        }
    }
}

/// Checks that dwell and running times are all non negative.
///
/// Reports the first violation; it is up to the caller to drop the
/// offending trip from the schedule instead of routing through it.
pub fn times_increasing(stop_times: &[ScheduledStopTime]) -> Result<(), TripTimesError> {
    if stop_times.is_empty() {
        return Err(TripTimesError::EmptyTrip);
    }
    for (position, stop_time) in stop_times.iter().enumerate() {
        if stop_time.departure < stop_time.arrival {
            return Err(TripTimesError::NegativeDwellTime { position });
        }
        if let Some(next) = stop_times.get(position + 1) {
            if next.arrival < stop_time.departure {
                return Err(TripTimesError::NegativeRunningTime { position });
            }
        }
    }
    Ok(())
}

/// The immutable scheduled times of one trip.
///
/// Per-stop arrays are relative to a trip-local zero (the first stop's
/// arrival) and interned, so that trips with identical relative profiles
/// share one physical array and differ only by `time_shift`. Effective
/// times are `time_shift + relative value`, in seconds since the service
/// date's local midnight.
#[derive(Debug, Clone)]
pub struct ScheduledTripTimes {
    trip: TripIdx,
    arrival_times: Arc<[u32]>,
    departure_times: Arc<[u32]>,
    board_allowed: Arc<[bool]>,
    debark_allowed: Arc<[bool]>,
    time_shift: i32,
}

impl ScheduledTripTimes {
    /// Validates `stop_times`, then normalizes and interns them.
    ///
    /// Returns the validation error when dwell or running times are
    /// negative, in which case the trip must not enter the schedule.
    pub fn new(
        trip: TripIdx,
        stop_times: &[ScheduledStopTime],
        deduplicator: &mut Deduplicator,
    ) -> Result<Self, TripTimesError> {
        times_increasing(stop_times)?;

        let time_shift = stop_times[0].arrival as i32;
        // subtractions cannot underflow : times_increasing guarantees
        // every time is >= the first arrival
        let arrivals: Vec<u32> = stop_times
            .iter()
            .map(|stop_time| stop_time.arrival - stop_times[0].arrival)
            .collect();
        let departures: Vec<u32> = stop_times
            .iter()
            .map(|stop_time| stop_time.departure - stop_times[0].arrival)
            .collect();
        let boards: Vec<bool> = stop_times
            .iter()
            .map(|stop_time| stop_time.flow.allows_board())
            .collect();
        let debarks: Vec<bool> = stop_times
            .iter()
            .map(|stop_time| stop_time.flow.allows_debark())
            .collect();

        Ok(Self {
            trip,
            arrival_times: deduplicator.intern_u32_array(&arrivals),
            departure_times: deduplicator.intern_u32_array(&departures),
            board_allowed: deduplicator.intern_bool_array(&boards),
            debark_allowed: deduplicator.intern_bool_array(&debarks),
            time_shift,
        })
    }

    pub fn trip(&self) -> TripIdx {
        self.trip
    }

    pub fn nb_of_stops(&self) -> usize {
        self.arrival_times.len()
    }

    pub fn time_shift(&self) -> i32 {
        self.time_shift
    }

    /// Arrival at `position`, in seconds since the service date's local
    /// midnight.
    pub fn arrival(&self, position: usize) -> i32 {
        self.time_shift + self.arrival_times[position] as i32
    }

    pub fn departure(&self, position: usize) -> i32 {
        self.time_shift + self.departure_times[position] as i32
    }

    pub fn can_board_at(&self, position: usize) -> bool {
        self.board_allowed[position]
    }

    pub fn can_debark_at(&self, position: usize) -> bool {
        self.debark_allowed[position]
    }

    /// A copy sharing the same interned arrays, translated by `shift`
    /// seconds.
    pub fn shifted_by(&self, shift: i32, trip: TripIdx) -> Self {
        Self {
            trip,
            arrival_times: self.arrival_times.clone(),
            departure_times: self.departure_times.clone(),
            board_allowed: self.board_allowed.clone(),
            debark_allowed: self.debark_allowed.clone(),
            time_shift: self.time_shift + shift,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealTimeState {
    Scheduled,
    Updated,
    Modified,
    Canceled,
    Added,
}

impl fmt::Display for RealTimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RealTimeState::Scheduled => "scheduled",
            RealTimeState::Updated => "updated",
            RealTimeState::Modified => "modified",
            RealTimeState::Canceled => "canceled",
            RealTimeState::Added => "added",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransitionError {
    pub from: RealTimeState,
    pub to: RealTimeState,
}

impl std::error::Error for StateTransitionError {}

impl fmt::Display for StateTransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid realtime state transition from {} to {}",
            self.from, self.to
        )
    }
}

#[derive(Debug, Clone)]
struct RealTimeOverlay {
    // absolute times : the scheduled time_shift is applied on allocation
    arrival_times: Vec<i32>,
    departure_times: Vec<i32>,
    recorded: Vec<bool>,
    cancelled_stops: Vec<bool>,
    prediction_inaccurate: Vec<bool>,
}

impl RealTimeOverlay {
    fn from_scheduled(scheduled: &ScheduledTripTimes) -> Self {
        let nb_of_stops = scheduled.nb_of_stops();
        let arrival_times = (0..nb_of_stops).map(|pos| scheduled.arrival(pos)).collect();
        let departure_times = (0..nb_of_stops)
            .map(|pos| scheduled.departure(pos))
            .collect();
        Self {
            arrival_times,
            departure_times,
            recorded: vec![false; nb_of_stops],
            cancelled_stops: vec![false; nb_of_stops],
            prediction_inaccurate: vec![false; nb_of_stops],
        }
    }
}

/// One trip's times : the immutable scheduled record, plus a realtime
/// overlay allocated on the first update.
///
/// While no overlay exists, every accessor falls back to the scheduled
/// values unchanged.
#[derive(Debug, Clone)]
pub struct TripTimes {
    scheduled: Arc<ScheduledTripTimes>,
    overlay: Option<RealTimeOverlay>,
    state: RealTimeState,
}

impl TripTimes {
    pub fn new(scheduled: Arc<ScheduledTripTimes>) -> Self {
        Self {
            scheduled,
            overlay: None,
            state: RealTimeState::Scheduled,
        }
    }

    /// A trip that exists only in the realtime feed, not in the static
    /// schedule. Its state is `Added` from the start and can never
    /// become `Canceled`.
    pub fn new_added(scheduled: Arc<ScheduledTripTimes>) -> Self {
        Self {
            scheduled,
            overlay: None,
            state: RealTimeState::Added,
        }
    }

    pub fn trip(&self) -> TripIdx {
        self.scheduled.trip()
    }

    pub fn state(&self) -> RealTimeState {
        self.state
    }

    pub fn is_canceled(&self) -> bool {
        self.state == RealTimeState::Canceled
    }

    pub fn has_realtime(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn nb_of_stops(&self) -> usize {
        self.scheduled.nb_of_stops()
    }

    pub fn scheduled(&self) -> &ScheduledTripTimes {
        &self.scheduled
    }

    /// Effective arrival at `position`, in seconds since the service
    /// date's local midnight.
    pub fn arrival_time(&self, position: usize) -> i32 {
        match &self.overlay {
            Some(overlay) => overlay.arrival_times[position],
            None => self.scheduled.arrival(position),
        }
    }

    pub fn departure_time(&self, position: usize) -> i32 {
        match &self.overlay {
            Some(overlay) => overlay.departure_times[position],
            None => self.scheduled.departure(position),
        }
    }

    pub fn arrival_delay(&self, position: usize) -> i32 {
        self.arrival_time(position) - self.scheduled.arrival(position)
    }

    pub fn departure_delay(&self, position: usize) -> i32 {
        self.departure_time(position) - self.scheduled.departure(position)
    }

    pub fn is_recorded(&self, position: usize) -> bool {
        match &self.overlay {
            Some(overlay) => overlay.recorded[position],
            None => false,
        }
    }

    pub fn is_stop_cancelled(&self, position: usize) -> bool {
        match &self.overlay {
            Some(overlay) => overlay.cancelled_stops[position],
            None => false,
        }
    }

    pub fn is_prediction_inaccurate(&self, position: usize) -> bool {
        match &self.overlay {
            Some(overlay) => overlay.prediction_inaccurate[position],
            None => false,
        }
    }

    /// The trip's effective arrival time at its first stop.
    ///
    /// Trips within a pattern-for-date are sorted by this key, which the
    /// search's non-overtaking assumption relies on.
    pub fn first_stop_arrival_time(&self) -> i32 {
        self.arrival_time(0)
    }

    fn overlay_mut(&mut self) -> &mut RealTimeOverlay {
        if self.overlay.is_none() {
            self.overlay = Some(RealTimeOverlay::from_scheduled(&self.scheduled));
            if self.state == RealTimeState::Scheduled {
                self.state = RealTimeState::Updated;
            }
        }
        // unwrap here is safe because the overlay was allocated just above
        self.overlay.as_mut().unwrap()
    }

    pub fn update_arrival_time(&mut self, position: usize, time: i32) {
        debug_assert!(position < self.nb_of_stops());
        self.overlay_mut().arrival_times[position] = time;
    }

    pub fn update_departure_time(&mut self, position: usize, time: i32) {
        debug_assert!(position < self.nb_of_stops());
        self.overlay_mut().departure_times[position] = time;
    }

    /// Sets the arrival at `position` to its scheduled value plus
    /// `delay` seconds. The delay is always relative to the schedule,
    /// not to a previous update.
    pub fn update_arrival_delay(&mut self, position: usize, delay: i32) {
        let time = self.scheduled.arrival(position) + delay;
        self.update_arrival_time(position, time);
    }

    pub fn update_departure_delay(&mut self, position: usize, delay: i32) {
        let time = self.scheduled.departure(position) + delay;
        self.update_departure_time(position, time);
    }

    /// Marks the stop as actually observed (the vehicle has passed it).
    pub fn set_recorded(&mut self, position: usize) {
        debug_assert!(position < self.nb_of_stops());
        self.overlay_mut().recorded[position] = true;
    }

    pub fn set_cancelled_stop(&mut self, position: usize) {
        debug_assert!(position < self.nb_of_stops());
        self.overlay_mut().cancelled_stops[position] = true;
    }

    pub fn set_prediction_inaccurate(&mut self, position: usize) {
        debug_assert!(position < self.nb_of_stops());
        self.overlay_mut().prediction_inaccurate[position] = true;
    }

    /// Cancels the whole trip, whatever the overlay state.
    ///
    /// An `Added` trip cannot become `Canceled`.
    pub fn cancel_trip(&mut self) -> Result<(), StateTransitionError> {
        match self.state {
            RealTimeState::Added => Err(StateTransitionError {
                from: self.state,
                to: RealTimeState::Canceled,
            }),
            _ => {
                self.state = RealTimeState::Canceled;
                Ok(())
            }
        }
    }

    /// Records that the realtime overlay implies a stop pattern different
    /// from the scheduled one.
    pub fn mark_modified(&mut self) -> Result<(), StateTransitionError> {
        match self.state {
            RealTimeState::Canceled | RealTimeState::Added => Err(StateTransitionError {
                from: self.state,
                to: RealTimeState::Modified,
            }),
            _ => {
                self.state = RealTimeState::Modified;
                Ok(())
            }
        }
    }

    /// Revalidates dwell and running times over the effective values,
    /// to be called after a sequence of updates before publishing.
    pub fn times_increasing(&self) -> Result<(), TripTimesError> {
        let nb_of_stops = self.nb_of_stops();
        if nb_of_stops == 0 {
            return Err(TripTimesError::EmptyTrip);
        }
        for position in 0..nb_of_stops {
            if self.departure_time(position) < self.arrival_time(position) {
                return Err(TripTimesError::NegativeDwellTime { position });
            }
            if position + 1 < nb_of_stops
                && self.arrival_time(position + 1) < self.departure_time(position)
            {
                return Err(TripTimesError::NegativeRunningTime { position });
            }
        }
        Ok(())
    }
}

/// Headway-based service : a template trip repeated every `headway`
/// over the half-open window `[start_time, end_time)`.
#[derive(Debug, Clone)]
pub struct FrequencyEntry {
    template: Arc<ScheduledTripTimes>,
    start_time: u32,
    end_time: u32,
    headway: PositiveDuration,
}

impl FrequencyEntry {
    pub fn new(
        template: Arc<ScheduledTripTimes>,
        start_time: u32,
        end_time: u32,
        headway: PositiveDuration,
    ) -> Self {
        assert!(
            headway.total_seconds() > 0,
            "a frequency entry must have a positive headway"
        );
        Self {
            template,
            start_time,
            end_time,
            headway,
        }
    }

    pub fn start_time(&self) -> u32 {
        self.start_time
    }

    pub fn end_time(&self) -> u32 {
        self.end_time
    }

    pub fn headway(&self) -> &PositiveDuration {
        &self.headway
    }

    /// A synthetic trip whose first stop departure is `departure`
    /// seconds since the service date's local midnight.
    pub fn materialize(&self, departure: u32) -> ScheduledTripTimes {
        let shift = departure as i32 - self.template.departure(0);
        self.template.shifted_by(shift, self.template.trip())
    }

    /// All materializations with a first departure inside the window.
    pub fn materializations(&self) -> Materializations<'_> {
        Materializations {
            entry: self,
            next_departure: self.start_time,
        }
    }
}

pub struct Materializations<'entry> {
    entry: &'entry FrequencyEntry,
    next_departure: u32,
}

impl<'entry> Iterator for Materializations<'entry> {
    type Item = ScheduledTripTimes;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_departure >= self.entry.end_time {
            return None;
        }
        let materialized = self.entry.materialize(self.next_departure);
        self.next_departure += self.entry.headway.total_seconds();
        Some(materialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop_time(arrival: u32, departure: u32) -> ScheduledStopTime {
        ScheduledStopTime {
            arrival,
            departure,
            flow: FlowDirection::BoardAndDebark,
        }
    }

    fn scheduled(times: &[(u32, u32)]) -> ScheduledTripTimes {
        let stop_times: Vec<ScheduledStopTime> = times
            .iter()
            .map(|(arrival, departure)| stop_time(*arrival, *departure))
            .collect();
        let mut deduplicator = Deduplicator::new();
        ScheduledTripTimes::new(TripIdx { idx: 0 }, &stop_times, &mut deduplicator)
            .expect("valid stop times")
    }

    #[test]
    fn scheduled_times_are_normalized_and_shifted_back() {
        let trip = scheduled(&[(36000, 36060), (36600, 36660)]);
        assert_eq!(trip.time_shift(), 36000);
        assert_eq!(trip.arrival(0), 36000);
        assert_eq!(trip.departure(0), 36060);
        assert_eq!(trip.arrival(1), 36600);
        assert_eq!(trip.departure(1), 36660);
    }

    #[test]
    fn trips_with_identical_profiles_share_arrays() {
        let mut deduplicator = Deduplicator::new();
        let early = ScheduledTripTimes::new(
            TripIdx { idx: 0 },
            &[stop_time(36000, 36000), stop_time(36600, 36600)],
            &mut deduplicator,
        )
        .unwrap();
        let late = ScheduledTripTimes::new(
            TripIdx { idx: 1 },
            &[stop_time(37800, 37800), stop_time(38400, 38400)],
            &mut deduplicator,
        )
        .unwrap();
        assert!(Arc::ptr_eq(&early.arrival_times, &late.arrival_times));
        assert_eq!(early.time_shift(), 36000);
        assert_eq!(late.time_shift(), 37800);
    }

    #[test]
    fn negative_dwell_time_is_reported() {
        let stop_times = [stop_time(36000, 35900), stop_time(36600, 36660)];
        assert_eq!(
            times_increasing(&stop_times),
            Err(TripTimesError::NegativeDwellTime { position: 0 })
        );
    }

    #[test]
    fn negative_running_time_is_reported() {
        let stop_times = [
            stop_time(36000, 36060),
            stop_time(36600, 36660),
            stop_time(36500, 36700),
        ];
        assert_eq!(
            times_increasing(&stop_times),
            Err(TripTimesError::NegativeRunningTime { position: 1 })
        );
    }

    #[test]
    fn accessors_fall_back_to_scheduled_before_any_update() {
        let trip_times = TripTimes::new(Arc::new(scheduled(&[(36000, 36060), (36600, 36660)])));
        assert!(!trip_times.has_realtime());
        assert_eq!(trip_times.state(), RealTimeState::Scheduled);
        assert_eq!(trip_times.arrival_time(1), 36600);
        assert!(!trip_times.is_recorded(0));
        assert!(!trip_times.is_stop_cancelled(1));
    }

    #[test]
    fn first_update_allocates_the_overlay_and_moves_to_updated() {
        let mut trip_times = TripTimes::new(Arc::new(scheduled(&[(36000, 36060), (36600, 36660)])));
        trip_times.update_departure_delay(0, 120);
        assert!(trip_times.has_realtime());
        assert_eq!(trip_times.state(), RealTimeState::Updated);
        assert_eq!(trip_times.departure_time(0), 36180);
        // untouched stops keep their scheduled values in the overlay
        assert_eq!(trip_times.arrival_time(1), 36600);
        assert_eq!(trip_times.departure_delay(0), 120);
        assert_eq!(trip_times.arrival_delay(1), 0);
    }

    #[test]
    fn delays_stay_relative_to_the_schedule() {
        let mut trip_times = TripTimes::new(Arc::new(scheduled(&[(36000, 36060), (36600, 36660)])));
        trip_times.update_arrival_delay(1, 300);
        trip_times.update_arrival_delay(1, 60);
        assert_eq!(trip_times.arrival_time(1), 36660);
    }

    #[test]
    fn cancel_trip_is_reachable_from_any_overlay_state() {
        let mut trip_times = TripTimes::new(Arc::new(scheduled(&[(36000, 36060), (36600, 36660)])));
        trip_times.update_arrival_delay(1, 60);
        trip_times.cancel_trip().unwrap();
        assert_eq!(trip_times.state(), RealTimeState::Canceled);
        assert!(trip_times.is_canceled());
    }

    #[test]
    fn an_added_trip_cannot_be_canceled() {
        let mut trip_times =
            TripTimes::new_added(Arc::new(scheduled(&[(36000, 36060), (36600, 36660)])));
        let err = trip_times.cancel_trip().unwrap_err();
        assert_eq!(err.from, RealTimeState::Added);
        assert_eq!(err.to, RealTimeState::Canceled);
        assert_eq!(trip_times.state(), RealTimeState::Added);
    }

    #[test]
    fn an_added_trip_stays_added_when_updated() {
        let mut trip_times =
            TripTimes::new_added(Arc::new(scheduled(&[(36000, 36060), (36600, 36660)])));
        trip_times.update_departure_delay(0, 60);
        assert_eq!(trip_times.state(), RealTimeState::Added);
    }

    #[test]
    fn modified_is_reachable_from_updated_but_not_from_canceled() {
        let mut trip_times = TripTimes::new(Arc::new(scheduled(&[(36000, 36060), (36600, 36660)])));
        trip_times.update_arrival_delay(0, 30);
        trip_times.mark_modified().unwrap();
        assert_eq!(trip_times.state(), RealTimeState::Modified);

        let mut canceled = TripTimes::new(Arc::new(scheduled(&[(36000, 36060), (36600, 36660)])));
        canceled.cancel_trip().unwrap();
        assert!(canceled.mark_modified().is_err());
    }

    #[test]
    fn effective_times_are_revalidated_after_updates() {
        let mut trip_times = TripTimes::new(Arc::new(scheduled(&[(36000, 36060), (36600, 36660)])));
        assert!(trip_times.times_increasing().is_ok());
        // push the first departure after the next arrival
        trip_times.update_departure_delay(0, 700);
        assert_eq!(
            trip_times.times_increasing(),
            Err(TripTimesError::NegativeRunningTime { position: 0 })
        );
    }

    #[test]
    fn first_stop_arrival_time_uses_the_overlay_when_present() {
        let mut trip_times = TripTimes::new(Arc::new(scheduled(&[(36000, 36060), (36600, 36660)])));
        assert_eq!(trip_times.first_stop_arrival_time(), 36000);
        trip_times.update_arrival_delay(0, 240);
        assert_eq!(trip_times.first_stop_arrival_time(), 36240);
    }

    #[test]
    fn flags_are_per_stop() {
        let mut trip_times = TripTimes::new(Arc::new(scheduled(&[(36000, 36060), (36600, 36660)])));
        trip_times.set_recorded(0);
        trip_times.set_cancelled_stop(1);
        trip_times.set_prediction_inaccurate(1);
        assert!(trip_times.is_recorded(0));
        assert!(!trip_times.is_recorded(1));
        assert!(!trip_times.is_stop_cancelled(0));
        assert!(trip_times.is_stop_cancelled(1));
        assert!(trip_times.is_prediction_inaccurate(1));
    }

    #[test]
    fn frequency_entry_materializes_shifted_copies() {
        let template = Arc::new(scheduled(&[(0, 0), (600, 600)]));
        let entry = FrequencyEntry::new(
            template,
            21600,
            23400,
            PositiveDuration::from_seconds(600),
        );
        let materialized: Vec<ScheduledTripTimes> = entry.materializations().collect();
        assert_eq!(materialized.len(), 3);
        assert_eq!(materialized[0].departure(0), 21600);
        assert_eq!(materialized[1].departure(0), 22200);
        assert_eq!(materialized[2].departure(0), 22800);
        // the window end is exclusive
        assert!(materialized.iter().all(|trip| trip.departure(0) < 23400));
        // relative profile is preserved
        assert_eq!(materialized[2].arrival(1), 23400);
    }
}
