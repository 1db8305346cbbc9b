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

use std::sync::Arc;

use chrono::NaiveDate;

use crate::models::{PatternIdx, RouteIdx, StopIdx, TransitMode};
use crate::time::SecondsSinceTimeZero;
use crate::trip_times::{FrequencyEntry, TripTimes};

use super::TripPatternForDate;

#[derive(Debug, Clone)]
struct DayBucket {
    pattern_for_date: Arc<TripPatternForDate>,
    offset: SecondsSinceTimeZero,
}

/// One pattern's merged view across the request's day window.
///
/// Each day bucket carries the seconds from the search's time zero to
/// its date's local midnight, so that trip times can be compared across
/// dates on one axis. Trips are addressed by a flat index running over
/// the buckets in day order.
#[derive(Debug, Clone)]
pub struct TripPatternForDates {
    pattern: PatternIdx,
    route: RouteIdx,
    mode: TransitMode,
    stops: Arc<[StopIdx]>,
    buckets: Vec<DayBucket>,
    nb_of_trips: usize,
    board_allowed: Vec<bool>,
    debark_allowed: Vec<bool>,
    priority_group_mask: u32,
}

impl TripPatternForDates {
    /// Merges the ascending-by-date instances of one pattern.
    ///
    /// Panics when `buckets` is empty or when dates/offsets are not
    /// strictly increasing : a pattern absent on every requested date
    /// must not be constructed at all, and out-of-order buckets would
    /// break the flat trip index.
    pub fn new(
        pattern: PatternIdx,
        route: RouteIdx,
        mode: TransitMode,
        stops: Arc<[StopIdx]>,
        buckets: Vec<(Arc<TripPatternForDate>, SecondsSinceTimeZero)>,
        priority_group_mask: u32,
    ) -> Self {
        assert!(
            !buckets.is_empty(),
            "cannot merge a pattern with no active date"
        );
        for (pattern_for_date, _) in &buckets {
            assert!(
                pattern_for_date.pattern() == pattern,
                "cannot merge instances of pattern {:?} into pattern {:?}",
                pattern_for_date.pattern(),
                pattern
            );
        }
        for pair in buckets.windows(2) {
            assert!(
                pair[0].0.date() < pair[1].0.date(),
                "day buckets must be sorted by ascending date, got {} before {}",
                pair[0].0.date(),
                pair[1].0.date()
            );
            assert!(
                pair[0].1 < pair[1].1,
                "day offsets must be strictly increasing, got {} before {}",
                pair[0].1,
                pair[1].1
            );
        }

        let nb_of_positions = stops.len();
        let mut board_allowed = vec![false; nb_of_positions];
        let mut debark_allowed = vec![false; nb_of_positions];
        for (pattern_for_date, _) in &buckets {
            for trip_times in pattern_for_date.trips() {
                for position in 0..nb_of_positions {
                    board_allowed[position] |= trip_times.scheduled().can_board_at(position);
                    debark_allowed[position] |= trip_times.scheduled().can_debark_at(position);
                }
            }
        }

        let nb_of_trips = buckets
            .iter()
            .map(|(pattern_for_date, _)| pattern_for_date.nb_of_trips())
            .sum();

        let buckets = buckets
            .into_iter()
            .map(|(pattern_for_date, offset)| DayBucket {
                pattern_for_date,
                offset,
            })
            .collect();

        Self {
            pattern,
            route,
            mode,
            stops,
            buckets,
            nb_of_trips,
            board_allowed,
            debark_allowed,
            priority_group_mask,
        }
    }

    pub fn pattern(&self) -> PatternIdx {
        self.pattern
    }

    pub fn route(&self) -> RouteIdx {
        self.route
    }

    pub fn mode(&self) -> TransitMode {
        self.mode
    }

    pub fn priority_group_mask(&self) -> u32 {
        self.priority_group_mask
    }

    pub fn nb_of_days(&self) -> usize {
        self.buckets.len()
    }

    pub fn date_at_day(&self, day: usize) -> &NaiveDate {
        self.buckets[day].pattern_for_date.date()
    }

    pub fn offset_at_day(&self, day: usize) -> SecondsSinceTimeZero {
        self.buckets[day].offset
    }

    pub fn nb_of_trips(&self) -> usize {
        self.nb_of_trips
    }

    pub fn stops(&self) -> &[StopIdx] {
        &self.stops
    }

    pub fn nb_of_positions(&self) -> usize {
        self.stops.len()
    }

    pub fn stop_at(&self, position: usize) -> StopIdx {
        self.stops[position]
    }

    /// Whether at least one trip of the merged view can be boarded at
    /// this stop position.
    pub fn can_board_at(&self, position: usize) -> bool {
        self.board_allowed[position]
    }

    pub fn can_debark_at(&self, position: usize) -> bool {
        self.debark_allowed[position]
    }

    // The owning bucket is found by subtracting bucket sizes in day
    // order. A linear scan, since the day window is a handful of days.
    fn resolve(&self, flat_trip: usize) -> (usize, usize) {
        let mut remaining = flat_trip;
        for (day, bucket) in self.buckets.iter().enumerate() {
            let nb_of_trips = bucket.pattern_for_date.nb_of_trips();
            if remaining < nb_of_trips {
                return (day, remaining);
            }
            remaining -= nb_of_trips;
        }
        panic!(
            "flat trip index {} is out of bounds, this pattern has {} trips",
            flat_trip, self.nb_of_trips
        );
    }

    pub fn trip_times(&self, flat_trip: usize) -> &TripTimes {
        let (day, local_trip) = self.resolve(flat_trip);
        self.buckets[day].pattern_for_date.trip(local_trip)
    }

    pub fn date_of_trip(&self, flat_trip: usize) -> &NaiveDate {
        let (day, _) = self.resolve(flat_trip);
        self.buckets[day].pattern_for_date.date()
    }

    /// Effective arrival of `flat_trip` at `position`, on the time-zero
    /// axis.
    pub fn arrival_time(&self, flat_trip: usize, position: usize) -> SecondsSinceTimeZero {
        let (day, local_trip) = self.resolve(flat_trip);
        let bucket = &self.buckets[day];
        let in_day = bucket.pattern_for_date.trip(local_trip).arrival_time(position);
        SecondsSinceTimeZero::from_seconds(bucket.offset.seconds() + in_day)
    }

    pub fn departure_time(&self, flat_trip: usize, position: usize) -> SecondsSinceTimeZero {
        let (day, local_trip) = self.resolve(flat_trip);
        let bucket = &self.buckets[day];
        let in_day = bucket
            .pattern_for_date
            .trip(local_trip)
            .departure_time(position);
        SecondsSinceTimeZero::from_seconds(bucket.offset.seconds() + in_day)
    }

    /// The frequency entries of every bucket, each paired with its day
    /// offset. Frequency trips are materialized by the search on demand
    /// and do not count in `nb_of_trips`.
    pub fn frequencies(&self) -> FrequenciesOfPattern<'_> {
        FrequenciesOfPattern {
            buckets: self.buckets.iter(),
            current: None,
        }
    }
}

pub struct FrequenciesOfPattern<'pattern> {
    buckets: std::slice::Iter<'pattern, DayBucket>,
    current: Option<(
        SecondsSinceTimeZero,
        std::slice::Iter<'pattern, FrequencyEntry>,
    )>,
}

impl<'pattern> Iterator for FrequenciesOfPattern<'pattern> {
    type Item = (SecondsSinceTimeZero, &'pattern FrequencyEntry);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((offset, entries)) = &mut self.current {
                if let Some(entry) = entries.next() {
                    return Some((*offset, entry));
                }
            }
            match self.buckets.next() {
                Some(bucket) => {
                    self.current = Some((
                        bucket.offset,
                        bucket.pattern_for_date.frequencies().iter(),
                    ));
                }
                None => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interning::Deduplicator;
    use crate::models::TripIdx;
    use crate::trip_times::{FlowDirection, ScheduledStopTime, ScheduledTripTimes};

    fn trip_times(trip: usize, first_arrival: u32, flow: FlowDirection) -> TripTimes {
        let stop_times = [
            ScheduledStopTime {
                arrival: first_arrival,
                departure: first_arrival,
                flow,
            },
            ScheduledStopTime {
                arrival: first_arrival + 600,
                departure: first_arrival + 600,
                flow: FlowDirection::BoardAndDebark,
            },
        ];
        let mut deduplicator = Deduplicator::new();
        let scheduled =
            ScheduledTripTimes::new(TripIdx { idx: trip }, &stop_times, &mut deduplicator)
                .unwrap();
        TripTimes::new(Arc::new(scheduled))
    }

    fn stops() -> Arc<[StopIdx]> {
        Arc::from(vec![StopIdx { idx: 0 }, StopIdx { idx: 1 }])
    }

    fn bucket(
        date: (i32, u32, u32),
        first_arrivals: &[u32],
        first_trip_idx: usize,
    ) -> Arc<TripPatternForDate> {
        let trips = first_arrivals
            .iter()
            .enumerate()
            .map(|(pos, arrival)| {
                trip_times(first_trip_idx + pos, *arrival, FlowDirection::BoardAndDebark)
            })
            .collect();
        Arc::new(TripPatternForDate::new(
            PatternIdx { idx: 0 },
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            trips,
            Vec::new(),
        ))
    }

    #[test]
    fn flat_index_runs_over_buckets_in_day_order() {
        let merged = TripPatternForDates::new(
            PatternIdx { idx: 0 },
            RouteIdx { idx: 0 },
            TransitMode::Bus,
            stops(),
            vec![
                (
                    bucket((2024, 5, 1), &[36000, 37800], 0),
                    SecondsSinceTimeZero::from_seconds(0),
                ),
                (
                    bucket((2024, 5, 3), &[36000, 37800, 39600], 2),
                    SecondsSinceTimeZero::from_seconds(172_800),
                ),
            ],
            0,
        );
        assert_eq!(merged.nb_of_days(), 2);
        assert_eq!(merged.nb_of_trips(), 5);
        assert_eq!(merged.trip_times(1).trip(), TripIdx { idx: 1 });
        // flat index 3 is the second trip of the second day
        assert_eq!(merged.trip_times(3).trip(), TripIdx { idx: 3 });
        assert_eq!(
            merged.date_of_trip(3),
            &NaiveDate::from_ymd_opt(2024, 5, 3).unwrap()
        );
    }

    #[test]
    fn times_carry_the_day_offset() {
        let merged = TripPatternForDates::new(
            PatternIdx { idx: 0 },
            RouteIdx { idx: 0 },
            TransitMode::Bus,
            stops(),
            vec![
                (
                    bucket((2024, 5, 1), &[36000], 0),
                    SecondsSinceTimeZero::from_seconds(0),
                ),
                (
                    bucket((2024, 5, 3), &[36000], 1),
                    SecondsSinceTimeZero::from_seconds(172_800),
                ),
            ],
            0,
        );
        assert_eq!(
            merged.arrival_time(0, 0),
            SecondsSinceTimeZero::from_seconds(36000)
        );
        assert_eq!(
            merged.arrival_time(1, 0),
            SecondsSinceTimeZero::from_seconds(172_800 + 36000)
        );
        assert_eq!(
            merged.departure_time(1, 1),
            SecondsSinceTimeZero::from_seconds(172_800 + 36600)
        );
    }

    #[test]
    fn a_single_bucket_is_a_valid_merge() {
        let merged = TripPatternForDates::new(
            PatternIdx { idx: 0 },
            RouteIdx { idx: 0 },
            TransitMode::Bus,
            stops(),
            vec![(
                bucket((2024, 5, 1), &[36000], 0),
                SecondsSinceTimeZero::from_seconds(0),
            )],
            0,
        );
        assert_eq!(merged.nb_of_days(), 1);
        assert_eq!(merged.nb_of_trips(), 1);
    }

    #[test]
    #[should_panic(expected = "strictly increasing")]
    fn non_increasing_offsets_are_rejected() {
        TripPatternForDates::new(
            PatternIdx { idx: 0 },
            RouteIdx { idx: 0 },
            TransitMode::Bus,
            stops(),
            vec![
                (
                    bucket((2024, 5, 1), &[36000], 0),
                    SecondsSinceTimeZero::from_seconds(86400),
                ),
                (
                    bucket((2024, 5, 2), &[36000], 1),
                    SecondsSinceTimeZero::from_seconds(86400),
                ),
            ],
            0,
        );
    }

    #[test]
    fn boarding_rules_are_merged_over_trips() {
        let board_only = trip_times(0, 36000, FlowDirection::BoardOnly);
        let no_board = trip_times(1, 37800, FlowDirection::DebarkOnly);
        let pattern_for_date = Arc::new(TripPatternForDate::new(
            PatternIdx { idx: 0 },
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            vec![board_only, no_board],
            Vec::new(),
        ));
        let merged = TripPatternForDates::new(
            PatternIdx { idx: 0 },
            RouteIdx { idx: 0 },
            TransitMode::Bus,
            stops(),
            vec![(pattern_for_date, SecondsSinceTimeZero::from_seconds(0))],
            0,
        );
        // one trip boards, the other debarks : the pattern does both
        assert!(merged.can_board_at(0));
        assert!(merged.can_debark_at(0));
    }
}
