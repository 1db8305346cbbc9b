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

use chrono::NaiveDate;

use crate::models::PatternIdx;
use crate::trip_times::{FrequencyEntry, TripTimes};

/// The trips of one pattern active on one service date.
///
/// Built once per date when the schedule is (re)built, then shared
/// read-only by every request whose day window covers the date. Trips
/// are sorted by their effective first stop arrival time, which the
/// search's non-overtaking assumption relies on.
#[derive(Debug, Clone)]
pub struct TripPatternForDate {
    pattern: PatternIdx,
    date: NaiveDate,
    trips: Vec<TripTimes>,
    frequencies: Vec<FrequencyEntry>,
}

impl TripPatternForDate {
    pub fn new(
        pattern: PatternIdx,
        date: NaiveDate,
        mut trips: Vec<TripTimes>,
        frequencies: Vec<FrequencyEntry>,
    ) -> Self {
        trips.sort_by_key(TripTimes::first_stop_arrival_time);
        Self {
            pattern,
            date,
            trips,
            frequencies,
        }
    }

    pub fn pattern(&self) -> PatternIdx {
        self.pattern
    }

    pub fn date(&self) -> &NaiveDate {
        &self.date
    }

    pub fn nb_of_trips(&self) -> usize {
        self.trips.len()
    }

    pub fn trip(&self, trip: usize) -> &TripTimes {
        &self.trips[trip]
    }

    pub fn trips(&self) -> &[TripTimes] {
        &self.trips
    }

    pub fn frequencies(&self) -> &[FrequencyEntry] {
        &self.frequencies
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty() && self.frequencies.is_empty()
    }

    /// A copy keeping only the trips accepted by `is_valid`, or `None`
    /// when nothing remains.
    pub fn filtered<F>(&self, is_valid: F) -> Option<Self>
    where
        F: Fn(&TripTimes) -> bool,
    {
        let trips: Vec<TripTimes> = self
            .trips
            .iter()
            .filter(|trip_times| is_valid(trip_times))
            .cloned()
            .collect();
        if trips.is_empty() && self.frequencies.is_empty() {
            return None;
        }
        Some(Self {
            pattern: self.pattern,
            date: self.date,
            trips,
            frequencies: self.frequencies.clone(),
        })
    }
}
