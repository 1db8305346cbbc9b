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

use crate::cost::CostCalculator;
use crate::models::{RouteIdx, StopIdx, TransitMode, TripIdx};
use crate::time::{PositiveDuration, SecondsSinceTimeZero};
use crate::timetables::TripPatternForDates;
use crate::transfers::Transfer;

/// Route-shaped view of a merged pattern, used by the search to rank
/// and group the routes it explores.
pub trait RouteData {
    fn route(&self) -> RouteIdx;

    fn mode(&self) -> TransitMode;

    /// The priority group of this pattern, as a bit mask.
    fn priority_group_mask(&self) -> u32;
}

/// Timetable-shaped view of a merged pattern : its trips, addressed by
/// a flat index running over the day buckets in day order.
pub trait TimetableData {
    fn nb_of_trips(&self) -> usize;

    /// Panics if `trip` or `position` is out of bounds.
    fn arrival_time(&self, trip: usize, position: usize) -> SecondsSinceTimeZero;

    /// Panics if `trip` or `position` is out of bounds.
    fn departure_time(&self, trip: usize, position: usize) -> SecondsSinceTimeZero;
}

/// Pattern-shaped view of a merged pattern : its ordered stop sequence.
pub trait PatternData {
    fn nb_of_positions(&self) -> usize;

    /// Panics if `position` is not on the pattern.
    fn stop_at(&self, position: usize) -> StopIdx;

    /// Returns `true` if at least one trip of the pattern allows
    /// boarding at `position`.
    fn can_board_at(&self, position: usize) -> bool;

    /// Returns `true` if at least one trip of the pattern allows
    /// debarking at `position`.
    fn can_debark_at(&self, position: usize) -> bool;
}

impl RouteData for TripPatternForDates {
    fn route(&self) -> RouteIdx {
        TripPatternForDates::route(self)
    }

    fn mode(&self) -> TransitMode {
        TripPatternForDates::mode(self)
    }

    fn priority_group_mask(&self) -> u32 {
        TripPatternForDates::priority_group_mask(self)
    }
}

impl TimetableData for TripPatternForDates {
    fn nb_of_trips(&self) -> usize {
        TripPatternForDates::nb_of_trips(self)
    }

    fn arrival_time(&self, trip: usize, position: usize) -> SecondsSinceTimeZero {
        TripPatternForDates::arrival_time(self, trip, position)
    }

    fn departure_time(&self, trip: usize, position: usize) -> SecondsSinceTimeZero {
        TripPatternForDates::departure_time(self, trip, position)
    }
}

impl PatternData for TripPatternForDates {
    fn nb_of_positions(&self) -> usize {
        TripPatternForDates::nb_of_positions(self)
    }

    fn stop_at(&self, position: usize) -> StopIdx {
        TripPatternForDates::stop_at(self, position)
    }

    fn can_board_at(&self, position: usize) -> bool {
        TripPatternForDates::can_board_at(self, position)
    }

    fn can_debark_at(&self, position: usize) -> bool {
        TripPatternForDates::can_debark_at(self, position)
    }
}

/// A transfer constraint negotiated between two trips at one stop,
/// stronger than the street transfer time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConstraint {
    pub min_duration: PositiveDuration,
    /// The connection is held for passengers of the incoming trip, even
    /// when it runs late.
    pub guaranteed: bool,
}

/// External provider of constrained transfers.
pub trait TransferRulesService {
    /// The constraint imposed when debarking `from_trip` and boarding
    /// `to_trip` at `stop`, when one applies.
    fn constraint(
        &self,
        from_trip: TripIdx,
        to_trip: TripIdx,
        stop: StopIdx,
    ) -> Option<TransferConstraint>;
}

/// Reports no constraint for any trip pair. Used when the deployment
/// has no transfer rules service.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRules;

impl TransferRulesService for NoRules {
    fn constraint(
        &self,
        _from_trip: TripIdx,
        _to_trip: TripIdx,
        _stop: StopIdx,
    ) -> Option<TransferConstraint> {
        None
    }
}

/// The contract the round based search consumes.
pub trait TransitData {
    /// An upper bound on the total number of stops.
    fn nb_of_stops(&self) -> usize;

    /// A human readable stop name, for logs and debug output.
    fn stop_name(&self, stop: StopIdx) -> &str;

    /// The `[start, end)` window inside which trips may be boarded, in
    /// seconds since time zero.
    fn valid_window(&self) -> (SecondsSinceTimeZero, SecondsSinceTimeZero);

    fn cost_calculator(&self) -> &CostCalculator;

    /// The constrained transfer imposed between two trips at `stop`,
    /// when the transfer rules service knows one.
    fn constrained_transfer(
        &self,
        from_trip: TripIdx,
        to_trip: TripIdx,
        stop: StopIdx,
    ) -> Option<TransferConstraint>;
}

/// The lazy sequences the search iterates on. All of them are finite
/// and can be restarted by calling the method again.
pub trait TransitDataIters<'a> {
    /// Iterator for the `Transfer`s that can be taken at a stop
    type TransfersAtStop: Iterator<Item = &'a Transfer>;

    /// Returns all `Transfer`s leaving `from_stop`.
    ///
    /// Should not return twice the same `Transfer`.
    fn transfers_from(&'a self, from_stop: StopIdx) -> Self::TransfersAtStop;

    /// Returns all `Transfer`s arriving at `to_stop`.
    ///
    /// Should not return twice the same `Transfer`.
    fn transfers_to(&'a self, to_stop: StopIdx) -> Self::TransfersAtStop;

    /// Iterator for the merged patterns touching a set of stops
    type PatternsTouching: Iterator<Item = &'a TripPatternForDates>;

    /// Returns the union of all patterns with at least one stop among
    /// `stops`, in a deterministic order.
    ///
    /// Should not return twice the same pattern.
    fn patterns_touching(&'a self, stops: &[StopIdx]) -> Self::PatternsTouching;
}
