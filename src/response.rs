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

//! Candidate itineraries with their annotations, and the routing level
//! errors derived from an all filtered result.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::cost::Cost;
use crate::itinerary_filter::{LATEST_DEPARTURE_CUTOFF_TAG, TRANSIT_WORSE_THAN_STREET_TAG};
use crate::models::{StopIdx, TransitLayer, TransitMode, TripIdx};
use crate::request::StreetMode;
use crate::time::PositiveDuration;

/// One street section of an itinerary, between two places or stops.
#[derive(Debug, Clone)]
pub struct StreetLeg {
    pub mode: StreetMode,
    /// absent when the leg starts at the requested origin place
    pub from_stop: Option<StopIdx>,
    /// absent when the leg ends at the requested destination place
    pub to_stop: Option<StopIdx>,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    /// meters
    pub distance: f64,
}

impl StreetLeg {
    pub fn duration(&self) -> PositiveDuration {
        let seconds = self
            .arrival_time
            .signed_duration_since(self.departure_time)
            .num_seconds();
        // legs of a constructed itinerary never end before they start
        PositiveDuration::from_seconds(seconds.max(0) as u32)
    }
}

/// One ride on a transit vehicle, between the board and debark stops.
#[derive(Debug, Clone)]
pub struct TransitLeg {
    pub trip: TripIdx,
    pub mode: TransitMode,
    pub from_stop: StopIdx,
    pub to_stop: StopIdx,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    /// meters
    pub distance: f64,
}

#[derive(Debug, Clone)]
pub enum Leg {
    Street(StreetLeg),
    Transit(TransitLeg),
}

impl Leg {
    pub fn departure_time(&self) -> &DateTime<Utc> {
        match self {
            Leg::Street(street) => &street.departure_time,
            Leg::Transit(transit) => &transit.departure_time,
        }
    }

    pub fn arrival_time(&self) -> &DateTime<Utc> {
        match self {
            Leg::Street(street) => &street.arrival_time,
            Leg::Transit(transit) => &transit.arrival_time,
        }
    }

    pub fn distance(&self) -> f64 {
        match self {
            Leg::Street(street) => street.distance,
            Leg::Transit(transit) => transit.distance,
        }
    }

    pub fn is_transit(&self) -> bool {
        matches!(self, Leg::Transit(_))
    }
}

/// A deletion tag left on an itinerary by a filter stage, instead of a
/// physical removal, so that every decision remains inspectable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemNotice {
    pub tag: String,
    pub message: String,
}

impl SystemNotice {
    pub fn new(tag: &str, message: String) -> Self {
        Self {
            tag: tag.to_string(),
            message,
        }
    }
}

impl fmt::Display for SystemNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.tag, self.message)
    }
}

/// One complete candidate result of a trip search.
///
/// The aggregates are computed once at construction; the notices are
/// appended by the filter chain afterwards. An itinerary carrying at
/// least one notice is considered deleted by every consumer except the
/// debug output.
#[derive(Debug, Clone)]
pub struct Itinerary {
    legs: Vec<Leg>,
    cost: Cost,
    nb_of_transfers: usize,
    street_distance: f64,
    street_duration: PositiveDuration,
    notices: Vec<SystemNotice>,
}

impl Itinerary {
    pub fn new(legs: Vec<Leg>, cost: Cost) -> Self {
        assert!(!legs.is_empty(), "an itinerary must have at least one leg");
        for leg in &legs {
            assert!(
                leg.arrival_time() >= leg.departure_time(),
                "a leg must not end before it starts"
            );
        }
        for pair in legs.windows(2) {
            assert!(
                pair[1].departure_time() >= pair[0].arrival_time(),
                "legs must be ordered and must not overlap"
            );
        }

        let nb_of_rides = legs.iter().filter(|leg| leg.is_transit()).count();
        let mut street_distance = 0.0;
        let mut street_duration = PositiveDuration::zero();
        for leg in &legs {
            if let Leg::Street(street) = leg {
                street_distance += street.distance;
                street_duration = street_duration + street.duration();
            }
        }

        Self {
            legs,
            cost,
            nb_of_transfers: nb_of_rides.saturating_sub(1),
            street_distance,
            street_duration,
            notices: Vec::new(),
        }
    }

    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }

    pub fn nb_of_transfers(&self) -> usize {
        self.nb_of_transfers
    }

    /// Total meters travelled on the street network.
    pub fn street_distance(&self) -> f64 {
        self.street_distance
    }

    /// Total time spent on the street network.
    pub fn street_duration(&self) -> PositiveDuration {
        self.street_duration
    }

    pub fn total_distance(&self) -> f64 {
        self.legs.iter().map(Leg::distance).sum()
    }

    pub fn is_street_only(&self) -> bool {
        self.legs.iter().all(|leg| !leg.is_transit())
    }

    pub fn is_walk_only(&self) -> bool {
        self.legs.iter().all(|leg| match leg {
            Leg::Street(street) => street.mode == StreetMode::Walk,
            Leg::Transit(_) => false,
        })
    }

    pub fn departure_time(&self) -> &DateTime<Utc> {
        // unwrap is safe because an itinerary always has at least one leg
        self.legs.first().unwrap().departure_time()
    }

    pub fn arrival_time(&self) -> &DateTime<Utc> {
        // unwrap is safe because an itinerary always has at least one leg
        self.legs.last().unwrap().arrival_time()
    }

    pub fn duration(&self) -> PositiveDuration {
        let seconds = self
            .arrival_time()
            .signed_duration_since(*self.departure_time())
            .num_seconds();
        // legs are ordered, so the whole itinerary cannot go back in time
        PositiveDuration::from_seconds(seconds.max(0) as u32)
    }

    pub fn add_notice(&mut self, notice: SystemNotice) {
        self.notices.push(notice);
    }

    pub fn notices(&self) -> &[SystemNotice] {
        &self.notices
    }

    pub fn has_notice(&self, tag: &str) -> bool {
        self.notices.iter().any(|notice| notice.tag == tag)
    }

    pub fn is_flagged_for_deletion(&self) -> bool {
        !self.notices.is_empty()
    }

    pub fn print(&self, layer: &TransitLayer) -> Result<String, fmt::Error> {
        let mut result = String::new();
        self.write(layer, &mut result)?;
        Ok(result)
    }

    fn write_date(date: &DateTime<Utc>) -> String {
        date.format("%H:%M:%S %d-%b-%y").to_string()
    }

    pub fn write<Writer: fmt::Write>(
        &self,
        layer: &TransitLayer,
        writer: &mut Writer,
    ) -> Result<(), fmt::Error> {
        writeln!(writer, "*** New itinerary ***")?;
        writeln!(writer, "Departure : {}", Self::write_date(self.departure_time()))?;
        writeln!(writer, "Arrival : {}", Self::write_date(self.arrival_time()))?;
        writeln!(writer, "Cost : {}", self.cost)?;
        writeln!(writer, "Nb of transfers : {}", self.nb_of_transfers)?;
        for leg in &self.legs {
            match leg {
                Leg::Street(street) => {
                    let from = street
                        .from_stop
                        .map_or("origin", |stop| layer.stop_name(stop));
                    let to = street
                        .to_stop
                        .map_or("destination", |stop| layer.stop_name(stop));
                    writeln!(
                        writer,
                        "{} from {} at {} to {} at {}",
                        street.mode,
                        from,
                        Self::write_date(&street.departure_time),
                        to,
                        Self::write_date(&street.arrival_time),
                    )?;
                }
                Leg::Transit(transit) => {
                    writeln!(
                        writer,
                        "{} {} from {} at {} to {} at {}",
                        transit.mode,
                        layer.trip(transit.trip).id,
                        layer.stop_name(transit.from_stop),
                        Self::write_date(&transit.departure_time),
                        layer.stop_name(transit.to_stop),
                        Self::write_date(&transit.arrival_time),
                    )?;
                }
            }
        }
        for notice in &self.notices {
            writeln!(writer, "Deleted by {}", notice)?;
        }
        Ok(())
    }
}

/// A routing level error reported to the caller when the filter chain
/// leaves nothing to answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingError {
    WalkingBetterThanTransit,
    NoTransitConnection,
    NoTransitConnectionInSearchWindow,
}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingError::WalkingBetterThanTransit => {
                write!(f, "Walking is better than transit")
            }
            RoutingError::NoTransitConnection => {
                write!(f, "No transit connection was found")
            }
            RoutingError::NoTransitConnectionInSearchWindow => {
                write!(f, "No transit connection was found inside the search window")
            }
        }
    }
}

/// The routing errors to report for `itineraries` after the filter
/// chain ran.
///
/// An empty input is valid and means no connection exists at all. When
/// at least one itinerary survived the chain, there is no routing error
/// to report, whatever happened to the others.
pub fn routing_errors(itineraries: &[Itinerary]) -> Vec<RoutingError> {
    if itineraries.is_empty() {
        return vec![RoutingError::NoTransitConnection];
    }
    let all_deleted = itineraries.iter().all(Itinerary::is_flagged_for_deletion);
    if !all_deleted {
        return Vec::new();
    }

    let mut errors = Vec::new();
    let has_tag = |tag: &str| itineraries.iter().any(|itinerary| itinerary.has_notice(tag));
    if has_tag(TRANSIT_WORSE_THAN_STREET_TAG) {
        errors.push(RoutingError::WalkingBetterThanTransit);
    }
    if has_tag(LATEST_DEPARTURE_CUTOFF_TAG) {
        errors.push(RoutingError::NoTransitConnectionInSearchWindow);
    }
    if errors.is_empty() {
        errors.push(RoutingError::NoTransitConnection);
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itinerary_filter::GROUP_BY_SIMILARITY_TAG;
    use crate::models::ModelBuilder;
    use chrono::TimeZone;

    fn time(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, minute, 0).unwrap()
    }

    fn walk_leg(departure: DateTime<Utc>, arrival: DateTime<Utc>, distance: f64) -> Leg {
        Leg::Street(StreetLeg {
            mode: StreetMode::Walk,
            from_stop: None,
            to_stop: None,
            departure_time: departure,
            arrival_time: arrival,
            distance,
        })
    }

    fn transit_leg(departure: DateTime<Utc>, arrival: DateTime<Utc>, distance: f64) -> Leg {
        Leg::Transit(TransitLeg {
            trip: TripIdx { idx: 0 },
            mode: TransitMode::Bus,
            from_stop: StopIdx { idx: 0 },
            to_stop: StopIdx { idx: 1 },
            departure_time: departure,
            arrival_time: arrival,
            distance,
        })
    }

    #[test]
    fn aggregates_are_computed_at_construction() {
        let itinerary = Itinerary::new(
            vec![
                walk_leg(time(8, 0), time(8, 10), 500.0),
                transit_leg(time(8, 15), time(8, 45), 8000.0),
                walk_leg(time(8, 45), time(8, 50), 250.0),
            ],
            Cost::from_seconds(3000),
        );

        assert_eq!(itinerary.nb_of_transfers(), 0);
        assert_eq!(itinerary.street_distance(), 750.0);
        assert_eq!(
            itinerary.street_duration(),
            PositiveDuration::from_hms(0, 15, 0)
        );
        assert_eq!(itinerary.total_distance(), 8750.0);
        assert_eq!(itinerary.departure_time(), &time(8, 0));
        assert_eq!(itinerary.arrival_time(), &time(8, 50));
        assert_eq!(itinerary.duration(), PositiveDuration::from_hms(0, 50, 0));
    }

    #[test]
    fn transfers_count_rides_not_legs() {
        let itinerary = Itinerary::new(
            vec![
                transit_leg(time(8, 0), time(8, 20), 5000.0),
                walk_leg(time(8, 20), time(8, 25), 200.0),
                transit_leg(time(8, 30), time(9, 0), 9000.0),
            ],
            Cost::from_seconds(3600),
        );
        assert_eq!(itinerary.nb_of_transfers(), 1);
        assert!(!itinerary.is_street_only());
        assert!(!itinerary.is_walk_only());
    }

    #[test]
    fn street_only_and_walk_only_are_distinct() {
        let walk = Itinerary::new(
            vec![walk_leg(time(8, 0), time(8, 30), 2000.0)],
            Cost::from_seconds(3600),
        );
        assert!(walk.is_street_only());
        assert!(walk.is_walk_only());

        let bike = Itinerary::new(
            vec![Leg::Street(StreetLeg {
                mode: StreetMode::Bike,
                from_stop: None,
                to_stop: None,
                departure_time: time(8, 0),
                arrival_time: time(8, 20),
                distance: 4000.0,
            })],
            Cost::from_seconds(2400),
        );
        assert!(bike.is_street_only());
        assert!(!bike.is_walk_only());
    }

    #[test]
    #[should_panic(expected = "ordered")]
    fn overlapping_legs_are_rejected() {
        Itinerary::new(
            vec![
                transit_leg(time(8, 0), time(8, 30), 5000.0),
                transit_leg(time(8, 20), time(9, 0), 5000.0),
            ],
            Cost::from_seconds(3600),
        );
    }

    #[test]
    fn no_itinerary_at_all_is_a_missing_connection() {
        assert_eq!(
            routing_errors(&[]),
            vec![RoutingError::NoTransitConnection]
        );
    }

    #[test]
    fn a_survivor_clears_all_routing_errors() {
        let mut deleted = Itinerary::new(
            vec![transit_leg(time(8, 0), time(8, 30), 5000.0)],
            Cost::from_seconds(3600),
        );
        deleted.add_notice(SystemNotice::new(
            TRANSIT_WORSE_THAN_STREET_TAG,
            "dominated".to_string(),
        ));
        let survivor = Itinerary::new(
            vec![walk_leg(time(8, 0), time(8, 30), 2000.0)],
            Cost::from_seconds(3600),
        );

        assert_eq!(routing_errors(&[deleted, survivor]), Vec::new());
    }

    #[test]
    fn deletion_tags_drive_the_reported_errors() {
        let mut worse_than_street = Itinerary::new(
            vec![transit_leg(time(8, 0), time(8, 30), 5000.0)],
            Cost::from_seconds(3600),
        );
        worse_than_street.add_notice(SystemNotice::new(
            TRANSIT_WORSE_THAN_STREET_TAG,
            "dominated".to_string(),
        ));
        let mut out_of_window = Itinerary::new(
            vec![transit_leg(time(9, 0), time(9, 30), 5000.0)],
            Cost::from_seconds(3600),
        );
        out_of_window.add_notice(SystemNotice::new(
            LATEST_DEPARTURE_CUTOFF_TAG,
            "departs too late".to_string(),
        ));

        let errors = routing_errors(&[worse_than_street, out_of_window]);
        assert_eq!(
            errors,
            vec![
                RoutingError::WalkingBetterThanTransit,
                RoutingError::NoTransitConnectionInSearchWindow,
            ]
        );
    }

    #[test]
    fn other_tags_fall_back_to_missing_connection() {
        let mut grouped_away = Itinerary::new(
            vec![transit_leg(time(8, 0), time(8, 30), 5000.0)],
            Cost::from_seconds(3600),
        );
        grouped_away.add_notice(SystemNotice::new(
            GROUP_BY_SIMILARITY_TAG,
            "a better similar itinerary exists".to_string(),
        ));

        assert_eq!(
            routing_errors(&[grouped_away]),
            vec![RoutingError::NoTransitConnection]
        );
    }

    #[test]
    fn the_debug_printer_names_stops_and_trips() {
        let layer = ModelBuilder::new("2024-05-01", "2024-05-07")
            .stop("A", |stop| {
                stop.name = "Alpha".to_string();
            })
            .stop("B", |stop| {
                stop.name = "Bravo".to_string();
            })
            .vj("toto", |vj| {
                vj.st("A", "08:00:00").st("B", "08:30:00");
            })
            .build();

        let itinerary = Itinerary::new(
            vec![Leg::Transit(TransitLeg {
                trip: layer.trip_idx("toto").unwrap(),
                mode: TransitMode::Bus,
                from_stop: layer.stop_idx("A").unwrap(),
                to_stop: layer.stop_idx("B").unwrap(),
                departure_time: time(8, 0),
                arrival_time: time(8, 30),
                distance: 5000.0,
            })],
            Cost::from_seconds(1800),
        );

        let printed = itinerary.print(&layer).unwrap();
        assert!(printed.contains("toto"));
        assert!(printed.contains("Alpha"));
        assert!(printed.contains("Bravo"));
        assert!(printed.contains("Nb of transfers : 0"));
    }
}
