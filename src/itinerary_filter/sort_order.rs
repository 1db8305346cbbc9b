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

use std::cmp::Ordering;

use super::ItineraryFilter;
use crate::request::SortOrder;
use crate::response::Itinerary;

/// Puts the itineraries in their final presentation order. Street only
/// itineraries always come first. The sort is stable, so equal
/// itineraries keep the order the search produced them in.
pub struct SortingStage {
    sort_order: SortOrder,
}

impl SortingStage {
    pub fn new(sort_order: SortOrder) -> Self {
        Self { sort_order }
    }
}

impl ItineraryFilter for SortingStage {
    fn name(&self) -> &str {
        "sort-order"
    }

    fn filter(&mut self, itineraries: &mut Vec<Itinerary>) {
        let sort_order = self.sort_order;
        itineraries.sort_by(|a, b| compare(sort_order, a, b));
    }
}

fn compare(sort_order: SortOrder, a: &Itinerary, b: &Itinerary) -> Ordering {
    // street only first, whatever the requested order
    let street_first = b.is_street_only().cmp(&a.is_street_only());
    match sort_order {
        SortOrder::StreetAndArrivalTime => street_first
            .then_with(|| a.arrival_time().cmp(b.arrival_time()))
            .then_with(|| a.cost().cmp(&b.cost()))
            .then_with(|| a.nb_of_transfers().cmp(&b.nb_of_transfers()))
            // among ties, leaving later means waiting less
            .then_with(|| b.departure_time().cmp(a.departure_time())),
        SortOrder::StreetAndDepartureTime => street_first
            .then_with(|| b.departure_time().cmp(a.departure_time()))
            .then_with(|| a.cost().cmp(&b.cost()))
            .then_with(|| a.nb_of_transfers().cmp(&b.nb_of_transfers()))
            .then_with(|| a.arrival_time().cmp(b.arrival_time())),
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{time, transit_leg, walk_itinerary};
    use super::*;
    use crate::cost::Cost;

    fn ride(trip: usize, departure: (u32, u32), arrival: (u32, u32), cost: i64) -> Itinerary {
        Itinerary::new(
            vec![transit_leg(
                trip,
                time(departure.0, departure.1),
                time(arrival.0, arrival.1),
                5000.0,
            )],
            Cost::from_seconds(cost),
        )
    }

    #[test]
    fn street_only_itineraries_come_first() {
        let mut itineraries = vec![ride(0, (8, 0), (8, 10), 10), walk_itinerary(500)];
        let mut stage = SortingStage::new(SortOrder::StreetAndArrivalTime);

        stage.filter(&mut itineraries);

        assert!(itineraries[0].is_street_only());
        assert!(!itineraries[1].is_street_only());
    }

    #[test]
    fn earliest_arrival_comes_first() {
        let mut itineraries = vec![
            ride(0, (8, 0), (9, 30), 100),
            ride(1, (8, 0), (9, 0), 100),
            ride(2, (8, 0), (10, 0), 100),
        ];
        let mut stage = SortingStage::new(SortOrder::StreetAndArrivalTime);

        stage.filter(&mut itineraries);

        let arrivals: Vec<_> = itineraries
            .iter()
            .map(|itinerary| *itinerary.arrival_time())
            .collect();
        assert_eq!(arrivals, vec![time(9, 0), time(9, 30), time(10, 0)]);
    }

    #[test]
    fn arrival_ties_break_on_cost_then_transfers_then_departure() {
        let costly = ride(0, (8, 0), (9, 0), 200);
        let early = ride(1, (8, 0), (9, 0), 100);
        let late = ride(2, (8, 30), (9, 0), 100);
        let with_transfer = Itinerary::new(
            vec![
                transit_leg(3, time(8, 0), time(8, 20), 2000.0),
                transit_leg(4, time(8, 30), time(9, 0), 3000.0),
            ],
            Cost::from_seconds(100),
        );
        let mut itineraries = vec![costly, early, with_transfer, late];
        let mut stage = SortingStage::new(SortOrder::StreetAndArrivalTime);

        stage.filter(&mut itineraries);

        // all arrive at 09:00 : cheapest first, then fewest transfers,
        // then the latest departure
        assert_eq!(*itineraries[0].departure_time(), time(8, 30));
        assert_eq!(*itineraries[1].departure_time(), time(8, 0));
        assert_eq!(itineraries[1].nb_of_transfers(), 0);
        assert_eq!(itineraries[2].nb_of_transfers(), 1);
        assert_eq!(itineraries[3].cost(), Cost::from_seconds(200));
    }

    #[test]
    fn departure_order_puts_the_latest_departure_first() {
        let mut itineraries = vec![
            ride(0, (8, 0), (9, 0), 100),
            ride(1, (8, 40), (9, 20), 100),
            ride(2, (8, 20), (9, 10), 100),
        ];
        let mut stage = SortingStage::new(SortOrder::StreetAndDepartureTime);

        stage.filter(&mut itineraries);

        let departures: Vec<_> = itineraries
            .iter()
            .map(|itinerary| *itinerary.departure_time())
            .collect();
        assert_eq!(departures, vec![time(8, 40), time(8, 20), time(8, 0)]);
    }
}
