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

//! Stages that flag an itinerary on its own merits : dominated by a
//! street only alternative, walk only, departing too late, or walking
//! most of its length.

use chrono::{DateTime, Utc};

use super::{
    flag_for_deletion, ItineraryFilter, LATEST_DEPARTURE_CUTOFF_TAG, MOSTLY_WALKING_TAG,
    REMOVE_WALK_ONLY_TAG, TRANSIT_WORSE_THAN_STREET_TAG,
};
use crate::request::StreetMode;
use crate::response::{Itinerary, Leg};

/// Flags transit itineraries strictly worse than the best street only
/// itinerary of the list. Does nothing when no street only itinerary is
/// present.
pub struct TransitWorseThanStreet;

impl ItineraryFilter for TransitWorseThanStreet {
    fn name(&self) -> &str {
        TRANSIT_WORSE_THAN_STREET_TAG
    }

    fn filter(&mut self, itineraries: &mut Vec<Itinerary>) {
        let best_street_cost = itineraries
            .iter()
            .filter(|itinerary| {
                !itinerary.is_flagged_for_deletion() && itinerary.is_street_only()
            })
            .map(Itinerary::cost)
            .min();
        let best_street_cost = match best_street_cost {
            Some(cost) => cost,
            None => return,
        };
        for itinerary in itineraries.iter_mut() {
            if itinerary.is_flagged_for_deletion() || itinerary.is_street_only() {
                continue;
            }
            if best_street_cost < itinerary.cost() {
                flag_for_deletion(
                    itinerary,
                    TRANSIT_WORSE_THAN_STREET_TAG,
                    format!(
                        "a street only itinerary of cost {} is better",
                        best_street_cost
                    ),
                );
            }
        }
    }
}

/// Flags itineraries made of a single walk, for requests that asked for
/// transit.
pub struct RemoveWalkOnly;

impl ItineraryFilter for RemoveWalkOnly {
    fn name(&self) -> &str {
        REMOVE_WALK_ONLY_TAG
    }

    fn filter(&mut self, itineraries: &mut Vec<Itinerary>) {
        for itinerary in itineraries.iter_mut() {
            if itinerary.is_flagged_for_deletion() {
                continue;
            }
            if itinerary.is_walk_only() {
                flag_for_deletion(
                    itinerary,
                    REMOVE_WALK_ONLY_TAG,
                    "walk only itineraries are excluded".to_string(),
                );
            }
        }
    }
}

/// Flags itineraries departing strictly after `latest_departure`. Used
/// by paging, to hide from one page the itineraries belonging to the
/// next one.
pub struct LatestDepartureCutoff {
    latest_departure: DateTime<Utc>,
}

impl LatestDepartureCutoff {
    pub fn new(latest_departure: DateTime<Utc>) -> Self {
        Self { latest_departure }
    }
}

impl ItineraryFilter for LatestDepartureCutoff {
    fn name(&self) -> &str {
        LATEST_DEPARTURE_CUTOFF_TAG
    }

    fn filter(&mut self, itineraries: &mut Vec<Itinerary>) {
        for itinerary in itineraries.iter_mut() {
            if itinerary.is_flagged_for_deletion() {
                continue;
            }
            if *itinerary.departure_time() > self.latest_departure {
                let message = format!(
                    "departure at {} is after the latest departure {}",
                    itinerary.departure_time(),
                    self.latest_departure
                );
                flag_for_deletion(itinerary, LATEST_DEPARTURE_CUTOFF_TAG, message);
            }
        }
    }
}

/// Flags itineraries that spend more than `max_walk_share` of their
/// distance walking. Walk only itineraries are left alone, they belong
/// to [`RemoveWalkOnly`].
pub struct MostlyWalking {
    max_walk_share: f64,
}

impl MostlyWalking {
    pub fn new(max_walk_share: f64) -> Self {
        Self { max_walk_share }
    }
}

impl ItineraryFilter for MostlyWalking {
    fn name(&self) -> &str {
        MOSTLY_WALKING_TAG
    }

    fn filter(&mut self, itineraries: &mut Vec<Itinerary>) {
        for itinerary in itineraries.iter_mut() {
            if itinerary.is_flagged_for_deletion() || itinerary.is_walk_only() {
                continue;
            }
            let share = walk_share(itinerary);
            if share > self.max_walk_share {
                flag_for_deletion(
                    itinerary,
                    MOSTLY_WALKING_TAG,
                    format!("walking covers {:.0}% of the distance", share * 100.0),
                );
            }
        }
    }
}

fn walk_share(itinerary: &Itinerary) -> f64 {
    let total: f64 = itinerary.legs().iter().map(Leg::distance).sum();
    if total == 0.0 {
        return 0.0;
    }
    let walked: f64 = itinerary
        .legs()
        .iter()
        .filter_map(|leg| match leg {
            Leg::Street(street) if street.mode == StreetMode::Walk => Some(street.distance),
            _ => None,
        })
        .sum();
    walked / total
}
