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

use super::{flag_for_deletion, ItineraryFilter, GROUP_BY_SIMILARITY_TAG};
use crate::response::{Itinerary, Leg};

/// Groups itineraries riding mostly the same vehicles and keeps only
/// the best few of each group.
///
/// Two itineraries are similar when the transit legs they share, by
/// trip and board/debark stops, cover at least `similarity_threshold`
/// of their combined transit distance. Street only itineraries have no
/// transit distance and are never grouped.
pub struct GroupBySimilarity {
    similarity_threshold: f64,
    max_nb_of_similar: usize,
}

impl GroupBySimilarity {
    pub fn new(similarity_threshold: f64, max_nb_of_similar: usize) -> Self {
        Self {
            similarity_threshold,
            max_nb_of_similar,
        }
    }
}

impl ItineraryFilter for GroupBySimilarity {
    fn name(&self) -> &str {
        GROUP_BY_SIMILARITY_TAG
    }

    fn filter(&mut self, itineraries: &mut Vec<Itinerary>) {
        // each group is a list of positions; the first member is the
        // representative every candidate is compared against
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for (position, itinerary) in itineraries.iter().enumerate() {
            if itinerary.is_flagged_for_deletion() || transit_distance(itinerary) == 0.0 {
                continue;
            }
            let home = groups.iter_mut().find(|group| {
                similarity(&itineraries[group[0]], itinerary) >= self.similarity_threshold
            });
            match home {
                Some(members) => members.push(position),
                None => groups.push(vec![position]),
            }
        }

        for mut members in groups {
            if members.len() <= self.max_nb_of_similar {
                continue;
            }
            members.sort_by(|a, b| {
                itineraries[*a]
                    .cost()
                    .cmp(&itineraries[*b].cost())
                    .then_with(|| {
                        itineraries[*a]
                            .nb_of_transfers()
                            .cmp(&itineraries[*b].nb_of_transfers())
                    })
            });
            for position in members.into_iter().skip(self.max_nb_of_similar) {
                flag_for_deletion(
                    &mut itineraries[position],
                    GROUP_BY_SIMILARITY_TAG,
                    "a better similar itinerary exists".to_string(),
                );
            }
        }
    }
}

fn transit_distance(itinerary: &Itinerary) -> f64 {
    itinerary
        .legs()
        .iter()
        .filter(|leg| leg.is_transit())
        .map(Leg::distance)
        .sum()
}

/// Share of the combined transit distance that `a` and `b` spend on the
/// same vehicle between the same stops. 1.0 for identical transit legs,
/// 0.0 when nothing is shared.
fn similarity(a: &Itinerary, b: &Itinerary) -> f64 {
    let total = transit_distance(a) + transit_distance(b);
    if total == 0.0 {
        return 0.0;
    }
    let mut common = 0.0;
    for leg in a.legs() {
        let leg_a = match leg {
            Leg::Transit(transit) => transit,
            Leg::Street(_) => continue,
        };
        let shared = b.legs().iter().any(|other| match other {
            Leg::Transit(leg_b) => {
                leg_a.trip == leg_b.trip
                    && leg_a.from_stop == leg_b.from_stop
                    && leg_a.to_stop == leg_b.to_stop
            }
            Leg::Street(_) => false,
        });
        if shared {
            // the leg sits in both itineraries, count it on both sides
            common += 2.0 * leg_a.distance;
        }
    }
    common / total
}
