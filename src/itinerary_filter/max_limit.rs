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

use super::{flag_for_deletion, ItineraryFilter, MAX_LIMIT_TAG};
use crate::request::CropSide;
use crate::response::Itinerary;

/// Crops the list down to the requested maximum, from the head or the
/// tail. Runs after the final sort, so the tail holds the worst
/// itineraries. The optional observer receives the first cropped
/// itinerary, for the caller to build its next page around.
pub struct MaxLimit {
    max_nb_of_itineraries: usize,
    crop_side: CropSide,
    crop_observer: Option<Box<dyn FnMut(&Itinerary)>>,
}

impl MaxLimit {
    pub fn new(
        max_nb_of_itineraries: usize,
        crop_side: CropSide,
        crop_observer: Option<Box<dyn FnMut(&Itinerary)>>,
    ) -> Self {
        Self {
            max_nb_of_itineraries,
            crop_side,
            crop_observer,
        }
    }
}

impl ItineraryFilter for MaxLimit {
    fn name(&self) -> &str {
        MAX_LIMIT_TAG
    }

    fn filter(&mut self, itineraries: &mut Vec<Itinerary>) {
        let kept: Vec<usize> = itineraries
            .iter()
            .enumerate()
            .filter(|(_, itinerary)| !itinerary.is_flagged_for_deletion())
            .map(|(position, _)| position)
            .collect();
        if kept.len() <= self.max_nb_of_itineraries {
            return;
        }
        let nb_cropped = kept.len() - self.max_nb_of_itineraries;
        let cropped: Vec<usize> = match self.crop_side {
            CropSide::Head => kept[..nb_cropped].to_vec(),
            CropSide::Tail => kept[kept.len() - nb_cropped..].to_vec(),
        };
        if let Some(observer) = &mut self.crop_observer {
            // cropped is not empty since more itineraries are kept than
            // the maximum allows
            observer(&itineraries[cropped[0]]);
        }
        for position in cropped {
            flag_for_deletion(
                &mut itineraries[position],
                MAX_LIMIT_TAG,
                format!(
                    "the maximum number of itineraries is {}",
                    self.max_nb_of_itineraries
                ),
            );
        }
    }
}
