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

//! The ordered filter and ranking pipeline applied to the itineraries
//! produced by the search.
//!
//! Stages never physically remove an itinerary : they attach a
//! [`SystemNotice`] carrying their tag instead, and the final pass
//! either strips tagged itineraries or, in debug mode, keeps everything
//! with the tags visible.

pub mod absolute_filters;
pub mod group_by_similarity;
pub mod max_limit;
pub mod sort_order;

pub use absolute_filters::{
    LatestDepartureCutoff, MostlyWalking, RemoveWalkOnly, TransitWorseThanStreet,
};
pub use group_by_similarity::GroupBySimilarity;
pub use max_limit::MaxLimit;
pub use sort_order::SortingStage;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::request::{CropSide, RequestInput, SortOrder, StreetMode};
use crate::response::{routing_errors, Itinerary, RoutingError, SystemNotice};

pub const GROUP_BY_SIMILARITY_TAG: &str = "group-by-similarity";
pub const TRANSIT_WORSE_THAN_STREET_TAG: &str = "transit-worse-than-street";
pub const REMOVE_WALK_ONLY_TAG: &str = "remove-walk-only";
pub const LATEST_DEPARTURE_CUTOFF_TAG: &str = "latest-departure-cutoff";
pub const MOSTLY_WALKING_TAG: &str = "mostly-walking";
pub const MAX_LIMIT_TAG: &str = "max-limit";

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.68;
pub const DEFAULT_MAX_NB_OF_SIMILAR: usize = 3;
pub const DEFAULT_MAX_WALK_SHARE: f64 = 0.5;

fn default_similarity_threshold() -> f64 {
    DEFAULT_SIMILARITY_THRESHOLD
}

fn default_max_nb_of_similar() -> usize {
    DEFAULT_MAX_NB_OF_SIMILAR
}

fn default_max_walk_share() -> f64 {
    DEFAULT_MAX_WALK_SHARE
}

/// The tunables of the filter chain. All fields have serde defaults so
/// that a request can configure only what it cares about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItineraryFilterParams {
    /// two itineraries riding the same vehicles between the same stops
    /// for at least this share of their combined transit distance are
    /// considered similar
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// how many itineraries of a similarity group are kept
    #[serde(default = "default_max_nb_of_similar")]
    pub max_nb_of_similar: usize,

    #[serde(default)]
    pub remove_walk_only: bool,

    /// itineraries departing strictly after this instant are dropped
    #[serde(default)]
    pub latest_departure: Option<DateTime<Utc>>,

    /// largest tolerated share of the total distance spent walking, for
    /// requests that rent a bike or park a car
    #[serde(default = "default_max_walk_share")]
    pub max_walk_share: f64,
}

impl Default for ItineraryFilterParams {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            max_nb_of_similar: default_max_nb_of_similar(),
            remove_walk_only: false,
            latest_departure: None,
            max_walk_share: default_max_walk_share(),
        }
    }
}

/// One stage of the filter chain.
///
/// A stage may reorder the list and flag itineraries for deletion,
/// nothing else. Already flagged itineraries must not influence its
/// decisions.
pub trait ItineraryFilter {
    /// The name of the stage, used as the tag of the notices it leaves.
    fn name(&self) -> &str;

    fn filter(&mut self, itineraries: &mut Vec<Itinerary>);
}

/// Flag `itinerary` as deleted by the stage tagged `stage_tag`.
pub fn flag_for_deletion(itinerary: &mut Itinerary, stage_tag: &str, message: String) {
    itinerary.add_notice(SystemNotice::new(stage_tag, message));
}

/// The stages of one request, in canonical order. Built by
/// [`ItineraryFilterChainBuilder`].
pub struct ItineraryFilterChain {
    stages: Vec<Box<dyn ItineraryFilter>>,
    debug: bool,
    routing_errors: Vec<RoutingError>,
}

impl ItineraryFilterChain {
    /// Run every stage, then strip the flagged itineraries unless debug
    /// mode keeps them. An empty input is valid and yields an empty
    /// output.
    pub fn run(&mut self, mut itineraries: Vec<Itinerary>) -> Vec<Itinerary> {
        for stage in &mut self.stages {
            stage.filter(&mut itineraries);
            let nb_flagged = itineraries
                .iter()
                .filter(|itinerary| itinerary.is_flagged_for_deletion())
                .count();
            trace!(
                "After filter stage {} : {} of {} itineraries flagged for deletion",
                stage.name(),
                nb_flagged,
                itineraries.len()
            );
        }
        // the errors must be derived while the flags are still visible
        self.routing_errors = routing_errors(&itineraries);
        delete_flagged(itineraries, self.debug)
    }

    /// The routing errors of the last [`run`](Self::run). Empty when at
    /// least one itinerary survived.
    pub fn routing_errors(&self) -> &[RoutingError] {
        &self.routing_errors
    }
}

fn delete_flagged(itineraries: Vec<Itinerary>, debug: bool) -> Vec<Itinerary> {
    if debug {
        return itineraries;
    }
    let nb_before = itineraries.len();
    let kept: Vec<Itinerary> = itineraries
        .into_iter()
        .filter(|itinerary| !itinerary.is_flagged_for_deletion())
        .collect();
    debug!(
        "Itinerary filter chain kept {} of {} itineraries",
        kept.len(),
        nb_before
    );
    kept
}

/// Assembles the canonical stage sequence for one request : similarity
/// grouping, then the absolute filters the request enables, then the
/// final sort, then the maximum limit crop.
pub struct ItineraryFilterChainBuilder {
    params: ItineraryFilterParams,
    sort_order: SortOrder,
    max_nb_of_itineraries: usize,
    crop_side: CropSide,
    debug: bool,
    street_mode: StreetMode,
    crop_observer: Option<Box<dyn FnMut(&Itinerary)>>,
}

impl ItineraryFilterChainBuilder {
    pub fn new(request: &RequestInput) -> Self {
        Self {
            params: request.filter_params.clone(),
            sort_order: request.effective_sort_order(),
            max_nb_of_itineraries: request.max_nb_of_itineraries,
            crop_side: request.crop_side,
            debug: request.debug,
            street_mode: request.street_options.mode,
            crop_observer: None,
        }
    }

    /// `observer` is called with the first itinerary cropped by the
    /// maximum limit stage, for the caller's pagination cursor.
    pub fn on_crop<Observer>(mut self, observer: Observer) -> Self
    where
        Observer: FnMut(&Itinerary) + 'static,
    {
        self.crop_observer = Some(Box::new(observer));
        self
    }

    pub fn build(self) -> ItineraryFilterChain {
        let mut stages: Vec<Box<dyn ItineraryFilter>> = Vec::new();
        stages.push(Box::new(GroupBySimilarity::new(
            self.params.similarity_threshold,
            self.params.max_nb_of_similar,
        )));
        stages.push(Box::new(TransitWorseThanStreet));
        if self.params.remove_walk_only {
            stages.push(Box::new(RemoveWalkOnly));
        }
        if let Some(latest_departure) = self.params.latest_departure {
            stages.push(Box::new(LatestDepartureCutoff::new(latest_departure)));
        }
        if matches!(self.street_mode, StreetMode::BikeRental | StreetMode::CarPark) {
            stages.push(Box::new(MostlyWalking::new(self.params.max_walk_share)));
        }
        stages.push(Box::new(SortingStage::new(self.sort_order)));
        stages.push(Box::new(MaxLimit::new(
            self.max_nb_of_itineraries,
            self.crop_side,
            self.crop_observer,
        )));
        ItineraryFilterChain {
            stages,
            debug: self.debug,
            routing_errors: Vec::new(),
        }
    }
}
