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

use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::base_model::TransitLayer;
use crate::models::{AgencyIdx, PatternIdx, TransitMode};

/// The group id shared by every pattern not claimed by a selector.
pub const BASE_PRIORITY_GROUP: u32 = 0;

/// Group ids are bit positions of a `u32` mask, so at most 32 distinct
/// groups can be allocated for one request.
pub const MAX_NB_OF_PRIORITY_GROUPS: u32 = 32;

/// One selector of the priority group configuration.
///
/// Fields left to `None` are not constrained. A selector with no field
/// set matches nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityGroupSelector {
    pub mode: Option<TransitMode>,
    pub sub_mode_regex: Option<String>,
    pub agency_id: Option<String>,
    pub route_id: Option<String>,
}

#[derive(Debug)]
pub enum PriorityGroupError {
    BadSubModeRegex {
        pattern: String,
        source: regex::Error,
    },
    /// More than [`MAX_NB_OF_PRIORITY_GROUPS`] distinct group ids would
    /// be needed for this request's selectors.
    GroupIdOverflow,
}

impl Display for PriorityGroupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PriorityGroupError::BadSubModeRegex { pattern, source } => write!(
                f,
                "Bad sub mode regex '{}' in a priority group selector : {}",
                pattern, source
            ),
            PriorityGroupError::GroupIdOverflow => write!(
                f,
                "The priority group selectors require more than {} distinct group ids",
                MAX_NB_OF_PRIORITY_GROUPS
            ),
        }
    }
}

impl Error for PriorityGroupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PriorityGroupError::BadSubModeRegex { source, .. } => Some(source),
            PriorityGroupError::GroupIdOverflow => None,
        }
    }
}

/// A compiled [`PriorityGroupSelector`].
#[derive(Debug)]
pub enum PriorityGroupMatcher {
    /// Matches no pattern at all. Compiled from a selector with no
    /// field set, so that an empty selector cannot capture the whole
    /// network by accident.
    Never,
    Composite {
        mode: Option<TransitMode>,
        sub_mode: Option<Regex>,
        agency_id: Option<String>,
        route_id: Option<String>,
    },
}

impl PriorityGroupMatcher {
    pub fn compile(selector: &PriorityGroupSelector) -> Result<Self, PriorityGroupError> {
        if selector.mode.is_none()
            && selector.sub_mode_regex.is_none()
            && selector.agency_id.is_none()
            && selector.route_id.is_none()
        {
            return Ok(PriorityGroupMatcher::Never);
        }
        let sub_mode = match &selector.sub_mode_regex {
            Some(pattern) => Some(Regex::new(pattern).map_err(|source| {
                PriorityGroupError::BadSubModeRegex {
                    pattern: pattern.clone(),
                    source,
                }
            })?),
            None => None,
        };
        Ok(PriorityGroupMatcher::Composite {
            mode: selector.mode,
            sub_mode,
            agency_id: selector.agency_id.clone(),
            route_id: selector.route_id.clone(),
        })
    }

    pub fn matches(&self, pattern_idx: PatternIdx, transit_layer: &TransitLayer) -> bool {
        match self {
            PriorityGroupMatcher::Never => false,
            PriorityGroupMatcher::Composite {
                mode,
                sub_mode,
                agency_id,
                route_id,
            } => {
                let route = transit_layer.route_of_pattern(pattern_idx);
                if let Some(mode) = mode {
                    if route.mode != *mode {
                        return false;
                    }
                }
                if let Some(sub_mode) = sub_mode {
                    match &route.sub_mode {
                        Some(route_sub_mode) => {
                            if !sub_mode.is_match(route_sub_mode) {
                                return false;
                            }
                        }
                        None => {
                            return false;
                        }
                    }
                }
                if let Some(agency_id) = agency_id {
                    if transit_layer.agency_of_route(route).id != *agency_id {
                        return false;
                    }
                }
                if let Some(route_id) = route_id {
                    if route.id != *route_id {
                        return false;
                    }
                }
                true
            }
        }
    }
}

/// Assigns priority group ids to patterns, allocating new ids lazily.
///
/// Three tiers of selectors are evaluated in order :
///  - base selectors claim patterns for the reserved
///    [`BASE_PRIORITY_GROUP`] without consuming an id,
///  - per-agency selectors allocate one id per distinct agency
///    encountered,
///  - global selectors allocate one shared id each.
///
/// A pattern matched by no selector falls back to the base group.
///
/// This holds request-scoped allocation state. Build a fresh one for
/// each request, and feed it pattern lookups in a deterministic order
/// so that two runs of the same request allocate the same ids.
pub struct PriorityGroupConfigurator {
    base_matchers: Vec<PriorityGroupMatcher>,
    agency_matchers: Vec<PriorityGroupMatcher>,
    global_matchers: Vec<(PriorityGroupMatcher, Option<u32>)>,
    agency_groups: HashMap<(usize, AgencyIdx), u32>,
    nb_of_allocated_groups: u32,
}

impl PriorityGroupConfigurator {
    pub fn new(
        base_selectors: &[PriorityGroupSelector],
        per_agency_selectors: &[PriorityGroupSelector],
        global_selectors: &[PriorityGroupSelector],
    ) -> Result<Self, PriorityGroupError> {
        let base_matchers = base_selectors
            .iter()
            .map(PriorityGroupMatcher::compile)
            .collect::<Result<Vec<_>, _>>()?;
        let agency_matchers = per_agency_selectors
            .iter()
            .map(PriorityGroupMatcher::compile)
            .collect::<Result<Vec<_>, _>>()?;
        let global_matchers = global_selectors
            .iter()
            .map(|selector| PriorityGroupMatcher::compile(selector).map(|matcher| (matcher, None)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            base_matchers,
            agency_matchers,
            global_matchers,
            agency_groups: HashMap::new(),
            nb_of_allocated_groups: 0,
        })
    }

    pub fn nb_of_allocated_groups(&self) -> u32 {
        self.nb_of_allocated_groups
    }

    /// The priority group id of `pattern_idx`, allocating a new id when
    /// this pattern is the first to need it.
    pub fn group_of_pattern(
        &mut self,
        pattern_idx: PatternIdx,
        transit_layer: &TransitLayer,
    ) -> Result<u32, PriorityGroupError> {
        for matcher in &self.base_matchers {
            if matcher.matches(pattern_idx, transit_layer) {
                return Ok(BASE_PRIORITY_GROUP);
            }
        }

        for (selector_rank, matcher) in self.agency_matchers.iter().enumerate() {
            if matcher.matches(pattern_idx, transit_layer) {
                let agency_idx = transit_layer.route_of_pattern(pattern_idx).agency;
                if let Some(group_id) = self.agency_groups.get(&(selector_rank, agency_idx)) {
                    return Ok(*group_id);
                }
                let group_id = allocate_group_id(&mut self.nb_of_allocated_groups)?;
                self.agency_groups
                    .insert((selector_rank, agency_idx), group_id);
                return Ok(group_id);
            }
        }

        for (matcher, allocated) in &mut self.global_matchers {
            if matcher.matches(pattern_idx, transit_layer) {
                if let Some(group_id) = allocated {
                    return Ok(*group_id);
                }
                let group_id = allocate_group_id(&mut self.nb_of_allocated_groups)?;
                *allocated = Some(group_id);
                return Ok(group_id);
            }
        }

        Ok(BASE_PRIORITY_GROUP)
    }
}

fn allocate_group_id(nb_of_allocated_groups: &mut u32) -> Result<u32, PriorityGroupError> {
    if *nb_of_allocated_groups >= MAX_NB_OF_PRIORITY_GROUPS {
        return Err(PriorityGroupError::GroupIdOverflow);
    }
    let group_id = 1u32 << *nb_of_allocated_groups;
    *nb_of_allocated_groups += 1;
    Ok(group_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelBuilder;

    fn selector_on_route(route_id: &str) -> PriorityGroupSelector {
        PriorityGroupSelector {
            route_id: Some(route_id.to_string()),
            ..PriorityGroupSelector::default()
        }
    }

    fn selector_on_mode(mode: TransitMode) -> PriorityGroupSelector {
        PriorityGroupSelector {
            mode: Some(mode),
            ..PriorityGroupSelector::default()
        }
    }

    #[test]
    fn unmatched_and_base_patterns_share_the_base_group() {
        let transit_layer = ModelBuilder::new("2024-05-01", "2024-05-01")
            .route("tram_route", |route| {
                route.mode = TransitMode::Tram;
            })
            .vj("bus_trip", |vj| {
                vj.st("A", "10:00:00").st("B", "10:30:00");
            })
            .vj("tram_trip", |vj| {
                vj.route("tram_route").st("C", "10:00:00").st("D", "10:30:00");
            })
            .build();

        let mut configurator = PriorityGroupConfigurator::new(
            &[selector_on_mode(TransitMode::Tram)],
            &[],
            &[],
        )
        .unwrap();

        let bus_pattern = transit_layer
            .trip(transit_layer.trip_idx("bus_trip").unwrap())
            .pattern;
        let tram_pattern = transit_layer
            .trip(transit_layer.trip_idx("tram_trip").unwrap())
            .pattern;
        // base tier matches without allocating
        assert_eq!(
            configurator
                .group_of_pattern(tram_pattern, &transit_layer)
                .unwrap(),
            BASE_PRIORITY_GROUP
        );
        // no selector matches, falls back to base
        assert_eq!(
            configurator
                .group_of_pattern(bus_pattern, &transit_layer)
                .unwrap(),
            BASE_PRIORITY_GROUP
        );
        assert_eq!(configurator.nb_of_allocated_groups(), 0);
    }

    #[test]
    fn a_per_agency_selector_allocates_one_id_per_agency() {
        let transit_layer = ModelBuilder::new("2024-05-01", "2024-05-01")
            .route("r1", |route| {
                route.agency_id = "agency_1".to_string();
            })
            .route("r2", |route| {
                route.agency_id = "agency_1".to_string();
            })
            .route("r3", |route| {
                route.agency_id = "agency_2".to_string();
            })
            .vj("t1", |vj| {
                vj.route("r1").st("A", "10:00:00").st("B", "10:30:00");
            })
            .vj("t2", |vj| {
                vj.route("r2").st("C", "10:00:00").st("D", "10:30:00");
            })
            .vj("t3", |vj| {
                vj.route("r3").st("E", "10:00:00").st("F", "10:30:00");
            })
            .build();

        let mut configurator = PriorityGroupConfigurator::new(
            &[],
            &[selector_on_mode(TransitMode::Bus)],
            &[],
        )
        .unwrap();

        let pattern_of = |trip_id: &str| {
            transit_layer
                .trip(transit_layer.trip_idx(trip_id).unwrap())
                .pattern
        };
        let first = configurator
            .group_of_pattern(pattern_of("t1"), &transit_layer)
            .unwrap();
        let second = configurator
            .group_of_pattern(pattern_of("t2"), &transit_layer)
            .unwrap();
        let third = configurator
            .group_of_pattern(pattern_of("t3"), &transit_layer)
            .unwrap();
        assert_eq!(first, 1);
        // same agency as t1, the id is reused
        assert_eq!(second, 1);
        // another agency gets the next bit
        assert_eq!(third, 2);
        assert_eq!(configurator.nb_of_allocated_groups(), 2);
    }

    #[test]
    fn a_global_selector_shares_one_id() {
        let transit_layer = ModelBuilder::new("2024-05-01", "2024-05-01")
            .route("r1", |route| {
                route.agency_id = "agency_1".to_string();
            })
            .route("r2", |route| {
                route.agency_id = "agency_2".to_string();
            })
            .vj("t1", |vj| {
                vj.route("r1").st("A", "10:00:00").st("B", "10:30:00");
            })
            .vj("t2", |vj| {
                vj.route("r2").st("C", "10:00:00").st("D", "10:30:00");
            })
            .build();

        let mut configurator = PriorityGroupConfigurator::new(
            &[],
            &[],
            &[selector_on_mode(TransitMode::Bus)],
        )
        .unwrap();

        let pattern_of = |trip_id: &str| {
            transit_layer
                .trip(transit_layer.trip_idx(trip_id).unwrap())
                .pattern
        };
        let first = configurator
            .group_of_pattern(pattern_of("t1"), &transit_layer)
            .unwrap();
        let second = configurator
            .group_of_pattern(pattern_of("t2"), &transit_layer)
            .unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 1);
        assert_eq!(configurator.nb_of_allocated_groups(), 1);
    }

    #[test]
    fn an_empty_selector_matches_nothing() {
        let transit_layer = ModelBuilder::new("2024-05-01", "2024-05-01")
            .vj("t1", |vj| {
                vj.st("A", "10:00:00").st("B", "10:30:00");
            })
            .build();

        let mut configurator =
            PriorityGroupConfigurator::new(&[], &[], &[PriorityGroupSelector::default()])
                .unwrap();
        let pattern = transit_layer
            .trip(transit_layer.trip_idx("t1").unwrap())
            .pattern;
        assert_eq!(
            configurator
                .group_of_pattern(pattern, &transit_layer)
                .unwrap(),
            BASE_PRIORITY_GROUP
        );
        assert_eq!(configurator.nb_of_allocated_groups(), 0);
    }

    #[test]
    fn the_33rd_group_overflows() {
        let mut builder = ModelBuilder::new("2024-05-01", "2024-05-01");
        for rank in 0..33 {
            let route_id = format!("r{}", rank);
            let trip_id = format!("t{}", rank);
            builder = builder
                .route(&route_id, |_route| {})
                .vj(&trip_id, |vj| {
                    vj.route(&route_id).st("A", "10:00:00").st("B", "10:30:00");
                });
        }
        let transit_layer = builder.build();

        let global_selectors: Vec<PriorityGroupSelector> = (0..33)
            .map(|rank| selector_on_route(&format!("r{}", rank)))
            .collect();
        let mut configurator =
            PriorityGroupConfigurator::new(&[], &[], &global_selectors).unwrap();

        for rank in 0..32 {
            let pattern = transit_layer
                .trip(transit_layer.trip_idx(&format!("t{}", rank)).unwrap())
                .pattern;
            let group_id = configurator
                .group_of_pattern(pattern, &transit_layer)
                .unwrap();
            assert_eq!(group_id, 1u32 << rank);
        }
        let pattern = transit_layer
            .trip(transit_layer.trip_idx("t32").unwrap())
            .pattern;
        let overflow = configurator.group_of_pattern(pattern, &transit_layer);
        assert!(matches!(overflow, Err(PriorityGroupError::GroupIdOverflow)));
    }
}
