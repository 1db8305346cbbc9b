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

use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

use crate::models::TransitMode;
use crate::time::PositiveDuration;

/// Generalized cost, in centi-seconds of equivalent travel time.
///
/// The centi-second resolution keeps reluctance multipliers meaningful
/// without floating point in the comparison-heavy paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Cost {
    pub centi_seconds: i64,
}

impl Cost {
    pub const fn zero() -> Self {
        Self { centi_seconds: 0 }
    }

    pub const fn from_seconds(seconds: i64) -> Self {
        Self {
            centi_seconds: seconds * 100,
        }
    }

    pub fn as_seconds(&self) -> i64 {
        self.centi_seconds / 100
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, other: Cost) -> Cost {
        Cost {
            centi_seconds: self.centi_seconds + other.centi_seconds,
        }
    }
}

impl std::iter::Sum for Cost {
    fn sum<I: Iterator<Item = Cost>>(iter: I) -> Cost {
        iter.fold(Cost::zero(), Add::add)
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:02}",
            self.centi_seconds / 100,
            (self.centi_seconds % 100).abs()
        )
    }
}

pub const DEFAULT_BOARD_COST: u32 = 600;
pub const DEFAULT_TRANSFER_COST: u32 = 120;
pub const DEFAULT_WAIT_RELUCTANCE: f64 = 1.0;
pub const DEFAULT_TRANSIT_RELUCTANCE: f64 = 1.0;
pub const DEFAULT_STREET_RELUCTANCE: f64 = 2.0;

fn default_board_cost() -> u32 {
    DEFAULT_BOARD_COST
}

fn default_transfer_cost() -> u32 {
    DEFAULT_TRANSFER_COST
}

fn default_wait_reluctance() -> f64 {
    DEFAULT_WAIT_RELUCTANCE
}

fn default_transit_reluctance() -> f64 {
    DEFAULT_TRANSIT_RELUCTANCE
}

fn default_street_reluctance() -> f64 {
    DEFAULT_STREET_RELUCTANCE
}

/// Reluctance override for one transit mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeReluctance {
    pub mode: TransitMode,
    pub reluctance: f64,
}

/// The injected weights of the generalized cost function. The concrete
/// values come from the request; only the shape is fixed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostParams {
    /// fixed cost applied once per boarding, in seconds
    #[serde(default = "default_board_cost")]
    pub board_cost: u32,

    /// fixed cost applied once per transfer, in seconds
    #[serde(default = "default_transfer_cost")]
    pub transfer_cost: u32,

    /// multiplier on time spent waiting for a vehicle
    #[serde(default = "default_wait_reluctance")]
    pub wait_reluctance: f64,

    /// multiplier on time spent on board
    #[serde(default = "default_transit_reluctance")]
    pub transit_reluctance: f64,

    /// multiplier on time spent on the street network
    #[serde(default = "default_street_reluctance")]
    pub street_reluctance: f64,

    /// per-mode multipliers replacing `transit_reluctance`
    #[serde(default)]
    pub mode_reluctances: Vec<ModeReluctance>,
}

impl Default for CostParams {
    fn default() -> Self {
        Self {
            board_cost: default_board_cost(),
            transfer_cost: default_transfer_cost(),
            wait_reluctance: default_wait_reluctance(),
            transit_reluctance: default_transit_reluctance(),
            street_reluctance: default_street_reluctance(),
            mode_reluctances: Vec::new(),
        }
    }
}

/// Pure generalized-cost functions bound to one request's parameters.
#[derive(Debug, Clone)]
pub struct CostCalculator {
    params: CostParams,
}

impl CostCalculator {
    pub fn new(params: CostParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &CostParams {
        &self.params
    }

    fn transit_reluctance_for(&self, mode: TransitMode) -> f64 {
        self.params
            .mode_reluctances
            .iter()
            .find(|override_| override_.mode == mode)
            .map(|override_| override_.reluctance)
            .unwrap_or(self.params.transit_reluctance)
    }

    /// Cost of one boarding, including the fixed board cost and the wait
    /// before departure.
    pub fn board_cost(&self, wait: PositiveDuration) -> Cost {
        let wait_cost = wait.total_seconds() as f64 * self.params.wait_reluctance;
        Cost::from_seconds(self.params.board_cost as i64)
            + Cost {
                centi_seconds: (wait_cost * 100.0).round() as i64,
            }
    }

    pub fn transfer_cost(&self) -> Cost {
        Cost::from_seconds(self.params.transfer_cost as i64)
    }

    /// Cost of `duration` spent on board a vehicle of `mode`.
    pub fn in_vehicle_cost(&self, duration: PositiveDuration, mode: TransitMode) -> Cost {
        let weighted = duration.total_seconds() as f64 * self.transit_reluctance_for(mode);
        Cost {
            centi_seconds: (weighted * 100.0).round() as i64,
        }
    }

    /// Cost of `duration` spent walking, cycling or driving between stops.
    pub fn street_cost(&self, duration: PositiveDuration) -> Cost {
        let weighted = duration.total_seconds() as f64 * self.params.street_reluctance;
        Cost {
            centi_seconds: (weighted * 100.0).round() as i64,
        }
    }
}
