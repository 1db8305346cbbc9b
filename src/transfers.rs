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
use std::fmt;

use tracing::debug;

use crate::cost::Cost;
use crate::models::StopIdx;
use crate::request::{StreetMode, StreetOptions};
use crate::time::PositiveDuration;

/// A candidate street path between two stops, as produced by the street
/// graph builder. Durations and costs are not resolved here since they
/// depend on the request's street options.
#[derive(Debug, Clone)]
pub struct TransferEdge {
    pub from_stop: StopIdx,
    pub to_stop: StopIdx,
    /// street path length in meters
    pub distance: f64,
    pub walk_viable: bool,
    pub bike_viable: bool,
    pub wheelchair_viable: bool,
    /// steepest gradient along the path
    pub max_slope: f64,
    pub has_stairs: bool,
    pub has_elevator: bool,
}

/// All candidate street paths of one transit layer build.
///
/// Never modified once built; the transfer cache compares topologies by
/// in-memory identity, not by content.
#[derive(Debug, Default)]
pub struct TransferTopology {
    nb_of_stops: usize,
    edges: Vec<TransferEdge>,
}

impl TransferTopology {
    pub fn new(nb_of_stops: usize, edges: Vec<TransferEdge>) -> Self {
        Self { nb_of_stops, edges }
    }

    pub fn nb_of_stops(&self) -> usize {
        self.nb_of_stops
    }

    pub fn edges(&self) -> &[TransferEdge] {
        &self.edges
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransferIdx {
    pub idx: usize, // position in TransferIndex.transfers
}

/// A street path compiled for one set of street options.
#[derive(Debug, Clone)]
pub struct Transfer {
    pub from_stop: StopIdx,
    pub to_stop: StopIdx,
    pub duration: PositiveDuration,
    pub cost: Cost,
    /// position of the source edge in the topology, when the transfer
    /// comes from an actual street path
    pub source_edge: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransferCompileError {
    NonPositiveSpeed { mode: StreetMode, speed: f64 },
}

impl std::error::Error for TransferCompileError {}

impl fmt::Display for TransferCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferCompileError::NonPositiveSpeed { mode, speed } => write!(
                f,
                "cannot compile transfers with a non positive speed {} for street mode {:?}",
                speed, mode
            ),
        }
    }
}

#[derive(Debug, Default)]
struct StopTransfersData {
    outgoing: Vec<TransferIdx>,
    incoming: Vec<TransferIdx>,
}

/// Per-stop adjacency of compiled transfers for one (topology, street
/// options) pair. Shared between all requests with equal street options.
#[derive(Debug)]
pub struct TransferIndex {
    transfers: Vec<Transfer>,
    stops_data: Vec<StopTransfersData>,
}

impl TransferIndex {
    /// Resolves durations and generalized costs of every viable edge.
    ///
    /// Transfers are walked, unless the whole journey is cycled in which
    /// case they are ridden. When several edges link the same stop pair,
    /// only the cheapest compiled one is kept.
    pub fn compile(
        topology: &TransferTopology,
        options: &StreetOptions,
    ) -> Result<Self, TransferCompileError> {
        let rides_a_bike = options.mode == StreetMode::Bike;
        let (speed, reluctance) = if rides_a_bike {
            (options.bike_speed.0, options.bike_reluctance.0)
        } else {
            (options.walk_speed.0, options.walk_reluctance.0)
        };
        if speed <= 0.0 {
            return Err(TransferCompileError::NonPositiveSpeed {
                mode: options.mode,
                speed,
            });
        }

        let mut transfers: Vec<Transfer> = Vec::new();
        let mut best_by_pair: HashMap<(StopIdx, StopIdx), usize> = HashMap::new();
        let mut nb_of_skipped_edges = 0usize;

        for (edge_idx, edge) in topology.edges().iter().enumerate() {
            let viable = if rides_a_bike {
                edge.bike_viable
            } else {
                edge.walk_viable
            };
            if !viable {
                nb_of_skipped_edges += 1;
                continue;
            }
            if options.wheelchair
                && (!edge.wheelchair_viable || edge.max_slope > options.max_wheelchair_slope.0)
            {
                nb_of_skipped_edges += 1;
                continue;
            }

            let seconds = (edge.distance / speed).round() as u32;
            let duration = PositiveDuration::from_seconds(seconds);

            let mut weighted = seconds as f64 * reluctance;
            if edge.has_stairs {
                weighted *= options.stairs_reluctance.0;
            }
            let mut cost = Cost {
                centi_seconds: (weighted * 100.0).round() as i64,
            };
            if edge.has_elevator {
                cost = cost + Cost::from_seconds(options.elevator_cost as i64);
            }

            let transfer = Transfer {
                from_stop: edge.from_stop,
                to_stop: edge.to_stop,
                duration,
                cost,
                source_edge: Some(edge_idx),
            };

            match best_by_pair.get(&(edge.from_stop, edge.to_stop)) {
                Some(existing_pos) => {
                    if transfer.cost < transfers[*existing_pos].cost {
                        transfers[*existing_pos] = transfer;
                    }
                    nb_of_skipped_edges += 1;
                }
                None => {
                    best_by_pair.insert((edge.from_stop, edge.to_stop), transfers.len());
                    transfers.push(transfer);
                }
            }
        }

        let mut stops_data: Vec<StopTransfersData> = Vec::with_capacity(topology.nb_of_stops());
        for _ in 0..topology.nb_of_stops() {
            stops_data.push(StopTransfersData::default());
        }
        for (pos, transfer) in transfers.iter().enumerate() {
            let transfer_idx = TransferIdx { idx: pos };
            stops_data[transfer.from_stop.idx].outgoing.push(transfer_idx);
            stops_data[transfer.to_stop.idx].incoming.push(transfer_idx);
        }

        debug!(
            "Compiled {} transfers from {} edges, {} edges skipped.",
            transfers.len(),
            topology.edges().len(),
            nb_of_skipped_edges
        );

        Ok(Self {
            transfers,
            stops_data,
        })
    }

    pub fn nb_of_transfers(&self) -> usize {
        self.transfers.len()
    }

    pub fn transfer(&self, transfer_idx: TransferIdx) -> &Transfer {
        &self.transfers[transfer_idx.idx]
    }

    pub fn outgoing_transfers_at(&self, stop: StopIdx) -> TransfersAtStop<'_> {
        TransfersAtStop {
            index: self,
            inner: self.stops_data[stop.idx].outgoing.iter(),
        }
    }

    pub fn incoming_transfers_at(&self, stop: StopIdx) -> TransfersAtStop<'_> {
        TransfersAtStop {
            index: self,
            inner: self.stops_data[stop.idx].incoming.iter(),
        }
    }
}

pub struct TransfersAtStop<'data> {
    index: &'data TransferIndex,
    inner: std::slice::Iter<'data, TransferIdx>,
}

impl<'data> Iterator for TransfersAtStop<'data> {
    type Item = &'data Transfer;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|transfer_idx| self.index.transfer(*transfer_idx))
    }
}

impl<'data> ExactSizeIterator for TransfersAtStop<'data> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}
