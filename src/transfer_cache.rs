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

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tracing::debug;

use crate::request::StreetOptions;
use crate::transfers::{TransferCompileError, TransferIndex, TransferTopology};

pub const DEFAULT_TRANSFER_CACHE_CAPACITY: u64 = 25;

/// Wraps an `Arc` so that equality and hashing use the pointer, not the
/// pointee.
///
/// The transfer topology never changes for a given static schedule
/// build, so two requests hitting the same in-memory instance may share
/// a compiled index, while a rebuilt topology (a new instance) must
/// not reuse stale entries even when it happens to be structurally
/// equal.
#[derive(Debug)]
pub struct ByIdentity<T>(Arc<T>);

impl<T> ByIdentity<T> {
    pub fn new(inner: Arc<T>) -> Self {
        Self(inner)
    }
}

// Not derived: the derive would bound `T: Clone`, but cloning only bumps
// the `Arc` refcount.
impl<T> Clone for ByIdentity<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> PartialEq for ByIdentity<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Eq for ByIdentity<T> {}

impl<T> Hash for ByIdentity<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TransferCacheKey {
    topology: ByIdentity<TransferTopology>,
    options: StreetOptions,
}

#[derive(Debug, Clone)]
pub enum TransferCacheError {
    Compilation(Arc<TransferCompileError>),
}

impl Display for TransferCacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferCacheError::Compilation(source) => {
                write!(f, "Failed to compile a transfer index : {}", source)
            }
        }
    }
}

impl Error for TransferCacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TransferCacheError::Compilation(source) => Some(source.as_ref()),
        }
    }
}

/// Caches compiled transfer indices per (topology instance, street
/// options) pair.
///
/// Concurrent requests for the same key block on a single compilation.
/// A failed compilation is reported to every waiter and not stored, so
/// the next request retries it.
pub struct TransferCache {
    cache: moka::sync::Cache<TransferCacheKey, Arc<TransferIndex>>,
}

impl TransferCache {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            cache: moka::sync::Cache::builder()
                .max_capacity(max_capacity)
                .build(),
        }
    }

    pub fn get(
        &self,
        topology: &Arc<TransferTopology>,
        options: &StreetOptions,
    ) -> Result<Arc<TransferIndex>, TransferCacheError> {
        let key = TransferCacheKey {
            topology: ByIdentity::new(Arc::clone(topology)),
            options: options.clone(),
        };
        self.cache
            .try_get_with(key, || {
                debug!(
                    "Compiling a transfer index for {} stops and {} edges",
                    topology.nb_of_stops(),
                    topology.edges().len()
                );
                TransferIndex::compile(topology, options).map(Arc::new)
            })
            .map_err(TransferCacheError::Compilation)
    }
}

impl Default for TransferCache {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSFER_CACHE_CAPACITY)
    }
}
