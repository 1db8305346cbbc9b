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

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

use tracing::debug;

/// Canonical table for one kind of immutable value.
///
/// The first value inserted for a given structural content becomes the
/// canonical instance, and every later `intern` of an equal value returns
/// a clone of that same `Arc`.
///
/// Insertion is single-threaded (one table per schedule build), but the
/// `Arc`s handed out can be read concurrently afterwards.
#[derive(Debug)]
pub struct Interner<T: ?Sized + Eq + Hash> {
    table: HashSet<Arc<T>>,
}

impl<T: ?Sized + Eq + Hash> Interner<T> {
    pub fn new() -> Self {
        Self {
            table: HashSet::new(),
        }
    }

    /// Returns the canonical instance equal to `value`, if one exists.
    pub fn get(&self, value: &T) -> Option<Arc<T>> {
        self.table.get(value).cloned()
    }

    /// Makes `value` canonical if no equal value was interned before,
    /// and returns the canonical instance.
    pub fn intern(&mut self, value: Arc<T>) -> Arc<T> {
        match self.table.get(&value) {
            Some(canonical) => canonical.clone(),
            None => {
                self.table.insert(value.clone());
                value
            }
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Drops every canonical instance.
    ///
    /// Callers must ensure that the structures built from this table are
    /// being discarded as well, since previously returned `Arc`s keep
    /// their content alive but will no longer be canonical.
    pub fn clear(&mut self) {
        self.table.clear();
    }
}

impl<T: ?Sized + Eq + Hash> Default for Interner<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonical tables for the value kinds that repeat massively across the
/// trips of a schedule : time arrays, stop position arrays, flag masks,
/// headsigns.
///
/// Interning them makes thousands of trips with identical content share
/// one physical copy each.
#[derive(Debug, Default)]
pub struct Deduplicator {
    u32_arrays: Interner<[u32]>,
    u16_arrays: Interner<[u16]>,
    bool_arrays: Interner<[bool]>,
    strings: Interner<str>,
    string_arrays: Interner<[Option<Arc<str>>]>,
    nb_of_hits: usize,
    nb_of_misses: usize,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern_u32_array(&mut self, values: &[u32]) -> Arc<[u32]> {
        if let Some(canonical) = self.u32_arrays.get(values) {
            self.nb_of_hits += 1;
            return canonical;
        }
        self.nb_of_misses += 1;
        self.u32_arrays.intern(Arc::from(values))
    }

    pub fn intern_u16_array(&mut self, values: &[u16]) -> Arc<[u16]> {
        if let Some(canonical) = self.u16_arrays.get(values) {
            self.nb_of_hits += 1;
            return canonical;
        }
        self.nb_of_misses += 1;
        self.u16_arrays.intern(Arc::from(values))
    }

    pub fn intern_bool_array(&mut self, values: &[bool]) -> Arc<[bool]> {
        if let Some(canonical) = self.bool_arrays.get(values) {
            self.nb_of_hits += 1;
            return canonical;
        }
        self.nb_of_misses += 1;
        self.bool_arrays.intern(Arc::from(values))
    }

    pub fn intern_string(&mut self, value: &str) -> Arc<str> {
        if let Some(canonical) = self.strings.get(value) {
            self.nb_of_hits += 1;
            return canonical;
        }
        self.nb_of_misses += 1;
        self.strings.intern(Arc::from(value))
    }

    /// Interns a per-stop string array, interning each present element as
    /// well. A `None` element stands for "no value at this stop".
    pub fn intern_string_array(&mut self, values: &[Option<&str>]) -> Arc<[Option<Arc<str>>]> {
        let elements: Vec<Option<Arc<str>>> = values
            .iter()
            .map(|has_value| has_value.map(|value| self.intern_string(value)))
            .collect();
        if let Some(canonical) = self.string_arrays.get(elements.as_slice()) {
            self.nb_of_hits += 1;
            return canonical;
        }
        self.nb_of_misses += 1;
        self.string_arrays.intern(Arc::from(elements))
    }

    /// Total number of canonical instances, over all tables.
    pub fn nb_of_interned_values(&self) -> usize {
        self.u32_arrays.len()
            + self.u16_arrays.len()
            + self.bool_arrays.len()
            + self.strings.len()
            + self.string_arrays.len()
    }

    /// Interning requests that returned an already canonical instance.
    pub fn nb_of_hits(&self) -> usize {
        self.nb_of_hits
    }

    /// Interning requests that made their value canonical.
    pub fn nb_of_misses(&self) -> usize {
        self.nb_of_misses
    }

    /// Clears all canonical tables and counters. To be called only when
    /// the owning schedule is being discarded or rebuilt.
    pub fn reset(&mut self) {
        debug!(
            "Dropping {} interned values, after {} hits and {} misses.",
            self.nb_of_interned_values(),
            self.nb_of_hits,
            self.nb_of_misses
        );
        self.u32_arrays.clear();
        self.u16_arrays.clear();
        self.bool_arrays.clear();
        self.strings.clear();
        self.string_arrays.clear();
        self.nb_of_hits = 0;
        self.nb_of_misses = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_interned_value_is_canonical() {
        let mut deduplicator = Deduplicator::new();
        let first = deduplicator.intern_u32_array(&[100, 200, 300]);
        let second = deduplicator.intern_u32_array(&[100, 200, 300]);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(deduplicator.nb_of_interned_values(), 1);
    }

    #[test]
    fn different_values_get_different_instances() {
        let mut deduplicator = Deduplicator::new();
        let first = deduplicator.intern_u32_array(&[100, 200]);
        let second = deduplicator.intern_u32_array(&[100, 201]);
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(deduplicator.nb_of_interned_values(), 2);
    }

    #[test]
    fn string_array_elements_are_interned_too() {
        let mut deduplicator = Deduplicator::new();
        let headsign = deduplicator.intern_string("Porte de Clignancourt");
        let array = deduplicator.intern_string_array(&[Some("Porte de Clignancourt"), None]);
        let element = array[0].as_ref().unwrap();
        assert!(Arc::ptr_eq(&headsign, element));
        assert!(array[1].is_none());
    }

    #[test]
    fn hits_and_misses_are_counted() {
        let mut deduplicator = Deduplicator::new();
        deduplicator.intern_u32_array(&[1, 2, 3]);
        assert_eq!(deduplicator.nb_of_hits(), 0);
        assert_eq!(deduplicator.nb_of_misses(), 1);

        deduplicator.intern_u32_array(&[1, 2, 3]);
        assert_eq!(deduplicator.nb_of_hits(), 1);
        assert_eq!(deduplicator.nb_of_misses(), 1);

        deduplicator.reset();
        assert_eq!(deduplicator.nb_of_hits(), 0);
        assert_eq!(deduplicator.nb_of_misses(), 0);
    }

    #[test]
    fn reset_clears_all_tables() {
        let mut deduplicator = Deduplicator::new();
        let before = deduplicator.intern_u32_array(&[1, 2, 3]);
        deduplicator.intern_string("somewhere");
        deduplicator.reset();
        assert_eq!(deduplicator.nb_of_interned_values(), 0);

        // previously returned values stay alive, but a re-insertion
        // after reset yields a fresh canonical instance
        let after = deduplicator.intern_u32_array(&[1, 2, 3]);
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(&*before, &*after);
    }

    #[test]
    fn generic_interner_accepts_any_hashable_kind() {
        let mut interner: Interner<(u32, u32)> = Interner::new();
        let first = interner.intern(Arc::new((7, 12)));
        let second = interner.intern(Arc::new((7, 12)));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(interner.len(), 1);
    }
}
