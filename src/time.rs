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

use std::fmt::{Display, Formatter};

mod calendar;

pub use calendar::{day_offset, local_midnight, DayWindow, DayWindowError};

/// Duration in seconds since the "time zero" of a search request.
///
/// Time zero is an UTC instant chosen at request setup (usually midnight of
/// the first day of the search window). All times handed to the routing
/// engine are expressed on this axis, so that trips running on different
/// service dates become comparable. Values may be negative: the day window
/// can start before time zero.
#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct SecondsSinceTimeZero {
    seconds: i32,
}

/// A (positive) duration in seconds.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Ord, PartialOrd, Hash)]
pub struct PositiveDuration {
    pub(crate) seconds: u32,
}

// we allow one month of merged service dates, which is far more than the
// single-digit windows used in practice
pub const MAX_DAYS_IN_SEARCH_WINDOW: u16 = 31;

impl PositiveDuration {
    pub fn zero() -> Self {
        Self { seconds: 0 }
    }

    pub const fn from_seconds(seconds: u32) -> Self {
        Self { seconds }
    }

    pub const fn from_hms(hours: u32, minutes: u32, seconds: u32) -> PositiveDuration {
        let total_seconds = seconds + 60 * minutes + 60 * 60 * hours;
        PositiveDuration {
            seconds: total_seconds,
        }
    }

    pub fn total_seconds(&self) -> u32 {
        self.seconds
    }
}

impl Display for PositiveDuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let hours = self.seconds / (60 * 60);
        let minutes_in_secs = self.seconds % (60 * 60);
        let minutes = minutes_in_secs / 60;
        let seconds = minutes_in_secs % 60;
        if hours != 0 {
            write!(f, "{}h{:02}m{:02}s", hours, minutes, seconds)
        } else if minutes != 0 {
            write!(f, "{}m{:02}s", minutes, seconds)
        } else {
            write!(f, "{}s", seconds)
        }
    }
}

impl SecondsSinceTimeZero {
    pub fn from_seconds(seconds: i32) -> Self {
        Self { seconds }
    }

    pub fn seconds(&self) -> i32 {
        self.seconds
    }

    /// Time elapsed since `earlier`, or `None` if `self` is before `earlier`.
    pub fn duration_since(&self, earlier: &SecondsSinceTimeZero) -> Option<PositiveDuration> {
        let diff = i64::from(self.seconds) - i64::from(earlier.seconds);
        if diff < 0 {
            None
        } else {
            // diff is the difference of two i32, so it fits in u32
            Some(PositiveDuration {
                seconds: diff as u32,
            })
        }
    }
}

impl std::ops::Add for PositiveDuration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            seconds: self.seconds + rhs.seconds,
        }
    }
}

impl std::ops::Mul<u32> for PositiveDuration {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        PositiveDuration {
            seconds: self.seconds * rhs,
        }
    }
}

impl std::ops::Add<PositiveDuration> for SecondsSinceTimeZero {
    type Output = Self;

    fn add(self, rhs: PositiveDuration) -> Self::Output {
        Self {
            seconds: self.seconds + rhs.seconds as i32,
        }
    }
}

impl Display for SecondsSinceTimeZero {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let abs = i64::from(self.seconds).abs();
        let sign = if self.seconds < 0 { "-" } else { "" };
        write!(
            f,
            "{}{:02}:{:02}:{:02}",
            sign,
            abs / 60 / 60,
            abs / 60 % 60,
            abs % 60
        )
    }
}
