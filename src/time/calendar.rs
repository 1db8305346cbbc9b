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

use std::convert::TryFrom;
use std::fmt;

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use super::{SecondsSinceTimeZero, MAX_DAYS_IN_SEARCH_WINDOW};

/// The consecutive service dates a request wants merged into its transit
/// view, `reference_date - slack_before ..= reference_date + slack_after`,
/// restricted to the validity period of the transit layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayWindow {
    first_date: NaiveDate, // first date (included) of the window
    last_date: NaiveDate,  // last date (included) of the window
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayWindowError {
    /// The requested window does not intersect the validity period of the
    /// transit layer at all.
    OutsideValidityPeriod {
        requested_first: NaiveDate,
        requested_last: NaiveDate,
        valid_first: NaiveDate,
        valid_last: NaiveDate,
    },
}

impl std::error::Error for DayWindowError {}

impl fmt::Display for DayWindowError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DayWindowError::OutsideValidityPeriod {
                requested_first,
                requested_last,
                valid_first,
                valid_last,
            } => write!(
                f,
                "the requested dates [{}, {}] are outside the validity period [{}, {}] of the data",
                requested_first, requested_last, valid_first, valid_last
            ),
        }
    }
}

impl DayWindow {
    /// Panics if the resulting window would be longer than
    /// [`MAX_DAYS_IN_SEARCH_WINDOW`]. The slacks come from configuration,
    /// which is validated upstream.
    pub fn new(reference_date: NaiveDate, slack_before: u16, slack_after: u16) -> Self {
        let nb_of_days = u32::from(slack_before) + u32::from(slack_after) + 1;
        assert!(
            nb_of_days <= u32::from(MAX_DAYS_IN_SEARCH_WINDOW),
            "Trying to construct a day window of {} days \
            which is more than the maximum allowed of {} days",
            nb_of_days,
            MAX_DAYS_IN_SEARCH_WINDOW
        );
        Self {
            first_date: reference_date - Duration::days(i64::from(slack_before)),
            last_date: reference_date + Duration::days(i64::from(slack_after)),
        }
    }

    /// Restrict the window to `[valid_first, valid_last]`.
    ///
    /// Errors when the intersection is empty, so that the caller can report
    /// "no data for these dates" instead of silently searching nothing.
    pub fn restrict_to(
        &self,
        valid_first: NaiveDate,
        valid_last: NaiveDate,
    ) -> Result<DayWindow, DayWindowError> {
        let first_date = self.first_date.max(valid_first);
        let last_date = self.last_date.min(valid_last);
        if first_date > last_date {
            return Err(DayWindowError::OutsideValidityPeriod {
                requested_first: self.first_date,
                requested_last: self.last_date,
                valid_first,
                valid_last,
            });
        }
        Ok(DayWindow {
            first_date,
            last_date,
        })
    }

    pub fn first_date(&self) -> NaiveDate {
        self.first_date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.last_date
    }

    pub fn nb_of_days(&self) -> u16 {
        // safe because new() refuses windows longer than MAX_DAYS_IN_SEARCH_WINDOW
        ((self.last_date - self.first_date).num_days() + 1) as u16
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first_date <= date && date <= self.last_date
    }

    /// All dates of the window in ascending order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..i64::from(self.nb_of_days())).map(move |day| self.first_date + Duration::days(day))
    }
}

/// The first valid local instant of `date` in `timezone`.
///
/// This is 00:00:00 local time, except on dates where a daylight saving
/// jump makes midnight non-existent, in which case the earliest instant
/// that does exist on that date is returned.
pub fn local_midnight(timezone: &Tz, date: NaiveDate) -> DateTime<Tz> {
    let naive_midnight = date.and_time(NaiveTime::MIN);
    match timezone.from_local_datetime(&naive_midnight) {
        LocalResult::Single(datetime) => datetime,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            // midnight falls inside a daylight saving gap; probe forward in
            // 15 minute steps until we reach a local time that exists
            let mut probe = naive_midnight;
            loop {
                probe += Duration::minutes(15);
                match timezone.from_local_datetime(&probe) {
                    LocalResult::Single(datetime) => return datetime,
                    LocalResult::Ambiguous(earliest, _) => return earliest,
                    LocalResult::None => continue,
                }
            }
        }
    }
}

/// Seconds from `time_zero` to the local midnight of `date` in `timezone`.
///
/// Returns `None` if the offset does not fit in an `i32`, which cannot
/// happen for dates within a valid search window.
pub fn day_offset(
    time_zero: &DateTime<Utc>,
    timezone: &Tz,
    date: NaiveDate,
) -> Option<SecondsSinceTimeZero> {
    let midnight = local_midnight(timezone, date);
    let offset_i64 = midnight.timestamp() - time_zero.timestamp();
    let seconds = i32::try_from(offset_i64).ok()?;
    Some(SecondsSinceTimeZero::from_seconds(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_dates_are_ascending_and_inclusive() {
        let reference = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let window = DayWindow::new(reference, 1, 2);
        let dates: Vec<_> = window.dates().collect();
        assert_eq!(dates.len(), 4);
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(dates[3], NaiveDate::from_ymd_opt(2024, 5, 4).unwrap());
        assert_eq!(window.nb_of_days(), 4);
    }

    #[test]
    fn zero_slack_window_has_one_date() {
        let reference = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let window = DayWindow::new(reference, 0, 0);
        assert_eq!(window.dates().count(), 1);
        assert!(window.contains(reference));
    }

    #[test]
    fn restrict_to_validity_period() {
        let reference = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let window = DayWindow::new(reference, 2, 2);
        let restricted = window
            .restrict_to(
                NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            )
            .unwrap();
        assert_eq!(
            restricted.first_date(),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
        );
        assert_eq!(
            restricted.last_date(),
            NaiveDate::from_ymd_opt(2024, 5, 4).unwrap()
        );

        let disjoint = window.restrict_to(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
        );
        assert!(disjoint.is_err());
    }

    #[test]
    fn day_offset_in_utc() {
        let time_zero = Utc
            .with_ymd_and_hms(2024, 5, 1, 0, 0, 0)
            .single()
            .unwrap();
        let offset = day_offset(
            &time_zero,
            &chrono_tz::UTC,
            NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
        )
        .unwrap();
        assert_eq!(offset.seconds(), 2 * 24 * 60 * 60);
    }

    #[test]
    fn day_offset_crosses_daylight_saving() {
        // Europe/Paris switches to summer time on 2024-03-31 at 02:00,
        // so that day only lasts 23 hours
        let time_zero = Utc
            .with_ymd_and_hms(2024, 3, 30, 23, 0, 0)
            .single()
            .unwrap(); // midnight 2024-03-31 in Paris
        let offset = day_offset(
            &time_zero,
            &chrono_tz::Europe::Paris,
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
        )
        .unwrap();
        assert_eq!(offset.seconds(), 23 * 60 * 60);
    }
}
