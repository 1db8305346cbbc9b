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

mod utils;

use anyhow::Error;
use forseti::filters::TransitFilter;
use forseti::models::{ModelBuilder, TransitMode};
use forseti::transit_data::{RequestTransitData, TransitData, TransitDataError, TransitDataIters};
use utils::{compile_transfers, init_test_logger, request_at};

#[test]
fn test_multi_day_assembly() -> Result<(), Error> {
    let _log_guard = init_test_logger();

    let layer = ModelBuilder::new("2024-05-01", "2024-05-05")
        .calendar("c1", &["2024-05-01", "2024-05-02", "2024-05-03"])
        .vj("morning", |vj| {
            vj.calendar("c1").st("A", "08:00:00").st("B", "08:30:00");
        })
        .build();

    let request = request_at(2024, 5, 2, 9);
    let transfers = compile_transfers(&layer, &request);
    let data = RequestTransitData::new(&layer, transfers, &request)?;

    // one pattern carrying the three running days of the window
    assert_eq!(data.nb_of_patterns(), 1);
    let pattern = data.pattern_at(0);
    assert_eq!(pattern.nb_of_days(), 3);
    assert_eq!(pattern.nb_of_trips(), 3);

    // the same departure, one day apart each
    let day_one = pattern.departure_time(0, 0);
    let day_two = pattern.departure_time(1, 0);
    assert_eq!(day_one.seconds(), 8 * 60 * 60);
    assert_eq!(day_two.seconds() - day_one.seconds(), 24 * 60 * 60);

    // the valid window covers the three days and contains the request
    let (valid_start, valid_end) = data.valid_window();
    assert_eq!(valid_start.seconds(), 0);
    assert_eq!(valid_end.seconds(), 3 * 24 * 60 * 60);
    let request_time = data.request_time();
    assert!(valid_start <= request_time && request_time < valid_end);
    Ok(())
}

#[test]
fn test_route_filter_keeps_only_matching_patterns() -> Result<(), Error> {
    let _log_guard = init_test_logger();

    let layer = ModelBuilder::new("2024-05-01", "2024-05-01")
        .route("metro", |route| {
            route.mode = TransitMode::Subway;
        })
        .route("bus", |route| {
            route.mode = TransitMode::Bus;
        })
        .vj("m1", |vj| {
            vj.route("metro").st("A", "08:00:00").st("B", "08:10:00");
        })
        .vj("b1", |vj| {
            vj.route("bus").st("A", "08:00:00").st("C", "08:40:00");
        })
        .build();

    let mut request = request_at(2024, 5, 1, 9);
    request.transit_filters = vec![TransitFilter {
        route_id: Some("metro".to_string()),
        ..TransitFilter::default()
    }];

    let transfers = compile_transfers(&layer, &request);
    let data = RequestTransitData::new(&layer, transfers, &request)?;

    assert_eq!(data.nb_of_patterns(), 1);
    assert_eq!(data.pattern_at(0).mode(), TransitMode::Subway);
    Ok(())
}

#[test]
fn test_banned_trip_is_dropped_from_its_pattern() -> Result<(), Error> {
    let _log_guard = init_test_logger();

    let layer = ModelBuilder::new("2024-05-01", "2024-05-01")
        .vj("early", |vj| {
            vj.st("A", "08:00:00").st("B", "08:30:00");
        })
        .vj("late", |vj| {
            vj.st("A", "09:00:00").st("B", "09:30:00");
        })
        .build();

    let mut request = request_at(2024, 5, 1, 7);
    request.banned_trips = vec!["early".to_string()];

    let transfers = compile_transfers(&layer, &request);
    let data = RequestTransitData::new(&layer, transfers, &request)?;

    assert_eq!(data.nb_of_patterns(), 1);
    let pattern = data.pattern_at(0);
    assert_eq!(pattern.nb_of_trips(), 1);
    let survivor = pattern.trip_times(0).trip();
    assert_eq!(layer.trip(survivor).id, "late");
    Ok(())
}

#[test]
fn test_transfers_are_reachable_through_the_request_data() -> Result<(), Error> {
    let _log_guard = init_test_logger();

    let layer = ModelBuilder::new("2024-05-01", "2024-05-01")
        .vj("m1", |vj| {
            vj.st("A", "08:00:00").st("B", "08:10:00");
        })
        .vj("b1", |vj| {
            vj.st("C", "08:30:00").st("D", "08:50:00");
        })
        .transfer("B", "C", 133.0)
        .build();

    let request = request_at(2024, 5, 1, 7);
    let transfers = compile_transfers(&layer, &request);
    let data = RequestTransitData::new(&layer, transfers, &request)?;

    let stop_b = layer.stop_idx("B").unwrap();
    let stop_c = layer.stop_idx("C").unwrap();

    let outgoing: Vec<_> = data.transfers_from(stop_b).collect();
    assert_eq!(outgoing.len(), 1);
    assert_eq!(outgoing[0].to_stop, stop_c);
    // 133 meters at the default walking speed of 1.33 m/s
    assert_eq!(outgoing[0].duration.total_seconds(), 100);

    let incoming: Vec<_> = data.transfers_to(stop_c).collect();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].from_stop, stop_b);
    Ok(())
}

#[test]
fn test_patterns_touching_spans_every_route_at_the_stop() -> Result<(), Error> {
    let _log_guard = init_test_logger();

    let layer = ModelBuilder::new("2024-05-01", "2024-05-01")
        .route("metro", |route| {
            route.mode = TransitMode::Subway;
        })
        .vj("m1", |vj| {
            vj.route("metro").st("A", "08:00:00").st("B", "08:10:00");
        })
        .vj("b1", |vj| {
            vj.st("B", "08:30:00").st("C", "08:50:00");
        })
        .build();

    let request = request_at(2024, 5, 1, 7);
    let transfers = compile_transfers(&layer, &request);
    let data = RequestTransitData::new(&layer, transfers, &request)?;

    let stop_b = layer.stop_idx("B").unwrap();
    let touching: Vec<_> = data.patterns_touching(&[stop_b]).collect();
    assert_eq!(touching.len(), 2);

    let stop_a = layer.stop_idx("A").unwrap();
    let only_metro: Vec<_> = data.patterns_touching(&[stop_a]).collect();
    assert_eq!(only_metro.len(), 1);
    assert_eq!(only_metro[0].mode(), TransitMode::Subway);
    Ok(())
}

#[test]
fn test_a_request_outside_the_validity_period_is_rejected() {
    let _log_guard = init_test_logger();

    let layer = ModelBuilder::new("2024-05-01", "2024-05-05")
        .vj("m1", |vj| {
            vj.st("A", "08:00:00").st("B", "08:10:00");
        })
        .build();

    let request = request_at(2025, 1, 15, 9);
    let transfers = compile_transfers(&layer, &request);
    let result = RequestTransitData::new(&layer, transfers, &request);

    assert!(matches!(result, Err(TransitDataError::DayWindow(_))));
}
