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

use std::sync::Arc;

use forseti::chrono::{TimeZone, Utc};
use forseti::models::TransitLayer;
use forseti::request::RequestInput;
use forseti::tracing::dispatcher::DefaultGuard;
use forseti::tracing::level_filters::LevelFilter;
use forseti::transfers::TransferIndex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[must_use]
pub fn init_test_logger() -> DefaultGuard {
    let default_level = LevelFilter::DEBUG;
    let rust_log =
        std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| default_level.to_string());
    let env_filter_subscriber = EnvFilter::try_new(rust_log).unwrap_or_else(|err| {
        eprintln!(
            "invalid {}, falling back to level '{}' - {}",
            EnvFilter::DEFAULT_ENV,
            default_level,
            err,
        );
        EnvFilter::new(default_level.to_string())
    });
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .with(env_filter_subscriber)
        .set_default()
}

/// A request at `hour`:00 UTC on the given day, with the default
/// options.
pub fn request_at(year: i32, month: u32, day: u32, hour: u32) -> RequestInput {
    let datetime = Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap();
    RequestInput::new(datetime)
}

pub fn compile_transfers(layer: &TransitLayer, request: &RequestInput) -> Arc<TransferIndex> {
    let index = TransferIndex::compile(layer.transfer_topology(), &request.street_options)
        .expect("the default street options are valid");
    Arc::new(index)
}
