// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use clap::Parser;
use tracing::{error, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fake_dri::cli::Cli;
use fake_dri::generator::generate;
use fake_dri::options::validate;

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let raw = match cli.load_raw() {
        Ok(raw) => raw,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let options = match validate(raw).into_options(cli.validation_policy()) {
        Ok(options) => options,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let ctx = cli.run_context(options);
    match generate(&ctx) {
        Ok(report) => {
            if !report.is_complete() {
                error!(
                    "{} build step(s) failed, the fake tree is incomplete",
                    report.failures().count()
                );
                if report
                    .failures()
                    .any(|o| o.result.as_ref().is_err_and(|e| e.is_permission_denied()))
                {
                    warn!("Device nodes need root or CAP_MKNOD");
                }
            }
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}
