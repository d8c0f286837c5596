//! Logger backend for unit tests of the SMBIOS discovery crates.
//!
//! Records are written to stdout so the test harness captures them per test.
//! The logger installs itself when the binary starts; tests that must not rely
//! on link-time registration call [`init`] directly.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
use std::{
    io::{self, Write},
    sync::Once,
};

use log::{LevelFilter, Log, Metadata, Record};

static INSTALL: Once = Once::new();
static LOGGER: TestLogger = TestLogger;

#[ctor::ctor]
fn install_test_logger() {
    init();
}

/// Registers [`TestLogger`] as the global logger at `Trace` level.
///
/// Safe to call any number of times; only the first call has an effect, and a
/// logger registered by someone else is left in place.
pub fn init() {
    INSTALL.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });
}

/// Writes every record as `[LEVEL target] message`.
pub struct TestLogger;

impl Log for TestLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        _ = writeln!(io::stdout(), "[{:<5} {}] {}", record.level(), record.target(), record.args());
    }

    fn flush(&self) {
        _ = io::stdout().flush()
    }
}
