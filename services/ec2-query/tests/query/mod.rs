use std::sync::{Mutex, OnceLock};

use log::{LevelFilter, Log, Metadata, Record};

mod live;
mod mock;
mod send;

/// Logger that forwards to env_logger and keeps every record for inspection.
struct CaptureLogger {
    inner: env_logger::Logger,
    records: Mutex<Vec<String>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.records
            .lock()
            .expect("lock poisoned")
            .push(record.args().to_string());
        self.inner.log(record);
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

static LOGGER: OnceLock<&'static CaptureLogger> = OnceLock::new();

fn logger() -> &'static CaptureLogger {
    LOGGER.get_or_init(|| {
        let logger: &'static CaptureLogger = Box::leak(Box::new(CaptureLogger {
            inner: env_logger::builder().is_test(true).build(),
            records: Mutex::new(Vec::new()),
        }));
        if log::set_logger(logger).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
        logger
    })
}

/// Install the test logger once per test binary.
pub fn init_logger() {
    logger();
}

/// Captured log lines containing `needle`.
pub fn logged_lines(needle: &str) -> Vec<String> {
    logger()
        .records
        .lock()
        .expect("lock poisoned")
        .iter()
        .filter(|line| line.contains(needle))
        .cloned()
        .collect()
}
