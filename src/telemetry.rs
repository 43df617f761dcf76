use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, trace};

/// Write-only instrumentation surface. Values are fire-and-forget; nothing in
/// the control path reads them back.
pub trait TelemetrySink {
    fn put_number(&mut self, key: &str, value: f64);
    fn put_flag(&mut self, key: &str, value: bool);
}

#[derive(Debug, Default)]
pub struct NullTelemetry;

impl TelemetrySink for NullTelemetry {
    fn put_number(&mut self, _key: &str, _value: f64) {}

    fn put_flag(&mut self, _key: &str, _value: bool) {}
}

#[derive(Debug, Default)]
pub struct LogTelemetry;

impl TelemetrySink for LogTelemetry {
    fn put_number(&mut self, key: &str, value: f64) {
        trace!("{key}={value}");
    }

    fn put_flag(&mut self, key: &str, value: bool) {
        trace!("{key}={value}");
    }
}

/// Keeps the latest value per key, for tests and end-of-run reports.
#[derive(Debug, Default)]
pub struct MemoryTelemetry {
    numbers: HashMap<String, f64>,
    flags: HashMap<String, bool>,
}

impl MemoryTelemetry {
    pub fn number(&self, key: &str) -> Option<f64> {
        self.numbers.get(key).copied()
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.flags.get(key).copied()
    }

    pub fn dump(&self) {
        debug!("Dumping telemetry:");
        let mut keys: Vec<_> = self.numbers.keys().collect();
        keys.sort();
        for key in keys {
            debug!("{key}={}", self.numbers[key]);
        }
        let mut keys: Vec<_> = self.flags.keys().collect();
        keys.sort();
        for key in keys {
            debug!("{key}={}", self.flags[key]);
        }
    }
}

impl TelemetrySink for MemoryTelemetry {
    fn put_number(&mut self, key: &str, value: f64) {
        self.numbers.insert(key.to_owned(), value);
    }

    fn put_flag(&mut self, key: &str, value: bool) {
        self.flags.insert(key.to_owned(), value);
    }
}

// Same trick as the HAL: hand a clone into the controller, keep one to read.
impl<T: TelemetrySink> TelemetrySink for Rc<RefCell<T>> {
    fn put_number(&mut self, key: &str, value: f64) {
        self.borrow_mut().put_number(key, value);
    }

    fn put_flag(&mut self, key: &str, value: bool) {
        self.borrow_mut().put_flag(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_sink_sees_latest_values() {
        let sink = Rc::new(RefCell::new(MemoryTelemetry::default()));
        let mut handle: Box<dyn TelemetrySink> = Box::new(sink.clone());
        handle.put_number("arm/speed", -1.0);
        handle.put_number("arm/speed", 0.8);
        handle.put_flag("arm/at_setpoint", false);

        assert_eq!(sink.borrow().number("arm/speed"), Some(0.8));
        assert_eq!(sink.borrow().flag("arm/at_setpoint"), Some(false));
        assert_eq!(sink.borrow().number("arm/setpoint"), None);
    }
}
