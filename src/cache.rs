//! Time-bounded cache for directory listings (catalogs, principals) served
//! by the web UI, so browsing the chat page does not hammer the workspace.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct TtlCell<T> {
    value: Option<(Instant, T)>,
    ttl: Duration,
}

impl<T: Clone> TtlCell<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { value: None, ttl }
    }

    /// The cached value, if one was stored within the TTL.
    pub fn get(&self) -> Option<T> {
        match &self.value {
            Some((stored_at, value)) if stored_at.elapsed() < self.ttl => Some(value.clone()),
            _ => None,
        }
    }

    pub fn put(&mut self, value: T) {
        self.value = Some((Instant::now(), value));
    }

    pub fn invalidate(&mut self) {
        self.value = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_value_is_returned() {
        let mut cell = TtlCell::new(Duration::from_secs(600));
        assert!(cell.get().is_none());
        cell.put(vec!["main".to_string(), "sales".to_string()]);
        assert_eq!(cell.get().unwrap().len(), 2);
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let mut cell = TtlCell::new(Duration::ZERO);
        cell.put(1u32);
        assert!(cell.get().is_none());
    }

    #[test]
    fn invalidate_clears_value() {
        let mut cell = TtlCell::new(Duration::from_secs(600));
        cell.put("cached".to_string());
        cell.invalidate();
        assert!(cell.get().is_none());
    }
}
