//! Sequence identifiers
//!
//! Counter values come from the persistent counter store; this module only names the
//! counters and formats the identifiers minted from them. Order numbers embed the calendar
//! year for readability, but the counter behind them never restarts, so uniqueness rests on
//! the integer alone.

use std::fmt;

use serde::{Serialize, Serializer};

/// Counter families held by the persistent counter store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterName {
    /// Order numbers
    OrderNo,

    /// Customer numbers
    CustomerNo,
}

impl CounterName {
    /// Key of the counter row.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OrderNo => "orderNo",
            Self::CustomerNo => "customerNo",
        }
    }
}

impl fmt::Display for CounterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order identifier, `ORD-{year}-{value:05}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderNumber {
    year: i16,
    value: i64,
}

impl OrderNumber {
    /// Order number for counter `value` allocated in `year`.
    pub const fn new(year: i16, value: i64) -> Self {
        Self { year, value }
    }

    /// Calendar year at allocation time
    pub const fn year(self) -> i16 {
        self.year
    }

    /// Allocated counter value
    pub const fn value(self) -> i64 {
        self.value
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ORD-{:04}-{:05}", self.year, self.value)
    }
}

impl Serialize for OrderNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Customer identifier, `CUS-{value:05}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CustomerNumber(i64);

impl CustomerNumber {
    /// Customer number for counter `value`.
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Allocated counter value
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for CustomerNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CUS-{:05}", self.0)
    }
}

impl Serialize for CustomerNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn order_numbers_are_zero_padded() {
        assert_eq!(OrderNumber::new(2026, 42).to_string(), "ORD-2026-00042");
    }

    #[test]
    fn order_numbers_grow_past_five_digits() {
        assert_eq!(OrderNumber::new(2026, 123_456).to_string(), "ORD-2026-123456");
    }

    #[test]
    fn customer_numbers_are_zero_padded() {
        assert_eq!(CustomerNumber::new(7).to_string(), "CUS-00007");
    }

    #[test]
    fn counter_keys_match_stored_names() {
        assert_eq!(CounterName::OrderNo.as_str(), "orderNo");
        assert_eq!(CounterName::CustomerNo.as_str(), "customerNo");
    }

    #[test]
    fn identifiers_serialize_as_strings() -> TestResult {
        assert_eq!(
            serde_json::to_string(&CustomerNumber::new(12))?,
            r#""CUS-00012""#
        );

        Ok(())
    }
}
