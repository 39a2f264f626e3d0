//! Read-through cache for explicit-range schedules
//!
//! Range schedules are pure functions of the loan and the request, so a
//! schedule computed once can be served for every identical query.
//! Concurrent misses on the same key may both compute; the results are
//! identical and the last insert wins.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use rust_decimal::Decimal;

use super::range::{calculate_range_schedule, RangeLoan, RangeRequest};
use super::results::ForecastPoint;

/// Cache key: loan, window and completion override
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScheduleKey {
    pub loan_id: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub completion_override: Option<Decimal>,
}

impl ScheduleKey {
    pub fn new(loan: &RangeLoan, request: &RangeRequest) -> Self {
        Self {
            loan_id: loan.loan_id.clone(),
            from: request.from,
            to: request.to,
            completion_override: request.completion_override,
        }
    }
}

/// Concurrent schedule cache with hit/miss counters
#[derive(Debug, Default)]
pub struct ScheduleCache {
    entries: DashMap<ScheduleKey, Arc<Vec<ForecastPoint>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ScheduleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached schedule for the query, computing it on a miss
    pub fn get_or_compute(&self, loan: &RangeLoan, request: &RangeRequest) -> Arc<Vec<ForecastPoint>> {
        let key = ScheduleKey::new(loan, request);
        if let Some(cached) = self.entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Arc::clone(cached.value());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let schedule = Arc::new(calculate_range_schedule(loan, request));
        self.entries.insert(key, Arc::clone(&schedule));
        schedule
    }

    /// Drop every cached schedule for a loan, e.g. after new progress is reported
    pub fn invalidate_loan(&self, loan_id: &str) {
        self.entries.retain(|key, _| key.loan_id != loan_id);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Fraction of lookups served from the cache
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rayon::prelude::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_loan(id: &str) -> RangeLoan {
        RangeLoan {
            loan_id: id.to_string(),
            start_date: date(2024, 1, 1),
            maturity_date: date(2024, 12, 31),
            extended_date: None,
            loan_amount: dec!(1000000),
            outstanding_balance: dec!(100000),
            completion: dec!(0.2),
        }
    }

    #[test]
    fn test_second_lookup_hits() {
        let cache = ScheduleCache::new();
        let loan = test_loan("A");
        let request = RangeRequest::new(date(2024, 1, 1), date(2024, 12, 1));

        let first = cache.get_or_compute(&loan, &request);
        let second = cache.get_or_compute(&loan, &request);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
        assert_relative_eq!(cache.hit_rate(), 0.5);
    }

    #[test]
    fn test_override_is_part_of_key() {
        let cache = ScheduleCache::new();
        let loan = test_loan("A");
        let request = RangeRequest::new(date(2024, 1, 1), date(2024, 6, 1));

        let base = cache.get_or_compute(&loan, &request);
        let what_if = cache.get_or_compute(&loan, &request.with_completion(dec!(0.6)));

        assert_eq!(cache.len(), 2);
        assert_ne!(base[0].balance, what_if[0].balance);
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache = ScheduleCache::new();
        let request = RangeRequest::new(date(2024, 1, 1), date(2024, 3, 1));
        cache.get_or_compute(&test_loan("A"), &request);
        cache.get_or_compute(&test_loan("B"), &request);

        cache.invalidate_loan("A");
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.hit_rate(), 0.0);
    }

    #[test]
    fn test_concurrent_lookups_agree() {
        let cache = ScheduleCache::new();
        let loan = test_loan("A");
        let request = RangeRequest::new(date(2024, 1, 1), date(2025, 1, 1));
        let expected = calculate_range_schedule(&loan, &request);

        let schedules: Vec<_> = (0..32)
            .into_par_iter()
            .map(|_| cache.get_or_compute(&loan, &request))
            .collect();

        assert!(schedules.iter().all(|s| s.as_slice() == expected.as_slice()));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.hits() + cache.misses(), 32);
    }
}
