//! Fuzzing result collection and analysis

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use super::Outcome;

/// Single fuzzing result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzResult {
    /// Position in enumeration order (0 = baseline)
    pub seq: u64,
    /// Requested URL
    pub url: String,
    /// Headers sent
    pub request_headers: Vec<(String, String)>,
    /// Cookies sent, as a `Cookie` header value
    pub request_cookies: Option<String>,
    /// HTTP status code
    pub status_code: u16,
    /// Response length in bytes
    pub response_length: usize,
    /// Response time
    pub response_time: Duration,
    /// Response headers
    pub response_headers: BTreeMap<String, String>,
    /// Whether this is flagged as interesting
    pub interesting: bool,
    /// Reason for being interesting
    pub interesting_reason: Option<String>,
    /// Error message if request failed
    pub error: Option<String>,
}

impl FuzzResult {
    pub fn from_outcome(outcome: &Outcome) -> Self {
        let request = &outcome.request;
        let mut result = Self {
            seq: request.seq,
            url: request.url.to_string(),
            request_headers: request.headers.clone(),
            request_cookies: request.cookie_header(),
            status_code: 0,
            response_length: 0,
            response_time: Duration::ZERO,
            response_headers: BTreeMap::new(),
            interesting: false,
            interesting_reason: None,
            error: None,
        };

        match &outcome.result {
            Ok(response) => {
                result.status_code = response.status;
                result.response_length = response.size;
                result.response_time = Duration::from_millis(response.duration_ms);
                result.response_headers = response.headers.clone();
            }
            Err(e) => result.error = Some(e.to_string()),
        }
        result
    }

    pub fn mark_interesting(&mut self, reason: &str) {
        self.interesting = true;
        self.interesting_reason = Some(reason.to_string());
    }
}

/// Collection of fuzzing results with baseline comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzResultSet {
    /// All results
    pub results: Vec<FuzzResult>,
    /// Baseline status code
    pub baseline_status: Option<u16>,
    /// Baseline response length
    pub baseline_length: Option<usize>,
    /// Status code distribution
    pub status_distribution: HashMap<u16, usize>,
    /// Interesting threshold for length variance (percentage)
    pub length_variance_threshold: f64,
}

impl Default for FuzzResultSet {
    fn default() -> Self {
        Self::new()
    }
}

impl FuzzResultSet {
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
            baseline_status: None,
            baseline_length: None,
            status_distribution: HashMap::new(),
            length_variance_threshold: 10.0, // 10% variance
        }
    }

    /// Record an outcome, in whatever order it arrives
    pub fn add_outcome(&mut self, outcome: &Outcome) {
        let result = FuzzResult::from_outcome(outcome);
        if result.error.is_none() {
            *self.status_distribution.entry(result.status_code).or_insert(0) += 1;
        }
        self.results.push(result);
    }

    /// Restore enumeration order and compare every result to the baseline
    pub fn finalize(&mut self) {
        self.results.sort_by_key(|r| r.seq);

        if let Some(baseline) = self.results.first().filter(|r| r.seq == 0 && r.error.is_none()) {
            self.baseline_status = Some(baseline.status_code);
            self.baseline_length = Some(baseline.response_length);
        }

        let mut results = std::mem::take(&mut self.results);
        for result in results.iter_mut().filter(|r| r.seq != 0) {
            self.analyze_result(result);
        }
        self.results = results;
    }

    /// Analyze a result for interesting behavior
    fn analyze_result(&self, result: &mut FuzzResult) {
        if let Some(error) = &result.error {
            result.mark_interesting(&format!("Request failed: {}", error));
            return;
        }

        // Check status code difference
        if let Some(baseline) = self.baseline_status {
            if result.status_code != baseline {
                result.mark_interesting(&format!(
                    "Status code changed from {} to {}",
                    baseline, result.status_code
                ));
                return;
            }
        }

        // Check length variance
        if let Some(baseline_len) = self.baseline_length {
            let variance = if baseline_len == 0 {
                if result.response_length == 0 { 0.0 } else { 100.0 }
            } else {
                ((result.response_length as f64 - baseline_len as f64).abs()
                    / baseline_len as f64)
                    * 100.0
            };
            if variance > self.length_variance_threshold {
                result.mark_interesting(&format!(
                    "Response length changed by {:.1}% ({} -> {})",
                    variance, baseline_len, result.response_length
                ));
                return;
            }
        }

        if (500..600).contains(&result.status_code) {
            result.mark_interesting("Server error response");
        }
    }

    /// Get interesting results
    pub fn interesting_results(&self) -> Vec<&FuzzResult> {
        self.results.iter().filter(|r| r.interesting).collect()
    }

    /// Get statistics
    pub fn stats(&self) -> FuzzResultStats {
        let total = self.results.len();
        let errors = self.results.iter().filter(|r| r.error.is_some()).count();
        let interesting = self.results.iter().filter(|r| r.interesting).count();

        let avg_time = if total > 0 {
            let total_time: Duration = self.results.iter().map(|r| r.response_time).sum();
            total_time / total as u32
        } else {
            Duration::ZERO
        };

        FuzzResultStats {
            total_requests: total,
            successful_requests: total - errors,
            error_count: errors,
            interesting_count: interesting,
            average_response_time: avg_time,
            status_distribution: self.status_distribution.clone(),
        }
    }
}

/// Statistics from fuzzing results
#[derive(Debug, Clone)]
pub struct FuzzResultStats {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub error_count: usize,
    pub interesting_count: usize,
    pub average_response_time: Duration,
    pub status_distribution: HashMap<u16, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HttpError;
    use crate::http::{FuzzRequest, Response};
    use url::Url;

    fn outcome(seq: u64, status: u16, size: usize) -> Outcome {
        Outcome {
            request: FuzzRequest {
                seq,
                method: "GET".into(),
                url: Url::parse("http://localhost/").unwrap(),
                headers: vec![("X-Id".into(), seq.to_string())],
                cookies: Vec::new(),
            },
            result: Ok(Response {
                status,
                size,
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_finalize_sorts_and_compares_to_baseline() {
        let mut set = FuzzResultSet::new();
        set.add_outcome(&outcome(2, 500, 100));
        set.add_outcome(&outcome(1, 200, 100));
        set.add_outcome(&outcome(3, 200, 300));
        set.add_outcome(&outcome(0, 200, 100));
        set.finalize();

        let seqs: Vec<u64> = set.results.iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2, 3]);
        assert_eq!(set.baseline_status, Some(200));

        let interesting: Vec<u64> = set.interesting_results().iter().map(|r| r.seq).collect();
        assert_eq!(interesting, vec![2, 3]);
        assert!(set.results[2]
            .interesting_reason
            .as_deref()
            .unwrap()
            .contains("Status code changed"));
    }

    #[test]
    fn test_errors_are_counted() {
        let mut set = FuzzResultSet::new();
        set.add_outcome(&outcome(0, 200, 10));
        let mut failed = outcome(1, 0, 0);
        failed.result = Err(HttpError::Timeout(1000));
        set.add_outcome(&failed);
        set.finalize();

        let stats = set.stats();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.error_count, 1);
        assert_eq!(stats.status_distribution.get(&200), Some(&1));
        assert!(set.results[1].interesting);
    }
}
