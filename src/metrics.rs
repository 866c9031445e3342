use crate::decision::Label;
use hdrhistogram::Histogram;
use parking_lot::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Counters {
    requests: u64,
    rejected: u64,
    phishing: u64,
    legitimate: u64,
}

pub struct Metrics {
    started: Instant,
    latency: Mutex<Histogram<u64>>, // micros
    counters: Mutex<Counters>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            latency: Mutex::new(Histogram::new(3).expect("hist")),
            counters: Mutex::new(Counters::default()),
        }
    }

    pub fn observe_prediction(&self, label: Label, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        let _ = self.latency.lock().record(micros.max(1));
        let mut counters = self.counters.lock();
        counters.requests += 1;
        match label {
            Label::Phishing => counters.phishing += 1,
            Label::Legitimate => counters.legitimate += 1,
        }
    }

    pub fn observe_rejected(&self) {
        let mut counters = self.counters.lock();
        counters.requests += 1;
        counters.rejected += 1;
    }

    pub fn total_requests(&self) -> u64 {
        self.counters.lock().requests
    }

    pub fn format(&self) -> String {
        let (p50, p95, p99) = {
            let h = self.latency.lock();
            (
                h.value_at_quantile(0.50) as f64 / 1000.0,
                h.value_at_quantile(0.95) as f64 / 1000.0,
                h.value_at_quantile(0.99) as f64 / 1000.0,
            )
        };
        let counters = *self.counters.lock();
        let uptime = self.started.elapsed().as_secs_f64().max(1.0);

        format!(
            "requests_total {}\nrejected_total {}\npredictions_phishing {}\npredictions_legitimate {}\nqps {:.2}\np50_ms {:.3}\np95_ms {:.3}\np99_ms {:.3}\n",
            counters.requests,
            counters.rejected,
            counters.phishing,
            counters.legitimate,
            counters.requests as f64 / uptime,
            p50,
            p95,
            p99
        )
    }
}
