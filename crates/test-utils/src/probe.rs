use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One recorded start or end, with a global sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeEvent {
    Start { label: String, seq: u64 },
    End { label: String, seq: u64 },
}

#[derive(Debug, Default)]
struct Inner {
    seq: AtomicU64,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    events: Mutex<Vec<ProbeEvent>>,
}

/// Records when task bodies start and end, across workers.
///
/// Sequence numbers are totally ordered, so "A ended before B started" is
/// `end_of(A) < start_of(B)`.
#[derive(Debug, Clone, Default)]
pub struct Probe {
    inner: Arc<Inner>,
}

impl Probe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self, label: &str) {
        let now = self.inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let seq = self.inner.seq.fetch_add(1, Ordering::SeqCst);
        self.push(ProbeEvent::Start {
            label: label.to_string(),
            seq,
        });
    }

    pub fn end(&self, label: &str) {
        let seq = self.inner.seq.fetch_add(1, Ordering::SeqCst);
        self.push(ProbeEvent::End {
            label: label.to_string(),
            seq,
        });
        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn push(&self, event: ProbeEvent) {
        self.inner.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<ProbeEvent> {
        self.inner.events.lock().unwrap().clone()
    }

    /// Labels in the order their bodies started.
    pub fn started(&self) -> Vec<String> {
        let mut starts: Vec<(u64, String)> = self
            .events()
            .into_iter()
            .filter_map(|e| match e {
                ProbeEvent::Start { label, seq } => Some((seq, label)),
                ProbeEvent::End { .. } => None,
            })
            .collect();
        starts.sort();
        starts.into_iter().map(|(_, label)| label).collect()
    }

    pub fn start_of(&self, label: &str) -> Option<u64> {
        self.events().into_iter().find_map(|e| match e {
            ProbeEvent::Start { label: l, seq } if l == label => Some(seq),
            _ => None,
        })
    }

    pub fn end_of(&self, label: &str) -> Option<u64> {
        self.events().into_iter().find_map(|e| match e {
            ProbeEvent::End { label: l, seq } if l == label => Some(seq),
            _ => None,
        })
    }

    /// How many times `label` started.
    pub fn count(&self, label: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProbeEvent::Start { label: l, .. } if l == label))
            .count()
    }

    /// Highest number of bodies observed running at once.
    pub fn max_concurrency(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }
}
