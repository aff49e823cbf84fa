use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

use super::sample_buffer::SampleBuffer;
use super::sample_id::{next_sample_id, SampleId};

#[derive(Clone, Debug)]
struct BankEntry {
    forward: Arc<SampleBuffer>,
    reversed: Arc<SampleBuffer>,
}

/// Registry of decoded buffers shared read-only by every voice.
///
/// Registration swaps in a new map so the scheduler thread can look buffers up
/// without taking a lock. Reversed copies are built here, on the caller's
/// thread, so reverse playback never does any work in the audio callback.
#[derive(Default)]
pub struct SampleBank {
    entries: ArcSwap<HashMap<SampleId, BankEntry>>,
}

impl SampleBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, buffer: SampleBuffer) -> SampleId {
        let id = next_sample_id();
        let entry = BankEntry {
            reversed: Arc::new(buffer.reversed()),
            forward: Arc::new(buffer),
        };
        self.entries.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.insert(id, entry.clone());
            next
        });
        id
    }

    pub fn remove(&self, id: SampleId) -> bool {
        let previous = self.entries.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.remove(&id);
            next
        });
        previous.contains_key(&id)
    }

    pub fn get(&self, id: SampleId, reversed: bool) -> Option<Arc<SampleBuffer>> {
        let entries = self.entries.load();
        entries.get(&id).map(|e| {
            if reversed {
                Arc::clone(&e.reversed)
            } else {
                Arc::clone(&e.forward)
            }
        })
    }

    pub fn contains(&self, id: SampleId) -> bool {
        self.entries.load().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
