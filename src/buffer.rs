use std::{collections::{VecDeque, vec_deque}, num::NonZeroUsize, sync::Arc};

use crate::record::LogRecord;

pub const DEFAULT_CAPACITY: usize = 100;

/// Most-recent-N window of records. Pushing at capacity drops the oldest.
#[derive(Debug)]
pub struct LogBuffer {
    capacity: NonZeroUsize,
    records: VecDeque<Arc<LogRecord>>,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(default_capacity())
    }
}

pub(crate) fn default_capacity() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN)
}

impl LogBuffer {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            records: VecDeque::with_capacity(capacity.get()),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    fn trim(&mut self) -> Option<Arc<LogRecord>> {
        if self.capacity.get() <= self.records.len() {
            self.records.pop_front()
        } else {
            None
        }
    }

    /// Appends a record, returning the evicted one when the buffer was full.
    pub fn push(&mut self, record: Arc<LogRecord>) -> Option<Arc<LogRecord>> {
        let evicted = self.trim();
        self.records.push_back(record);
        evicted
    }

    /// Oldest first order. You can call rev() to reverse the order.
    pub fn iter(&self) -> vec_deque::Iter<'_, Arc<LogRecord>> {
        self.records.iter()
    }

    /// Copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<Arc<LogRecord>> {
        self.records.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
