//! 经验回放缓冲区
//!
//! 固定容量环形缓冲，满后覆盖最旧的经验。

use contracts::ExperienceTuple;
use rand::Rng;
use ringbuf::{traits::*, HeapRb};

pub struct ReplayBuffer {
    ring: HeapRb<ExperienceTuple>,
    pushed: u64,
    evicted: u64,
}

impl std::fmt::Debug for ReplayBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayBuffer")
            .field("len", &self.ring.occupied_len())
            .field("capacity", &self.capacity())
            .field("evicted", &self.evicted)
            .finish()
    }
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: HeapRb::new(capacity.max(1)),
            pushed: 0,
            evicted: 0,
        }
    }

    pub fn push(&mut self, experience: ExperienceTuple) {
        if self.ring.is_full() {
            let _ = self.ring.try_pop();
            self.evicted += 1;
        }
        let _ = self.ring.try_push(experience);
        self.pushed += 1;
    }

    pub fn len(&self) -> usize {
        self.ring.occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity().get()
    }

    /// 累计写入数
    pub fn pushed(&self) -> u64 {
        self.pushed
    }

    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    fn get(&self, index: usize) -> Option<&ExperienceTuple> {
        let (head, tail) = self.ring.as_slices();
        if index < head.len() {
            head.get(index)
        } else {
            tail.get(index - head.len())
        }
    }

    /// 有放回地均匀采样 `n` 条
    pub fn sample<R: Rng>(&self, rng: &mut R, n: usize) -> Vec<&ExperienceTuple> {
        let len = self.len();
        if len == 0 {
            return Vec::new();
        }
        (0..n)
            .filter_map(|_| self.get(rng.random_range(0..len)))
            .collect()
    }
}
