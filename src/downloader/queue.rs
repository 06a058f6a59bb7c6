// Admission control
//
// Bounds how many downloads run at once and keeps a FIFO backlog of ids
// waiting for a slot. Pure bookkeeping: the caller owns the actual
// processes and calls back in on every start/finish/cancel.
use std::collections::{HashSet, VecDeque};

/// Fixed concurrency bound of the orchestrator.
pub const MAX_CONCURRENT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A slot is free; the id was moved into the running set.
    Start,
    /// All slots are busy; the id was appended to the backlog.
    Queued,
}

pub struct AdmissionQueue {
    limit: usize,
    running: HashSet<String>,
    waiting: VecDeque<String>,
}

impl AdmissionQueue {
    pub fn new() -> Self {
        Self::with_limit(MAX_CONCURRENT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            running: HashSet::new(),
            waiting: VecDeque::new(),
        }
    }

    pub fn submit(&mut self, id: &str) -> Admission {
        if self.running.len() < self.limit {
            self.running.insert(id.to_string());
            Admission::Start
        } else {
            self.waiting.push_back(id.to_string());
            Admission::Queued
        }
    }

    /// Release the slot held by `id` and promote backlog heads while
    /// capacity remains. Returns the promoted ids in start order.
    pub fn finish(&mut self, id: &str) -> Vec<String> {
        self.running.remove(id);

        let mut promoted = Vec::new();
        while self.running.len() < self.limit {
            match self.waiting.pop_front() {
                Some(next) => {
                    self.running.insert(next.clone());
                    promoted.push(next);
                }
                None => break,
            }
        }
        promoted
    }

    /// Remove a backlog entry without starting it. Returns false when the
    /// id is not waiting.
    pub fn remove_waiting(&mut self, id: &str) -> bool {
        match self.waiting.iter().position(|queued| queued == id) {
            Some(index) => {
                self.waiting.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self, id: &str) -> bool {
        self.running.contains(id)
    }

    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    pub fn waiting_count(&self) -> usize {
        self.waiting.len()
    }
}
