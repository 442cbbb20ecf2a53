//! Thread-safe FIFO between the windowing thread and the render thread

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::event::Event;

#[derive(Debug, Default)]
struct Pending {
    events: VecDeque<Event>,
    wake: bool,
}

/// Unbounded event queue
///
/// Producers never block. A consumer blocked in [`EventQueue::pop`] wakes on
/// the next push, or returns `None` after [`EventQueue::pause`].
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: Mutex<Pending>,
    ready: Condvar,
}

impl EventQueue {
    /// Empty queue
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an event and wake one waiting consumer
    pub fn push(&self, event: Event) {
        self.lock().events.push_back(event);
        self.ready.notify_one();
    }

    /// Ask for a redraw
    pub fn redraw(&self) {
        self.push(Event::render());
    }

    /// Oldest event, blocking until one arrives or the queue is paused
    pub fn pop(&self) -> Option<Event> {
        let mut pending = self.lock();
        loop {
            if let Some(event) = pending.events.pop_front() {
                return Some(event);
            }
            if pending.wake {
                pending.wake = false;
                return None;
            }
            pending = self.ready.wait(pending).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Oldest event, if any, without waiting
    pub fn try_pop(&self) -> Option<Event> {
        self.lock().events.pop_front()
    }

    /// Oldest event, waiting at most `timeout`
    pub fn pop_timeout(&self, timeout: Duration) -> Option<Event> {
        let pending = self.lock();
        let (mut pending, _) = self
            .ready
            .wait_timeout_while(pending, timeout, |p| p.events.is_empty() && !p.wake)
            .unwrap_or_else(PoisonError::into_inner);
        let event = pending.events.pop_front();
        if event.is_none() {
            pending.wake = false;
        }
        event
    }

    /// Drop everything queued and release a blocked consumer
    pub fn pause(&self) {
        let mut pending = self.lock();
        let dropped = pending.events.len();
        pending.events.clear();
        pending.wake = true;
        drop(pending);
        if dropped > 0 {
            log::debug!("Event queue paused, {} events dropped", dropped);
        }
        self.ready.notify_all();
    }

    /// Drop everything queued
    pub fn clear(&self) {
        self.lock().events.clear();
    }

    /// True when nothing is queued
    pub fn is_empty(&self) -> bool {
        self.lock().events.is_empty()
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        self.lock().events.len()
    }
}
