//! `EventScheduler` — thread-safe priority queue with at most one pending
//! event per tag.
//!
//! # Structure
//!
//! Three pieces of state live behind one mutex:
//!
//! - **heap**: a time-ordered min-heap that may hold stale copies,
//! - **authority table**: `tag → claim`, the only source of truth about which
//!   event is pending for a tag,
//! - **min-watermark**: the last minimum time observed, used to decide when to
//!   fire the min-changed handler.
//!
//! # Lazy deletion
//!
//! Superseding, unscheduling, or preempting an event only touches the
//! authority table.  The old heap copy stays where it is and is popped the
//! next time it surfaces at the front of the heap during `peek`, `dequeue`,
//! or `collect_events_at`.  Each stale entry is swept exactly once, so the
//! walks are amortised O(log n) per entry.
//!
//! Liveness is decided by a sequence number stamped on every accepted event:
//! a heap entry is live iff the authority table holds a claim for its tag with
//! the same sequence number.
//!
//! # Watermark approximation
//!
//! The watermark is compared only against the time of the event being
//! accepted (or dequeued), never against a re-peek of the heap.  After an
//! unrelated `unschedule` it can lag the true minimum, so the handler may
//! stay silent for a change it could have reported.  This firing pattern is
//! relied on by callers and is kept as is.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use parking_lot::Mutex;

use crate::event::{Priority, ScheduledEvent};
use crate::notify::{MinChangedHandler, NoopHandler};

#[cfg(not(feature = "fx-hash"))]
type TagMap<K, V> = std::collections::HashMap<K, V>;

#[cfg(feature = "fx-hash")]
type TagMap<K, V> = rustc_hash::FxHashMap<K, V>;

// ── Internal state ────────────────────────────────────────────────────────────

/// The authority table's record of the pending event for one tag.
#[derive(Clone, Copy, Debug)]
struct Claim<T> {
    seq:      u64,
    priority: Priority,
    time:     T,
}

/// One heap slot.  Ordered by `(time, seq)` reversed so `BinaryHeap` pops the
/// earliest time first; `seq` only makes the order total.
struct HeapEntry<E: ScheduledEvent> {
    time:  E::Time,
    seq:   u64,
    tag:   E::Tag,
    event: E,
}

impl<E: ScheduledEvent> PartialEq for HeapEntry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<E: ScheduledEvent> Eq for HeapEntry<E> {}

impl<E: ScheduledEvent> PartialOrd for HeapEntry<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E: ScheduledEvent> Ord for HeapEntry<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct State<E: ScheduledEvent> {
    heap:      BinaryHeap<HeapEntry<E>>,
    authority: TagMap<E::Tag, Claim<E::Time>>,
    watermark: Option<E::Time>,
    next_seq:  u64,
}

impl<E: ScheduledEvent> State<E> {
    fn new() -> Self {
        Self {
            heap:      BinaryHeap::new(),
            authority: TagMap::default(),
            watermark: None,
            next_seq:  0,
        }
    }

    /// Pop stale entries off the front of the heap.  Returns `true` if a live
    /// entry is now at the front.
    fn sweep_front(&mut self) -> bool {
        let mut swept = 0usize;
        loop {
            let live = match self.heap.peek() {
                None => {
                    debug_assert!(
                        self.authority.is_empty(),
                        "authority table holds {} claims but the heap has no live entry",
                        self.authority.len(),
                    );
                    if swept > 0 {
                        log::trace!("swept {swept} stale heap entries");
                    }
                    return false;
                }
                Some(top) => is_live(&self.authority, top),
            };
            if live {
                if swept > 0 {
                    log::trace!("swept {swept} stale heap entries");
                }
                return true;
            }
            self.heap.pop();
            swept += 1;
        }
    }

    /// Move the watermark if `time` is a new minimum (or the first one seen).
    fn lower_watermark(&mut self, time: E::Time) -> bool {
        match self.watermark {
            Some(w) if time >= w => false,
            _ => {
                self.watermark = Some(time);
                true
            }
        }
    }

    /// Record the time of a dequeued head.  The pending minimum moved iff the
    /// head's time differs from the last watermark.
    fn settle_watermark(&mut self, time: E::Time) -> bool {
        if self.watermark == Some(time) {
            return false;
        }
        self.watermark = Some(time);
        true
    }
}

#[inline]
fn is_live<E: ScheduledEvent>(
    authority: &TagMap<E::Tag, Claim<E::Time>>,
    entry:     &HeapEntry<E>,
) -> bool {
    authority.get(&entry.tag).is_some_and(|claim| claim.seq == entry.seq)
}

/// The strict-improvement rule: a challenger replaces the incumbent iff it
/// has higher priority, or equal priority and an earlier time.
#[inline]
fn supersedes<T: Ord>(challenger: (Priority, T), incumbent: (Priority, T)) -> bool {
    challenger.0 > incumbent.0 || (challenger.0 == incumbent.0 && challenger.1 < incumbent.1)
}

// ── EventScheduler ────────────────────────────────────────────────────────────

/// A thread-safe discrete-event queue that keeps at most one pending event per
/// tag.
///
/// `C` is an opaque context handed unchanged to the min-changed handler, so
/// handlers don't need to capture external state.
///
/// Every method takes `&self` and runs under a single internal mutex covering
/// the heap, the authority table, and the watermark; concurrent callers never
/// observe them out of sync.  Share the scheduler across threads with `&` or
/// `Arc`.
///
/// # Example
///
/// ```rust,ignore
/// let sched = EventScheduler::new(());
/// assert!(sched.schedule(Event::new(AgentId(1), Tick(10), 0, "arrive")));
/// assert!(sched.schedule(Event::new(AgentId(1), Tick(5), 0, "arrive early")));
/// assert!(!sched.schedule(Event::new(AgentId(1), Tick(7), 0, "too late")));
/// assert_eq!(sched.dequeue().unwrap().payload, "arrive early");
/// assert!(sched.dequeue().is_none()); // the Tick(10) copy was stale
/// ```
pub struct EventScheduler<E: ScheduledEvent, C = ()> {
    state:          Mutex<State<E>>,
    context:        C,
    on_min_changed: Box<dyn MinChangedHandler<E, C>>,
}

impl<E: ScheduledEvent, C> EventScheduler<E, C> {
    /// Create an empty scheduler carrying `context`.
    pub fn new(context: C) -> Self {
        Self {
            state:          Mutex::new(State::new()),
            context,
            on_min_changed: Box::new(NoopHandler),
        }
    }

    /// Register the min-changed handler.  Consumes the builder-style `self`,
    /// so a scheduler has exactly one handler for its whole life.
    ///
    /// The handler is invoked synchronously from inside `schedule`, `dequeue`,
    /// and `collect_events_at` **while the scheduler lock is held**.  It must
    /// not call any method on this scheduler; see [`crate::notify`].
    pub fn with_min_changed<H>(mut self, handler: H) -> Self
    where
        H: MinChangedHandler<E, C> + 'static,
    {
        self.on_min_changed = Box::new(handler);
        self
    }

    /// The shared context passed to the min-changed handler.
    pub fn context(&self) -> &C {
        &self.context
    }

    // ── Producers ─────────────────────────────────────────────────────────

    /// Offer `event` as the pending event for its tag.
    ///
    /// Accepted iff the tag has no pending event, or `event` has a strictly
    /// higher priority, or equal priority and a strictly earlier time.
    /// Returns `false` on rejection and leaves the incumbent untouched.
    ///
    /// On acceptance the previous heap copy (if any) is left behind as a
    /// stale entry, and the handler fires if `event.time()` is below the
    /// watermark or no watermark exists yet.
    pub fn schedule(&self, event: E) -> bool {
        let tag = event.tag();
        let time = event.time();
        let priority = event.priority();

        let mut state = self.state.lock();
        if let Some(claim) = state.authority.get(&tag) {
            if !supersedes((priority, time), (claim.priority, claim.time)) {
                log::trace!(
                    "schedule rejected for {tag:?}: ({priority}, {time:?}) does not beat ({}, {:?})",
                    claim.priority,
                    claim.time,
                );
                return false;
            }
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        state.authority.insert(tag.clone(), Claim { seq, priority, time });

        // Heap and table must agree before the handler runs; a panicking
        // handler unwinds through an unpoisoned lock.
        let new_min = state.lower_watermark(time).then(|| event.clone());
        state.heap.push(HeapEntry { time, seq, tag, event });
        if let Some(event) = new_min {
            self.on_min_changed.on_min_changed(&self.context, &event);
        }
        true
    }

    /// Schedule every event from `events` in order; returns how many were
    /// accepted.  Each event takes and releases the lock on its own, so other
    /// threads may interleave.
    pub fn schedule_all<I>(&self, events: I) -> usize
    where
        I: IntoIterator<Item = E>,
    {
        events
            .into_iter()
            .map(|event| self.schedule(event))
            .filter(|&accepted| accepted)
            .count()
    }

    /// Remove the pending event for `tag`.  The heap copy becomes stale.
    ///
    /// Returns whether anything was pending.
    pub fn unschedule(&self, tag: &E::Tag) -> bool {
        self.state.lock().authority.remove(tag).is_some()
    }

    /// Clear `tag` for a new event at `priority`, unless a stronger claim
    /// holds it.
    ///
    /// - nothing pending → `true`,
    /// - pending priority strictly greater than `priority` → `false`, claim
    ///   left intact,
    /// - otherwise the pending event is removed and `true` is returned.
    pub fn preempt(&self, tag: &E::Tag, priority: Priority) -> bool {
        let mut state = self.state.lock();
        match state.authority.get(tag) {
            None => true,
            Some(claim) if claim.priority > priority => false,
            Some(_) => {
                state.authority.remove(tag);
                true
            }
        }
    }

    // ── Consumers ─────────────────────────────────────────────────────────

    /// The earliest live event and its time, without removing it.
    ///
    /// Stale entries found at the front of the heap are popped on the way.
    pub fn peek(&self) -> Option<(E, E::Time)> {
        let mut state = self.state.lock();
        if !state.sweep_front() {
            return None;
        }
        state.heap.peek().map(|top| (top.event.clone(), top.time))
    }

    /// Remove and return the earliest live event.  Its tag becomes
    /// unscheduled.
    pub fn dequeue(&self) -> Option<E> {
        let mut state = self.state.lock();
        self.pop_live(&mut state)
    }

    /// Dequeue every live event whose time equals `time`, stopping at the
    /// first head with a different time.
    ///
    /// The whole batch is taken under one lock acquisition.  Order within
    /// the batch is unspecified; sort it if you need determinism.
    pub fn collect_events_at(&self, time: E::Time) -> Vec<E> {
        let mut state = self.state.lock();
        let mut batch = Vec::new();
        while state.sweep_front() && state.heap.peek().is_some_and(|top| top.time == time) {
            match self.pop_live(&mut state) {
                Some(event) => batch.push(event),
                None => break,
            }
        }
        batch
    }

    fn pop_live(&self, state: &mut State<E>) -> Option<E> {
        if !state.sweep_front() {
            return None;
        }
        let entry = state.heap.pop()?;
        state.authority.remove(&entry.tag);
        if state.settle_watermark(entry.time) {
            self.on_min_changed.on_min_changed(&self.context, &entry.event);
        }
        Some(entry.event)
    }

    // ── Inspection ────────────────────────────────────────────────────────

    /// `true` if the heap holds any entry, live or stale.
    ///
    /// Like [`count`][Self::count] this is an upper bound: it can report
    /// `true` while every remaining entry is stale.  Use
    /// [`peek`][Self::peek] for an exact answer.
    pub fn any(&self) -> bool {
        !self.state.lock().heap.is_empty()
    }

    /// Raw heap size.  **Not exact**: stale entries are counted until lazy
    /// cleanup (or [`compact`][Self::compact]) removes them, so this is an
    /// upper bound on the number of live events.
    pub fn count(&self) -> usize {
        self.state.lock().heap.len()
    }

    /// Exact: does `tag` currently have a pending event?
    pub fn is_scheduled(&self, tag: &E::Tag) -> bool {
        self.state.lock().authority.contains_key(tag)
    }

    /// The `(priority, time)` of the pending event for `tag`, if any.
    pub fn scheduled(&self, tag: &E::Tag) -> Option<(Priority, E::Time)> {
        self.state
            .lock()
            .authority
            .get(tag)
            .map(|claim| (claim.priority, claim.time))
    }

    /// The last minimum time the watermark recorded.
    pub fn watermark(&self) -> Option<E::Time> {
        self.state.lock().watermark
    }

    /// Drop every stale heap entry now and return how many were removed.
    ///
    /// The scheduler never calls this on its own.  Long-running callers that
    /// supersede heavily can call it between steps to bound memory and make
    /// [`count`][Self::count] exact again.
    pub fn compact(&self) -> usize {
        let mut guard = self.state.lock();
        let State { heap, authority, .. } = &mut *guard;
        let before = heap.len();
        heap.retain(|entry| is_live(authority, entry));
        let dropped = before - heap.len();
        log::debug!("compaction dropped {dropped} stale entries, {} live remain", heap.len());
        dropped
    }
}

impl<E: ScheduledEvent> Default for EventScheduler<E, ()> {
    fn default() -> Self {
        Self::new(())
    }
}
