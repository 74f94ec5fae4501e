//! The event contract the scheduler orders, plus a ready-made generic event.

use std::fmt::Debug;
use std::hash::Hash;

/// Priority of an event relative to other events for the *same tag*.
///
/// Higher wins.  Priority never affects dequeue order across different tags.
pub type Priority = i32;

/// Anything the [`EventScheduler`][crate::EventScheduler] can order.
///
/// The scheduler never inspects an event beyond these three accessors.  It
/// clones an event only when handing a copy back from `peek`; everything it
/// returns is owned by the caller and detached from scheduler state.
///
/// `tag()` is called once per `schedule`, so computing it on the fly (e.g.
/// from a payload variant) is fine.
pub trait ScheduledEvent: Clone {
    /// The slot this event occupies.  At most one event per tag is pending.
    type Tag: Eq + Hash + Clone + Debug;

    /// Dequeue order key, earliest first.
    type Time: Ord + Copy + Debug;

    fn tag(&self) -> Self::Tag;
    fn time(&self) -> Self::Time;
    fn priority(&self) -> Priority;
}

/// A plain tagged event carrying an arbitrary payload.
///
/// Most callers need nothing more than this: pick a tag type (e.g.
/// `AgentId`), a time type (e.g. `Tick`), and whatever payload the consumer
/// loop interprets.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event<K, T, D> {
    pub tag:      K,
    pub time:     T,
    pub priority: Priority,
    pub payload:  D,
}

impl<K, T, D> Event<K, T, D> {
    pub fn new(tag: K, time: T, priority: Priority, payload: D) -> Self {
        Self { tag, time, priority, payload }
    }
}

impl<K, T, D> ScheduledEvent for Event<K, T, D>
where
    K: Eq + Hash + Clone + Debug,
    T: Ord + Copy + Debug,
    D: Clone,
{
    type Tag = K;
    type Time = T;

    #[inline]
    fn tag(&self) -> K {
        self.tag.clone()
    }

    #[inline]
    fn time(&self) -> T {
        self.time
    }

    #[inline]
    fn priority(&self) -> Priority {
        self.priority
    }
}
