//! Scheduler tags and payloads for the arrivals model.

use std::fmt;

use tagq_core::{AgentId, ProposalId, Tick};
use tagq_sched::{Event, Priority};

/// One pending-event slot.  Each actor has one, and so does each open
/// proposal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    Actor(AgentId),
    Proposal(ProposalId),
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Actor(id)    => write!(f, "actor:{}", id.0),
            Slot::Proposal(id) => write!(f, "proposal:{}", id.0),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Arrive,
    Depart,
    /// A proposal ran out; its actor is pushed out early.
    Expire { actor: AgentId },
}

pub type Ev = Event<Slot, Tick, Action>;

/// Priority used by expiring proposals to override a pending departure.
pub const PROPOSAL_PRIORITY: Priority = 5;

pub fn actor_event(agent: AgentId, at: Tick, priority: Priority, action: Action) -> Ev {
    Event::new(Slot::Actor(agent), at, priority, action)
}
