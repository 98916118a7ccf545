//! Booking lifecycle states and the transition table.
//!
//! ```text
//! IDLE ─► INITIATED ─► CREATED ─► PENDING_THERAPIST ─► ACCEPTED ─► CONFIRMED ─► COMPLETED
//!                                        │                 │            │
//!                                        ├─► EXPIRED ◄─────┤            │
//!                                        └─► CANCELLED ◄───┴────────────┘
//! ```
//!
//! Every non-terminal state may also move to FAILED. COMPLETED, CANCELLED,
//! EXPIRED and FAILED are terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingState {
    #[default]
    Idle,
    Initiated,
    Created,
    PendingTherapist,
    Accepted,
    Confirmed,
    Completed,
    Cancelled,
    Expired,
    Failed,
}

impl BookingState {
    pub const ALL: [BookingState; 10] = [
        BookingState::Idle,
        BookingState::Initiated,
        BookingState::Created,
        BookingState::PendingTherapist,
        BookingState::Accepted,
        BookingState::Confirmed,
        BookingState::Completed,
        BookingState::Cancelled,
        BookingState::Expired,
        BookingState::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingState::Idle => "IDLE",
            BookingState::Initiated => "INITIATED",
            BookingState::Created => "CREATED",
            BookingState::PendingTherapist => "PENDING_THERAPIST",
            BookingState::Accepted => "ACCEPTED",
            BookingState::Confirmed => "CONFIRMED",
            BookingState::Completed => "COMPLETED",
            BookingState::Cancelled => "CANCELLED",
            BookingState::Expired => "EXPIRED",
            BookingState::Failed => "FAILED",
        }
    }

    /// States reachable in one step.
    pub fn allowed_transitions(&self) -> &'static [BookingState] {
        use BookingState::*;
        match self {
            Idle => &[Initiated, Failed],
            Initiated => &[Created, Failed, Cancelled],
            Created => &[PendingTherapist, Failed, Cancelled],
            PendingTherapist => &[Accepted, Cancelled, Expired, Failed],
            Accepted => &[Confirmed, Cancelled, Expired, Failed],
            Confirmed => &[Completed, Cancelled, Failed],
            Completed | Cancelled | Expired | Failed => &[],
        }
    }

    pub fn can_transition_to(&self, next: BookingState) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Waiting on a provider or customer; counts towards duplicate detection.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            BookingState::PendingTherapist | BookingState::Accepted | BookingState::Confirmed
        )
    }
}

impl fmt::Display for BookingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who triggered a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    Customer,
    Therapist,
    System,
    Admin,
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Actor::Customer => "customer",
            Actor::Therapist => "therapist",
            Actor::System => "system",
            Actor::Admin => "admin",
        };
        f.write_str(name)
    }
}

/// One entry of a booking's append-only history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateTransition {
    pub from: BookingState,
    pub to: BookingState,
    pub at: DateTime<Utc>,
    pub reason: String,
    pub actor: Actor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_edges() {
        let path = [
            BookingState::Idle,
            BookingState::Initiated,
            BookingState::Created,
            BookingState::PendingTherapist,
            BookingState::Accepted,
            BookingState::Confirmed,
            BookingState::Completed,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        for state in BookingState::ALL.iter().filter(|s| s.is_terminal()) {
            for next in BookingState::ALL {
                assert!(!state.can_transition_to(next));
            }
        }
        assert_eq!(BookingState::ALL.iter().filter(|s| s.is_terminal()).count(), 4);
    }

    #[test]
    fn test_every_live_state_can_fail() {
        for state in BookingState::ALL.iter().filter(|s| !s.is_terminal()) {
            assert!(state.can_transition_to(BookingState::Failed));
        }
    }

    #[test]
    fn test_no_shortcuts() {
        assert!(!BookingState::PendingTherapist.can_transition_to(BookingState::Confirmed));
        assert!(!BookingState::Confirmed.can_transition_to(BookingState::Expired));
        assert!(!BookingState::Idle.can_transition_to(BookingState::Cancelled));
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&BookingState::PendingTherapist).unwrap(),
            "\"PENDING_THERAPIST\""
        );
        assert_eq!(serde_json::to_string(&Actor::Therapist).unwrap(), "\"therapist\"");
        assert_eq!(BookingState::Expired.to_string(), "EXPIRED");
    }
}
