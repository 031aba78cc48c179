//! Movie/actor cross-reference maintenance.
//!
//! Given a stored movie and its resolved credits, the maintainer makes sure
//! each credited actor exists, holds exactly one filmography entry for the
//! movie, and that the movie lists exactly the actors whose entries were
//! written. Each actor is handled independently; one failing actor does not
//! stop the others.

mod maintainer;

pub use maintainer::CrossReferenceMaintainer;

use serde::{Deserialize, Serialize};

/// Character recorded on a director's filmography entry.
pub const DIRECTOR_CHARACTER: &str = "Director";

/// How an actor is credited on a movie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditRole {
    Cast,
    Director,
}

/// An actor whose link to the movie could not be written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorLinkFailure {
    /// Provider person ID.
    pub actor_external_id: u32,
    pub role: CreditRole,
    pub error: String,
}

/// Outcome of applying a movie's credits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossRefReport {
    /// Actors linked in both directions.
    pub linked: usize,
    /// Actors created during this pass.
    pub actors_created: usize,
    /// Stale filmography entries removed.
    pub pruned: u64,
    /// Actors that could not be linked.
    pub failures: Vec<ActorLinkFailure>,
}

impl CrossRefReport {
    /// True if every credited actor was linked.
    pub fn is_consistent(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_consistency() {
        let mut report = CrossRefReport::default();
        assert!(report.is_consistent());

        report.failures.push(ActorLinkFailure {
            actor_external_id: 287,
            role: CreditRole::Cast,
            error: "Database error: locked".to_string(),
        });
        assert!(!report.is_consistent());
    }

    #[test]
    fn test_credit_role_serialization() {
        assert_eq!(
            serde_json::to_string(&CreditRole::Director).unwrap(),
            "\"director\""
        );
    }
}
