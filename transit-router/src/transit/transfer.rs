//! Transfers between stops and trip-to-trip transfer constraints.

use serde::{Deserialize, Serialize};

use crate::domain::{Cost, StopIndex, TripKey};

/// A directed walk between two stops with a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub from: StopIndex,
    pub to: StopIndex,
    pub duration_secs: i32,
}

impl Transfer {
    pub fn new(from: StopIndex, to: StopIndex, duration_secs: i32) -> Self {
        Self {
            from,
            to,
            duration_secs,
        }
    }
}

/// How strongly a specific trip-to-trip transfer is encouraged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferPriority {
    /// The transfer may not be made.
    NotAllowed,
    #[default]
    Allowed,
    Recommended,
    Preferred,
}

impl TransferPriority {
    /// Rank used for cost: lower is better.
    fn rank(self) -> Cost {
        match self {
            TransferPriority::Preferred => 0,
            TransferPriority::Recommended => 1,
            TransferPriority::Allowed | TransferPriority::NotAllowed => 2,
        }
    }
}

/// Rule attached to a constrained transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransferConstraint {
    #[serde(default)]
    pub priority: TransferPriority,
    /// The departing trip waits for the arriving one.
    #[serde(default)]
    pub guaranteed: bool,
    /// Passengers stay on board; the two trips are run by the same vehicle.
    #[serde(default)]
    pub stay_seated: bool,
}

/// One step of the transfer-priority cost scale, a minute in centi-seconds.
const PRIORITY_STEP: Cost = 6_000;

impl TransferConstraint {
    pub fn new(priority: TransferPriority) -> Self {
        Self {
            priority,
            ..Self::default()
        }
    }

    pub fn guaranteed(mut self) -> Self {
        self.guaranteed = true;
        self
    }

    pub fn stay_seated(mut self) -> Self {
        self.stay_seated = true;
        self
    }

    pub fn is_not_allowed(&self) -> bool {
        self.priority == TransferPriority::NotAllowed
    }

    /// Guaranteed and stay-seated transfers don't need board slack.
    pub fn ignores_board_slack(&self) -> bool {
        self.guaranteed || self.stay_seated
    }

    /// Cost contribution of making this transfer.
    ///
    /// Stay-seated is free; otherwise one step, plus a step per priority
    /// rank, plus a step when the connection is not guaranteed. A transfer
    /// without any constraint costs [`TransferConstraint::REGULAR_COST`].
    pub fn cost(&self) -> Cost {
        if self.stay_seated {
            return 0;
        }
        let unguaranteed = if self.guaranteed { 0 } else { 1 };
        PRIORITY_STEP * (1 + self.priority.rank() + unguaranteed)
    }

    /// Cost of an ordinary transfer with no constraint attached.
    pub const REGULAR_COST: Cost = PRIORITY_STEP * 4;
}

/// A transfer rule scoped to one (from trip, to trip) pair.
///
/// Positions are the stop positions on each trip's pattern; `None` means
/// the named stop is not on that pattern, which makes the rule unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstrainedTransfer {
    pub from_trip: TripKey,
    pub from_stop: StopIndex,
    pub from_position: Option<usize>,
    pub to_trip: TripKey,
    pub to_stop: StopIndex,
    pub to_position: Option<usize>,
    pub constraint: TransferConstraint,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_ordering() {
        let stay = TransferConstraint::new(TransferPriority::Allowed).stay_seated();
        let guaranteed = TransferConstraint::new(TransferPriority::Preferred).guaranteed();
        let preferred = TransferConstraint::new(TransferPriority::Preferred);
        let recommended = TransferConstraint::new(TransferPriority::Recommended);
        let allowed = TransferConstraint::new(TransferPriority::Allowed);

        assert_eq!(stay.cost(), 0);
        assert!(stay.cost() < guaranteed.cost());
        assert!(guaranteed.cost() < preferred.cost());
        assert!(preferred.cost() < recommended.cost());
        assert!(recommended.cost() < allowed.cost());
        assert_eq!(allowed.cost(), TransferConstraint::REGULAR_COST);
    }

    #[test]
    fn costs_are_non_negative() {
        for priority in [
            TransferPriority::NotAllowed,
            TransferPriority::Allowed,
            TransferPriority::Recommended,
            TransferPriority::Preferred,
        ] {
            for guaranteed in [false, true] {
                let c = TransferConstraint {
                    priority,
                    guaranteed,
                    stay_seated: false,
                };
                assert!(c.cost() >= 0);
            }
        }
    }

    #[test]
    fn slack_exemption() {
        assert!(!TransferConstraint::new(TransferPriority::Preferred).ignores_board_slack());
        assert!(TransferConstraint::default().guaranteed().ignores_board_slack());
        assert!(TransferConstraint::default().stay_seated().ignores_board_slack());
    }

    #[test]
    fn priority_serde() {
        let p: TransferPriority = serde_json::from_str("\"not_allowed\"").unwrap();
        assert_eq!(p, TransferPriority::NotAllowed);
        let c: TransferConstraint = serde_json::from_str("{\"guaranteed\": true}").unwrap();
        assert_eq!(c.priority, TransferPriority::Allowed);
        assert!(c.guaranteed);
    }
}
