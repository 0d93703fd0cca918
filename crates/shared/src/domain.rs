use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::protocol::{wire_date, ActionPayload};

/// Points needed to fill the impact progress bar.
pub const IMPACT_GOAL_POINTS: f64 = 200.0;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(ActionId);

/// A recorded sustainability action as returned by the server.
///
/// Values of this type always carry a server-assigned id; drafts are represented by
/// [`ActionPayload`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    #[serde(alias = "action")]
    pub description: String,
    #[serde(with = "wire_date")]
    pub date: NaiveDate,
    pub points: f64,
}

impl Action {
    pub fn payload(&self) -> ActionPayload {
        ActionPayload {
            description: self.description.clone(),
            date: self.date,
            points: self.points,
        }
    }

    /// True when every field except `id` equals the payload.
    pub fn matches(&self, payload: &ActionPayload) -> bool {
        self.description == payload.description
            && self.date == payload.date
            && self.points == payload.points
    }
}

pub fn total_impact(actions: &[Action]) -> f64 {
    actions.iter().map(|action| action.points).sum()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactSummary {
    pub total: f64,
    pub progress_percent: f64,
}

impl ImpactSummary {
    pub fn from_actions(actions: &[Action]) -> Self {
        let total = total_impact(actions);
        let progress_percent = (total / IMPACT_GOAL_POINTS * 100.0).clamp(0.0, 100.0);
        Self {
            total,
            progress_percent,
        }
    }
}
