use crate::domain::ids::OwnerId;
use crate::error::{KanbanError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Subscription tier; each tier caps how many boards an owner may create
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Pro,
    Enterprise,
}

impl Plan {
    pub fn quota(&self) -> u32 {
        match self {
            Plan::Free => 5,
            Plan::Pro => 25,
            Plan::Enterprise => 50,
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Plan::Free => write!(f, "free"),
            Plan::Pro => write!(f, "pro"),
            Plan::Enterprise => write!(f, "enterprise"),
        }
    }
}

/// The account boards are created under, with its board quota.
///
/// `usage` counts boards ever created; deleting a board does not refund it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: OwnerId,
    #[serde(default)]
    pub plan: Plan,
    #[serde(default)]
    pub usage: u32,
    pub usage_limit: u32,
}

impl Owner {
    pub fn new(id: OwnerId, plan: Plan) -> Self {
        Self {
            id,
            plan,
            usage: 0,
            usage_limit: plan.quota(),
        }
    }

    pub fn remaining(&self) -> u32 {
        self.usage_limit.saturating_sub(self.usage)
    }

    /// Fails with `UsageExceeded` when one more board would pass the limit
    pub fn check_quota(&self) -> Result<()> {
        if self.usage >= self.usage_limit {
            return Err(KanbanError::UsageExceeded {
                usage: self.usage,
                limit: self.usage_limit,
            });
        }
        Ok(())
    }

    /// Counts a newly created board against the quota
    pub fn record_board_created(&mut self) -> Result<()> {
        self.check_quota()?;
        self.usage += 1;
        Ok(())
    }

    /// Switches tier; the limit follows the plan, existing usage is kept
    pub fn change_plan(&mut self, plan: Plan) {
        self.plan = plan;
        self.usage_limit = plan.quota();
    }
}
