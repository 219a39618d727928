//! [`PriorityTable`] – static role → priority mapping.
//!
//! Priorities are expressed as offsets above the minimum of the platform's
//! fixed-priority class, so the same table works whatever numeric range the
//! [`Scheduler`][crate::scheduler::Scheduler] reports.  The orchestrator sits
//! just below the class maximum, above every child, for the duration of the
//! boot sequence.
//!
//! | Role | Priority |
//! |---|---|
//! | orchestrator | `max - 1` |
//! | supervisor | `min + 10` |
//! | publisher | `min + 9` |
//! | led | `min + 8` |
//! | light_sensor | `min + 7` |
//! | internal_temp | `min + 6` |

use vigil_types::{NodeError, ThreadRole};

/// Inclusive numeric range of a fixed-priority scheduling class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityRange {
    pub min: i32,
    pub max: i32,
}

/// Per-role priority offsets.  Fixed for the process lifetime once the
/// orchestrator has been built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityTable {
    pub supervisor: i32,
    pub publisher: i32,
    pub led: i32,
    pub light_sensor: i32,
    pub internal_temp: i32,
}

impl Default for PriorityTable {
    fn default() -> Self {
        Self {
            supervisor: 10,
            publisher: 9,
            led: 8,
            light_sensor: 7,
            internal_temp: 6,
        }
    }
}

impl PriorityTable {
    /// Roles in strictly descending priority order.
    pub const CHILD_ORDER: [ThreadRole; 5] = [
        ThreadRole::Supervisor,
        ThreadRole::Publisher,
        ThreadRole::Led,
        ThreadRole::LightSensor,
        ThreadRole::InternalTemp,
    ];

    /// Offset of `role` above the class minimum.  `None` for the
    /// orchestrator, whose priority is anchored to the class maximum.
    pub fn offset(&self, role: ThreadRole) -> Option<i32> {
        match role {
            ThreadRole::Orchestrator => None,
            ThreadRole::Supervisor => Some(self.supervisor),
            ThreadRole::Publisher => Some(self.publisher),
            ThreadRole::Led => Some(self.led),
            ThreadRole::LightSensor => Some(self.light_sensor),
            ThreadRole::InternalTemp => Some(self.internal_temp),
        }
    }

    /// Absolute priority of `role` inside `range`.
    pub fn priority_for(&self, role: ThreadRole, range: PriorityRange) -> i32 {
        match self.offset(role) {
            Some(offset) => range.min + offset,
            None => range.max - 1,
        }
    }

    /// Check the ordering invariants without a concrete range: every offset
    /// is non-negative and strictly below the one of the role ranked above.
    pub fn check_order(&self) -> Result<(), NodeError> {
        let mut above: Option<(ThreadRole, i32)> = None;
        for role in Self::CHILD_ORDER {
            let offset = self.offset(role).unwrap_or_default();
            if offset < 0 {
                return Err(NodeError::Initialization(format!(
                    "priority offset for {role} is negative ({offset})"
                )));
            }
            if let Some((upper, upper_offset)) = above
                && offset >= upper_offset
            {
                return Err(NodeError::Initialization(format!(
                    "{role} priority offset {offset} must be below {upper} ({upper_offset})"
                )));
            }
            above = Some((role, offset));
        }
        Ok(())
    }

    /// Validate the table against a concrete class range: ordering holds
    /// and every child stays strictly below the orchestrator.
    pub fn validate(&self, range: PriorityRange) -> Result<(), NodeError> {
        self.check_order()?;
        let orchestrator = self.priority_for(ThreadRole::Orchestrator, range);
        let top = self.priority_for(ThreadRole::Supervisor, range);
        if orchestrator < range.min || top >= orchestrator {
            return Err(NodeError::Initialization(format!(
                "supervisor priority {top} does not fit below the orchestrator \
                 priority {orchestrator} (class range {}..={})",
                range.min, range.max
            )));
        }
        Ok(())
    }
}
