use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::reward::AchievementBadge;

/// Something that happened to a ledger as a result of one operation.
/// Presentation layers use these to celebrate (level-up balloons, unlock
/// banners) without diffing snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum ProgressEvent {
    QuestCompleted {
        quest_id: String,
        goal_id: String,
        points_earned: u64,
    },
    ProductsUnlocked {
        products: Vec<String>,
    },
    LevelUp {
        level: u32,
    },
    BadgeEarned {
        badge: AchievementBadge,
    },
    MilestoneReached {
        goal_id: String,
        completed_for_goal: usize,
    },
    SupplementalQuestsAdded {
        goal_id: String,
        quest_ids: Vec<String>,
    },
}
