use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::quest::Quest;

pub const CALCULATOR_TOOL: &str = "Premium Financial Calculator";
pub const TRIAL_PRODUCT: &str = "30-Day Insurance Trial";
pub const CONSULTATION_PRODUCT: &str = "Personal Finance Consultation";

/// Points-earned thresholds, cumulative: every threshold reached fires.
const UNLOCK_THRESHOLDS: &[(u64, &str)] = &[
    (200, CALCULATOR_TOOL),
    (400, TRIAL_PRODUCT),
    (600, CONSULTATION_PRODUCT),
];

/// Payout for one completed quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Reward {
    pub points_earned: u64,
    pub unlocked_products: Vec<String>,
    pub achievement_badge: AchievementBadge,
}

/// Calculate the payout for `quest` at `level`. The badge reflects lifetime
/// points once this payout is added to `lifetime_points`.
///
/// `points_earned = floor(base * (1 + level * 0.1))`, computed in integers as
/// `base * (10 + level) / 10`.
pub fn calculate(quest: &Quest, level: u32, lifetime_points: u64) -> Reward {
    let base = u64::from(quest.points_or_default());
    let points_earned = base * (10 + u64::from(level)) / 10;

    let unlocked_products = UNLOCK_THRESHOLDS
        .iter()
        .filter(|(threshold, _)| points_earned >= *threshold)
        .map(|(_, product)| product.to_string())
        .collect();

    Reward {
        points_earned,
        unlocked_products,
        achievement_badge: AchievementBadge::for_total(lifetime_points + points_earned),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AchievementBadge {
    Starter,
    Saver,
    Master,
    Champion,
}

impl AchievementBadge {
    /// Inclusive lower bounds on lifetime points, evaluated highest first.
    pub fn for_total(total_points: u64) -> Self {
        if total_points >= 1000 {
            Self::Champion
        } else if total_points >= 500 {
            Self::Master
        } else if total_points >= 200 {
            Self::Saver
        } else {
            Self::Starter
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Champion => "🏆 Financial Champion",
            Self::Master => "💎 Money Master",
            Self::Saver => "🌟 Smart Saver",
            Self::Starter => "🎯 Getting Started",
        }
    }
}
