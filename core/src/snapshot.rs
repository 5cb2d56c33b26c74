use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::ledger::ProgressionLedger;
use crate::persona::Persona;
use crate::quest::Quest;
use crate::reward::AchievementBadge;

/// Points at which the overall journey bar is full.
pub const JOURNEY_POINTS: u64 = 2000;

/// Read model of one session's progression. Presentation layers render
/// this; they never read the ledger directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProgressSnapshot {
    pub persona: Persona,
    pub total_points: u64,
    pub level: u32,
    /// Sorted
    pub completed_quest_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_goal_id: Option<String>,
    pub unlocked_products: Vec<String>,
    pub achievement_badge: AchievementBadge,
    /// Share of the journey completed, 0.0 to 1.0
    pub journey_progress: f64,
    /// Completed quests as a percentage of the active batch size
    pub completion_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_progress: Option<GoalProgress>,
    pub computed_at: DateTime<Utc>,
}

/// Progress on the current goal, counted over the active quest batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GoalProgress {
    pub goal_id: String,
    pub completed: usize,
    pub total: usize,
    pub percent: f64,
}

impl ProgressSnapshot {
    pub fn compute(
        persona: &Persona,
        ledger: &ProgressionLedger,
        active_quests: &[Quest],
        now: DateTime<Utc>,
    ) -> Self {
        let total_points = ledger.total_points();
        let completed = ledger.completed_count();
        let journey_progress = (total_points as f64 / JOURNEY_POINTS as f64).min(1.0);
        let completion_rate = completed as f64 / active_quests.len().max(1) as f64 * 100.0;

        let goal_progress = ledger.current_goal_id().map(|goal_id| {
            let batch: Vec<&Quest> = active_quests
                .iter()
                .filter(|quest| quest.goal_id == goal_id)
                .collect();
            let done = batch.iter().filter(|quest| ledger.is_completed(&quest.id)).count();
            let percent = if batch.is_empty() {
                0.0
            } else {
                done as f64 / batch.len() as f64 * 100.0
            };
            GoalProgress {
                goal_id: goal_id.to_string(),
                completed: done,
                total: batch.len(),
                percent,
            }
        });

        Self {
            persona: persona.clone(),
            total_points,
            level: ledger.level(),
            completed_quest_ids: ledger.completed_quest_ids(),
            current_goal_id: ledger.current_goal_id().map(str::to_string),
            unlocked_products: ledger.unlocked_products().to_vec(),
            achievement_badge: ledger.badge(),
            journey_progress,
            completion_rate,
            goal_progress,
            computed_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::{default_quests, health_goal, health_quiz_quests};
    use crate::persona::find_persona;
    use crate::quest::Stage;

    #[test]
    fn fresh_session_snapshot_is_empty() {
        let tom = find_persona("tom_carter").unwrap();
        let snapshot = ProgressSnapshot::compute(&tom, &ProgressionLedger::new(), &[], Utc::now());
        assert_eq!(snapshot.level, 1);
        assert_eq!(snapshot.journey_progress, 0.0);
        assert_eq!(snapshot.completion_rate, 0.0);
        assert_eq!(snapshot.achievement_badge, AchievementBadge::Starter);
        assert!(snapshot.goal_progress.is_none());
    }

    #[test]
    fn goal_progress_counts_the_active_batch() {
        let tom = find_persona("tom_carter").unwrap();
        let goal = health_goal();
        let mut quests = default_quests(&goal, Stage::Beginner);
        quests.extend(health_quiz_quests(&goal, Stage::Beginner));

        let mut ledger = ProgressionLedger::new();
        ledger.select_goal(&goal.id);
        ledger.complete_quest(&quests[0]).unwrap();

        let snapshot = ProgressSnapshot::compute(&tom, &ledger, &quests, Utc::now());
        let progress = snapshot.goal_progress.expect("goal is selected");
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.total, 4);
        assert_eq!(progress.percent, 25.0);
        assert_eq!(snapshot.completion_rate, 25.0);
        assert_eq!(snapshot.completed_quest_ids, vec![quests[0].id.clone()]);
    }

    #[test]
    fn journey_progress_is_capped() {
        let tom = find_persona("tom_carter").unwrap();
        let goal = health_goal();
        let mut quest = default_quests(&goal, Stage::Beginner).remove(0);
        quest.points = 5000;

        let mut ledger = ProgressionLedger::new();
        ledger.select_goal(&goal.id);
        ledger.complete_quest(&quest).unwrap();

        let snapshot = ProgressSnapshot::compute(&tom, &ledger, &[quest], Utc::now());
        assert_eq!(snapshot.journey_progress, 1.0);
    }
}
