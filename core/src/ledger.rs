//! Per-persona progression state machine.
//!
//! The ledger is mutated only through [`ProgressionLedger::select_goal`] and
//! [`ProgressionLedger::complete_quest`]. Completions remember the goal each
//! quest belonged to, so per-goal counts are computed by goal id equality.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ProgressionError;
use crate::events::ProgressEvent;
use crate::quest::Quest;
use crate::reward::{self, AchievementBadge, Reward};

/// Points needed per level: level `n` ends at `n * 500` lifetime points.
pub const LEVEL_POINTS_STEP: u64 = 500;
/// Every this many completions for one goal unlocks a supplemental batch.
pub const MILESTONE_INTERVAL: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionLedger {
    total_points: u64,
    level: u32,
    /// quest id -> goal id
    completed: HashMap<String, String>,
    current_goal_id: Option<String>,
    unlocked_products: Vec<String>,
}

impl Default for ProgressionLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a successful completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Completion {
    pub quest_id: String,
    pub reward: Reward,
    pub total_points: u64,
    pub level: u32,
    /// New level when this completion crossed a threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_up: Option<u32>,
    /// Products unlocked for the first time by this completion
    pub newly_unlocked: Vec<String>,
    pub completed_for_goal: usize,
    /// True on the 3rd, 6th, 9th, ... completion for the goal
    pub milestone_reached: bool,
    pub events: Vec<ProgressEvent>,
}

impl ProgressionLedger {
    pub fn new() -> Self {
        Self {
            total_points: 0,
            level: 1,
            completed: HashMap::new(),
            current_goal_id: None,
            unlocked_products: Vec::new(),
        }
    }

    pub fn total_points(&self) -> u64 {
        self.total_points
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn current_goal_id(&self) -> Option<&str> {
        self.current_goal_id.as_deref()
    }

    pub fn unlocked_products(&self) -> &[String] {
        &self.unlocked_products
    }

    pub fn is_completed(&self, quest_id: &str) -> bool {
        self.completed.contains_key(quest_id)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Completed quest ids, sorted for stable presentation.
    pub fn completed_quest_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.completed.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn completed_for_goal(&self, goal_id: &str) -> usize {
        self.completed
            .values()
            .filter(|completed_goal| completed_goal.as_str() == goal_id)
            .count()
    }

    pub fn badge(&self) -> AchievementBadge {
        AchievementBadge::for_total(self.total_points)
    }

    /// Make `goal_id` the active goal. Callers must discard the active quest
    /// batch; batches are never mixed across goals.
    pub fn select_goal(&mut self, goal_id: impl Into<String>) {
        self.current_goal_id = Some(goal_id.into());
    }

    /// Drop the active goal, e.g. when the catalog it came from was replaced.
    pub fn clear_goal(&mut self) {
        self.current_goal_id = None;
    }

    /// Preconditions of [`Self::complete_quest`], without side effects.
    pub fn check_completable(&self, quest: &Quest) -> Result<(), ProgressionError> {
        if self.is_completed(&quest.id) {
            return Err(ProgressionError::AlreadyCompleted {
                quest_id: quest.id.clone(),
            });
        }
        if self.current_goal_id.as_deref() != Some(quest.goal_id.as_str()) {
            return Err(ProgressionError::wrong_goal(
                &quest.id,
                &quest.goal_id,
                self.current_goal_id.as_deref(),
            ));
        }
        Ok(())
    }

    /// Record `quest` as completed and apply its reward. A rejected call
    /// leaves the ledger untouched.
    ///
    /// The level advances by at most one per completion, even when the
    /// payout would cross several thresholds.
    pub fn complete_quest(&mut self, quest: &Quest) -> Result<Completion, ProgressionError> {
        self.check_completable(quest)?;

        let badge_before = self.badge();
        let reward = reward::calculate(quest, self.level, self.total_points);
        let mut events = vec![ProgressEvent::QuestCompleted {
            quest_id: quest.id.clone(),
            goal_id: quest.goal_id.clone(),
            points_earned: reward.points_earned,
        }];

        self.completed.insert(quest.id.clone(), quest.goal_id.clone());
        self.total_points += reward.points_earned;

        let newly_unlocked: Vec<String> = reward
            .unlocked_products
            .iter()
            .filter(|product| !self.unlocked_products.contains(*product))
            .cloned()
            .collect();
        self.unlocked_products
            .extend(reward.unlocked_products.iter().cloned());
        if !newly_unlocked.is_empty() {
            events.push(ProgressEvent::ProductsUnlocked {
                products: newly_unlocked.clone(),
            });
        }

        let level_up = if self.total_points >= u64::from(self.level) * LEVEL_POINTS_STEP {
            self.level += 1;
            tracing::info!(level = self.level, total_points = self.total_points, "level up");
            events.push(ProgressEvent::LevelUp { level: self.level });
            Some(self.level)
        } else {
            None
        };

        let badge_after = self.badge();
        if badge_after != badge_before {
            events.push(ProgressEvent::BadgeEarned { badge: badge_after });
        }

        let completed_for_goal = self.completed_for_goal(&quest.goal_id);
        let milestone_reached = completed_for_goal > 0 && completed_for_goal % MILESTONE_INTERVAL == 0;
        if milestone_reached {
            tracing::info!(
                goal_id = %quest.goal_id,
                completed_for_goal,
                "goal milestone reached"
            );
            events.push(ProgressEvent::MilestoneReached {
                goal_id: quest.goal_id.clone(),
                completed_for_goal,
            });
        }

        Ok(Completion {
            quest_id: quest.id.clone(),
            reward,
            total_points: self.total_points,
            level: self.level,
            level_up,
            newly_unlocked,
            completed_for_goal,
            milestone_reached,
            events,
        })
    }
}

/// A submitted quiz answer: the option text or its index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum QuizAnswer {
    Index(usize),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QuestionFeedback {
    pub index: usize,
    pub correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted: Option<String>,
    pub correct_option: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QuizGrade {
    pub passed: bool,
    pub feedback: Vec<QuestionFeedback>,
}

/// Check `answers` against every question of `quest`. A missing answer
/// counts as incorrect; surplus answers are ignored.
pub fn grade_quiz(quest: &Quest, answers: &[QuizAnswer]) -> QuizGrade {
    let feedback: Vec<QuestionFeedback> = quest
        .questions()
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let submitted = answers.get(index).and_then(|answer| match answer {
                QuizAnswer::Index(i) => question.options.get(*i).cloned(),
                QuizAnswer::Text(text) => Some(text.trim().to_string()),
            });
            let correct = submitted.as_deref() == Some(question.correct_option());
            QuestionFeedback {
                index,
                correct,
                submitted,
                correct_option: question.correct_option().to_string(),
                explanation: question.explanation.clone(),
            }
        })
        .collect();

    QuizGrade {
        passed: !feedback.is_empty() && feedback.iter().all(|item| item.correct),
        feedback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quest::{QuestContent, QuizQuestion, Stage};
    use crate::reward::CALCULATOR_TOOL;

    fn quest(id: &str, goal_id: &str, points: u32) -> Quest {
        Quest {
            id: id.to_string(),
            goal_id: goal_id.to_string(),
            title: "T".to_string(),
            description: "D".to_string(),
            points,
            difficulty: "Easy".to_string(),
            estimated_time: "1-2 minutes".to_string(),
            unlock_reward: String::new(),
            stage: Stage::Beginner,
            content: QuestContent::Challenge,
        }
    }

    fn quiz(id: &str, goal_id: &str) -> Quest {
        Quest {
            content: QuestContent::Quiz {
                questions: vec![QuizQuestion {
                    question: "Which?".to_string(),
                    options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                    correct: 1,
                    explanation: "B is right".to_string(),
                }],
            },
            ..quest(id, goal_id, 150)
        }
    }

    #[test]
    fn starts_at_level_one_with_nothing() {
        let ledger = ProgressionLedger::new();
        assert_eq!(ledger.level(), 1);
        assert_eq!(ledger.total_points(), 0);
        assert!(ledger.current_goal_id().is_none());
        assert!(ledger.completed_quest_ids().is_empty());
    }

    #[test]
    fn completing_twice_changes_state_once() {
        let mut ledger = ProgressionLedger::new();
        ledger.select_goal("goal_a");
        let q = quest("q1", "goal_a", 100);

        ledger.complete_quest(&q).unwrap();
        let after_first = ledger.clone();

        let err = ledger.complete_quest(&q).expect_err("second completion must be rejected");
        assert_eq!(err, ProgressionError::AlreadyCompleted { quest_id: "q1".to_string() });
        assert!(err.is_state_conflict());
        assert_eq!(ledger, after_first);
    }

    #[test]
    fn quest_outside_active_goal_is_rejected() {
        let mut ledger = ProgressionLedger::new();
        ledger.select_goal("goal_a");
        let err = ledger
            .complete_quest(&quest("q1", "goal_b", 100))
            .expect_err("wrong goal must be rejected");
        assert!(matches!(err, ProgressionError::WrongGoalContext { .. }));
        assert_eq!(ledger.total_points(), 0);
    }

    #[test]
    fn no_active_goal_is_wrong_context() {
        let mut ledger = ProgressionLedger::new();
        let err = ledger.complete_quest(&quest("q1", "goal_a", 100)).unwrap_err();
        assert!(matches!(err, ProgressionError::WrongGoalContext { .. }));
    }

    #[test]
    fn every_completion_appends_its_unlocks() {
        let mut ledger = ProgressionLedger::new();
        ledger.select_goal("goal_a");

        let first = ledger.complete_quest(&quest("q1", "goal_a", 200)).unwrap();
        assert_eq!(first.reward.points_earned, 220);
        assert_eq!(first.newly_unlocked, vec![CALCULATOR_TOOL.to_string()]);

        let second = ledger.complete_quest(&quest("q2", "goal_a", 200)).unwrap();
        assert_eq!(second.reward.unlocked_products, vec![CALCULATOR_TOOL.to_string()]);
        assert!(second.newly_unlocked.is_empty());
        assert_eq!(
            ledger.unlocked_products(),
            &[CALCULATOR_TOOL.to_string(), CALCULATOR_TOOL.to_string()]
        );
    }

    #[test]
    fn level_advances_one_step_per_completion() {
        let mut ledger = ProgressionLedger::new();
        ledger.select_goal("goal_a");

        // 2000 * 1.1 = 2200 points crosses the 500, 1000, 1500 and 2000 thresholds.
        let completion = ledger.complete_quest(&quest("q1", "goal_a", 2000)).unwrap();
        assert_eq!(completion.total_points, 2200);
        assert_eq!(completion.level_up, Some(2));
        assert_eq!(ledger.level(), 2);

        let completion = ledger.complete_quest(&quest("q2", "goal_a", 10)).unwrap();
        assert_eq!(completion.level_up, Some(3));
    }

    #[test]
    fn no_level_up_below_threshold() {
        let mut ledger = ProgressionLedger::new();
        ledger.select_goal("goal_a");
        let completion = ledger.complete_quest(&quest("q1", "goal_a", 100)).unwrap();
        assert_eq!(completion.level_up, None);
        assert_eq!(ledger.level(), 1);
    }

    #[test]
    fn milestones_fire_every_third_completion_per_goal() {
        let mut ledger = ProgressionLedger::new();
        ledger.select_goal("goal_a");
        let flags: Vec<bool> = (0..9)
            .map(|i| {
                ledger
                    .complete_quest(&quest(&format!("q{i}"), "goal_a", 100))
                    .unwrap()
                    .milestone_reached
            })
            .collect();
        assert_eq!(
            flags,
            vec![false, false, true, false, false, true, false, false, true]
        );
    }

    #[test]
    fn per_goal_counts_ignore_other_goals() {
        let mut ledger = ProgressionLedger::new();
        ledger.select_goal("goal_a");
        ledger.complete_quest(&quest("a1", "goal_a", 100)).unwrap();
        ledger.complete_quest(&quest("a2", "goal_a", 100)).unwrap();

        ledger.select_goal("goal_b");
        let completion = ledger.complete_quest(&quest("b1", "goal_b", 100)).unwrap();
        assert_eq!(completion.completed_for_goal, 1);
        assert!(!completion.milestone_reached);
        assert_eq!(ledger.completed_for_goal("goal_a"), 2);
    }

    #[test]
    fn total_points_never_decrease() {
        let mut ledger = ProgressionLedger::new();
        ledger.select_goal("goal_a");
        let mut previous = 0;
        for i in 0..20 {
            let completion = ledger
                .complete_quest(&quest(&format!("q{i}"), "goal_a", 50 + i * 37))
                .unwrap();
            assert!(completion.total_points >= previous);
            previous = completion.total_points;
        }
    }

    #[test]
    fn correct_quiz_answer_passes() {
        let q = quiz("quiz1", "goal_a");
        let grade = grade_quiz(&q, &[QuizAnswer::Text("B".to_string())]);
        assert!(grade.passed);
        assert!(grade.feedback[0].correct);
    }

    #[test]
    fn wrong_quiz_answer_reports_incorrect_with_explanation() {
        let q = quiz("quiz1", "goal_a");
        let grade = grade_quiz(&q, &[QuizAnswer::Text("A".to_string())]);
        assert!(!grade.passed);
        assert!(!grade.feedback[0].correct);
        assert_eq!(grade.feedback[0].correct_option, "B");
        assert_eq!(grade.feedback[0].explanation, "B is right");
    }

    #[test]
    fn quiz_answer_by_index_and_missing_answers() {
        let q = quiz("quiz1", "goal_a");
        assert!(grade_quiz(&q, &[QuizAnswer::Index(1)]).passed);
        assert!(!grade_quiz(&q, &[QuizAnswer::Index(7)]).passed);
        assert!(!grade_quiz(&q, &[]).passed);
    }

    #[test]
    fn quiz_answers_deserialize_from_text_or_index() {
        let answers: Vec<QuizAnswer> = serde_json::from_str(r#"["B", 2]"#).unwrap();
        assert_eq!(answers, vec![QuizAnswer::Text("B".to_string()), QuizAnswer::Index(2)]);
    }
}
