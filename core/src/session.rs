//! Session aggregate: one persona, its ledger, and the derived catalogs.
//!
//! Every consumer-facing operation runs against a [`Session`]. The generative
//! collaborators live in a shared [`Coach`], which holds no per-user state.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::catalog::GoalCatalogBuilder;
use crate::config::GeneratorConfig;
use crate::error::{GenerationIssue, ProgressionError};
use crate::events::ProgressEvent;
use crate::generation::{self, GenerationError, TextGenerator};
use crate::goal::Goal;
use crate::ledger::{Completion, ProgressionLedger, QuizAnswer, QuizGrade, grade_quiz};
use crate::nudge::{self, CoachAnswer, NextBestAction};
use crate::persona::{Persona, ProfileUpdate, find_persona};
use crate::prompts::{PromptConfigError, PromptTemplates};
use crate::quest::Quest;
use crate::sequencer::{QuestBatch, QuestSequencer};
use crate::snapshot::ProgressSnapshot;

#[derive(Debug, thiserror::Error)]
pub enum CoachSetupError {
    #[error(transparent)]
    Prompts(#[from] PromptConfigError),
    #[error("generator setup failed: {0}")]
    Generator(#[from] GenerationError),
}

/// Generative collaborators shared by all sessions.
pub struct Coach {
    generator: Arc<dyn TextGenerator>,
    prompts: Arc<PromptTemplates>,
    catalog: GoalCatalogBuilder,
    sequencer: QuestSequencer,
}

impl Coach {
    pub fn new(generator: Arc<dyn TextGenerator>, prompts: PromptTemplates) -> Self {
        let prompts = Arc::new(prompts);
        Self {
            catalog: GoalCatalogBuilder::new(generator.clone(), prompts.clone()),
            sequencer: QuestSequencer::new(generator.clone(), prompts.clone()),
            generator,
            prompts,
        }
    }

    /// Generator and prompt templates configured from the environment.
    pub fn from_env() -> Result<Self, CoachSetupError> {
        let config = GeneratorConfig::from_env();
        let generator = generation::from_config(&config)?;
        let prompts = PromptTemplates::from_env()?;
        tracing::info!(
            generator = generator.id(),
            base_url = %config.base_url,
            model = %config.model,
            "coach configured"
        );
        Ok(Self::new(generator, prompts))
    }

    pub fn generator_id(&self) -> &str {
        self.generator.id()
    }
}

/// Outcome of a completion attempt that was not a state conflict.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompletionResult {
    Completed {
        completion: Completion,
        /// Quests appended because this completion reached a milestone
        supplemental_quests: Vec<Quest>,
        #[serde(skip_serializing_if = "Option::is_none")]
        quiz: Option<QuizGrade>,
    },
    /// Wrong quiz answers: nothing was recorded
    QuizFailed { quest_id: String, grade: QuizGrade },
}

impl CompletionResult {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Catalog rebuild outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CatalogView {
    pub goals: Vec<Goal>,
    /// True when deterministic defaults replaced generated goals
    pub fallback: bool,
    /// True when the previously active goal vanished and was cleared
    pub goal_cleared: bool,
}

pub struct Session {
    persona: Persona,
    ledger: ProgressionLedger,
    goals: Vec<Goal>,
    active_quests: Vec<Quest>,
    /// Every goal id handed out in this session, with the goal it named
    issued_goals: HashMap<String, Goal>,
    coach: Arc<Coach>,
}

impl Session {
    pub fn new(persona: Persona, coach: Arc<Coach>) -> Self {
        Self {
            persona,
            ledger: ProgressionLedger::new(),
            goals: Vec::new(),
            active_quests: Vec::new(),
            issued_goals: HashMap::new(),
            coach,
        }
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn ledger(&self) -> &ProgressionLedger {
        &self.ledger
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn active_quests(&self) -> &[Quest] {
        &self.active_quests
    }

    pub fn current_goal(&self) -> Option<&Goal> {
        let goal_id = self.ledger.current_goal_id()?;
        self.goals.iter().find(|goal| goal.id == goal_id)
    }

    /// Replace the goal catalog. If the active goal is no longer in the new
    /// catalog, the goal and its quest batch are dropped.
    pub async fn build_catalog(&mut self) -> CatalogView {
        let coach = Arc::clone(&self.coach);
        let validated = coach.catalog.build(&self.persona).await;
        self.goals = self.reissue_reused_ids(validated.items);

        let dangling = self
            .ledger
            .current_goal_id()
            .is_some_and(|goal_id| !self.goals.iter().any(|goal| goal.id == goal_id));
        if dangling {
            tracing::info!(
                persona = %self.persona.key,
                goal_id = self.ledger.current_goal_id().unwrap_or_default(),
                "active goal missing from new catalog; clearing"
            );
            self.ledger.clear_goal();
            self.active_quests.clear();
        }

        CatalogView {
            goals: self.goals.clone(),
            fallback: validated.fallback.is_some(),
            goal_cleared: dangling,
        }
    }

    /// Give a fresh id to any goal whose id was already issued in this
    /// session for a different objective. Completions and the active goal
    /// are keyed by goal id, so an id must never change meaning.
    fn reissue_reused_ids(&mut self, goals: Vec<Goal>) -> Vec<Goal> {
        let mut taken: Vec<String> = goals.iter().map(|goal| goal.id.clone()).collect();
        let goals: Vec<Goal> = goals
            .into_iter()
            .map(|mut goal| {
                let reused = self
                    .issued_goals
                    .get(&goal.id)
                    .is_some_and(|issued| !issued.same_objective(&goal));
                if reused {
                    let mut n = 2;
                    let mut candidate = format!("{}-{n}", goal.id);
                    while taken.contains(&candidate)
                        || self
                            .issued_goals
                            .get(&candidate)
                            .is_some_and(|issued| !issued.same_objective(&goal))
                    {
                        n += 1;
                        candidate = format!("{}-{n}", goal.id);
                    }
                    tracing::debug!(
                        persona = %self.persona.key,
                        from = %goal.id,
                        to = %candidate,
                        "goal id reused for a different objective; reissued"
                    );
                    taken.push(candidate.clone());
                    goal.id = candidate;
                }
                goal
            })
            .collect();

        for goal in &goals {
            self.issued_goals.insert(goal.id.clone(), goal.clone());
        }
        goals
    }

    /// Make `goal_id` the active goal and discard the quest batch.
    pub fn select_goal(&mut self, goal_id: &str) -> Result<&Goal, ProgressionError> {
        let index = self
            .goals
            .iter()
            .position(|goal| goal.id == goal_id)
            .ok_or_else(|| ProgressionError::GoalNotFound(goal_id.to_string()))?;
        self.ledger.select_goal(goal_id);
        self.active_quests.clear();
        tracing::info!(persona = %self.persona.key, goal_id, "goal selected");
        Ok(&self.goals[index])
    }

    /// Generate a fresh batch for the active goal, replacing the current one.
    pub async fn generate_quests(&mut self, goal_id: &str) -> Result<QuestBatch, ProgressionError> {
        let goal = self
            .goals
            .iter()
            .find(|goal| goal.id == goal_id)
            .cloned()
            .ok_or_else(|| ProgressionError::GoalNotFound(goal_id.to_string()))?;
        if self.ledger.current_goal_id() != Some(goal_id) {
            return Err(ProgressionError::goal_not_selected(
                goal_id,
                self.ledger.current_goal_id(),
            ));
        }

        let completed = self.ledger.completed_for_goal(goal_id);
        let coach = Arc::clone(&self.coach);
        let batch = coach.sequencer.generate(&goal, &self.persona, completed).await;
        self.active_quests = batch.quests.clone();
        Ok(batch)
    }

    /// Complete a quest from the active batch. Quizzes are graded first and
    /// wrong answers leave the ledger untouched. A milestone completion
    /// appends a supplemental batch.
    pub async fn complete_quest(
        &mut self,
        quest_id: &str,
        answers: Option<&[QuizAnswer]>,
    ) -> Result<CompletionResult, ProgressionError> {
        let quest = self
            .active_quests
            .iter()
            .find(|quest| quest.id == quest_id)
            .cloned()
            .ok_or_else(|| ProgressionError::QuestNotFound(quest_id.to_string()))?;
        self.ledger.check_completable(&quest)?;

        let quiz = if quest.is_quiz() {
            let grade = grade_quiz(&quest, answers.unwrap_or_default());
            if !grade.passed {
                tracing::debug!(quest_id, "quiz answers incorrect; quest not completed");
                return Ok(CompletionResult::QuizFailed {
                    quest_id: quest.id,
                    grade,
                });
            }
            Some(grade)
        } else {
            None
        };

        let mut completion = self.ledger.complete_quest(&quest)?;
        let mut supplemental_quests = Vec::new();

        if completion.milestone_reached {
            match self.goals.iter().find(|goal| goal.id == quest.goal_id).cloned() {
                Some(goal) => {
                    let coach = Arc::clone(&self.coach);
                    let batch = coach
                        .sequencer
                        .generate_supplemental(&goal, &self.persona, completion.completed_for_goal)
                        .await;
                    completion.events.push(ProgressEvent::SupplementalQuestsAdded {
                        goal_id: goal.id.clone(),
                        quest_ids: batch.quests.iter().map(|q| q.id.clone()).collect(),
                    });
                    self.active_quests.extend(batch.quests.iter().cloned());
                    supplemental_quests = batch.quests;
                }
                None => {
                    let issue = GenerationIssue::InvariantViolation(format!(
                        "milestone goal '{}' missing from catalog",
                        quest.goal_id
                    ));
                    tracing::warn!(issue_kind = issue.kind(), reason = %issue, "skipping supplemental quests");
                }
            }
        }

        Ok(CompletionResult::Completed {
            completion,
            supplemental_quests,
            quiz,
        })
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot::compute(&self.persona, &self.ledger, &self.active_quests, Utc::now())
    }

    /// Edit the persona in place. Progression is kept.
    pub fn update_profile(&mut self, update: ProfileUpdate) -> Result<&Persona, ProgressionError> {
        self.persona.apply_update(update)?;
        Ok(&self.persona)
    }

    /// Switch to another built-in persona. Progression and both catalogs
    /// are reset.
    pub fn switch_persona(&mut self, persona_key: &str) -> Result<&Persona, ProgressionError> {
        let persona = find_persona(persona_key)?;
        tracing::info!(from = %self.persona.key, to = %persona.key, "persona switched; session reset");
        self.persona = persona;
        self.ledger = ProgressionLedger::new();
        self.goals.clear();
        self.active_quests.clear();
        self.issued_goals.clear();
        Ok(&self.persona)
    }

    pub async fn next_best_action(&self) -> NextBestAction {
        nudge::next_best_action(
            self.coach.generator.as_ref(),
            &self.coach.prompts,
            &self.persona,
            &self.ledger,
            self.current_goal(),
        )
        .await
    }

    pub async fn ask_coach(&self, question: &str) -> CoachAnswer {
        let goal = self
            .current_goal()
            .map(|goal| goal.title.as_str())
            .unwrap_or("none selected");
        let progress = format!(
            "Level {}, {} points, {} quests completed. Current goal: {goal}",
            self.ledger.level(),
            self.ledger.total_points(),
            self.ledger.completed_count(),
        );
        nudge::ask_coach(
            self.coach.generator.as_ref(),
            &self.coach.prompts,
            &self.persona,
            &progress,
            question,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::fallback::HEALTH_GOAL_ID;
    use crate::generation::ScriptedGenerator;
    use crate::quest::QuestKind;

    fn session_with(generator: ScriptedGenerator) -> (Session, Arc<ScriptedGenerator>) {
        let generator = Arc::new(generator);
        let coach = Arc::new(Coach::new(generator.clone(), PromptTemplates::default()));
        let session = Session::new(find_persona("tom_carter").unwrap(), coach);
        (session, generator)
    }

    fn challenge_payload(count: usize) -> String {
        let quests: Vec<serde_json::Value> = (0..count)
            .map(|i| json!({ "title": format!("Challenge {i}"), "description": "Do it", "type": "challenge" }))
            .collect();
        serde_json::Value::Array(quests).to_string()
    }

    fn correct_answers(quest: &Quest) -> Vec<QuizAnswer> {
        quest
            .questions()
            .iter()
            .map(|q| QuizAnswer::Index(q.correct))
            .collect()
    }

    #[tokio::test]
    async fn offline_session_runs_entirely_on_defaults() {
        let (mut session, _) = session_with(ScriptedGenerator::new());

        let catalog = session.build_catalog().await;
        assert!(catalog.fallback);
        assert_eq!(catalog.goals[0].id, HEALTH_GOAL_ID);

        session.select_goal(HEALTH_GOAL_ID).unwrap();
        let batch = session.generate_quests(HEALTH_GOAL_ID).await.unwrap();
        assert_eq!(batch.quests.len(), 4);

        let learning = batch.quests[0].clone();
        let result = session.complete_quest(&learning.id, None).await.unwrap();
        assert!(result.is_completed());
        assert_eq!(session.ledger().total_points(), 110);
    }

    #[tokio::test]
    async fn generating_for_unselected_goal_is_rejected() {
        let (mut session, _) = session_with(ScriptedGenerator::new());
        session.build_catalog().await;
        let err = session.generate_quests(HEALTH_GOAL_ID).await.unwrap_err();
        assert!(matches!(err, ProgressionError::GoalNotSelected { .. }));

        let err = session.select_goal("goal_missing").unwrap_err();
        assert_eq!(err, ProgressionError::GoalNotFound("goal_missing".to_string()));
    }

    #[tokio::test]
    async fn selecting_a_goal_clears_the_batch() {
        let (mut session, _) = session_with(ScriptedGenerator::new());
        session.build_catalog().await;
        session.select_goal(HEALTH_GOAL_ID).unwrap();
        session.generate_quests(HEALTH_GOAL_ID).await.unwrap();
        assert!(!session.active_quests().is_empty());

        session.select_goal("goal_emergency").unwrap();
        assert!(session.active_quests().is_empty());
    }

    #[tokio::test]
    async fn wrong_quiz_answer_records_nothing() {
        let (mut session, _) = session_with(ScriptedGenerator::new());
        session.build_catalog().await;
        session.select_goal(HEALTH_GOAL_ID).unwrap();
        let batch = session.generate_quests(HEALTH_GOAL_ID).await.unwrap();
        let quiz = batch.quests.iter().find(|q| q.is_quiz()).unwrap().clone();

        let wrong = vec![QuizAnswer::Index((quiz.questions()[0].correct + 1) % 4)];
        let result = session.complete_quest(&quiz.id, Some(&wrong)).await.unwrap();
        assert!(matches!(result, CompletionResult::QuizFailed { .. }));
        assert_eq!(session.ledger().total_points(), 0);

        let result = session
            .complete_quest(&quiz.id, Some(&correct_answers(&quiz)))
            .await
            .unwrap();
        assert!(result.is_completed());
        assert_eq!(session.ledger().total_points(), 165);
    }

    #[tokio::test]
    async fn completing_twice_is_a_state_conflict() {
        let (mut session, _) = session_with(ScriptedGenerator::new());
        session.build_catalog().await;
        session.select_goal(HEALTH_GOAL_ID).unwrap();
        let batch = session.generate_quests(HEALTH_GOAL_ID).await.unwrap();
        let id = batch.quests[0].id.clone();

        session.complete_quest(&id, None).await.unwrap();
        let snapshot = session.snapshot();
        let err = session.complete_quest(&id, None).await.unwrap_err();
        assert!(err.is_state_conflict());
        assert_eq!(session.snapshot().total_points, snapshot.total_points);
    }

    #[tokio::test]
    async fn third_completion_appends_supplemental_actions() {
        let (mut session, generator) = session_with(ScriptedGenerator::new());
        session.build_catalog().await;
        session.select_goal("goal_emergency").unwrap();

        generator.push(Ok(challenge_payload(4)));
        let batch = session.generate_quests("goal_emergency").await.unwrap();
        assert_eq!(batch.quests.len(), 4);

        let mut appended = Vec::new();
        for quest in &batch.quests[..3] {
            match session.complete_quest(&quest.id, None).await.unwrap() {
                CompletionResult::Completed { supplemental_quests, .. } => {
                    appended.push(supplemental_quests.len())
                }
                CompletionResult::QuizFailed { .. } => panic!("not a quiz"),
            }
        }
        assert_eq!(appended, vec![0, 0, 1]);
        assert_eq!(session.active_quests().len(), 5);
        let added = session.active_quests().last().unwrap();
        assert_eq!(added.kind(), QuestKind::Action);
        assert_eq!(added.goal_id, "goal_emergency");
    }

    #[tokio::test]
    async fn rebuilt_catalog_without_active_goal_clears_it() {
        let (mut session, generator) = session_with(ScriptedGenerator::new());
        session.build_catalog().await;
        session.select_goal("goal_life_insurance").unwrap();

        generator.push(Ok(json!([{
            "id": "goal_1", "title": "Retire", "description": "d", "priority": "Low",
            "timeline": "Long term", "category": "Retirement Planning"
        }])
        .to_string()));
        let view = session.build_catalog().await;
        assert!(view.goal_cleared);
        assert!(session.ledger().current_goal_id().is_none());
        assert!(session.active_quests().is_empty());
    }

    fn single_goal_catalog(title: &str, category: &str) -> String {
        json!([{
            "id": "goal_1", "title": title, "description": "d", "priority": "High",
            "timeline": "Long term", "category": category
        }])
        .to_string()
    }

    #[tokio::test]
    async fn rebuilt_catalog_reusing_an_id_for_another_goal_clears_it() {
        let (mut session, generator) = session_with(ScriptedGenerator::new());
        generator.push(Ok(single_goal_catalog("Pay Off Credit Card", "Debt Management")));
        session.build_catalog().await;
        session.select_goal("goal_1").unwrap();

        let debt_quests: Vec<serde_json::Value> = (0..3)
            .map(|i| json!({ "title": format!("Debt task {i}"), "description": "d", "type": "learning" }))
            .collect();
        generator.push(Ok(serde_json::Value::Array(debt_quests).to_string()));
        let batch = session.generate_quests("goal_1").await.unwrap();
        for quest in &batch.quests[..2] {
            session.complete_quest(&quest.id, None).await.unwrap();
        }

        generator.push(Ok(single_goal_catalog("Start Retirement Pension", "Retirement Planning")));
        let view = session.build_catalog().await;
        assert!(view.goal_cleared);
        assert!(session.ledger().current_goal_id().is_none());
        assert!(session.active_quests().is_empty());

        let retirement = session
            .goals()
            .iter()
            .find(|goal| goal.title == "Start Retirement Pension")
            .unwrap()
            .clone();
        assert_ne!(retirement.id, "goal_1");
        assert_eq!(session.ledger().completed_for_goal(&retirement.id), 0);

        let err = session.complete_quest(&batch.quests[2].id, None).await.unwrap_err();
        assert_eq!(err, ProgressionError::QuestNotFound(batch.quests[2].id.clone()));
        assert_eq!(session.ledger().completed_for_goal("goal_1"), 2);
    }

    #[tokio::test]
    async fn rebuilt_catalog_with_the_same_goal_keeps_the_selection() {
        let (mut session, generator) = session_with(ScriptedGenerator::new());
        generator.push(Ok(single_goal_catalog("Pay Off Credit Card", "Debt Management")));
        session.build_catalog().await;
        session.select_goal("goal_1").unwrap();
        session.generate_quests("goal_1").await.unwrap();
        let before = session.active_quests().len();

        generator.push(Ok(single_goal_catalog("Pay off credit card", "Debt Management")));
        let view = session.build_catalog().await;
        assert!(!view.goal_cleared);
        assert_eq!(session.ledger().current_goal_id(), Some("goal_1"));
        assert_eq!(session.active_quests().len(), before);
    }

    #[tokio::test]
    async fn switching_persona_resets_progress() {
        let (mut session, _) = session_with(ScriptedGenerator::new());
        session.build_catalog().await;
        session.select_goal(HEALTH_GOAL_ID).unwrap();
        let batch = session.generate_quests(HEALTH_GOAL_ID).await.unwrap();
        session.complete_quest(&batch.quests[0].id, None).await.unwrap();

        session.switch_persona("mike_rodriguez").unwrap();
        assert_eq!(session.persona().key, "mike_rodriguez");
        assert_eq!(session.ledger(), &ProgressionLedger::new());
        assert!(session.goals().is_empty());

        let err = session.switch_persona("nobody").unwrap_err();
        assert_eq!(err, ProgressionError::PersonaNotFound("nobody".to_string()));
    }

    #[tokio::test]
    async fn profile_update_keeps_progress() {
        let (mut session, _) = session_with(ScriptedGenerator::new());
        session.build_catalog().await;
        let update = ProfileUpdate {
            age: Some(41),
            ..ProfileUpdate::default()
        };
        assert_eq!(session.update_profile(update).unwrap().age, 41);
        assert!(!session.goals().is_empty());
    }

    #[tokio::test]
    async fn nudge_names_the_active_goal() {
        let (mut session, generator) = session_with(ScriptedGenerator::new());
        session.build_catalog().await;
        session.select_goal(HEALTH_GOAL_ID).unwrap();

        let nudge = session.next_best_action().await;
        assert!(nudge.message.contains("Tom"));
        let last = generator.requests().pop().unwrap();
        assert!(last.system_prompt.contains("Current goal: Get Comprehensive Health Insurance"));
    }
}
