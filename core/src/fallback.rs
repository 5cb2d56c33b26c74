//! Deterministic defaults used whenever generative output is unusable.

use crate::goal::{Goal, Priority, Timeline};
use crate::persona::Persona;
use crate::quest::{Quest, QuestContent, QuizQuestion, Stage};

pub const HEALTH_GOAL_ID: &str = "goal_health";
pub const SUPPLEMENTAL_DEFAULT_POINTS: u32 = 250;

/// Deterministic health-coverage goal, used both as a baseline default and
/// when a generated catalog omits health coverage.
pub fn health_goal() -> Goal {
    Goal {
        id: HEALTH_GOAL_ID.to_string(),
        title: "Get Comprehensive Health Insurance".to_string(),
        description: "Secure health insurance coverage to protect against medical expenses"
            .to_string(),
        priority: Priority::High,
        timeline: Timeline::ShortTerm,
        category: "Health Insurance Coverage".to_string(),
        target_amount: Some(2000.0),
        difficulty: "Beginner".to_string(),
        why_important: "Health insurance is essential for financial security".to_string(),
    }
}

/// Baseline catalog: health coverage, emergency fund, and an age-gated third goal.
pub fn default_goals(persona: &Persona) -> Vec<Goal> {
    let emergency = Goal {
        id: "goal_emergency".to_string(),
        title: "Build Emergency Fund".to_string(),
        description: "Create a financial safety net covering 3-6 months of expenses".to_string(),
        priority: Priority::High,
        timeline: Timeline::MediumTerm,
        category: "Emergency Fund Building".to_string(),
        target_amount: Some(10000.0),
        difficulty: "Beginner".to_string(),
        why_important: "Emergency funds provide financial stability during unexpected situations"
            .to_string(),
    };

    let third = if persona.age < 30 {
        Goal {
            id: "goal_life_insurance".to_string(),
            title: "Get Life Insurance Coverage".to_string(),
            description:
                "Secure life insurance to protect dependents and future financial obligations"
                    .to_string(),
            priority: Priority::Medium,
            timeline: Timeline::ShortTerm,
            category: "Life Insurance Coverage".to_string(),
            target_amount: Some(1500.0),
            difficulty: "Beginner".to_string(),
            why_important: "Life insurance provides financial protection for loved ones"
                .to_string(),
        }
    } else {
        Goal {
            id: "goal_investment".to_string(),
            title: "Start Investment Portfolio".to_string(),
            description: "Begin investing for long-term wealth building and financial goals"
                .to_string(),
            priority: Priority::Medium,
            timeline: Timeline::MediumTerm,
            category: "Investment Planning".to_string(),
            target_amount: Some(5000.0),
            difficulty: "Intermediate".to_string(),
            why_important: "Investments help grow wealth and beat inflation over time".to_string(),
        }
    };

    vec![health_goal(), emergency, third]
}

const HEALTH_BASICS: &str = "# Health Insurance Basics

Health insurance is a contract between you and an insurance company that helps pay for medical expenses.

## Types of Coverage:
- **Hospital Insurance**: Covers hospital stays and treatments
- **Medical Insurance**: Covers doctor visits and outpatient care
- **Prescription Drug Coverage**: Covers medications
- **Specialist Care**: Covers specialist consultations

## Why It's Important:
- Protects against high medical costs
- Provides access to quality healthcare
- Offers peace of mind
- Required for financial security";

const EMERGENCY_BASICS: &str = "# Emergency Fund Basics

An emergency fund is a savings buffer to cover unexpected expenses, providing financial stability during tough times.

## Why You Need an Emergency Fund:
- **Financial Security**: Protects against unexpected events like job loss or medical emergencies.
- **Avoid Debt**: Prevents reliance on credit cards or loans during crises.
- **Peace of Mind**: Reduces stress by ensuring you have funds available.

## How Much Should You Save?
- **Minimum**: 3 months of living expenses (e.g., rent, utilities, groceries).
- **Ideal**: 6 months of expenses for most people.
- **High-Risk Jobs**: Up to 12 months if your income is unstable (e.g., freelance or contract work).

## Where to Keep Your Emergency Fund:
- **High-Yield Savings Account**: Earns interest while keeping funds accessible.
- **Money Market Account**: Offers slightly higher returns with liquidity.
- **Avoid Risky Investments**: Keep funds safe and liquid, not in stocks or other volatile assets.

## Getting Started:
- Calculate your monthly expenses.
- Set a realistic savings goal (e.g., £500 to start).
- Automate monthly transfers to your savings account to build the fund over time.";

/// Single category-keyed educational quest for a goal.
pub fn default_quests(goal: &Goal, stage: Stage) -> Vec<Quest> {
    let category = goal.category.to_lowercase();
    let quest = if goal.is_health_coverage() {
        learning_quest(
            goal,
            stage,
            "health_1",
            "Learn About Health Insurance",
            "Understand the basics of health insurance and its importance.",
            100,
            "Health Insurance Guide",
            HEALTH_BASICS.to_string(),
        )
    } else if category.contains("emergency") {
        learning_quest(
            goal,
            stage,
            "emergency_1",
            "Emergency Fund Basics",
            "Learn the importance of an emergency fund and why it's essential to have one.",
            150,
            "Insight into emergency fund benefits",
            EMERGENCY_BASICS.to_string(),
        )
    } else {
        learning_quest(
            goal,
            stage,
            "general_1",
            &format!("Introduction to {}", goal.category),
            &format!("Learn the basics of {}.", goal.category),
            100,
            &format!("{} Guide", goal.category),
            format!(
                "{} is an important aspect of financial planning.",
                goal.category
            ),
        )
    };
    vec![quest]
}

#[allow(clippy::too_many_arguments)]
fn learning_quest(
    goal: &Goal,
    stage: Stage,
    suffix: &str,
    title: &str,
    description: &str,
    points: u32,
    unlock_reward: &str,
    learning_content: String,
) -> Quest {
    Quest {
        id: format!("quest_{}_{suffix}", goal.id),
        goal_id: goal.id.clone(),
        title: title.to_string(),
        description: description.to_string(),
        points,
        difficulty: "Easy".to_string(),
        estimated_time: "1-2 minutes".to_string(),
        unlock_reward: unlock_reward.to_string(),
        stage,
        content: QuestContent::Learning { learning_content },
    }
}

/// The three health-coverage quiz topics, in backfill order: terminology,
/// plan comparison, and a practical claims scenario.
pub fn health_quiz_quests(goal: &Goal, stage: Stage) -> Vec<Quest> {
    vec![
        quiz_quest(
            goal,
            stage,
            "quiz_basics",
            "Health Insurance Jargon Buster",
            "Test your grasp of the key terms used in every health policy.",
            QuizQuestion {
                question: "What does the 'excess' (deductible) on a health policy mean?".to_string(),
                options: vec![
                    "The monthly price of the policy".to_string(),
                    "The amount you pay towards a claim before the insurer pays".to_string(),
                    "The maximum the insurer will ever pay".to_string(),
                    "A bonus for not claiming".to_string(),
                ],
                correct: 1,
                explanation: "The excess is your share of a claim; the insurer covers the rest up to your limit.".to_string(),
            },
        ),
        quiz_quest(
            goal,
            stage,
            "quiz_compare",
            "Pick the Right Plan",
            "Compare individual and family plans for different life situations.",
            QuizQuestion {
                question: "A single freelancer with no dependants usually gets the best value from which plan?".to_string(),
                options: vec![
                    "A family plan".to_string(),
                    "An individual plan sized to their own needs".to_string(),
                    "No cover at all".to_string(),
                    "A corporate group plan".to_string(),
                ],
                correct: 1,
                explanation: "Individual plans avoid paying for cover nobody else in the household needs.".to_string(),
            },
        ),
        quiz_quest(
            goal,
            stage,
            "quiz_claims",
            "Claims and Waiting Periods",
            "Work through a practical claim scenario.",
            QuizQuestion {
                question: "You buy a new policy today and need treatment next week for a new condition. What usually applies?".to_string(),
                options: vec![
                    "Everything is covered immediately".to_string(),
                    "Claims are never paid in the first year".to_string(),
                    "A waiting period may apply before the condition is covered".to_string(),
                    "You must cancel and rejoin".to_string(),
                ],
                correct: 2,
                explanation: "Most policies have an initial waiting period before some claims are accepted.".to_string(),
            },
        ),
    ]
}

fn quiz_quest(
    goal: &Goal,
    stage: Stage,
    suffix: &str,
    title: &str,
    description: &str,
    question: QuizQuestion,
) -> Quest {
    Quest {
        id: format!("quest_{}_{suffix}", goal.id),
        goal_id: goal.id.clone(),
        title: title.to_string(),
        description: description.to_string(),
        points: 150,
        difficulty: "Medium".to_string(),
        estimated_time: "2-3 minutes".to_string(),
        unlock_reward: "Health Cover Know-How Badge".to_string(),
        stage,
        content: QuestContent::Quiz {
            questions: vec![question],
        },
    }
}

/// Advanced action quest appended at a milestone when supplemental generation fails.
pub fn default_supplemental_quests(goal: &Goal) -> Vec<Quest> {
    vec![Quest {
        id: format!("quest_{}_advanced_trial", goal.id),
        goal_id: goal.id.clone(),
        title: format!("Start a {} Product Trial", goal.category),
        description: format!(
            "Put your progress on '{}' into practice with a concrete setup step.",
            goal.title
        ),
        points: SUPPLEMENTAL_DEFAULT_POINTS,
        difficulty: "Hard".to_string(),
        estimated_time: "10-15 minutes".to_string(),
        unlock_reward: "Free Financial Consultation".to_string(),
        stage: Stage::Advanced,
        content: QuestContent::Action {
            action_steps: vec![
                format!("Compare two {} products side by side", goal.category),
                "Start a free trial or open the account that fits best".to_string(),
                "Schedule a financial consultation to review your setup".to_string(),
            ],
        },
    }]
}
