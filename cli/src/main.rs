use clap::{Parser, Subcommand};

mod commands;
mod util;

use commands::session::ProfileArgs;
use util::require_session;

#[derive(Parser)]
#[command(
    name = "lifequest",
    version,
    about = "LifeQuest CLI: build a goal catalog, work through quests, and track progress"
)]
struct Cli {
    /// API base URL
    #[arg(long, env = "LIFEQUEST_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    /// Session id returned by `lifequest start`
    #[arg(long, env = "LIFEQUEST_SESSION_ID")]
    session: Option<String>,

    /// Print compact single-line JSON
    #[arg(long, global = true)]
    raw: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API health
    Health,
    /// List available personas and products
    Personas,
    /// Start a new session for a persona
    Start {
        /// Persona key (e.g. "tom_carter")
        #[arg(long)]
        persona: String,
        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Switch the session to another persona (resets progress)
    Switch {
        #[arg(long)]
        persona: String,
    },
    /// Edit the session's profile, keeping progress
    Profile {
        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Show the goal catalog
    Goals {
        /// Build a new catalog from the generative service
        #[arg(long)]
        generate: bool,
    },
    /// Select the active goal
    Select {
        /// Goal id from `lifequest goals`
        goal_id: String,
    },
    /// Show the active quest batch
    Quests {
        /// Generate a new batch for this goal id first
        #[arg(long, value_name = "GOAL_ID")]
        generate: Option<String>,
    },
    /// Complete a quest (quizzes need one --answer per question)
    Complete {
        quest_id: String,
        /// Option text, or `#N` for the zero-based option index (repeatable, in question order)
        #[arg(long = "answer")]
        answers: Vec<String>,
    },
    /// Show points, level, badge, and goal progress
    Progress,
    /// Ask for the next best action
    Nudge,
    /// Ask the coach a free-form question
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Show the leaderboard
    Leaderboard,
    /// End the session and discard its progress
    End,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("LIFEQUEST_LOG")
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let api_url = cli.api_url.trim_end_matches('/');
    let session = cli.session.as_deref();
    let raw = cli.raw;

    let code = match cli.command {
        Commands::Health => commands::health::run(api_url, raw).await,
        Commands::Personas => commands::health::personas(api_url, raw).await,
        Commands::Start { persona, profile } => {
            commands::session::start(api_url, &persona, profile, raw).await
        }
        Commands::Switch { persona } => {
            commands::session::switch(api_url, require_session(session), &persona, raw).await
        }
        Commands::Profile { profile } => {
            commands::session::profile(api_url, require_session(session), profile, raw).await
        }
        Commands::Goals { generate } => {
            commands::goal::list(api_url, require_session(session), generate, raw).await
        }
        Commands::Select { goal_id } => {
            commands::goal::select(api_url, require_session(session), &goal_id, raw).await
        }
        Commands::Quests { generate } => {
            commands::quest::list(api_url, require_session(session), generate.as_deref(), raw)
                .await
        }
        Commands::Complete { quest_id, answers } => {
            commands::quest::complete(api_url, require_session(session), &quest_id, &answers, raw)
                .await
        }
        Commands::Progress => {
            commands::session::progress(api_url, require_session(session), raw).await
        }
        Commands::Nudge => commands::coach::nudge(api_url, require_session(session), raw).await,
        Commands::Ask { question } => {
            commands::coach::ask(api_url, require_session(session), &question, raw).await
        }
        Commands::Leaderboard => {
            commands::session::leaderboard(api_url, require_session(session), raw).await
        }
        Commands::End => commands::session::end(api_url, require_session(session), raw).await,
    };

    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn complete_collects_repeated_answers() {
        let cli = Cli::try_parse_from([
            "lifequest", "--session", "s1", "complete", "quest_1", "--answer", "#1", "--answer",
            "Copay",
        ])
        .expect("arguments should parse");
        match cli.command {
            Commands::Complete { quest_id, answers } => {
                assert_eq!(quest_id, "quest_1");
                assert_eq!(answers, vec!["#1", "Copay"]);
            }
            _ => panic!("expected complete"),
        }
    }

    #[test]
    fn start_accepts_profile_flags() {
        let cli = Cli::try_parse_from([
            "lifequest", "start", "--persona", "tom_carter", "--age", "35", "--product",
            "Health Insurance",
        ])
        .expect("arguments should parse");
        match cli.command {
            Commands::Start { persona, profile } => {
                assert_eq!(persona, "tom_carter");
                assert_eq!(profile.age, Some(35));
                assert_eq!(profile.products, vec!["Health Insurance"]);
            }
            _ => panic!("expected start"),
        }
    }
}
