//! Cosmetic leaderboard. Rival scores come from a pluggable source so the
//! ranking logic stays deterministic under test.

use rand::Rng;
use serde::Serialize;

/// A competitor shown next to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct Rival {
    pub name: String,
    pub points: u64,
}

pub trait RivalSource: Send + Sync {
    fn rivals(&self) -> Vec<Rival>;
}

/// Four named rivals with points drawn uniformly from fixed ranges.
pub struct RandomRivals;

const RIVAL_RANGES: &[(&str, u64, u64)] = &[
    ("Alex M.", 800, 1500),
    ("Sarah K.", 600, 1200),
    ("Mike R.", 400, 1000),
    ("Emma L.", 200, 800),
];

impl RivalSource for RandomRivals {
    fn rivals(&self) -> Vec<Rival> {
        let mut rng = rand::thread_rng();
        RIVAL_RANGES
            .iter()
            .map(|(name, low, high)| Rival {
                name: (*name).to_string(),
                points: rng.gen_range(*low..=*high),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub name: String,
    pub points: u64,
    pub is_you: bool,
}

/// Rank the caller among `rivals`, highest points first. Ties keep the
/// caller ahead.
pub fn rank(you: &str, your_points: u64, rivals: Vec<Rival>) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<(String, u64, bool)> = std::iter::once((you.to_string(), your_points, true))
        .chain(rivals.into_iter().map(|rival| (rival.name, rival.points, false)))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
        .into_iter()
        .enumerate()
        .map(|(index, (name, points, is_you))| LeaderboardEntry {
            rank: index + 1,
            name,
            points,
            is_you,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRivals;

    impl RivalSource for FixedRivals {
        fn rivals(&self) -> Vec<Rival> {
            vec![
                Rival { name: "Alex M.".to_string(), points: 900 },
                Rival { name: "Emma L.".to_string(), points: 300 },
            ]
        }
    }

    #[test]
    fn caller_is_ranked_among_rivals() {
        let board = rank("Tom Carter", 450, FixedRivals.rivals());
        let names: Vec<&str> = board.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Alex M.", "Tom Carter", "Emma L."]);
        assert_eq!(board[1].rank, 2);
        assert!(board[1].is_you);
    }

    #[test]
    fn tie_keeps_caller_first() {
        let board = rank("Tom Carter", 900, FixedRivals.rivals());
        assert!(board[0].is_you);
    }

    #[test]
    fn random_rivals_stay_in_range() {
        for rival in RandomRivals.rivals() {
            let (_, low, high) = RIVAL_RANGES
                .iter()
                .find(|(name, _, _)| *name == rival.name)
                .expect("rival comes from the fixed table");
            assert!((*low..=*high).contains(&rival.points));
        }
    }
}
