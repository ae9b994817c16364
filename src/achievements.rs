//! Achievement table and the post-run evaluation pass

use crate::progress::ProgressState;
use crate::sim::{GameId, RunResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

pub const ACHIEVEMENTS: [Achievement; 10] = [
    Achievement {
        id: "neon-1000",
        title: "Neon Ghost",
        description: "Score 1000 in Neon Dodger.",
    },
    Achievement {
        id: "asteroid-ace",
        title: "Debris Artist",
        description: "Score 1500 in Asteroids Pulse.",
    },
    Achievement {
        id: "brick-master",
        title: "Brick Maestro",
        description: "Clear 3 levels in Brick Breaker Blitz.",
    },
    Achievement {
        id: "void-survivor",
        title: "Void Survivor",
        description: "Survive 120 seconds in Void Survival.",
    },
    Achievement {
        id: "rhythm-30",
        title: "Combo Current",
        description: "Reach a 30 combo in Rhythm Tap.",
    },
    Achievement {
        id: "runner-40",
        title: "Precision Thread",
        description: "Reach streak 40 in Precision Runner.",
    },
    Achievement {
        id: "tile-2048",
        title: "Number Alchemist",
        description: "Create a 2048 tile.",
    },
    Achievement {
        id: "memory-3wins",
        title: "Mind Palace",
        description: "Win Memory Match 3 times.",
    },
    Achievement {
        id: "pong-duel",
        title: "Arcade Rival",
        description: "Win a two-player Pong duel.",
    },
    Achievement {
        id: "collector",
        title: "Cabinet Collector",
        description: "Play 8 different games.",
    },
];

const COLLECTOR_GAMES: usize = 8;

pub fn find(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

/// Ids this run earns that `progress` does not hold yet.
///
/// Call after the run has been recorded into `progress`, so counters such as
/// wins and games played include it.
pub fn evaluate(progress: &ProgressState, game: GameId, mode: &str, result: &RunResult) -> Vec<&'static str> {
    let stat = |key: &str| result.stat(key).unwrap_or(0.0);
    let mut earned = Vec::new();

    let by_game = match game {
        GameId::NeonDodger if result.score >= 1000 => Some("neon-1000"),
        GameId::AsteroidsPulse if result.score >= 1500 => Some("asteroid-ace"),
        GameId::BrickBreakerBlitz if stat("level") >= 3.0 => Some("brick-master"),
        GameId::VoidSurvival if stat("time") >= 120.0 => Some("void-survivor"),
        GameId::RhythmTap if stat("combo") >= 30.0 => Some("rhythm-30"),
        GameId::PrecisionRunner if stat("run") >= 40.0 => Some("runner-40"),
        GameId::Fusion2048 if stat("tile") >= 2048.0 => Some("tile-2048"),
        GameId::MemoryMatch if progress.stats_for(game).wins >= 3 => Some("memory-3wins"),
        GameId::PongNeon if mode == "duel" && result.won => Some("pong-duel"),
        _ => None,
    };
    earned.extend(by_game);
    if progress.games_played() >= COLLECTOR_GAMES {
        earned.push("collector");
    }

    earned.retain(|id| !progress.has_achievement(id));
    earned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Difficulty;

    #[test]
    fn test_table_ids_are_unique() {
        for a in &ACHIEVEMENTS {
            assert_eq!(ACHIEVEMENTS.iter().filter(|b| b.id == a.id).count(), 1);
        }
        assert_eq!(find("tile-2048").map(|a| a.title), Some("Number Alchemist"));
        assert!(find("nope").is_none());
    }

    #[test]
    fn test_score_and_stat_thresholds() {
        let p = ProgressState::new();
        assert_eq!(evaluate(&p, GameId::NeonDodger, "single", &RunResult::new(1000, false)), vec!["neon-1000"]);
        assert!(evaluate(&p, GameId::NeonDodger, "single", &RunResult::new(999, false)).is_empty());
        let tile = RunResult::new(0, true).with_stat("tile", 2048.0);
        assert_eq!(evaluate(&p, GameId::Fusion2048, "single", &tile), vec!["tile-2048"]);
        let level = RunResult::new(0, false).with_stat("level", 3.0);
        assert_eq!(evaluate(&p, GameId::BrickBreakerBlitz, "single", &level), vec!["brick-master"]);
        let time = RunResult::new(0, false).with_stat("time", 119.0);
        assert!(evaluate(&p, GameId::VoidSurvival, "single", &time).is_empty());
    }

    #[test]
    fn test_pong_needs_duel_win() {
        let p = ProgressState::new();
        let win = RunResult::new(700, true);
        assert!(evaluate(&p, GameId::PongNeon, "single", &win).is_empty());
        assert_eq!(evaluate(&p, GameId::PongNeon, "duel", &win), vec!["pong-duel"]);
        assert!(evaluate(&p, GameId::PongNeon, "duel", &RunResult::new(300, false)).is_empty());
    }

    #[test]
    fn test_memory_wins_counted_from_progress() {
        let mut p = ProgressState::new();
        let win = RunResult::new(500, true);
        for _ in 0..2 {
            p.record_result(GameId::MemoryMatch, Difficulty::Easy, &win);
        }
        assert!(evaluate(&p, GameId::MemoryMatch, "single", &win).is_empty());
        p.record_result(GameId::MemoryMatch, Difficulty::Easy, &win);
        assert_eq!(evaluate(&p, GameId::MemoryMatch, "single", &win), vec!["memory-3wins"]);
    }

    #[test]
    fn test_collector_and_already_unlocked() {
        let mut p = ProgressState::new();
        for game in &GameId::ALL[..8] {
            p.record_result(*game, Difficulty::Easy, &RunResult::new(1, false));
        }
        let run = RunResult::new(2000, false);
        assert_eq!(evaluate(&p, GameId::AsteroidsPulse, "single", &run), vec!["asteroid-ace", "collector"]);

        p.unlock_achievements(&["collector", "asteroid-ace"]);
        assert!(evaluate(&p, GameId::AsteroidsPulse, "single", &run).is_empty());
    }
}
