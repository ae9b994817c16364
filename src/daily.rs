//! Daily challenge: one game and one seed per calendar day

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::sim::{GameId, hash_string};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyChallenge {
    pub date_key: String,
    #[serde(rename = "gameId")]
    pub game: GameId,
    pub seed: u32,
}

/// `YYYY-MM-DD`
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Everyone gets the same game and seed on the same local date
pub fn pick_daily_challenge(games: &[GameId], date: NaiveDate) -> Option<DailyChallenge> {
    if games.is_empty() {
        return None;
    }
    let date_key = date_key(date);
    let seed = hash_string(&format!("arcadehub-{date_key}"));
    Some(DailyChallenge {
        game: games[seed as usize % games.len()],
        date_key,
        seed,
    })
}

/// Today's local date
#[cfg(target_arch = "wasm32")]
pub fn today() -> NaiveDate {
    let now = js_sys::Date::new_0();
    NaiveDate::from_ymd_opt(now.get_full_year() as i32, now.get_month() + 1, now.get_date())
        .unwrap_or_default()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
