//! Search time budgeting from UCI time controls.

use std::time::Instant;

/// How the current search is limited.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SearchMode {
    /// Clock + increment: `allotment` is the target, `max_allotment` the
    /// hard cap.
    Time,
    /// Fixed depth in `allotment`.
    Depth,
    /// Exactly `allotment` milliseconds.
    MoveTime,
}

pub const ONE_SECOND: i64 = 1_000;
pub const MAX_TIME: i64 = i64::MAX / 2;

/// Expect this many moves left in the game.
const MOVE_HORIZON: i64 = 40;
/// Move number at which the horizon stops shrinking.
const ENDGAME_HORIZON_LIMIT: i64 = 80;
/// At the endgame horizon limit, the move horizon decreases by this much.
const MOVE_HORIZON_DEC: i64 = 8;

/// `log b / (b - 1)` where `b` is the branch factor: the expected share of
/// the allotment spent before the last iteration starts.
pub const TIME_FACTOR: f64 = 0.85;
/// Do not spend more than this multiple of the target time.
pub const MAX_TIME_FACTOR: f64 = 5.0;

/// Allotment and usage caps for recurring time controls with few moves to
/// go, indexed by moves remaining.
const ALLOTMENT_FACTORS: [f64; 10] = [1.0, 0.99, 0.38, 0.28, 0.23, 0.20, 0.18, 0.16, 0.14, 0.12];
const MAX_USAGE_FACTORS: [f64; 10] = [1.0, 0.99, 0.74, 0.66, 0.62, 0.59, 0.56, 0.54, 0.52, 0.51];

/// The limits for one search.
#[derive(Copy, Clone, Debug)]
pub struct TimeManagement {
    pub mode: SearchMode,
    /// Target milliseconds (Time / MoveTime) or depth (Depth).
    pub allotment: i64,
    /// Hard limit on time usage for this move, Time mode only.
    pub max_allotment: i64,
}

impl TimeManagement {
    /// A depth-limited search.
    pub fn depth(d: i64) -> TimeManagement {
        TimeManagement {
            mode: SearchMode::Depth,
            allotment: d,
            max_allotment: 0,
        }
    }

    /// A fixed move time in milliseconds.
    pub fn move_time(ms: i64) -> TimeManagement {
        TimeManagement {
            mode: SearchMode::MoveTime,
            allotment: ms,
            max_allotment: 0,
        }
    }

    /// Computes the budget for a clock + increment time control.
    ///
    /// `buffer_time` is subtracted from the clock to absorb transport
    /// latency; a fraction of it survives as the minimum thinking time.
    pub fn from_clock(
        time_remaining: i64,
        increment: i64,
        moves_to_go: Option<i64>,
        move_number: i64,
        buffer_time: i64,
    ) -> TimeManagement {
        let min_value = time_remaining.min(buffer_time) / 100;
        let time_remaining = (time_remaining - buffer_time).max(0);

        let capped_move_number = move_number.min(ENDGAME_HORIZON_LIMIT);
        let mut horizon = MOVE_HORIZON - MOVE_HORIZON_DEC * capped_move_number / ENDGAME_HORIZON_LIMIT;
        if let Some(mtg) = moves_to_go {
            horizon = horizon.min(mtg);
        }

        let mut value = time_remaining / horizon.max(1) + increment;
        value = value.max(min_value);

        // Recurring controls about to reset get special factors.
        let (allotment, max_allotment) = if increment == 0 && horizon < 10 {
            let h = horizon.max(0) as usize;
            (
                value.max((time_remaining as f64 * ALLOTMENT_FACTORS[h]) as i64),
                ((value as f64 * MAX_TIME_FACTOR) as i64)
                    .min((time_remaining as f64 * MAX_USAGE_FACTORS[h]) as i64),
            )
        } else {
            let max = ((value as f64 * MAX_TIME_FACTOR) as i64)
                .min((time_remaining as f64 * 0.95) as i64);
            (value.min(max / 3), max)
        };

        TimeManagement {
            mode: SearchMode::Time,
            allotment,
            max_allotment,
        }
    }

    /// The wall-clock limit this search must never exceed.
    pub fn hard_limit(&self) -> i64 {
        match self.mode {
            SearchMode::Time => self.max_allotment,
            SearchMode::MoveTime => self.allotment,
            SearchMode::Depth => MAX_TIME,
        }
    }
}

/// Milliseconds since `start`.
#[inline]
pub fn elapsed_ms(start: Instant) -> i64 {
    chrono::Duration::from_std(start.elapsed())
        .map(|d| d.num_milliseconds())
        .unwrap_or(0)
        .max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizon_formula() {
        // Opening: horizon 40, so a 40 s clock targets about 1 s.
        let tm = TimeManagement::from_clock(40_000 + 300, 0, None, 1, 300);
        assert_eq!(tm.mode, SearchMode::Time);
        assert_eq!(tm.allotment, 1_000);
        assert!(tm.max_allotment >= tm.allotment);

        // Deep endgame: horizon shrinks to 32.
        let tm = TimeManagement::from_clock(32_000 + 300, 0, None, 120, 300);
        assert_eq!(tm.allotment, 1_000);
    }

    #[test]
    fn movestogo_tightens_horizon() {
        let tm = TimeManagement::from_clock(9_300, 0, Some(3), 10, 300);
        // 3 moves left: allotment factor table takes over.
        assert!(tm.allotment >= 9_000 / 3);
        assert!(tm.max_allotment <= (9_000.0 * 0.66) as i64 + 1);
    }

    #[test]
    fn increment_added() {
        let with_inc = TimeManagement::from_clock(60_300, 2_000, None, 1, 300);
        let without = TimeManagement::from_clock(60_300, 0, None, 1, 300);
        assert!(with_inc.allotment > without.allotment);
    }

    #[test]
    fn minimum_thinking_time() {
        // Nearly out of clock: the budget collapses but never goes
        // negative; depth 1 always completes regardless.
        let tm = TimeManagement::from_clock(150, 0, None, 30, 300);
        assert!(tm.allotment >= 0);
        assert!(tm.max_allotment >= 0);

        // With some clock left the buffered minimum survives.
        let tm = TimeManagement::from_clock(2_000, 0, None, 30, 300);
        assert!(tm.allotment >= 3);
    }
}
