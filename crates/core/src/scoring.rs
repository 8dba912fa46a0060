//! Scoring module - clear score, levels and countdown delay
//!
//! - A clear scores `lines * blocks * 10 * multiplier`.
//! - The multiplier grows by one per consecutive clearing placement and drops
//!   back to one on any placement (or expiry) that clears nothing.
//! - The level is `score / 1000`.
//! - The countdown shrinks by a fixed step per level, down to a floor.

use serde::{Deserialize, Serialize};

use crate::types::{
    DEFAULT_TIMER_BASE_MS, DEFAULT_TIMER_MIN_MS, DEFAULT_TIMER_STEP_MS, LEGACY_TIMER_BASE_MS,
    LEVEL_SCORE_STEP, SCORE_PER_BLOCK,
};

/// Score gained by one clear
///
/// # Examples
///
/// ```
/// use tetrecs_core::scoring::calculate_score;
///
/// // One line of five blocks at multiplier 1.
/// assert_eq!(calculate_score(1, 5, 1), 50);
/// // A row and a column sharing one cell: 2 lines, 9 blocks.
/// assert_eq!(calculate_score(2, 9, 3), 540);
/// ```
pub fn calculate_score(lines: u32, blocks: u32, multiplier: u32) -> u32 {
    lines
        .saturating_mul(blocks)
        .saturating_mul(SCORE_PER_BLOCK)
        .saturating_mul(multiplier)
}

/// Level reached at `score`
pub fn calculate_level(score: u32) -> u32 {
    score / LEVEL_SCORE_STEP
}

/// Countdown tuning
///
/// `delay = max(min_ms, base_ms - step_ms * level)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    pub base_ms: u32,
    pub step_ms: u32,
    pub min_ms: u32,
}

impl TimerConfig {
    /// The early variant with a two second base
    pub fn legacy() -> Self {
        Self {
            base_ms: LEGACY_TIMER_BASE_MS,
            ..Self::default()
        }
    }

    /// Countdown for `level`, in milliseconds
    pub fn delay_ms(&self, level: u32) -> u32 {
        self.base_ms
            .saturating_sub(self.step_ms.saturating_mul(level))
            .max(self.min_ms)
            .max(1)
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            base_ms: DEFAULT_TIMER_BASE_MS,
            step_ms: DEFAULT_TIMER_STEP_MS,
            min_ms: DEFAULT_TIMER_MIN_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_scores() {
        assert_eq!(calculate_score(1, 5, 1), 50);
        assert_eq!(calculate_score(2, 9, 1), 180);
        assert_eq!(calculate_score(2, 10, 2), 400);
        assert_eq!(calculate_score(0, 0, 4), 0);
    }

    #[test]
    fn test_clear_score_saturates() {
        assert_eq!(calculate_score(u32::MAX, 2, 2), u32::MAX);
    }

    #[test]
    fn test_level_thresholds() {
        assert_eq!(calculate_level(0), 0);
        assert_eq!(calculate_level(999), 0);
        assert_eq!(calculate_level(1000), 1);
        assert_eq!(calculate_level(1999), 1);
        assert_eq!(calculate_level(2000), 2);
    }

    #[test]
    fn test_default_delays() {
        let t = TimerConfig::default();
        assert_eq!(t.delay_ms(0), 12_000);
        assert_eq!(t.delay_ms(1), 11_500);
        assert_eq!(t.delay_ms(10), 7_000);
        assert_eq!(t.delay_ms(23), 500);
        assert_eq!(t.delay_ms(24), 500); // floor
        assert_eq!(t.delay_ms(1_000), 500);
    }

    #[test]
    fn test_legacy_delays() {
        let t = TimerConfig::legacy();
        assert_eq!(t.delay_ms(0), 2_000);
        assert_eq!(t.delay_ms(2), 1_000);
        assert_eq!(t.delay_ms(4), 500);
    }

    #[test]
    fn test_zero_floor_still_positive() {
        let t = TimerConfig {
            base_ms: 1000,
            step_ms: 500,
            min_ms: 0,
        };
        assert_eq!(t.delay_ms(5), 1);
    }
}
