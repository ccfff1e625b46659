use strum::{Display, IntoStaticStr};

use crate::config::RhythmConfig;

/// Timing grade of a credited press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Judgment {
    Perfect,
    Good,
}

/// Hit window centered on a note's scheduled time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingWindow {
    pub hit_window_ms: u64,
    pub perfect_points: u32,
    pub good_points: u32,
}

impl TimingWindow {
    pub fn from_config(config: &RhythmConfig) -> Self {
        Self {
            hit_window_ms: config.hit_window_ms,
            perfect_points: config.perfect_points,
            good_points: config.good_points,
        }
    }

    /// Largest offset that still counts as a hit
    pub fn half(&self) -> u64 {
        self.hit_window_ms / 2
    }

    /// Largest offset that counts as PERFECT
    pub fn quarter(&self) -> u64 {
        self.hit_window_ms / 4
    }

    /// Grade a press `offset_ms` away from its note
    pub fn judge(&self, offset_ms: u64) -> Option<Judgment> {
        if offset_ms <= self.quarter() {
            Some(Judgment::Perfect)
        } else if offset_ms <= self.half() {
            Some(Judgment::Good)
        } else {
            None
        }
    }

    pub fn points(&self, judgment: Judgment) -> u32 {
        match judgment {
            Judgment::Perfect => self.perfect_points,
            Judgment::Good => self.good_points,
        }
    }
}

impl Default for TimingWindow {
    fn default() -> Self {
        Self::from_config(&RhythmConfig::default())
    }
}

/// Per-round judgment counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundStats {
    pub perfect: u32,
    pub good: u32,
    /// Notes that expired without being hit
    pub missed: u32,
    pub combo: u32,
    pub max_combo: u32,
}

impl RoundStats {
    pub fn record(&mut self, judgment: Judgment) {
        match judgment {
            Judgment::Perfect => self.perfect += 1,
            Judgment::Good => self.good += 1,
        }
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
    }

    pub fn record_miss(&mut self) {
        self.missed += 1;
        self.combo = 0;
    }

    pub fn hits(&self) -> u32 {
        self.perfect + self.good
    }

    /// Check if every judged note was hit
    pub fn is_full_combo(&self) -> bool {
        self.missed == 0 && self.hits() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_judge_boundaries() {
        let window = TimingWindow::default();
        assert_eq!(window.judge(0), Some(Judgment::Perfect));
        assert_eq!(window.judge(50), Some(Judgment::Perfect));
        assert_eq!(window.judge(51), Some(Judgment::Good));
        assert_eq!(window.judge(100), Some(Judgment::Good));
        assert_eq!(window.judge(101), None);
    }

    #[test]
    fn test_points() {
        let window = TimingWindow::default();
        assert_eq!(window.points(Judgment::Perfect), 100);
        assert_eq!(window.points(Judgment::Good), 50);
    }

    #[test]
    fn test_custom_window() {
        let window = TimingWindow::from_config(&RhythmConfig {
            hit_window_ms: 120,
            perfect_points: 3,
            good_points: 1,
        });
        assert_eq!(window.judge(30), Some(Judgment::Perfect));
        assert_eq!(window.judge(31), Some(Judgment::Good));
        assert_eq!(window.judge(61), None);
        assert_eq!(window.points(Judgment::Good), 1);
    }

    #[test]
    fn test_judgment_display() {
        assert_eq!(Judgment::Perfect.to_string(), "PERFECT");
        let name: &'static str = Judgment::Good.into();
        assert_eq!(name, "GOOD");
    }

    #[test]
    fn test_round_stats_combo() {
        let mut stats = RoundStats::default();
        stats.record(Judgment::Perfect);
        stats.record(Judgment::Good);
        stats.record(Judgment::Perfect);
        assert_eq!(stats.combo, 3);

        stats.record_miss();
        assert_eq!(stats.combo, 0);
        assert_eq!(stats.max_combo, 3);

        stats.record(Judgment::Good);
        assert_eq!(stats.max_combo, 3);
        assert_eq!(stats.hits(), 4);
        assert_eq!(stats.missed, 1);
        assert!(!stats.is_full_combo());
    }
}
