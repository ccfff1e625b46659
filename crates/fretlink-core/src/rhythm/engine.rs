use strum::{Display, IntoStaticStr};
use tracing::{debug, info, warn};

use crate::config::RhythmConfig;
use crate::config::rhythm::TRACK_COUNT;
use crate::rhythm::judge::{Judgment, RoundStats, TimingWindow};
use crate::rhythm::note::{Note, NoteQueue};

/// Lifecycle of a round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, IntoStaticStr)]
pub enum RoundPhase {
    /// No `Game-Start` received yet
    #[default]
    Idle,
    Running,
    /// Frozen by `Game-End` until the next start
    Finished,
}

/// A press credited to a note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub track: u8,
    pub judgment: Judgment,
    pub points: u32,
    /// Signed distance from the note (positive = late)
    pub offset_ms: i64,
}

/// Note scheduling and scoring for one player
///
/// Times passed in are device clock readings; the engine converts them to
/// round time relative to the `Game-Start` epoch.
#[derive(Debug, Clone)]
pub struct RhythmEngine {
    window: TimingWindow,
    phase: RoundPhase,
    start_ms: u64,
    /// Round time at which `Game-End` froze the round
    frozen_at: Option<u64>,
    score: u32,
    queue: NoteQueue,
    stats: RoundStats,
}

impl RhythmEngine {
    pub fn new(config: &RhythmConfig) -> Self {
        Self {
            window: TimingWindow::from_config(config),
            phase: RoundPhase::Idle,
            start_ms: 0,
            frozen_at: None,
            score: 0,
            queue: NoteQueue::new(),
            stats: RoundStats::default(),
        }
    }

    /// Begin a round at `now_ms`, clearing score, queue and stats
    pub fn start(&mut self, now_ms: u64) {
        if self.phase == RoundPhase::Running {
            info!("Round restarted with score {}", self.score);
        }
        self.phase = RoundPhase::Running;
        self.start_ms = now_ms;
        self.frozen_at = None;
        self.score = 0;
        self.queue.clear();
        self.stats = RoundStats::default();
        info!("Game started");
    }

    /// Freeze the round and return the final score
    pub fn end(&mut self, now_ms: u64) -> u32 {
        match self.phase {
            RoundPhase::Running => {
                self.frozen_at = Some(now_ms.saturating_sub(self.start_ms));
                self.phase = RoundPhase::Finished;
                info!(
                    "Game ended: score={}, perfect={}, good={}, missed={}, max_combo={}",
                    self.score,
                    self.stats.perfect,
                    self.stats.good,
                    self.stats.missed,
                    self.stats.max_combo
                );
            }
            phase => warn!("Game-End received while {}", phase),
        }
        self.score
    }

    /// Queue a note; dropped unless a round is running
    pub fn add_note(&mut self, track: u8, time_ms: u64) -> bool {
        if self.phase != RoundPhase::Running {
            debug!("Dropping note {}-{} while {}", track, time_ms, self.phase);
            return false;
        }
        if track >= TRACK_COUNT {
            warn!("Dropping note on invalid track {}", track);
            return false;
        }
        self.queue.insert(Note::new(track, time_ms));
        true
    }

    /// Round time at `now_ms`, `None` before the first start
    pub fn game_time(&self, now_ms: u64) -> Option<u64> {
        match self.phase {
            RoundPhase::Idle => None,
            RoundPhase::Running => Some(now_ms.saturating_sub(self.start_ms)),
            RoundPhase::Finished => self.frozen_at,
        }
    }

    /// Evaluate a rising-edge press on `track`
    ///
    /// Credits at most one note: the earliest unhit note on the track within
    /// half the hit window.
    pub fn press(&mut self, track: u8, now_ms: u64) -> Option<Hit> {
        if self.phase != RoundPhase::Running {
            return None;
        }
        let game_ms = now_ms.saturating_sub(self.start_ms);
        let window = self.window;

        let note = self.queue.first_candidate(track, game_ms, window.half())?;
        let distance = note.offset_from(game_ms);
        let judgment = window.judge(distance)?;
        note.hit = true;
        // At most half the window
        let offset_ms = if game_ms >= note.scheduled_ms {
            distance as i64
        } else {
            -(distance as i64)
        };

        let points = window.points(judgment);
        self.score = self.score.saturating_add(points);
        self.stats.record(judgment);
        debug!(
            "{} on track {} ({:+}ms), score={}",
            judgment, track, offset_ms, self.score
        );

        Some(Hit {
            track,
            judgment,
            points,
            offset_ms,
        })
    }

    /// Drop leading notes that were hit or have expired
    ///
    /// Returns the number of notes that expired unhit.
    pub fn maintain(&mut self, now_ms: u64) -> usize {
        if self.phase != RoundPhase::Running {
            return 0;
        }
        let game_ms = now_ms.saturating_sub(self.start_ms);
        let half = self.window.half();

        let dropped = self
            .queue
            .drain_leading(|n| n.hit || game_ms > n.scheduled_ms.saturating_add(half));

        let mut missed = 0;
        for note in dropped.iter().filter(|n| !n.hit) {
            debug!("Missed note on track {} at {}ms", note.track, note.scheduled_ms);
            self.stats.record_miss();
            missed += 1;
        }
        missed
    }

    /// Per-track flag: an unhit note is inside the hit window right now
    pub fn tracks_in_window(&self, now_ms: u64) -> [bool; TRACK_COUNT as usize] {
        let mut active = [false; TRACK_COUNT as usize];
        let Some(game_ms) = self.game_time(now_ms) else {
            return active;
        };
        if self.phase != RoundPhase::Running {
            return active;
        }

        let half = self.window.half();
        for note in self.queue.iter() {
            if note.scheduled_ms > game_ms.saturating_add(half) {
                break;
            }
            if !note.hit
                && note.offset_from(game_ms) <= half
                && let Some(slot) = active.get_mut(note.track as usize)
            {
                *slot = true;
            }
        }
        active
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn stats(&self) -> &RoundStats {
        &self.stats
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == RoundPhase::Running
    }

    pub fn queue(&self) -> &NoteQueue {
        &self.queue
    }

    pub fn window(&self) -> &TimingWindow {
        &self.window
    }
}

impl Default for RhythmEngine {
    fn default() -> Self {
        Self::new(&RhythmConfig::default())
    }
}
