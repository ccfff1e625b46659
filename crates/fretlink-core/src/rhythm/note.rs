/// A note the player should hit on `track` at `scheduled_ms` (round time)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    pub track: u8,
    pub scheduled_ms: u64,
    pub hit: bool,
}

impl Note {
    pub fn new(track: u8, scheduled_ms: u64) -> Self {
        Self {
            track,
            scheduled_ms,
            hit: false,
        }
    }

    /// Distance (in ms) between the note and a round time
    pub fn offset_from(&self, game_ms: u64) -> u64 {
        self.scheduled_ms.abs_diff(game_ms)
    }
}

/// Notes kept in ascending scheduled time
///
/// Notes with equal times keep arrival order.
#[derive(Debug, Clone, Default)]
pub struct NoteQueue {
    notes: Vec<Note>,
}

impl NoteQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, note: Note) {
        let index = self
            .notes
            .partition_point(|n| n.scheduled_ms <= note.scheduled_ms);
        self.notes.insert(index, note);
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }

    pub fn is_sorted(&self) -> bool {
        self.notes
            .windows(2)
            .all(|pair| pair[0].scheduled_ms <= pair[1].scheduled_ms)
    }

    /// Earliest unhit note on `track` within `max_offset_ms` of `game_ms`
    pub fn first_candidate(&mut self, track: u8, game_ms: u64, max_offset_ms: u64) -> Option<&mut Note> {
        self.notes
            .iter_mut()
            .find(|n| !n.hit && n.track == track && n.offset_from(game_ms) <= max_offset_ms)
    }

    /// Remove leading notes matching `done`, returning them in order
    pub fn drain_leading(&mut self, mut done: impl FnMut(&Note) -> bool) -> Vec<Note> {
        let count = self.notes.iter().take_while(|n| done(n)).count();
        self.notes.drain(..count).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_time_order() {
        let mut queue = NoteQueue::new();
        for (track, time) in [(0, 900), (1, 300), (2, 600), (3, 300), (0, 0)] {
            queue.insert(Note::new(track, time));
        }

        let times: Vec<u64> = queue.iter().map(|n| n.scheduled_ms).collect();
        assert_eq!(times, vec![0, 300, 300, 600, 900]);
        assert!(queue.is_sorted());
        // Equal times keep arrival order
        assert_eq!(queue.notes()[1].track, 1);
        assert_eq!(queue.notes()[2].track, 3);
    }

    #[test]
    fn test_first_candidate_skips_hit_and_other_tracks() {
        let mut queue = NoteQueue::new();
        queue.insert(Note::new(2, 1000));
        queue.insert(Note::new(1, 1000));
        queue.insert(Note::new(2, 1050));

        queue.first_candidate(2, 1000, 100).unwrap().hit = true;
        let next = queue.first_candidate(2, 1000, 100).unwrap();
        assert_eq!(next.scheduled_ms, 1050);

        assert!(queue.first_candidate(3, 1000, 100).is_none());
        assert!(queue.first_candidate(1, 1200, 100).is_none());
    }

    #[test]
    fn test_drain_leading_stops_at_first_kept() {
        let mut queue = NoteQueue::new();
        queue.insert(Note::new(0, 100));
        queue.insert(Note::new(1, 200));
        queue.insert(Note::new(2, 300));

        let drained = queue.drain_leading(|n| n.scheduled_ms != 200);
        assert_eq!(drained.len(), 1);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.notes().first().map(|n| n.track), Some(1));
    }
}
