use super::state::RepeatMode;
use crate::model::Track;
use rand::{Rng, SeedableRng, rngs::StdRng};

/// The ordered list a track was started from, plus where we are in it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackContext {
    tracks: Vec<Track>,
    index: usize,
}

impl PlaybackContext {
    /// `None` for an empty list; an out-of-range index is clamped to the last entry.
    pub fn new(tracks: Vec<Track>, index: usize) -> Option<Self> {
        if tracks.is_empty() {
            return None;
        }
        let index = index.min(tracks.len() - 1);
        Some(Self { tracks, index })
    }

    pub fn single(track: Track) -> Self {
        Self {
            tracks: vec![track],
            index: 0,
        }
    }

    /// Positions the context on `track`, falling back to a single-item context
    /// when the list does not contain it.
    pub fn starting_at(tracks: Vec<Track>, track: &Track) -> Self {
        match tracks.iter().position(|t| t.is_same(track)) {
            Some(index) => Self { tracks, index },
            None => Self::single(track.clone()),
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &Track {
        &self.tracks[self.index]
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn set_index(&mut self, index: usize) -> bool {
        if index < self.tracks.len() {
            self.index = index;
            true
        } else {
            false
        }
    }
}

pub fn resolve_next<R: Rng>(
    len: usize,
    current: usize,
    shuffle: bool,
    repeat: RepeatMode,
    rng: &mut R,
) -> Option<usize> {
    if len == 0 {
        return None;
    }
    if shuffle {
        return shuffled(len, current, repeat, rng);
    }
    let next = current + 1;
    if next < len {
        Some(next)
    } else if repeat == RepeatMode::All {
        Some(0)
    } else {
        None
    }
}

pub fn resolve_previous<R: Rng>(
    len: usize,
    current: usize,
    shuffle: bool,
    repeat: RepeatMode,
    rng: &mut R,
) -> Option<usize> {
    if len == 0 {
        return None;
    }
    if shuffle {
        // No history: a fresh pick, same as next().
        return shuffled(len, current, repeat, rng);
    }
    match current.checked_sub(1) {
        Some(previous) if previous < len => Some(previous),
        Some(_) => Some(len - 1),
        None if repeat == RepeatMode::All => Some(len - 1),
        None => None,
    }
}

fn shuffled<R: Rng>(
    len: usize,
    current: usize,
    repeat: RepeatMode,
    rng: &mut R,
) -> Option<usize> {
    if len == 1 {
        return match repeat {
            RepeatMode::Off => None,
            RepeatMode::All | RepeatMode::One => Some(0),
        };
    }
    if current >= len {
        return Some(rng.random_range(0..len));
    }
    // Uniform over every index except `current`.
    let pick = rng.random_range(0..len - 1);
    Some(if pick >= current { pick + 1 } else { pick })
}

/// Holds the RNG used for shuffle picks.
pub struct QueueResolver {
    rng: StdRng,
}

impl Default for QueueResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueResolver {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn next(
        &mut self,
        context: &PlaybackContext,
        shuffle: bool,
        repeat: RepeatMode,
    ) -> Option<usize> {
        resolve_next(context.len(), context.index(), shuffle, repeat, &mut self.rng)
    }

    pub fn previous(
        &mut self,
        context: &PlaybackContext,
        shuffle: bool,
        repeat: RepeatMode,
    ) -> Option<usize> {
        resolve_previous(context.len(), context.index(), shuffle, repeat, &mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::track::track;
    use std::collections::HashSet;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn linear_next_stops_at_end_unless_repeat_all() {
        let mut r = rng();
        assert_eq!(resolve_next(3, 0, false, RepeatMode::Off, &mut r), Some(1));
        assert_eq!(resolve_next(3, 2, false, RepeatMode::Off, &mut r), None);
        assert_eq!(resolve_next(3, 2, false, RepeatMode::One, &mut r), None);
        assert_eq!(resolve_next(3, 2, false, RepeatMode::All, &mut r), Some(0));
        assert_eq!(resolve_next(0, 0, false, RepeatMode::All, &mut r), None);
    }

    #[test]
    fn linear_previous_wraps_to_end() {
        let mut r = rng();
        assert_eq!(resolve_previous(3, 2, false, RepeatMode::Off, &mut r), Some(1));
        assert_eq!(resolve_previous(3, 0, false, RepeatMode::Off, &mut r), None);
        assert_eq!(resolve_previous(3, 0, false, RepeatMode::All, &mut r), Some(2));
    }

    #[test]
    fn shuffle_single_entry_follows_repeat() {
        let mut r = rng();
        assert_eq!(resolve_next(1, 0, true, RepeatMode::Off, &mut r), None);
        assert_eq!(resolve_next(1, 0, true, RepeatMode::All, &mut r), Some(0));
        assert_eq!(resolve_previous(1, 0, true, RepeatMode::One, &mut r), Some(0));
    }

    #[test]
    fn shuffle_never_repeats_current_and_covers_the_rest() {
        let mut r = rng();
        let len = 6;
        let current = 2;
        let mut seen = HashSet::new();
        for _ in 0..500 {
            let pick = resolve_next(len, current, true, RepeatMode::Off, &mut r).unwrap();
            assert_ne!(pick, current);
            assert!(pick < len);
            seen.insert(pick);
        }
        assert_eq!(seen.len(), len - 1);
    }

    #[test]
    fn context_positions_on_track_or_falls_back() {
        let list = vec![track("a"), track("b"), track("c")];
        let ctx = PlaybackContext::starting_at(list.clone(), &track("b"));
        assert_eq!(ctx.index(), 1);
        assert_eq!(ctx.len(), 3);

        let ctx = PlaybackContext::starting_at(list, &track("z"));
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.current().id, "z");

        assert!(PlaybackContext::new(vec![], 0).is_none());
        assert_eq!(PlaybackContext::new(vec![track("a")], 9).unwrap().index(), 0);
    }

    #[test]
    fn resolver_reads_context_position() {
        let mut resolver = QueueResolver::seeded(1);
        let mut ctx = PlaybackContext::new(vec![track("a"), track("b")], 0).unwrap();
        assert_eq!(resolver.next(&ctx, false, RepeatMode::Off), Some(1));
        ctx.set_index(1);
        assert_eq!(resolver.next(&ctx, false, RepeatMode::Off), None);
        assert_eq!(resolver.previous(&ctx, false, RepeatMode::Off), Some(0));
    }
}
