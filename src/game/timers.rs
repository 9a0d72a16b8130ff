//! Scheduled per-player events, keyed by (player, kind) and due on a tick

use std::collections::BTreeMap;

use super::world::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerKind {
    Respawn,
    TeleportUnlock,
}

/// Outstanding timers. At most one timer per (player, kind).
#[derive(Debug, Default, Clone)]
pub struct TimerTable {
    entries: BTreeMap<(PlayerId, TimerKind), u64>,
}

impl TimerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule (or reschedule) a timer to fire on `due_tick`
    pub fn schedule(&mut self, player_id: PlayerId, kind: TimerKind, due_tick: u64) {
        self.entries.insert((player_id, kind), due_tick);
    }

    pub fn is_pending(&self, player_id: PlayerId, kind: TimerKind) -> bool {
        self.entries.contains_key(&(player_id, kind))
    }

    /// Drop every timer belonging to a player
    pub fn cancel_all(&mut self, player_id: PlayerId) {
        self.entries.retain(|(id, _), _| *id != player_id);
    }

    /// Remove and return every timer due at or before `tick`, ordered by due tick then key
    pub fn take_due(&mut self, tick: u64) -> Vec<(PlayerId, TimerKind)> {
        let mut due: Vec<(u64, PlayerId, TimerKind)> = self
            .entries
            .iter()
            .filter(|(_, due_tick)| **due_tick <= tick)
            .map(|((id, kind), due_tick)| (*due_tick, *id, *kind))
            .collect();
        due.sort_unstable();

        for (_, id, kind) in &due {
            self.entries.remove(&(*id, *kind));
        }
        due.into_iter().map(|(_, id, kind)| (id, kind)).collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
