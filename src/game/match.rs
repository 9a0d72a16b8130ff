//! Match bookkeeping: team rosters and win detection

use std::collections::BTreeSet;

use tracing::info;

use super::world::{PlayerId, Team, TeamCounts};

/// Match phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// Contest running (including the lobby period before both teams are present)
    InProgress,
    /// A winner has been declared; it never changes afterwards
    Over { winner: Team },
}

/// Match state (owned by the arena)
#[derive(Debug, Clone)]
pub struct MatchState {
    phase: MatchPhase,
    /// Players that have ever joined each team since the match began
    ever_joined: TeamCounts,
    /// Players knocked out of this match; they may not rejoin until it resets
    eliminated: BTreeSet<PlayerId>,
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchState {
    pub fn new() -> Self {
        Self {
            phase: MatchPhase::InProgress,
            ever_joined: TeamCounts::default(),
            eliminated: BTreeSet::new(),
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn winner(&self) -> Option<Team> {
        match self.phase {
            MatchPhase::Over { winner } => Some(winner),
            MatchPhase::InProgress => None,
        }
    }

    #[cfg(test)]
    pub fn ever_joined(&self) -> TeamCounts {
        self.ever_joined
    }

    pub fn record_join(&mut self, team: Team) {
        match team {
            Team::Red => self.ever_joined.red += 1,
            Team::Blue => self.ever_joined.blue += 1,
        }
    }

    pub fn record_elimination(&mut self, id: PlayerId) {
        self.eliminated.insert(id);
    }

    pub fn is_eliminated(&self, id: &PlayerId) -> bool {
        self.eliminated.contains(id)
    }

    /// Start a fresh contest
    pub fn reset(&mut self) {
        if let Some(winner) = self.winner() {
            info!(winner = ?winner, "Match reset");
        }
        *self = Self::new();
    }

    /// A team is defeated once it has fielded a player, has none left in play, and the
    /// opposing team is (or was) contesting.
    fn is_defeated(&self, team: Team, active: TeamCounts) -> bool {
        let opponent = team.opponent();
        self.ever_joined.get(team) > 0
            && active.get(team) == 0
            && (active.get(opponent) > 0 || self.ever_joined.get(opponent) > 0)
    }

    /// Re-check the win condition against the current in-play population.
    ///
    /// Returns the winner only on the call that decides the match.
    pub fn evaluate(&mut self, active: TeamCounts) -> Option<Team> {
        if self.phase != MatchPhase::InProgress {
            return None;
        }

        let loser = Team::ALL
            .into_iter()
            .find(|team| self.is_defeated(*team, active))?;
        let winner = loser.opponent();
        self.phase = MatchPhase::Over { winner };

        info!(winner = ?winner, "Match decided");
        Some(winner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(red: usize, blue: usize) -> TeamCounts {
        TeamCounts { red, blue }
    }

    #[test]
    fn test_no_winner_while_both_teams_in_play() {
        let mut state = MatchState::new();
        state.record_join(Team::Red);
        state.record_join(Team::Blue);
        assert_eq!(state.evaluate(counts(1, 1)), None);
        assert_eq!(state.phase(), MatchPhase::InProgress);
    }

    #[test]
    fn test_last_red_out_means_blue_wins() {
        let mut state = MatchState::new();
        state.record_join(Team::Red);
        state.record_join(Team::Blue);
        state.record_join(Team::Blue);
        assert_eq!(state.evaluate(counts(0, 2)), Some(Team::Blue));
        assert_eq!(state.winner(), Some(Team::Blue));
    }

    #[test]
    fn test_winner_declared_once() {
        let mut state = MatchState::new();
        state.record_join(Team::Red);
        state.record_join(Team::Blue);
        assert_eq!(state.evaluate(counts(0, 1)), Some(Team::Blue));
        // a second elimination in the same tick, now on the other side
        assert_eq!(state.evaluate(counts(0, 0)), None);
        assert_eq!(state.evaluate(counts(1, 0)), None);
        assert_eq!(state.winner(), Some(Team::Blue));
    }

    #[test]
    fn test_lone_team_cannot_lose() {
        let mut state = MatchState::new();
        state.record_join(Team::Red);
        assert_eq!(state.evaluate(counts(0, 0)), None);
    }

    #[test]
    fn test_reset_clears_roster() {
        let mut state = MatchState::new();
        state.record_join(Team::Red);
        state.record_join(Team::Blue);
        state.evaluate(counts(1, 0));
        let id = uuid::Uuid::new_v4();
        state.record_elimination(id);
        state.reset();
        assert!(!state.is_eliminated(&id));
        assert_eq!(state.winner(), None);
        assert_eq!(state.ever_joined(), TeamCounts::default());
    }
}
