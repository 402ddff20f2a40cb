//! Minimal in-crate `Environment` implementations, grounded in
//! `original_source/src/toy_envs` and `original_source/src/go` (see
//! `SPEC_FULL.md`'s Supplemental features section). These exist only to
//! make spec §8's concrete scenarios executable as tests; this module is
//! not a general environment-adapter library — that remains out of scope.

use super::Environment;
use crate::error::EnvironmentError;
use crate::types::Reward;
use rand::RngCore;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChainAction {
    Advance,
    Retreat,
}

/// §8 scenario 1: a single optimal path of length `length` pays +1 on the
/// final step; any other move pays 0. `Advance` moves one step toward the
/// goal, `Retreat` moves one step back (clamped at 0).
#[derive(Debug, Clone)]
pub struct ChainEnv {
    length: usize,
}

impl ChainEnv {
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    fn step(&self, state: usize, action: ChainAction) -> usize {
        match action {
            ChainAction::Advance => (state + 1).min(self.length),
            ChainAction::Retreat => state.saturating_sub(1),
        }
    }
}

impl Environment for ChainEnv {
    type State = usize;
    type Action = ChainAction;
    type Observation = usize;

    fn initial_state(&self) -> Self::State {
        0
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        *state >= self.length
    }

    fn valid_actions(&self, _state: &Self::State) -> Vec<Self::Action> {
        vec![ChainAction::Advance, ChainAction::Retreat]
    }

    fn transition_distribution(
        &self,
        state: &Self::State,
        action: &Self::Action,
    ) -> Result<HashMap<Self::State, f64>, EnvironmentError> {
        let mut dist = HashMap::new();
        dist.insert(self.step(*state, *action), 1.0);
        Ok(dist)
    }

    fn sample_transition(
        &self,
        state: &Self::State,
        action: &Self::Action,
        _rng: &mut dyn RngCore,
    ) -> Result<Self::State, EnvironmentError> {
        Ok(self.step(*state, *action))
    }

    fn observation_distribution(
        &self,
        _action: &Self::Action,
        next_state: &Self::State,
    ) -> Result<HashMap<Self::Observation, f64>, EnvironmentError> {
        let mut dist = HashMap::new();
        dist.insert(*next_state, 1.0);
        Ok(dist)
    }

    fn sample_observation(
        &self,
        _action: &Self::Action,
        next_state: &Self::State,
        _rng: &mut dyn RngCore,
    ) -> Result<Self::Observation, EnvironmentError> {
        Ok(*next_state)
    }

    fn reward(&self, state: &Self::State, _action: &Self::Action, observation: &Self::Observation) -> Reward {
        if *observation == self.length && *state + 1 == self.length {
            1.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GridAction {
    Up,
    Down,
    Left,
    Right,
}

impl GridAction {
    fn delta(self) -> (i32, i32) {
        match self {
            GridAction::Up => (-1, 0),
            GridAction::Down => (1, 0),
            GridAction::Left => (0, -1),
            GridAction::Right => (0, 1),
        }
    }

    fn perpendicular(self) -> [GridAction; 2] {
        match self {
            GridAction::Up | GridAction::Down => [GridAction::Left, GridAction::Right],
            GridAction::Left | GridAction::Right => [GridAction::Up, GridAction::Down],
        }
    }
}

/// §8 scenario 2: an `n x n` frozen-lake-style grid with slip probability
/// `slip`. The agent starts at `(0, 0)` and is rewarded 1.0 for reaching
/// `(n-1, n-1)`, 0.0 otherwise; with probability `slip` a move is replaced
/// by one of the two perpendicular moves (uniformly), modelling an icy
/// surface. No holes — only the corner goal is terminal.
#[derive(Debug, Clone)]
pub struct FrozenLakeEnv {
    n: i32,
    slip: f64,
}

impl FrozenLakeEnv {
    pub fn new(n: usize, slip: f64) -> Self {
        Self { n: n as i32, slip }
    }

    fn clamp(&self, pos: (i32, i32)) -> (i32, i32) {
        (pos.0.clamp(0, self.n - 1), pos.1.clamp(0, self.n - 1))
    }

    fn apply(&self, state: (i32, i32), action: GridAction) -> (i32, i32) {
        let (dr, dc) = action.delta();
        self.clamp((state.0 + dr, state.1 + dc))
    }

    fn goal(&self) -> (i32, i32) {
        (self.n - 1, self.n - 1)
    }
}

impl Environment for FrozenLakeEnv {
    type State = (i32, i32);
    type Action = GridAction;
    type Observation = (i32, i32);

    fn initial_state(&self) -> Self::State {
        (0, 0)
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        *state == self.goal()
    }

    fn valid_actions(&self, _state: &Self::State) -> Vec<Self::Action> {
        vec![GridAction::Up, GridAction::Down, GridAction::Left, GridAction::Right]
    }

    fn transition_distribution(
        &self,
        state: &Self::State,
        action: &Self::Action,
    ) -> Result<HashMap<Self::State, f64>, EnvironmentError> {
        let mut dist = HashMap::new();
        *dist.entry(self.apply(*state, *action)).or_insert(0.0) += 1.0 - self.slip;
        for perp in action.perpendicular() {
            *dist.entry(self.apply(*state, perp)).or_insert(0.0) += self.slip / 2.0;
        }
        Ok(dist)
    }

    fn sample_transition(
        &self,
        state: &Self::State,
        action: &Self::Action,
        rng: &mut dyn RngCore,
    ) -> Result<Self::State, EnvironmentError> {
        let u = (rng.next_u32() as f64) / (u32::MAX as f64);
        let chosen = if u < self.slip {
            let perp = action.perpendicular();
            if u < self.slip / 2.0 { perp[0] } else { perp[1] }
        } else {
            *action
        };
        Ok(self.apply(*state, chosen))
    }

    fn observation_distribution(
        &self,
        _action: &Self::Action,
        next_state: &Self::State,
    ) -> Result<HashMap<Self::Observation, f64>, EnvironmentError> {
        let mut dist = HashMap::new();
        dist.insert(*next_state, 1.0);
        Ok(dist)
    }

    fn sample_observation(
        &self,
        _action: &Self::Action,
        next_state: &Self::State,
        _rng: &mut dyn RngCore,
    ) -> Result<Self::Observation, EnvironmentError> {
        Ok(*next_state)
    }

    fn reward(&self, _state: &Self::State, _action: &Self::Action, observation: &Self::Observation) -> Reward {
        if *observation == self.goal() {
            1.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Pick {
    Zero,
    One,
}

/// §8 scenario 3: a symmetric two-player game. Players alternate picking
/// `Zero`/`One` for three rounds (six plies total); the state is the choice
/// history. Reward is +1 (from the acting player's perspective at the
/// final ply) iff the two picks of the last round match, 0 otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectorState {
    picks: Vec<Pick>,
}

const ROUNDS: usize = 3;
const PLAYERS: usize = 2;

#[derive(Debug, Clone)]
pub struct SelectorGameEnv;

impl Environment for SelectorGameEnv {
    type State = SelectorState;
    type Action = Pick;
    type Observation = SelectorState;

    fn initial_state(&self) -> Self::State {
        SelectorState { picks: Vec::new() }
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        state.picks.len() >= ROUNDS * PLAYERS
    }

    fn valid_actions(&self, _state: &Self::State) -> Vec<Self::Action> {
        vec![Pick::Zero, Pick::One]
    }

    fn transition_distribution(
        &self,
        state: &Self::State,
        action: &Self::Action,
    ) -> Result<HashMap<Self::State, f64>, EnvironmentError> {
        let mut next = state.clone();
        next.picks.push(*action);
        let mut dist = HashMap::new();
        dist.insert(next, 1.0);
        Ok(dist)
    }

    fn sample_transition(
        &self,
        state: &Self::State,
        action: &Self::Action,
        _rng: &mut dyn RngCore,
    ) -> Result<Self::State, EnvironmentError> {
        let mut next = state.clone();
        next.picks.push(*action);
        Ok(next)
    }

    fn observation_distribution(
        &self,
        _action: &Self::Action,
        next_state: &Self::State,
    ) -> Result<HashMap<Self::Observation, f64>, EnvironmentError> {
        let mut dist = HashMap::new();
        dist.insert(next_state.clone(), 1.0);
        Ok(dist)
    }

    fn sample_observation(
        &self,
        _action: &Self::Action,
        next_state: &Self::State,
        _rng: &mut dyn RngCore,
    ) -> Result<Self::Observation, EnvironmentError> {
        Ok(next_state.clone())
    }

    fn reward(&self, _state: &Self::State, _action: &Self::Action, observation: &Self::Observation) -> Reward {
        if observation.picks.len() == ROUNDS * PLAYERS {
            let last_round = &observation.picks[ROUNDS * PLAYERS - PLAYERS..];
            if last_round[0] == last_round[1] {
                return 1.0;
            }
        }
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_terminates_and_pays_off_on_last_advance() {
        let env = ChainEnv::new(10);
        assert!(!env.is_terminal(&9));
        assert!(env.is_terminal(&10));
        assert_eq!(env.reward(&9, &ChainAction::Advance, &10), 1.0);
        assert_eq!(env.reward(&8, &ChainAction::Advance, &9), 0.0);
    }

    #[test]
    fn frozen_lake_transition_distribution_sums_to_one() {
        let env = FrozenLakeEnv::new(8, 0.2);
        let dist = env.transition_distribution(&(3, 3), &GridAction::Right).unwrap();
        let total: f64 = dist.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn selector_game_rewards_only_on_matching_final_round() {
        let env = SelectorGameEnv;
        let mut state = env.initial_state();
        for p in [Pick::Zero, Pick::One, Pick::One, Pick::Zero, Pick::One] {
            state.picks.push(p);
        }
        let matching = {
            let mut s = state.clone();
            s.picks.push(Pick::One);
            s
        };
        assert_eq!(env.reward(&state, &Pick::One, &matching), 1.0);
        let mismatching = {
            let mut s = state.clone();
            s.picks.push(Pick::Zero);
            s
        };
        assert_eq!(env.reward(&state, &Pick::Zero, &mismatching), 0.0);
    }
}
