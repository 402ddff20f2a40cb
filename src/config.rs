use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// One of the eight pluggable algorithms (§6 `algorithm` key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Uct,
    Puct,
    AlphaGo,
    Ments,
    Rents,
    Tents,
    Dents,
    Est,
}

impl std::str::FromStr for Algorithm {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uct" => Ok(Self::Uct),
            "puct" => Ok(Self::Puct),
            "alphago" => Ok(Self::AlphaGo),
            "ments" => Ok(Self::Ments),
            "rents" => Ok(Self::Rents),
            "tents" => Ok(Self::Tents),
            "dents" => Ok(Self::Dents),
            "est" => Ok(Self::Est),
            other => Err(ConfigError::UnknownAlgorithm(other.to_string())),
        }
    }
}

impl Algorithm {
    pub fn is_softmax_family(self) -> bool {
        matches!(
            self,
            Self::Ments | Self::Rents | Self::Tents | Self::Dents | Self::Est
        )
    }

    pub fn uses_dp_backup(self) -> bool {
        matches!(self, Self::Puct | Self::AlphaGo)
    }

    pub fn uses_entropy_backup(self) -> bool {
        matches!(
            self,
            Self::Ments | Self::Rents | Self::Tents | Self::Dents
        )
    }
}

/// Temperature-decay schedule family, §4.E.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayFn {
    NoDecay,
    InvSqrt,
    InvLog,
    Sigmoid,
}

impl std::str::FromStr for DecayFn {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "no_decay" => Ok(Self::NoDecay),
            "sqrt" | "inv_sqrt" => Ok(Self::InvSqrt),
            "log" | "inv_log" => Ok(Self::InvLog),
            "sigmoid" => Ok(Self::Sigmoid),
            other => Err(ConfigError::UnknownAlgorithm(format!(
                "unknown decay fn {other}"
            ))),
        }
    }
}

pub const AUTO_BIAS: f64 = -1.0;
pub const AUTO_BIAS_MIN: f64 = 1.0;

/// Every run-level knob in spec §6, collected into one record. Algorithm
/// identity plus this config fully determines the pair of policies a
/// `Manager` builds (design note 9).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub algorithm: Algorithm,
    pub max_depth: usize,
    pub mcts_mode: bool,
    pub use_transposition_table: bool,
    pub num_transposition_table_mutexes: usize,
    pub is_two_player_game: bool,
    pub seed: u64,

    pub bias: f64,
    pub puct_power: f64,
    pub heuristic_pseudo_trials: u32,
    pub epsilon_exploration: f64,
    pub recommend_most_visited: bool,

    pub temp_init: f64,
    pub temp_decay_fn: DecayFn,
    pub temp_decay_min: f64,
    pub visits_scale: f64,
    pub root_node_visits_scale: f64,

    pub value_temp_init: f64,
    pub value_temp_decay_fn: DecayFn,
    pub value_temp_decay_min: f64,
    pub value_temp_visits_scale: f64,
    pub value_temp_root_visits_scale: f64,
    pub use_dp_value: bool,

    pub epsilon: f64,
    pub root_node_epsilon: f64,
    pub prior_policy_search_weight: f64,
    pub shift_pseudo_q_values: bool,

    pub alias_use_caching: bool,
    pub alias_recompute_freq: u32,
    pub avoid_selecting_children_under_construction: bool,

    pub dirichlet_noise_coeff: f64,
    pub dirichlet_noise_param: f64,
    pub dirichlet_redraw_once_per_trial: bool,

    pub default_q_value: f64,
    pub num_threads: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Uct,
            max_depth: 100,
            mcts_mode: true,
            use_transposition_table: false,
            num_transposition_table_mutexes: 16,
            is_two_player_game: false,
            seed: 0,

            bias: AUTO_BIAS,
            puct_power: 0.5,
            heuristic_pseudo_trials: 0,
            epsilon_exploration: 0.0,
            recommend_most_visited: true,

            temp_init: 1.0,
            temp_decay_fn: DecayFn::NoDecay,
            temp_decay_min: 0.01,
            visits_scale: 1.0,
            root_node_visits_scale: 1.0,

            value_temp_init: 1.0,
            value_temp_decay_fn: DecayFn::NoDecay,
            value_temp_decay_min: 0.01,
            value_temp_visits_scale: 1.0,
            value_temp_root_visits_scale: 1.0,
            use_dp_value: false,

            epsilon: 0.0,
            root_node_epsilon: 0.0,
            prior_policy_search_weight: 1.0,
            shift_pseudo_q_values: true,

            alias_use_caching: false,
            alias_recompute_freq: 1,
            avoid_selecting_children_under_construction: false,

            dirichlet_noise_coeff: 0.25,
            dirichlet_noise_param: 0.03,
            dirichlet_redraw_once_per_trial: false,

            default_q_value: 0.0,
            num_threads: 1,
        }
    }
}

impl SearchConfig {
    /// Rejects contradictory flags at construction time (§7 `ConfigError`).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.temp_decay_fn == DecayFn::NoDecay && self.temp_init <= 0.0 {
            return Err(ConfigError::Contradictory(
                "temp_decay_fn=no_decay requires temp_init > 0",
            ));
        }
        if self.num_transposition_table_mutexes == 0 && self.use_transposition_table {
            return Err(ConfigError::Contradictory(
                "use_transposition_table requires num_transposition_table_mutexes > 0",
            ));
        }
        if self.num_threads == 0 {
            return Err(ConfigError::Contradictory("num_threads must be > 0"));
        }
        Ok(())
    }

    pub fn bias_is_auto(&self) -> bool {
        self.bias == AUTO_BIAS
    }
}
