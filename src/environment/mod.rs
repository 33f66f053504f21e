//! Environments an agent is evaluated in.
//!
//! An environment is built fresh for every run from an [`EnvironmentSpec`],
//! reset with one program from the sample pool, and then stepped with the
//! agent's actions. When the step counter it reports reaches
//! [`Environment::max_steps`] the program did not halt in time and the run
//! is abandoned as truncated.

mod constant;
mod sequence;

pub use constant::ConstantEnvironment;
pub use sequence::SequenceEnvironment;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Observation cells emitted by an environment, one symbol per cell.
pub type Observation = Vec<usize>;

/// Result of one [`Environment::act`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Reward for the action.
    pub reward: f64,
    /// Observation after the action.
    pub observation: Observation,
    /// Steps consumed by the environment so far.
    pub steps: usize,
}

/// Behaviour the trial executor needs from an environment.
pub trait Environment: Send {
    /// Load `program` and return the initial reward and observation.
    fn reset(&mut self, program: &str) -> (f64, Observation);

    /// Apply `action` and advance.
    fn act(&mut self, action: usize) -> Step;

    /// Step count at which a run counts as truncated.
    fn max_steps(&self) -> usize;

    /// Number of distinct actions, `0..num_actions()`.
    fn num_actions(&self) -> usize;

    /// Number of distinct symbols a single observation cell can hold.
    fn num_observation_symbols(&self) -> usize;

    /// Number of cells in each observation.
    fn num_observation_cells(&self) -> usize;

    /// Number of distinct observations.
    fn num_observations(&self) -> usize {
        let cells = u32::try_from(self.num_observation_cells()).unwrap_or(u32::MAX);
        self.num_observation_symbols().saturating_pow(cells)
    }

    /// Display name including parameters.
    fn name(&self) -> String;
}

/// Typed constructor parameters for a built-in environment.
///
/// Parsed once from the command line (`"Constant,0.5"`, `"Sequence,3"`),
/// validated, and then carried in every job so workers can build their own
/// instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum EnvironmentSpec {
    /// Pays the same reward on every step and never truncates.
    Constant {
        /// Reward per step, also returned by `reset`.
        reward: f64,
        /// Number of actions offered.
        #[serde(default = "default_actions")]
        actions: usize,
    },
    /// Rewards predicting a digit tape read from the program.
    Sequence {
        /// Number of actions (and digit values), 1 to 10.
        #[serde(default = "default_actions")]
        actions: usize,
        /// Step bound; a `#` on the tape runs into it.
        #[serde(default = "default_max_steps")]
        max_steps: usize,
    },
}

fn default_actions() -> usize {
    2
}

fn default_max_steps() -> usize {
    1000
}

impl EnvironmentSpec {
    /// Build a spec from a registry name and positional parameters.
    pub fn from_parts(name: &str, params: &[f64]) -> Result<Self, ConfigError> {
        let spec = match name {
            "Constant" => {
                let (reward, actions) = match params {
                    [] => (0.0, default_actions()),
                    [reward] => (*reward, default_actions()),
                    [reward, actions] => (*reward, count_param(name, "actions", *actions)?),
                    _ => return Err(too_many(name, 2, params.len())),
                };
                Self::Constant { reward, actions }
            }
            "Sequence" => {
                let (actions, max_steps) = match params {
                    [] => (default_actions(), default_max_steps()),
                    [actions] => (count_param(name, "actions", *actions)?, default_max_steps()),
                    [actions, max_steps] => (
                        count_param(name, "actions", *actions)?,
                        count_param(name, "max_steps", *max_steps)?,
                    ),
                    _ => return Err(too_many(name, 2, params.len())),
                };
                Self::Sequence { actions, max_steps }
            }
            other => return Err(ConfigError::UnknownEnvironment(other.to_string())),
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Parse `"Name[,param...]"`.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let (name, params) = split_call(text, "environment")?;
        Self::from_parts(name, &params)
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::Constant { reward, actions } => {
                if !reward.is_finite() {
                    return Err(ConfigError::parameter("Constant", "reward must be finite"));
                }
                if actions == 0 {
                    return Err(ConfigError::parameter("Constant", "actions must be positive"));
                }
            }
            Self::Sequence { actions, max_steps } => {
                if !(1..=10).contains(&actions) {
                    return Err(ConfigError::parameter(
                        "Sequence",
                        format!("actions must be in 1..=10, got {actions}"),
                    ));
                }
                if max_steps == 0 {
                    return Err(ConfigError::parameter("Sequence", "max_steps must be positive"));
                }
            }
        }
        Ok(())
    }

    /// Number of actions the built environment will offer.
    pub fn num_actions(&self) -> usize {
        match *self {
            Self::Constant { actions, .. } | Self::Sequence { actions, .. } => actions,
        }
    }

    /// Construct a fresh instance.
    pub fn build(&self) -> Box<dyn Environment> {
        match *self {
            Self::Constant { reward, actions } => Box::new(ConstantEnvironment::new(reward, actions)),
            Self::Sequence { actions, max_steps } => {
                Box::new(SequenceEnvironment::new(actions, max_steps))
            }
        }
    }
}

impl fmt::Display for EnvironmentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant { reward, actions } => write!(f, "Constant({reward},{actions})"),
            Self::Sequence { actions, max_steps } => write!(f, "Sequence({actions},{max_steps})"),
        }
    }
}

impl FromStr for EnvironmentSpec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Split `"Name,1,2.5"` into the name and its numeric parameters.
pub(crate) fn split_call<'a>(
    text: &'a str,
    kind: &str,
) -> Result<(&'a str, Vec<f64>), ConfigError> {
    let mut parts = text.split(',').map(str::trim);
    let name = parts.next().unwrap_or_default();
    if name.is_empty() {
        return Err(ConfigError::parameter(kind, "missing name"));
    }
    let params = parts
        .map(|p| {
            p.parse::<f64>()
                .map_err(|_| ConfigError::parameter(name, format!("'{p}' is not a number")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((name, params))
}

/// Interpret a numeric parameter as a non-negative whole number.
pub(crate) fn count_param(component: &str, field: &str, value: f64) -> Result<usize, ConfigError> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        Ok(value as usize)
    } else {
        Err(ConfigError::parameter(
            component,
            format!("{field} must be a whole number, got {value}"),
        ))
    }
}

pub(crate) fn too_many(component: &str, max: usize, got: usize) -> ConfigError {
    ConfigError::parameter(component, format!("takes at most {max} parameters, got {got}"))
}
