//! Agents under evaluation.
//!
//! As with environments, agents are described by a serializable
//! [`AgentSpec`] and built fresh inside each worker. Stochastic agents take
//! a seed at construction; both runs of an antithetic pair use the same one.

mod q_lambda;
mod simple;

pub use q_lambda::QLambdaAgent;
pub use simple::{FixedAgent, RandomAgent};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::environment::{count_param, split_call, too_many, Environment, EnvironmentSpec};
use crate::error::ConfigError;

/// Behaviour the trial executor needs from an agent.
pub trait Agent: Send {
    /// Forget everything learned.
    fn reset(&mut self);

    /// Receive an observation and reward, and choose the next action.
    fn perceive(&mut self, observation: &[usize], reward: f64) -> usize;

    /// Display name including parameters.
    fn name(&self) -> String;
}

/// Typed constructor parameters for a built-in agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum AgentSpec {
    /// Always plays the same action.
    Fixed {
        /// Action index.
        #[serde(default)]
        action: usize,
    },
    /// Plays uniformly random actions.
    Random,
    /// Tabular Q(lambda) with epsilon-greedy exploration.
    #[serde(rename = "Q_l")]
    QLambda {
        /// Initial Q value of every state-action pair.
        init_q: f64,
        /// Trace decay.
        lambda: f64,
        /// Learning rate.
        alpha: f64,
        /// Exploration probability.
        epsilon: f64,
        /// Internal discount; 0 means use the evaluation discount rate.
        #[serde(default)]
        gamma: f64,
    },
}

impl AgentSpec {
    /// Build a spec from a registry name and positional parameters.
    pub fn from_parts(name: &str, params: &[f64]) -> Result<Self, ConfigError> {
        match name {
            "Fixed" => match params {
                [] => Ok(Self::Fixed { action: 0 }),
                [action] => Ok(Self::Fixed {
                    action: count_param(name, "action", *action)?,
                }),
                _ => Err(too_many(name, 1, params.len())),
            },
            "Random" => match params {
                [] => Ok(Self::Random),
                _ => Err(too_many(name, 0, params.len())),
            },
            "Q_l" => match *params {
                [init_q, lambda, alpha, epsilon] => Ok(Self::QLambda {
                    init_q,
                    lambda,
                    alpha,
                    epsilon,
                    gamma: 0.0,
                }),
                [init_q, lambda, alpha, epsilon, gamma] => Ok(Self::QLambda {
                    init_q,
                    lambda,
                    alpha,
                    epsilon,
                    gamma,
                }),
                _ => Err(ConfigError::parameter(
                    name,
                    format!(
                        "expects init_q,lambda,alpha,epsilon[,gamma], got {} parameters",
                        params.len()
                    ),
                )),
            },
            other => Err(ConfigError::UnknownAgent(other.to_string())),
        }
    }

    /// Parse `"Name[,param...]"`.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let (name, params) = split_call(text, "agent")?;
        Self::from_parts(name, &params)
    }

    /// Check the parameters against the environment and discount rate.
    pub fn validate(
        &self,
        environment: &EnvironmentSpec,
        discount_rate: f64,
    ) -> Result<(), ConfigError> {
        match *self {
            Self::Fixed { action } => {
                let actions = environment.num_actions();
                if action >= actions {
                    return Err(ConfigError::parameter(
                        "Fixed",
                        format!("action {action} out of range for {actions} actions"),
                    ));
                }
            }
            Self::Random => {}
            Self::QLambda {
                lambda,
                alpha,
                epsilon,
                gamma,
                ..
            } => {
                for (field, value) in [("lambda", lambda), ("alpha", alpha), ("epsilon", epsilon)] {
                    if !(0.0..=1.0).contains(&value) {
                        return Err(ConfigError::parameter(
                            "Q_l",
                            format!("{field} must be in [0, 1], got {value}"),
                        ));
                    }
                }
                let internal = effective_gamma(gamma, discount_rate);
                if !(0.0..1.0).contains(&internal) {
                    return Err(ConfigError::parameter(
                        "Q_l",
                        format!("internal discount rate must be below 1.0, got {internal}"),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Construct a fresh, reset agent for `environment`.
    pub fn build(
        &self,
        environment: &dyn Environment,
        discount_rate: f64,
        seed: u64,
    ) -> Box<dyn Agent> {
        match *self {
            Self::Fixed { action } => Box::new(FixedAgent::new(action)),
            Self::Random => Box::new(RandomAgent::new(environment.num_actions(), seed)),
            Self::QLambda {
                init_q,
                lambda,
                alpha,
                epsilon,
                gamma,
            } => Box::new(QLambdaAgent::new(
                environment,
                q_lambda::QLambdaParams {
                    init_q,
                    lambda,
                    alpha,
                    epsilon,
                    gamma: effective_gamma(gamma, discount_rate),
                },
                seed,
            )),
        }
    }
}

fn effective_gamma(gamma: f64, discount_rate: f64) -> f64 {
    if gamma == 0.0 {
        discount_rate
    } else {
        gamma
    }
}

impl fmt::Display for AgentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed { action } => write!(f, "Fixed({action})"),
            Self::Random => write!(f, "Random"),
            Self::QLambda {
                init_q,
                lambda,
                alpha,
                epsilon,
                gamma,
            } => write!(f, "Q_l({init_q},{lambda},{alpha},{epsilon},{gamma})"),
        }
    }
}

impl FromStr for AgentSpec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
