use super::{Environment, Observation, Step};

/// Pays a fixed reward whatever the agent does.
///
/// The program is ignored and the step bound is never reached.
#[derive(Debug, Clone)]
pub struct ConstantEnvironment {
    reward: f64,
    actions: usize,
    steps: usize,
}

impl ConstantEnvironment {
    pub fn new(reward: f64, actions: usize) -> Self {
        Self {
            reward,
            actions,
            steps: 0,
        }
    }
}

impl Environment for ConstantEnvironment {
    fn reset(&mut self, _program: &str) -> (f64, Observation) {
        self.steps = 0;
        (self.reward, vec![0])
    }

    fn act(&mut self, _action: usize) -> Step {
        self.steps += 1;
        Step {
            reward: self.reward,
            observation: vec![0],
            steps: self.steps,
        }
    }

    fn max_steps(&self) -> usize {
        usize::MAX
    }

    fn num_actions(&self) -> usize {
        self.actions
    }

    fn num_observation_symbols(&self) -> usize {
        1
    }

    fn num_observation_cells(&self) -> usize {
        1
    }

    fn name(&self) -> String {
        format!("Constant({},{})", self.reward, self.actions)
    }
}
