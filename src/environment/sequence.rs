use super::{Environment, Observation, Step};

/// Tape symbol that never halts.
const NON_HALTING: char = '#';

#[derive(Debug, Clone, Copy, PartialEq)]
enum Cell {
    Digit(usize),
    Loop,
}

/// Reference machine that asks the agent to predict a digit tape.
///
/// The program is read as a tape of digits (taken modulo the number of
/// actions) cycled forever. Each action earns +1 when it equals the next
/// tape digit and -1 otherwise, and the observation is the digit just
/// revealed. Reading `#` spins until the step bound, so a program
/// containing it truncates the run once the agent gets there. Other
/// characters are ignored; a tape with no usable cells is a single `0`.
#[derive(Debug, Clone)]
pub struct SequenceEnvironment {
    actions: usize,
    max_steps: usize,
    tape: Vec<Cell>,
    position: usize,
    steps: usize,
}

impl SequenceEnvironment {
    pub fn new(actions: usize, max_steps: usize) -> Self {
        Self {
            actions,
            max_steps,
            tape: vec![Cell::Digit(0)],
            position: 0,
            steps: 0,
        }
    }

    fn load(&mut self, program: &str) {
        self.tape = program
            .chars()
            .filter_map(|c| match c {
                NON_HALTING => Some(Cell::Loop),
                _ => c.to_digit(10).map(|d| Cell::Digit(d as usize % self.actions)),
            })
            .collect();
        if self.tape.is_empty() {
            self.tape.push(Cell::Digit(0));
        }
        self.position = 0;
        self.steps = 0;
    }
}

impl Environment for SequenceEnvironment {
    fn reset(&mut self, program: &str) -> (f64, Observation) {
        self.load(program);
        (0.0, vec![0])
    }

    fn act(&mut self, action: usize) -> Step {
        let cell = self.tape[self.position % self.tape.len()];
        self.position += 1;

        match cell {
            Cell::Loop => {
                self.steps = self.max_steps;
                Step {
                    reward: 0.0,
                    observation: vec![0],
                    steps: self.steps,
                }
            }
            Cell::Digit(digit) => {
                self.steps = (self.steps + 1).min(self.max_steps);
                Step {
                    reward: if action == digit { 1.0 } else { -1.0 },
                    observation: vec![digit],
                    steps: self.steps,
                }
            }
        }
    }

    fn max_steps(&self) -> usize {
        self.max_steps
    }

    fn num_actions(&self) -> usize {
        self.actions
    }

    fn num_observation_symbols(&self) -> usize {
        self.actions
    }

    fn num_observation_cells(&self) -> usize {
        1
    }

    fn name(&self) -> String {
        format!("Sequence({},{})", self.actions, self.max_steps)
    }
}
