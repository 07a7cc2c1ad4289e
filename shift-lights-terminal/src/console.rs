//! The simulated register, drawn in the terminal.
use shift_lights_core::backend::{GpioBackend, LineId, PinState, SimError, SimulatedRegister};

/// Prints a row every time the outputs are latched. Output 0 is on the left.
pub struct ConsoleBackend {
    sim: SimulatedRegister,
    printed: usize,
}

impl ConsoleBackend {
    pub fn new(sim: SimulatedRegister) -> Self {
        Self { sim, printed: 0 }
    }

    fn print_new_commits(&mut self) {
        let commits = self.sim.commits();

        for row in commits.iter().skip(self.printed) {
            println!("{}", render_row(row));
        }

        self.printed = commits.len();
    }
}

pub fn render_row(outputs: &[u8]) -> String {
    outputs
        .iter()
        .map(|x| if *x == 0 { '·' } else { '●' })
        .collect()
}

impl GpioBackend for ConsoleBackend {
    type Error = SimError;

    fn set_warnings(&mut self, enabled: bool) {
        self.sim.set_warnings(enabled);
    }

    fn configure_output(&mut self, line: LineId) -> Result<(), Self::Error> {
        self.sim.configure_output(line)
    }

    fn write_line(&mut self, line: LineId, state: PinState) -> Result<(), Self::Error> {
        self.sim.write_line(line, state)?;

        if state == PinState::High {
            self.print_new_commits();
        }

        Ok(())
    }

    fn release_all(&mut self) -> Result<(), Self::Error> {
        self.sim.release_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_row() {
        assert_eq!(render_row(&[1, 0, 0, 1]), "●··●");
        assert_eq!(render_row(&[]), "");
    }
}
