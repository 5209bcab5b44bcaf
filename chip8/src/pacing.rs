use std::time::Duration;

use g8_core::TIMER_FREQUENCY;

/// Never try to catch up on more than this much wall-clock time at once,
/// e.g. after the window was dragged or the process was suspended
const MAX_CATCH_UP: Duration = Duration::from_millis(250);

/// How much work is due after some wall-clock time has passed
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Due {
    pub cycles: u32,
    pub timer_ticks: u32,
}

/// # Pacer
/// Converts elapsed wall-clock time into CPU cycles and timer ticks.
///
/// The two run on separate clocks: cycles at whatever frequency the user asked for,
/// timers always at `TIMER_FREQUENCY`. Leftover time carries over to the next call.
pub struct Pacer {
    cycle_period: Duration,
    timer_period: Duration,
    cycle_debt: Duration,
    timer_debt: Duration,
}

impl Pacer {
    /// # Arguments
    /// * `frequency` CPU cycles per second; must be non-zero
    pub fn new(frequency: u32) -> Self {
        Pacer {
            cycle_period: Duration::from_secs(1) / frequency.max(1),
            timer_period: Duration::from_secs(1) / TIMER_FREQUENCY,
            cycle_debt: Duration::ZERO,
            timer_debt: Duration::ZERO,
        }
    }

    pub fn advance(&mut self, elapsed: Duration) -> Due {
        let elapsed = elapsed.min(MAX_CATCH_UP);
        self.cycle_debt += elapsed;
        self.timer_debt += elapsed;
        Due {
            cycles: drain(&mut self.cycle_debt, self.cycle_period),
            timer_ticks: drain(&mut self.timer_debt, self.timer_period),
        }
    }

    /// Forgets any accumulated time
    pub fn reset(&mut self) {
        self.cycle_debt = Duration::ZERO;
        self.timer_debt = Duration::ZERO;
    }
}

/// Takes as many whole periods out of `debt` as it holds
fn drain(debt: &mut Duration, period: Duration) -> u32 {
    let mut count = 0;
    while *debt >= period {
        *debt -= period;
        count += 1;
    }
    count
}
