/// Discrete simulation clock over time indices `0..horizon`.
///
/// Each index covers `period_minutes` of simulated time. The clock can be
/// halted early, after which `tick` yields nothing.
///
/// # Examples
///
/// ```
/// use acn_sim::sim::clock::Clock;
///
/// let mut clock = Clock::new(3, 5.0);
/// let mut steps = Vec::new();
///
/// while let Some(i) = clock.tick() {
///     steps.push(i);
/// }
/// assert_eq!(steps, vec![0, 1, 2]);
/// assert_eq!(clock.elapsed_minutes(), 15.0);
/// ```
#[derive(Debug, Clone)]
pub struct Clock {
    /// Next index to hand out
    next: usize,
    horizon: usize,
    period_minutes: f64,
    halted: bool,
}

impl Clock {
    /// Creates a clock with `horizon` indices of `period_minutes` each.
    ///
    /// # Panics
    ///
    /// Panics if `period_minutes` is not positive.
    pub fn new(horizon: usize, period_minutes: f64) -> Self {
        assert!(period_minutes > 0.0, "period_minutes must be > 0");
        Self {
            next: 0,
            horizon,
            period_minutes,
            halted: false,
        }
    }

    /// Returns the next time index, or `None` once the horizon is reached or
    /// the clock has been halted.
    pub fn tick(&mut self) -> Option<usize> {
        if self.halted || self.next >= self.horizon {
            return None;
        }
        let i = self.next;
        self.next += 1;
        Some(i)
    }

    /// Stops the clock; indices already handed out stay counted.
    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn is_done(&self) -> bool {
        self.halted || self.next >= self.horizon
    }

    /// Number of indices handed out so far.
    pub fn steps_taken(&self) -> usize {
        self.next
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn period_minutes(&self) -> f64 {
        self.period_minutes
    }

    /// Simulated time covered by the indices handed out so far.
    pub fn elapsed_minutes(&self) -> f64 {
        self.next as f64 * self.period_minutes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick() {
        let mut clock = Clock::new(2, 1.0);
        assert_eq!(clock.tick(), Some(0));
        assert_eq!(clock.tick(), Some(1));
        assert_eq!(clock.tick(), None);
        assert!(clock.is_done());
    }

    #[test]
    fn test_halt_stops_early() {
        let mut clock = Clock::new(10, 5.0);
        clock.tick();
        clock.tick();
        clock.halt();
        assert_eq!(clock.tick(), None);
        assert_eq!(clock.steps_taken(), 2);
        assert_eq!(clock.elapsed_minutes(), 10.0);
    }

    #[test]
    fn test_empty_clock() {
        let mut clock = Clock::new(0, 5.0);
        assert!(clock.is_done());
        assert_eq!(clock.tick(), None);
        assert_eq!(clock.elapsed_minutes(), 0.0);
    }

    #[test]
    #[should_panic]
    fn test_zero_period_panics() {
        Clock::new(5, 0.0);
    }
}
