//! Timed blink state machine for the indicator LEDs.
//!
//! Each configured output owns exactly one [`BlinkTask`]. A task is idle
//! (output held off) until [`BlinkScheduler::start`] arms it; from then on
//! every [`BlinkScheduler::update`] flips the output once at least
//! `BLINK_INTERVAL_MS` have passed since the previous flip, and after
//! `BLINK_DURATION_MS` the task parks the output off again.
//!
//! The scheduler never counts ticks: decisions are made from elapsed time,
//! so calling `update` more often than the interval is harmless and calling
//! it less often does not drift.

use embedded_hal::digital::OutputPin;

use crate::clock::{elapsed, Millis};
use crate::config::{BLINK_DURATION_MS, BLINK_INTERVAL_MS};

/// Opaque handle naming one physical indicator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutputId(pub u8);

/// Electrical level that lights the indicator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

/// A digital output driven in logical on/off terms.
pub struct Indicator<P> {
    pin: P,
    polarity: Polarity,
}

impl<P: OutputPin> Indicator<P> {
    pub fn new(pin: P, polarity: Polarity) -> Self {
        Self { pin, polarity }
    }

    pub fn active_high(pin: P) -> Self {
        Self::new(pin, Polarity::ActiveHigh)
    }

    pub fn active_low(pin: P) -> Self {
        Self::new(pin, Polarity::ActiveLow)
    }

    /// Drive the indicator to logical `on` / off.
    ///
    /// GPIO writes are treated as infallible; a HAL error is dropped.
    pub fn set(&mut self, on: bool) {
        let high = on == (self.polarity == Polarity::ActiveHigh);
        let _ = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
    }
}

/// Blink state of one indicator.
pub struct BlinkTask<P> {
    output: OutputId,
    indicator: Indicator<P>,
    active: bool,
    illuminated: bool,
    started_at: Millis,
    last_toggled_at: Option<Millis>,
}

impl<P: OutputPin> BlinkTask<P> {
    fn idle(output: OutputId, mut indicator: Indicator<P>) -> Self {
        indicator.set(false);
        Self {
            output,
            indicator,
            active: false,
            illuminated: false,
            started_at: 0,
            last_toggled_at: None,
        }
    }

    pub fn output(&self) -> OutputId {
        self.output
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_illuminated(&self) -> bool {
        self.illuminated
    }

    pub fn started_at(&self) -> Millis {
        self.started_at
    }

    fn restart(&mut self, now: Millis) {
        self.active = true;
        self.illuminated = false;
        self.started_at = now;
        self.last_toggled_at = None;
        self.indicator.set(false);
    }

    fn advance(&mut self, now: Millis) {
        if !self.active {
            return;
        }

        if elapsed(now, self.started_at) >= BLINK_DURATION_MS {
            self.active = false;
            self.illuminated = false;
            self.indicator.set(false);
            return;
        }

        let due = self
            .last_toggled_at
            .map_or(true, |at| elapsed(now, at) >= BLINK_INTERVAL_MS);
        if due {
            self.illuminated = !self.illuminated;
            self.indicator.set(self.illuminated);
            self.last_toggled_at = Some(now);
        }
    }
}

/// The same output was listed twice when building the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DuplicateOutput(pub OutputId);

/// Fixed set of blink tasks, one per configured output.
pub struct BlinkScheduler<P, const N: usize> {
    tasks: [BlinkTask<P>; N],
}

impl<P: OutputPin, const N: usize> BlinkScheduler<P, N> {
    /// Build the task set. Every output is driven off and left idle.
    pub fn new(outputs: [(OutputId, Indicator<P>); N]) -> Result<Self, DuplicateOutput> {
        for (i, (id, _)) in outputs.iter().enumerate() {
            if outputs[..i].iter().any(|(other, _)| other == id) {
                return Err(DuplicateOutput(*id));
            }
        }

        Ok(Self {
            tasks: outputs.map(|(id, indicator)| BlinkTask::idle(id, indicator)),
        })
    }

    /// (Re)start blinking `output` from `now`.
    ///
    /// An already running task is not extended: its window restarts from
    /// zero and the output is switched off first. Returns `false` if no
    /// task owns `output`.
    pub fn start(&mut self, output: OutputId, now: Millis) -> bool {
        match self.task_mut(output) {
            Some(task) => {
                task.restart(now);
                true
            }
            None => false,
        }
    }

    /// Advance every active task to `now`.
    pub fn update(&mut self, now: Millis) {
        for task in self.tasks.iter_mut() {
            task.advance(now);
        }
    }

    pub fn task(&self, output: OutputId) -> Option<&BlinkTask<P>> {
        self.tasks.iter().find(|t| t.output == output)
    }

    fn task_mut(&mut self, output: OutputId) -> Option<&mut BlinkTask<P>> {
        self.tasks.iter_mut().find(|t| t.output == output)
    }

    pub fn is_active(&self, output: OutputId) -> Option<bool> {
        self.task(output).map(BlinkTask::is_active)
    }

    pub fn is_illuminated(&self, output: OutputId) -> Option<bool> {
        self.task(output).map(BlinkTask::is_illuminated)
    }

    /// Number of tasks currently blinking.
    pub fn active_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.active).count()
    }

    pub fn tasks(&self) -> impl Iterator<Item = &BlinkTask<P>> {
        self.tasks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{PinProbe, ProbePin};

    const A: OutputId = OutputId(1);
    const B: OutputId = OutputId(2);

    fn scheduler() -> (BlinkScheduler<ProbePin, 2>, PinProbe, PinProbe) {
        let (pa, probe_a) = ProbePin::new();
        let (pb, probe_b) = ProbePin::new();
        let sched = BlinkScheduler::new([
            (A, Indicator::active_high(pa)),
            (B, Indicator::active_high(pb)),
        ])
        .unwrap();
        (sched, probe_a, probe_b)
    }

    /// Run the scheduler at a 10 ms cadence over `[from, to]`.
    fn run(sched: &mut BlinkScheduler<ProbePin, 2>, from: Millis, to: Millis) {
        let mut t = from;
        while t <= to {
            sched.update(t);
            t += 10;
        }
    }

    #[test]
    fn all_outputs_start_idle_and_off() {
        let (sched, a, b) = scheduler();
        assert_eq!(sched.active_count(), 0);
        assert!(!a.is_high());
        assert!(!b.is_high());
        assert_eq!(sched.is_active(A), Some(false));
    }

    #[test]
    fn duplicate_outputs_rejected() {
        let (pa, _) = ProbePin::new();
        let (pb, _) = ProbePin::new();
        let result = BlinkScheduler::new([
            (A, Indicator::active_high(pa)),
            (A, Indicator::active_high(pb)),
        ]);
        assert_eq!(result.err(), Some(DuplicateOutput(A)));
    }

    #[test]
    fn start_turns_output_off_and_arms_task() {
        let (mut sched, a, _) = scheduler();
        assert!(sched.start(A, 1_000));
        let task = sched.task(A).unwrap();
        assert!(task.is_active());
        assert!(!task.is_illuminated());
        assert_eq!(task.started_at(), 1_000);
        assert!(!a.is_high());
    }

    #[test]
    fn start_unknown_output_is_noop() {
        let (mut sched, a, b) = scheduler();
        let writes = a.writes() + b.writes();
        assert!(!sched.start(OutputId(9), 0));
        assert_eq!(sched.active_count(), 0);
        assert_eq!(a.writes() + b.writes(), writes);
    }

    #[test]
    fn first_update_lights_immediately() {
        let (mut sched, a, _) = scheduler();
        sched.start(A, 0);
        sched.update(0);
        assert!(a.is_high());
        assert_eq!(sched.is_illuminated(A), Some(true));
    }

    #[test]
    fn toggles_are_at_least_interval_apart() {
        let (mut sched, a, _) = scheduler();
        sched.start(A, 0);

        let mut last_level = a.is_high();
        let mut last_toggle: Option<Millis> = None;
        let mut toggles = 0;
        for t in (0..3_000).step_by(7) {
            sched.update(t);
            if a.is_high() != last_level {
                if let Some(prev) = last_toggle {
                    assert!(t - prev >= BLINK_INTERVAL_MS, "toggle at {t} after {prev}");
                }
                last_toggle = Some(t);
                last_level = a.is_high();
                toggles += 1;
            }
        }
        assert!(toggles >= 10);
    }

    #[test]
    fn frequent_updates_do_not_add_toggles() {
        let (mut sched, a, _) = scheduler();
        sched.start(A, 0);
        sched.update(0);
        let writes = a.writes();
        for t in 1..250 {
            sched.update(t);
        }
        assert_eq!(a.writes(), writes);
        sched.update(250);
        assert_eq!(a.writes(), writes + 1);
        assert!(!a.is_high());
    }

    #[test]
    fn sparse_updates_self_correct() {
        let (mut sched, a, _) = scheduler();
        sched.start(A, 0);
        sched.update(0);
        assert!(a.is_high());
        // A late tick toggles once, it does not replay missed toggles.
        sched.update(900);
        assert!(!a.is_high());
        sched.update(1_100);
        assert!(!a.is_high());
        sched.update(1_150);
        assert!(a.is_high());
    }

    #[test]
    fn blink_parks_off_after_duration() {
        let (mut sched, a, _) = scheduler();
        sched.start(A, 0);

        let mut was_lit = false;
        for t in (0..BLINK_DURATION_MS).step_by(10) {
            sched.update(t);
            was_lit |= a.is_high();
        }
        assert!(was_lit);

        sched.update(BLINK_DURATION_MS);
        assert!(!a.is_high());
        assert_eq!(sched.is_active(A), Some(false));

        for t in (BLINK_DURATION_MS..BLINK_DURATION_MS + 2_000).step_by(10) {
            sched.update(t);
            assert!(!a.is_high());
        }
    }

    #[test]
    fn restart_resets_window() {
        let (mut sched, a, _) = scheduler();
        sched.start(A, 0);
        run(&mut sched, 0, 2_000);

        assert!(sched.start(A, 2_000));
        assert!(!a.is_high());
        assert_eq!(sched.task(A).unwrap().started_at(), 2_000);

        // Still blinking past the first window's end.
        sched.update(3_500);
        assert_eq!(sched.is_active(A), Some(true));
        // And it does not last longer than one window from the restart.
        sched.update(5_000);
        assert_eq!(sched.is_active(A), Some(false));
        assert!(!a.is_high());
    }

    #[test]
    fn tasks_are_independent() {
        let (mut sched, a, b) = scheduler();
        sched.start(A, 0);
        sched.update(0);
        sched.start(B, 100);
        sched.update(100);

        assert!(a.is_high());
        assert!(b.is_high());
        assert_eq!(sched.active_count(), 2);

        sched.update(3_000);
        assert_eq!(sched.is_active(A), Some(false));
        assert_eq!(sched.is_active(B), Some(true));
    }

    #[test]
    fn blink_across_clock_rollover() {
        let (mut sched, a, _) = scheduler();
        let t0 = u32::MAX - 1_000;
        sched.start(A, t0);
        sched.update(t0);
        assert!(a.is_high());

        sched.update(t0.wrapping_add(250));
        assert!(!a.is_high());

        sched.update(t0.wrapping_add(2_990));
        assert_eq!(sched.is_active(A), Some(true));

        sched.update(t0.wrapping_add(3_000));
        assert_eq!(sched.is_active(A), Some(false));
        assert!(!a.is_high());
    }

    #[test]
    fn active_low_polarity_inverts_pin() {
        let (pin, probe) = ProbePin::new();
        let mut sched = BlinkScheduler::new([(A, Indicator::active_low(pin))]).unwrap();
        // Idle means the pin is held high.
        assert!(probe.is_high());

        sched.start(A, 0);
        sched.update(0);
        assert!(!probe.is_high());
        assert_eq!(sched.is_illuminated(A), Some(true));
    }
}
