// Local bidding countdown.
//
// Purely advisory: it is driven by the control loop's one-second interval and
// never compared against the server's `timer_started_at`.

use gavel_core::protocol::TimerView;

/// Result of advancing the countdown by one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The countdown is not running; nothing changed.
    Idle,
    /// One second elapsed and this many remain.
    Running(u32),
    /// The countdown just reached zero. Reported exactly once per run.
    Expired,
}

#[derive(Debug, Clone)]
pub struct Countdown {
    duration: u32,
    remaining: u32,
    active: bool,
}

impl Countdown {
    pub fn new(duration: u32) -> Self {
        Countdown {
            duration,
            remaining: duration,
            active: false,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Back to the full duration and running.
    pub fn start(&mut self) {
        self.remaining = self.duration;
        self.active = true;
    }

    pub fn pause(&mut self) {
        self.active = false;
    }

    /// Continue from where it was paused. A countdown sitting at zero stays
    /// stopped; returns whether it is now running.
    pub fn resume(&mut self) -> bool {
        if self.remaining > 0 {
            self.active = true;
        }
        self.active
    }

    /// Back to the full duration, stopped.
    pub fn reset(&mut self) {
        self.remaining = self.duration;
        self.active = false;
    }

    pub fn tick(&mut self) -> Tick {
        if !self.active {
            return Tick::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.active = false;
            Tick::Expired
        } else {
            Tick::Running(self.remaining)
        }
    }

    pub fn view(&self) -> TimerView {
        TimerView {
            remaining: self.remaining,
            duration: self.duration,
            active: self.active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_countdown_is_full_and_stopped() {
        let c = Countdown::new(60);
        assert_eq!(c.remaining(), 60);
        assert!(!c.is_active());
    }

    #[test]
    fn full_run_observes_sixty_one_values() {
        let mut c = Countdown::new(60);
        c.start();
        let mut observed = vec![c.remaining()];
        loop {
            // Still running for every value above zero.
            assert!(c.is_active(), "went inactive early at {}", c.remaining());
            match c.tick() {
                Tick::Running(n) => observed.push(n),
                Tick::Expired => {
                    observed.push(c.remaining());
                    break;
                }
                Tick::Idle => panic!("idle while active"),
            }
        }
        assert_eq!(observed.len(), 61);
        assert_eq!(observed, (0..=60).rev().collect::<Vec<u32>>());
        assert!(!c.is_active());
    }

    #[test]
    fn expiry_is_reported_once_and_clamps_at_zero() {
        let mut c = Countdown::new(2);
        c.start();
        assert_eq!(c.tick(), Tick::Running(1));
        assert_eq!(c.tick(), Tick::Expired);
        assert_eq!(c.tick(), Tick::Idle);
        assert_eq!(c.tick(), Tick::Idle);
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn pause_and_resume_keep_remaining() {
        let mut c = Countdown::new(10);
        c.start();
        c.tick();
        c.tick();
        c.pause();
        assert_eq!(c.tick(), Tick::Idle);
        assert_eq!(c.remaining(), 8);
        assert!(c.resume());
        assert_eq!(c.tick(), Tick::Running(7));
    }

    #[test]
    fn resume_at_zero_stays_stopped() {
        let mut c = Countdown::new(1);
        c.start();
        assert_eq!(c.tick(), Tick::Expired);
        assert!(!c.resume());
        assert_eq!(c.tick(), Tick::Idle);
    }

    #[test]
    fn reset_restores_duration_and_stops() {
        let mut c = Countdown::new(60);
        c.start();
        c.tick();
        c.reset();
        assert_eq!(c.remaining(), 60);
        assert!(!c.is_active());
    }

    #[test]
    fn start_restarts_a_running_countdown() {
        let mut c = Countdown::new(60);
        c.start();
        for _ in 0..30 {
            c.tick();
        }
        c.start();
        assert_eq!(c.view(), TimerView { remaining: 60, duration: 60, active: true });
    }
}
