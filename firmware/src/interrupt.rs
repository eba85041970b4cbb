//! Interrupt pulse controller.
//!
//! Every input producer funnels into one active-low interrupt line to the
//! host. A qualifying event pulls the line low and schedules an alarm to
//! release it after the IND register's duration. A second event while the
//! line is still low cancels that alarm and schedules a fresh one, so a
//! burst of events becomes one longer pulse instead of a flicker.
//!
//! Two states per line:
//!
//! ```text
//!   IDLE ──trigger──▶ ASSERTED ──release──▶ IDLE
//!                      │    ▲
//!                      └────┘ trigger (cancel + reschedule)
//! ```
//!
//! Cancel-and-reschedule runs inside one critical section, and a release
//! only acts if it carries the currently recorded alarm id. A release that
//! raced a re-trigger therefore either got cancelled or finds a newer id
//! recorded and does nothing. Producer interrupts are masked for the
//! duration, so they cannot preempt a task-side trigger half-way.

use bridge_hal::alarm::{AlarmId, AlarmScheduler};
use bridge_hal::gpioexp::{GpioExpander, GpioListener};
use bridge_hal::keyboard::{KeyEvent, KeyListener, Keyboard, LockListener};
use bridge_hal::pin::OutputPin;
use bridge_hal::touchpad::{TouchListener, Touchpad};
use bridge_hal::HalResult;
use core::cell::RefCell;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use log::{debug, info, trace, warn};

use crate::reg::{Cf2, Cfg, Int, RegId, RegisterStore};

struct PulseState<P> {
    pin: P,
    /// Alarm that will release the line, if one is outstanding.
    pending_release: Option<AlarmId>,
    line_is_low: bool,
}

/// Drives the shared interrupt line.
pub struct PulseController<'a, R, P, S> {
    regs: &'a R,
    alarms: &'a S,
    state: Mutex<CriticalSectionRawMutex, RefCell<PulseState<P>>>,
}

impl<'a, R, P, S> PulseController<'a, R, P, S>
where
    R: RegisterStore,
    P: OutputPin,
    S: AlarmScheduler,
{
    pub const fn new(regs: &'a R, alarms: &'a S, pin: P) -> Self {
        Self {
            regs,
            alarms,
            state: Mutex::new(RefCell::new(PulseState {
                pin,
                pending_release: None,
                line_is_low: false,
            })),
        }
    }

    fn with_state<U>(&self, f: impl FnOnce(&mut PulseState<P>) -> U) -> U {
        self.state.lock(|state| f(&mut state.borrow_mut()))
    }

    /// `true` while the line is held low.
    pub fn is_asserted(&self) -> bool {
        self.with_state(|state| state.line_is_low)
    }

    /// The outstanding release alarm, if any.
    pub fn pending_release(&self) -> Option<AlarmId> {
        self.with_state(|state| state.pending_release)
    }

    /// Pull the line low (or keep it low) and (re)schedule its release.
    pub fn trigger_pulse(&self) {
        let pulse_us = u64::from(self.regs.get(RegId::Ind)) * 1000;
        self.with_state(|state| {
            // Extend an ongoing pulse. If the alarm already fired, `cancel`
            // reports false and its release will see a newer id below.
            if let Some(id) = state.pending_release.take() {
                self.alarms.cancel(id);
            }

            if !state.line_is_low {
                state.pin.set_low();
                state.line_is_low = true;
            }

            match self.alarms.schedule_in_us(pulse_us) {
                Some(id) => {
                    trace!("int: asserted, release in {}us (alarm {})", pulse_us, id.get());
                    state.pending_release = Some(id);
                }
                None => {
                    // Never leave the line low with nothing to release it.
                    warn!("int: no alarm slot, releasing immediately");
                    state.pin.set_high();
                    state.line_is_low = false;
                }
            }
        })
    }

    /// Release-alarm callback. Call from the timer context when `id` fires.
    ///
    /// Returns `true` if the line was released, `false` for a stale alarm.
    pub fn on_release_alarm(&self, id: AlarmId) -> bool {
        self.with_state(|state| {
            if state.pending_release != Some(id) {
                trace!("int: stale alarm {} ignored", id.get());
                return false;
            }
            state.pin.set_high();
            state.line_is_low = false;
            state.pending_release = None;
            trace!("int: released");
            true
        })
    }
}

impl<'a, R, P, S> PulseController<'a, R, P, S>
where
    R: RegisterStore,
    P: OutputPin + Send,
    S: AlarmScheduler + Sync,
{
    /// Configure the line as an idle output and hook into every producer.
    pub fn init<'b, const K: usize, const T: usize, const G: usize>(
        &'b self,
        keyboard: &Keyboard<'b, K>,
        touchpad: &Touchpad<'b, T>,
        gpioexp: &GpioExpander<'b, G>,
    ) -> HalResult<()> {
        self.with_state(|state| {
            state.pin.configure_output();
            state.pin.set_high();
            state.line_is_low = false;
            state.pending_release = None;
        });

        keyboard.add_key_callback(self)?;
        keyboard.add_lock_callback(self)?;
        touchpad.add_touch_callback(self)?;
        gpioexp.add_int_callback(self)?;

        info!("int: line idle, callbacks registered");
        Ok(())
    }
}

// ── Producer adapters ─────────────────────────────────────────────

impl<R, P, S> KeyListener for PulseController<'_, R, P, S>
where
    R: RegisterStore,
    P: OutputPin + Send,
    S: AlarmScheduler + Sync,
{
    fn on_key(&self, event: KeyEvent) {
        if !self.regs.cfg().contains(Cfg::KEY_INT) {
            return;
        }
        debug!("int: key {:#04x} {:?}", event.key, event.state);
        self.regs.set_bit(RegId::Int, Int::KEY.bits());
        self.trigger_pulse();
    }
}

impl<R, P, S> LockListener for PulseController<'_, R, P, S>
where
    R: RegisterStore,
    P: OutputPin + Send,
    S: AlarmScheduler + Sync,
{
    fn on_lock(&self, caps_changed: bool, num_changed: bool) {
        let cfg = self.regs.cfg();
        let mut raised = Int::empty();

        if caps_changed && cfg.contains(Cfg::CAPSLOCK_INT) {
            raised |= Int::CAPSLOCK;
        }
        if num_changed && cfg.contains(Cfg::NUMLOCK_INT) {
            raised |= Int::NUMLOCK;
        }

        // Caps and Num together still make a single pulse.
        if !raised.is_empty() {
            debug!("int: lock change {:?}", raised);
            self.regs.set_bit(RegId::Int, raised.bits());
            self.trigger_pulse();
        }
    }
}

impl<R, P, S> TouchListener for PulseController<'_, R, P, S>
where
    R: RegisterStore,
    P: OutputPin + Send,
    S: AlarmScheduler + Sync,
{
    fn on_touch(&self, _dx: i8, _dy: i8) {
        if !self.regs.cf2().contains(Cf2::TOUCH_INT) {
            return;
        }
        self.regs.set_bit(RegId::Int, Int::TOUCH.bits());
        self.trigger_pulse();
    }
}

impl<R, P, S> GpioListener for PulseController<'_, R, P, S>
where
    R: RegisterStore,
    P: OutputPin + Send,
    S: AlarmScheduler + Sync,
{
    fn on_gpio(&self, _gpio: u8, index: u8) {
        let Some(pin_bit) = 1u8.checked_shl(u32::from(index)) else {
            return;
        };
        if !self.regs.is_bit_set(RegId::Gic, pin_bit) {
            return;
        }
        debug!("int: gpio pin {}", index);
        self.regs.set_bit(RegId::Int, Int::GPIO.bits());
        self.regs.set_bit(RegId::Gin, pin_bit);
        self.trigger_pulse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reg::{load_defaults, RegisterFile};
    use bridge_hal::keyboard::KeyState;
    use bridge_hal::pin::Level;
    use bridge_hal::TickAlarms;
    use spin::Mutex;

    /// Records every level the controller drives.
    struct TracePin<'a>(&'a Mutex<Vec<Level>>);

    impl OutputPin for TracePin<'_> {
        fn configure_output(&mut self) {}

        fn set(&mut self, level: Level) {
            self.0.lock().push(level);
        }
    }

    type Ctl<'r> = PulseController<'r, RegisterFile, TracePin<'r>, TickAlarms<4>>;

    struct Rig {
        regs: RegisterFile,
        alarms: TickAlarms<4>,
        trace: Mutex<Vec<Level>>,
    }

    impl Rig {
        fn new() -> Self {
            let regs = RegisterFile::new();
            load_defaults(&regs);
            Self {
                regs,
                alarms: TickAlarms::new(),
                trace: Mutex::new(Vec::new()),
            }
        }

        fn controller(&self) -> Ctl<'_> {
            PulseController::new(&self.regs, &self.alarms, TracePin(&self.trace))
        }

        fn tick(&self, ctl: &Ctl<'_>, us: u64) -> usize {
            let mut released = 0;
            self.alarms.advance(us, |id| {
                if ctl.on_release_alarm(id) {
                    released += 1;
                }
            });
            released
        }
    }

    #[test]
    fn single_pulse_lasts_configured_duration() {
        let rig = Rig::new();
        rig.regs.set(RegId::Ind, 5);
        let ctl = rig.controller();

        ctl.trigger_pulse();
        assert!(ctl.is_asserted());
        assert_eq!(*rig.trace.lock(), vec![Level::Low]);

        assert_eq!(rig.tick(&ctl, 4_999), 0);
        assert!(ctl.is_asserted());
        assert_eq!(rig.tick(&ctl, 1), 1);
        assert!(!ctl.is_asserted());
        assert_eq!(ctl.pending_release(), None);
        assert_eq!(*rig.trace.lock(), vec![Level::Low, Level::High]);
    }

    #[test]
    fn retrigger_extends_from_second_call() {
        let rig = Rig::new();
        rig.regs.set(RegId::Ind, 5);
        let ctl = rig.controller();

        ctl.trigger_pulse();
        let first = ctl.pending_release().unwrap();
        rig.tick(&ctl, 1_000);
        ctl.trigger_pulse();
        let second = ctl.pending_release().unwrap();

        assert_ne!(first, second);
        assert_eq!(rig.alarms.pending(), 1);
        assert_eq!(rig.alarms.deadline_us(second), Some(6_000));

        assert_eq!(rig.tick(&ctl, 4_999), 0);
        assert!(ctl.is_asserted());
        assert_eq!(rig.tick(&ctl, 1), 1);
        assert_eq!(*rig.trace.lock(), vec![Level::Low, Level::High]);
    }

    #[test]
    fn back_to_back_triggers_make_one_edge() {
        let rig = Rig::new();
        let ctl = rig.controller();

        ctl.trigger_pulse();
        ctl.trigger_pulse();

        assert_eq!(rig.alarms.pending(), 1);
        assert_eq!(*rig.trace.lock(), vec![Level::Low]);
    }

    #[test]
    fn zero_duration_still_asserts_then_releases() {
        let rig = Rig::new();
        rig.regs.set(RegId::Ind, 0);
        let ctl = rig.controller();

        ctl.trigger_pulse();
        assert!(ctl.is_asserted());
        assert_eq!(rig.alarms.pending(), 1);

        assert_eq!(rig.tick(&ctl, 0), 1);
        assert!(!ctl.is_asserted());
        assert_eq!(*rig.trace.lock(), vec![Level::Low, Level::High]);
    }

    #[test]
    fn stale_release_is_ignored() {
        let rig = Rig::new();
        let ctl = rig.controller();

        ctl.trigger_pulse();
        let old = ctl.pending_release().unwrap();

        // The old alarm fired but its callback lost the race to a re-trigger.
        let mut fired = Vec::new();
        rig.alarms.advance(1_000, |id| fired.push(id));
        assert_eq!(fired, vec![old]);
        ctl.trigger_pulse();

        assert!(!ctl.on_release_alarm(old));
        assert!(ctl.is_asserted());
        assert!(ctl.pending_release().is_some());
    }

    #[test]
    fn exhausted_alarms_release_immediately() {
        let regs = RegisterFile::new();
        load_defaults(&regs);
        let alarms = TickAlarms::<1>::new();
        let blocker = alarms.schedule_in_us(1_000_000).unwrap();
        let trace = Mutex::new(Vec::new());
        let ctl = PulseController::new(&regs, &alarms, TracePin(&trace));

        ctl.trigger_pulse();
        assert!(!ctl.is_asserted());
        assert_eq!(ctl.pending_release(), None);
        assert_eq!(*trace.lock(), vec![Level::Low, Level::High]);
        assert!(alarms.cancel(blocker));
    }

    #[test]
    fn key_adapter_respects_enable_bit() {
        let rig = Rig::new();
        let ctl = rig.controller();
        let event = KeyEvent::new(b'q', KeyState::Pressed);

        rig.regs.clear_bit(RegId::Cfg, Cfg::KEY_INT.bits());
        ctl.on_key(event);
        assert!(rig.regs.int().is_empty());
        assert!(!ctl.is_asserted());

        rig.regs.set_bit(RegId::Cfg, Cfg::KEY_INT.bits());
        ctl.on_key(event);
        assert_eq!(rig.regs.int(), Int::KEY);
        assert!(ctl.is_asserted());
    }

    #[test]
    fn lock_changes_share_one_pulse() {
        let rig = Rig::new();
        rig.regs
            .set_bit(RegId::Cfg, (Cfg::CAPSLOCK_INT | Cfg::NUMLOCK_INT).bits());
        let ctl = rig.controller();

        ctl.on_lock(true, true);
        assert_eq!(rig.regs.int(), Int::CAPSLOCK | Int::NUMLOCK);
        assert_eq!(rig.alarms.pending(), 1);
        assert_eq!(*rig.trace.lock(), vec![Level::Low]);
    }

    #[test]
    fn lock_change_gated_per_lock() {
        let rig = Rig::new();
        rig.regs.set_bit(RegId::Cfg, Cfg::NUMLOCK_INT.bits());
        let ctl = rig.controller();

        ctl.on_lock(true, false);
        assert!(rig.regs.int().is_empty());
        assert!(!ctl.is_asserted());

        ctl.on_lock(true, true);
        assert_eq!(rig.regs.int(), Int::NUMLOCK);
        assert!(ctl.is_asserted());
    }

    #[test]
    fn touch_adapter_uses_cf2() {
        let rig = Rig::new();
        let ctl = rig.controller();

        rig.regs.set(RegId::Cf2, 0);
        ctl.on_touch(3, -2);
        assert!(!ctl.is_asserted());

        rig.regs.set(RegId::Cf2, Cf2::TOUCH_INT.bits());
        ctl.on_touch(3, -2);
        assert_eq!(rig.regs.int(), Int::TOUCH);
        assert!(ctl.is_asserted());
    }

    #[test]
    fn gpio_adapter_sets_aggregate_and_pin_bits() {
        let rig = Rig::new();
        rig.regs.set(RegId::Gic, 1 << 4);
        let ctl = rig.controller();

        ctl.on_gpio(17, 2);
        assert!(rig.regs.int().is_empty());
        assert!(!ctl.is_asserted());

        ctl.on_gpio(19, 4);
        assert_eq!(rig.regs.int(), Int::GPIO);
        assert_eq!(rig.regs.get(RegId::Gin), 1 << 4);
        assert!(ctl.is_asserted());
    }
}
