//! Input ports: the single-slot command mailbox fed by an event source, and
//! the last-known-value sensor cells fed by a background poller.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::Config;
use crate::types::{Command, Inputs, Player, PlayerInput};

/// Normalised readings closer than this to zero count as zero
pub const SENSOR_DEAD_ZONE: f32 = 0.05;

/// Source of per-tick inputs for both players. Polling never blocks.
pub trait InputPort {
    fn poll(&mut self) -> Inputs;
}

/// Single-slot channel with overwrite semantics: a new value replaces one
/// that has not been taken yet.
#[derive(Debug)]
pub struct Mailbox<T> {
    slot: Arc<Mutex<Option<T>>>,
}

impl<T> Clone for Mailbox<T> {
    fn clone(&self) -> Self {
        Mailbox {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Mailbox {
            slot: Arc::new(Mutex::new(None)),
        }
    }
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, dropping any value still waiting
    pub fn put(&self, value: T) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(value);
    }

    /// Take the waiting value, if any
    pub fn take(&self) -> Option<T> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Input port for discrete command sources such as a keyboard
pub struct CommandInput {
    mailbox: Mailbox<Command>,
}

impl CommandInput {
    pub fn new(mailbox: Mailbox<Command>) -> Self {
        CommandInput { mailbox }
    }
}

impl InputPort for CommandInput {
    fn poll(&mut self) -> Inputs {
        match self.mailbox.take() {
            Some(command) => Inputs::from_command(command),
            None => Inputs::idle(),
        }
    }
}

/// Push buttons wired to each player
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Button {
    Serve,
    Stretch,
}

/// Hardware the sensor poller reads from
pub trait SensorBus: Send {
    /// Raw analog reading of the player's movement control
    fn read_movement(&mut self, player: Player) -> io::Result<u16>;

    /// Whether the player's button is held down
    fn read_button(&mut self, player: Player, button: Button) -> io::Result<bool>;
}

/// Last known sensor values, shared between the poller and the game loop
#[derive(Debug)]
pub struct SensorCells {
    movement: [AtomicU16; 2],
    serve: [AtomicBool; 2],
    stretch: [AtomicBool; 2],
}

impl SensorCells {
    pub fn new(neutral: u16) -> Self {
        SensorCells {
            movement: [AtomicU16::new(neutral), AtomicU16::new(neutral)],
            serve: [AtomicBool::new(false), AtomicBool::new(false)],
            stretch: [AtomicBool::new(false), AtomicBool::new(false)],
        }
    }

    pub fn movement(&self, player: Player) -> u16 {
        self.movement[player.index()].load(Ordering::Relaxed)
    }

    pub fn set_movement(&self, player: Player, raw: u16) {
        self.movement[player.index()].store(raw, Ordering::Relaxed);
    }

    pub fn button(&self, player: Player, button: Button) -> bool {
        self.button_cell(player, button).load(Ordering::Relaxed)
    }

    pub fn set_button(&self, player: Player, button: Button, held: bool) {
        self.button_cell(player, button)
            .store(held, Ordering::Relaxed);
    }

    fn button_cell(&self, player: Player, button: Button) -> &AtomicBool {
        match button {
            Button::Serve => &self.serve[player.index()],
            Button::Stretch => &self.stretch[player.index()],
        }
    }
}

/// Periodically reads a [`SensorBus`] into [`SensorCells`].
///
/// A failed analog read stores the neutral reading; a failed button read
/// keeps the previous value. Failures are logged and never stop the poller.
pub struct SensorPoller<B: SensorBus> {
    bus: B,
    cells: Arc<SensorCells>,
    period: Duration,
    neutral: u16,
}

impl<B: SensorBus + 'static> SensorPoller<B> {
    pub fn new(bus: B, cells: Arc<SensorCells>, config: &Config) -> Self {
        SensorPoller {
            bus,
            cells,
            period: Duration::from_secs_f32(1.0 / config.adc_updates_per_sec.max(1) as f32),
            neutral: config.adc_neutral(),
        }
    }

    /// Read every sensor once
    pub fn poll_once(&mut self) {
        for player in Player::BOTH {
            let raw = match self.bus.read_movement(player) {
                Ok(raw) => raw,
                Err(err) => {
                    tracing::warn!(
                        "Movement read failed for {}, using neutral value: {}",
                        player.label(),
                        err
                    );
                    self.neutral
                }
            };
            self.cells.set_movement(player, raw);

            for button in [Button::Serve, Button::Stretch] {
                match self.bus.read_button(player, button) {
                    Ok(held) => self.cells.set_button(player, button, held),
                    Err(err) => tracing::warn!(
                        "Unable to read {:?} button for {}: {}",
                        button,
                        player.label(),
                        err
                    ),
                }
            }
        }
    }

    /// Poll forever on a background thread
    pub fn spawn(mut self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("sensor-poller".to_owned())
            .spawn(move || loop {
                self.poll_once();
                thread::sleep(self.period);
            })
    }
}

/// Map a raw reading in `[min, max]` to `[-1, 1]`
pub fn normalize_reading(raw: u16, min: u16, max: u16) -> f32 {
    if max <= min {
        return 0.0;
    }
    let raw = raw.clamp(min, max);
    let unit = (raw - min) as f32 / (max - min) as f32;
    let value = unit * 2.0 - 1.0;
    if value.abs() < SENSOR_DEAD_ZONE {
        0.0
    } else {
        value
    }
}

/// Input port over the sensor cells. Buttons fire once per press.
pub struct SensorInput {
    cells: Arc<SensorCells>,
    adc_min: u16,
    adc_max: u16,
    held: [[bool; 2]; 2],
}

impl SensorInput {
    pub fn new(cells: Arc<SensorCells>, config: &Config) -> Self {
        SensorInput {
            cells,
            adc_min: config.adc_min,
            adc_max: config.adc_max,
            held: [[false; 2]; 2],
        }
    }

    /// True on the tick a button goes from released to held
    fn pressed(&mut self, player: Player, button: Button) -> bool {
        let held = self.cells.button(player, button);
        let slot = &mut self.held[player.index()][button as usize];
        let pressed = held && !*slot;
        *slot = held;
        pressed
    }
}

impl InputPort for SensorInput {
    fn poll(&mut self) -> Inputs {
        let mut inputs = Inputs::idle();
        for player in Player::BOTH {
            let raw = self.cells.movement(player);
            *inputs.get_mut(player) = PlayerInput {
                velocity: normalize_reading(raw, self.adc_min, self.adc_max),
                serve: self.pressed(player, Button::Serve),
                stretch: self.pressed(player, Button::Stretch),
            };
        }
        inputs
    }
}
