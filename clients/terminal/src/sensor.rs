//! Sensor bus over Linux sysfs: analog paddles through an IIO ADC, buttons
//! through exported GPIO lines (active high, pulled down).

use pong_core::{Button, Player, SensorBus};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Sysfs locations of one player's controls
#[derive(Debug, Clone)]
struct PlayerPins {
    movement: PathBuf,
    serve: PathBuf,
    stretch: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SysfsSensorBus {
    pins: [PlayerPins; 2],
}

impl SysfsSensorBus {
    /// `channels` are the ADC inputs of players one and two, `serve` and
    /// `stretch` their GPIO line numbers
    pub fn new(
        iio_device: &Path,
        gpio_root: &Path,
        channels: [u8; 2],
        serve: [u32; 2],
        stretch: [u32; 2],
    ) -> Self {
        let pins = |i: usize| PlayerPins {
            movement: iio_device.join(format!("in_voltage{}_raw", channels[i])),
            serve: gpio_root.join(format!("gpio{}", serve[i])).join("value"),
            stretch: gpio_root.join(format!("gpio{}", stretch[i])).join("value"),
        };
        Self {
            pins: [pins(0), pins(1)],
        }
    }
}

fn read_trimmed(path: &Path) -> io::Result<String> {
    Ok(fs::read_to_string(path)?.trim().to_owned())
}

fn invalid(path: &Path, value: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("unexpected value {:?} in {}", value, path.display()),
    )
}

impl SensorBus for SysfsSensorBus {
    fn read_movement(&mut self, player: Player) -> io::Result<u16> {
        let path = &self.pins[player.index()].movement;
        let value = read_trimmed(path)?;
        value.parse().map_err(|_| invalid(path, &value))
    }

    fn read_button(&mut self, player: Player, button: Button) -> io::Result<bool> {
        let pins = &self.pins[player.index()];
        let path = match button {
            Button::Serve => &pins.serve,
            Button::Stretch => &pins.stretch,
        };
        match read_trimmed(path)?.as_str() {
            "1" => Ok(true),
            "0" => Ok(false),
            other => Err(invalid(path, other)),
        }
    }
}
