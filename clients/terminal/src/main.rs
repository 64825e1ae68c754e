//! Two-player Pong. Plays on the terminal with the keyboard, or on a serial
//! display with analog paddles and push buttons.
//!
//! Usage:
//!   pong-terminal
//!   pong-terminal --input sensor --output serial --serial-device /dev/ttyAMA0

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{bail, WrapErr};
use pong_core::{
    CommandInput, Config, InputPort, Mailbox, SensorCells, SensorInput, SensorPoller,
};
use std::{
    fs::{self, File},
    io::IsTerminal,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};
use tracing_subscriber::filter::EnvFilter;

mod app;
mod event;
mod sensor;
mod surface;

use app::App;
use event::EventHandler;
use sensor::SysfsSensorBus;
use surface::{SerialSurface, Surface, TerminalSurface};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputKind {
    /// Keyboard: W/S/D/A for player 1, arrow keys for player 2
    Keyboard,
    /// Analog paddles and buttons through sysfs
    Sensor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputKind {
    /// This terminal
    Terminal,
    /// A terminal on a serial line
    Serial,
}

#[derive(Parser, Debug)]
#[command(name = "pong-terminal")]
#[command(about = "Two-player Pong for a terminal or a serial display")]
struct Cli {
    /// JSON file with game settings; unset fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where paddle commands come from
    #[arg(long, value_enum, default_value_t = InputKind::Keyboard)]
    input: InputKind,

    /// Where the court is drawn
    #[arg(long, value_enum, default_value_t = OutputKind::Terminal)]
    output: OutputKind,

    /// Serial device for `--output serial`
    #[arg(long, default_value = "/dev/ttyAMA0")]
    serial_device: PathBuf,

    /// IIO device directory holding the paddle ADC channels
    #[arg(long, default_value = "/sys/bus/iio/devices/iio:device0")]
    iio_device: PathBuf,

    /// ADC channels of players 1 and 2
    #[arg(long, value_delimiter = ',', default_values_t = [0u8, 1])]
    adc_channels: Vec<u8>,

    /// Root of the sysfs GPIO tree
    #[arg(long, default_value = "/sys/class/gpio")]
    gpio_root: PathBuf,

    /// GPIO lines of the serve buttons of players 1 and 2
    #[arg(long, value_delimiter = ',', default_values_t = [17u32, 27])]
    serve_gpio: Vec<u32>,

    /// GPIO lines of the stretch buttons of players 1 and 2
    #[arg(long, value_delimiter = ',', default_values_t = [22u32, 23])]
    stretch_gpio: Vec<u32>,

    /// Court width in cells
    #[arg(long)]
    width: Option<u16>,

    /// Court height in cells
    #[arg(long)]
    height: Option<u16>,

    /// Ticks per second
    #[arg(long)]
    fps: Option<u16>,

    /// Points needed to win the match
    #[arg(long)]
    score_to_win: Option<u8>,

    /// Seed for the bounce randomness
    #[arg(long)]
    seed: Option<u64>,

    /// Log file; the screen belongs to the game
    #[arg(long, default_value = "pong.log")]
    log_file: PathBuf,
}

impl Cli {
    /// Settings from the config file (or defaults) with command line overrides
    fn game_config(&self) -> color_eyre::Result<Config> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => Config::default(),
        };

        if let Some(width) = self.width {
            config.court_width = width;
        }
        if let Some(height) = self.height {
            config.court_height = height;
        }
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if let Some(score) = self.score_to_win {
            config.score_needed_to_win = score;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        config.validate().wrap_err("invalid game configuration")?;
        Ok(config)
    }
}

fn load_config(path: &Path) -> color_eyre::Result<Config> {
    let text = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read config file {}", path.display()))?;
    serde_json::from_str(&text)
        .wrap_err_with(|| format!("failed to parse config file {}", path.display()))
}

fn pair<T: Copy>(values: &[T], what: &str) -> color_eyre::Result<[T; 2]> {
    match values {
        [one, two] => Ok([*one, *two]),
        _ => bail!("expected two {what}, one per player, got {}", values.len()),
    }
}

fn init_logging(path: &Path) -> color_eyre::Result<()> {
    let file = File::create(path)
        .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let config = cli.game_config()?;
    init_logging(&cli.log_file)?;
    tracing::info!("Input: {:?}, output: {:?}", cli.input, cli.output);

    let quit = Arc::new(AtomicBool::new(false));
    {
        let quit = Arc::clone(&quit);
        ctrlc::set_handler(move || quit.store(true, Ordering::Relaxed))
            .wrap_err("failed to install Ctrl-C handler")?;
    }

    // Keys are read whenever there is a keyboard, so quitting works with
    // sensor input too
    let mailbox = Mailbox::new();
    let keyboard = if cli.input == InputKind::Keyboard || std::io::stdin().is_terminal() {
        Some(EventHandler::new(mailbox.clone(), Arc::clone(&quit))?)
    } else {
        None
    };

    let input: Box<dyn InputPort> = match cli.input {
        InputKind::Keyboard => Box::new(CommandInput::new(mailbox)),
        InputKind::Sensor => {
            let bus = SysfsSensorBus::new(
                &cli.iio_device,
                &cli.gpio_root,
                pair(&cli.adc_channels, "ADC channels")?,
                pair(&cli.serve_gpio, "serve GPIO lines")?,
                pair(&cli.stretch_gpio, "stretch GPIO lines")?,
            );
            let cells = Arc::new(SensorCells::new(config.adc_neutral()));
            SensorPoller::new(bus, Arc::clone(&cells), &config)
                .spawn()
                .wrap_err("failed to start sensor poller")?;
            Box::new(SensorInput::new(cells, &config))
        }
    };

    let surface: Box<dyn Surface> = match cli.output {
        OutputKind::Terminal => {
            Box::new(TerminalSurface::new().wrap_err("failed to set up the terminal")?)
        }
        OutputKind::Serial => Box::new(
            SerialSurface::open(&cli.serial_device, config.court_width, config.court_height)
                .wrap_err_with(|| format!("failed to open {}", cli.serial_device.display()))?,
        ),
    };

    let winner = App::new(config, input, surface, quit).run();
    // Back on the normal screen, out of raw mode
    drop(keyboard);
    if let Some(player) = winner {
        println!("{} wins!", player.label());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["pong-terminal"]);
        assert_eq!(cli.input, InputKind::Keyboard);
        assert_eq!(cli.output, OutputKind::Terminal);
        assert_eq!(cli.adc_channels, vec![0, 1]);
        assert_eq!(cli.game_config().unwrap(), Config::default());
    }

    #[test]
    fn test_overrides_and_validation() {
        let cli = Cli::parse_from([
            "pong-terminal",
            "--input",
            "sensor",
            "--output",
            "serial",
            "--score-to-win",
            "3",
            "--seed",
            "7",
        ]);
        let config = cli.game_config().unwrap();
        assert_eq!(config.score_needed_to_win, 3);
        assert_eq!(config.seed, Some(7));

        let cli = Cli::parse_from(["pong-terminal", "--fps", "0"]);
        assert!(cli.game_config().is_err());
    }

    #[test]
    fn test_config_file_with_partial_settings() {
        let path = std::env::temp_dir().join(format!("pong-config-{}.json", std::process::id()));
        fs::write(&path, r#"{ "court_width": 100, "paddle_height": 4 }"#).unwrap();

        let cli = Cli::parse_from(["pong-terminal", "--config", path.to_str().unwrap()]);
        let config = cli.game_config().unwrap();
        assert_eq!(config.court_width, 100);
        assert_eq!(config.paddle_height, 4);
        assert_eq!(config.fps, 32);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_pair_requires_two_values() {
        assert_eq!(pair(&[3u8, 4], "channels").unwrap(), [3, 4]);
        assert!(pair(&[3u8], "channels").is_err());
    }
}
