//! Match configuration, court geometry and the scoreboard glyphs.

use thiserror::Error;

/// Width of a score glyph in cells
pub const GLYPH_WIDTH: u16 = 3;
/// Height of a score glyph in cells
pub const GLYPH_HEIGHT: u16 = 5;

/// Pixel patterns for the digits 0-9, row-major, 3 wide by 5 tall
pub const SCORE_PATTERNS: [[u8; 15]; 10] = [
    [1, 1, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 1, 1],
    [0, 0, 1, 0, 0, 1, 0, 0, 1, 0, 0, 1, 0, 0, 1],
    [0, 1, 0, 1, 0, 1, 0, 0, 1, 0, 1, 0, 1, 1, 1],
    [1, 1, 1, 0, 0, 1, 0, 1, 1, 0, 0, 1, 1, 1, 1],
    [1, 0, 1, 1, 0, 1, 1, 1, 1, 0, 0, 1, 0, 0, 1],
    [1, 1, 1, 1, 0, 0, 1, 1, 1, 0, 0, 1, 1, 1, 1],
    [1, 1, 1, 1, 0, 0, 1, 1, 1, 1, 0, 1, 1, 1, 1],
    [1, 1, 1, 0, 0, 1, 0, 0, 1, 0, 1, 0, 1, 0, 0],
    [1, 1, 1, 1, 0, 1, 1, 1, 1, 1, 0, 1, 1, 1, 1],
    [1, 1, 1, 1, 0, 1, 1, 1, 1, 0, 0, 1, 1, 1, 1],
];

/// Offsets (dx, dy) of the lit pixels of a digit glyph
pub fn glyph_pixels(digit: u8) -> impl Iterator<Item = (u16, u16)> {
    let pattern = &SCORE_PATTERNS[(digit % 10) as usize];
    pattern
        .iter()
        .enumerate()
        .filter(|(_, on)| **on != 0)
        .map(|(i, _)| ((i as u16) % GLYPH_WIDTH, (i as u16) / GLYPH_WIDTH))
}

/// Configuration errors, reported once at startup
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("court {width}x{height} is too small (need at least {min_width}x{min_height})")]
    CourtTooSmall {
        width: u16,
        height: u16,
        min_width: u16,
        min_height: u16,
    },
    #[error("fps must be positive")]
    ZeroFps,
    #[error("{name} must be a positive finite number, got {value}")]
    InvalidSpeed { name: &'static str, value: f32 },
    #[error("ball bounce randomness must be within [0, 1), got {0}")]
    InvalidRandomness(f32),
    #[error("paddle height {0} does not fit the court")]
    PaddleTooTall(u16),
    #[error("score needed to win must be between 1 and 9, got {0}")]
    InvalidTargetScore(u8),
    #[error("adc range is empty: min {min} must be below max {max}")]
    EmptyAdcRange { min: u16, max: u16 },
    #[error("adc update rate must be positive")]
    ZeroAdcRate,
}

/// Game configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Court width in cells
    pub court_width: u16,
    /// Court height in cells
    pub court_height: u16,
    /// Rows at the top reserved for the banner
    pub banner_rows: u16,
    /// Tick frequency (Hz)
    pub fps: u16,
    /// Ball speed (cells per tick) at serve and on average after a bounce
    pub ball_init_speed: f32,
    /// After a bounce the horizontal speed is init_speed * [1 - r, 1 + r]
    pub ball_bounce_randomness: f32,
    /// Paddle height in cells
    pub paddle_height: u16,
    /// Paddle distance from its side of the court
    pub paddle_offset: u16,
    /// Paddle movement per tick at full input
    pub paddle_speed: f32,
    /// Score to win
    pub score_needed_to_win: u8,
    /// Stretch activations per player per match
    pub stretch_uses: u8,
    /// How long a stretch lasts
    pub stretch_duration_secs: f32,
    /// Pause between a point and the next serve
    pub round_pause_secs: f32,
    /// How long the game-over banner stays up
    pub game_over_pause_secs: f32,
    /// Horizontal distance of each score glyph from the net
    pub score_offset: u16,
    /// Top row of the score glyphs
    pub score_y: u16,
    /// Smallest raw analog reading
    pub adc_min: u16,
    /// Largest raw analog reading
    pub adc_max: u16,
    /// Analog sensor polls per second
    pub adc_updates_per_sec: u16,
    /// Random seed, entropy when unset
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            court_width: 80,
            court_height: 20,
            banner_rows: 1,
            fps: 32,
            ball_init_speed: 0.5,
            ball_bounce_randomness: 0.5,
            paddle_height: 3,
            paddle_offset: 1,
            paddle_speed: 0.6,
            score_needed_to_win: 5,
            stretch_uses: 3,
            stretch_duration_secs: 2.0,
            round_pause_secs: 0.75,
            game_over_pause_secs: 3.0,
            score_offset: 8,
            score_y: 1,
            adc_min: 0,
            adc_max: 4096,
            adc_updates_per_sec: 5,
            seed: None,
        }
    }
}

impl Config {
    /// Check the configuration can actually be played
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fps == 0 {
            return Err(ConfigError::ZeroFps);
        }
        for (name, value) in [
            ("ball_init_speed", self.ball_init_speed),
            ("paddle_speed", self.paddle_speed),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidSpeed { name, value });
            }
        }
        if !(0.0..1.0).contains(&self.ball_bounce_randomness) {
            return Err(ConfigError::InvalidRandomness(self.ball_bounce_randomness));
        }
        if self.score_needed_to_win == 0 || self.score_needed_to_win > 9 {
            return Err(ConfigError::InvalidTargetScore(self.score_needed_to_win));
        }

        // Both glyphs and both paddles must fit with room for the ball to travel
        let min_width = 2 * (self.score_offset + GLYPH_WIDTH) + 1;
        let min_width = min_width.max(2 * self.paddle_offset + 6);
        let min_height = (self.banner_rows + self.score_y + GLYPH_HEIGHT).max(self.banner_rows + 4);
        if self.court_width < min_width || self.court_height < min_height {
            return Err(ConfigError::CourtTooSmall {
                width: self.court_width,
                height: self.court_height,
                min_width,
                min_height,
            });
        }
        let band = self.court().play_band();
        if self.paddle_height == 0 || self.paddle_height as f32 + 2.0 >= band.y_max - band.y_min {
            return Err(ConfigError::PaddleTooTall(self.paddle_height));
        }

        if self.adc_max <= self.adc_min {
            return Err(ConfigError::EmptyAdcRange {
                min: self.adc_min,
                max: self.adc_max,
            });
        }
        if self.adc_updates_per_sec == 0 {
            return Err(ConfigError::ZeroAdcRate);
        }
        Ok(())
    }

    pub fn court(&self) -> Court {
        Court {
            width: self.court_width,
            height: self.court_height,
            banner_rows: self.banner_rows,
        }
    }

    /// Convert a wall-clock duration to a whole number of ticks (at least one)
    pub fn secs_to_ticks(&self, secs: f32) -> u32 {
        ((secs.max(0.0) * self.fps as f32).ceil() as u32).max(1)
    }

    /// Raw reading that maps to zero velocity
    pub fn adc_neutral(&self) -> u16 {
        self.adc_min + self.adc_max.saturating_sub(self.adc_min) / 2
    }
}

/// Court dimensions in cells
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Court {
    pub width: u16,
    pub height: u16,
    pub banner_rows: u16,
}

/// Vertical range the ball and paddles may use
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PlayBand {
    pub y_min: f32,
    pub y_max: f32,
}

impl Court {
    pub fn new(width: u16, height: u16) -> Self {
        Court {
            width,
            height,
            banner_rows: 1,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.width as f32 - 1.0) / 2.0,
            (self.height as f32 - 1.0) / 2.0,
        )
    }

    pub fn play_band(&self) -> PlayBand {
        PlayBand {
            y_min: self.banner_rows as f32,
            y_max: self.height as f32 - 1.0,
        }
    }

    /// Column of the centre net
    pub fn net_x(&self) -> u16 {
        self.width / 2
    }

    pub fn right_edge(&self) -> f32 {
        self.width as f32 - 1.0
    }

    pub fn contains(&self, x: u16, y: u16) -> bool {
        x < self.width && y < self.height
    }
}
