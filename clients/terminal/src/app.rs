use crate::surface::Surface;
use pong_core::{render::palette, Config, Game, InputPort, Player, RenderContext};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

/// Main application: the fixed-tick game loop over one input port and one
/// output surface
pub struct App {
    /// Game instance
    pub game: Game,
    /// Where per-tick inputs come from
    input: Box<dyn InputPort>,
    /// Render state over the output surface
    ctx: RenderContext<Box<dyn Surface>>,
    /// Raised by the keyboard thread or the Ctrl-C handler
    quit: Arc<AtomicBool>,
    /// Target duration of one tick
    frame: Duration,
    /// Whether the surface is currently too small for the court
    too_small: bool,
}

impl App {
    /// Constructs a new instance of App. The configuration must be valid.
    pub fn new(
        config: Config,
        input: Box<dyn InputPort>,
        surface: Box<dyn Surface>,
        quit: Arc<AtomicBool>,
    ) -> Self {
        let frame = Duration::from_secs_f64(1.0 / f64::from(config.fps));
        let game = Game::new(config);
        let court = game.court;
        let (width, height) = match surface.dimensions() {
            Ok(size) => size,
            Err(e) => {
                tracing::warn!("Unable to query surface size: {e}");
                (court.width, court.height)
            }
        };

        Self {
            game,
            input,
            ctx: RenderContext::new(surface, width, height),
            quit,
            frame,
            too_small: false,
        }
    }

    /// Run the game loop until the match is over or a quit is requested.
    /// Returns the winner, if the match was played to the end.
    pub fn run(mut self) -> Option<Player> {
        tracing::info!(
            "Starting match: {}x{} court at {} fps, first to {}",
            self.game.court.width,
            self.game.court.height,
            self.game.config.fps,
            self.game.config.score_needed_to_win
        );

        while !self.quit.load(Ordering::Relaxed) {
            let started = Instant::now();
            self.tick();
            if self.game.is_finished() {
                break;
            }
            // Overruns start the next tick immediately, without catching up
            thread::sleep(self.frame.saturating_sub(started.elapsed()));
        }

        let winner = self.game.winner();
        match winner {
            Some(player) => tracing::info!("Match over, {} won", player.label()),
            None => tracing::info!("Match abandoned at tick {}", self.game.tick),
        }
        winner
    }

    /// One tick: sample input, step the simulation, render. The match is
    /// held while the surface is too small to show it.
    pub fn tick(&mut self) {
        let inputs = self.input.poll();
        if !self.surface_fits() {
            self.ctx.flush();
            return;
        }

        if let Some(event) = self.game.step(&inputs) {
            tracing::debug!("Game event: {:?}", event);
        }
        self.game.redraw(&mut self.ctx);
        self.ctx.flush();
    }

    /// Track the surface size. Shows a notice once when it becomes too small
    /// and asks for a full draw once it fits again.
    fn surface_fits(&mut self) -> bool {
        match self.ctx.get_ref().dimensions() {
            Ok((width, height)) => {
                if self.ctx.resize(width, height) {
                    tracing::info!("Surface resized to {width}x{height}");
                    self.game.request_full_draw();
                }
            }
            Err(e) => tracing::warn!("Unable to query surface size: {e}"),
        }

        let (width, height) = self.ctx.dimensions();
        let court = self.game.court;
        if width < court.width || height < court.height {
            if !self.too_small {
                self.too_small = true;
                tracing::info!("Surface too small, holding the match");
                self.ctx.clear();
                let message = format!("Enlarge the window to {}x{}", court.width, court.height);
                self.ctx.print_at(0, 0, &message, palette::BANNER);
            }
            return false;
        }
        if self.too_small {
            self.too_small = false;
            self.game.request_full_draw();
        }
        true
    }
}
