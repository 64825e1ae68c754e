//! Match state machine: serving, playing, round and game endings.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;

use crate::ball::Ball;
use crate::config::{Config, Court};
use crate::overlay::UserInterface;
use crate::paddle::Paddle;
use crate::physics::Physics;
use crate::render::{RenderContext, Renderable};
use crate::types::*;

/// Match-level state
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MatchState {
    pub status: Status,
    /// Who serves the current (or next) round
    pub player_serving: Player,
    pub score_needed_to_win: u8,
}

/// Main game state and logic
pub struct Game {
    pub config: Config,
    pub court: Court,
    pub tick: Tick,
    pub state: MatchState,
    pub ball: Ball,
    pub paddles: [Paddle; 2],
    pub ui: UserInterface,
    rng: StdRng,
    round_pause_ticks: u32,
    game_over_ticks: u32,
    full_draw_pending: bool,
}

impl Game {
    /// Create a new match. The configuration is expected to be validated.
    pub fn new(config: Config) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut game = Game {
            court: config.court(),
            tick: 0,
            state: MatchState {
                status: Status::Serving(Player::One),
                player_serving: Player::One,
                score_needed_to_win: config.score_needed_to_win,
            },
            ball: Ball::new(config.ball_init_speed),
            paddles: [
                Paddle::new(Player::One, &config),
                Paddle::new(Player::Two, &config),
            ],
            ui: UserInterface::new(&config),
            rng,
            round_pause_ticks: config.secs_to_ticks(config.round_pause_secs),
            game_over_ticks: config.secs_to_ticks(config.game_over_pause_secs),
            full_draw_pending: true,
            config,
        };

        game.start_round(Player::One);
        game
    }

    /// Step the game simulation forward by one tick
    pub fn step(&mut self, inputs: &Inputs) -> Option<Event> {
        let mut event = None;

        match self.state.status {
            Status::Serving(server) => {
                self.apply_inputs(inputs);
                self.update_paddles();
                self.ball.update();
                Physics::pin_to_paddle(&mut self.ball, &self.paddles[server.index()]);

                if inputs.get(server).serve {
                    Physics::serve(&mut self.ball, server);
                    self.state.status = Status::Playing;
                    tracing::info!("{} serves", server.label());
                    event = Some(Event::Served(server));
                }
            }

            Status::Playing => {
                self.apply_inputs(inputs);
                self.update_paddles();
                self.ball.update();
                event = self.resolve_collisions();
            }

            Status::RoundEnding { scorer, ticks_left } => {
                self.hold_entities();

                if let Some(winner) = self.winner_by_score() {
                    self.state.status = Status::GameEnding {
                        winner,
                        ticks_left: self.game_over_ticks,
                    };
                    tracing::info!(
                        "{} wins {}-{}",
                        winner.label(),
                        self.paddles[0].score,
                        self.paddles[1].score
                    );
                    event = Some(Event::MatchWon(winner));
                } else if ticks_left <= 1 {
                    let server = self.state.player_serving.opponent();
                    self.start_round(server);
                    event = Some(Event::RoundStarted { server });
                } else {
                    self.state.status = Status::RoundEnding {
                        scorer,
                        ticks_left: ticks_left - 1,
                    };
                }
            }

            Status::GameEnding { winner, ticks_left } => {
                self.hold_entities();
                self.state.status = Status::GameEnding {
                    winner,
                    ticks_left: ticks_left.saturating_sub(1),
                };
            }
        }

        self.refresh_overlay();
        self.tick += 1;
        event
    }

    /// Render everything from scratch
    pub fn draw<W: Write>(&mut self, ctx: &mut RenderContext<W>) {
        ctx.clear();
        self.ui.draw(ctx);
        for paddle in self.paddles.iter_mut() {
            paddle.draw(ctx);
        }
        self.ball.draw(ctx);
        self.full_draw_pending = false;
    }

    /// Render only what changed since the last tick, or everything when a new
    /// round has started
    pub fn redraw<W: Write>(&mut self, ctx: &mut RenderContext<W>) {
        if self.full_draw_pending {
            self.draw(ctx);
            return;
        }

        for paddle in self.paddles.iter_mut() {
            paddle.redraw(ctx);
        }
        self.ball.redraw(ctx);

        // The ball may pass through a paddle column; put back what it erased
        let (trail, current) = (self.ball.prev_cell(), self.ball.cell());
        if let Some(cell) = trail.filter(|cell| Some(*cell) != current) {
            for paddle in self.paddles.iter() {
                paddle.repair(cell, ctx);
            }
        }
        self.ui.track_ball(trail, current);
        self.ui.redraw(ctx);
    }

    /// Ask for a full draw on the next render, e.g. after the surface resized
    pub fn request_full_draw(&mut self) {
        self.full_draw_pending = true;
    }

    pub fn needs_full_draw(&self) -> bool {
        self.full_draw_pending
    }

    pub fn scores(&self) -> [u8; 2] {
        [self.paddles[0].score, self.paddles[1].score]
    }

    pub fn paddle(&self, player: Player) -> &Paddle {
        &self.paddles[player.index()]
    }

    /// Get the winner (if the match is over)
    pub fn winner(&self) -> Option<Player> {
        match self.state.status {
            Status::GameEnding { winner, .. } => Some(winner),
            _ => None,
        }
    }

    /// True once the game-over banner has been shown for its full pause
    pub fn is_finished(&self) -> bool {
        matches!(self.state.status, Status::GameEnding { ticks_left: 0, .. })
    }

    /// Banner text for the current status
    pub fn status_line(&self) -> String {
        match self.state.status {
            Status::Serving(server) => format!(
                "{} to serve  |  stretches {} : {}",
                server.label(),
                self.paddles[0].stretches_left(),
                self.paddles[1].stretches_left()
            ),
            Status::Playing => format!(
                "stretches {} : {}",
                self.paddles[0].stretches_left(),
                self.paddles[1].stretches_left()
            ),
            Status::RoundEnding { scorer, .. } => format!("{} scores!", scorer.label()),
            Status::GameEnding { winner, .. } => format!("GAME OVER - {} wins!", winner.label()),
        }
    }

    fn apply_inputs(&mut self, inputs: &Inputs) {
        let speed = self.config.paddle_speed;
        for paddle in self.paddles.iter_mut() {
            let input = inputs.get(paddle.player);
            paddle.vy = input.velocity.clamp(-1.0, 1.0) * speed;
            if input.stretch {
                paddle.request_stretch();
            }
        }
    }

    /// Update both paddles, then keep them on the court
    fn update_paddles(&mut self) {
        let band = self.court.play_band();
        for paddle in self.paddles.iter_mut() {
            paddle.update();
            paddle.clamp_to(band);
        }
    }

    /// Step paddles and ball without any movement
    fn hold_entities(&mut self) {
        for paddle in self.paddles.iter_mut() {
            paddle.update();
        }
        self.ball.hold();
    }

    fn resolve_collisions(&mut self) -> Option<Event> {
        let band = self.court.play_band();
        if Physics::bounce_off_walls(&mut self.ball, band) {
            tracing::trace!("Ball hit wall at y={:.2}", self.ball.y);
        }

        for paddle in self.paddles.iter() {
            if paddle.collides_with_ball(&self.ball) {
                Physics::bounce_off_paddle(
                    &mut self.ball,
                    paddle,
                    self.config.ball_bounce_randomness,
                    &mut self.rng,
                );
                tracing::debug!(
                    "Ball hit {} paddle: vx={:.2} vy={:.2}",
                    paddle.player.label(),
                    self.ball.vx,
                    self.ball.vy
                );
                // A returned ball is never a miss, even on the edge column
                return Some(Event::PaddleHit(paddle.player));
            }
        }

        Physics::check_scoring(&self.ball, &self.court).map(|scorer| self.handle_score(scorer))
    }

    /// Handle a scoring event
    fn handle_score(&mut self, scorer: Player) -> Event {
        let paddle = &mut self.paddles[scorer.index()];
        paddle.score = paddle.score.saturating_add(1);
        let score = self.scores();
        tracing::info!("{} scores ({}-{})", scorer.label(), score[0], score[1]);

        self.state.status = Status::RoundEnding {
            scorer,
            ticks_left: self.round_pause_ticks,
        };
        Event::Scored { scorer, score }
    }

    fn winner_by_score(&self) -> Option<Player> {
        let target = self.state.score_needed_to_win;
        Player::BOTH
            .into_iter()
            .find(|p| self.paddles[p.index()].score >= target)
    }

    /// Reset every entity (scores are kept) and hand the serve to `server`
    fn start_round(&mut self, server: Player) {
        tracing::info!("Starting round, {} to serve", server.label());
        self.ball.reset(&self.court, &mut self.rng);
        for paddle in self.paddles.iter_mut() {
            paddle.reset(&self.court, &mut self.rng);
        }
        self.ui.reset(&self.court, &mut self.rng);
        Physics::pin_to_paddle(&mut self.ball, &self.paddles[server.index()]);
        self.ball.hold();

        self.state.player_serving = server;
        self.state.status = Status::Serving(server);
        self.refresh_overlay();
        self.full_draw_pending = true;
    }

    fn refresh_overlay(&mut self) {
        let scores = self.scores();
        let banner = self.status_line();
        self.ui.set_scores(scores);
        self.ui.set_banner(banner);
        self.ui.update();
    }
}
