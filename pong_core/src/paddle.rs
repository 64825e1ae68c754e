//! Paddle entity, including the stretch power-up.

use rand::Rng;
use std::io::Write;
use std::ops::Range;

use crate::ball::Ball;
use crate::config::{Config, Court, PlayBand};
use crate::render::{palette, RenderContext, Renderable};
use crate::types::{Cell, Player};

/// Extra height granted by a stretch
pub const STRETCH_GROWTH: u16 = 2;

/// Paddle state. `y` is the top edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Paddle {
    pub player: Player,
    pub x: u16,
    pub y: f32,
    pub height: u16,
    /// One-tick impulse, cleared by `update`
    pub vy: f32,
    pub score: u8,
    pub prev_y: f32,
    pub prev_height: u16,
    base_height: u16,
    offset: u16,
    stretches_left: u8,
    stretch_ticks_left: u32,
    stretch_duration: u32,
    stretch_requested: bool,
}

impl Paddle {
    pub fn new(player: Player, config: &Config) -> Self {
        let mut paddle = Paddle {
            player,
            x: 0,
            y: 0.0,
            height: config.paddle_height,
            vy: 0.0,
            score: 0,
            prev_y: 0.0,
            prev_height: config.paddle_height,
            base_height: config.paddle_height,
            offset: config.paddle_offset,
            stretches_left: config.stretch_uses,
            stretch_ticks_left: 0,
            stretch_duration: config.secs_to_ticks(config.stretch_duration_secs),
            stretch_requested: false,
        };
        paddle.place_for_round(&config.court());
        paddle
    }

    /// Ask for a stretch; it is applied on the next `update`
    pub fn request_stretch(&mut self) {
        self.stretch_requested = true;
    }

    pub fn is_stretched(&self) -> bool {
        self.stretch_ticks_left > 0
    }

    pub fn stretches_left(&self) -> u8 {
        self.stretches_left
    }

    /// Keep the paddle inside the playable band
    pub fn clamp_to(&mut self, band: PlayBand) {
        let max_y = (band.y_max - self.height as f32).max(band.y_min);
        self.y = self.y.clamp(band.y_min, max_y);
    }

    /// Hit test with one extra cell in front of the paddle face. The ball must
    /// also be travelling toward this paddle.
    pub fn collides_with_ball(&self, ball: &Ball) -> bool {
        let x = self.x as f32;
        let (x_range, approaching) = match self.player {
            Player::One => ((x, x + 2.0), ball.vx < 0.0),
            Player::Two => ((x - 1.0, x + 1.0), ball.vx > 0.0),
        };

        approaching
            && ball.x >= x_range.0
            && ball.x <= x_range.1
            && ball.y >= self.y
            && ball.y <= self.y + self.height as f32
    }

    /// Vertical centre of the paddle
    pub fn center_y(&self) -> f32 {
        self.y + self.height as f32 / 2.0
    }

    /// Column right in front of the paddle face, where a served ball waits
    pub fn face_x(&self) -> f32 {
        match self.player {
            Player::One => self.x as f32 + 1.0,
            Player::Two => self.x as f32 - 1.0,
        }
    }

    /// Whether `cell` is currently covered by this paddle
    pub fn occupies(&self, cell: Cell) -> bool {
        cell.x == self.x && Self::rows(self.y, self.height).contains(&cell.y)
    }

    /// Paint `cell` again if it belongs to this paddle
    pub fn repair<W: Write>(&self, cell: Cell, ctx: &mut RenderContext<W>) {
        if self.occupies(cell) {
            ctx.draw_square(cell, self.colour());
        }
    }

    fn place_for_round(&mut self, court: &Court) {
        self.x = match self.player {
            Player::One => self.offset,
            Player::Two => court.width.saturating_sub(1 + self.offset),
        };
        self.height = self.base_height;
        self.y = court.height as f32 / 2.0 - self.height as f32 / 2.0;
        self.prev_y = self.y;
        self.prev_height = self.height;
        self.vy = 0.0;
    }

    fn rows(y: f32, height: u16) -> Range<u16> {
        let top = y.floor().max(0.0) as u16;
        top..top.saturating_add(height)
    }

    fn colour(&self) -> crossterm::style::Color {
        match self.player {
            Player::One => palette::PLAYER_ONE,
            Player::Two => palette::PLAYER_TWO,
        }
    }

    fn tick_stretch(&mut self) {
        if self.stretch_requested {
            self.stretch_requested = false;
            if !self.is_stretched() && self.stretches_left > 0 {
                self.stretches_left -= 1;
                self.stretch_ticks_left = self.stretch_duration;
                self.height += STRETCH_GROWTH;
                self.y -= (STRETCH_GROWTH / 2) as f32;
                tracing::debug!(
                    "{} stretched ({} left)",
                    self.player.label(),
                    self.stretches_left
                );
                return;
            }
        }

        if self.is_stretched() {
            self.stretch_ticks_left -= 1;
            if self.stretch_ticks_left == 0 {
                self.height -= STRETCH_GROWTH;
                self.y += (STRETCH_GROWTH / 2) as f32;
            }
        }
    }
}

impl Renderable for Paddle {
    fn update(&mut self) {
        self.prev_y = self.y;
        self.prev_height = self.height;
        self.tick_stretch();
        self.y += self.vy;
        self.vy = 0.0;
    }

    /// Score and remaining stretches survive; position and any active stretch do not
    fn reset<R: Rng + ?Sized>(&mut self, court: &Court, _rng: &mut R) {
        self.stretch_ticks_left = 0;
        self.stretch_requested = false;
        self.place_for_round(court);
    }

    fn draw<W: Write>(&mut self, ctx: &mut RenderContext<W>) {
        let colour = self.colour();
        for row in Self::rows(self.y, self.height) {
            ctx.draw_square(Cell::new(self.x, row), colour);
        }
    }

    fn redraw<W: Write>(&mut self, ctx: &mut RenderContext<W>) {
        let previous = Self::rows(self.prev_y, self.prev_height);
        let current = Self::rows(self.y, self.height);
        if previous == current {
            return;
        }

        for row in previous.clone().filter(|row| !current.contains(row)) {
            ctx.erase_square(Cell::new(self.x, row));
        }
        let colour = self.colour();
        for row in current.filter(|row| !previous.contains(row)) {
            ctx.draw_square(Cell::new(self.x, row), colour);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn paddle(player: Player) -> Paddle {
        Paddle::new(player, &Config::default())
    }

    #[test]
    fn test_initial_placement() {
        let p1 = paddle(Player::One);
        let p2 = paddle(Player::Two);

        assert_eq!(p1.x, 1);
        assert_eq!(p2.x, 78);
        assert_eq!(p1.y, 8.5);
        assert_eq!(p1.height, 3);
    }

    #[test]
    fn test_velocity_is_one_tick_impulse() {
        let mut p = paddle(Player::One);
        p.vy = 0.6;
        p.update();
        assert_eq!(p.prev_y, 8.5);
        assert!((p.y - 9.1).abs() < 1e-6);
        assert_eq!(p.vy, 0.0);

        p.update();
        assert!((p.y - 9.1).abs() < 1e-6);
    }

    #[test]
    fn test_clamp_keeps_paddle_in_band() {
        let band = Config::default().court().play_band();
        let mut p = paddle(Player::Two);

        for vy in [-50.0, 3.0, 80.0, -0.25, 1000.0, -1000.0] {
            p.vy = vy;
            p.update();
            p.clamp_to(band);
            assert!(p.y >= band.y_min);
            assert!(p.y <= band.y_max - p.height as f32);
        }
    }

    #[test]
    fn test_hitbox_player_one() {
        let p = paddle(Player::One);
        let mut ball = Ball::new(0.5);
        ball.vx = -0.5;

        ball.place(3.0, 9.0);
        assert!(p.collides_with_ball(&ball));
        ball.place(3.1, 9.0);
        assert!(!p.collides_with_ball(&ball));
        ball.place(1.0, 11.5);
        assert!(p.collides_with_ball(&ball));
        ball.place(1.0, 12.0);
        assert!(!p.collides_with_ball(&ball));
    }

    #[test]
    fn test_hitbox_player_two() {
        let p = paddle(Player::Two);
        let mut ball = Ball::new(0.5);
        ball.vx = 0.5;

        ball.place(77.0, 10.0);
        assert!(p.collides_with_ball(&ball));
        ball.place(79.0, 10.0);
        assert!(p.collides_with_ball(&ball));
        ball.place(76.9, 10.0);
        assert!(!p.collides_with_ball(&ball));
    }

    #[test]
    fn test_hitbox_requires_approach() {
        let p = paddle(Player::One);
        let mut ball = Ball::new(0.5);
        ball.place(2.0, 9.0);

        ball.vx = 0.5;
        assert!(!p.collides_with_ball(&ball));
        ball.vx = 0.0;
        assert!(!p.collides_with_ball(&ball));
    }

    #[test]
    fn test_stretch_grows_and_reverts() {
        let config = Config {
            stretch_duration_secs: 0.1, // 4 ticks at 32 fps
            ..Config::default()
        };
        let mut p = Paddle::new(Player::One, &config);
        p.request_stretch();
        p.update();

        assert!(p.is_stretched());
        assert_eq!(p.height, 5);
        assert_eq!(p.y, 7.5);
        assert_eq!(p.stretches_left(), 2);

        for _ in 0..4 {
            p.update();
        }
        assert!(!p.is_stretched());
        assert_eq!(p.height, 3);
        assert_eq!(p.y, 8.5);
    }

    #[test]
    fn test_stretch_budget_is_limited() {
        let config = Config {
            stretch_uses: 1,
            stretch_duration_secs: 0.0,
            ..Config::default()
        };
        let mut p = Paddle::new(Player::Two, &config);

        p.request_stretch();
        p.update();
        assert_eq!(p.height, 5);
        p.update();
        assert_eq!(p.height, 3);

        p.request_stretch();
        p.update();
        assert_eq!(p.height, 3);
        assert_eq!(p.stretches_left(), 0);
    }

    #[test]
    fn test_reset_keeps_score_and_budget() {
        let court = Config::default().court();
        let mut rng = StdRng::seed_from_u64(1);
        let mut p = paddle(Player::One);
        p.score = 3;
        p.request_stretch();
        p.update();
        p.y = 2.0;

        p.reset(&court, &mut rng);

        assert_eq!(p.score, 3);
        assert_eq!(p.stretches_left(), 2);
        assert!(!p.is_stretched());
        assert_eq!(p.height, 3);
        assert_eq!(p.y, 8.5);
    }

    #[test]
    fn test_redraw_touches_only_changed_rows() {
        let mut p = paddle(Player::One);
        p.vy = 1.0;
        p.update();

        let mut ctx = RenderContext::new(Vec::new(), 80, 20);
        p.redraw(&mut ctx);
        // rows 8..11 -> 9..12: erase row 8, draw row 11
        assert_eq!(ctx.stats().squares, 2);
    }

    #[test]
    fn test_repair_only_paints_own_cells() {
        let p = paddle(Player::One);
        let mut ctx = RenderContext::new(Vec::new(), 80, 20);

        assert!(p.occupies(Cell::new(1, 10)));
        assert!(!p.occupies(Cell::new(1, 11)));
        assert!(!p.occupies(Cell::new(2, 9)));

        p.repair(Cell::new(1, 9), &mut ctx);
        p.repair(Cell::new(2, 9), &mut ctx);
        p.repair(Cell::new(1, 7), &mut ctx);
        assert_eq!(ctx.stats().squares, 1);
    }

    #[test]
    fn test_draw_paints_every_row() {
        let mut p = paddle(Player::Two);
        let mut ctx = RenderContext::new(Vec::new(), 80, 20);
        p.draw(&mut ctx);
        assert_eq!(ctx.stats().squares, 3);
        assert_eq!(ctx.stats().colour_changes, 1);
    }
}
