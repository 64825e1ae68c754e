//! Collision resolution: walls, paddles and the scoring edges.

use rand::Rng;

use crate::ball::Ball;
use crate::config::{Court, PlayBand};
use crate::paddle::Paddle;
use crate::types::Player;

/// Physics calculations for game simulation
pub struct Physics;

impl Physics {
    /// Bounce the ball off the top/bottom of the playable band.
    /// Returns true if it bounced.
    pub fn bounce_off_walls(ball: &mut Ball, band: PlayBand) -> bool {
        if ball.y <= band.y_min {
            ball.y = band.y_min;
            ball.vy = -ball.vy;
            true
        } else if ball.y >= band.y_max {
            ball.y = band.y_max;
            ball.vy = -ball.vy;
            true
        } else {
            false
        }
    }

    /// Send the ball back from a paddle.
    ///
    /// The new direction depends only on which paddle was hit, so a ball that
    /// is still inside the hitbox next tick cannot be flipped back into it.
    /// The further from the paddle centre the hit, the steeper the angle.
    pub fn bounce_off_paddle<R: Rng + ?Sized>(
        ball: &mut Ball,
        paddle: &Paddle,
        randomness: f32,
        rng: &mut R,
    ) {
        let low = ball.init_speed * (1.0 - randomness);
        let high = ball.init_speed * (1.0 + randomness);
        let speed = if high > low {
            rng.gen_range(low..=high)
        } else {
            ball.init_speed
        };
        ball.vx = paddle.player.serve_direction() * speed;

        let y_delta = (ball.y + 0.5) - paddle.center_y();
        ball.vy = 2.0 * y_delta * ball.init_speed / paddle.height as f32;
    }

    /// Check if ball reached a scoring edge; returns the player who scored
    pub fn check_scoring(ball: &Ball, court: &Court) -> Option<Player> {
        if ball.x <= 0.0 {
            Some(Player::Two)
        } else if ball.x >= court.right_edge() {
            Some(Player::One)
        } else {
            None
        }
    }

    /// Glue the ball to the face of the serving paddle
    pub fn pin_to_paddle(ball: &mut Ball, paddle: &Paddle) {
        ball.stop();
        ball.place(paddle.face_x(), paddle.center_y() - 0.5);
    }

    /// Launch a pinned ball toward the server's opponent
    pub fn serve(ball: &mut Ball, server: Player) {
        ball.vx = server.serve_direction() * ball.init_speed;
        ball.vy = 0.0;
    }
}
