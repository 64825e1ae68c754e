//! Pong core game engine - fixed-tick simulation, match state machine and
//! dirty-cell renderer for character-cell surfaces

pub mod ball;
pub mod config;
pub mod game;
pub mod input;
pub mod overlay;
pub mod paddle;
pub mod physics;
pub mod render;
pub mod types;

pub use ball::Ball;
pub use config::{Config, ConfigError, Court, PlayBand};
pub use game::{Game, MatchState};
pub use input::{
    normalize_reading, Button, CommandInput, InputPort, Mailbox, SensorBus, SensorCells,
    SensorInput, SensorPoller,
};
pub use overlay::UserInterface;
pub use paddle::Paddle;
pub use physics::Physics;
pub use render::{RenderContext, Renderable};
pub use types::*;

#[cfg(test)]
mod match_scenarios {
    use super::*;

    fn config() -> Config {
        Config {
            seed: Some(42),
            ..Config::default()
        }
    }

    fn serve(player: Player) -> Inputs {
        let mut inputs = Inputs::idle();
        inputs.get_mut(player).serve = true;
        inputs
    }

    #[test]
    fn test_paddles_never_leave_court() {
        let mut game = Game::new(config());
        let band = game.court.play_band();
        let pushes = [1.0, 1.0, 1.0, -1.0, 0.3, -0.7];

        for i in 0..400 {
            let v = pushes[i % pushes.len()];
            game.step(&Inputs::new(
                PlayerInput::moving(v),
                PlayerInput::moving(-v),
            ));
            for paddle in &game.paddles {
                assert!(paddle.y >= band.y_min);
                assert!(paddle.y <= band.y_max - paddle.height as f32);
            }
        }
    }

    #[test]
    fn test_unreturned_serve_scores_once() {
        let mut game = Game::new(config());
        game.step(&serve(Player::One));

        // Player two runs to the top wall, out of the ball's row
        let away = Inputs::new(PlayerInput::idle(), PlayerInput::moving(-1.0));
        let mut scored = 0;
        for _ in 0..400 {
            if let Some(Event::Scored { scorer, score }) = game.step(&away) {
                scored += 1;
                assert_eq!(scorer, Player::One);
                assert_eq!(score, [1, 0]);
            }
            if !matches!(game.state.status, Status::Playing) {
                break;
            }
        }

        assert_eq!(scored, 1);
        assert_eq!(game.scores(), [1, 0]);
        assert!(matches!(game.state.status, Status::RoundEnding { .. }));
    }

    #[test]
    fn test_no_scoring_outside_play() {
        let mut game = Game::new(config());
        for _ in 0..200 {
            game.step(&Inputs::new(PlayerInput::moving(1.0), PlayerInput::idle()));
        }
        assert_eq!(game.scores(), [0, 0]);
        assert_eq!(game.state.status, Status::Serving(Player::One));
    }

    #[test]
    fn test_scores_frozen_after_match_won() {
        let mut game = Game::new(config());
        game.paddles[1].score = game.config.score_needed_to_win;
        game.state.status = Status::RoundEnding {
            scorer: Player::Two,
            ticks_left: 5,
        };

        assert_eq!(game.step(&Inputs::idle()), Some(Event::MatchWon(Player::Two)));
        let frozen = game.scores();
        for _ in 0..200 {
            assert_eq!(game.step(&serve(Player::One)), None);
            assert_eq!(game.scores(), frozen);
            assert_eq!(game.winner(), Some(Player::Two));
        }
        assert!(game.is_finished());
    }

    #[test]
    fn test_full_match_ends_with_winner() {
        let config = Config {
            score_needed_to_win: 2,
            round_pause_secs: 0.1,
            game_over_pause_secs: 0.1,
            ..config()
        };
        let mut game = Game::new(config);

        // Nobody defends: each server's ball is eventually missed
        let mut ticks = 0;
        while !game.is_finished() && ticks < 20_000 {
            let server = game.state.player_serving;
            let mut inputs = serve(server);
            inputs.get_mut(server.opponent()).velocity = -1.0;
            game.step(&inputs);
            ticks += 1;
        }

        assert!(game.is_finished());
        let winner = game.winner().unwrap();
        assert_eq!(game.scores()[winner.index()], 2);
    }

    #[test]
    fn test_render_frame_to_buffer() {
        let mut game = Game::new(config());
        let mut ctx = RenderContext::new(Vec::new(), 80, 20);
        game.redraw(&mut ctx);
        assert!(ctx.flush());

        let frame = String::from_utf8_lossy(ctx.get_ref()).into_owned();
        assert!(frame.contains("Player 1 to serve"));
    }
}
