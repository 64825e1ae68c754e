use color_eyre::eyre::WrapErr;
use crossterm::{
    event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use pong_core::{Command, Mailbox, Player};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

/// How long the capture thread waits for a key before checking the quit flag
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What a key press means to the application
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    /// A game command for one player
    Game(Command),
    /// Leave the game
    Quit,
}

/// Key bindings. Player one plays the left paddle, player two the right.
pub fn map_key(key: KeyEvent) -> Option<KeyAction> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    let command = match key.code {
        KeyCode::Char('c') | KeyCode::Char('C') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return Some(KeyAction::Quit)
        }
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Some(KeyAction::Quit),

        KeyCode::Char('w') | KeyCode::Char('W') => Command::MoveUp(Player::One),
        KeyCode::Char('s') | KeyCode::Char('S') => Command::MoveDown(Player::One),
        KeyCode::Char('d') | KeyCode::Char('D') => Command::Serve(Player::One),
        KeyCode::Char('a') | KeyCode::Char('A') => Command::Stretch(Player::One),

        KeyCode::Up => Command::MoveUp(Player::Two),
        KeyCode::Down => Command::MoveDown(Player::Two),
        KeyCode::Left => Command::Serve(Player::Two),
        KeyCode::Right => Command::Stretch(Player::Two),
        _ => return None,
    };
    Some(KeyAction::Game(command))
}

/// Keyboard capture. Puts the terminal in raw mode and reads keys on a
/// background thread until the quit flag is raised.
pub struct EventHandler {
    quit: Arc<AtomicBool>,
}

impl EventHandler {
    /// Start capturing keys into `mailbox`
    pub fn new(mailbox: Mailbox<Command>, quit: Arc<AtomicBool>) -> color_eyre::Result<Self> {
        enable_raw_mode().wrap_err("failed to enable raw mode")?;

        let actor = EventThread {
            mailbox,
            quit: Arc::clone(&quit),
        };
        thread::Builder::new()
            .name("keyboard".to_owned())
            .spawn(move || {
                if let Err(e) = actor.run() {
                    tracing::error!("Keyboard thread error: {e:#}");
                }
            })
            .wrap_err("failed to spawn keyboard thread")?;

        Ok(Self { quit })
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        self.quit.store(true, Ordering::Relaxed);
        let _ = disable_raw_mode();
    }
}

/// A thread that reads crossterm events and forwards the ones that matter
struct EventThread {
    mailbox: Mailbox<Command>,
    quit: Arc<AtomicBool>,
}

impl EventThread {
    fn run(self) -> color_eyre::Result<()> {
        while !self.quit.load(Ordering::Relaxed) {
            if !event::poll(POLL_INTERVAL).wrap_err("failed to poll for crossterm events")? {
                continue;
            }
            let event = event::read().wrap_err("failed to read crossterm event")?;

            if let CrosstermEvent::Key(key) = event {
                match map_key(key) {
                    Some(KeyAction::Game(command)) => self.mailbox.put(command),
                    Some(KeyAction::Quit) => {
                        tracing::info!("Quit requested from keyboard");
                        self.quit.store(true, Ordering::Relaxed);
                    }
                    None => {}
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_player_bindings() {
        assert_eq!(
            map_key(press(KeyCode::Char('w'))),
            Some(KeyAction::Game(Command::MoveUp(Player::One)))
        );
        assert_eq!(
            map_key(press(KeyCode::Char('S'))),
            Some(KeyAction::Game(Command::MoveDown(Player::One)))
        );
        assert_eq!(
            map_key(press(KeyCode::Down)),
            Some(KeyAction::Game(Command::MoveDown(Player::Two)))
        );
        assert_eq!(
            map_key(press(KeyCode::Left)),
            Some(KeyAction::Game(Command::Serve(Player::Two)))
        );
        assert_eq!(
            map_key(press(KeyCode::Char('a'))),
            Some(KeyAction::Game(Command::Stretch(Player::One)))
        );
        assert_eq!(map_key(press(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(map_key(press(KeyCode::Char('q'))), Some(KeyAction::Quit));
        assert_eq!(map_key(press(KeyCode::Esc)), Some(KeyAction::Quit));
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(KeyAction::Quit)
        );
        // Plain 'c' is not bound
        assert_eq!(map_key(press(KeyCode::Char('c'))), None);
    }

    #[test]
    fn test_release_is_ignored() {
        let mut key = press(KeyCode::Up);
        key.kind = KeyEventKind::Release;
        assert_eq!(map_key(key), None);
    }
}
