//! Core types shared by the entities, the state machine and the input ports.

/// Tick counter type
pub type Tick = u32;

/// Player/paddle identity
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Player {
    /// Left paddle
    One,
    /// Right paddle
    Two,
}

impl Player {
    pub const BOTH: [Player; 2] = [Player::One, Player::Two];

    /// Get the opponent
    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Horizontal direction a ball leaving this player's paddle travels in
    pub fn serve_direction(self) -> f32 {
        match self {
            Player::One => 1.0,
            Player::Two => -1.0,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Player::One => "Player 1",
            Player::Two => "Player 2",
        }
    }
}

/// Match status
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Status {
    /// Ball glued to the serving player's paddle until they serve
    Serving(Player),
    /// Active gameplay
    Playing,
    /// Someone scored (scorer, ticks until the next round)
    RoundEnding { scorer: Player, ticks_left: u32 },
    /// Match over (winner, ticks the banner stays up)
    GameEnding { winner: Player, ticks_left: u32 },
}

/// A terminal cell coordinate
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub x: u16,
    pub y: u16,
}

impl Cell {
    pub fn new(x: u16, y: u16) -> Self {
        Cell { x, y }
    }

    /// Cell containing a continuous position, if it is on a non-negative cell
    pub fn containing(x: f32, y: f32) -> Option<Cell> {
        let (cx, cy) = (x.floor(), y.floor());
        if cx < 0.0 || cy < 0.0 || cx > u16::MAX as f32 || cy > u16::MAX as f32 {
            return None;
        }
        Some(Cell::new(cx as u16, cy as u16))
    }
}

/// Discrete command produced by an event source such as a keyboard
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    MoveUp(Player),
    MoveDown(Player),
    Serve(Player),
    Stretch(Player),
}

impl Command {
    pub fn player(self) -> Player {
        match self {
            Command::MoveUp(p) | Command::MoveDown(p) | Command::Serve(p) | Command::Stretch(p) => p,
        }
    }
}

/// One player's input for one tick
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct PlayerInput {
    /// Normalised vertical velocity in [-1, 1], negative is up
    pub velocity: f32,
    /// Serve requested this tick
    pub serve: bool,
    /// Stretch requested this tick
    pub stretch: bool,
}

impl PlayerInput {
    pub fn idle() -> Self {
        PlayerInput::default()
    }

    pub fn moving(velocity: f32) -> Self {
        PlayerInput {
            velocity: velocity.clamp(-1.0, 1.0),
            ..PlayerInput::default()
        }
    }

    pub fn serving() -> Self {
        PlayerInput {
            serve: true,
            ..PlayerInput::default()
        }
    }

    pub fn stretching() -> Self {
        PlayerInput {
            stretch: true,
            ..PlayerInput::default()
        }
    }
}

/// Inputs for both players on one tick
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Inputs {
    pub one: PlayerInput,
    pub two: PlayerInput,
}

impl Inputs {
    pub fn new(one: PlayerInput, two: PlayerInput) -> Self {
        Inputs { one, two }
    }

    pub fn idle() -> Self {
        Inputs::default()
    }

    pub fn get(&self, player: Player) -> PlayerInput {
        match player {
            Player::One => self.one,
            Player::Two => self.two,
        }
    }

    pub fn get_mut(&mut self, player: Player) -> &mut PlayerInput {
        match player {
            Player::One => &mut self.one,
            Player::Two => &mut self.two,
        }
    }

    /// Inputs carrying a single discrete command, everything else idle
    pub fn from_command(command: Command) -> Self {
        let mut inputs = Inputs::idle();
        let slot = inputs.get_mut(command.player());
        *slot = match command {
            Command::MoveUp(_) => PlayerInput::moving(-1.0),
            Command::MoveDown(_) => PlayerInput::moving(1.0),
            Command::Serve(_) => PlayerInput::serving(),
            Command::Stretch(_) => PlayerInput::stretching(),
        };
        inputs
    }
}

/// Things that happened during a tick
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Event {
    Served(Player),
    PaddleHit(Player),
    Scored { scorer: Player, score: [u8; 2] },
    RoundStarted { server: Player },
    MatchWon(Player),
}
