use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tile {
    Wall,
    Dot,
    PowerPellet,
    Empty,
}

impl Tile {
    // Maze input format: 0=wall, 1=dot, 2=power pellet, 3=empty.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Wall),
            1 => Some(Self::Dot),
            2 => Some(Self::PowerPellet),
            3 => Some(Self::Empty),
            _ => None,
        }
    }

    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '#' => Some(Self::Wall),
            '.' => Some(Self::Dot),
            'o' => Some(Self::PowerPellet),
            ' ' => Some(Self::Empty),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Self::Wall => '#',
            Self::Dot => '.',
            Self::PowerPellet => 'o',
            Self::Empty => ' ',
        }
    }

    pub fn is_collectible(self) -> bool {
        matches!(self, Self::Dot | Self::PowerPellet)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostMode {
    Patrol,
    Pursue,
    Vulnerable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Ready,
    Running,
    Paused,
    Ended,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Win,
    Loss,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlCommand {
    Start,
    Pause,
    TogglePause,
    Reset,
}

impl ControlCommand {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "start" => Some(Self::Start),
            "pause" => Some(Self::Pause),
            "toggle_pause" => Some(Self::TogglePause),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Debug, Serialize)]
pub struct RunnerView {
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    #[serde(rename = "nextDir")]
    pub next_dir: Direction,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub id: u8,
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub color: &'static str,
    pub mode: GhostMode,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameConfig {
    #[serde(rename = "runnerStepMs")]
    pub runner_step_ms: u64,
    #[serde(rename = "ghostStepMs")]
    pub ghost_step_ms: u64,
    #[serde(rename = "modeSwitchMs")]
    pub mode_switch_ms: u64,
    #[serde(rename = "vulnerableMs")]
    pub vulnerable_ms: u64,
    #[serde(rename = "pursueBias")]
    pub pursue_bias: f32,
}

// Fire-and-forget notifications; they ride in the snapshot and are
// drained on broadcast.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    DotEaten { x: i32, y: i32 },
    PowerPelletEaten { x: i32, y: i32 },
    GhostCaptured { #[serde(rename = "ghostId")] ghost_id: u8 },
    RunnerCaught { #[serde(rename = "livesLeft")] lives_left: i32 },
    GameWon,
    GameLost,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub status: GameStatus,
    pub score: i32,
    pub lives: i32,
    pub level: i32,
    pub runner: RunnerView,
    pub ghosts: Vec<GhostView>,
    pub tiles: Vec<String>,
    #[serde(rename = "dotsRemaining")]
    pub dots_remaining: i32,
    pub events: Vec<RuntimeEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_ne!(dir.opposite(), dir);
        }
    }

    #[test]
    fn parse_move_rejects_unknown_values() {
        assert_eq!(Direction::parse_move("up"), Some(Direction::Up));
        assert_eq!(Direction::parse_move("none"), None);
        assert_eq!(Direction::parse_move("UP"), None);
        assert_eq!(Direction::parse_move(""), None);
    }

    #[test]
    fn tile_codes_round_trip_through_chars() {
        for code in 0..4u8 {
            let tile = Tile::from_code(code).expect("code in range");
            assert_eq!(Tile::from_char(tile.to_char()), Some(tile));
        }
        assert_eq!(Tile::from_code(4), None);
        assert_eq!(Tile::from_char('x'), None);
    }

    #[test]
    fn control_command_parsing_is_strict() {
        assert_eq!(ControlCommand::parse("start"), Some(ControlCommand::Start));
        assert_eq!(
            ControlCommand::parse("toggle_pause"),
            Some(ControlCommand::TogglePause)
        );
        assert_eq!(ControlCommand::parse("stop"), None);
    }
}
