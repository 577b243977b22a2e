use crate::types::{Direction, Tile, Vec2};

// `#` wall, `.` dot, `o` power pellet, space empty. Row 14 is the
// wraparound tunnel.
pub const DEFAULT_LAYOUT: [&str; 31] = [
    "############################",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#o####.#####.##.#####.####o#",
    "#.####.#####.##.#####.####.#",
    "#..........................#",
    "#.####.##.########.##.####.#",
    "#.####.##.########.##.####.#",
    "#......##....##....##......#",
    "######.##### ## #####.######",
    "######.##### ## #####.######",
    "######.##          ##.######",
    "######.## ###  ### ##.######",
    "######.## #      # ##.######",
    "      .## #      # ##.      ",
    "######.## ######## ##.######",
    "######.##          ##.######",
    "######.## ######## ##.######",
    "######.## ######## ##.######",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#.####.#####.##.#####.####.#",
    "#o..##.......  .......##..o#",
    "###.##.##.########.##.##.###",
    "###.##.##.########.##.##.###",
    "#......##....##....##......#",
    "#.##########.  .##########.#",
    "#.####.#####.##.#####.####.#",
    "#.####.#####.##.#####.####.#",
    "#..........................#",
    "############################",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Maze {
    width: i32,
    height: i32,
    tiles: Vec<Vec<Tile>>,
}

impl Maze {
    // Rejects ragged grids, empty grids, and out-of-range codes.
    pub fn from_codes(codes: &[Vec<u8>]) -> Option<Self> {
        let height = codes.len();
        let width = codes.first()?.len();
        if width == 0 {
            return None;
        }
        let mut tiles = Vec::with_capacity(height);
        for row in codes {
            if row.len() != width {
                return None;
            }
            let mut out = Vec::with_capacity(width);
            for code in row {
                out.push(Tile::from_code(*code)?);
            }
            tiles.push(out);
        }
        Some(Self {
            width: width as i32,
            height: height as i32,
            tiles,
        })
    }

    pub fn from_rows(rows: &[&str]) -> Option<Self> {
        let height = rows.len();
        let width = rows.first()?.chars().count();
        if width == 0 {
            return None;
        }
        let mut tiles = Vec::with_capacity(height);
        for row in rows {
            if row.chars().count() != width {
                return None;
            }
            let mut out = Vec::with_capacity(width);
            for ch in row.chars() {
                out.push(Tile::from_char(ch)?);
            }
            tiles.push(out);
        }
        Some(Self {
            width: width as i32,
            height: height as i32,
            tiles,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn tile(&self, x: i32, y: i32) -> Tile {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return Tile::Wall;
        }
        self.tiles[y as usize][x as usize]
    }

    pub fn set_tile(&mut self, x: i32, y: i32, tile: Tile) {
        if x >= 0 && y >= 0 && x < self.width && y < self.height {
            self.tiles[y as usize][x as usize] = tile;
        }
    }

    pub fn is_traversable(&self, x: i32, y: i32) -> bool {
        if y < 0 || y >= self.height {
            return false;
        }
        self.tile(x, y) != Tile::Wall
    }

    pub fn collectible_count(&self) -> i32 {
        self.tiles
            .iter()
            .flatten()
            .filter(|tile| tile.is_collectible())
            .count() as i32
    }

    /// Destination of a one-cell move. The column wraps around
    /// horizontally (tunnel), the row does not; a destination out of
    /// vertical bounds or on a wall keeps the entity where it is.
    pub fn resolve_move(&self, pos: Vec2, dir: Direction) -> Vec2 {
        let (mut nx, ny) = match dir {
            Direction::Up => (pos.x, pos.y - 1),
            Direction::Down => (pos.x, pos.y + 1),
            Direction::Left => (pos.x - 1, pos.y),
            Direction::Right => (pos.x + 1, pos.y),
        };
        if nx < 0 {
            nx = self.width - 1;
        } else if nx >= self.width {
            nx = 0;
        }
        if !self.is_traversable(nx, ny) {
            return pos;
        }
        Vec2 { x: nx, y: ny }
    }

    pub fn to_rows(&self) -> Vec<String> {
        self.tiles
            .iter()
            .map(|row| row.iter().map(|tile| tile.to_char()).collect())
            .collect()
    }
}

impl Default for Maze {
    fn default() -> Self {
        Self::from_rows(&DEFAULT_LAYOUT).expect("bundled layout is well-formed")
    }
}
