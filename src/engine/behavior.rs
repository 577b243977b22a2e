use crate::maze::Maze;
use crate::rng::Rng;
use crate::types::{Direction, GhostMode, Vec2};

/// Picks the next direction for one ghost, or `None` when it is boxed
/// in on all four sides. Reversing is excluded while any other exit is
/// open.
pub fn choose_ghost_direction(
    maze: &Maze,
    pos: Vec2,
    current_dir: Direction,
    mode: GhostMode,
    target: Vec2,
    pursue_bias: f32,
    rng: &mut Rng,
) -> Option<Direction> {
    let mut open: Vec<Direction> = Direction::ALL
        .into_iter()
        .filter(|dir| maze.resolve_move(pos, *dir) != pos)
        .collect();
    if open.is_empty() {
        return None;
    }
    let reverse = current_dir.opposite();
    if open.len() > 1 {
        open.retain(|dir| *dir != reverse);
    }

    if mode == GhostMode::Pursue && rng.chance(pursue_bias) {
        let preferred = greedy_direction(pos, target);
        if open.contains(&preferred) {
            return Some(preferred);
        }
    }
    Some(open[rng.pick_index(open.len())])
}

// Closes the larger coordinate gap. Horizontal only when |dx| is
// strictly larger; ties go vertical.
fn greedy_direction(pos: Vec2, target: Vec2) -> Direction {
    let dx = target.x - pos.x;
    let dy = target.y - pos.y;
    if dx.abs() > dy.abs() {
        if dx > 0 {
            Direction::Right
        } else {
            Direction::Left
        }
    } else if dy > 0 {
        Direction::Down
    } else {
        Direction::Up
    }
}
