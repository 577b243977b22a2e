use crate::constants::{
    DOT_SCORE, GHOST_CAPTURE_SCORE, GHOST_SPAWNS, GHOST_SPAWN_DIR, GHOST_STEP_MS, INITIAL_LEVEL,
    INITIAL_LIVES, MODE_SWITCH_MS, PURSUE_BIAS, POWER_PELLET_SCORE, RUNNER_SPAWN,
    RUNNER_SPAWN_DIR, RUNNER_STEP_MS, VULNERABLE_DURATION_MS,
};
use crate::maze::Maze;
use crate::rng::Rng;
use crate::types::{
    ControlCommand, Direction, EndReason, GameConfig, GameStatus, GhostMode, GhostView,
    RunnerView, RuntimeEvent, Snapshot, Tile, Vec2,
};

mod behavior;

use self::behavior::choose_ghost_direction;

#[derive(Clone, Debug)]
struct RunnerInternal {
    view: RunnerView,
    spawn: Vec2,
    spawn_dir: Direction,
}

#[derive(Clone, Debug)]
struct GhostInternal {
    view: GhostView,
    spawn: Vec2,
}

#[derive(Clone, Debug, Default)]
pub struct GameEngineOptions {
    pub pursue_bias_override: Option<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CollisionOutcome {
    None,
    Captured,
    Lethal,
}

#[derive(Clone, Debug)]
pub struct GameEngine {
    pub config: GameConfig,

    initial_maze: Maze,
    maze: Maze,
    rng: Rng,
    seed: u32,

    status: GameStatus,
    end_reason: Option<EndReason>,
    score: i32,
    lives: i32,
    level: i32,
    dots_remaining: i32,
    runner: RunnerInternal,
    ghosts: Vec<GhostInternal>,
    events: Vec<RuntimeEvent>,

    elapsed_ms: u64,
    tick_counter: u64,
    runner_accum: u64,
    ghost_accum: u64,
    mode_accum: u64,
    vulnerable_until: Option<u64>,
}

impl GameEngine {
    pub fn new(maze: Maze, seed: u32, options: GameEngineOptions) -> Self {
        let config = GameConfig {
            runner_step_ms: RUNNER_STEP_MS,
            ghost_step_ms: GHOST_STEP_MS,
            mode_switch_ms: MODE_SWITCH_MS,
            vulnerable_ms: VULNERABLE_DURATION_MS,
            pursue_bias: options.pursue_bias_override.unwrap_or(PURSUE_BIAS),
        };
        let dots_remaining = maze.collectible_count();
        let runner = RunnerInternal {
            view: RunnerView {
                x: RUNNER_SPAWN.x,
                y: RUNNER_SPAWN.y,
                dir: RUNNER_SPAWN_DIR,
                next_dir: RUNNER_SPAWN_DIR,
            },
            spawn: RUNNER_SPAWN,
            spawn_dir: RUNNER_SPAWN_DIR,
        };
        let ghosts = GHOST_SPAWNS
            .into_iter()
            .enumerate()
            .map(|(index, (spawn, color))| GhostInternal {
                view: GhostView {
                    id: index as u8,
                    x: spawn.x,
                    y: spawn.y,
                    dir: GHOST_SPAWN_DIR,
                    color,
                    mode: GhostMode::Patrol,
                },
                spawn,
            })
            .collect();

        Self {
            config,
            initial_maze: maze.clone(),
            maze,
            rng: Rng::new(seed),
            seed,
            status: GameStatus::Ready,
            end_reason: None,
            score: 0,
            lives: INITIAL_LIVES,
            level: INITIAL_LEVEL,
            dots_remaining,
            runner,
            ghosts,
            events: Vec::new(),
            elapsed_ms: 0,
            tick_counter: 0,
            runner_accum: 0,
            ghost_accum: 0,
            mode_accum: 0,
            vulnerable_until: None,
        }
    }

    pub fn with_default_maze(seed: u32, options: GameEngineOptions) -> Self {
        Self::new(Maze::default(), seed, options)
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_ended(&self) -> bool {
        self.status == GameStatus::Ended
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn lives(&self) -> i32 {
        self.lives
    }

    pub fn dots_remaining(&self) -> i32 {
        self.dots_remaining
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    // Intents are dropped outside RUNNING.
    pub fn set_direction(&mut self, dir: Direction) {
        if self.status != GameStatus::Running {
            return;
        }
        self.runner.view.next_dir = dir;
    }

    pub fn apply_control(&mut self, command: ControlCommand) {
        match command {
            ControlCommand::Start => {
                if matches!(self.status, GameStatus::Ready | GameStatus::Paused) {
                    self.status = GameStatus::Running;
                }
            }
            ControlCommand::Pause => {
                if self.status == GameStatus::Running {
                    self.status = GameStatus::Paused;
                }
            }
            ControlCommand::TogglePause => match self.status {
                GameStatus::Running => self.status = GameStatus::Paused,
                GameStatus::Paused => self.status = GameStatus::Running,
                GameStatus::Ready | GameStatus::Ended => {}
            },
            ControlCommand::Reset => self.reset(),
        }
    }

    pub fn reset(&mut self) {
        self.maze = self.initial_maze.clone();
        self.rng = Rng::new(self.seed);
        self.status = GameStatus::Ready;
        self.end_reason = None;
        self.score = 0;
        self.lives = INITIAL_LIVES;
        self.level = INITIAL_LEVEL;
        self.dots_remaining = self.maze.collectible_count();
        self.events.clear();
        self.elapsed_ms = 0;
        self.tick_counter = 0;
        self.runner_accum = 0;
        self.ghost_accum = 0;
        self.mode_accum = 0;
        self.vulnerable_until = None;
        self.respawn_entities();
    }

    /// Advances simulation time. A no-op unless RUNNING, so pausing
    /// freezes every accumulator and the vulnerability deadline.
    pub fn step(&mut self, dt_ms: u64) {
        if self.status != GameStatus::Running {
            return;
        }
        self.tick_counter += 1;
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);

        self.expire_vulnerability();

        self.mode_accum += dt_ms;
        while self.mode_accum >= self.config.mode_switch_ms {
            self.mode_accum -= self.config.mode_switch_ms;
            self.flip_patrol_pursue();
        }

        self.runner_accum += dt_ms;
        while self.runner_accum >= self.config.runner_step_ms && self.status == GameStatus::Running
        {
            self.runner_accum -= self.config.runner_step_ms;
            self.runner_phase();
        }

        self.ghost_accum += dt_ms;
        while self.ghost_accum >= self.config.ghost_step_ms && self.status == GameStatus::Running {
            self.ghost_accum -= self.config.ghost_step_ms;
            self.ghost_phase();
        }

        self.check_game_over();
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let snapshot = Snapshot {
            tick: self.tick_counter,
            status: self.status,
            score: self.score,
            lives: self.lives,
            level: self.level,
            runner: self.runner.view.clone(),
            ghosts: self.ghosts.iter().map(|g| g.view.clone()).collect(),
            tiles: self.maze.to_rows(),
            dots_remaining: self.dots_remaining,
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    fn runner_phase(&mut self) {
        let pos = Vec2 {
            x: self.runner.view.x,
            y: self.runner.view.y,
        };
        let mut dest = self.maze.resolve_move(pos, self.runner.view.next_dir);
        if dest != pos {
            self.runner.view.dir = self.runner.view.next_dir;
        } else {
            dest = self.maze.resolve_move(pos, self.runner.view.dir);
        }
        if dest == pos {
            return;
        }
        self.runner.view.x = dest.x;
        self.runner.view.y = dest.y;
        self.consume_tile(dest);
        self.resolve_collision();
        self.check_game_over();
    }

    fn ghost_phase(&mut self) {
        let target = Vec2 {
            x: self.runner.view.x,
            y: self.runner.view.y,
        };
        for index in 0..self.ghosts.len() {
            if self.status != GameStatus::Running {
                break;
            }
            let (pos, dir, mode) = {
                let view = &self.ghosts[index].view;
                (Vec2 { x: view.x, y: view.y }, view.dir, view.mode)
            };
            let chosen = choose_ghost_direction(
                &self.maze,
                pos,
                dir,
                mode,
                target,
                self.config.pursue_bias,
                &mut self.rng,
            );
            let Some(next) = chosen else {
                continue;
            };
            let dest = self.maze.resolve_move(pos, next);
            let ghost = &mut self.ghosts[index];
            ghost.view.dir = next;
            ghost.view.x = dest.x;
            ghost.view.y = dest.y;
            let outcome = self.resolve_collision();
            self.check_game_over();
            if outcome == CollisionOutcome::Lethal {
                // The full-board reset ends the phase; the remaining
                // ghosts must still sit at spawn in this tick's snapshot.
                break;
            }
        }
    }

    fn consume_tile(&mut self, pos: Vec2) {
        match self.maze.tile(pos.x, pos.y) {
            Tile::Dot => {
                self.maze.set_tile(pos.x, pos.y, Tile::Empty);
                self.score += DOT_SCORE;
                self.dots_remaining -= 1;
                self.events.push(RuntimeEvent::DotEaten { x: pos.x, y: pos.y });
            }
            Tile::PowerPellet => {
                self.maze.set_tile(pos.x, pos.y, Tile::Empty);
                self.score += POWER_PELLET_SCORE;
                self.dots_remaining -= 1;
                self.events
                    .push(RuntimeEvent::PowerPelletEaten { x: pos.x, y: pos.y });
                self.trigger_vulnerability();
            }
            Tile::Wall | Tile::Empty => {}
        }
    }

    // A re-trigger replaces the pending deadline; windows never stack.
    fn trigger_vulnerability(&mut self) {
        self.vulnerable_until = Some(self.elapsed_ms + self.config.vulnerable_ms);
        for ghost in &mut self.ghosts {
            ghost.view.mode = GhostMode::Vulnerable;
        }
    }

    fn expire_vulnerability(&mut self) {
        let Some(deadline) = self.vulnerable_until else {
            return;
        };
        if self.elapsed_ms < deadline {
            return;
        }
        self.vulnerable_until = None;
        for ghost in &mut self.ghosts {
            if ghost.view.mode == GhostMode::Vulnerable {
                ghost.view.mode = GhostMode::Patrol;
            }
        }
    }

    fn flip_patrol_pursue(&mut self) {
        for ghost in &mut self.ghosts {
            ghost.view.mode = match ghost.view.mode {
                GhostMode::Patrol => GhostMode::Pursue,
                GhostMode::Pursue => GhostMode::Patrol,
                GhostMode::Vulnerable => GhostMode::Vulnerable,
            };
        }
    }

    // Resolves at most one contact: the lowest-id ghost sharing the
    // runner's cell. Vulnerable contact banks the ghost; anything else
    // costs a life and sends every entity home.
    fn resolve_collision(&mut self) -> CollisionOutcome {
        let (rx, ry) = (self.runner.view.x, self.runner.view.y);
        let Some(index) = self
            .ghosts
            .iter()
            .position(|g| g.view.x == rx && g.view.y == ry)
        else {
            return CollisionOutcome::None;
        };
        if self.ghosts[index].view.mode == GhostMode::Vulnerable {
            let ghost_id = self.ghosts[index].view.id;
            self.score += GHOST_CAPTURE_SCORE;
            let ghost = &mut self.ghosts[index];
            ghost.view.x = ghost.spawn.x;
            ghost.view.y = ghost.spawn.y;
            ghost.view.dir = GHOST_SPAWN_DIR;
            ghost.view.mode = GhostMode::Patrol;
            self.events.push(RuntimeEvent::GhostCaptured { ghost_id });
            CollisionOutcome::Captured
        } else {
            self.lives -= 1;
            self.events.push(RuntimeEvent::RunnerCaught {
                lives_left: self.lives,
            });
            self.respawn_entities();
            CollisionOutcome::Lethal
        }
    }

    fn respawn_entities(&mut self) {
        self.runner.view.x = self.runner.spawn.x;
        self.runner.view.y = self.runner.spawn.y;
        self.runner.view.dir = self.runner.spawn_dir;
        self.runner.view.next_dir = self.runner.spawn_dir;
        for ghost in &mut self.ghosts {
            ghost.view.x = ghost.spawn.x;
            ghost.view.y = ghost.spawn.y;
            ghost.view.dir = GHOST_SPAWN_DIR;
            ghost.view.mode = GhostMode::Patrol;
        }
    }

    fn check_game_over(&mut self) {
        if self.status == GameStatus::Ended {
            return;
        }
        if self.lives <= 0 {
            self.status = GameStatus::Ended;
            self.end_reason = Some(EndReason::Loss);
            self.events.push(RuntimeEvent::GameLost);
        } else if self.dots_remaining <= 0 {
            self.status = GameStatus::Ended;
            self.end_reason = Some(EndReason::Win);
            self.events.push(RuntimeEvent::GameWon);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TICK_MS;

    fn test_engine(seed: u32) -> GameEngine {
        GameEngine::with_default_maze(seed, GameEngineOptions::default())
    }

    fn recount(engine: &mut GameEngine) {
        engine.dots_remaining = engine.maze.collectible_count();
    }

    fn runner_pos(engine: &GameEngine) -> (i32, i32) {
        (engine.runner.view.x, engine.runner.view.y)
    }

    #[test]
    fn control_transitions_follow_the_session_lifecycle() {
        let mut engine = test_engine(1);
        assert_eq!(engine.status(), GameStatus::Ready);
        engine.step(1_000);
        assert_eq!(engine.elapsed_ms, 0);

        engine.apply_control(ControlCommand::Pause);
        assert_eq!(engine.status(), GameStatus::Ready);
        engine.apply_control(ControlCommand::Start);
        assert_eq!(engine.status(), GameStatus::Running);
        engine.apply_control(ControlCommand::TogglePause);
        assert_eq!(engine.status(), GameStatus::Paused);
        engine.step(1_000);
        assert_eq!(engine.elapsed_ms, 0);
        engine.apply_control(ControlCommand::TogglePause);
        assert_eq!(engine.status(), GameStatus::Running);
        engine.step(50);
        assert_eq!(engine.elapsed_ms, 50);

        engine.apply_control(ControlCommand::Reset);
        assert_eq!(engine.status(), GameStatus::Ready);
        assert_eq!(engine.elapsed_ms, 0);
        assert_eq!(engine.score(), 0);
    }

    #[test]
    fn ended_sessions_only_leave_via_reset() {
        let mut engine = test_engine(2);
        engine.status = GameStatus::Running;
        engine.dots_remaining = 0;
        engine.check_game_over();
        assert_eq!(engine.status(), GameStatus::Ended);
        assert_eq!(engine.end_reason(), Some(EndReason::Win));

        engine.apply_control(ControlCommand::Start);
        assert_eq!(engine.status(), GameStatus::Ended);
        engine.apply_control(ControlCommand::TogglePause);
        assert_eq!(engine.status(), GameStatus::Ended);

        engine.apply_control(ControlCommand::Reset);
        assert_eq!(engine.status(), GameStatus::Ready);
        assert_eq!(engine.end_reason(), None);
        engine.apply_control(ControlCommand::Start);
        assert_eq!(engine.status(), GameStatus::Running);
    }

    #[test]
    fn direction_intents_are_dropped_outside_running() {
        let mut engine = test_engine(3);
        engine.set_direction(Direction::Up);
        assert_eq!(engine.runner.view.next_dir, RUNNER_SPAWN_DIR);
        engine.apply_control(ControlCommand::Start);
        engine.set_direction(Direction::Up);
        assert_eq!(engine.runner.view.next_dir, Direction::Up);
    }

    #[test]
    fn buffered_turn_consumes_the_dot_above_spawn() {
        let mut engine = test_engine(7);
        // Box the spawn in so the only exit is the dot above it.
        engine.maze.set_tile(13, 25, Tile::Dot);
        engine.maze.set_tile(12, 26, Tile::Wall);
        engine.maze.set_tile(14, 26, Tile::Wall);
        recount(&mut engine);
        let before = engine.dots_remaining;

        engine.apply_control(ControlCommand::Start);
        engine.set_direction(Direction::Up);
        engine.step(RUNNER_STEP_MS);

        assert_eq!(runner_pos(&engine), (13, 25));
        assert_eq!(engine.score(), DOT_SCORE);
        assert_eq!(engine.dots_remaining, before - 1);
        assert_eq!(engine.maze.tile(13, 25), Tile::Empty);
        let events = engine.build_snapshot(true).events;
        assert!(events
            .iter()
            .any(|e| matches!(e, RuntimeEvent::DotEaten { x: 13, y: 25 })));
    }

    #[test]
    fn emptied_cell_scores_nothing_on_revisit() {
        let mut engine = test_engine(7);
        engine.maze.set_tile(13, 25, Tile::Dot);
        engine.maze.set_tile(12, 26, Tile::Wall);
        engine.maze.set_tile(14, 26, Tile::Wall);
        recount(&mut engine);

        engine.apply_control(ControlCommand::Start);
        engine.set_direction(Direction::Up);
        engine.step(RUNNER_STEP_MS);
        engine.set_direction(Direction::Down);
        engine.step(RUNNER_STEP_MS);
        engine.set_direction(Direction::Up);
        engine.step(RUNNER_STEP_MS);

        assert_eq!(runner_pos(&engine), (13, 25));
        assert_eq!(engine.score(), DOT_SCORE);
    }

    #[test]
    fn power_pellet_flips_every_ghost_and_arms_the_deadline() {
        let mut engine = test_engine(9);
        engine.maze.set_tile(12, 26, Tile::PowerPellet);
        recount(&mut engine);

        engine.apply_control(ControlCommand::Start);
        engine.set_direction(Direction::Left);
        engine.step(RUNNER_STEP_MS);

        assert_eq!(engine.score(), POWER_PELLET_SCORE);
        assert!(engine
            .ghosts
            .iter()
            .all(|g| g.view.mode == GhostMode::Vulnerable));
        assert_eq!(
            engine.vulnerable_until,
            Some(RUNNER_STEP_MS + VULNERABLE_DURATION_MS)
        );
    }

    #[test]
    fn revulnerability_replaces_the_expiry_deadline() {
        let mut engine = test_engine(4);
        engine.status = GameStatus::Running;

        engine.trigger_vulnerability();
        assert_eq!(engine.vulnerable_until, Some(VULNERABLE_DURATION_MS));

        engine.elapsed_ms = 4_000;
        engine.trigger_vulnerability();
        assert_eq!(
            engine.vulnerable_until,
            Some(4_000 + VULNERABLE_DURATION_MS)
        );

        // Past the first deadline but inside the replacement window.
        engine.elapsed_ms = VULNERABLE_DURATION_MS + 500;
        engine.expire_vulnerability();
        assert!(engine
            .ghosts
            .iter()
            .all(|g| g.view.mode == GhostMode::Vulnerable));

        engine.elapsed_ms = 4_000 + VULNERABLE_DURATION_MS;
        engine.expire_vulnerability();
        assert!(engine.ghosts.iter().all(|g| g.view.mode == GhostMode::Patrol));
        assert_eq!(engine.vulnerable_until, None);
    }

    #[test]
    fn mode_cadence_flips_only_nonvulnerable_ghosts() {
        let mut engine = test_engine(5);
        engine.ghosts[0].view.mode = GhostMode::Vulnerable;

        engine.flip_patrol_pursue();
        assert_eq!(engine.ghosts[0].view.mode, GhostMode::Vulnerable);
        assert!(engine.ghosts[1..]
            .iter()
            .all(|g| g.view.mode == GhostMode::Pursue));

        engine.flip_patrol_pursue();
        assert!(engine.ghosts[1..]
            .iter()
            .all(|g| g.view.mode == GhostMode::Patrol));
    }

    #[test]
    fn vulnerable_contact_banks_the_ghost_and_keeps_the_runner() {
        let mut engine = test_engine(6);
        engine.status = GameStatus::Running;
        let start = runner_pos(&engine);
        engine.ghosts[0].view.x = start.0;
        engine.ghosts[0].view.y = start.1;
        engine.ghosts[0].view.mode = GhostMode::Vulnerable;

        engine.resolve_collision();

        assert_eq!(engine.score(), GHOST_CAPTURE_SCORE);
        assert_eq!(engine.lives(), INITIAL_LIVES);
        assert_eq!(runner_pos(&engine), start);
        let ghost = &engine.ghosts[0];
        assert_eq!((ghost.view.x, ghost.view.y), (ghost.spawn.x, ghost.spawn.y));
        assert_eq!(ghost.view.dir, GHOST_SPAWN_DIR);
        assert_eq!(ghost.view.mode, GhostMode::Patrol);
        let events = engine.build_snapshot(true).events;
        assert!(events
            .iter()
            .any(|e| matches!(e, RuntimeEvent::GhostCaptured { ghost_id: 0 })));
    }

    #[test]
    fn lethal_contact_costs_a_life_and_respawns_everyone() {
        let mut engine = test_engine(8);
        engine.status = GameStatus::Running;
        let start = runner_pos(&engine);
        engine.ghosts[2].view.x = start.0;
        engine.ghosts[2].view.y = start.1;
        // A displaced vulnerable ghost elsewhere also goes home.
        engine.ghosts[1].view.x = 1;
        engine.ghosts[1].view.y = 1;
        engine.ghosts[1].view.mode = GhostMode::Vulnerable;

        engine.resolve_collision();

        assert_eq!(engine.lives(), INITIAL_LIVES - 1);
        assert_eq!(engine.score(), 0);
        assert_eq!(runner_pos(&engine), (RUNNER_SPAWN.x, RUNNER_SPAWN.y));
        assert_eq!(engine.runner.view.dir, RUNNER_SPAWN_DIR);
        for ghost in &engine.ghosts {
            assert_eq!((ghost.view.x, ghost.view.y), (ghost.spawn.x, ghost.spawn.y));
            assert_eq!(ghost.view.dir, GHOST_SPAWN_DIR);
            assert_eq!(ghost.view.mode, GhostMode::Patrol);
        }
        let events = engine.build_snapshot(true).events;
        assert!(events
            .iter()
            .any(|e| matches!(e, RuntimeEvent::RunnerCaught { lives_left: 2 })));
    }

    #[test]
    fn lowest_id_ghost_wins_the_collision() {
        let mut engine = test_engine(10);
        engine.status = GameStatus::Running;
        let start = runner_pos(&engine);
        engine.ghosts[1].view.x = start.0;
        engine.ghosts[1].view.y = start.1;
        engine.ghosts[1].view.mode = GhostMode::Vulnerable;
        engine.ghosts[3].view.x = start.0;
        engine.ghosts[3].view.y = start.1;

        engine.resolve_collision();

        // The vulnerable ghost at the lower id resolved; the other
        // contact waits for the next invocation.
        assert_eq!(engine.score(), GHOST_CAPTURE_SCORE);
        assert_eq!(engine.lives(), INITIAL_LIVES);
        assert_eq!(
            (engine.ghosts[3].view.x, engine.ghosts[3].view.y),
            start
        );
    }

    #[test]
    fn loss_takes_precedence_over_win() {
        let mut engine = test_engine(11);
        engine.status = GameStatus::Running;
        engine.lives = 0;
        engine.dots_remaining = 0;
        engine.check_game_over();
        assert_eq!(engine.status(), GameStatus::Ended);
        assert_eq!(engine.end_reason(), Some(EndReason::Loss));
    }

    #[test]
    fn clearing_the_grid_wins_once() {
        let mut engine = test_engine(12);
        engine.status = GameStatus::Running;
        engine.dots_remaining = 0;
        engine.check_game_over();
        engine.check_game_over();
        assert_eq!(engine.end_reason(), Some(EndReason::Win));
        let events = engine.build_snapshot(true).events;
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, RuntimeEvent::GameWon))
                .count(),
            1
        );
    }

    #[test]
    fn forced_pursuit_closes_manhattan_distance_in_a_corridor() {
        let mut engine = GameEngine::with_default_maze(
            13,
            GameEngineOptions {
                pursue_bias_override: Some(1.0),
            },
        );
        engine.apply_control(ControlCommand::Start);
        // Park the runner in the bottom corridor facing a wall so it
        // never moves, and leave one pursuing ghost further along it.
        engine.runner.view.x = 6;
        engine.runner.view.y = 29;
        engine.runner.view.dir = Direction::Down;
        engine.runner.view.next_dir = Direction::Down;
        engine.ghosts.truncate(1);
        engine.ghosts[0].view.x = 21;
        engine.ghosts[0].view.y = 29;
        engine.ghosts[0].view.dir = Direction::Left;
        engine.ghosts[0].view.mode = GhostMode::Pursue;

        let mut last = 15;
        for _ in 0..10 {
            engine.step(GHOST_STEP_MS);
            let view = &engine.ghosts[0].view;
            let dist = (view.x - engine.runner.view.x).abs()
                + (view.y - engine.runner.view.y).abs();
            assert!(dist <= last, "distance grew from {} to {}", last, dist);
            last = dist;
        }
        assert!(last < 15);
    }

    #[test]
    fn ghost_stepping_onto_a_stationary_runner_resolves_the_contact() {
        let mut engine = GameEngine::with_default_maze(
            14,
            GameEngineOptions {
                pursue_bias_override: Some(1.0),
            },
        );
        engine.apply_control(ControlCommand::Start);
        engine.runner.view.x = 6;
        engine.runner.view.y = 29;
        engine.runner.view.dir = Direction::Down;
        engine.runner.view.next_dir = Direction::Down;
        engine.ghosts.truncate(1);
        engine.ghosts[0].view.x = 8;
        engine.ghosts[0].view.y = 29;
        engine.ghosts[0].view.dir = Direction::Left;
        engine.ghosts[0].view.mode = GhostMode::Pursue;

        engine.step(GHOST_STEP_MS);
        assert_eq!(engine.lives(), INITIAL_LIVES);
        engine.step(GHOST_STEP_MS);
        assert_eq!(engine.lives(), INITIAL_LIVES - 1);
        assert_eq!(runner_pos(&engine), (RUNNER_SPAWN.x, RUNNER_SPAWN.y));
        assert_eq!(
            (engine.ghosts[0].view.x, engine.ghosts[0].view.y),
            (engine.ghosts[0].spawn.x, engine.ghosts[0].spawn.y)
        );
    }

    #[test]
    fn full_board_reset_freezes_remaining_ghosts_for_the_tick() {
        let mut engine = GameEngine::with_default_maze(
            17,
            GameEngineOptions {
                pursue_bias_override: Some(1.0),
            },
        );
        engine.apply_control(ControlCommand::Start);
        // Runner parked against a wall; ghost 0 one cell away in
        // pursuit, the other three untouched at their spawns.
        engine.runner.view.x = 6;
        engine.runner.view.y = 29;
        engine.runner.view.dir = Direction::Down;
        engine.runner.view.next_dir = Direction::Down;
        engine.ghosts[0].view.x = 7;
        engine.ghosts[0].view.y = 29;
        engine.ghosts[0].view.dir = Direction::Left;
        engine.ghosts[0].view.mode = GhostMode::Pursue;

        engine.step(GHOST_STEP_MS);

        // Ghost 0's move costs the life; the phase ends there, so the
        // tick's snapshot shows every ghost exactly at spawn.
        assert_eq!(engine.lives(), INITIAL_LIVES - 1);
        assert_eq!(runner_pos(&engine), (RUNNER_SPAWN.x, RUNNER_SPAWN.y));
        for ghost in &engine.ghosts {
            assert_eq!((ghost.view.x, ghost.view.y), (ghost.spawn.x, ghost.spawn.y));
            assert_eq!(ghost.view.dir, GHOST_SPAWN_DIR);
            assert_eq!(ghost.view.mode, GhostMode::Patrol);
        }
    }

    #[test]
    fn reset_restores_grid_score_and_timers() {
        let mut engine = test_engine(15);
        let initial_dots = engine.dots_remaining;
        engine.apply_control(ControlCommand::Start);
        engine.set_direction(Direction::Left);
        engine.step(RUNNER_STEP_MS);
        assert_eq!(engine.score(), DOT_SCORE);
        assert_eq!(engine.maze.tile(12, 26), Tile::Empty);
        engine.trigger_vulnerability();

        engine.apply_control(ControlCommand::Reset);

        assert_eq!(engine.status(), GameStatus::Ready);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.lives(), INITIAL_LIVES);
        assert_eq!(engine.dots_remaining, initial_dots);
        assert_eq!(engine.maze.tile(12, 26), Tile::Dot);
        assert_eq!(engine.vulnerable_until, None);
        assert_eq!(runner_pos(&engine), (RUNNER_SPAWN.x, RUNNER_SPAWN.y));
        assert!(engine.ghosts.iter().all(|g| g.view.mode == GhostMode::Patrol));
    }

    #[test]
    fn snapshot_drains_events_only_when_asked() {
        let mut engine = test_engine(16);
        engine.events.push(RuntimeEvent::DotEaten { x: 1, y: 1 });

        let peek = engine.build_snapshot(false);
        assert!(peek.events.is_empty());
        assert_eq!(engine.events.len(), 1);

        let drained = engine.build_snapshot(true);
        assert_eq!(drained.events.len(), 1);
        assert!(engine.build_snapshot(true).events.is_empty());
    }

    #[test]
    fn score_and_ledger_stay_consistent_over_a_long_run() {
        let mut engine = test_engine(1_234);
        engine.apply_control(ControlCommand::Start);
        let dirs = [
            Direction::Left,
            Direction::Up,
            Direction::Right,
            Direction::Down,
        ];
        let mut last_score = 0;
        let mut last_dots = engine.dots_remaining;
        for tick in 0..600u64 {
            if tick % 25 == 0 {
                engine.set_direction(dirs[(tick / 25) as usize % dirs.len()]);
            }
            engine.step(TICK_MS);
            assert!(engine.score() >= last_score);
            assert!(engine.dots_remaining <= last_dots);
            assert_eq!(engine.dots_remaining, engine.maze.collectible_count());
            assert!((0..=INITIAL_LIVES).contains(&engine.lives()));
            last_score = engine.score();
            last_dots = engine.dots_remaining;
            if engine.is_ended() {
                break;
            }
        }
    }

    #[test]
    fn same_seed_and_script_replay_identically() {
        let script: [(u64, Direction); 4] = [
            (10, Direction::Up),
            (30, Direction::Left),
            (60, Direction::Down),
            (90, Direction::Right),
        ];
        let run = |seed: u32| -> Vec<String> {
            let mut engine = test_engine(seed);
            engine.apply_control(ControlCommand::Start);
            let mut out = Vec::new();
            for tick in 0..200u64 {
                for (at, dir) in script {
                    if tick == at {
                        engine.set_direction(dir);
                    }
                }
                engine.step(TICK_MS);
                if tick % 20 == 0 {
                    out.push(
                        serde_json::to_string(&engine.build_snapshot(false))
                            .expect("snapshot serializes"),
                    );
                }
            }
            out
        };
        assert_eq!(run(42), run(42));
    }
}
