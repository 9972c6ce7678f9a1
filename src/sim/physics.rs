//! Deterministic vehicle dynamics, terrain contact, and landing check.
//!
//! One [`Simulation`] owns everything a single run needs: the lander state,
//! the PID controller, the action cursor, and the clock. Outcomes are pure
//! functions of (genome, gravity, terrain), which is what lets the search
//! evaluate candidates in parallel.

use crate::schema::{Action, ActionKind, Genome, LandingZone, Terrain};

use super::pid::PidController;

/// Fixed integration time step in seconds.
pub const DT: f64 = 1.0 / 60.0;
/// World width; horizontal positions are clamped to it.
pub const SCREEN_WIDTH: f64 = 800.0;
/// Top boundary; reaching it counts as leaving the atmosphere.
pub const SCREEN_HEIGHT: f64 = 600.0;
/// Lowest gravity the search samples; thrust is normalized against it.
pub const MIN_GRAVITY: f64 = 1.2;
/// Per-step vertical velocity increment per unit of gravity.
pub const GRAVITY_SCALE: f64 = 0.04;
/// Thrust acceleration at `MIN_GRAVITY`; scales linearly with gravity.
pub const THRUST_POWER: f64 = 0.3;
/// Per-step velocity damping on both axes.
pub const VELOCITY_DAMPING: f64 = 0.99;
/// Half the hull height; contact is checked at the hull bottom.
pub const LANDER_HALF_HEIGHT: f64 = 10.0;
/// Touchdowns at or above this vertical speed are crashes.
pub const SAFE_LANDING_SPEED: f64 = 2.0;

/// 2D vector for position and velocity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

/// Kinematic state of the vehicle during one run.
///
/// Created fresh per simulation, mutated every step, discarded once the
/// fitness has been read off.
#[derive(Debug, Clone)]
pub struct LanderState {
    pub pos: Vec2,
    pub vel: Vec2,
    pub rotation: f64,
    pub angular_velocity: f64,
    pub crashed: bool,
    pub landed: bool,
    pub escaped: bool,
    pub main_thruster: bool,
    /// Vertical speed at ground contact, captured before contact
    /// resolution zeroes the velocity; crash scoring reads this.
    pub touchdown_speed: f64,
}

impl LanderState {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            pos: Vec2 { x, y },
            vel: Vec2::default(),
            rotation: 0.0,
            angular_velocity: 0.0,
            crashed: false,
            landed: false,
            escaped: false,
            main_thruster: false,
            touchdown_speed: 0.0,
        }
    }
}

/// Terminal classification of a run. Exactly one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Soft touchdown inside the landing zone.
    Landed,
    /// Ground contact too fast or outside the zone.
    Crashed,
    /// Reached the top boundary; also sets the `crashed` flag.
    Escaped,
    /// Step cap exhausted without contact.
    TimedOut,
}

/// One vehicle run under a single gravity value.
pub struct Simulation<'a> {
    terrain: &'a Terrain,
    actions: &'a [Action],
    zone: LandingZone,
    gravity: f64,
    target_y: f64,
    max_steps: u32,
    pub lander: LanderState,
    pid: PidController,
    action_index: usize,
    action_elapsed: f64,
    clock: f64,
    steps: u32,
    thruster_steps: u32,
}

impl<'a> Simulation<'a> {
    pub fn new(
        genome: &'a Genome,
        terrain: &'a Terrain,
        gravity: f64,
        spawn: (f64, f64),
        max_steps: u32,
    ) -> Self {
        let zone = terrain.landing_zone();
        Self {
            terrain,
            actions: &genome.actions,
            zone,
            gravity,
            // Altitude of the lander's center when resting on the zone.
            target_y: zone.y + LANDER_HALF_HEIGHT,
            max_steps,
            lander: LanderState::new(spawn.0, spawn.1),
            pid: PidController::new(genome.kp, genome.ki, genome.kd),
            action_index: 0,
            action_elapsed: 0.0,
            clock: 0.0,
            steps: 0,
            thruster_steps: 0,
        }
    }

    /// Setpoint the PID descends toward.
    pub fn target_y(&self) -> f64 {
        self.target_y
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Number of steps the thruster fired; the fuel-economy term.
    pub fn thruster_steps(&self) -> u32 {
        self.thruster_steps
    }

    /// Whether the run has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.lander.crashed
            || self.lander.landed
            || self.lander.escaped
            || self.steps >= self.max_steps
    }

    /// Terminal outcome. `Escaped` wins over the `crashed` flag it sets.
    pub fn outcome(&self) -> Outcome {
        if self.lander.escaped {
            Outcome::Escaped
        } else if self.lander.crashed {
            Outcome::Crashed
        } else if self.lander.landed {
            Outcome::Landed
        } else {
            Outcome::TimedOut
        }
    }

    /// Run to termination.
    pub fn run(&mut self) -> Outcome {
        while !self.is_terminal() {
            self.step();
        }
        self.outcome()
    }

    /// Advance one fixed time step.
    pub fn step(&mut self) {
        // Action cursor. Heavier gravity compresses the schedule.
        if let Some(action) = self.actions.get(self.action_index) {
            let scaled = action.duration / self.gravity.sqrt();
            self.action_elapsed += DT;
            if self.action_elapsed >= scaled {
                self.action_index += 1;
                self.action_elapsed = 0.0;
            }
        }
        self.clock += DT;

        // The thruster can only fire during a Thrust action, and only when
        // the PID output clears the threshold.
        let thrusting = match self.actions.get(self.action_index) {
            Some(action) if action.kind == ActionKind::Thrust => {
                let output = self.pid.compute(
                    self.target_y,
                    self.lander.pos.y,
                    self.lander.vel.y,
                    self.clock,
                );
                output > self.pid.threshold()
            }
            _ => false,
        };
        self.lander.main_thruster = thrusting;
        if thrusting {
            self.thruster_steps += 1;
        }

        self.lander.vel.y -= self.gravity * GRAVITY_SCALE;
        if thrusting {
            let thrust = THRUST_POWER * self.gravity / MIN_GRAVITY;
            self.lander.vel.x += self.lander.rotation.sin() * thrust;
            self.lander.vel.y += self.lander.rotation.cos() * thrust;
        }

        // Velocities are held in per-step units.
        self.lander.pos.x += self.lander.vel.x;
        self.lander.pos.y += self.lander.vel.y;
        self.lander.rotation += self.lander.angular_velocity * DT;
        self.lander.vel.x *= VELOCITY_DAMPING;
        self.lander.vel.y *= VELOCITY_DAMPING;

        self.steps += 1;

        // Leaving the atmosphere is terminal on its own.
        if self.lander.pos.y >= SCREEN_HEIGHT {
            self.lander.pos.y = SCREEN_HEIGHT;
            self.lander.vel.y = 0.0;
            self.lander.crashed = true;
            self.lander.escaped = true;
            return;
        }
        self.lander.pos.x = self.lander.pos.x.clamp(0.0, SCREEN_WIDTH);
        self.lander.pos.y = self.lander.pos.y.max(0.0);

        self.check_terrain_contact();
    }

    /// Resolve ground contact against the segment under the lander.
    fn check_terrain_contact(&mut self) {
        for pair in self.terrain.points().windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if self.lander.pos.x < a.x || self.lander.pos.x > b.x {
                continue;
            }
            let t = (self.lander.pos.x - a.x) / (b.x - a.x);
            let ground = a.y + (b.y - a.y) * t;
            if self.lander.pos.y - LANDER_HALF_HEIGHT <= ground {
                let speed = self.lander.vel.y.abs();
                self.lander.touchdown_speed = speed;
                self.lander.vel.y = 0.0;
                self.lander.pos.y = ground + LANDER_HALF_HEIGHT;
                if speed < SAFE_LANDING_SPEED && self.zone.contains(self.lander.pos.x) {
                    self.lander.landed = true;
                } else {
                    self.lander.crashed = true;
                }
            }
            // First segment containing x wins.
            break;
        }
    }
}
