//! The ball entity.

use rand::Rng;
use std::io::Write;

use crate::config::Court;
use crate::render::{palette, RenderContext, Renderable};
use crate::types::Cell;

/// Ball state. Position is continuous; the cell it is drawn in is the floor
/// of its coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub prev_x: f32,
    pub prev_y: f32,
    /// Serve speed, and the mean horizontal speed after a paddle bounce
    pub init_speed: f32,
}

impl Ball {
    pub fn new(init_speed: f32) -> Self {
        Ball {
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            prev_x: 0.0,
            prev_y: 0.0,
            init_speed,
        }
    }

    /// Place the ball without leaving a trail to erase
    pub fn place(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }

    pub fn stop(&mut self) {
        self.vx = 0.0;
        self.vy = 0.0;
    }

    /// Step without moving, so the next redraw sees no change
    pub fn hold(&mut self) {
        self.prev_x = self.x;
        self.prev_y = self.y;
    }

    pub fn cell(&self) -> Option<Cell> {
        Cell::containing(self.x, self.y)
    }

    pub fn prev_cell(&self) -> Option<Cell> {
        Cell::containing(self.prev_x, self.prev_y)
    }
}

impl Renderable for Ball {
    fn update(&mut self) {
        self.prev_x = self.x;
        self.prev_y = self.y;
        self.x += self.vx;
        self.y += self.vy;
    }

    fn reset<R: Rng + ?Sized>(&mut self, court: &Court, rng: &mut R) {
        let (cx, cy) = court.center();
        self.x = cx;
        self.y = cy;
        self.prev_x = cx;
        self.prev_y = cy;

        // Straight left or straight right
        let direction = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        self.vx = direction * self.init_speed;
        self.vy = 0.0;
    }

    fn draw<W: Write>(&mut self, ctx: &mut RenderContext<W>) {
        if let Some(cell) = self.cell() {
            ctx.draw_square(cell, palette::BALL);
        }
    }

    fn redraw<W: Write>(&mut self, ctx: &mut RenderContext<W>) {
        let (prev, current) = (self.prev_cell(), self.cell());
        if prev == current {
            return;
        }
        if let Some(cell) = prev {
            ctx.erase_square(cell);
        }
        if let Some(cell) = current {
            ctx.draw_square(cell, palette::BALL);
        }
    }
}
