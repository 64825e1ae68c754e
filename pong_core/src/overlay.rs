//! Static court decoration: net, score glyphs and the banner line.

use rand::Rng;
use std::collections::BTreeSet;
use std::io::Write;

use crate::config::{glyph_pixels, Config, Court, GLYPH_WIDTH};
use crate::render::{palette, RenderContext, Renderable};
use crate::types::{Cell, Player};

/// Net, scores and banner. Cell sets are cached and only rebuilt when a
/// score changes or the round resets.
#[derive(Debug, Clone)]
pub struct UserInterface {
    court: Court,
    score_offset: u16,
    score_y: u16,
    scores: [u8; 2],
    net: BTreeSet<Cell>,
    glyphs: [BTreeSet<Cell>; 2],
    banner: String,
    stale: bool,
    /// What is currently on screen
    drawn_glyphs: [BTreeSet<Cell>; 2],
    drawn_banner: Option<String>,
    /// Cell the ball just left, and the one it is in now
    ball_trail: Option<Cell>,
    ball_cell: Option<Cell>,
}

impl UserInterface {
    pub fn new(config: &Config) -> Self {
        let mut ui = UserInterface {
            court: config.court(),
            score_offset: config.score_offset,
            score_y: config.score_y,
            scores: [0, 0],
            net: BTreeSet::new(),
            glyphs: [BTreeSet::new(), BTreeSet::new()],
            banner: String::new(),
            stale: true,
            drawn_glyphs: [BTreeSet::new(), BTreeSet::new()],
            drawn_banner: None,
            ball_trail: None,
            ball_cell: None,
        };
        ui.rebuild();
        ui
    }

    pub fn set_scores(&mut self, scores: [u8; 2]) {
        if scores != self.scores {
            self.scores = scores;
            self.stale = true;
        }
    }

    pub fn set_banner(&mut self, text: impl Into<String>) {
        self.banner = text.into();
    }

    /// Tell the overlay where the ball was and is, so a net or score cell the
    /// ball just erased gets painted back.
    pub fn track_ball(&mut self, previous: Option<Cell>, current: Option<Cell>) {
        self.ball_trail = previous;
        self.ball_cell = current;
    }

    pub fn net_cells(&self) -> &BTreeSet<Cell> {
        &self.net
    }

    pub fn score_cells(&self, player: Player) -> &BTreeSet<Cell> {
        &self.glyphs[player.index()]
    }

    /// Colour of an overlay cell, if the cell belongs to the overlay
    fn colour_at(&self, cell: Cell) -> Option<crossterm::style::Color> {
        if self.net.contains(&cell) {
            Some(palette::NET)
        } else if self.glyphs.iter().any(|glyph| glyph.contains(&cell)) {
            Some(palette::SCORE)
        } else {
            None
        }
    }

    fn glyph_origin(&self, player: Player) -> (u16, u16) {
        let net_x = self.court.net_x();
        let x = match player {
            Player::One => net_x.saturating_sub(self.score_offset + GLYPH_WIDTH - 1),
            Player::Two => net_x + self.score_offset,
        };
        (x, self.score_y)
    }

    fn rebuild(&mut self) {
        let court = self.court;
        let net_x = court.net_x();
        self.net = (court.banner_rows..court.height)
            .filter(|y| (y - court.banner_rows) % 2 == 0)
            .map(|y| Cell::new(net_x, y))
            .collect();

        for player in Player::BOTH {
            let (ox, oy) = self.glyph_origin(player);
            let cells = glyph_pixels(self.scores[player.index()])
                .map(|(dx, dy)| Cell::new(ox + dx, oy + dy))
                .filter(|cell| court.contains(cell.x, cell.y))
                .collect();
            self.glyphs[player.index()] = cells;
        }
        self.stale = false;
    }

    fn draw_banner<W: Write>(&mut self, ctx: &mut RenderContext<W>) {
        let line = format!("{:^width$}", self.banner, width = self.court.width as usize);
        ctx.print_at(0, 0, &line, palette::BANNER);
        self.drawn_banner = Some(self.banner.clone());
    }
}

impl Renderable for UserInterface {
    fn update(&mut self) {
        if self.stale {
            self.rebuild();
        }
    }

    fn reset<R: Rng + ?Sized>(&mut self, court: &Court, _rng: &mut R) {
        self.court = *court;
        self.ball_trail = None;
        self.ball_cell = None;
        self.rebuild();
    }

    fn draw<W: Write>(&mut self, ctx: &mut RenderContext<W>) {
        for &cell in &self.net {
            ctx.draw_square(cell, palette::NET);
        }
        for glyph in &self.glyphs {
            for &cell in glyph {
                ctx.draw_square(cell, palette::SCORE);
            }
        }
        self.drawn_glyphs = self.glyphs.clone();
        self.draw_banner(ctx);
    }

    fn redraw<W: Write>(&mut self, ctx: &mut RenderContext<W>) {
        for player in Player::BOTH {
            let i = player.index();
            if self.glyphs[i] == self.drawn_glyphs[i] {
                continue;
            }
            for &cell in self.drawn_glyphs[i].difference(&self.glyphs[i]) {
                ctx.erase_square(cell);
            }
            for &cell in self.glyphs[i].difference(&self.drawn_glyphs[i]) {
                ctx.draw_square(cell, palette::SCORE);
            }
            self.drawn_glyphs[i] = self.glyphs[i].clone();
        }

        if let Some(trail) = self.ball_trail.take() {
            if Some(trail) != self.ball_cell {
                if let Some(colour) = self.colour_at(trail) {
                    ctx.draw_square(trail, colour);
                }
            }
        }

        if self.drawn_banner.as_deref() != Some(self.banner.as_str()) {
            self.draw_banner(ctx);
        }
    }
}
