//! Render pass
//!
//! [`build_frame`] turns a simulation snapshot into a flat display list.
//! The list is backend-neutral; the browser build paints it with the
//! Canvas 2D API (see `canvas`).

#[cfg(target_arch = "wasm32")]
pub mod canvas;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasPainter;

use glam::Vec2;

use crate::consts::{ARENA_PX, TILE_PX};
use crate::sim::grid::cell_origin;
use crate::sim::state::Color;
use crate::sim::{SimulationState, Tank, TileKind};

/// Palette
pub mod colors {
    use super::Color;

    const fn hex(rgb: u32) -> Color {
        [
            ((rgb >> 16) & 0xff) as f32 / 255.0,
            ((rgb >> 8) & 0xff) as f32 / 255.0,
            (rgb & 0xff) as f32 / 255.0,
            1.0,
        ]
    }

    pub const BACKGROUND: Color = hex(0x0D1117);
    pub const PLAYER: Color = hex(0xFFD700);
    pub const ENEMY: Color = hex(0xE2E2E2);
    pub const BASE: Color = hex(0xFF3131);
    pub const BASE_RUINED: Color = hex(0x333333);
    pub const BRICK: Color = hex(0xB22222);
    pub const STEEL: Color = hex(0x4A4E69);
    pub const WATER: Color = hex(0x0077B6);
    pub const BUSH: Color = hex(0x2D6A4F);
    pub const BULLET: Color = hex(0xFFFFFF);
}

/// Radius bullets are drawn with
pub const BULLET_DRAW_RADIUS: f32 = 4.0;

/// Margin between a Brick square and its cell edge (square side is 18)
const BRICK_INSET: f32 = 1.0;

/// One drawing operation in world units
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCmd {
    Clear { color: Color },
    Rect { x: f32, y: f32, w: f32, h: f32, color: Color },
    Triangle { a: Vec2, b: Vec2, c: Vec2, color: Color },
    Circle { center: Vec2, radius: f32, color: Color },
    /// Enter a frame translated to `origin` and rotated by `rotation`
    PushTransform { origin: Vec2, rotation: f32 },
    PopTransform,
    /// Global opacity for following commands
    SetAlpha(f32),
}

/// CSS color string for a palette entry
pub fn css(color: Color) -> String {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "rgba({},{},{},{})",
        channel(color[0]),
        channel(color[1]),
        channel(color[2]),
        color[3].clamp(0.0, 1.0)
    )
}

/// Build the display list for one frame
pub fn build_frame(state: &SimulationState) -> Vec<DrawCmd> {
    let mut cmds = Vec::with_capacity(
        64 + state.enemies.len() * 5 + state.particles.len() + state.bullets.len(),
    );
    cmds.push(DrawCmd::Clear {
        color: colors::BACKGROUND,
    });

    for (col, row, kind) in state.grid.cells() {
        let origin = cell_origin(col, row);
        match kind {
            TileKind::Brick => cmds.push(DrawCmd::Rect {
                x: origin.x + BRICK_INSET,
                y: origin.y + BRICK_INSET,
                w: TILE_PX - 2.0 * BRICK_INSET,
                h: TILE_PX - 2.0 * BRICK_INSET,
                color: colors::BRICK,
            }),
            TileKind::Steel => cmds.push(full_cell(origin, colors::STEEL)),
            TileKind::Water => cmds.push(full_cell(origin, colors::WATER)),
            TileKind::Base => {
                let color = if state.session.base_alive {
                    colors::BASE
                } else {
                    colors::BASE_RUINED
                };
                cmds.push(DrawCmd::Triangle {
                    a: origin + Vec2::new(0.0, TILE_PX),
                    b: origin + Vec2::new(TILE_PX / 2.0, 0.0),
                    c: origin + Vec2::new(TILE_PX, TILE_PX),
                    color,
                });
            }
            // Bush is a canopy drawn over the tanks
            TileKind::Bush | TileKind::Empty => {}
        }
    }

    push_tank(&mut cmds, &state.player, colors::PLAYER);
    for enemy in &state.enemies {
        push_tank(&mut cmds, enemy, colors::ENEMY);
    }

    for (col, row, kind) in state.grid.cells() {
        if kind == TileKind::Bush {
            cmds.push(full_cell(cell_origin(col, row), colors::BUSH));
        }
    }

    for particle in &state.particles {
        cmds.push(DrawCmd::SetAlpha(particle.life.clamp(0.0, 1.0)));
        cmds.push(DrawCmd::Rect {
            x: particle.pos.x,
            y: particle.pos.y,
            w: particle.size,
            h: particle.size,
            color: particle.color,
        });
    }
    cmds.push(DrawCmd::SetAlpha(1.0));

    for bullet in &state.bullets {
        cmds.push(DrawCmd::Circle {
            center: bullet.pos,
            radius: BULLET_DRAW_RADIUS,
            color: colors::BULLET,
        });
    }

    cmds
}

fn full_cell(origin: Vec2, color: Color) -> DrawCmd {
    DrawCmd::Rect {
        x: origin.x,
        y: origin.y,
        w: TILE_PX,
        h: TILE_PX,
        color,
    }
}

/// Hull, turret and barrel in the tank's own frame (barrel along +x)
fn push_tank(cmds: &mut Vec<DrawCmd>, tank: &Tank, color: Color) {
    cmds.push(DrawCmd::PushTransform {
        origin: tank.pos,
        rotation: tank.rotation(),
    });
    cmds.push(DrawCmd::Rect {
        x: -12.0,
        y: -10.0,
        w: 24.0,
        h: 20.0,
        color,
    });
    cmds.push(DrawCmd::Circle {
        center: Vec2::ZERO,
        radius: 9.0,
        color,
    });
    cmds.push(DrawCmd::Rect {
        x: 0.0,
        y: -4.0,
        w: 22.0,
        h: 8.0,
        color,
    });
    cmds.push(DrawCmd::PopTransform);
}

/// Canvas size in device pixels for a square arena
pub fn canvas_size() -> u32 {
    ARENA_PX as u32
}
