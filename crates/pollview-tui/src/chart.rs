// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use pollview_app::{ChartSpec, Rgb};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::widgets::Widget;
use std::f64::consts::TAU;

const RING_SYMBOL: &str = "█";

/// Terminal cells are roughly twice as tall as they are wide.
const CELL_ASPECT: f64 = 2.0;

pub struct Doughnut<'a> {
    spec: &'a ChartSpec,
}

impl<'a> Doughnut<'a> {
    pub fn new(spec: &'a ChartSpec) -> Self {
        Self { spec }
    }
}

impl Widget for Doughnut<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let arcs = self.spec.arcs();
        if arcs.is_empty() {
            return;
        }

        let center_x = f64::from(area.width) / 2.0;
        let center_y = f64::from(area.height) / 2.0;
        let outer = center_y.min(center_x / CELL_ASPECT);
        let inner = outer * self.spec.cutout.clamp(0.0, 1.0);

        for row in 0..area.height {
            for col in 0..area.width {
                let dx = (f64::from(col) + 0.5 - center_x) / CELL_ASPECT;
                let dy = f64::from(row) + 0.5 - center_y;
                let radius = dx.hypot(dy);
                if radius > outer || radius < inner {
                    continue;
                }

                // Clockwise from twelve o'clock.
                let turn = (dx.atan2(-dy) / TAU).rem_euclid(1.0);
                let Some(arc) = arcs
                    .iter()
                    .find(|arc| turn >= arc.start && turn < arc.end)
                    .or_else(|| arcs.last().filter(|arc| turn >= arc.start))
                else {
                    continue;
                };

                if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                    cell.set_symbol(RING_SYMBOL).set_fg(to_color(arc.color));
                }
            }
        }
    }
}

pub fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}
