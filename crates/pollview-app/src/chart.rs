// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::model::PollDetail;
use crate::PollId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

pub const DOUGHNUT_PALETTE: [Rgb; 2] = [Rgb::new(0xe5, 0x4e, 0x0e), Rgb::new(0x24, 0x27, 0x8e)];
pub const DOUGHNUT_CUTOUT: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Doughnut,
}

/// Declarative description of a chart, independent of how it is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub colors: Vec<Rgb>,
    /// Fraction of the radius left empty in the middle.
    pub cutout: f64,
    pub show_legend: bool,
}

impl ChartSpec {
    /// One segment per option, valued at its percentage of `total_votes`.
    /// A zero total yields non-finite values; renderers skip those.
    pub fn doughnut_for(poll: &PollDetail) -> Self {
        let total = poll.total_votes as f64;
        Self {
            kind: ChartKind::Doughnut,
            labels: poll
                .options
                .iter()
                .map(|option| option.label.clone())
                .collect(),
            values: poll
                .options
                .iter()
                .map(|option| option.votes as f64 / total * 100.0)
                .collect(),
            colors: DOUGHNUT_PALETTE.to_vec(),
            cutout: DOUGHNUT_CUTOUT,
            show_legend: false,
        }
    }

    pub fn color_for(&self, segment: usize) -> Rgb {
        if self.colors.is_empty() {
            return DOUGHNUT_PALETTE[segment % DOUGHNUT_PALETTE.len()];
        }
        self.colors[segment % self.colors.len()]
    }

    /// Start/end fractions of the full turn for each drawable segment.
    /// Non-finite and non-positive values take no arc.
    pub fn arcs(&self) -> Vec<Arc> {
        let total: f64 = self
            .values
            .iter()
            .copied()
            .filter(|value| value.is_finite() && *value > 0.0)
            .sum();
        if total <= 0.0 {
            return Vec::new();
        }

        let mut arcs = Vec::new();
        let mut start = 0.0;
        for (segment, value) in self.values.iter().copied().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                continue;
            }
            let end = start + value / total;
            arcs.push(Arc {
                segment,
                start,
                end,
                color: self.color_for(segment),
            });
            start = end;
        }
        arcs
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arc {
    pub segment: usize,
    pub start: f64,
    pub end: f64,
    pub color: Rgb,
}

/// A chart bound to a surface. Must be handed back through
/// [`ChartSurface::release`] or replaced through [`ChartSurface::render`].
#[derive(Debug, PartialEq)]
pub struct ChartInstance {
    pub instance: u64,
    pub poll_id: PollId,
    pub revision: u64,
    pub spec: ChartSpec,
}

impl ChartInstance {
    fn destroy(self) -> u64 {
        self.instance
    }
}

/// Drawing target for the detail chart. Holds at most one live instance.
#[derive(Debug, Default, PartialEq)]
pub struct ChartSurface {
    current: Option<ChartInstance>,
    created: u64,
    destroyed: u64,
}

impl ChartSurface {
    pub fn current(&self) -> Option<&ChartInstance> {
        self.current.as_ref()
    }

    pub fn live_instances(&self) -> u64 {
        self.created - self.destroyed
    }

    pub fn created(&self) -> u64 {
        self.created
    }

    pub fn is_current(&self, revision: u64) -> bool {
        self.current
            .as_ref()
            .is_some_and(|chart| chart.revision == revision)
    }

    /// Destroys the previous instance, then builds a new one for `poll`.
    pub fn render(&mut self, poll: &PollDetail, revision: u64) -> &ChartInstance {
        self.release();
        self.created += 1;
        self.current.insert(ChartInstance {
            instance: self.created,
            poll_id: poll.id,
            revision,
            spec: ChartSpec::doughnut_for(poll),
        })
    }

    /// Returns the id of the destroyed instance, if one was live.
    pub fn release(&mut self) -> Option<u64> {
        let chart = self.current.take()?;
        self.destroyed += 1;
        Some(chart.destroy())
    }
}

impl Drop for ChartSurface {
    fn drop(&mut self) {
        self.release();
    }
}
