//! Per-direction averages of incident radiation
//!
//! Unit cells sample the source on their exposed faces every pass and
//! accumulate here; larger cells read the previous pass's averages instead of
//! sampling, which approximates self-shading from surrounding geometry.

use crate::core_types::Direction;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RadiationNode {
    pub sides: [f32; 6],
    pub side_surfaces: [u32; 6],
    pub side_averages: [f32; 6],
}

impl RadiationNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one face sample
    pub fn sample(&mut self, direction: Direction, intensity: f32) {
        let i = direction.index();
        self.sides[i] += intensity;
        self.side_surfaces[i] += 1;
    }

    /// Average of the last completed pass, 0 when nothing sampled
    pub fn average(&self, direction: Direction) -> f32 {
        self.side_averages[direction.index()]
    }

    /// Turn accumulated samples into averages and start a new pass
    pub fn update(&mut self) {
        for i in 0..6 {
            self.side_averages[i] = if self.side_surfaces[i] > 0 {
                self.sides[i] / self.side_surfaces[i] as f32
            } else {
                0.0
            };
            self.sides[i] = 0.0;
            self.side_surfaces[i] = 0;
        }
    }
}
