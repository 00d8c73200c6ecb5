//! Simulation settings
//!
//! Built once by the host, owned by [`crate::ThermalWorld`] and cloned into
//! every grid. Values read from disk go through [`ThermalSettings::sanitized`]
//! before use.

use serde::{Deserialize, Serialize};

/// Tunable parameters of the thermal simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermalSettings {
    /// Simulation passes per second (at least 1)
    pub frequency: u32,
    /// Multiplier on cells processed per second
    pub simulation_speed: f32,
    /// Solar irradiance at the top of the atmosphere (W/m²)
    pub solar_energy: f32,
    /// Apply solar heating to exposed faces
    pub enable_solar_heat: bool,
    /// Emit block damage above the critical temperature
    pub enable_damage: bool,
    /// Length of the sun occlusion probe (m)
    pub raycast_distance: f64,
    /// Floor for ambient temperature (K)
    pub vacuum_temperature: f32,
    /// Touching area assigned to cross-structure mechanical links (unit faces)
    pub mechanical_link_area: f32,
    /// Frames a removed block's temperature stays available for split inheritance
    pub removed_cache_ttl_frames: u32,
}

impl Default for ThermalSettings {
    fn default() -> Self {
        Self {
            frequency: 60,
            simulation_speed: 1.0,
            solar_energy: 1400.0,
            enable_solar_heat: true,
            enable_damage: true,
            raycast_distance: 5000.0,
            vacuum_temperature: 2.7,
            mechanical_link_area: 0.0,
            removed_cache_ttl_frames: 120,
        }
    }
}

impl ThermalSettings {
    /// Seconds of simulated time represented by one cell update
    pub fn time_scale_ratio(&self) -> f32 {
        1.0 / self.frequency.max(1) as f32
    }

    /// Copy with every field forced into its valid range
    pub fn sanitized(&self) -> Self {
        let finite_or = |v: f32, fallback: f32| if v.is_finite() { v } else { fallback };
        let defaults = Self::default();
        Self {
            frequency: self.frequency.max(1),
            simulation_speed: finite_or(self.simulation_speed, defaults.simulation_speed).max(0.0),
            solar_energy: finite_or(self.solar_energy, defaults.solar_energy).max(0.0),
            enable_solar_heat: self.enable_solar_heat,
            enable_damage: self.enable_damage,
            raycast_distance: if self.raycast_distance.is_finite() {
                self.raycast_distance.max(0.0)
            } else {
                defaults.raycast_distance
            },
            vacuum_temperature: finite_or(self.vacuum_temperature, defaults.vacuum_temperature)
                .max(0.0),
            mechanical_link_area: finite_or(self.mechanical_link_area, 0.0).max(0.0),
            removed_cache_ttl_frames: self.removed_cache_ttl_frames,
        }
    }
}
