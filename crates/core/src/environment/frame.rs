//! Per-pass environment snapshot
//!
//! Sampled once when a grid starts a new simulation pass and read by every
//! cell update during that pass.

use nalgebra::Rotation3;
use tracing::trace;

use super::provider::HostServices;
use crate::core_types::{resolve_planet_definition, Direction, PlanetDefinition, ThermalSettings, Vec3};
use crate::grid::structure::GridId;

/// World placement of a structure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridTransform {
    pub position: Vec3,
    /// Structure-local to world rotation
    pub rotation: Rotation3<f64>,
}

impl Default for GridTransform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Rotation3::identity(),
        }
    }
}

impl GridTransform {
    pub fn new(position: Vec3, rotation: Rotation3<f64>) -> Self {
        Self { position, rotation }
    }

    /// Unrotated structure at `position`
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameEnvironment {
    /// Ambient temperature seen by exposed faces (K)
    pub ambient_temperature: f32,
    /// Effective air density, 0 in vacuum
    pub air_density: f32,
    /// Atmospheric convection coefficient at unit density
    pub convection_coefficient: f32,
    /// Fraction of sunlight reaching the surface
    pub solar_decay: f32,
    pub solar_occluded: bool,
    pub underground: bool,
    /// Cosine between each local face normal and the sun, indexed by [`Direction`]
    pub face_sun_dot: [f32; 6],
}

impl FrameEnvironment {
    /// Open space with no sunlight
    pub fn vacuum(settings: &ThermalSettings) -> Self {
        Self {
            ambient_temperature: settings.vacuum_temperature,
            air_density: 0.0,
            convection_coefficient: 0.0,
            solar_decay: 1.0,
            solar_occluded: true,
            underground: false,
            face_sun_dot: [0.0; 6],
        }
    }

    /// Sample host services for a structure at `transform`
    pub fn prepare(
        services: &HostServices<'_>,
        settings: &ThermalSettings,
        grid: GridId,
        transform: &GridTransform,
    ) -> Self {
        let sun = services
            .environment
            .sun_direction()
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vec3::x);

        let mut frame = Self {
            solar_occluded: false,
            face_sun_dot: face_alignment(&transform.rotation, &sun),
            ..Self::vacuum(settings)
        };

        if let Some(body) = services.environment.nearest_body(&transform.position) {
            let planet = resolve_planet_definition(services.definitions, &body.definition);
            let density = if body.air_density.is_finite() {
                (body.air_density * planet.atmosphere_density).max(0.0)
            } else {
                0.0
            };

            frame.air_density = density;
            frame.convection_coefficient = planet.atmosphere_conductivity;
            frame.underground = body.depth > f64::from(planet.sealevel_deadzone);

            let ambient = if frame.underground {
                frame.solar_occluded = true;
                underground_ambient(&planet, body.depth, body.radius)
            } else {
                let up = (transform.position - body.center)
                    .try_normalize(f64::EPSILON)
                    .unwrap_or(sun);
                let dot = up.dot(&sun) as f32;
                planet.night_temperature
                    + (dot + 1.0) * 0.5 * (planet.day_temperature - planet.night_temperature)
            };

            frame.ambient_temperature = (ambient * density).max(settings.vacuum_temperature);
            frame.solar_decay = (1.0 - planet.solar_decay * density).clamp(0.0, 1.0);
        }

        if !frame.solar_occluded {
            let to = transform.position + sun * settings.raycast_distance;
            frame.solar_occluded = services
                .visibility
                .first_hit(&transform.position, &to, grid)
                .is_some();
        }

        trace!(
            grid = %grid,
            ambient = frame.ambient_temperature,
            density = frame.air_density,
            occluded = frame.solar_occluded,
            "prepared simulation pass"
        );
        frame
    }

    /// Solar power per unit area reaching exposed faces this pass
    pub fn solar_irradiance(&self, settings: &ThermalSettings) -> f32 {
        if !settings.enable_solar_heat || self.solar_occluded {
            0.0
        } else {
            settings.solar_energy * self.solar_decay
        }
    }

    /// Sun alignment of a local face, clamped at 0 for faces turned away
    pub fn sun_alignment(&self, face: Direction) -> f32 {
        self.face_sun_dot[face.index()].max(0.0)
    }
}

fn face_alignment(rotation: &Rotation3<f64>, sun: &Vec3) -> [f32; 6] {
    let mut dots = [0.0; 6];
    for d in Direction::ALL {
        dots[d.index()] = (rotation * d.unit()).dot(sun) as f32;
    }
    dots
}

/// Underground ambient blending toward the core with depth
fn underground_ambient(planet: &PlanetDefinition, depth: f64, radius: f64) -> f32 {
    let below = depth - f64::from(planet.sealevel_deadzone);
    let fraction = if radius > 0.0 {
        (below / radius).clamp(0.0, 1.0) as f32
    } else {
        0.0
    };
    planet.underground_temperature + (planet.core_temperature - planet.underground_temperature) * fraction
}
