//! Host-side services the simulation consults once per pass

use crate::core_types::{DefinitionId, DefinitionProvider, Vec3};
use crate::grid::structure::GridId;

/// What the host knows about the celestial body nearest to a position
#[derive(Debug, Clone, PartialEq)]
pub struct BodySample {
    /// Planet definition used for ambient temperatures
    pub definition: DefinitionId,
    /// World-space center of the body
    pub center: Vec3,
    /// Mean surface radius (m)
    pub radius: f64,
    /// Normalized air density at the queried position, 0 in vacuum
    pub air_density: f32,
    /// Distance below the surface (m), negative above it
    pub depth: f64,
}

/// Ambient conditions around a structure
pub trait EnvironmentProvider {
    /// Unit vector pointing at the sun
    fn sun_direction(&self) -> Vec3;

    /// Nearest body, `None` in open space
    fn nearest_body(&self, position: &Vec3) -> Option<BodySample>;
}

/// Ray queries for solar occlusion
pub trait VisibilityService {
    /// First obstruction on the segment `from → to`, ignoring grid `ignore`
    fn first_hit(&self, from: &Vec3, to: &Vec3, ignore: GridId) -> Option<Vec3>;
}

/// Deep space with the sun along +X
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEnvironment;

impl EnvironmentProvider for NullEnvironment {
    fn sun_direction(&self) -> Vec3 {
        Vec3::x()
    }

    fn nearest_body(&self, _position: &Vec3) -> Option<BodySample> {
        None
    }
}

/// Fixed sun and body, independent of position
#[derive(Debug, Clone, PartialEq)]
pub struct StaticEnvironment {
    pub sun_direction: Vec3,
    pub body: Option<BodySample>,
}

impl EnvironmentProvider for StaticEnvironment {
    fn sun_direction(&self) -> Vec3 {
        self.sun_direction
    }

    fn nearest_body(&self, _position: &Vec3) -> Option<BodySample> {
        self.body.clone()
    }
}

/// Nothing ever blocks the sun
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOcclusion;

impl VisibilityService for NoOcclusion {
    fn first_hit(&self, _from: &Vec3, _to: &Vec3, _ignore: GridId) -> Option<Vec3> {
        None
    }
}

/// Borrowed bundle of host services handed to grids each tick
#[derive(Clone, Copy)]
pub struct HostServices<'a> {
    pub definitions: &'a dyn DefinitionProvider,
    pub environment: &'a dyn EnvironmentProvider,
    pub visibility: &'a dyn VisibilityService,
}

impl std::fmt::Debug for HostServices<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostServices").finish_non_exhaustive()
    }
}
