//! Ambient conditions around a structure
//!
//! The host implements [`EnvironmentProvider`] and [`VisibilityService`];
//! grids sample them into a [`FrameEnvironment`] at the start of each pass.

pub mod frame;
pub mod provider;

pub use frame::{FrameEnvironment, GridTransform};
pub use provider::{
    BodySample, EnvironmentProvider, HostServices, NoOcclusion, NullEnvironment, StaticEnvironment,
    VisibilityService,
};
