//! Heat transfer physics
//!
//! Flux terms of the explicit per-cell update, all in watts:
//!
//! ```text
//! Q = Σ k·min(A, Aₙ)·touching·(Tₙ − T)      conduction
//!   − ε·σ·A_exposed·(T⁴ − T_amb⁴)            radiation
//!   + h·ρ·A_exposed·(T_amb − T)              atmospheric convection
//!   + ε·A·E_solar·intensity                  solar gain
//! ΔT = Q · (1 / (c·m)) · Δt
//! ```
//!
//! The scheme is first order. Conduction stays monotonic only while
//! `k·A·(1/(c·m))·Δt` is below 1; [`stability_coefficient`] exposes the
//! value so callers can warn.

/// Stefan-Boltzmann constant (W/(m²·K⁴))
pub const STEFAN_BOLTZMANN: f32 = 5.67e-8;

/// Watts per megawatt, the unit host power readings arrive in
pub const WATTS_PER_MEGAWATT: f32 = 1_000_000.0;

/// Conductive flux from a neighbor into the cell
#[inline]
pub fn conduction_flux(conductivity: f32, contact_area: f32, touching: f32, t_self: f32, t_neighbor: f32) -> f32 {
    conductivity * contact_area * touching * (t_neighbor - t_self)
}

/// Net radiative flux into the cell, negative while hotter than ambient
///
/// Full T⁴ form, no linearization.
#[inline]
pub fn radiative_flux(emissivity: f32, exposed_area: f32, t: f32, t_ambient: f32) -> f32 {
    -emissivity * STEFAN_BOLTZMANN * exposed_area * (t.powi(4) - t_ambient.powi(4))
}

/// Convective flux between exposed faces and the surrounding atmosphere
#[inline]
pub fn convective_flux(coefficient: f32, air_density: f32, exposed_area: f32, t: f32, t_ambient: f32) -> f32 {
    coefficient * air_density * exposed_area * (t_ambient - t)
}

/// Absorbed solar power for a summed face intensity
#[inline]
pub fn solar_flux(emissivity: f32, face_area: f32, irradiance: f32, intensity: f32) -> f32 {
    emissivity * face_area * irradiance * intensity
}

/// Temperature change produced by `flux` over one step
#[inline]
pub fn temperature_change(flux: f32, capacitance_inverse: f32, time_scale: f32) -> f32 {
    flux * capacitance_inverse * time_scale
}

/// Per-step conduction coefficient; above 1 the explicit scheme overshoots
#[inline]
pub fn stability_coefficient(conductivity: f32, area: f32, capacitance_inverse: f32, time_scale: f32) -> f32 {
    conductivity * area * capacitance_inverse * time_scale
}

/// `1 / (c·m)`, or 0 when either factor is not positive
#[inline]
pub fn capacitance_inverse(specific_heat: f32, mass: f32) -> f32 {
    let capacity = specific_heat * mass;
    if capacity > 0.0 && capacity.is_finite() {
        1.0 / capacity
    } else {
        0.0
    }
}

/// Electrical power (W) drawn by a thruster
///
/// `min_power` and `max_power` are in megawatts as the host reports them.
pub fn thrust_power(working: bool, current_thrust: f32, max_thrust: f32, min_power: f32, max_power: f32) -> f32 {
    if !working || max_thrust <= 0.0 {
        return 0.0;
    }
    ((min_power + max_power * (current_thrust / max_thrust)) * WATTS_PER_MEGAWATT).max(0.0)
}
