//! Heat transfer terms and the per-block thermal cell

pub mod heat_transfer;
pub mod thermal_cell;

pub use heat_transfer::{thrust_power, STEFAN_BOLTZMANN};
pub use thermal_cell::{
    gather_conduction, BlockDamage, CellAddress, CellStep, NeighborEdge, NeighborTarget, ThermalCell,
};
