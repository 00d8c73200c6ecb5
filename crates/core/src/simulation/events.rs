//! Inbound host events
//!
//! The host reports structural and block-state changes as [`ThermalEvent`]s.
//! They queue up between ticks and are applied in submission order at the
//! start of [`crate::ThermalWorld::tick`], so host callbacks never touch cell
//! state mid-pass.

use std::collections::VecDeque;

use crate::environment::GridTransform;
use crate::grid::{BlockDescriptor, BlockId, DoorStatus, GridId};

/// Something changed on the host side
#[derive(Debug, Clone, PartialEq)]
pub enum ThermalEvent {
    /// A block was placed on a grid
    BlockAdded { grid: GridId, block: BlockDescriptor },
    /// A block left a grid
    BlockRemoved { grid: GridId, block: BlockId },
    /// Blocks removed from `from` now live on `into`
    GridSplit { from: GridId, into: GridId },
    /// `absorbed` was merged into `into` and will be closed
    GridMerged { absorbed: GridId, into: GridId },
    /// A rotor, piston or landing gear attached to (or released) a block of
    /// another grid
    MechanicalAttachmentChanged {
        grid: GridId,
        block: BlockId,
        attached: Option<(GridId, BlockId)>,
    },
    DoorStateChanged {
        grid: GridId,
        block: BlockId,
        status: DoorStatus,
    },
    /// Electrical output in megawatts
    PowerOutputChanged {
        grid: GridId,
        block: BlockId,
        megawatts: f32,
    },
    /// Electrical draw in megawatts
    PowerInputChanged {
        grid: GridId,
        block: BlockId,
        megawatts: f32,
    },
    /// Thruster output; powers are in megawatts
    ThrustChanged {
        grid: GridId,
        block: BlockId,
        working: bool,
        current_thrust: f32,
        max_thrust: f32,
        min_power: f32,
        max_power: f32,
    },
    /// The grid moved or rotated in the world
    GridMoved { grid: GridId, transform: GridTransform },
}

impl ThermalEvent {
    /// Grid the event is addressed to
    pub fn grid(&self) -> GridId {
        match self {
            ThermalEvent::BlockAdded { grid, .. }
            | ThermalEvent::BlockRemoved { grid, .. }
            | ThermalEvent::MechanicalAttachmentChanged { grid, .. }
            | ThermalEvent::DoorStateChanged { grid, .. }
            | ThermalEvent::PowerOutputChanged { grid, .. }
            | ThermalEvent::PowerInputChanged { grid, .. }
            | ThermalEvent::ThrustChanged { grid, .. }
            | ThermalEvent::GridMoved { grid, .. } => *grid,
            ThermalEvent::GridSplit { into, .. } | ThermalEvent::GridMerged { into, .. } => *into,
        }
    }
}

/// Pending events plus a bounded record of what was applied
#[derive(Debug)]
pub struct EventQueue {
    /// Events waiting for the next tick
    pending: Vec<ThermalEvent>,
    /// Events applied during the current tick
    applied_this_frame: Vec<ThermalEvent>,
    /// Most recent applied events, oldest first
    history: VecDeque<ThermalEvent>,
    max_history: usize,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventQueue {
    /// Queue keeping at most `max_history` applied events
    pub fn new(max_history: usize) -> Self {
        Self {
            pending: Vec::with_capacity(32),
            applied_this_frame: Vec::with_capacity(32),
            history: VecDeque::with_capacity(max_history.min(1024)),
            max_history,
        }
    }

    pub fn submit(&mut self, event: ThermalEvent) {
        self.pending.push(event);
    }

    pub fn pending(&self) -> &[ThermalEvent] {
        &self.pending
    }

    pub fn applied_this_frame(&self) -> &[ThermalEvent] {
        &self.applied_this_frame
    }

    pub fn history(&self) -> impl Iterator<Item = &ThermalEvent> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Clear the per-tick record
    pub fn begin_frame(&mut self) {
        self.applied_this_frame.clear();
    }

    /// Take every pending event in submission order
    pub fn take_pending(&mut self) -> Vec<ThermalEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn mark_applied(&mut self, event: ThermalEvent) {
        self.applied_this_frame.push(event.clone());
        self.history.push_back(event);
        while self.history.len() > self.max_history {
            self.history.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.applied_this_frame.clear();
        self.history.clear();
    }
}
