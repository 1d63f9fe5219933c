//! Occupant slot and the messages it publishes.

use std::fmt;

use crate::occupancy::tracked_object::TrackId;
use crate::occupancy::zone_classifier::ClassifiedDetection;

/// Who holds a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Occupant {
    #[default]
    Empty,
    /// Held by a live tracker identity
    Present(TrackId),
    /// Occupant left; frames counted so far toward clearing the slot
    Leaving(u32),
}

/// One fixed-index entry of the occupancy table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub occupant: Occupant,
    pub inside: bool,
    pub moving: bool,
    /// Normalized horizontal position, 0..100
    pub position: f32,
}

impl Default for Slot {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Slot {
    pub const EMPTY: Slot = Slot {
        occupant: Occupant::Empty,
        inside: false,
        moving: true,
        position: 0.0,
    };

    pub(crate) fn from_detection(detection: &ClassifiedDetection) -> Self {
        Self {
            occupant: Occupant::Present(detection.id),
            inside: detection.inside,
            moving: detection.moving,
            position: detection.position,
        }
    }

    /// Signed identity: 0 when empty, the tracker id when present, minus the
    /// countdown while leaving.
    pub fn identity(&self) -> i64 {
        match self.occupant {
            Occupant::Empty => 0,
            Occupant::Present(id) => i64::try_from(id).unwrap_or(i64::MAX),
            Occupant::Leaving(frames) => -i64::from(frames),
        }
    }

    pub fn present_id(&self) -> Option<TrackId> {
        match self.occupant {
            Occupant::Present(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.occupant == Occupant::Empty
    }

    /// Start the countdown after a real departure. The position is kept.
    pub(crate) fn begin_leaving(&mut self) {
        self.occupant = Occupant::Leaving(1);
        self.inside = false;
        self.moving = true;
    }

    /// Snapshot of the slot as it persists through an occlusion.
    pub(crate) fn as_detection(&self) -> Option<ClassifiedDetection> {
        self.present_id().map(|id| ClassifiedDetection {
            id,
            inside: self.inside,
            moving: true,
            position: self.position,
        })
    }

    /// The three messages publishing this slot, addressed to `index`.
    pub fn messages(&self, index: usize) -> [SlotMessage; 3] {
        [
            SlotMessage {
                slot: index,
                field: SlotField::Inside,
                value: SlotValue::Int(i32::from(self.inside)),
            },
            SlotMessage {
                slot: index,
                field: SlotField::Moving,
                value: SlotValue::Bool(self.moving),
            },
            SlotMessage {
                slot: index,
                field: SlotField::Position,
                value: SlotValue::Float(self.position),
            },
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotField {
    Inside,
    Moving,
    Position,
}

impl SlotField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotField::Inside => "in",
            SlotField::Moving => "move",
            SlotField::Position => "pos",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlotValue {
    Int(i32),
    Bool(bool),
    Float(f32),
}

impl fmt::Display for SlotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotValue::Int(v) => write!(f, "{v}"),
            SlotValue::Bool(v) => write!(f, "{v}"),
            SlotValue::Float(v) => write!(f, "{v}"),
        }
    }
}

/// One scalar update for one slot field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotMessage {
    pub slot: usize,
    pub field: SlotField,
    pub value: SlotValue,
}

impl SlotMessage {
    /// Transport path, e.g. `/detect/3/pos`.
    pub fn address(&self) -> String {
        format!("/detect/{}/{}", self.slot, self.field.as_str())
    }
}
