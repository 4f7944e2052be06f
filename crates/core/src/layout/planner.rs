//! Diff planner: desired layout vs. persisted snapshot.
//!
//! [`plan`] is a pure function. It performs no I/O and, given the same id
//! allocator, always yields the same [`ChangeSet`], so it is tested without a
//! store.
//!
//! Classification rules:
//!
//! - Furniture whose `id` is absent or unknown to the snapshot is created
//!   under a freshly allocated id. Known furniture is updated when any
//!   attribute differs and left alone otherwise. Persisted furniture missing
//!   from the desired layout is deleted.
//! - Assignments are keyed by `(furniture_id, seat_index)` and classified the
//!   same way. Every persisted assignment on deleted furniture is deleted,
//!   even when the desired layout still lists it.
//! - Seat claims are taken in submission order (nested `seats` in furniture
//!   order, then the top-level `assignments`). The first claim on a seat, and
//!   the first seat claimed by a person, wins; later conflicting claims are
//!   reported as [`LayoutIssue`]s and fail the plan.

use std::collections::{HashMap, HashSet};
use std::fmt::Display;

use serde::Serialize;
use uuid::Uuid;

use crate::chart::{
    is_valid_form, is_valid_kind, Assignment, Furniture, SeatKey, MAX_CAPACITY,
};
use crate::layout::change_set::{ChangeKind, ChangeSet};
use crate::layout::desired::{DesiredLayout, FurnitureDescriptor};
use crate::layout::loader::CurrentSnapshot;
use crate::types::{ChartId, FurnitureId};

/// A caller-fixable problem in a submitted layout.
///
/// Indices are positions in the submitted `furniture` array, or in submission
/// order for seat claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum LayoutIssue {
    #[error("furniture {furniture}: unknown kind '{kind}'")]
    UnknownKind { furniture: usize, kind: String },

    #[error("furniture {furniture}: unknown shape form '{form}'")]
    UnknownForm { furniture: usize, form: String },

    #[error("furniture {furniture}: capacity {capacity} must be between 0 and {max}", max = MAX_CAPACITY)]
    InvalidCapacity { furniture: usize, capacity: i32 },

    #[error("furniture {furniture}: position, rotation and size must be finite and the size positive")]
    InvalidGeometry { furniture: usize },

    #[error("furniture {furniture}: {reference} was already submitted as furniture {first}")]
    DuplicateFurniture {
        furniture: usize,
        first: usize,
        reference: String,
    },

    #[error("assignment {assignment}: no furniture id or key given")]
    MissingFurnitureRef { assignment: usize },

    #[error("assignment {assignment}: furniture {reference} is not part of this chart")]
    DanglingFurnitureRef { assignment: usize, reference: String },

    #[error("assignment {assignment}: person id is empty")]
    MissingPerson { assignment: usize },

    #[error("assignment {assignment}: seat index {seat_index} is negative")]
    NegativeSeatIndex { assignment: usize, seat_index: i32 },

    #[error("assignment {assignment}: seat {seat_index} on {reference} is already claimed by assignment {kept}")]
    SeatCollision {
        assignment: usize,
        kept: usize,
        reference: String,
        seat_index: i32,
    },

    #[error("assignment {assignment}: person {person_id} is already seated by assignment {kept}")]
    DuplicatePerson {
        assignment: usize,
        kept: usize,
        person_id: String,
    },
}

/// Seat claims that do not fit the furniture they target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum CapacityViolation {
    #[error("{reference} seats {capacity} but {requested} assignments were submitted")]
    OverCapacity {
        reference: String,
        capacity: i32,
        requested: usize,
    },

    #[error("seat {seat_index} on {reference} is outside its capacity of {capacity}")]
    SeatOutOfRange {
        reference: String,
        seat_index: i32,
        capacity: i32,
    },
}

/// Reasons a layout is rejected before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("Invalid layout: {}", join(.0))]
    Validation(Vec<LayoutIssue>),

    #[error("Seat capacity exceeded: {}", join(.0))]
    Capacity(Vec<CapacityViolation>),

    #[error("A {kind} operation is {bytes} bytes, above the {limit}-byte transaction limit")]
    PayloadTooLarge {
        kind: ChangeKind,
        bytes: usize,
        limit: usize,
    },
}

fn join<T: Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Plan the changes moving `current` to `desired`, allocating UUIDv7 ids for new furniture.
pub fn plan(current: &CurrentSnapshot, desired: &DesiredLayout) -> Result<ChangeSet, PlanError> {
    plan_with_ids(current, desired, Uuid::now_v7)
}

/// Where a seat claim points once furniture references are resolved.
enum Target {
    Live(FurnitureId),
    /// Persisted furniture the layout drops; the claim is discarded.
    Deleted,
    Dangling(String),
    Missing,
}

struct Claim<'a> {
    position: usize,
    target: Target,
    seat_index: i32,
    person_id: &'a str,
}

/// [`plan`] with an explicit id allocator for new furniture.
pub fn plan_with_ids<F>(
    current: &CurrentSnapshot,
    desired: &DesiredLayout,
    mut next_id: F,
) -> Result<ChangeSet, PlanError>
where
    F: FnMut() -> FurnitureId,
{
    let chart_id = current.chart.chart_id;
    let persisted: HashMap<FurnitureId, &Furniture> = current
        .furniture
        .iter()
        .map(|f| (f.furniture_id, f))
        .collect();

    let mut issues = Vec::new();
    let mut set = ChangeSet::default();

    // --- Furniture ---------------------------------------------------------

    let mut seen_ids: HashMap<FurnitureId, usize> = HashMap::new();
    let mut seen_keys: HashMap<&str, usize> = HashMap::new();
    let mut id_refs: HashMap<FurnitureId, FurnitureId> = HashMap::new();
    let mut key_refs: HashMap<&str, FurnitureId> = HashMap::new();
    let mut resolved: HashMap<usize, FurnitureId> = HashMap::new();
    let mut references: HashMap<FurnitureId, (String, i32)> = HashMap::new();
    let mut retained: HashSet<FurnitureId> = HashSet::new();

    for (index, descriptor) in desired.furniture.iter().enumerate() {
        check_descriptor(index, descriptor, &mut issues);

        let duplicate_of = descriptor
            .id
            .and_then(|id| seen_ids.get(&id).copied())
            .or_else(|| {
                descriptor
                    .key
                    .as_deref()
                    .and_then(|key| seen_keys.get(key).copied())
            });
        if let Some(first) = duplicate_of {
            issues.push(LayoutIssue::DuplicateFurniture {
                furniture: index,
                first,
                reference: describe(index, descriptor),
            });
            continue;
        }

        let furniture_id = match descriptor.id {
            Some(id) if persisted.contains_key(&id) => id,
            _ => next_id(),
        };
        if let Some(id) = descriptor.id {
            seen_ids.insert(id, index);
            id_refs.insert(id, furniture_id);
        }
        if let Some(key) = descriptor.key.as_deref() {
            seen_keys.insert(key, index);
            key_refs.insert(key, furniture_id);
        }
        resolved.insert(index, furniture_id);
        references.insert(
            furniture_id,
            (describe(index, descriptor), descriptor.capacity),
        );

        let next = to_furniture(chart_id, furniture_id, descriptor);
        match persisted.get(&furniture_id) {
            Some(existing) => {
                retained.insert(furniture_id);
                if !existing.same_attributes(&next) {
                    set.furniture_to_update.push(next);
                }
            }
            None => set.furniture_to_create.push(next),
        }
    }

    let mut deleted: HashSet<FurnitureId> = HashSet::new();
    for furniture in &current.furniture {
        if !retained.contains(&furniture.furniture_id) {
            deleted.insert(furniture.furniture_id);
            set.furniture_to_delete.push(furniture.clone());
        }
    }

    // --- Seat claims -------------------------------------------------------

    let mut claims: Vec<Claim<'_>> = Vec::new();
    let mut position = 0;
    for (index, descriptor) in desired.furniture.iter().enumerate() {
        // Seats on a rejected duplicate are covered by its own issue.
        let Some(&furniture_id) = resolved.get(&index) else {
            position += descriptor.seats.len();
            continue;
        };
        for seat in &descriptor.seats {
            claims.push(Claim {
                position,
                target: Target::Live(furniture_id),
                seat_index: seat.seat_index,
                person_id: &seat.person_id,
            });
            position += 1;
        }
    }
    for descriptor in &desired.assignments {
        let target = match (descriptor.furniture_id, descriptor.furniture_key.as_deref()) {
            (Some(id), _) => match id_refs.get(&id) {
                Some(&furniture_id) => Target::Live(furniture_id),
                None if deleted.contains(&id) => Target::Deleted,
                None => Target::Dangling(id.to_string()),
            },
            (None, Some(key)) => match key_refs.get(key) {
                Some(&furniture_id) => Target::Live(furniture_id),
                None => Target::Dangling(format!("key '{key}'")),
            },
            (None, None) => Target::Missing,
        };
        claims.push(Claim {
            position,
            target,
            seat_index: descriptor.seat_index,
            person_id: &descriptor.person_id,
        });
        position += 1;
    }

    let mut seat_owner: HashMap<SeatKey, usize> = HashMap::new();
    let mut person_seat: HashMap<&str, usize> = HashMap::new();
    let mut accepted: Vec<(SeatKey, &str)> = Vec::new();

    for claim in &claims {
        let furniture_id = match &claim.target {
            Target::Live(furniture_id) => *furniture_id,
            Target::Deleted => continue,
            Target::Dangling(reference) => {
                issues.push(LayoutIssue::DanglingFurnitureRef {
                    assignment: claim.position,
                    reference: reference.clone(),
                });
                continue;
            }
            Target::Missing => {
                issues.push(LayoutIssue::MissingFurnitureRef {
                    assignment: claim.position,
                });
                continue;
            }
        };
        if claim.person_id.trim().is_empty() {
            issues.push(LayoutIssue::MissingPerson {
                assignment: claim.position,
            });
            continue;
        }
        if claim.seat_index < 0 {
            issues.push(LayoutIssue::NegativeSeatIndex {
                assignment: claim.position,
                seat_index: claim.seat_index,
            });
            continue;
        }

        let seat = SeatKey {
            furniture_id,
            seat_index: claim.seat_index,
        };
        if let Some(&kept) = seat_owner.get(&seat) {
            issues.push(LayoutIssue::SeatCollision {
                assignment: claim.position,
                kept,
                reference: reference_of(&references, furniture_id),
                seat_index: claim.seat_index,
            });
            continue;
        }
        if let Some(&kept) = person_seat.get(claim.person_id) {
            issues.push(LayoutIssue::DuplicatePerson {
                assignment: claim.position,
                kept,
                person_id: claim.person_id.to_string(),
            });
            continue;
        }
        seat_owner.insert(seat, claim.position);
        person_seat.insert(claim.person_id, claim.position);
        accepted.push((seat, claim.person_id));
    }

    if !issues.is_empty() {
        return Err(PlanError::Validation(issues));
    }

    check_capacity(desired, &resolved, &references, &accepted)?;

    // --- Assignment classification ----------------------------------------

    let desired_seats: HashSet<SeatKey> = accepted.iter().map(|(seat, _)| *seat).collect();
    let persisted_seats: HashMap<SeatKey, &Assignment> = current
        .assignments
        .iter()
        .map(|a| (a.seat(), a))
        .collect();

    for assignment in &current.assignments {
        if deleted.contains(&assignment.furniture_id) || !desired_seats.contains(&assignment.seat())
        {
            set.assignments_to_delete.push(assignment.clone());
        }
    }

    for (seat, person_id) in accepted {
        let next = Assignment {
            chart_id,
            furniture_id: seat.furniture_id,
            seat_index: seat.seat_index,
            person_id: person_id.to_string(),
        };
        match persisted_seats.get(&seat) {
            Some(existing) if existing.person_id == person_id => {}
            Some(_) => set.assignments_to_update.push(next),
            None => set.assignments_to_create.push(next),
        }
    }

    Ok(set)
}

fn check_descriptor(index: usize, descriptor: &FurnitureDescriptor, issues: &mut Vec<LayoutIssue>) {
    if !is_valid_kind(&descriptor.kind) {
        issues.push(LayoutIssue::UnknownKind {
            furniture: index,
            kind: descriptor.kind.clone(),
        });
    }
    if !is_valid_form(&descriptor.shape.form) {
        issues.push(LayoutIssue::UnknownForm {
            furniture: index,
            form: descriptor.shape.form.clone(),
        });
    }
    if !(0..=MAX_CAPACITY).contains(&descriptor.capacity) {
        issues.push(LayoutIssue::InvalidCapacity {
            furniture: index,
            capacity: descriptor.capacity,
        });
    }
    let finite = [
        descriptor.x,
        descriptor.y,
        descriptor.rotation,
        descriptor.shape.width,
        descriptor.shape.height,
    ]
    .iter()
    .all(|v| v.is_finite());
    if !finite || descriptor.shape.width <= 0.0 || descriptor.shape.height <= 0.0 {
        issues.push(LayoutIssue::InvalidGeometry { furniture: index });
    }
}

fn check_capacity(
    desired: &DesiredLayout,
    resolved: &HashMap<usize, FurnitureId>,
    references: &HashMap<FurnitureId, (String, i32)>,
    accepted: &[(SeatKey, &str)],
) -> Result<(), PlanError> {
    let mut violations = Vec::new();
    let mut per_furniture: HashMap<FurnitureId, usize> = HashMap::new();

    for (seat, _) in accepted {
        *per_furniture.entry(seat.furniture_id).or_default() += 1;
        let (reference, capacity) = references
            .get(&seat.furniture_id)
            .cloned()
            .unwrap_or_else(|| (seat.furniture_id.to_string(), 0));
        if seat.seat_index >= capacity {
            violations.push(CapacityViolation::SeatOutOfRange {
                reference,
                seat_index: seat.seat_index,
                capacity,
            });
        }
    }

    for index in 0..desired.furniture.len() {
        let Some(furniture_id) = resolved.get(&index) else {
            continue;
        };
        let requested = per_furniture.get(furniture_id).copied().unwrap_or(0);
        let capacity = desired.furniture[index].capacity;
        if requested > capacity.max(0) as usize {
            violations.push(CapacityViolation::OverCapacity {
                reference: reference_of(references, *furniture_id),
                capacity,
                requested,
            });
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(PlanError::Capacity(violations))
    }
}

fn reference_of(references: &HashMap<FurnitureId, (String, i32)>, id: FurnitureId) -> String {
    references
        .get(&id)
        .map_or_else(|| id.to_string(), |(reference, _)| reference.clone())
}

/// Human-readable handle for a furniture descriptor in error messages.
fn describe(index: usize, descriptor: &FurnitureDescriptor) -> String {
    match (&descriptor.id, &descriptor.key) {
        (Some(id), _) => format!("furniture {id}"),
        (None, Some(key)) => format!("furniture key '{key}'"),
        (None, None) => format!("furniture #{index}"),
    }
}

fn to_furniture(
    chart_id: ChartId,
    furniture_id: FurnitureId,
    descriptor: &FurnitureDescriptor,
) -> Furniture {
    Furniture {
        furniture_id,
        chart_id,
        kind: descriptor.kind.clone(),
        x: descriptor.x,
        y: descriptor.y,
        rotation: descriptor.rotation,
        shape: descriptor.shape.clone(),
        capacity: descriptor.capacity,
        label: descriptor.label.clone(),
    }
}
