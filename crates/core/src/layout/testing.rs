//! Fixtures and an in-memory store for engine tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use uuid::Uuid;

use crate::chart::{
    furniture_kinds, shape_forms, Assignment, Chart, ChartView, Furniture, FurnitureShape,
};
use crate::layout::batch::TransactLimits;
use crate::layout::change_set::{ChangeKind, ChangeSet, StoreOp};
use crate::layout::desired::FurnitureDescriptor;
use crate::store::{ChartStore, StoreError};
use crate::types::{ChartId, DbId, FurnitureId};

pub const OWNER: DbId = 1;

pub fn chart_id() -> ChartId {
    Uuid::from_u128(0xC0FFEE)
}

pub fn chart(chart_id: ChartId) -> Chart {
    let now = chrono::Utc::now();
    Chart {
        chart_id,
        user_id: OWNER,
        name: "Room 101".to_string(),
        metadata: serde_json::json!({}),
        created_at: now,
        updated_at: now,
    }
}

pub fn furniture(chart_id: ChartId, capacity: i32) -> Furniture {
    furniture_with_id(chart_id, Uuid::new_v4(), capacity)
}

fn furniture_with_id(chart_id: ChartId, furniture_id: FurnitureId, capacity: i32) -> Furniture {
    Furniture {
        furniture_id,
        chart_id,
        kind: furniture_kinds::TABLE.to_string(),
        x: 100.0,
        y: 50.0,
        rotation: 0.0,
        shape: FurnitureShape {
            form: shape_forms::RECT.to_string(),
            width: 160.0,
            height: 80.0,
        },
        capacity,
        label: None,
    }
}

pub fn assignment(
    chart_id: ChartId,
    furniture_id: FurnitureId,
    seat_index: i32,
    person_id: &str,
) -> Assignment {
    Assignment {
        chart_id,
        furniture_id,
        seat_index,
        person_id: person_id.to_string(),
    }
}

/// A persisted chart with `furniture_count` four-seat tables and the given
/// `(furniture index, seat, person)` assignments.
pub fn snapshot(furniture_count: usize, seats: &[(usize, i32, &str)]) -> ChartView {
    let chart_id = chart_id();
    let furniture: Vec<Furniture> = (0..furniture_count)
        .map(|i| {
            let mut f = furniture_with_id(chart_id, Uuid::from_u128(i as u128 + 1), 4);
            f.x += 200.0 * i as f64;
            f
        })
        .collect();
    let assignments = seats
        .iter()
        .map(|&(index, seat, person)| assignment(chart_id, furniture[index].furniture_id, seat, person))
        .collect();
    ChartView {
        chart: chart(chart_id),
        furniture,
        assignments,
    }
}

/// Descriptor that reproduces persisted furniture unchanged.
pub fn descriptor_for(f: &Furniture) -> FurnitureDescriptor {
    FurnitureDescriptor {
        id: Some(f.furniture_id),
        key: None,
        kind: f.kind.clone(),
        x: f.x,
        y: f.y,
        rotation: f.rotation,
        shape: f.shape.clone(),
        capacity: f.capacity,
        label: f.label.clone(),
        seats: Vec::new(),
    }
}

/// Descriptor for a table not yet persisted, addressed by `key`.
pub fn new_descriptor(key: &str, capacity: i32) -> FurnitureDescriptor {
    FurnitureDescriptor {
        id: None,
        key: Some(key.to_string()),
        kind: furniture_kinds::TABLE.to_string(),
        x: 0.0,
        y: 0.0,
        rotation: 0.0,
        shape: FurnitureShape {
            form: shape_forms::ROUND.to_string(),
            width: 120.0,
            height: 120.0,
        },
        capacity,
        label: None,
        seats: Vec::new(),
    }
}

/// Deterministic id allocator for new furniture.
pub fn sequential_ids() -> impl FnMut() -> FurnitureId {
    let mut next = 0xA000_0000_u128;
    move || {
        next += 1;
        Uuid::from_u128(next)
    }
}

/// Apply a change-set to a snapshot without a store.
pub fn apply(current: &ChartView, set: &ChangeSet) -> ChartView {
    let mut view = current.clone();
    apply_ops(&mut view, &set.clone().into_operations()).expect("change-set applies cleanly");
    view
}

fn apply_ops(view: &mut ChartView, ops: &[StoreOp]) -> Result<(), StoreError> {
    for op in ops {
        match op {
            StoreOp::CreateFurniture(f) => {
                if view.furniture.iter().any(|x| x.furniture_id == f.furniture_id) {
                    return Err(StoreError::ConditionFailed(format!("{} exists", f.furniture_id)));
                }
                view.furniture.push(f.clone());
            }
            StoreOp::UpdateFurniture(f) => {
                let slot = view
                    .furniture
                    .iter_mut()
                    .find(|x| x.furniture_id == f.furniture_id)
                    .ok_or_else(|| StoreError::ConditionFailed(format!("{} missing", f.furniture_id)))?;
                *slot = f.clone();
            }
            StoreOp::DeleteFurniture(f) => {
                if view.assignments.iter().any(|a| a.furniture_id == f.furniture_id) {
                    return Err(StoreError::ConditionFailed(format!("{} still seated", f.furniture_id)));
                }
                let before = view.furniture.len();
                view.furniture.retain(|x| x.furniture_id != f.furniture_id);
                if view.furniture.len() == before {
                    return Err(StoreError::ConditionFailed(format!("{} missing", f.furniture_id)));
                }
            }
            StoreOp::CreateAssignment(a) => {
                if !view.furniture.iter().any(|x| x.furniture_id == a.furniture_id) {
                    return Err(StoreError::ConditionFailed(format!("{} dangling", a.seat())));
                }
                if view.assignments.iter().any(|x| x.seat() == a.seat()) {
                    return Err(StoreError::ConditionFailed(format!("{} taken", a.seat())));
                }
                view.assignments.push(a.clone());
            }
            StoreOp::UpdateAssignment(a) => {
                let slot = view
                    .assignments
                    .iter_mut()
                    .find(|x| x.seat() == a.seat())
                    .ok_or_else(|| StoreError::ConditionFailed(format!("{} missing", a.seat())))?;
                *slot = a.clone();
            }
            StoreOp::DeleteAssignment(a) => {
                let before = view.assignments.len();
                view.assignments.retain(|x| x.seat() != a.seat());
                if view.assignments.len() == before {
                    return Err(StoreError::ConditionFailed(format!("{} missing", a.seat())));
                }
            }
        }
    }
    Ok(())
}

/// Single-chart store with all-or-nothing writes and failure injection.
pub struct MemoryStore {
    view: Mutex<ChartView>,
    limits: TransactLimits,
    fail_on_call: Option<usize>,
    calls: AtomicUsize,
    batches: Mutex<Vec<Vec<ChangeKind>>>,
}

impl MemoryStore {
    pub fn new(view: ChartView, limits: TransactLimits) -> Self {
        Self {
            view: Mutex::new(view),
            limits,
            fail_on_call: None,
            calls: AtomicUsize::new(0),
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Make the `call`-th (1-based) transaction fail.
    pub fn failing_on(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    pub fn view(&self) -> ChartView {
        self.view.lock().expect("store lock").clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Kinds of every committed batch, in commit order.
    pub fn committed_batches(&self) -> Vec<Vec<ChangeKind>> {
        self.batches.lock().expect("store lock").clone()
    }
}

impl ChartStore for MemoryStore {
    async fn find_chart(&self, user_id: DbId, chart_id: ChartId) -> Result<Option<Chart>, StoreError> {
        let view = self.view.lock().expect("store lock");
        Ok((view.chart.chart_id == chart_id && view.chart.user_id == user_id)
            .then(|| view.chart.clone()))
    }

    async fn list_furniture(&self, chart_id: ChartId) -> Result<Vec<Furniture>, StoreError> {
        let view = self.view.lock().expect("store lock");
        Ok(view
            .furniture
            .iter()
            .filter(|f| f.chart_id == chart_id)
            .cloned()
            .collect())
    }

    async fn list_assignments(&self, chart_id: ChartId) -> Result<Vec<Assignment>, StoreError> {
        let view = self.view.lock().expect("store lock");
        Ok(view
            .assignments
            .iter()
            .filter(|a| a.chart_id == chart_id)
            .cloned()
            .collect())
    }

    async fn transact_write(&self, ops: &[StoreOp]) -> Result<(), StoreError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if ops.len() > self.limits.max_items {
            return Err(StoreError::Backend("too many items".into()));
        }
        if self.fail_on_call == Some(call) {
            return Err(StoreError::Unavailable("injected failure".into()));
        }

        let mut view = self.view.lock().expect("store lock");
        let mut staged = view.clone();
        apply_ops(&mut staged, ops)?;
        *view = staged;
        self.batches
            .lock()
            .expect("store lock")
            .push(ops.iter().map(StoreOp::kind).collect());
        Ok(())
    }

    fn limits(&self) -> TransactLimits {
        self.limits
    }
}
