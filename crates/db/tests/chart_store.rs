//! Integration tests for the chart repositories and `PgChartStore`.
//!
//! Exercises the persistence layer against a real database:
//! - Chart CRUD scoped by owner
//! - Batch atomicity and condition failures
//! - Referential protection of seated furniture
//! - Full layout reconciliation through the engine

use assert_matches::assert_matches;
use sqlx::PgPool;
use uuid::Uuid;
use seatplan_core::chart::{Assignment, Furniture, FurnitureShape};
use seatplan_core::layout::{
    reconcile_layout, AssignmentDescriptor, DesiredLayout, FurnitureDescriptor, SeatDescriptor,
    StoreOp, TransactLimits,
};
use seatplan_core::store::{ChartStore, StoreError};
use seatplan_db::models::chart::{CreateChart, UpdateChart};
use seatplan_db::repositories::ChartRepo;
use seatplan_db::PgChartStore;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const OWNER: i64 = 7;

async fn new_chart(pool: &PgPool, name: &str) -> Uuid {
    let input = CreateChart {
        name: name.to_string(),
        metadata: None,
    };
    ChartRepo::create(pool, OWNER, &input).await.unwrap().chart_id
}

fn table(chart_id: Uuid, capacity: i32) -> Furniture {
    Furniture {
        furniture_id: Uuid::now_v7(),
        chart_id,
        kind: "table".to_string(),
        x: 10.0,
        y: 20.0,
        rotation: 0.0,
        shape: FurnitureShape {
            form: "round".to_string(),
            width: 120.0,
            height: 120.0,
        },
        capacity,
        label: Some("Head table".to_string()),
    }
}

fn seat(f: &Furniture, seat_index: i32, person: &str) -> Assignment {
    Assignment {
        chart_id: f.chart_id,
        furniture_id: f.furniture_id,
        seat_index,
        person_id: person.to_string(),
    }
}

fn store(pool: PgPool) -> PgChartStore {
    PgChartStore::new(pool, TransactLimits::default())
}

// ---------------------------------------------------------------------------
// Chart CRUD
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn chart_crud_is_scoped_by_owner(pool: PgPool) {
    let chart_id = new_chart(&pool, "Gala").await;

    let found = ChartRepo::find_owned(&pool, OWNER, chart_id).await.unwrap().unwrap();
    assert_eq!(found.name, "Gala");
    assert_eq!(found.metadata, serde_json::json!({}));

    assert!(ChartRepo::find_owned(&pool, OWNER + 1, chart_id).await.unwrap().is_none());
    assert!(ChartRepo::list_by_user(&pool, OWNER + 1).await.unwrap().is_empty());

    let patch = UpdateChart {
        name: Some("Gala 2025".to_string()),
        metadata: None,
    };
    let updated = ChartRepo::update(&pool, OWNER, chart_id, &patch).await.unwrap().unwrap();
    assert_eq!(updated.name, "Gala 2025");
    assert!(ChartRepo::update(&pool, OWNER + 1, chart_id, &patch).await.unwrap().is_none());

    assert!(!ChartRepo::delete(&pool, OWNER + 1, chart_id).await.unwrap());
    assert!(ChartRepo::delete(&pool, OWNER, chart_id).await.unwrap());
    assert!(ChartRepo::find_owned(&pool, OWNER, chart_id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn deleting_a_chart_removes_its_layout(pool: PgPool) {
    let chart_id = new_chart(&pool, "Offsite").await;
    let store = store(pool.clone());
    let t = table(chart_id, 4);
    store
        .transact_write(&[
            StoreOp::CreateFurniture(t.clone()),
            StoreOp::CreateAssignment(seat(&t, 0, "p1")),
        ])
        .await
        .unwrap();

    assert!(ChartRepo::delete(&pool, OWNER, chart_id).await.unwrap());
    assert!(store.list_furniture(chart_id).await.unwrap().is_empty());
    assert!(store.list_assignments(chart_id).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// PgChartStore
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn transact_write_round_trips_entities(pool: PgPool) {
    let chart_id = new_chart(&pool, "Dinner").await;
    let store = store(pool);
    let t = table(chart_id, 4);

    store
        .transact_write(&[
            StoreOp::CreateFurniture(t.clone()),
            StoreOp::CreateAssignment(seat(&t, 0, "p1")),
            StoreOp::CreateAssignment(seat(&t, 3, "p2")),
        ])
        .await
        .unwrap();

    let chart = store.find_chart(OWNER, chart_id).await.unwrap();
    assert!(chart.is_some());
    assert!(store.find_chart(OWNER + 1, chart_id).await.unwrap().is_none());
    assert_eq!(store.list_furniture(chart_id).await.unwrap(), vec![t.clone()]);
    assert_eq!(
        store.list_assignments(chart_id).await.unwrap(),
        vec![seat(&t, 0, "p1"), seat(&t, 3, "p2")]
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn failed_batch_rolls_back_entirely(pool: PgPool) {
    let chart_id = new_chart(&pool, "Dinner").await;
    let store = store(pool);
    let t = table(chart_id, 4);
    store
        .transact_write(&[
            StoreOp::CreateFurniture(t.clone()),
            StoreOp::CreateAssignment(seat(&t, 0, "p1")),
        ])
        .await
        .unwrap();

    // Second op collides with the occupied seat.
    let extra = table(chart_id, 2);
    let err = store
        .transact_write(&[
            StoreOp::CreateFurniture(extra),
            StoreOp::CreateAssignment(seat(&t, 0, "p9")),
        ])
        .await
        .unwrap_err();

    assert_matches!(err, StoreError::ConditionFailed(_));
    assert_eq!(store.list_furniture(chart_id).await.unwrap().len(), 1);
    assert_eq!(store.list_assignments(chart_id).await.unwrap()[0].person_id, "p1");
}

#[sqlx::test(migrations = "./migrations")]
async fn seated_furniture_cannot_be_deleted(pool: PgPool) {
    let chart_id = new_chart(&pool, "Dinner").await;
    let store = store(pool);
    let t = table(chart_id, 4);
    store
        .transact_write(&[
            StoreOp::CreateFurniture(t.clone()),
            StoreOp::CreateAssignment(seat(&t, 1, "p1")),
        ])
        .await
        .unwrap();

    let err = store
        .transact_write(&[StoreOp::DeleteFurniture(t.clone())])
        .await
        .unwrap_err();
    assert_matches!(err, StoreError::ConditionFailed(_));

    store
        .transact_write(&[
            StoreOp::DeleteAssignment(seat(&t, 1, "p1")),
            StoreOp::DeleteFurniture(t),
        ])
        .await
        .unwrap();
    assert!(store.list_furniture(chart_id).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn updating_missing_rows_is_a_condition_failure(pool: PgPool) {
    let chart_id = new_chart(&pool, "Dinner").await;
    let store = store(pool);
    let ghost = table(chart_id, 4);

    let err = store
        .transact_write(&[StoreOp::UpdateFurniture(ghost.clone())])
        .await
        .unwrap_err();
    assert_matches!(err, StoreError::ConditionFailed(msg) if msg.contains("does not exist"));

    let err = store
        .transact_write(&[StoreOp::CreateAssignment(seat(&ghost, 0, "p1"))])
        .await
        .unwrap_err();
    assert_matches!(err, StoreError::ConditionFailed(_));
}

// ---------------------------------------------------------------------------
// Reconciliation through PostgreSQL
// ---------------------------------------------------------------------------

fn descriptor(key: &str, capacity: i32) -> FurnitureDescriptor {
    FurnitureDescriptor {
        id: None,
        key: Some(key.to_string()),
        kind: "desk".to_string(),
        x: 0.0,
        y: 0.0,
        rotation: 90.0,
        shape: FurnitureShape {
            form: "rect".to_string(),
            width: 140.0,
            height: 70.0,
        },
        capacity,
        label: None,
        seats: Vec::new(),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn reconcile_converges_across_small_batches(pool: PgPool) {
    let chart_id = new_chart(&pool, "Open plan").await;
    let store = PgChartStore::new(pool, TransactLimits::new(3, 4 * 1024 * 1024));

    let mut desks: Vec<FurnitureDescriptor> =
        (0..4).map(|i| descriptor(&format!("d{i}"), 2)).collect();
    desks[0].seats = vec![SeatDescriptor {
        seat_index: 0,
        person_id: "ana".to_string(),
    }];
    let desired = DesiredLayout {
        furniture: desks,
        assignments: vec![AssignmentDescriptor {
            furniture_id: None,
            furniture_key: Some("d3".to_string()),
            seat_index: 1,
            person_id: "ben".to_string(),
        }],
    };

    let first = reconcile_layout(&store, OWNER, chart_id, &desired).await.unwrap();
    assert!(first.success);
    assert_eq!(first.counts.furniture_created, 4);
    assert_eq!(first.counts.assignments_created, 2);

    // Resubmit the persisted layout by id: nothing left to do.
    let chart = first.chart.unwrap();
    let resubmitted = DesiredLayout {
        furniture: chart
            .furniture
            .iter()
            .map(|f| FurnitureDescriptor {
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
            })
            .collect(),
        assignments: chart
            .assignments
            .iter()
            .map(|a| AssignmentDescriptor {
                furniture_id: Some(a.furniture_id),
                furniture_key: None,
                seat_index: a.seat_index,
                person_id: a.person_id.clone(),
            })
            .collect(),
    };
    let second = reconcile_layout(&store, OWNER, chart_id, &resubmitted).await.unwrap();
    assert_eq!(second.counts.total(), 0);

    // Clearing the layout deletes seats before their furniture.
    let cleared = reconcile_layout(&store, OWNER, chart_id, &DesiredLayout::default())
        .await
        .unwrap();
    assert_eq!(cleared.counts.assignments_deleted, 2);
    assert_eq!(cleared.counts.furniture_deleted, 4);
    let view = cleared.chart.unwrap();
    assert!(view.furniture.is_empty());
    assert!(view.assignments.is_empty());
}
