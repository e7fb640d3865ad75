//! Router tests: requests driven through `tower::ServiceExt::oneshot`
//! against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Extension, Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use horario_core::{
  reference::{
    ClassroomRecord, JornadaRecord, ReferenceRecord, SectionRecord, Status, SubjectRecord,
    TeacherRecord, TimeSlotRecord,
  },
  store::ScheduleStore,
};
use horario_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{Caller, api_router};

async fn seeded_store() -> Arc<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let mut records = vec![
    ReferenceRecord::Subject(SubjectRecord {
      code:        "SUB1".into(),
      name:        "Programming".into(),
      career_code: "CAR1".into(),
      semester:    Some(1),
    }),
    ReferenceRecord::Subject(SubjectRecord {
      code:        "SUB2".into(),
      name:        "Databases".into(),
      career_code: "CAR1".into(),
      semester:    Some(3),
    }),
  ];
  for code in ["T1", "T2"] {
    records.push(ReferenceRecord::Teacher(TeacherRecord {
      code:          code.into(),
      first_name:    "Alan".into(),
      last_name:     "Turing".into(),
      status:        Status::Active,
      career_code:   "CAR1".into(),
      subject_codes: vec!["SUB1".into(), "SUB2".into()],
    }));
  }
  for code in ["C1", "C2"] {
    records.push(ReferenceRecord::Classroom(ClassroomRecord {
      code:          code.into(),
      name:          format!("Lab {code}"),
      building_code: "B2".into(),
      capacity:      25,
      is_enabled:    true,
    }));
  }
  for (code, jornada) in [("M1", "J1"), ("M2", "J1"), ("N1", "J2")] {
    records.push(ReferenceRecord::TimeSlot(TimeSlotRecord {
      code:         code.into(),
      day:          "tuesday".into(),
      start:        "08:00".into(),
      end:          "09:00".into(),
      jornada_code: jornada.into(),
    }));
  }
  for (code, jornada) in [("S1", "J1"), ("S3", "J2")] {
    records.push(ReferenceRecord::Section(SectionRecord {
      code:         code.into(),
      name:         code.into(),
      status:       Status::Active,
      jornada_code: jornada.into(),
      capacity:     30,
      semester:     Some(1),
    }));
  }
  for code in ["J1", "J2"] {
    records.push(ReferenceRecord::Jornada(JornadaRecord {
      code:        code.into(),
      name:        code.into(),
      status:      Status::Active,
      career_code: "CAR1".into(),
    }));
  }

  for record in records {
    store.put_reference(record).await.unwrap();
  }
  Arc::new(store)
}

fn router_for(store: &Arc<SqliteStore>, caller: Caller) -> Router {
  api_router(Arc::clone(store)).layer(Extension(caller))
}

fn admin() -> Caller { Caller::admin("admin") }

fn entry(teacher: &str, classroom: &str, slot: &str, section: &str, jornada: &str) -> Value {
  json!({
    "subjectId": "SUB1",
    "teacherId": teacher,
    "classroomId": classroom,
    "timeSlotId": slot,
    "sectionId": section,
    "jornadaId": jornada,
    "period": "2025-1",
  })
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let req = match body {
    Some(body) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string())),
    None => builder.body(Body::empty()),
  }
  .unwrap();

  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let json = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, json)
}

/// Create a matrix as admin and return its id.
async fn create_one(store: &Arc<SqliteStore>, body: Value) -> String {
  let (status, created) = send(&router_for(store, admin()), "POST", "/assignments", Some(body)).await;
  assert_eq!(status, StatusCode::CREATED, "{created}");
  created[0]["matrixId"].as_str().unwrap().to_owned()
}

// ── Create and fetch ─────────────────────────────────────────────────────────

#[tokio::test]
async fn create_returns_201_and_matrix_is_fetchable() {
  let store = seeded_store().await;
  let app = router_for(&store, admin());

  let body = json!([entry("T1", "C1", "M2", "S1", "J1"), entry("T2", "C2", "M1", "S1", "J1")]);
  let (status, created) = send(&app, "POST", "/assignments", Some(body)).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created.as_array().unwrap().len(), 2);
  let matrix_id = created[0]["matrixId"].as_str().unwrap();

  let (status, matrix) = send(&app, "GET", &format!("/assignments/matrix/{matrix_id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(matrix["matrixId"], matrix_id);
  assert_eq!(matrix["entries"][0]["timeSlotId"], "M1");
  assert_eq!(matrix["entries"][1]["timeSlotId"], "M2");
  assert_eq!(matrix["semester"], 1);
}

#[tokio::test]
async fn wrapped_payload_is_accepted() {
  let store = seeded_store().await;
  let app = router_for(&store, admin());

  let body = json!({ "assignments": [entry("T1", "C1", "M1", "S1", "J1")] });
  let (status, _) = send(&app, "POST", "/assignments", Some(body)).await;
  assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn empty_batch_is_400() {
  let store = seeded_store().await;
  let app = router_for(&store, admin());

  let (status, body) = send(&app, "POST", "/assignments", Some(json!([]))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body, json!({ "message": "assignments array is required" }));
}

#[tokio::test]
async fn collision_is_409_with_message() {
  let store = seeded_store().await;
  create_one(&store, json!([entry("T1", "C1", "M1", "S1", "J1")])).await;

  let app = router_for(&store, admin());
  let (status, body) = send(
    &app,
    "POST",
    "/assignments",
    Some(json!([entry("T2", "C1", "M1", "S1", "J1")])),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(
    body["message"],
    "Classroom C1 is already assigned in time slot M1 for period 2025-1"
  );
}

#[tokio::test]
async fn unknown_reference_is_422() {
  let store = seeded_store().await;
  let app = router_for(&store, admin());

  let (status, body) = send(
    &app,
    "POST",
    "/assignments",
    Some(json!([entry("T9", "C1", "M1", "S1", "J1")])),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["message"], "Teacher T9 does not exist");
}

#[tokio::test]
async fn missing_matrix_is_404() {
  let store = seeded_store().await;
  let app = router_for(&store, admin());

  let (status, body) = send(&app, "GET", "/assignments/matrix/ASGM-nope", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["message"], "Assignment matrix ASGM-nope not found");
}

// ── Listing ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn listing_flat_and_grouped() {
  let store = seeded_store().await;
  create_one(&store, json!([entry("T1", "C1", "M1", "S1", "J1"), entry("T1", "C1", "M2", "S1", "J1")]))
    .await;
  create_one(&store, json!([entry("T2", "C2", "N1", "S3", "J2")])).await;
  let app = router_for(&store, admin());

  let (status, flat) = send(&app, "GET", "/assignments", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(flat.as_array().unwrap().len(), 3);

  let (_, grouped) = send(&app, "GET", "/assignments?grouped=true", None).await;
  assert_eq!(grouped.as_array().unwrap().len(), 2);
  assert_eq!(grouped[0]["entries"].as_array().unwrap().len(), 2);

  let (_, filtered) = send(&app, "GET", "/assignments?teacherId=T2", None).await;
  assert_eq!(filtered.as_array().unwrap().len(), 1);
  assert_eq!(filtered[0]["jornadaId"], "J2");
}

// ── Replace and delete ───────────────────────────────────────────────────────

#[tokio::test]
async fn put_replaces_matrix() {
  let store = seeded_store().await;
  let matrix_id = create_one(&store, json!([entry("T1", "C1", "M1", "S1", "J1")])).await;
  let app = router_for(&store, admin());

  let uri = format!("/assignments/matrix/{matrix_id}");
  let replacement = json!({ "assignments": [
    entry("T2", "C2", "M1", "S1", "J1"),
    entry("T1", "C1", "M2", "S1", "J1"),
  ]});
  let (status, matrix) = send(&app, "PUT", &uri, Some(replacement)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(matrix["entries"].as_array().unwrap().len(), 2);
  assert_eq!(matrix["entries"][0]["teacherId"], "T2");
}

#[tokio::test]
async fn delete_matrix_is_204_then_404() {
  let store = seeded_store().await;
  let matrix_id = create_one(&store, json!([entry("T1", "C1", "M1", "S1", "J1")])).await;
  let app = router_for(&store, admin());
  let uri = format!("/assignments/matrix/{matrix_id}");

  let (status, body) = send(&app, "DELETE", &uri, None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  assert_eq!(body, Value::Null);

  let (status, _) = send(&app, "GET", &uri, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (status, _) = send(&app, "DELETE", &uri, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_single_assignment() {
  let store = seeded_store().await;
  let mut single = entry("T1", "C1", "M1", "S1", "J1");
  single["id"] = json!("A-7");
  create_one(&store, json!([single])).await;
  let app = router_for(&store, admin());

  let (status, _) = send(&app, "DELETE", "/assignments/A-7", None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, body) = send(&app, "DELETE", "/assignments/A-7", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["message"], "Assignment A-7 not found");
}

// ── Coordinator scope ────────────────────────────────────────────────────────

#[tokio::test]
async fn coordinator_is_confined_to_own_jornadas() {
  let store = seeded_store().await;
  let day = create_one(&store, json!([entry("T1", "C1", "M1", "S1", "J1")])).await;
  let night = create_one(&store, json!([entry("T2", "C2", "N1", "S3", "J2")])).await;
  let app = router_for(&store, Caller::coordinator("maria", vec!["J1".into()]));

  let (status, listed) = send(&app, "GET", "/assignments", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(listed.as_array().unwrap().len(), 1);
  assert_eq!(listed[0]["jornadaId"], "J1");

  let (status, _) = send(&app, "GET", "/assignments?jornadaId=J2", None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = send(&app, "GET", &format!("/assignments/matrix/{day}"), None).await;
  assert_eq!(status, StatusCode::OK);
  let (status, body) = send(&app, "GET", &format!("/assignments/matrix/{night}"), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["message"], "You do not have permission to manage this jornada");

  let (status, _) = send(&app, "DELETE", &format!("/assignments/matrix/{night}"), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = send(
    &app,
    "POST",
    "/assignments",
    Some(json!([entry("T1", "C1", "M2", "S1", "J1"), entry("T1", "C1", "N1", "S3", "J2")])),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  // Nothing outside scope was touched.
  let (_, all) = send(&router_for(&store, admin()), "GET", "/assignments", None).await;
  assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn coordinator_legacy_key_outside_scope_is_refused_before_lookup() {
  let store = seeded_store().await;
  let app = router_for(&store, Caller::coordinator("maria", vec!["J1".into()]));
  let foreign = "/assignments/matrix/legacy%7C2025-1%7CJ2%7CS3";

  // Refused on the key alone, even though nothing matches it.
  let (status, _) = send(&app, "GET", foreign, None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, _) = send(&app, "DELETE", foreign, None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, _) =
    send(&app, "PUT", foreign, Some(json!([entry("T2", "C2", "N1", "S3", "J2")]))).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = send(&app, "GET", "/assignments/matrix/legacy%7C2025-1%7CJ1%7CS1", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
