//! HTTP API tests for groups and group composition

mod common;

use std::sync::Arc;
use std::time::Duration;

use actix_web::test;
use common::*;
use kvconf_store::testutil::FaultInjectingBackend;
use serde_json::{Value, json};

fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}

#[actix_web::test]
async fn test_attach_scenario() {
    let (state, _) = memory_state();
    let app = create_test_app(state).await;

    let cfg = create_config(&app, json!({"entries": {"k": "v"}, "version": "v1", "labels": ""})).await;
    assert_eq!(cfg["entries"], json!({"k": "v"}));
    assert_eq!(cfg["version"], "v1");
    assert_eq!(cfg["labels"], "");

    let grp = create_group(&app, json!({"version": "g1", "labels": ""})).await;
    assert_eq!(grp["configs"], json!([]));
    assert_eq!(grp["version"], "g1");
    assert_ne!(grp["id"], cfg["id"]);

    let (gid, cid) = (id_of(&grp), id_of(&cfg));
    let resp = put(&app, &format!("/group/{}/g1/config/{}/v1", gid, cid)).await;
    assert_eq!(resp.status(), 200);
    let attached: Value = test::read_body_json(resp).await;
    assert_eq!(attached["id"], grp["id"]);
    assert_eq!(attached["version"], "g1");
    assert_eq!(attached["configs"], json!([cfg]));

    let resp = get(&app, &format!("/group/{}/g1", gid)).await;
    assert_eq!(resp.status(), 200);
    let stored: Value = test::read_body_json(resp).await;
    assert_eq!(stored, json!([attached]));
}

#[actix_web::test]
async fn test_create_group_validation() {
    let (state, _) = memory_state();
    let app = create_test_app(state).await;

    let resp = post_json(&app, "/group", json!({"labels": ""}), None).await;
    assert_eq!(resp.status(), 400);
    let resp = post_json(&app, "/group", json!({"version": "g1", "members": []}), None).await;
    assert_eq!(resp.status(), 400);

    let resp = post_json(&app, "/group", json!({"version": "g1"}), Some("G")).await;
    assert_eq!(resp.status(), 201);
    let resp = post_json(&app, "/group", json!({"version": "g1"}), Some("G")).await;
    assert_eq!(resp.status(), 409);
}

#[actix_web::test]
async fn test_attach_not_found() {
    let (state, _) = memory_state();
    let app = create_test_app(state).await;

    let cfg = create_config(&app, json!({"version": "v1"})).await;
    let grp = create_group(&app, json!({"version": "g1"})).await;

    let resp = put(&app, &format!("/group/missing/g1/config/{}/v1", id_of(&cfg))).await;
    assert_eq!(resp.status(), 404);
    let error: Value = test::read_body_json(resp).await;
    assert_eq!(error["message"], "group not found");

    let resp = put(&app, &format!("/group/{}/g1/config/missing/v1", id_of(&grp))).await;
    assert_eq!(resp.status(), 404);
    let error: Value = test::read_body_json(resp).await;
    assert_eq!(error["message"], "config not found");

    // Wrong version of an existing config
    let resp = put(&app, &format!("/group/{}/g1/config/{}/v2", id_of(&grp), id_of(&cfg))).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_detach_and_detach_miss() {
    let (state, _) = memory_state();
    let app = create_test_app(state).await;

    let a = create_config(&app, json!({"version": "v1", "entries": {"a": "1"}})).await;
    let b = create_config(&app, json!({"version": "v1", "entries": {"b": "2"}})).await;
    let grp = create_group(&app, json!({"version": "g1"})).await;
    let gid = id_of(&grp);

    for cfg in [&a, &b, &a] {
        let resp = put(&app, &format!("/group/{}/g1/config/{}/v1", gid, id_of(cfg))).await;
        assert_eq!(resp.status(), 200);
    }

    // Only the first matching member goes
    let resp = delete(&app, &format!("/group/{}/g1/config/{}", gid, id_of(&a))).await;
    assert_eq!(resp.status(), 200);
    let detached: Value = test::read_body_json(resp).await;
    assert_eq!(detached["configs"], json!([b, a]));

    let resp = delete(&app, &format!("/group/{}/g1/config/not-a-member", gid)).await;
    assert_eq!(resp.status(), 404);
    let error: Value = test::read_body_json(resp).await;
    assert_eq!(error["message"], "config not found in group");

    let resp = get(&app, &format!("/group/{}/g1", gid)).await;
    let stored: Value = test::read_body_json(resp).await;
    assert_eq!(stored[0]["configs"], json!([b, a]));
}

#[actix_web::test]
async fn test_attached_config_is_a_copy() {
    let (state, _) = memory_state();
    let app = create_test_app(state).await;

    let cfg = create_config(&app, json!({"version": "v1", "entries": {"k": "v"}})).await;
    let grp = create_group(&app, json!({"version": "g1"})).await;
    let (gid, cid) = (id_of(&grp), id_of(&cfg));

    let resp = put(&app, &format!("/group/{}/g1/config/{}/v1", gid, cid)).await;
    assert_eq!(resp.status(), 200);

    let resp = delete(&app, &format!("/config/{}/v1", cid)).await;
    assert_eq!(resp.status(), 200);

    let resp = get(&app, &format!("/group/{}/g1", gid)).await;
    let stored: Value = test::read_body_json(resp).await;
    assert_eq!(stored[0]["configs"], json!([cfg]));
}

#[actix_web::test]
async fn test_legacy_addressing() {
    let (state, _) = memory_state();
    let app = create_test_app(state).await;

    let cfg = create_config(&app, json!({"version": "v1"})).await;
    let grp = create_group(&app, json!({"version": "g1"})).await;
    let (gid, cid) = (id_of(&grp), id_of(&cfg));

    let resp = put(&app, &format!("/group/{}/config/{}", gid, cid)).await;
    assert_eq!(resp.status(), 200);
    let attached: Value = test::read_body_json(resp).await;
    assert_eq!(attached["configs"], json!([cfg]));

    let resp = get(&app, &format!("/group/{}", gid)).await;
    let groups: Value = test::read_body_json(resp).await;
    assert_eq!(groups, json!([attached]));

    let resp = delete(&app, &format!("/group/{}/config/{}", gid, cid)).await;
    assert_eq!(resp.status(), 200);
    let detached: Value = test::read_body_json(resp).await;
    assert_eq!(detached["configs"], json!([]));

    let resp = delete(&app, &format!("/group/{}/config/{}", gid, cid)).await;
    assert_eq!(resp.status(), 404);

    let resp = delete(&app, &format!("/group/{}", gid)).await;
    assert_eq!(resp.status(), 200);
    let deleted: Value = test::read_body_json(resp).await;
    assert_eq!(deleted, json!({"Deleted": gid}));

    let resp = get(&app, &format!("/group/{}", gid)).await;
    let groups: Value = test::read_body_json(resp).await;
    assert_eq!(groups, json!([]));
}

#[actix_web::test]
async fn test_delete_group_and_list() {
    let (state, _) = memory_state();
    let app = create_test_app(state).await;

    let first = create_group(&app, json!({"version": "g1"})).await;
    let second = create_group(&app, json!({"version": "g1", "labels": "team:a"})).await;

    let resp = get(&app, "/groups").await;
    let groups: Value = test::read_body_json(resp).await;
    assert_eq!(groups.as_array().unwrap().len(), 2);

    let resp = delete(&app, &format!("/group/{}/g1", id_of(&first))).await;
    assert_eq!(resp.status(), 200);
    let deleted: Value = test::read_body_json(resp).await;
    assert_eq!(deleted, json!({"Deleted": id_of(&first)}));

    let resp = get(&app, "/groups").await;
    let groups: Value = test::read_body_json(resp).await;
    assert_eq!(groups, json!([second]));

    let resp = get(&app, &format!("/group/{}/g1", id_of(&first))).await;
    let groups: Value = test::read_body_json(resp).await;
    assert_eq!(groups, json!([]));
}

#[actix_web::test]
async fn test_lost_cas_is_retried_then_conflicts() {
    let backend = Arc::new(FaultInjectingBackend::new());
    let app = create_test_app(state_over(backend.clone())).await;

    let cfg = create_config(&app, json!({"version": "v1"})).await;
    let grp = create_group(&app, json!({"version": "g1"})).await;
    let uri = format!("/group/{}/g1/config/{}/v1", id_of(&grp), id_of(&cfg));

    backend.lose_next_cas(2);
    let resp = put(&app, &uri).await;
    assert_eq!(resp.status(), 200);
    let attached: Value = test::read_body_json(resp).await;
    assert_eq!(attached["configs"].as_array().unwrap().len(), 1);

    backend.lose_next_cas(100);
    let resp = put(&app, &uri).await;
    assert_eq!(resp.status(), 409);
}

#[actix_web::test]
async fn test_interleaved_attaches_both_land() {
    let backend = Arc::new(FaultInjectingBackend::new());
    let app = create_test_app(state_over(backend.clone())).await;

    let a = create_config(&app, json!({"version": "v1"})).await;
    let b = create_config(&app, json!({"version": "v1"})).await;
    let grp = create_group(&app, json!({"version": "g1"})).await;
    let gid = id_of(&grp);

    // Latency makes both requests read the group before either writes
    backend.set_delay(Duration::from_millis(5));
    let uri_a = format!("/group/{}/g1/config/{}/v1", gid, id_of(&a));
    let uri_b = format!("/group/{}/g1/config/{}/v1", gid, id_of(&b));
    let (resp_a, resp_b) = tokio::join!(put(&app, &uri_a), put(&app, &uri_b));
    assert_eq!(resp_a.status(), 200);
    assert_eq!(resp_b.status(), 200);

    backend.set_delay(Duration::ZERO);
    let resp = get(&app, &format!("/group/{}/g1", gid)).await;
    let stored: Value = test::read_body_json(resp).await;
    let members: Vec<String> = stored[0]["configs"]
        .as_array()
        .unwrap()
        .iter()
        .map(id_of)
        .collect();
    assert_eq!(members.len(), 2);
    assert!(members.contains(&id_of(&a)));
    assert!(members.contains(&id_of(&b)));
}
