use std::sync::Arc;
use std::time::Duration;

use hireflow::pipeline::{
    AdvanceOutcome, AdvancementProtocol, CandidateId, LoadOutcome, PipelineEditor, StageKind,
};
use hireflow::service::{HiringClient, SaveOutcome};
use hireflow::{ErrorClass, PollOutcome, PollPolicy, Poller, Session};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> HiringClient {
    HiringClient::new(&format!("{}/api", server.uri()), Session::with_token("tok")).unwrap()
}

#[tokio::test]
async fn unconfigured_org_saves_defaults_with_added_stage() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/workflow"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "no workflow"})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/workflow"))
        .and(body_json(json!({
            "step1": "Application Screening",
            "step2": "Technical Interview",
            "step3": "Final Interview",
            "step4": "Offer Stage"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"status": "created"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let mut editor = PipelineEditor::new(&client);
    assert_eq!(editor.load().await.unwrap(), LoadOutcome::Unconfigured);
    assert!(editor.add_stage(StageKind::TechnicalInterview).unwrap());
    assert!(editor.is_dirty());

    assert_eq!(editor.save().await.unwrap(), SaveOutcome::Created);
    assert!(!editor.is_dirty());
}

#[tokio::test]
async fn mandatory_stage_removal_never_reaches_the_service() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/workflow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "step1": "Application Screening",
            "step2": "Assessment",
            "step3": "Final Interview",
            "step4": "Offer Stage"
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client(&server);
    let mut editor = PipelineEditor::new(&client);
    assert_eq!(editor.load().await.unwrap(), LoadOutcome::Loaded);

    let err = editor.remove_stage(&StageKind::FinalInterview).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Invariant);
    assert_eq!(editor.stages().len(), 4);
    assert!(!editor.is_dirty());
}

#[tokio::test]
async fn candidate_walks_to_offer_then_completes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/workflow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "step1": "Application Screening",
            "step2": "Assessment",
            "step3": "Initial Interview",
            "step4": "Final Interview",
            "step5": "Offer Stage"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/candidates/c-7/progress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidate_id": "c-7",
            "flags": {
                "application_screening": true,
                "assessment": true,
                "initial_interview": true,
                "final_interview": true
            },
            "scores": {"assessment": 88.0, "initial_interview": 71.5},
            "total_weighted_score": 80.2
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/candidates/c-7/advance"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"current_step": "Offer Stage", "completed": false})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/candidates/c-7/advance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"completed": true})))
        .mount(&server)
        .await;

    let client = client(&server);
    let protocol = AdvancementProtocol::new(&client);
    let id = CandidateId::from("c-7");

    let snapshot = protocol.snapshot(&id).await.unwrap();
    assert_eq!(snapshot.current, Some(StageKind::FinalInterview));
    assert_eq!(snapshot.next, Some(StageKind::OfferStage));
    assert_eq!(snapshot.total_score, Some(80.2));
    assert_eq!(snapshot.completion_percent, 80.0);

    assert_eq!(
        protocol.advance(&id).await.unwrap(),
        AdvanceOutcome::Moved(StageKind::OfferStage)
    );
    assert_eq!(protocol.advance(&id).await.unwrap(), AdvanceOutcome::Complete);
    assert!(!protocol.is_in_flight(&id));
}

#[tokio::test]
async fn profile_poll_stops_once_populated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/organization/profile"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"organization_id": "org-1", "populated": false})),
        )
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/organization/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "organization_id": "org-1",
            "name": "Acme",
            "populated": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let policy = PollPolicy::fixed(Duration::from_millis(10));
    let outcome = Poller::profile(Arc::new(client(&server)), policy)
        .wait()
        .await;
    let profile = outcome.ready().unwrap();
    assert_eq!(profile.name, "Acme");
}

#[tokio::test]
async fn profile_poll_ends_on_rejected_credential() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/organization/profile"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let policy = PollPolicy::fixed(Duration::from_millis(10));
    let outcome = Poller::profile(Arc::new(client(&server)), policy)
        .wait()
        .await;
    assert!(matches!(outcome, PollOutcome::Failed(err) if err.is_auth()));
}
