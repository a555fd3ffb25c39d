use crux_core::testing::AppTester;
use crux_http::testing::ResponseBuilder;
use crux_http::Error as HttpError;
use proptest::prelude::*;

use expedientes_core::capabilities::NotifyOperation;
use expedientes_core::{
    App, Case, CaseId, CaseStatus, DeleteState, Effect, Event, Model, MSG_CASE_DELETED,
};

fn case(id: &str, nombre: &str) -> Case {
    Case {
        id: CaseId::new(id),
        nombre: nombre.into(),
        descripcion: "detalle".into(),
        estado: CaseStatus::Abierto,
    }
}

fn list_response(cases: &[Case]) -> Box<crux_http::Result<crux_http::Response<Vec<u8>>>> {
    let body = serde_json::to_vec(cases).expect("serializable cases");
    Box::new(Ok(ResponseBuilder::ok().body(body).build()))
}

fn no_content() -> Box<crux_http::Result<crux_http::Response<Vec<u8>>>> {
    Box::new(Ok(ResponseBuilder::ok().body(Vec::new()).build()))
}

fn http_ops(effects: &[Effect]) -> Vec<&crux_http::protocol::HttpRequest> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Http(req) => Some(&req.operation),
            _ => None,
        })
        .collect()
}

fn notifications(effects: &[Effect]) -> Vec<NotifyOperation> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Notify(req) => Some(req.operation.clone()),
            _ => None,
        })
        .collect()
}

fn signed_in_with(app: &AppTester<App, Effect>, cases: &[Case]) -> Model {
    let mut model = Model::default();
    app.update(
        Event::SessionEstablished {
            user_id: "u1".into(),
            email: "ana@example.com".into(),
            token: "jwt".into(),
        },
        &mut model,
    );
    app.update(Event::RefreshResponse(list_response(cases)), &mut model);
    model
}

// Scenario: requesting delete on a second id replaces the pending token;
// confirming issues a delete only for the replacement.
#[test]
fn second_delete_request_replaces_pending_token() {
    let app = AppTester::<App, Effect>::default();
    let mut model = signed_in_with(&app, &[case("1", "Caso A"), case("2", "Caso B")]);

    let update = app.update(Event::DeleteRequested { id: "1".into() }, &mut model);
    assert_eq!(model.delete.pending_id(), Some(&CaseId::new("1")));
    assert!(http_ops(&update.effects).is_empty());

    let update = app.update(Event::DeleteRequested { id: "2".into() }, &mut model);
    assert_eq!(model.delete.pending_id(), Some(&CaseId::new("2")));
    assert!(http_ops(&update.effects).is_empty());

    let update = app.update(Event::DeleteConfirmed, &mut model);
    let ops = http_ops(&update.effects);
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].method, "DELETE");
    assert!(ops[0].url.ends_with("/api/v1/cases/2"));
    assert_eq!(model.delete, DeleteState::InFlight { id: CaseId::new("2") });
}

#[test]
fn cancel_returns_to_idle_without_a_call() {
    let app = AppTester::<App, Effect>::default();
    let mut model = signed_in_with(&app, &[case("1", "Caso A")]);

    app.update(Event::DeleteRequested { id: "1".into() }, &mut model);
    let update = app.update(Event::DeleteCancelled, &mut model);

    assert_eq!(model.delete, DeleteState::Idle);
    assert!(http_ops(&update.effects).is_empty());
    assert!(notifications(&update.effects).is_empty());
}

#[test]
fn confirm_without_pending_token_is_a_no_op() {
    let app = AppTester::<App, Effect>::default();
    let mut model = signed_in_with(&app, &[case("1", "Caso A")]);

    let update = app.update(Event::DeleteConfirmed, &mut model);

    assert_eq!(model.delete, DeleteState::Idle);
    assert!(http_ops(&update.effects).is_empty());
}

#[test]
fn request_during_in_flight_delete_is_ignored() {
    let app = AppTester::<App, Effect>::default();
    let mut model = signed_in_with(&app, &[case("1", "Caso A"), case("2", "Caso B")]);

    app.update(Event::DeleteRequested { id: "1".into() }, &mut model);
    app.update(Event::DeleteConfirmed, &mut model);
    assert_eq!(model.delete, DeleteState::InFlight { id: CaseId::new("1") });

    app.update(Event::DeleteRequested { id: "2".into() }, &mut model);
    assert_eq!(model.delete, DeleteState::InFlight { id: CaseId::new("1") });
}

// Scenario: the row disappears only through the follow-up refresh.
#[test]
fn delete_success_removes_row_after_refresh() {
    let app = AppTester::<App, Effect>::default();
    let mut model = signed_in_with(&app, &[case("1", "Caso A")]);

    app.update(Event::DeleteRequested { id: "1".into() }, &mut model);
    app.update(Event::DeleteConfirmed, &mut model);

    let update = app.update(
        Event::DeleteResponse {
            id: CaseId::new("1"),
            result: no_content(),
        },
        &mut model,
    );

    assert_eq!(model.delete, DeleteState::Idle);
    assert_eq!(
        notifications(&update.effects),
        vec![NotifyOperation::Success {
            message: MSG_CASE_DELETED.into()
        }]
    );

    // Still present until the refresh lands.
    assert_eq!(model.cases, vec![case("1", "Caso A")]);
    assert!(model.is_loading);
    assert_eq!(http_ops(&update.effects).len(), 1);

    app.update(Event::RefreshResponse(list_response(&[])), &mut model);
    assert!(model.cases.is_empty());
}

#[test]
fn delete_failure_keeps_row_and_clears_state() {
    let app = AppTester::<App, Effect>::default();
    let mut model = signed_in_with(&app, &[case("1", "Caso A")]);

    app.update(Event::DeleteRequested { id: "1".into() }, &mut model);
    app.update(Event::DeleteConfirmed, &mut model);

    let update = app.update(
        Event::DeleteResponse {
            id: CaseId::new("1"),
            result: Box::new(Err(HttpError::Io("boom".into()))),
        },
        &mut model,
    );

    assert_eq!(model.delete, DeleteState::Idle);
    assert_eq!(model.cases, vec![case("1", "Caso A")]);
    assert!(!model.is_loading);
    assert_eq!(
        notifications(&update.effects),
        vec![NotifyOperation::Error {
            message: "boom".into()
        }]
    );
}

proptest! {
    // However the user mashes the delete buttons, at most one token exists
    // and it always belongs to the most recent request.
    #[test]
    fn pending_token_is_always_the_last_request(indices in proptest::collection::vec(0usize..3, 1..12)) {
        let app = AppTester::<App, Effect>::default();
        let mut model = signed_in_with(
            &app,
            &[case("0", "Caso A"), case("1", "Caso B"), case("2", "Caso C")],
        );

        for &i in &indices {
            let update = app.update(Event::DeleteRequested { id: i.to_string() }, &mut model);
            prop_assert!(http_ops(&update.effects).is_empty());

            let expected = CaseId::new(i.to_string());
            prop_assert_eq!(model.delete.pending_id(), Some(&expected));
            prop_assert_eq!(model.delete.in_flight_id(), None);
        }

        let update = app.update(Event::DeleteConfirmed, &mut model);
        let ops = http_ops(&update.effects);
        prop_assert_eq!(ops.len(), 1);

        let last = indices.last().unwrap();
        let expected_suffix = format!("/api/v1/cases/{}", last);
        prop_assert!(ops[0].url.ends_with(&expected_suffix));
    }
}
