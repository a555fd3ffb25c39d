use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use crux_http::Error as HttpError;

use crate::capabilities::Capabilities;
use crate::event::{Event, RemoteResult};
use crate::model::{
    Case, CaseDraft, CaseFields, CaseId, DeleteState, FormState, Model, Session, UserId,
};
use crate::view::ViewModel;
use crate::{
    AppError, AppResult, ErrorKind, BACKEND_URL, CASES_PATH, FALLBACK_CREATE_ERROR,
    FALLBACK_DELETE_ERROR, FALLBACK_LIST_ERROR, FALLBACK_UPDATE_ERROR, MSG_CASE_CREATED,
    MSG_CASE_DELETED, MSG_CASE_UPDATED,
};

#[derive(Default)]
pub struct App;

enum SubmitAction {
    Create(CaseFields),
    Update(CaseId, CaseFields),
}

impl App {
    fn bearer(session: &Session) -> String {
        format!("Bearer {}", session.token.expose_secret())
    }

    fn cases_url() -> String {
        format!("{BACKEND_URL}{CASES_PATH}")
    }

    fn case_url(id: &CaseId) -> String {
        format!("{BACKEND_URL}{CASES_PATH}/{id}")
    }

    /// The list is refetched wholesale after every successful mutation.
    /// No incremental patching of the cache.
    fn start_refresh(model: &mut Model, caps: &Capabilities) {
        let Some(session) = &model.session else {
            tracing::debug!("refresh skipped: signed out");
            return;
        };
        Self::send_list_request(session, caps);
        model.is_loading = true;
    }

    fn send_list_request(session: &Session, caps: &Capabilities) {
        let auth = Self::bearer(session);
        caps.http
            .get(Self::cases_url())
            .header("Authorization", auth.as_str())
            .send(|result| Event::RefreshResponse(Box::new(result)));
    }

    fn send_create_request(fields: &CaseFields, session: &Session, caps: &Capabilities) -> bool {
        let auth = Self::bearer(session);
        let idempotency_key = Uuid::new_v4().to_string();

        match caps
            .http
            .post(Self::cases_url())
            .header("Authorization", auth.as_str())
            .header("Idempotency-Key", idempotency_key.as_str())
            .body_json(fields)
        {
            Ok(builder) => {
                builder.send(|result| Event::CreateResponse(Box::new(result)));
                true
            }
            Err(error) => {
                tracing::warn!(error = %error, "create request could not be built");
                caps.notify.error(FALLBACK_CREATE_ERROR);
                false
            }
        }
    }

    fn send_update_request(
        id: &CaseId,
        fields: &CaseFields,
        session: &Session,
        caps: &Capabilities,
    ) -> bool {
        let auth = Self::bearer(session);
        let idempotency_key = Uuid::new_v4().to_string();

        match caps
            .http
            .put(Self::case_url(id))
            .header("Authorization", auth.as_str())
            .header("Idempotency-Key", idempotency_key.as_str())
            .body_json(fields)
        {
            Ok(builder) => {
                let id = id.clone();
                builder.send(move |result| Event::UpdateResponse {
                    id: id.clone(),
                    result: Box::new(result),
                });
                true
            }
            Err(error) => {
                tracing::warn!(case_id = %id, error = %error, "update request could not be built");
                caps.notify.error(FALLBACK_UPDATE_ERROR);
                false
            }
        }
    }

    fn send_delete_request(id: &CaseId, session: &Session, caps: &Capabilities) {
        let auth = Self::bearer(session);
        let idempotency_key = Uuid::new_v4().to_string();
        let event_id = id.clone();

        caps.http
            .delete(Self::case_url(id))
            .header("Authorization", auth.as_str())
            .header("Idempotency-Key", idempotency_key.as_str())
            .send(move |result| Event::DeleteResponse {
                id: event_id.clone(),
                result: Box::new(result),
            });
    }

    fn transport_error(error: &HttpError) -> AppError {
        match error {
            HttpError::Url(message) => {
                AppError::new(ErrorKind::Unknown, "").with_internal(message.clone())
            }
            HttpError::Io(message) => AppError::new(ErrorKind::Network, message.clone()),
            HttpError::Timeout => AppError::new(ErrorKind::Timeout, "La solicitud tardó demasiado."),
            HttpError::Json(message) => {
                AppError::new(ErrorKind::Deserialization, "").with_internal(message.clone())
            }
            HttpError::Http(inner) => {
                AppError::from_http_status(u16::from(inner.code), None)
                    .with_internal(inner.message.clone())
            }
            #[allow(unreachable_patterns)]
            _ => AppError::new(ErrorKind::Unknown, ""),
        }
    }

    /// Collapses a settled remote call into either the body bytes or an
    /// `AppError` with a defensively extracted message.
    fn into_outcome(result: RemoteResult) -> AppResult<Vec<u8>> {
        match result {
            Ok(mut response) if response.status().is_success() => {
                Ok(response.take_body().unwrap_or_default())
            }
            Ok(mut response) => {
                let status = u16::from(response.status());
                let body = response.take_body();
                Err(AppError::from_http_status(status, body.as_deref()))
            }
            Err(error) => Err(Self::transport_error(&error)),
        }
    }

    fn handle_refresh_response(model: &mut Model, caps: &Capabilities, result: Box<RemoteResult>) {
        model.is_loading = false;

        match Self::into_outcome(*result) {
            Ok(bytes) => match serde_json::from_slice::<Vec<Case>>(&bytes) {
                Ok(cases) => {
                    tracing::debug!(count = cases.len(), "case list refreshed");
                    model.cases = cases;
                }
                Err(error) => {
                    tracing::warn!(error = %error, "case list body did not parse");
                    caps.notify.error(FALLBACK_LIST_ERROR);
                }
            },
            Err(error) => {
                tracing::warn!(code = error.code(), "refresh failed");
                caps.notify.error(error.message_or(FALLBACK_LIST_ERROR));
            }
        }
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        tracing::debug!(
            event = event.name(),
            user_initiated = event.is_user_initiated(),
            "update"
        );

        match event {
            Event::Noop => {}

            Event::SessionEstablished {
                user_id,
                email,
                token,
            } => {
                model.session = Some(Session {
                    user_id: UserId::new(user_id),
                    email,
                    token: SecretString::new(token),
                });
                Self::start_refresh(model, caps);
                caps.render.render();
            }

            Event::SignOutRequested => {
                model.reset_to_signed_out();
                caps.auth.sign_out();
                caps.render.render();
            }

            Event::RefreshRequested => {
                Self::start_refresh(model, caps);
                caps.render.render();
            }

            Event::RefreshResponse(result) => {
                if model.session.is_none() {
                    tracing::debug!("refresh response after sign-out; discarding");
                    return;
                }
                Self::handle_refresh_response(model, caps, result);
                caps.render.render();
            }

            Event::NewCaseRequested => {
                if model.form.is_open() {
                    tracing::debug!("new case ignored: form already open");
                    return;
                }
                model.form = FormState::Creating {
                    draft: CaseDraft::default(),
                    in_flight: false,
                };
                caps.render.render();
            }

            Event::StartEditRequested { id } => {
                if model.form.is_open() {
                    tracing::debug!("edit ignored: form already open");
                    return;
                }
                // No fetch here: the cached snapshot is what the user sees.
                let next = match model.case_by_id(&id) {
                    Some(case) => FormState::Editing {
                        id: case.id.clone(),
                        draft: CaseDraft::from_case(case),
                        in_flight: false,
                    },
                    None => {
                        tracing::warn!(case_id = %id, "edit requested for unknown case");
                        return;
                    }
                };
                model.form = next;
                caps.render.render();
            }

            Event::DraftNombreChanged { value } => {
                if let Some(draft) = model.form.draft_mut() {
                    draft.nombre = value;
                    caps.render.render();
                } else {
                    tracing::debug!("draft change ignored: form closed");
                }
            }

            Event::DraftDescripcionChanged { value } => {
                if let Some(draft) = model.form.draft_mut() {
                    draft.descripcion = value;
                    caps.render.render();
                } else {
                    tracing::debug!("draft change ignored: form closed");
                }
            }

            Event::DraftEstadoChanged { estado } => {
                if let Some(draft) = model.form.draft_mut() {
                    draft.estado = estado;
                    caps.render.render();
                } else {
                    tracing::debug!("draft change ignored: form closed");
                }
            }

            Event::SubmitRequested => {
                let Some(session) = &model.session else {
                    tracing::warn!("submit ignored: signed out");
                    return;
                };
                if model.form.is_in_flight() {
                    tracing::debug!("submit ignored: already in flight");
                    return;
                }
                let action = match &model.form {
                    // Submitting without an open form issues no call.
                    FormState::Closed => {
                        tracing::debug!("submit ignored: no open form");
                        return;
                    }
                    FormState::Creating { draft, .. } => draft.validate().map(SubmitAction::Create),
                    FormState::Editing { id, draft, .. } => draft
                        .validate()
                        .map(|fields| SubmitAction::Update(id.clone(), fields)),
                };
                match action {
                    Ok(SubmitAction::Create(fields)) => {
                        if Self::send_create_request(&fields, session, caps) {
                            model.form.mark_in_flight();
                        }
                    }
                    Ok(SubmitAction::Update(id, fields)) => {
                        if Self::send_update_request(&id, &fields, session, caps) {
                            model.form.mark_in_flight();
                        }
                    }
                    Err(error) => {
                        caps.notify.error(error.to_string());
                    }
                }
                caps.render.render();
            }

            Event::CancelEditRequested => {
                if model.form.is_in_flight() {
                    tracing::debug!("cancel ignored: submit in flight");
                    return;
                }
                if model.form.is_open() {
                    model.form = FormState::Closed;
                    caps.render.render();
                } else {
                    tracing::debug!("cancel ignored: form closed");
                }
            }

            Event::CreateResponse(result) => {
                if model.session.is_none() {
                    tracing::debug!("create response after sign-out; discarding");
                    return;
                }
                model.form.clear_in_flight();
                match Self::into_outcome(*result) {
                    Ok(_) => {
                        model.form = FormState::Closed;
                        caps.notify.success(MSG_CASE_CREATED);
                        Self::start_refresh(model, caps);
                    }
                    Err(error) => {
                        // The form stays open and populated for a retry.
                        tracing::warn!(code = error.code(), "create failed");
                        caps.notify.error(error.message_or(FALLBACK_CREATE_ERROR));
                    }
                }
                caps.render.render();
            }

            Event::UpdateResponse { id, result } => {
                if model.session.is_none() {
                    tracing::debug!("update response after sign-out; discarding");
                    return;
                }
                model.form.clear_in_flight();
                match Self::into_outcome(*result) {
                    Ok(_) => {
                        model.form = FormState::Closed;
                        caps.notify.success(MSG_CASE_UPDATED);
                        Self::start_refresh(model, caps);
                    }
                    Err(error) => {
                        tracing::warn!(case_id = %id, code = error.code(), "update failed");
                        caps.notify.error(error.message_or(FALLBACK_UPDATE_ERROR));
                    }
                }
                caps.render.render();
            }

            Event::DeleteRequested { id } => {
                // A pending token would have nowhere to live while a delete
                // runs, so requests during one are dropped.
                if matches!(model.delete, DeleteState::InFlight { .. }) {
                    tracing::debug!("delete request ignored: another delete in flight");
                    return;
                }
                let next = match model.case_by_id(&id) {
                    Some(case) => DeleteState::PendingConfirm {
                        id: case.id.clone(),
                    },
                    None => {
                        tracing::warn!(case_id = %id, "delete requested for unknown case");
                        return;
                    }
                };
                // Last request wins: an earlier pending token is replaced
                // without a delete being issued for it.
                model.delete = next;
                caps.render.render();
            }

            Event::DeleteCancelled => {
                if matches!(model.delete, DeleteState::PendingConfirm { .. }) {
                    model.delete = DeleteState::Idle;
                    caps.render.render();
                } else {
                    tracing::debug!("delete cancel ignored: nothing pending");
                }
            }

            Event::DeleteConfirmed => {
                let Some(session) = &model.session else {
                    tracing::warn!("delete ignored: signed out");
                    return;
                };
                let DeleteState::PendingConfirm { id } = &model.delete else {
                    tracing::debug!("delete confirm ignored: nothing pending");
                    return;
                };
                let id = id.clone();
                Self::send_delete_request(&id, session, caps);
                model.delete = DeleteState::InFlight { id };
                caps.render.render();
            }

            Event::DeleteResponse { id, result } => {
                if model.session.is_none() {
                    tracing::debug!("delete response after sign-out; discarding");
                    return;
                }
                // Confirmation state clears whether the call worked or not;
                // a failed delete leaves the stale row until the next refresh.
                model.delete = DeleteState::Idle;
                match Self::into_outcome(*result) {
                    Ok(_) => {
                        caps.notify.success(MSG_CASE_DELETED);
                        Self::start_refresh(model, caps);
                    }
                    Err(error) => {
                        tracing::warn!(case_id = %id, code = error.code(), "delete failed");
                        caps.notify.error(error.message_or(FALLBACK_DELETE_ERROR));
                    }
                }
                caps.render.render();
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel::from_model(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Effect;
    use crux_core::testing::AppTester;

    fn signed_in_model() -> Model {
        Model {
            session: Some(Session {
                user_id: UserId::new("u1"),
                email: "ana@example.com".into(),
                token: SecretString::new("jwt".into()),
            }),
            ..Model::default()
        }
    }

    fn has_http(effects: &[Effect]) -> bool {
        effects.iter().any(|e| matches!(e, Effect::Http(_)))
    }

    fn has_notify(effects: &[Effect]) -> bool {
        effects.iter().any(|e| matches!(e, Effect::Notify(_)))
    }

    #[test]
    fn submit_with_closed_form_issues_nothing() {
        let app = AppTester::<App, Effect>::default();
        let mut model = signed_in_model();

        let update = app.update(Event::SubmitRequested, &mut model);

        assert!(!has_http(&update.effects));
        assert!(!has_notify(&update.effects));
        assert_eq!(model.form, FormState::Closed);
    }

    #[test]
    fn refresh_without_session_issues_nothing() {
        let app = AppTester::<App, Effect>::default();
        let mut model = Model::default();

        let update = app.update(Event::RefreshRequested, &mut model);

        assert!(!has_http(&update.effects));
        assert!(!model.is_loading);
    }

    #[test]
    fn new_case_is_ignored_while_editing() {
        let app = AppTester::<App, Effect>::default();
        let mut model = signed_in_model();
        model.cases = vec![Case {
            id: CaseId::new("1"),
            nombre: "Caso A".into(),
            descripcion: "d".into(),
            estado: crate::CaseStatus::Abierto,
        }];

        app.update(Event::StartEditRequested { id: "1".into() }, &mut model);
        assert!(matches!(model.form, FormState::Editing { .. }));

        // Creating directly from Editing is not a legal transition.
        app.update(Event::NewCaseRequested, &mut model);
        assert!(matches!(model.form, FormState::Editing { .. }));
    }

    #[test]
    fn edit_is_ignored_while_creating() {
        let app = AppTester::<App, Effect>::default();
        let mut model = signed_in_model();
        model.cases = vec![Case {
            id: CaseId::new("1"),
            nombre: "Caso A".into(),
            descripcion: "d".into(),
            estado: crate::CaseStatus::Abierto,
        }];

        app.update(Event::NewCaseRequested, &mut model);
        app.update(Event::StartEditRequested { id: "1".into() }, &mut model);

        assert!(matches!(model.form, FormState::Creating { .. }));
    }

    #[test]
    fn cancel_is_blocked_while_submit_in_flight() {
        let app = AppTester::<App, Effect>::default();
        let mut model = signed_in_model();
        model.form = FormState::Creating {
            draft: CaseDraft {
                nombre: "Caso A".into(),
                descripcion: "d".into(),
                estado: crate::CaseStatus::Abierto,
            },
            in_flight: true,
        };

        app.update(Event::CancelEditRequested, &mut model);

        assert!(model.form.is_in_flight());
    }

    #[test]
    fn invalid_draft_notifies_and_keeps_form_open() {
        let app = AppTester::<App, Effect>::default();
        let mut model = signed_in_model();

        app.update(Event::NewCaseRequested, &mut model);
        let update = app.update(Event::SubmitRequested, &mut model);

        assert!(!has_http(&update.effects));
        assert!(has_notify(&update.effects));
        assert!(matches!(model.form, FormState::Creating { .. }));
        assert!(!model.form.is_in_flight());
    }

    #[test]
    fn duplicate_submit_is_suppressed() {
        let app = AppTester::<App, Effect>::default();
        let mut model = signed_in_model();
        model.form = FormState::Creating {
            draft: CaseDraft {
                nombre: "Caso A".into(),
                descripcion: "d".into(),
                estado: crate::CaseStatus::Abierto,
            },
            in_flight: true,
        };

        let update = app.update(Event::SubmitRequested, &mut model);

        assert!(!has_http(&update.effects));
    }

    #[test]
    fn transport_errors_map_to_kinds() {
        let network = App::transport_error(&HttpError::Io("connection reset".into()));
        assert_eq!(network.kind, ErrorKind::Network);
        assert_eq!(network.message, "connection reset");

        let timeout = App::transport_error(&HttpError::Timeout);
        assert_eq!(timeout.kind, ErrorKind::Timeout);
    }
}
