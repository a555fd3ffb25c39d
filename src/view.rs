use serde::{Deserialize, Serialize};

use crate::model::{CaseDraft, CaseStatus, DeleteState, FormState, Model};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseRow {
    pub id: String,
    pub nombre: String,
    pub descripcion: String,
    pub estado: CaseStatus,
    pub estado_label: String,
    /// True while this row's delete call is running; the shell disables
    /// the row's buttons without touching the rest of the table.
    pub actions_disabled: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DraftView {
    pub nombre: String,
    pub descripcion: String,
    pub estado: CaseStatus,
}

impl From<&CaseDraft> for DraftView {
    fn from(draft: &CaseDraft) -> Self {
        Self {
            nombre: draft.nombre.clone(),
            descripcion: draft.descripcion.clone(),
            estado: draft.estado,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormView {
    Hidden,
    Create { draft: DraftView, submitting: bool },
    Edit { id: String, draft: DraftView, submitting: bool },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingDeleteView {
    pub id: String,
    pub nombre: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusOption {
    pub value: CaseStatus,
    pub label: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewModel {
    pub is_authenticated: bool,
    pub user_email: Option<String>,
    pub is_loading: bool,
    pub cases: Vec<CaseRow>,
    pub form: FormView,
    pub pending_delete: Option<PendingDeleteView>,
    pub status_options: Vec<StatusOption>,
}

impl ViewModel {
    #[must_use]
    pub fn from_model(model: &Model) -> Self {
        let deleting_id = model.delete.in_flight_id();

        let cases = model
            .cases
            .iter()
            .map(|case| CaseRow {
                id: case.id.as_str().to_string(),
                nombre: case.nombre.clone(),
                descripcion: case.descripcion.clone(),
                estado: case.estado,
                estado_label: case.estado.label().to_string(),
                actions_disabled: deleting_id == Some(&case.id),
            })
            .collect();

        let form = match &model.form {
            FormState::Closed => FormView::Hidden,
            FormState::Creating { draft, in_flight } => FormView::Create {
                draft: draft.into(),
                submitting: *in_flight,
            },
            FormState::Editing {
                id,
                draft,
                in_flight,
            } => FormView::Edit {
                id: id.as_str().to_string(),
                draft: draft.into(),
                submitting: *in_flight,
            },
        };

        let pending_delete = match &model.delete {
            DeleteState::PendingConfirm { id } => Some(PendingDeleteView {
                id: id.as_str().to_string(),
                nombre: pending_nombre(model, id.as_str()),
            }),
            _ => None,
        };

        Self {
            is_authenticated: model.is_authenticated(),
            user_email: model.session.as_ref().map(|s| s.email.clone()),
            is_loading: model.is_loading,
            cases,
            form,
            pending_delete,
            status_options: CaseStatus::ALL
                .iter()
                .map(|status| StatusOption {
                    value: *status,
                    label: status.label().to_string(),
                })
                .collect(),
        }
    }
}

fn pending_nombre(model: &Model, id: &str) -> String {
    model
        .case_by_id(id)
        .map(|case| case.nombre.clone())
        .unwrap_or_default()
}
