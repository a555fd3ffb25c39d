use crate::model::{CaseId, CaseStatus};

/// What a settled remote call hands back to `update`. Mutation responses
/// carry the raw body; decoding happens in the handler so a malformed
/// payload degrades into a notification instead of a crash.
pub type RemoteResult = crux_http::Result<crux_http::Response<Vec<u8>>>;

#[derive(Debug)]
pub enum Event {
    Noop,

    // Session
    SessionEstablished {
        user_id: String,
        email: String,
        token: String,
    },
    SignOutRequested,

    // List
    RefreshRequested,
    RefreshResponse(Box<RemoteResult>),

    // Draft form
    NewCaseRequested,
    StartEditRequested {
        id: String,
    },
    DraftNombreChanged {
        value: String,
    },
    DraftDescripcionChanged {
        value: String,
    },
    DraftEstadoChanged {
        estado: CaseStatus,
    },
    SubmitRequested,
    CancelEditRequested,
    CreateResponse(Box<RemoteResult>),
    UpdateResponse {
        id: CaseId,
        result: Box<RemoteResult>,
    },

    // Two-phase delete
    DeleteRequested {
        id: String,
    },
    DeleteCancelled,
    DeleteConfirmed,
    DeleteResponse {
        id: CaseId,
        result: Box<RemoteResult>,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::SessionEstablished { .. } => "session_established",
            Self::SignOutRequested => "sign_out_requested",
            Self::RefreshRequested => "refresh_requested",
            Self::RefreshResponse(_) => "refresh_response",
            Self::NewCaseRequested => "new_case_requested",
            Self::StartEditRequested { .. } => "start_edit_requested",
            Self::DraftNombreChanged { .. } => "draft_nombre_changed",
            Self::DraftDescripcionChanged { .. } => "draft_descripcion_changed",
            Self::DraftEstadoChanged { .. } => "draft_estado_changed",
            Self::SubmitRequested => "submit_requested",
            Self::CancelEditRequested => "cancel_edit_requested",
            Self::CreateResponse(_) => "create_response",
            Self::UpdateResponse { .. } => "update_response",
            Self::DeleteRequested { .. } => "delete_requested",
            Self::DeleteCancelled => "delete_cancelled",
            Self::DeleteConfirmed => "delete_confirmed",
            Self::DeleteResponse { .. } => "delete_response",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::SignOutRequested
                | Self::RefreshRequested
                | Self::NewCaseRequested
                | Self::StartEditRequested { .. }
                | Self::DraftNombreChanged { .. }
                | Self::DraftDescripcionChanged { .. }
                | Self::DraftEstadoChanged { .. }
                | Self::SubmitRequested
                | Self::CancelEditRequested
                | Self::DeleteRequested { .. }
                | Self::DeleteCancelled
                | Self::DeleteConfirmed
        )
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::Noop
    }
}
