use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::{ValidationError, MAX_DESCRIPCION_LEN, MAX_NOMBRE_LEN};

// --- Typed IDs ---

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

typed_id!(CaseId);
typed_id!(UserId);

// --- Case status ---

/// Wire values are the store's snake_case strings; labels are what the
/// shell renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    #[default]
    Abierto,
    EnProceso,
    Cerrado,
}

impl CaseStatus {
    pub const ALL: [Self; 3] = [Self::Abierto, Self::EnProceso, Self::Cerrado];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Abierto => "abierto",
            Self::EnProceso => "en_proceso",
            Self::Cerrado => "cerrado",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Abierto => "Abierto",
            Self::EnProceso => "En proceso",
            Self::Cerrado => "Cerrado",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "abierto" => Some(Self::Abierto),
            "en_proceso" => Some(Self::EnProceso),
            "cerrado" => Some(Self::Cerrado),
            _ => None,
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Case entity (remote, store-owned) ---

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Case {
    pub id: CaseId,
    pub nombre: String,
    pub descripcion: String,
    pub estado: CaseStatus,
}

// Redact debug output because the description is free-text user content.
impl fmt::Debug for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Case")
            .field("id", &self.id)
            .field("nombre", &self.nombre)
            .field("descripcion_len", &self.descripcion.len())
            .field("estado", &self.estado)
            .finish()
    }
}

/// Request body for create and update calls. The id travels in the URL.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CaseFields {
    pub nombre: String,
    pub descripcion: String,
    pub estado: CaseStatus,
}

// --- Draft form state ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct CaseDraft {
    pub nombre: String,
    pub descripcion: String,
    pub estado: CaseStatus,
}

impl CaseDraft {
    #[must_use]
    pub fn from_case(case: &Case) -> Self {
        Self {
            nombre: case.nombre.clone(),
            descripcion: case.descripcion.clone(),
            estado: case.estado,
        }
    }

    /// Normalizes and checks the draft. Validation here mirrors the form's
    /// `required` fields; everything else is the store's job.
    pub fn validate(&self) -> Result<CaseFields, ValidationError> {
        let nombre = self.nombre.trim();
        if nombre.is_empty() {
            return Err(ValidationError::NombreRequired);
        }
        if nombre.len() > MAX_NOMBRE_LEN {
            return Err(ValidationError::TooLong {
                len: nombre.len(),
                max: MAX_NOMBRE_LEN,
            });
        }

        let descripcion = self.descripcion.trim();
        if descripcion.is_empty() {
            return Err(ValidationError::DescripcionRequired);
        }
        if descripcion.len() > MAX_DESCRIPCION_LEN {
            return Err(ValidationError::TooLong {
                len: descripcion.len(),
                max: MAX_DESCRIPCION_LEN,
            });
        }

        Ok(CaseFields {
            nombre: nombre.to_string(),
            descripcion: descripcion.to_string(),
            estado: self.estado,
        })
    }
}

// --- Form state machine ---

/// The draft form. `Creating` and `Editing` are reachable only from
/// `Closed`, so "editing and creating at once" cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormState {
    #[default]
    Closed,
    Creating {
        draft: CaseDraft,
        in_flight: bool,
    },
    Editing {
        id: CaseId,
        draft: CaseDraft,
        in_flight: bool,
    },
}

impl FormState {
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        matches!(
            self,
            Self::Creating { in_flight: true, .. } | Self::Editing { in_flight: true, .. }
        )
    }

    pub fn draft_mut(&mut self) -> Option<&mut CaseDraft> {
        match self {
            Self::Closed => None,
            Self::Creating { draft, .. } | Self::Editing { draft, .. } => Some(draft),
        }
    }

    pub fn mark_in_flight(&mut self) {
        if let Self::Creating { in_flight, .. } | Self::Editing { in_flight, .. } = self {
            *in_flight = true;
        }
    }

    pub fn clear_in_flight(&mut self) {
        if let Self::Creating { in_flight, .. } | Self::Editing { in_flight, .. } = self {
            *in_flight = false;
        }
    }
}

// --- Delete state machine ---

/// Two-phase delete. A single variant holds the only pending or in-flight
/// id, so a second token cannot coexist with a running delete.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeleteState {
    #[default]
    Idle,
    PendingConfirm {
        id: CaseId,
    },
    InFlight {
        id: CaseId,
    },
}

impl DeleteState {
    #[must_use]
    pub const fn pending_id(&self) -> Option<&CaseId> {
        match self {
            Self::PendingConfirm { id } => Some(id),
            _ => None,
        }
    }

    #[must_use]
    pub const fn in_flight_id(&self) -> Option<&CaseId> {
        match self {
            Self::InFlight { id } => Some(id),
            _ => None,
        }
    }
}

// --- Session ---

/// Identity handed over by the shell after interactive sign-in. The token
/// only ever leaves this struct as an Authorization header.
#[derive(Debug)]
pub struct Session {
    pub user_id: UserId,
    pub email: String,
    pub token: SecretString,
}

// --- Model ---

#[derive(Debug, Default)]
pub struct Model {
    pub session: Option<Session>,
    pub cases: Vec<Case>,
    pub is_loading: bool,
    pub form: FormState,
    pub delete: DeleteState,
}

impl Model {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn case_by_id(&self, id: &str) -> Option<&Case> {
        self.cases.iter().find(|c| c.id.as_str() == id)
    }

    /// Back to the unauthenticated baseline. In-flight responses arriving
    /// after this resolve into a discarded state.
    pub fn reset_to_signed_out(&mut self) {
        self.session = None;
        self.cases.clear();
        self.is_loading = false;
        self.form = FormState::Closed;
        self.delete = DeleteState::Idle;
    }
}
