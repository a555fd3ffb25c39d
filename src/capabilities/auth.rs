use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

/// The slice of the identity provider the core is allowed to drive.
/// Sign-in stays entirely in the shell; the core only ever asks to leave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthOperation {
    SignOut,
}

impl Operation for AuthOperation {
    type Output = ();
}

pub struct Auth<Ev> {
    context: CapabilityContext<AuthOperation, Ev>,
}

impl<Ev> Capability<Ev> for Auth<Ev> {
    type Operation = AuthOperation;
    type MappedSelf<MappedEv> = Auth<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Auth::new(self.context.map_event(f))
    }
}

impl<Ev> Auth<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<AuthOperation, Ev>) -> Self {
        Self { context }
    }

    /// Terminates the session on the provider side. No return value; the
    /// shell tears down its auth state and re-renders the sign-in surface.
    pub fn sign_out(&self) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context.notify_shell(AuthOperation::SignOut).await;
        });
    }
}
