use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

/// Fire-and-forget user notifications. The shell owns presentation (toasts
/// in the web shell); the core never hears back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyOperation {
    Success { message: String },
    Error { message: String },
}

impl Operation for NotifyOperation {
    type Output = ();
}

pub struct Notify<Ev> {
    context: CapabilityContext<NotifyOperation, Ev>,
}

impl<Ev> Capability<Ev> for Notify<Ev> {
    type Operation = NotifyOperation;
    type MappedSelf<MappedEv> = Notify<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Notify::new(self.context.map_event(f))
    }
}

impl<Ev> Notify<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<NotifyOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn success(&self, message: impl Into<String>) {
        self.send(NotifyOperation::Success {
            message: message.into(),
        });
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(NotifyOperation::Error {
            message: message.into(),
        });
    }

    fn send(&self, operation: NotifyOperation) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context.notify_shell(operation).await;
        });
    }
}
