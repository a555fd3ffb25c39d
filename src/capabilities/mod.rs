mod auth;
mod notify;

pub use self::auth::{Auth, AuthOperation};
pub use self::notify::{Notify, NotifyOperation};

pub use crux_core::render::Render;
pub use crux_http::Http;

use crate::app::App;
use crate::event::Event;

pub type AppHttp = Http<Event>;
pub type AppRender = Render<Event>;
pub type AppAuth = Auth<Event>;
pub type AppNotify = Notify<Event>;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub http: Http<Event>,
    pub render: Render<Event>,
    pub auth: Auth<Event>,
    pub notify: Notify<Event>,
}
