use crate::avatar::{AvatarFrame, AvatarVariant};
use crate::session::ControllerHandle;
use tokio::sync::watch;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Front end to the running session controller
    pub controller: ControllerHandle,

    /// Latest avatar frame from the presenter
    pub avatar: watch::Receiver<AvatarFrame>,
}

impl AppState {
    pub fn new(controller: ControllerHandle, avatar: watch::Receiver<AvatarFrame>) -> Self {
        Self { controller, avatar }
    }

    pub fn variant(&self) -> AvatarVariant {
        self.avatar.borrow().variant
    }
}
