pub mod avatar;
pub mod capability;
pub mod config;
pub mod error;
pub mod http;
pub mod reply;
pub mod session;

pub use avatar::{spawn_presenter, Avatar, AvatarFrame, AvatarVariant};
pub use capability::{
    AudioBuffer, BufferedPlayer, Capability, CapabilityEvent, CapabilityHandle, CapabilityKind,
    ConsoleSynthesizer, EventSink, LineRecognizer, Microphone, Payload,
};
pub use config::Config;
pub use error::{ErrorKind, SessionError};
pub use http::{create_router, AppState};
pub use reply::{HttpReplyClient, RemoteReply, ReplyClient};
pub use session::{
    Capabilities, Command, ControllerHandle, SessionConfig, SessionController, SessionState,
    Snapshot,
};
