mod handler;
mod listener;
mod message;
mod session;

pub use handler::{DeviceConnectQuery, device_ws_handler};
pub use listener::{ListenerQuery, listener_ws_handler};
pub use message::{DeviceEvent, DeviceRequest};
pub use session::{DeviceSession, Reply};
