mod messages;
mod server;
mod session;

pub use messages::{ClientMessage, ServerMessage};
pub use server::BuzzerServer;
pub use session::BuzzerSession;
