pub mod command;
pub mod graph_state;
pub mod history;
pub mod llm_client;
pub mod prompt;
pub mod session;
pub mod surface;
pub mod tutor;

pub use command::Command;
pub use graph_state::{GraphState, Vertex};
pub use history::{History, HistoryEntry, Role};
pub use tutor::{TutorResponse, TutorService};
