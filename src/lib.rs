pub mod app;
pub mod clock;
pub mod dates;
pub mod errors;
pub mod goals;
pub mod handlers;
pub mod models;
pub mod state;
pub mod stats;
pub mod storage;
pub mod window;

pub use app::router;
pub use clock::Clock;
pub use state::AppState;
pub use storage::{load_data, resolve_data_path};
