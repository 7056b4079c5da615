pub mod app_state;

pub use app_state::{default_settings_path, AppContext, Settings};
