pub mod controller;
pub mod dispatcher;
pub mod lobby;
pub mod render_cache;
pub mod renderer;
pub mod session;
