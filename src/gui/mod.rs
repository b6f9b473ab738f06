//! GUI module - User interface components

mod app;
mod control_panel;
mod detail_panel;

pub use app::CrossviewApp;
pub use control_panel::{ControlPanel, ControlPanelAction};
pub use detail_panel::DetailPanel;
