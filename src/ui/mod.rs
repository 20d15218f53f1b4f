//! Terminal UI components: data panels, terminal pane, and widgets.

pub mod layout;
pub mod panels;
pub mod terminal_pane;
pub mod toast;
pub mod toast_widget;

pub use panels::{RegionPanel, ServerMarks};
pub use terminal_pane::TerminalPane;
pub use toast::{Toast, ToastManager, ToastType};
pub use toast_widget::{ToastPosition, ToastWidget};
