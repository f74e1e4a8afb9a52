mod core;
mod width;

pub use self::core::{PageView, RendererSettings, TerminalRenderer, loader_bar};
pub use self::width::{display_width, truncate_to_width};
