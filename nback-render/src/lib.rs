pub mod render;

pub use render::{load_stimuli, pixmap_from_rgba, render_text_pixmap, TaskRenderer};
