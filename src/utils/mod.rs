mod args;
mod progress;

pub use args::labelled_path;
pub use progress::{LoadedSource, SourceProgress};
