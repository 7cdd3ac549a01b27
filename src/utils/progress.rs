use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

const LOADING_TEMPLATE: &str = "{spinner:.cyan} {prefix:>18.bold} {wide_msg}";
const LOADED_TEMPLATE: &str = "{prefix:>20.bold} {wide_msg}";
const TICK: Duration = Duration::from_millis(100);

/// One line per input file: a spinner while it is read, a record count once loaded.
pub trait SourceProgress {
    fn start_loading(&self, source: &str, path: &str) -> ProgressBar;
}

impl SourceProgress for MultiProgress {
    fn start_loading(&self, source: &str, path: &str) -> ProgressBar {
        let pb = self.add(ProgressBar::new_spinner());
        pb.set_style(source_style(LOADING_TEMPLATE));
        pb.set_prefix(source.to_string());
        pb.set_message(format!("reading `{path}`"));
        pb.enable_steady_tick(TICK);
        pb
    }
}

pub trait LoadedSource {
    fn finish_loaded(&self, records: usize);
    fn finish_failed(&self);
}

impl LoadedSource for ProgressBar {
    fn finish_loaded(&self, records: usize) {
        self.set_style(source_style(LOADED_TEMPLATE));
        self.finish_with_message(format!("✅ {records} records"));
    }

    fn finish_failed(&self) {
        self.set_style(source_style(LOADED_TEMPLATE));
        self.abandon_with_message("❌ not loaded");
    }
}

fn source_style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_spinner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indicatif::ProgressDrawTarget;

    fn hidden() -> MultiProgress {
        MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
    }

    #[test]
    fn loading_line_names_source_and_path() {
        let pb = hidden().start_loading("commits", "commits.json");
        assert_eq!(pb.prefix(), "commits");
        assert_eq!(pb.message(), "reading `commits.json`");
        pb.finish_loaded(3);
        assert!(pb.is_finished());
        assert_eq!(pb.message(), "✅ 3 records");
    }

    #[test]
    fn failed_load_is_abandoned() {
        let pb = hidden().start_loading("issues", "missing.json");
        pb.finish_failed();
        assert!(pb.is_finished());
        assert_eq!(pb.message(), "❌ not loaded");
    }
}
