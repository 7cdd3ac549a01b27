use std::path::Path;

/// Splits `LABEL=PATH`; a bare path is labelled by its file stem.
pub fn labelled_path(arg: &str) -> (String, &str) {
    match arg.split_once('=') {
        Some((label, path)) => (label.trim().to_string(), path),
        None => {
            let stem = Path::new(arg).file_stem().and_then(|stem| stem.to_str());
            (stem.unwrap_or(arg).to_string(), arg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_is_explicit_or_the_file_stem() {
        assert_eq!(labelled_path("gitlab=out/patterns.json"), ("gitlab".to_string(), "out/patterns.json"));
        assert_eq!(
            labelled_path("consolidated/descriptionPatternBitbucket.json"),
            ("descriptionPatternBitbucket".to_string(), "consolidated/descriptionPatternBitbucket.json")
        );
    }
}
