/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Parse a `media_type=path` pair from the command line.
pub fn parse_input_pair(raw: &str) -> Result<(String, std::path::PathBuf), String> {
    match raw.split_once('=') {
        Some((media_type, path)) if !media_type.is_empty() && !path.is_empty() => {
            Ok((media_type.to_string(), std::path::PathBuf::from(path)))
        }
        _ => Err(format!(
            "expected media_type=path (e.g. movies=movies_data.json), got '{raw}'"
        )),
    }
}
