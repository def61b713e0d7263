/// Crate targets that receive log output.
const CRATE_TARGETS: &[&str] = &["pvtk", "parallel_vtk_writer"];

/// Initialize logging based on CLI verbosity level.
///
/// - 0 (none) -> info, so the name of the writer routine is always shown
/// - 1 (-v)   -> debug
/// - 2+ (-vv) -> trace
///
/// `RUST_LOG` overrides the CLI flag if set.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let default_filter: String = CRATE_TARGETS
        .iter()
        .map(|t| format!("{t}={level}"))
        .collect::<Vec<_>>()
        .join(",");

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}
