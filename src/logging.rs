use tracing_subscriber::EnvFilter;

/// ログ出力の初期化（stderrへ出力、RUST_LOG が優先）
pub fn init(verbose: bool) {
    let default_directive = if verbose {
        "outfit_ai=debug,outfit_ai_common=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // 二重初期化（テストなど）は無視する
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
