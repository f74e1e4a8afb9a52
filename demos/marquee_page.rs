//! Terminal rendition of the landing page.
//!
//! ```text
//! cargo run --example marquee_page -- [--config page.json] [--fresh] [--hash services]
//! ```
//!
//! Press `r` to let the hero video finish buffering, arrows to scroll, `m`
//! for the menu, `b` to submit the booking form, `q` to quit. Structured
//! logs go to `curtain-demo.log` in the temp directory.

use std::env;
use std::fs;
use std::path::PathBuf;

use curtain::{
    CliDriver, CliDriverError, DiagnosticsConfig, FileSession, FileSink, Logger, PageBundleConfig,
    PageConfig, PageOptions, PageRuntime, ReadyState, RuntimeConfig, marketing_page_bundle,
    marketing_page_document,
};

struct Args {
    config: Option<PathBuf>,
    fresh: bool,
    hash: Option<String>,
}

fn parse_args() -> Args {
    let mut args = Args {
        config: None,
        fresh: false,
        hash: None,
    };
    let mut raw = env::args().skip(1);
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--config" => args.config = raw.next().map(PathBuf::from),
            "--fresh" => args.fresh = true,
            "--hash" => args.hash = raw.next().map(|hash| format!("#{hash}")),
            other => eprintln!("ignoring unknown argument `{other}`"),
        }
    }
    args
}

fn main() -> Result<(), CliDriverError> {
    let args = parse_args();
    let page = match &args.config {
        Some(path) => PageConfig::from_path(path).map_err(curtain::CurtainError::from)?,
        None => PageConfig::default(),
    };

    let state_dir = env::temp_dir().join("curtain-demo");
    let session_path = state_dir.join("session.json");
    if args.fresh {
        fs::remove_file(&session_path).ok();
    }
    fs::create_dir_all(&state_dir)?;

    let sink = FileSink::new(state_dir.join("curtain-demo.log"), 1 << 20)
        .map_err(|err| CliDriverError::Terminal(err.to_string()))?;
    let logger = Logger::new(sink);

    let mut options = PageOptions::with_loader().media(ReadyState::HaveMetadata, true);
    options.location_hash = args.hash;
    let document = marketing_page_document(&options)?;

    let mut config = RuntimeConfig::default();
    config.logger = Some(logger.clone());
    config.enable_metrics();
    let mut runtime = PageRuntime::with_config(document, config);

    let bundle = marketing_page_bundle(
        PageBundleConfig {
            page,
            diagnostics: Some(DiagnosticsConfig::new(logger)),
            ..PageBundleConfig::default()
        },
        FileSession::new(&session_path),
    )?;
    runtime.register_bundle(bundle.plugins);

    CliDriver::new(runtime).with_status(bundle.status).run()
}
