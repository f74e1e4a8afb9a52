use std::io;
use std::time::Duration;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use curtain::logging::{LogEvent, LogSink};
use curtain::{
    DiagnosticsConfig, Logger, LoggingResult, MediaSignal, MemorySession, PageBundleConfig,
    PageOptions, PageRuntime, ProgressPolicy, ProgressSimulator, ReadyState, Result, RuntimeEvent,
    TerminalRenderer, marketing_page_bundle, marketing_page_document,
};

#[derive(Clone, Default)]
struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _event: &LogEvent) -> LoggingResult<()> {
        Ok(())
    }
}

fn runtime_loader_to_reveal(c: &mut Criterion) {
    c.bench_function("runtime_loader_to_reveal", |b| {
        b.iter(|| {
            let mut runtime = build_runtime().expect("runtime");
            runtime.run_script(black_box(scripted_events())).expect("script");
            assert_eq!(runtime.reveal_count(), 1);
        });
    });
}

fn runtime_render_frames(c: &mut Criterion) {
    c.bench_function("runtime_render_frames", |b| {
        b.iter(|| {
            let mut runtime = build_runtime().expect("runtime");
            let mut renderer = TerminalRenderer::with_default();
            let mut sink = io::sink();
            runtime.start().expect("start");
            for _ in 0..120 {
                runtime.advance(Duration::from_millis(50)).expect("advance");
                if runtime.document().has_dirty() {
                    renderer
                        .render(&mut sink, runtime.document(), "bench")
                        .expect("render");
                    runtime.document_mut().take_dirty();
                }
            }
        });
    });
}

fn progress_simulator_fast_finish(c: &mut Criterion) {
    c.bench_function("progress_simulator_fast_finish", |b| {
        b.iter(|| {
            let mut simulator =
                ProgressSimulator::seeded(ProgressPolicy::default(), 17).expect("policy");
            while !simulator.is_complete() {
                simulator.tick(black_box(true));
            }
        });
    });
}

fn build_runtime() -> Result<PageRuntime> {
    let options = PageOptions::with_loader()
        .media(ReadyState::HaveMetadata, true)
        .location_hash("#services");
    let mut runtime = PageRuntime::new(marketing_page_document(&options)?);

    let logger = Logger::new(NullSink);
    {
        let config = runtime.config_mut();
        config.logger = Some(logger.clone());
        config.metrics_interval = Duration::from_millis(0);
        config.enable_metrics();
    }

    let bundle = marketing_page_bundle(
        PageBundleConfig {
            progress_seed: Some(7),
            diagnostics: Some(DiagnosticsConfig::new(logger)),
            ..PageBundleConfig::default()
        },
        MemorySession::new(),
    )?;
    runtime.register_bundle(bundle.plugins);
    Ok(runtime)
}

fn scripted_events() -> Vec<(Duration, RuntimeEvent)> {
    let ms = Duration::from_millis;
    vec![
        (ms(300), RuntimeEvent::Scroll { y: 40.0 }),
        (
            ms(1200),
            RuntimeEvent::Media {
                element: "hero-video".into(),
                signal: MediaSignal::CanPlayThrough,
            },
        ),
        (ms(2600), RuntimeEvent::Scroll { y: 900.0 }),
        (ms(3000), RuntimeEvent::Click("menu-toggle".into())),
        (ms(4000), RuntimeEvent::Scroll { y: 2100.0 }),
    ]
}

criterion_group!(
    benches,
    runtime_loader_to_reveal,
    runtime_render_frames,
    progress_simulator_fast_finish
);
criterion_main!(benches);
