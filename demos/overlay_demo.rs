//! Replays a caption file through an overlay session and prints what the
//! caption window would show.
//!
//! ```text
//! cargo run --example overlay_demo -- captions.vtt [config.json]
//! ```
//!
//! Set `DUALSUB_OFFLINE=1` to skip the translation service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::mpsc;

use dualsub::{
    logging, subtitle::parse_vtt_file, ChannelObserver, CompositeObserver, GoogleTranslateClient,
    LogObserver, OverlayConfig, OverlayEvent, OverlaySession, TranslationBackend,
    TranslationDisplay, WordMark,
};

/// Stand-in backend that upper-cases words
struct OfflineBackend;

#[async_trait]
impl TranslationBackend for OfflineBackend {
    async fn translate(&self, text: &str, target_lang: &str) -> dualsub::Result<String> {
        Ok(format!("{} [{}]", text.to_uppercase(), target_lang))
    }
}

fn describe(event: &OverlayEvent) -> Option<String> {
    match event {
        OverlayEvent::Render(state) if state.is_idle() => None,
        OverlayEvent::Render(state) => {
            let lines: Vec<String> = state
                .lines
                .iter()
                .map(|line| {
                    line.words
                        .iter()
                        .map(|word| match word.mark {
                            WordMark::Spoken => word.text.clone(),
                            WordMark::Active { progress } => {
                                format!("[{} {:>3.0}%]", word.text, progress * 100.0)
                            }
                            WordMark::Pending => "_".repeat(word.text.chars().count()),
                        })
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect();
            Some(format!("cue {:?}: {}", state.active_cue, lines.join(" | ")))
        }
        OverlayEvent::Translation(TranslationDisplay::Hidden) => Some("translation hidden".to_string()),
        OverlayEvent::Translation(TranslationDisplay::Shown { word, translation }) => {
            Some(format!("{} -> {}", word.text, translation))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logger();

    let mut args = std::env::args().skip(1);
    let vtt_path = args.next().context("usage: overlay_demo <captions.vtt> [config.json]")?;
    let config = match args.next() {
        Some(path) => OverlayConfig::from_json_file(&path)
            .with_context(|| format!("loading config from {}", path))?,
        None => OverlayConfig::default(),
    };
    config.validate()?;

    let cues = parse_vtt_file(&vtt_path).with_context(|| format!("reading {}", vtt_path))?;
    println!("Loaded {} cues from {}", cues.len(), vtt_path);
    let Some(end) = cues.iter().map(|cue| cue.end).reduce(f64::max) else {
        println!("Nothing to replay");
        return Ok(());
    };

    let backend: Arc<dyn TranslationBackend> = if std::env::var_os("DUALSUB_OFFLINE").is_some() {
        Arc::new(OfflineBackend)
    } else {
        Arc::new(GoogleTranslateClient::new(&config)?)
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut observer = CompositeObserver::new();
    observer.add_observer(Arc::new(LogObserver::with_prefix("[demo] ")));
    observer.add_observer(Arc::new(ChannelObserver::new(tx)));

    let session = OverlaySession::new(vtt_path.clone(), cues, backend, Arc::new(observer), &config);

    let printer = tokio::spawn(async move {
        let mut last = None;
        while let Some(event) = rx.recv().await {
            let Some(line) = describe(&event) else {
                continue;
            };
            if last.as_ref() != Some(&line) {
                println!("{}", line);
                last = Some(line);
            }
        }
    });

    // Replay at 4x speed, hovering the first word of every new cue
    let step = 0.25;
    let mut time = 0.0;
    let mut hovered_cue = None;
    while time <= end {
        let state = session.on_time_update(time);
        if state.active_cue.is_some() && state.active_cue != hovered_cue {
            hovered_cue = state.active_cue;
            session.hover_word_at(0, 0);
        }
        tokio::time::sleep(Duration::from_secs_f64(step / 4.0)).await;
        time += step;
    }

    session.hover_leave();
    session.teardown();
    drop(session);
    printer.await?;

    Ok(())
}
