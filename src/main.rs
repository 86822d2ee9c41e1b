use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context as _;
use clap::Parser;
use raylib::prelude::*;

mod capture;
mod clock;
mod constants;
mod desktop;
mod engine;
mod error;
mod ffmpeg;
mod mail;
mod projection;
mod publish;
mod render;
mod scene;
mod settings;
mod state;
mod storage;
mod texture_loader;
mod video;

use crate::constants::*;
use crate::desktop::Key;
use crate::engine::Studio;
use crate::ffmpeg::Ffmpeg;
use crate::mail::{OutboxGateway, SendGateway};
use crate::publish::{Publishers, RecordTarget};
use crate::render::{DebugInfo, Renderer};
use crate::settings::Settings;
use crate::storage::DiskStore;
use crate::video::{StillSource, TestPattern, VideoSource};

#[derive(Parser, Debug)]
#[command(name = "teeniestudio", version, about = "Photo capture, wall projection and mail-out for the Teenie Studio")]
struct Cli {
    /// Use a still image as the live feed instead of the test pattern.
    #[arg(long)]
    still: Option<PathBuf>,

    /// Directory photos are saved into.
    #[arg(long, default_value = PHOTO_DIR)]
    photo_dir: PathBuf,

    /// Name the newest photo is also saved under (and attached from).
    #[arg(long, default_value = NEW_PHOTO_NAME)]
    latest_name: String,

    /// Directory outgoing messages are spooled into.
    #[arg(long, default_value = OUTBOX_DIR)]
    outbox: PathBuf,

    /// Stream a channel through ffmpeg, e.g. `projection=wall.mp4`. Repeatable.
    #[arg(long = "record", value_name = "CHANNEL=TARGET")]
    records: Vec<RecordTarget>,

    /// Start with the debug overlay shown.
    #[arg(long)]
    debug: bool,

    /// Queue a test message to the default recipient on startup.
    #[arg(long)]
    send_test: bool,

    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let mut settings = Settings::default();
    settings.storage.photo_dir = cli.photo_dir;
    settings.storage.latest_name = cli.latest_name;
    settings.storage.outbox_dir = cli.outbox;

    // --- Collaborators ---
    let mut source: Box<dyn VideoSource> = match &cli.still {
        Some(path) => Box::new(
            StillSource::open(path, settings.camera).with_context(|| format!("loading still {}", path.display()))?,
        ),
        None => Box::new(TestPattern::new(settings.camera)),
    };
    tracing::info!(source = %source.describe(), "video source");

    let store = DiskStore::new(&settings.storage.photo_dir, settings.storage.latest_name.as_str());
    let gateway = OutboxGateway::new(&settings.storage.outbox_dir)
        .with_context(|| format!("opening outbox {}", settings.storage.outbox_dir.display()))?;

    let mut studio = Studio::new(settings, store, gateway);
    if cli.send_test {
        studio.send_test_mail();
    }

    // --- Window ---
    let debug_canvas = studio.settings().debug_canvas;
    let (mut rl, thread) = raylib::init()
        .size(debug_canvas.width as i32, debug_canvas.height as i32)
        .title("Teenie Studio Debug")
        .vsync()
        .resizable()
        .build();
    rl.set_target_fps(FPS);
    rl.set_trace_log(TraceLogLevel::LOG_ERROR);
    rl.set_exit_key(None);

    let mut renderer =
        Renderer::new(&mut rl, &thread, studio.settings()).context("creating render textures")?;

    let mut publishers = Publishers::default();
    for record in &cli.records {
        let canvas = match record.channel {
            publish::Channel::Debug => studio.settings().debug_canvas,
            publish::Channel::Projection => studio.settings().projection_canvas,
            publish::Channel::Desktop => studio.settings().desktop_canvas,
        };
        let sink = Ffmpeg::spawn(record.channel, canvas, FPS, &record.target)
            .with_context(|| format!("starting ffmpeg for {}", record.channel))?;
        publishers.add(Box::new(sink));
    }
    if publishers.is_empty() {
        tracing::info!("no publishers, outputs only shown in the window");
    }

    let mut debug = cli.debug;
    let started = Instant::now();

    // --- Main Loop ---
    while !rl.window_should_close() {
        // --- Input ---
        if rl.is_key_pressed(KeyboardKey::KEY_F11) {
            rl.toggle_fullscreen();
        }
        if rl.is_key_pressed(KeyboardKey::KEY_F1) {
            debug = !debug;
        }
        if rl.is_key_pressed(KeyboardKey::KEY_UP) {
            studio.request_capture(); // take a new photo and start the sequence
        }
        while let Some(c) = rl.get_char_pressed() {
            studio.handle_key(Key::Char(c));
        }
        if rl.is_key_pressed(KeyboardKey::KEY_BACKSPACE) || rl.is_key_pressed(KeyboardKey::KEY_DELETE) {
            studio.handle_key(Key::Delete);
        }
        if rl.is_key_pressed(KeyboardKey::KEY_ENTER) || rl.is_key_pressed(KeyboardKey::KEY_KP_ENTER) {
            studio.handle_key(Key::Enter);
        }

        // --- Video ---
        if let Some(frame) = source.poll_frame() {
            if let Err(e) = renderer.update_live(&mut rl, &thread, &frame) {
                tracing::error!(error = %e, "live feed not updated");
            }
            studio.push_frame(frame);
        }

        // --- Sequencers ---
        let frame = studio.tick(started.elapsed());

        // --- Render ---
        if let Err(e) = renderer.render(&mut rl, &thread, &frame) {
            tracing::error!(frame = frame.frame, error = %e, "render failed");
        }

        let info = debug.then(|| DebugInfo {
            fps: rl.get_fps(),
            frame: frame.frame,
            outbox: studio.gateway().pending(),
            source: source.describe(),
            state: describe_state(&studio),
        });
        renderer.compose_debug(&mut rl, &thread, info.as_ref());

        publishers.publish_all(&renderer);
        renderer.present(&mut rl, &thread);
    }

    Ok(())
}

fn describe_state<S, G>(studio: &Studio<S, G>) -> String
where
    S: storage::PhotoStore,
    G: SendGateway,
{
    let photo = studio
        .current_photo()
        .map(|p| format!("photo #{} from frame {} tilt {:.1}", p.serial, p.frame, p.tilt))
        .unwrap_or_else(|| "no photo".to_string());

    let desktop = if !studio.desktop_active() {
        "desktop idle".to_string()
    } else if studio.desktop_leaving() {
        "desktop leaving".to_string()
    } else {
        format!("desktop typing '{}'", studio.desktop_text().unwrap_or_default())
    };

    let projection = if studio.projection_active() {
        "projection running"
    } else {
        "projection live"
    };

    format!("{photo}, {projection}, {desktop}")
}
