use std::rc::Rc;
use std::time::Duration;

use image::RgbaImage;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::capture::{CaptureTrigger, PhotoCapture, random_tilt};
use crate::clock::FrameClock;
use crate::constants::X_MAILER;
use crate::desktop::{DesktopSequencer, Key};
use crate::error::MailError;
use crate::mail::{Mail, SendGateway};
use crate::projection::ProjectionSequencer;
use crate::scene::Scene;
use crate::settings::Settings;
use crate::storage::PhotoStore;

/// Scenes for the two sequenced outputs of one tick.
pub struct StudioFrame {
    pub frame: u64,
    pub projection: Scene,
    pub desktop: Scene,
}

/// Owns every piece of installation state and runs one tick at a time:
/// capture check, then projection, then desktop.
pub struct Studio<S: PhotoStore, G: SendGateway> {
    settings: Settings,
    clock: FrameClock,
    trigger: CaptureTrigger,
    projection: ProjectionSequencer,
    desktop: DesktopSequencer,
    store: S,
    gateway: G,
    rng: StdRng,
    live: Option<RgbaImage>,
    photo: Option<Rc<PhotoCapture>>,
    serial: u64,
}

impl<S: PhotoStore, G: SendGateway> Studio<S, G> {
    pub fn new(settings: Settings, store: S, gateway: G) -> Self {
        Self {
            trigger: CaptureTrigger::new(settings.capture.debounce),
            projection: ProjectionSequencer::new(&settings),
            desktop: DesktopSequencer::new(&settings),
            clock: FrameClock::default(),
            settings,
            store,
            gateway,
            rng: StdRng::from_os_rng(),
            live: None,
            photo: None,
            serial: 0,
        }
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn frame(&self) -> u64 {
        self.clock.now()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn current_photo(&self) -> Option<&Rc<PhotoCapture>> {
        self.photo.as_ref()
    }

    /// Address typed so far, while the desktop interface is up.
    pub fn desktop_text(&self) -> Option<&str> {
        self.desktop.recipient()
    }

    pub fn desktop_leaving(&self) -> bool {
        self.desktop.is_leaving()
    }

    pub fn projection_active(&self) -> bool {
        self.projection.is_active()
    }

    pub fn desktop_active(&self) -> bool {
        self.desktop.is_active()
    }

    pub fn push_frame(&mut self, frame: RgbaImage) {
        self.live = Some(frame);
    }

    pub fn request_capture(&mut self) {
        self.trigger.request();
    }

    pub fn handle_key(&mut self, key: Key) {
        self.desktop.handle_key(key);
    }

    pub fn tick(&mut self, now: Duration) -> StudioFrame {
        let frame = self.clock.now();

        if self.trigger.take() {
            self.capture(frame, now);
        }

        let projection = self.projection.tick(frame);
        if projection.completed {
            if let Some(photo) = &self.photo {
                tracing::info!(frame, "desktop interface on");
                self.desktop.activate(frame, Rc::clone(photo));
            }
        }

        let desktop = self.desktop.tick(frame, &mut self.rng);
        if let Some(recipient) = desktop.send_to {
            self.dispatch(recipient);
        }

        self.clock.advance();

        StudioFrame {
            frame,
            projection: projection.scene,
            desktop: desktop.scene,
        }
    }

    /// Sends a plain message to the default recipient to check the gateway.
    pub fn send_test_mail(&mut self) {
        let mail = Mail::new(
            &self.settings.mail.sender,
            &self.settings.mail.default_recipient,
            "teeniestudio test",
            "Hello world!",
        )
        .header("X-Mailer", X_MAILER);
        tracing::info!(recipient = %mail.recipient, "sending test message");
        self.gateway.send(mail, Box::new(log_delivery));
    }

    /// An accepted capture restarts the projection from the flash, even
    /// mid-cycle.
    fn capture(&mut self, frame: u64, now: Duration) {
        let Some(live) = &self.live else {
            tracing::warn!(frame, "capture ignored, no video frame yet");
            return;
        };
        if !self.trigger.try_accept(now) {
            tracing::debug!(frame, "capture debounced");
            return;
        }

        let pixels = live.clone();
        match self.store.store(&pixels) {
            Ok(stored) => tracing::debug!(
                timestamped = %stored.timestamped.display(),
                latest = %stored.latest.display(),
                "photo stored"
            ),
            Err(e) => tracing::error!(error = %e, "photo not saved"),
        }

        self.serial += 1;
        let tilt = random_tilt(&mut self.rng, self.settings.capture.max_tilt);
        let photo = Rc::new(PhotoCapture {
            pixels,
            frame,
            tilt,
            serial: self.serial,
        });
        tracing::info!(frame, tilt, serial = self.serial, "photo taken");
        if self.projection.is_active() {
            tracing::debug!(frame, "projection restarted");
        }

        self.projection.start(frame, Rc::clone(&photo));
        self.photo = Some(photo);
    }

    fn dispatch(&mut self, recipient: String) {
        let mail_settings = &self.settings.mail;
        let mut mail = Mail::new(
            &mail_settings.sender,
            recipient,
            &mail_settings.subject,
            &mail_settings.body,
        )
        .header("X-Mailer", X_MAILER);

        let attachment = self.store.latest_path();
        if let Err(e) = mail.attach(&attachment) {
            tracing::error!(error = %e, "sending without attachment");
        }

        tracing::info!(recipient = %mail.recipient, "sending message");
        self.gateway.send(mail, Box::new(log_delivery));
    }
}

fn log_delivery(mail: &Mail, result: Result<(), MailError>) {
    match result {
        Ok(()) => tracing::info!(subject = %mail.subject, recipient = %mail.recipient, "message sent"),
        Err(e) => tracing::error!(subject = %mail.subject, error = %e, "message not sent"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StudioResult;
    use crate::mail::DeliveryReport;
    use crate::storage::StoredPhoto;
    use std::path::PathBuf;

    #[derive(Default)]
    struct MemoryStore {
        stored: usize,
        latest: PathBuf,
    }

    impl PhotoStore for MemoryStore {
        fn store(&mut self, _image: &RgbaImage) -> StudioResult<StoredPhoto> {
            self.stored += 1;
            Ok(StoredPhoto {
                timestamped: PathBuf::from(format!("memory/{}.png", self.stored)),
                latest: self.latest_path(),
            })
        }

        fn latest_path(&self) -> PathBuf {
            self.latest.clone()
        }
    }

    #[derive(Default)]
    struct RecordingGateway {
        sent: Vec<Mail>,
    }

    impl SendGateway for RecordingGateway {
        fn send(&mut self, mail: Mail, report: DeliveryReport) {
            report(&mail, Ok(()));
            self.sent.push(mail);
        }
    }

    type TestStudio = Studio<MemoryStore, RecordingGateway>;

    fn studio() -> TestStudio {
        let store = MemoryStore {
            stored: 0,
            latest: PathBuf::from("/definitely/not/here/~newphoto.jpg"),
        };
        let mut studio = Studio::new(Settings::default(), store, RecordingGateway::default())
            .with_rng(StdRng::seed_from_u64(11));
        studio.push_frame(RgbaImage::from_pixel(4, 3, image::Rgba([1, 2, 3, 255])));
        studio
    }

    fn now(studio: &TestStudio) -> Duration {
        Duration::from_millis(studio.frame() * 16)
    }

    fn tick_until(studio: &mut TestStudio, frame: u64) {
        while studio.frame() < frame {
            let at = now(studio);
            studio.tick(at);
        }
    }

    fn tick(studio: &mut TestStudio) -> StudioFrame {
        let at = now(studio);
        studio.tick(at)
    }

    #[test]
    fn capture_at_1000_hands_over_at_1380() {
        let mut studio = studio();
        tick_until(&mut studio, 1000);

        studio.request_capture();
        let first = tick(&mut studio);
        assert_eq!(first.frame, 1000);
        assert!(studio.projection_active());
        assert_eq!(studio.current_photo().unwrap().frame, 1000);
        assert_eq!(studio.store.stored, 1);

        tick_until(&mut studio, 1380);
        assert!(studio.projection_active());
        assert!(!studio.desktop_active());

        let handover = tick(&mut studio);
        assert_eq!(handover.frame, 1380);
        assert!(handover.projection.shows_live_feed());
        assert!(handover.projection.overlay().is_none());
        assert!(!studio.projection_active());
        assert!(studio.desktop_active());
        assert!(handover.desktop.photo_pose().is_some());
    }

    #[test]
    fn capture_without_video_is_dropped() {
        let mut studio = Studio::new(
            Settings::default(),
            MemoryStore::default(),
            RecordingGateway::default(),
        );
        studio.request_capture();
        tick(&mut studio);
        assert!(!studio.projection_active());
        assert!(studio.current_photo().is_none());
    }

    #[test]
    fn captures_are_debounced_by_wall_time() {
        let mut studio = studio();
        let ms = Duration::from_millis;

        studio.request_capture();
        studio.tick(ms(0));
        studio.request_capture();
        studio.tick(ms(400));
        assert_eq!(studio.store.stored, 1);
        assert_eq!(studio.current_photo().unwrap().serial, 1);

        studio.request_capture();
        studio.tick(ms(600));
        assert_eq!(studio.store.stored, 2);
        let photo = studio.current_photo().unwrap();
        assert_eq!((photo.serial, photo.frame), (2, 2));
    }

    #[test]
    fn capture_during_projection_restarts_it() {
        let mut studio = studio();
        studio.request_capture();
        tick(&mut studio);

        tick_until(&mut studio, 200);
        studio.request_capture();
        let restart = tick(&mut studio);
        assert_eq!(studio.current_photo().unwrap().serial, 2);
        assert_eq!(restart.projection.overlay().map(|c| c.a), Some(255));

        tick_until(&mut studio, 381);
        assert!(studio.projection_active());
        assert!(!studio.desktop_active());

        tick_until(&mut studio, 581);
        assert!(!studio.projection_active());
        assert!(studio.desktop_active());
    }

    #[test]
    fn tilts_stay_in_bounds_across_captures() {
        let mut studio = studio();
        for _ in 0..20 {
            studio.request_capture();
            tick(&mut studio);
            let tilt = studio.current_photo().unwrap().tilt;
            assert!((-15.0..=15.0).contains(&tilt));
            let until = studio.frame() + 381;
            tick_until(&mut studio, until);
        }
    }

    fn reach_desktop(studio: &mut TestStudio) {
        studio.request_capture();
        tick(studio);
        let until = studio.frame() + 380;
        tick_until(studio, until);
        assert!(studio.desktop_active());
    }

    #[test]
    fn confirmed_address_is_mailed_once() {
        let mut studio = studio();
        reach_desktop(&mut studio);

        for c in "visitor@example.com".chars() {
            studio.handle_key(Key::Char(c));
        }
        studio.handle_key(Key::Enter);
        let until = studio.frame() + 200;
        tick_until(&mut studio, until);

        let sent = &studio.gateway().sent;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "visitor@example.com");
        assert_eq!(sent[0].sender, "teeniestudio@gmail.com");
        assert_eq!(sent[0].subject, "Your Photo as Arrived!");
        assert!(sent[0].attachment.is_none());
        assert!(!studio.desktop_active());
    }

    #[test]
    fn empty_address_only_plays_the_exit() {
        let mut studio = studio();
        reach_desktop(&mut studio);

        studio.handle_key(Key::Enter);
        tick(&mut studio);
        let start = studio.frame();
        while studio.desktop_active() {
            tick(&mut studio);
        }
        assert_eq!(studio.frame() - start, 80);
        assert!(studio.gateway().sent.is_empty());
    }

    #[test]
    fn latest_photo_is_attached() {
        let dir = std::env::temp_dir().join(format!(
            "teeniestudio_attach_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let latest = dir.join("~newphoto.jpg");
        std::fs::write(&latest, b"jpeg bytes").unwrap();

        let mut studio = studio();
        studio.store.latest = latest;
        reach_desktop(&mut studio);
        for c in "visitor@example.com".chars() {
            studio.handle_key(Key::Char(c));
        }
        studio.handle_key(Key::Enter);
        tick(&mut studio);

        let sent = &studio.gateway().sent;
        assert_eq!(sent.len(), 1);
        let attachment = sent[0].attachment.as_ref().unwrap();
        assert_eq!(attachment.file_name, "~newphoto.jpg");
        assert_eq!(attachment.bytes, b"jpeg bytes");
        assert_eq!(sent[0].headers, vec![("X-Mailer".to_string(), "teeniestudio".to_string())]);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_mail_goes_to_the_default_recipient() {
        let mut studio = studio();
        studio.send_test_mail();
        assert_eq!(studio.gateway().sent[0].recipient, "teeniestudio@gmail.com");
    }
}
