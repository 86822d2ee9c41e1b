use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

use serde::Serialize;

use crate::error::{MailError, StudioError, StudioResult};

#[derive(Debug, Clone, Serialize)]
pub struct Attachment {
    pub file_name: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl Attachment {
    /// Reads the file now, so later writes to `path` don't change the message.
    pub fn from_path(path: &Path) -> Result<Self, MailError> {
        let bytes = fs::read(path).map_err(|source| MailError::Attachment {
            path: path.display().to_string(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        Ok(Self { file_name, bytes })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Mail {
    pub sender: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub headers: Vec<(String, String)>,
    pub attachment: Option<Attachment>,
}

impl Mail {
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
            headers: Vec::new(),
            attachment: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn attach(&mut self, path: &Path) -> Result<(), MailError> {
        self.attachment = Some(Attachment::from_path(path)?);
        Ok(())
    }
}

/// Called once per message from whatever thread finished with it.
pub type DeliveryReport = Box<dyn FnOnce(&Mail, Result<(), MailError>) + Send>;

/// Hands messages to something that delivers them. `send` must not block
/// the render loop.
pub trait SendGateway {
    fn send(&mut self, mail: Mail, report: DeliveryReport);

    /// Messages accepted but not yet reported.
    fn pending(&self) -> usize {
        0
    }
}

type Job = (Mail, DeliveryReport);

/// Spools each message into an outbox directory from a worker thread: a JSON
/// envelope plus the attachment bytes. A relay outside the installation picks
/// them up and talks SMTP.
pub struct OutboxGateway {
    queue: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    pending: Arc<AtomicUsize>,
}

impl OutboxGateway {
    pub fn new(dir: impl Into<PathBuf>) -> StudioResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let (queue, jobs) = mpsc::channel::<Job>();
        let pending = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&pending);

        let worker = std::thread::Builder::new()
            .name("outbox".to_string())
            .spawn(move || {
                let mut spooled = 0usize;
                for (mail, report) in jobs {
                    spooled += 1;
                    let result = spool(&dir, spooled, &mail);
                    counter.fetch_sub(1, Ordering::SeqCst);
                    report(&mail, result);
                }
            })
            .map_err(StudioError::Io)?;

        Ok(Self {
            queue: Some(queue),
            worker: Some(worker),
            pending,
        })
    }
}

impl SendGateway for OutboxGateway {
    fn send(&mut self, mail: Mail, report: DeliveryReport) {
        let Some(queue) = &self.queue else {
            report(&mail, Err(MailError::Closed));
            return;
        };
        self.pending.fetch_add(1, Ordering::SeqCst);
        if let Err(mpsc::SendError((mail, report))) = queue.send((mail, report)) {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            report(&mail, Err(MailError::Closed));
        }
    }

    fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

impl Drop for OutboxGateway {
    fn drop(&mut self) {
        // Closing the queue lets the worker drain what is left and exit.
        self.queue = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("outbox worker panicked");
            }
        }
    }
}

fn spool(dir: &Path, index: usize, mail: &Mail) -> Result<(), MailError> {
    let stem = format!(
        "{}-{index}",
        chrono::Local::now().format("%Y%m%d-%H%M%S-%3f")
    );

    if let Some(attachment) = &mail.attachment {
        let path = dir.join(format!("{stem}-{}", attachment.file_name));
        fs::write(&path, &attachment.bytes)
            .map_err(|e| MailError::Delivery(format!("{}: {e}", path.display())))?;
    }

    let envelope = serde_json::to_vec_pretty(mail)
        .map_err(|e| MailError::Delivery(format!("envelope: {e}")))?;
    let path = dir.join(format!("{stem}.json"));
    fs::write(&path, envelope)
        .map_err(|e| MailError::Delivery(format!("{}: {e}", path.display())))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "teeniestudio_{name}_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
    }

    #[test]
    fn missing_attachment_is_an_error() {
        let mut mail = Mail::new("a@b", "c@d", "s", "b");
        let err = mail.attach(Path::new("/definitely/not/here.jpg")).unwrap_err();
        assert!(matches!(err, MailError::Attachment { .. }));
        assert!(mail.attachment.is_none());
    }

    #[test]
    fn attachment_bytes_are_read_eagerly() {
        let dir = temp_dir("attach_eager");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("~newphoto.jpg");
        fs::write(&path, b"first").unwrap();

        let mut mail = Mail::new("a@b", "c@d", "s", "b");
        mail.attach(&path).unwrap();
        fs::write(&path, b"second").unwrap();

        let attachment = mail.attachment.unwrap();
        assert_eq!(attachment.file_name, "~newphoto.jpg");
        assert_eq!(attachment.bytes, b"first");
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn outbox_spools_envelope_and_attachment() {
        let dir = temp_dir("outbox_spool");
        let source = temp_dir("outbox_source");
        fs::create_dir_all(&source).unwrap();
        let photo = source.join("~newphoto.jpg");
        fs::write(&photo, b"jpeg").unwrap();

        let mut mail = Mail::new("studio@example.com", "visitor@example.com", "Hi", "Enjoy!")
            .header("X-Mailer", "teeniestudio");
        mail.attach(&photo).unwrap();

        let (done, reports) = mpsc::channel();
        {
            let mut gateway = OutboxGateway::new(&dir).unwrap();
            gateway.send(
                mail,
                Box::new(move |mail, result| {
                    done.send((mail.subject.clone(), result.is_ok())).unwrap();
                }),
            );
        }

        assert_eq!(reports.recv().unwrap(), ("Hi".to_string(), true));

        let mut names: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names.len(), 2);
        assert!(names.iter().any(|n| n.ends_with("-1-~newphoto.jpg")));

        let envelope = names.iter().find(|n| n.ends_with(".json")).unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&fs::read(dir.join(envelope)).unwrap()).unwrap();
        assert_eq!(json["recipient"], "visitor@example.com");
        assert_eq!(json["attachment"]["file_name"], "~newphoto.jpg");
        assert_eq!(json["headers"][0][0], "X-Mailer");

        fs::remove_dir_all(&dir).ok();
        fs::remove_dir_all(&source).ok();
    }
}
