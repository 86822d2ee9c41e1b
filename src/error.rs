pub type StudioResult<T> = Result<T, StudioError>;

#[derive(thiserror::Error, Debug)]
pub enum StudioError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("video error: {0}")]
    Video(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("publish error: {0}")]
    Publish(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StudioError {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn video(msg: impl Into<String>) -> Self {
        Self::Video(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn publish(msg: impl Into<String>) -> Self {
        Self::Publish(msg.into())
    }
}

/// Failures while building or delivering a message.
#[derive(thiserror::Error, Debug)]
pub enum MailError {
    #[error("attachment {path} could not be opened: {source}")]
    Attachment {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("gateway is shut down")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(StudioError::storage("x").to_string().contains("storage error:"));
        assert!(StudioError::video("x").to_string().contains("video error:"));
        assert!(StudioError::render("x").to_string().contains("render error:"));
        assert!(StudioError::publish("x").to_string().contains("publish error:"));
    }

    #[test]
    fn attachment_error_names_the_file() {
        let err = MailError::Attachment {
            path: "photos/~newphoto.jpg".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        let text = err.to_string();
        assert!(text.contains("photos/~newphoto.jpg"));
        assert!(text.contains("gone"));
    }
}
