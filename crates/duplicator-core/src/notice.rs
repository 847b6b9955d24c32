use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warn,
    Error,
}

/// Side effects the editor asks its presentation layer to perform.
///
/// The editor never touches a browser tab or console itself. It queues these, and whatever hosts
/// it drains them with [`crate::Editor::take_notices`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Notice {
    /// Use `href` as the session icon (the favicon, in a browser).
    Icon { href: String },
    Diagnostic { level: NoticeLevel, message: String },
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self::Diagnostic {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Diagnostic {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}
