//! Failure classification
//!
//! Maps transport statuses to the user-visible notice that accompanies a
//! failed request. Pure data, no I/O.

/// Kind of user-visible failure notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    SessionExpired,
    Forbidden,
    NotFound,
    InternalServerError,
    NoResponse,
    RequestFailed,
}

/// Statuses with a dedicated notice; everything else is `RequestFailed`
pub const STATUS_TABLE: &[(u16, NoticeKind)] = &[
    (401, NoticeKind::SessionExpired),
    (403, NoticeKind::Forbidden),
    (404, NoticeKind::NotFound),
    (500, NoticeKind::InternalServerError),
];

impl NoticeKind {
    pub const ALL: [NoticeKind; 6] = [
        NoticeKind::SessionExpired,
        NoticeKind::Forbidden,
        NoticeKind::NotFound,
        NoticeKind::InternalServerError,
        NoticeKind::NoResponse,
        NoticeKind::RequestFailed,
    ];

    /// Message shown to the user
    pub fn template(&self) -> &'static str {
        match self {
            NoticeKind::SessionExpired => "Session expired, please log in again",
            NoticeKind::Forbidden => "You do not have permission to access this resource",
            NoticeKind::NotFound => "The requested resource does not exist",
            NoticeKind::InternalServerError => "Internal server error",
            NoticeKind::NoResponse => {
                "No response from server, please check your network connection"
            }
            NoticeKind::RequestFailed => "Request failed",
        }
    }

    pub fn for_status(status: u16) -> NoticeKind {
        STATUS_TABLE
            .iter()
            .find(|(code, _)| *code == status)
            .map(|(_, kind)| *kind)
            .unwrap_or(NoticeKind::RequestFailed)
    }

    /// Message for a failed transport status. Statuses without a dedicated
    /// notice prefer the backend's own message when the body carried one.
    pub fn status_message(status: u16, body_message: Option<&str>) -> String {
        let kind = Self::for_status(status);
        match (kind, body_message) {
            (NoticeKind::RequestFailed, Some(message)) if !message.trim().is_empty() => {
                message.to_string()
            }
            _ => kind.template().to_string(),
        }
    }
}

impl std::fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.template())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_table() {
        assert_eq!(NoticeKind::for_status(401), NoticeKind::SessionExpired);
        assert_eq!(NoticeKind::for_status(403), NoticeKind::Forbidden);
        assert_eq!(NoticeKind::for_status(404), NoticeKind::NotFound);
        assert_eq!(NoticeKind::for_status(500), NoticeKind::InternalServerError);
        assert_eq!(NoticeKind::for_status(502), NoticeKind::RequestFailed);
        assert_eq!(NoticeKind::for_status(418), NoticeKind::RequestFailed);
    }

    #[test]
    fn test_templates_are_distinct() {
        let mut templates: Vec<_> = NoticeKind::ALL.iter().map(|k| k.template()).collect();
        templates.sort();
        templates.dedup();
        assert_eq!(templates.len(), NoticeKind::ALL.len());
    }

    #[test]
    fn test_status_message_fallbacks() {
        assert_eq!(
            NoticeKind::status_message(409, Some("Username already taken")),
            "Username already taken"
        );
        assert_eq!(NoticeKind::status_message(409, Some("  ")), "Request failed");
        assert_eq!(NoticeKind::status_message(409, None), "Request failed");
        // dedicated statuses ignore the body
        assert_eq!(
            NoticeKind::status_message(403, Some("nope")),
            NoticeKind::Forbidden.template()
        );
    }
}
