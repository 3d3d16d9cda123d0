use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of an issue on the canvas. Negative values mark an issue that
/// has not been saved yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(pub i64);

impl IssueId {
    pub const NEW: IssueId = IssueId(-1);

    pub fn is_created(self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentEntry {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
}

impl CommentEntry {
    pub fn author_label(&self) -> &str {
        self.author
            .as_ref()
            .map(|author| author.username.as_str())
            .unwrap_or("Unknown")
    }
}

/// Point on the canvas, in cells from the canvas origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnchorPosition {
    pub top: u16,
    pub left: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    pub position: AnchorPosition,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub comments: Vec<CommentEntry>,
}

impl Issue {
    pub fn new_at(position: AnchorPosition) -> Self {
        Self {
            id: IssueId::NEW,
            position,
            resolved: false,
            comments: Vec::new(),
        }
    }

    pub fn push_comment(&mut self, author: &str, message: &str, created: DateTime<Utc>) {
        let id = self
            .comments
            .iter()
            .map(|comment| comment.id)
            .max()
            .unwrap_or(0)
            + 1;
        let author = if author.trim().is_empty() {
            None
        } else {
            Some(Author {
                username: author.to_string(),
            })
        };
        self.comments.push(CommentEntry {
            id,
            author,
            message: message.to_string(),
            created_date: Some(created),
        });
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{AnchorPosition, CommentEntry, Issue, IssueId};

    #[test]
    fn negative_ids_are_not_created() {
        assert!(!IssueId::NEW.is_created());
        assert!(IssueId(0).is_created());
        assert!(IssueId(12).is_created());
    }

    #[test]
    fn missing_author_falls_back_to_unknown() {
        let comment = CommentEntry {
            id: 1,
            author: None,
            message: "hi".to_string(),
            created_date: None,
        };
        assert_eq!(comment.author_label(), "Unknown");
    }

    #[test]
    fn push_comment_appends_with_next_id() {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut issue = Issue::new_at(AnchorPosition { top: 2, left: 4 });
        issue.push_comment("alice", "first", created);
        issue.push_comment("", "second", created);

        assert_eq!(issue.comments.len(), 2);
        assert_eq!(issue.comments[0].id, 1);
        assert_eq!(issue.comments[1].id, 2);
        assert_eq!(issue.comments[0].author_label(), "alice");
        assert_eq!(issue.comments[1].author_label(), "Unknown");
        assert_eq!(issue.comments[1].created_date, Some(created));
    }

    #[test]
    fn deserializes_sparse_comment() {
        let issue: Issue = serde_json::from_str(
            r#"{"id": 3, "position": {"top": 1, "left": 2}, "comments": [{"id": 1, "message": "hi"}]}"#,
        )
        .expect("parse issue");
        assert_eq!(issue.id, IssueId(3));
        assert!(!issue.resolved);
        assert_eq!(issue.comments[0].author, None);
        assert_eq!(issue.comments[0].created_date, None);
    }
}
