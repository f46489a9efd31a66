use serde::{Deserialize, Serialize};

/// What a single proposed operation does to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
    Create,
    Modify,
    Delete,
}

impl FileAction {
    /// Lenient parse from generator output; anything unrecognized is `None`.
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim() {
            "create" => Some(Self::Create),
            "modify" => Some(Self::Modify),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// One proposed file change. `content` is present for create/modify and
/// absent for delete; a missing content on create/modify applies as "".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOperation {
    pub path: String,
    pub action: FileAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// A completed generator turn: a conversational message plus zero or more
/// file operations awaiting review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub message: String,
    pub operations: Vec<FileOperation>,
}

impl ChangeSet {
    pub fn conversational(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            operations: Vec::new(),
        }
    }

    pub fn has_code_change(&self) -> bool {
        !self.operations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_labels_round_trip() {
        assert_eq!(FileAction::from_label("create"), Some(FileAction::Create));
        assert_eq!(FileAction::from_label(" delete "), Some(FileAction::Delete));
        assert_eq!(FileAction::from_label("rename"), None);
    }

    #[test]
    fn conversational_set_has_no_code_change() {
        let cs = ChangeSet::conversational("hi");
        assert!(!cs.has_code_change());
    }
}
