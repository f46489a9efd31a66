use indexmap::IndexMap;

const DEFAULT_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>New Project</title>
</head>
<body>

</body>
</html>"#;

/// The authoritative file map plus editor bookkeeping (open tabs, active
/// file). Insertion order is preserved for display.
///
/// Mutated only by direct edits, direct file management, and
/// [`crate::PendingChanges::apply`].
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    files: IndexMap<String, String>,
    open_files: Vec<String>,
    active_file: Option<String>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh project seeded with the conventional starter page, open and
    /// active.
    pub fn with_default_project(entry_point: &str) -> Self {
        let mut ws = Self::new();
        ws.set_file(entry_point, DEFAULT_PAGE);
        ws.open_file(entry_point);
        ws.set_active_file(entry_point);
        ws
    }

    pub fn get_file(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    /// Creates or overwrites a file (a direct user edit, or apply).
    pub fn set_file(&mut self, path: &str, content: &str) {
        self.files.insert(path.to_string(), content.to_string());
    }

    /// Removes a file and drops it from the open set; the active file falls
    /// back to the first remaining open file.
    pub fn delete_file(&mut self, path: &str) {
        self.files.shift_remove(path);
        self.open_files.retain(|p| p != path);
        if self.active_file.as_deref() == Some(path) {
            self.active_file = self.open_files.first().cloned();
        }
    }

    /// Adds a path to the open set if not already there.
    pub fn open_file(&mut self, path: &str) {
        if !self.open_files.iter().any(|p| p == path) {
            self.open_files.push(path.to_string());
        }
    }

    pub fn list_open_files(&self) -> &[String] {
        &self.open_files
    }

    pub fn set_active_file(&mut self, path: &str) {
        self.active_file = Some(path.to_string());
    }

    pub fn active_file(&self) -> Option<&str> {
        self.active_file.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Owned snapshot of every file, in display order; the shape the agent
    /// context builder takes.
    pub fn entries(&self) -> Vec<(String, String)> {
        self.files
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
