use serde::{Deserialize, Serialize};

mod types;

pub use types::{ChangeSet, FileAction, FileOperation};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub backend: BackendCfg,
    #[serde(default)]
    pub project: ProjectCfg,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendCfg {
    pub kind: String,
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectCfg {
    /// Conventional entry-point file, used as the target when the generator
    /// answers with a raw document instead of a structured change-set.
    #[serde(default = "default_entry_point")]
    pub entry_point: String,
}

impl Default for ProjectCfg {
    fn default() -> Self {
        Self {
            entry_point: default_entry_point(),
        }
    }
}

fn default_entry_point() -> String {
    "index.html".to_string()
}

/// Events emitted by one agent turn, consumable by any frontend
/// (the CLI prints them as JSONL in `--json` mode).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    StreamText {
        text: String,
    },
    Staged {
        files: usize,
        additions: usize,
        deletions: usize,
    },
    Applied {
        files: Vec<String>,
    },
    Discarded,
    Error {
        message: String,
    },
    Info {
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_parses_without_project_section() {
        let toml = "[backend]\nkind='openai_like'\nbase_url='http://localhost:11434/v1'\nmodel='qwen'\napi_key=''\n";
        let cfg: Config = toml::from_str(toml).unwrap();
        assert_eq!(cfg.project.entry_point, "index.html");
    }

    #[test]
    fn session_event_is_tagged() {
        let ev = SessionEvent::Staged {
            files: 2,
            additions: 5,
            deletions: 1,
        };
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains("\"type\":\"staged\""));
    }
}
