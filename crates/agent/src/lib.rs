use anyhow::{Context, Result};
use atelier_backend_openai::{LlmBackend, OpenAiLike};
use atelier_common::{ChangeSet, Config};

pub mod parse;
pub mod stream;
pub mod turn;

pub use turn::{Turn, TurnGate};

/// Instructs the generator to answer as a JSON object with `message` first,
/// so the streaming preview can surface it before the file payload arrives.
const SYSTEM_PROMPT: &str = r#"You are Atelier, an AI coding assistant built into a code workspace. You can chat and work with multiple files.

Respond in valid JSON with this exact structure:
{
  "message": "Your conversational response. ALWAYS include this, and put it FIRST.",
  "fileChanges": [
    {
      "path": "relative/path.ext",
      "action": "create | modify | delete",
      "content": "The COMPLETE file content (for create/modify). Omit for delete."
    }
  ]
}

Rules:
- Always include "message": explain what you changed and why, answer questions, or just chat.
- Include "fileChanges" only when the user asks to create, modify, or fix code; omit it entirely otherwise.
- For "create" and "modify", "content" must be the complete file, not a fragment.
- You may change multiple files in one reply.
- Do NOT wrap the JSON in markdown code fences. Return only the raw JSON object."#;

pub struct Agent {
    cfg: Config,
    llm: Box<dyn LlmBackend>,
}

impl Agent {
    pub fn new(cfg: Config) -> Self {
        let llm = OpenAiLike::new(cfg.clone());
        Self {
            cfg,
            llm: Box::new(llm),
        }
    }

    /// Swaps the backend; used by tests and alternative providers.
    pub fn with_backend(cfg: Config, llm: Box<dyn LlmBackend>) -> Self {
        Self { cfg, llm }
    }

    /// One non-streaming turn: full reply, then the single authoritative
    /// parse.
    pub async fn chat(&self, prompt: &str, files: &[(String, String)]) -> Result<ChangeSet> {
        let user = build_user_message(prompt, files);
        let raw = self
            .llm
            .chat(SYSTEM_PROMPT, &user)
            .await
            .context("generator call failed")?;
        Ok(parse::parse_change_set(&raw, &self.cfg.project.entry_point))
    }

    /// One streaming turn. `on_preview` receives the best-known display text
    /// after each fragment, in arrival order; the change-set parse still runs
    /// exactly once, on the complete buffer.
    pub async fn chat_stream(
        &self,
        prompt: &str,
        files: &[(String, String)],
        on_preview: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<ChangeSet> {
        let user = build_user_message(prompt, files);
        let mut forward = |accumulated: &str| {
            let preview = stream::live_preview(accumulated);
            on_preview(&preview);
        };
        let raw = self
            .llm
            .chat_stream(SYSTEM_PROMPT, &user, &mut forward)
            .await
            .context("generator call failed")?;
        Ok(parse::parse_change_set(&raw, &self.cfg.project.entry_point))
    }
}

/// Embeds every project file so the generator sees the full context.
fn build_user_message(prompt: &str, files: &[(String, String)]) -> String {
    let file_context = if files.is_empty() {
        "(No files in the project yet)".to_string()
    } else {
        files
            .iter()
            .map(|(name, content)| format!("--- File: {name} ---\n{content}\n--- End of {name} ---"))
            .collect::<Vec<_>>()
            .join("\n\n")
    };
    format!("## Current Project Files\n{file_context}\n\n## User Message\n{prompt}")
}
