// Cross-cutting prompt fragments. Each domain that calls the LLM keeps its
// own prompt templates next to it.

/// System message sent with every chat-completion request.
pub const JSON_ONLY_SYSTEM: &str = "Return ONLY valid JSON. No markdown. No extra text.";
