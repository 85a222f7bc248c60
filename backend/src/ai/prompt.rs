//! Message building for the recommendation service.

use serde_json::{json, Value};

/// Fixed system instruction sent with every prompt.
pub const SYSTEM_INSTRUCTION: &str = "Eres un asistente útil.";

/// Build the chat messages: the fixed system instruction, then the user prompt.
pub fn build_messages(prompt: &str) -> Value {
    json!([
        { "role": "system", "content": SYSTEM_INSTRUCTION },
        { "role": "user", "content": prompt }
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_order() {
        let messages = build_messages("Hola");
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], SYSTEM_INSTRUCTION);
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "Hola");
    }
}
