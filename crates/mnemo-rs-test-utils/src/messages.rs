use mnemo_rs_memory::Message;
use uuid::Uuid;

/// Unique conversation id so tests never share keys.
pub fn fresh_conversation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Assistant, assistant, user, system turns tagged with the conversation id.
pub fn sample_conversation(conversation_id: &str) -> Vec<Message> {
    vec![
        Message::assistant(format!("Message from assistant 1 - {conversation_id}")),
        Message::assistant(format!("Message from assistant 2 - {conversation_id}")),
        Message::user(format!("Message from user - {conversation_id}")),
        Message::system(format!("Message from system - {conversation_id}")),
    ]
}
