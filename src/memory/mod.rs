//! 记忆层：消息模型、文本加载、分层静态记忆（每次调用重新加载，不做缓存）

pub mod layers;
pub mod loader;
pub mod message;

pub use layers::{gather_memory, select_layers, MemoryLayer, ARBITRARY_LAYER_TRIGGERS, DEFAULT_LAYERS};
pub use loader::load_text_file;
pub use message::{Message, Role};
