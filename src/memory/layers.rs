//! 分层记忆：按层编号加载 memory/ 下的固定文件并拼接
//!
//! - 第 1 层 logic：推理与逻辑
//! - 第 2 层 concepts：概念
//! - 第 3 层 important details：重要细节
//! - 第 4 层 arbitrary：遗留 / 边界情况，仅在查询命中关键词时加载

use std::io;
use std::path::Path;

use crate::memory::loader::load_text_file;

/// 每次都会加载的层
pub const DEFAULT_LAYERS: [u8; 3] = [1, 2, 3];

/// 命中任一关键词（不区分大小写）时追加第 4 层
pub const ARBITRARY_LAYER_TRIGGERS: [&str; 4] = ["legacy", "old version", "deprecated", "edge case"];

/// 记忆层（编号 1–4，对应固定文件名）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemoryLayer {
    Logic,
    Concepts,
    ImportantDetails,
    Arbitrary,
}

impl MemoryLayer {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::Logic),
            2 => Some(Self::Concepts),
            3 => Some(Self::ImportantDetails),
            4 => Some(Self::Arbitrary),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        match self {
            Self::Logic => 1,
            Self::Concepts => 2,
            Self::ImportantDetails => 3,
            Self::Arbitrary => 4,
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Logic => "layer_1_logic.md",
            Self::Concepts => "layer_2_concepts.md",
            Self::ImportantDetails => "layer_3_important_details.md",
            Self::Arbitrary => "layer_4_arbitrary.md",
        }
    }
}

/// 根据用户查询决定要加载的层：固定 1–3，命中关键词再加 4
pub fn select_layers(query: &str) -> Vec<u8> {
    let mut layers = DEFAULT_LAYERS.to_vec();
    let lowered = query.to_lowercase();
    if ARBITRARY_LAYER_TRIGGERS.iter().any(|kw| lowered.contains(kw)) {
        layers.push(MemoryLayer::Arbitrary.id());
    }
    layers
}

/// 按给定顺序加载各层，非空内容加上 `=== Layer n Knowledge ===` 标题后以空行拼接
///
/// 未知编号静默忽略；没有任何内容时返回空串。
pub fn gather_memory(memory_dir: &Path, layer_ids: &[u8]) -> io::Result<String> {
    let mut blocks = Vec::new();
    for &id in layer_ids {
        let Some(layer) = MemoryLayer::from_id(id) else {
            tracing::debug!(layer = id, "unknown memory layer ignored");
            continue;
        };
        let content = load_text_file(&memory_dir.join(layer.file_name()))?;
        if content.is_empty() {
            continue;
        }
        tracing::debug!(layer = id, bytes = content.len(), "memory layer loaded");
        blocks.push(format!("=== Layer {} Knowledge ===\n{}\n", id, content));
    }
    Ok(blocks.join("\n"))
}
