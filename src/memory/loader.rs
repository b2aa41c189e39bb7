//! 文本加载：读取整个文件为 UTF-8 字符串
//!
//! 文件不存在视为「没有内容」，返回空串而不是错误；其余 I/O 错误照常向上传递。

use std::io;
use std::path::Path;

/// 读取文件全部内容；路径不存在时返回 `Ok(String::new())`
pub fn load_text_file(path: &Path) -> io::Result<String> {
    match std::fs::read_to_string(path) {
        Ok(s) => Ok(s),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "file not found, treating as empty");
            Ok(String::new())
        }
        Err(e) => Err(e),
    }
}
