//! 统一错误处理框架
//!
//! 所有公开操作只会返回四类可诊断错误（外加写入端的I/O错误）：
//! 文件不存在、缺少外部依赖、文件损坏、参数非法。

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 外部工具安装指南（跨平台）
pub const INSTALL_GUIDE: &str = "\
Installation / 安装方法:
  macOS:   brew install sox ffmpeg mediainfo
  Windows: winget install Gyan.FFmpeg  (sox/mediainfo: see their download pages)
  Linux:
    - Ubuntu/Debian: sudo apt install sox libsox-fmt-all ffmpeg mediainfo
    - Fedora/RHEL:   sudo dnf install sox ffmpeg mediainfo
    - Arch:          sudo pacman -S sox ffmpeg mediainfo";

/// 音频处理相关的统一错误类型
#[derive(Debug, Error)]
pub enum AudioError {
    /// 输入路径不存在或不可读
    #[error("File not found / 文件不存在: {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// 该格式需要外部工具，但候选工具均未安装
    #[error(
        "{} cannot be found, required to handle {} / 未找到所需外部工具\n{}",
        .tools.join(" or "),
        .path.display(),
        INSTALL_GUIDE
    )]
    MissingDependency { path: PathBuf, tools: Vec<String> },

    /// 已安装的后端被调用后无法解析/解码
    #[error(
        "Error opening {}: file contains data in an unknown format / 文件损坏或格式未知 ({backend}): {detail}",
        .path.display()
    )]
    BrokenFile {
        path: PathBuf,
        backend: String,
        detail: String,
    },

    /// 调用方参数非法
    #[error("Invalid argument / 参数非法: {0}")]
    InvalidArgument(String),

    /// 写入端文件I/O错误
    #[error("I/O error / 文件I/O错误: {0}")]
    Io(#[from] io::Error),
}

/// 音频处理操作的标准Result类型
pub type AudioResult<T> = Result<T, AudioError>;

// ==================== 错误构造Helper函数 ====================

/// 创建文件损坏错误
#[inline]
pub fn broken_file<E: fmt::Display>(path: &Path, backend: &str, detail: E) -> AudioError {
    AudioError::BrokenFile {
        path: path.to_path_buf(),
        backend: backend.to_string(),
        detail: detail.to_string(),
    }
}

/// 创建缺少依赖错误
#[inline]
pub fn missing_dependency<S: AsRef<str>>(path: &Path, tools: &[S]) -> AudioError {
    AudioError::MissingDependency {
        path: path.to_path_buf(),
        tools: tools.iter().map(|t| t.as_ref().to_string()).collect(),
    }
}

/// 创建参数非法错误
#[inline]
pub fn invalid_argument<M: Into<String>>(msg: M) -> AudioError {
    AudioError::InvalidArgument(msg.into())
}

// ==================== 错误分类系统 ====================

/// 错误类别枚举（用于CLI退出码和批量统计）
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum ErrorCategory {
    /// 路径或文件系统问题
    Io,
    /// 外部工具缺失
    Dependency,
    /// 文件内容损坏或格式未知
    Decoding,
    /// 调用参数问题
    Argument,
}

impl ErrorCategory {
    /// 从AudioError提取错误类别
    pub fn from_audio_error(e: &AudioError) -> Self {
        match e {
            AudioError::FileNotFound { .. } | AudioError::Io(_) => Self::Io,
            AudioError::MissingDependency { .. } => Self::Dependency,
            AudioError::BrokenFile { .. } => Self::Decoding,
            AudioError::InvalidArgument(_) => Self::Argument,
        }
    }

    /// 获取错误类别的显示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Io => "I/O错误",
            Self::Dependency => "缺少依赖",
            Self::Decoding => "解码错误",
            Self::Argument => "参数错误",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dependency_names_tools() {
        let err = missing_dependency(Path::new("a.m4a"), &["ffmpeg", "mediainfo"]);
        let msg = err.to_string();
        assert!(msg.contains("ffmpeg or mediainfo"));
        assert!(msg.contains("a.m4a"));
        assert_eq!(ErrorCategory::from_audio_error(&err), ErrorCategory::Dependency);
    }

    #[test]
    fn test_broken_file_keeps_context() {
        let err = broken_file(Path::new("x.opus"), "sox", "sox FAIL formats: can't open");
        let msg = err.to_string();
        assert!(msg.contains("x.opus"));
        assert!(msg.contains("sox"));
        assert!(msg.contains("can't open"));
        assert_eq!(ErrorCategory::from_audio_error(&err), ErrorCategory::Decoding);
    }

    #[test]
    fn test_io_error_conversion() {
        let err: AudioError = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, AudioError::Io(_)));
        assert_eq!(ErrorCategory::from_audio_error(&err).display_name(), "I/O错误");
    }
}
