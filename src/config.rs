//! 常量和外部工具配置集中管理
//!
//! 行为完全由调用参数决定，没有配置文件；这里只集中默认值，
//! 以及外部工具可执行文件的名称（允许通过环境变量覆盖）。

use crate::backend::Tool;
use std::path::{Path, PathBuf};

/// 默认值
pub mod defaults {
    /// 写文件时的默认位深
    pub const BIT_DEPTH: u16 = 16;

    /// 回退路径中间WAV文件的位深（32位浮点，避免二次量化）
    pub const INTERMEDIATE_BIT_DEPTH: u16 = 32;

    /// 临时文件名前缀
    pub const TEMP_PREFIX: &str = "audiofile";

    /// FLAC编码块大小（样本数）
    pub const FLAC_BLOCK_SIZE: usize = 4096;
}

/// 外部工具可执行文件配置
///
/// 默认直接使用PATH中的程序名；每个工具都可以通过环境变量指向其他位置：
/// `AUDIOFILE_SOX`、`AUDIOFILE_FFMPEG`、`AUDIOFILE_FFPROBE`、`AUDIOFILE_MEDIAINFO`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainConfig {
    sox: PathBuf,
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    mediainfo: PathBuf,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            sox: PathBuf::from(Tool::Sox.name()),
            ffmpeg: PathBuf::from(Tool::Ffmpeg.name()),
            ffprobe: PathBuf::from(Tool::Ffprobe.name()),
            mediainfo: PathBuf::from(Tool::MediaInfo.name()),
        }
    }
}

impl ToolchainConfig {
    /// 读取环境变量覆盖，未设置的工具保持默认程序名
    pub fn from_env() -> Self {
        let mut config = Self::default();
        for tool in Tool::ALL {
            if let Some(value) = std::env::var_os(tool.env_var())
                && !value.is_empty()
            {
                config = config.with_program(tool, value);
            }
        }
        config
    }

    /// 替换某个工具的可执行文件
    pub fn with_program(mut self, tool: Tool, program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        match tool {
            Tool::Sox => self.sox = program,
            Tool::Ffmpeg => self.ffmpeg = program,
            Tool::Ffprobe => self.ffprobe = program,
            Tool::MediaInfo => self.mediainfo = program,
        }
        self
    }

    /// 获取工具的可执行文件路径
    pub fn program(&self, tool: Tool) -> &Path {
        match tool {
            Tool::Sox => &self.sox,
            Tool::Ffmpeg => &self.ffmpeg,
            Tool::Ffprobe => &self.ffprobe,
            Tool::MediaInfo => &self.mediainfo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_programs_are_plain_names() {
        let config = ToolchainConfig::default();
        assert_eq!(config.program(Tool::Sox), Path::new("sox"));
        assert_eq!(config.program(Tool::Ffprobe), Path::new("ffprobe"));
    }

    #[test]
    fn test_with_program_overrides_single_tool() {
        let config = ToolchainConfig::default().with_program(Tool::Ffmpeg, "/opt/bin/ffmpeg");
        assert_eq!(config.program(Tool::Ffmpeg), Path::new("/opt/bin/ffmpeg"));
        assert_eq!(config.program(Tool::MediaInfo), Path::new("mediainfo"));
    }
}
