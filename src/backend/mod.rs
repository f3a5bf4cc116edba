//! 外部工具后端
//!
//! 三种后端（sox / ffmpeg / mediainfo）是封闭的枚举变体。
//! 选择逻辑 [`select`] 是纯函数：格式表给出优先级顺序，
//! 可用性只决定跳过哪些；每个工具的参数和输出解析封装在各自子模块中。
//!
//! 错误映射规则：
//! - 工具未安装（spawn返回NotFound）→ `MissingDependency`
//! - 工具已安装但退出码非零或输出无法解析 → `BrokenFile`，不再尝试下一个后端

pub mod availability;
mod ffmpeg;
mod mediainfo;
pub mod runner;
mod sox;

pub use availability::ToolAvailability;
pub use runner::{CommandRunner, SystemRunner, ToolOutput};

use crate::config::ToolchainConfig;
use crate::error::{self, AudioResult};
use serde::Serialize;
use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::Path;
use tracing::debug;

/// 可执行程序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Sox,
    Ffmpeg,
    Ffprobe,
    MediaInfo,
}

impl Tool {
    pub const ALL: [Tool; 4] = [Tool::Sox, Tool::Ffmpeg, Tool::Ffprobe, Tool::MediaInfo];

    /// 默认程序名
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sox => "sox",
            Self::Ffmpeg => "ffmpeg",
            Self::Ffprobe => "ffprobe",
            Self::MediaInfo => "mediainfo",
        }
    }

    /// 覆盖程序路径的环境变量
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::Sox => "AUDIOFILE_SOX",
            Self::Ffmpeg => "AUDIOFILE_FFMPEG",
            Self::Ffprobe => "AUDIOFILE_FFPROBE",
            Self::MediaInfo => "AUDIOFILE_MEDIAINFO",
        }
    }

    /// 检测安装状态时使用的版本查询参数
    pub fn version_args(&self) -> &'static [&'static str] {
        match self {
            Self::Sox => &["--version"],
            Self::Ffmpeg | Self::Ffprobe => &["-version"],
            Self::MediaInfo => &["--Version"],
        }
    }

    /// 该程序提供的能力
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Self::Sox => &[Capability::Probe, Capability::Transcode],
            Self::Ffmpeg => &[Capability::Transcode],
            Self::Ffprobe | Self::MediaInfo => &[Capability::Probe, Capability::VideoProbe],
        }
    }

    /// 按程序名查找（大小写不敏感）
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 后端能力
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// 读取头部元数据
    Probe,
    /// 检测视频流
    VideoProbe,
    /// 转码（解码到中间WAV或编码输出）
    Transcode,
}

/// 外部后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Sox,
    Ffmpeg,
    MediaInfo,
}

/// 可从头部读取的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    Channels,
    SamplingRate,
    Samples,
    /// 秒
    Duration,
}

/// 转码目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscodeTarget {
    /// 32位浮点WAV中间文件；`sampling_rate` 为Some时显式指定输出采样率
    IntermediateWav { sampling_rate: Option<u32> },
    /// 编码为目标扩展名对应的格式
    Encode { codec: &'static str },
}

/// 调用外部工具所需的上下文
#[derive(Clone, Copy)]
pub struct BackendContext<'a> {
    pub runner: &'a dyn CommandRunner,
    pub config: &'a ToolchainConfig,
}

impl Backend {
    /// 后端名称（用于错误信息）
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sox => "sox",
            Self::Ffmpeg => "ffmpeg",
            Self::MediaInfo => "mediainfo",
        }
    }

    /// 提供某项能力的程序；不支持时为None
    pub fn tool_for(&self, capability: Capability) -> Option<Tool> {
        match (self, capability) {
            (Self::Sox, Capability::Probe | Capability::Transcode) => Some(Tool::Sox),
            (Self::Ffmpeg, Capability::Probe | Capability::VideoProbe) => Some(Tool::Ffprobe),
            (Self::Ffmpeg, Capability::Transcode) => Some(Tool::Ffmpeg),
            (Self::MediaInfo, Capability::Probe | Capability::VideoProbe) => {
                Some(Tool::MediaInfo)
            }
            _ => None,
        }
    }

    /// 读取单个头部字段；头部缺少该值时返回None
    pub fn probe_field(
        &self,
        ctx: BackendContext<'_>,
        path: &Path,
        field: HeaderField,
    ) -> AudioResult<Option<f64>> {
        match self {
            Self::Sox => sox::probe_field(ctx, path, field),
            Self::Ffmpeg => ffmpeg::probe_field(ctx, path, field),
            Self::MediaInfo => mediainfo::probe_field(ctx, path, field),
        }
    }

    /// 文件是否包含视频流
    pub fn has_video(&self, ctx: BackendContext<'_>, path: &Path) -> AudioResult<bool> {
        match self {
            Self::Ffmpeg => ffmpeg::has_video(ctx, path),
            Self::MediaInfo => mediainfo::has_video(ctx, path),
            Self::Sox => Ok(false),
        }
    }

    /// 转码 `input` → `output`
    pub fn transcode(
        &self,
        ctx: BackendContext<'_>,
        input: &Path,
        output: &Path,
        target: TranscodeTarget,
    ) -> AudioResult<()> {
        match self {
            Self::Sox => sox::transcode(ctx, input, output, target),
            Self::Ffmpeg => ffmpeg::transcode(ctx, input, output, target),
            Self::MediaInfo => Err(error::invalid_argument("mediainfo cannot transcode")),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 按格式表顺序筛选出具备能力且已安装的后端
pub fn select(
    backends: &[Backend],
    capability: Capability,
    is_installed: impl Fn(Tool) -> bool,
) -> Vec<Backend> {
    backends
        .iter()
        .copied()
        .filter(|backend| backend.tool_for(capability).is_some_and(&is_installed))
        .collect()
}

/// 本可以处理该能力的程序名（用于 `MissingDependency` 信息）
pub fn expected_tools(backends: &[Backend], capability: Capability) -> Vec<&'static str> {
    let mut tools: Vec<&'static str> = Vec::new();
    for tool in backends.iter().filter_map(|b| b.tool_for(capability)) {
        if !tools.contains(&tool.name()) {
            tools.push(tool.name());
        }
    }
    tools
}

/// 运行工具并把失败映射为统一错误
pub(crate) fn run_tool(
    ctx: BackendContext<'_>,
    tool: Tool,
    path: &Path,
    args: Vec<OsString>,
) -> AudioResult<ToolOutput> {
    let program = ctx.config.program(tool);
    debug!("运行 {} {:?}", program.display(), args);

    let output = ctx.runner.run(program, &args).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            error::missing_dependency(path, &[tool.name()])
        } else {
            error::broken_file(path, tool.name(), e)
        }
    })?;

    if !output.success() {
        let stderr = output.stderr_text();
        let detail = if stderr.trim().is_empty() {
            match output.status {
                Some(code) => format!("exit status {code}"),
                None => "terminated by signal".to_string(),
            }
        } else {
            stderr.trim().to_string()
        };
        return Err(error::broken_file(path, tool.name(), detail));
    }
    Ok(output)
}

/// 解析工具输出中的数值；空输出视为缺失
pub(crate) fn parse_number(
    path: &Path,
    tool: Tool,
    text: &str,
) -> AudioResult<Option<f64>> {
    let token = text
        .split(|c: char| c.is_whitespace() || c == '/')
        .find(|token| !token.is_empty());
    match token {
        None => Ok(None),
        Some(token) => token.parse::<f64>().map(Some).map_err(|_| {
            error::broken_file(path, tool.name(), format!("unparseable output: {:?}", text.trim()))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUDIO_TOOLS: &[Backend] = &[Backend::Sox, Backend::Ffmpeg, Backend::MediaInfo];

    #[test]
    fn test_select_keeps_table_order() {
        let all = select(AUDIO_TOOLS, Capability::Probe, |_| true);
        assert_eq!(all, AUDIO_TOOLS);

        let no_sox = select(AUDIO_TOOLS, Capability::Probe, |tool| tool != Tool::Sox);
        assert_eq!(no_sox, vec![Backend::Ffmpeg, Backend::MediaInfo]);
    }

    #[test]
    fn test_select_filters_by_capability() {
        let transcoders = select(AUDIO_TOOLS, Capability::Transcode, |_| true);
        assert_eq!(transcoders, vec![Backend::Sox, Backend::Ffmpeg]);

        let video = select(AUDIO_TOOLS, Capability::VideoProbe, |_| true);
        assert_eq!(video, vec![Backend::Ffmpeg, Backend::MediaInfo]);

        // ffmpeg的探测依赖ffprobe，而不是ffmpeg本身
        let probe = select(AUDIO_TOOLS, Capability::Probe, |tool| tool == Tool::Ffmpeg);
        assert!(probe.is_empty());
    }

    #[test]
    fn test_expected_tools_deduplicates() {
        assert_eq!(
            expected_tools(AUDIO_TOOLS, Capability::Probe),
            vec!["sox", "ffprobe", "mediainfo"]
        );
        assert_eq!(
            expected_tools(AUDIO_TOOLS, Capability::Transcode),
            vec!["sox", "ffmpeg"]
        );
    }

    #[test]
    fn test_parse_number() {
        let path = Path::new("a.opus");
        assert_eq!(parse_number(path, Tool::Sox, "48000\n").unwrap(), Some(48000.0));
        assert_eq!(parse_number(path, Tool::MediaInfo, "2 / 6\n").unwrap(), Some(2.0));
        assert_eq!(parse_number(path, Tool::Sox, "  \n").unwrap(), None);
        assert!(parse_number(path, Tool::Sox, "garbage").is_err());
    }

    #[test]
    fn test_tool_lookup() {
        assert_eq!(Tool::from_name("FFmpeg"), Some(Tool::Ffmpeg));
        assert_eq!(Tool::from_name("lame"), None);
        assert!(Tool::Ffprobe.capabilities().contains(&Capability::VideoProbe));
    }
}
