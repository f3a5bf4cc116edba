//! audiofile - 统一的音频文件读写门面
//!
//! 对任意音频文件提供一致的元数据查询（声道数、采样率、样本数、时长、位深）、
//! 样本读取和写入接口。
//!
//! ## 核心特性
//! - WAV/FLAC/MP3/Ogg 由原生编解码器直接处理（hound / symphonia / flacenc）
//! - 其余格式按优先级回退到外部工具：sox > ffmpeg > mediainfo
//! - 精确模式保证 `duration == samples / sampling_rate`
//! - offset/duration 支持多种单位和负值（从末尾起算），所有路径选中的样本一致
//! - 外部工具可用性按进程缓存，可注入、可重置
//!
//! 顶层自由函数使用进程级默认 [`AudioToolkit`]；需要自定义执行器或
//! 编解码器时直接构造 `AudioToolkit`。

pub mod audio;
pub mod backend;
pub mod config;
pub mod error;
pub mod position;
pub mod reader;
mod resolver;
pub mod signal;
pub mod toolkit;
pub mod tools;
pub mod writer;

// 重新导出核心类型
pub use audio::{AudioInfo, FormatSpec, FormatTag, NativeCodec, SoundCodec, classify};
pub use backend::{Backend, Capability, CommandRunner, Tool, ToolOutput};
pub use error::{AudioError, AudioResult};
pub use position::{Position, SampleRange, Unit, to_sample_range};
pub use reader::ReadOptions;
pub use signal::{Dtype, Samples, Signal};
pub use toolkit::AudioToolkit;
pub use writer::{ConvertOptions, WriteOptions};

use std::path::{Path, PathBuf};

/// 外部工具是否已安装
pub fn has_tool(name: &str) -> bool {
    toolkit::global().has_tool(name)
}

/// 已安装工具提供的能力
pub fn tool_capabilities(name: &str) -> Vec<Capability> {
    toolkit::global().tool_capabilities(name)
}

/// 声道数
pub fn channels(path: impl AsRef<Path>) -> AudioResult<u16> {
    toolkit::global().channels(path)
}

/// 采样率 (Hz)
pub fn sampling_rate(path: impl AsRef<Path>) -> AudioResult<u32> {
    toolkit::global().sampling_rate(path)
}

/// 精确样本数
pub fn samples(path: impl AsRef<Path>) -> AudioResult<u64> {
    toolkit::global().samples(path)
}

/// 头部记录的样本数
pub fn samples_sloppy(path: impl AsRef<Path>) -> AudioResult<u64> {
    toolkit::global().samples_sloppy(path)
}

/// 精确时长（秒）
pub fn duration(path: impl AsRef<Path>) -> AudioResult<f64> {
    toolkit::global().duration(path)
}

/// 头部记录的时长（秒）
pub fn duration_sloppy(path: impl AsRef<Path>) -> AudioResult<f64> {
    toolkit::global().duration_sloppy(path)
}

/// 位深
pub fn bit_depth(path: impl AsRef<Path>) -> AudioResult<Option<u16>> {
    toolkit::global().bit_depth(path)
}

/// 是否包含视频流
pub fn has_video(path: impl AsRef<Path>) -> AudioResult<bool> {
    toolkit::global().has_video(path)
}

/// 完整的精确元数据
pub fn info(path: impl AsRef<Path>) -> AudioResult<AudioInfo> {
    toolkit::global().info(path)
}

/// 由头部字段组成的元数据，不转码外部文件
pub fn info_sloppy(path: impl AsRef<Path>) -> AudioResult<AudioInfo> {
    toolkit::global().info_sloppy(path)
}

/// 读取音频
pub fn read(path: impl AsRef<Path>, options: &ReadOptions) -> AudioResult<(Signal, u32)> {
    toolkit::global().read(path, options)
}

/// 写音频文件
pub fn write(
    path: impl AsRef<Path>,
    signal: &Signal,
    sampling_rate: u32,
    options: &WriteOptions,
) -> AudioResult<()> {
    toolkit::global().write(path, signal, sampling_rate, options)
}

/// 转换为WAV
pub fn convert_to_wav(path: impl AsRef<Path>, options: &ConvertOptions) -> AudioResult<PathBuf> {
    toolkit::global().convert_to_wav(path, options)
}
