//! 格式分类模块
//!
//! 文件扩展名 → 格式描述表。表格是唯一的修改点：
//! 新增格式或调整回退顺序只需要改 [`FORMAT_TABLE`]。
//!
//! 扩展名是唯一依据，不做内容嗅探；扩展名错误的文件会被错误路由，
//! 这是已知限制。

use crate::backend::Backend;
use crate::error::{AudioError, AudioResult};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// 格式标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatTag {
    Wav,
    Flac,
    Mp3,
    Ogg,
    Aiff,
    Au,
    Opus,
    Mp4,
    Matroska,
    Other,
}

impl FormatTag {
    /// 写文件时使用的标准扩展名
    pub fn extension(&self) -> &'static str {
        self.spec().extensions.first().copied().unwrap_or("")
    }

    /// 对应的格式描述
    pub fn spec(&self) -> &'static FormatSpec {
        FORMAT_TABLE
            .iter()
            .find(|spec| spec.tag == *self)
            .unwrap_or(&OTHER)
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Other => "other",
            tag => tag.extension(),
        };
        f.write_str(name)
    }
}

/// 格式描述（分类表的一行）
#[derive(Debug)]
pub struct FormatSpec {
    pub tag: FormatTag,
    /// 小写扩展名，第一个为标准扩展名
    pub extensions: &'static [&'static str],
    /// 原生编解码器能否直接解码
    pub native_decode: bool,
    /// 原生编解码器能否直接编码
    pub native_encode: bool,
    /// 头部记录的样本数是否可信（不可信时精确模式强制完整解码计数）
    pub header_exact: bool,
    /// 外部后端优先级（从高到低）
    pub backends: &'static [Backend],
    /// ffmpeg转码时需要显式指定原始采样率（ffmpeg会把opus解码为48kHz）
    pub force_sampling_rate: bool,
    /// 写入时允许的最大声道数（None表示不可写）
    pub max_channels: Option<usize>,
    /// 写入时允许的位深（空表示位深由编码器决定）
    pub write_bit_depths: &'static [u16],
    /// 外部编码时ffmpeg使用的编码器
    pub encoder_codec: Option<&'static str>,
}

impl FormatSpec {
    /// 是否走原生快速路径
    #[inline]
    pub fn is_native(&self) -> bool {
        self.native_decode
    }

    /// 是否为支持写入的格式
    #[inline]
    pub fn is_writable(&self) -> bool {
        self.max_channels.is_some()
    }
}

const AUDIO_TOOLS: &[Backend] = &[Backend::Sox, Backend::Ffmpeg, Backend::MediaInfo];
const CONTAINER_TOOLS: &[Backend] = &[Backend::Ffmpeg, Backend::MediaInfo];
const ENCODERS: &[Backend] = &[Backend::Sox, Backend::Ffmpeg];

static OTHER: FormatSpec = FormatSpec {
    tag: FormatTag::Other,
    extensions: &[],
    native_decode: false,
    native_encode: false,
    header_exact: false,
    backends: CONTAINER_TOOLS,
    force_sampling_rate: false,
    max_channels: None,
    write_bit_depths: &[],
    encoder_codec: None,
};

/// 格式分类表
pub static FORMAT_TABLE: &[FormatSpec] = &[
    FormatSpec {
        tag: FormatTag::Wav,
        extensions: &["wav", "wave"],
        native_decode: true,
        native_encode: true,
        header_exact: true,
        backends: &[],
        force_sampling_rate: false,
        max_channels: Some(65535),
        write_bit_depths: &[8, 16, 24, 32],
        encoder_codec: None,
    },
    FormatSpec {
        tag: FormatTag::Flac,
        extensions: &["flac"],
        native_decode: true,
        native_encode: true,
        header_exact: true,
        backends: &[],
        force_sampling_rate: false,
        max_channels: Some(8),
        write_bit_depths: &[8, 16, 24],
        encoder_codec: None,
    },
    FormatSpec {
        tag: FormatTag::Mp3,
        extensions: &["mp3"],
        native_decode: true,
        native_encode: false,
        header_exact: false,
        backends: ENCODERS,
        force_sampling_rate: false,
        max_channels: Some(2),
        write_bit_depths: &[],
        encoder_codec: Some("libmp3lame"),
    },
    FormatSpec {
        tag: FormatTag::Ogg,
        extensions: &["ogg", "oga"],
        native_decode: true,
        native_encode: false,
        header_exact: false,
        backends: ENCODERS,
        force_sampling_rate: false,
        max_channels: Some(255),
        write_bit_depths: &[],
        encoder_codec: Some("libvorbis"),
    },
    FormatSpec {
        tag: FormatTag::Aiff,
        extensions: &["aiff", "aif", "aifc"],
        native_decode: false,
        native_encode: false,
        header_exact: false,
        backends: AUDIO_TOOLS,
        force_sampling_rate: false,
        max_channels: None,
        write_bit_depths: &[],
        encoder_codec: None,
    },
    FormatSpec {
        tag: FormatTag::Au,
        extensions: &["au", "snd"],
        native_decode: false,
        native_encode: false,
        header_exact: false,
        backends: AUDIO_TOOLS,
        force_sampling_rate: false,
        max_channels: None,
        write_bit_depths: &[],
        encoder_codec: None,
    },
    FormatSpec {
        tag: FormatTag::Opus,
        extensions: &["opus"],
        native_decode: false,
        native_encode: false,
        header_exact: false,
        backends: AUDIO_TOOLS,
        force_sampling_rate: true,
        max_channels: None,
        write_bit_depths: &[],
        encoder_codec: None,
    },
    FormatSpec {
        tag: FormatTag::Mp4,
        extensions: &["mp4", "m4a", "aac", "mov", "3gp"],
        native_decode: false,
        native_encode: false,
        header_exact: false,
        backends: CONTAINER_TOOLS,
        force_sampling_rate: false,
        max_channels: None,
        write_bit_depths: &[],
        encoder_codec: None,
    },
    FormatSpec {
        tag: FormatTag::Matroska,
        extensions: &["mkv", "mka", "webm"],
        native_decode: false,
        native_encode: false,
        header_exact: false,
        backends: CONTAINER_TOOLS,
        force_sampling_rate: false,
        max_channels: None,
        write_bit_depths: &[],
        encoder_codec: None,
    },
];

/// 小写扩展名（无扩展名时为空字符串）
pub fn file_extension(path: &Path) -> String {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default()
}

/// 仅根据扩展名查表，不检查文件是否存在
pub fn spec_for_path(path: &Path) -> &'static FormatSpec {
    let ext = file_extension(path);
    FORMAT_TABLE
        .iter()
        .find(|spec| spec.extensions.contains(&ext.as_str()))
        .unwrap_or(&OTHER)
}

/// 对输入文件分类
///
/// 文件必须存在且可读取元数据，否则返回 `FileNotFound`。
pub fn classify(path: &Path) -> AudioResult<&'static FormatSpec> {
    if std::fs::metadata(path).is_err() {
        return Err(AudioError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(spec_for_path(path))
}
