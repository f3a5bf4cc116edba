//! 音频格式与原生编解码模块
//!
//! - [`format`]: 扩展名 → 格式描述表
//! - [`native`]: 原生编解码器接口及默认实现
//! - [`info`]: 元数据记录

mod encoder;
pub mod format;
pub mod info;
pub mod native;

pub use format::{FORMAT_TABLE, FormatSpec, FormatTag, classify};
pub use info::{AudioInfo, StreamHeader};
pub use native::{DecodedAudio, EncodeRequest, NativeCodec, SoundCodec};
