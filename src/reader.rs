//! 样本读取
//!
//! offset/duration 总是相对于精确的总样本数归一化（见 [`crate::position`]），
//! 外部格式先完整转码为临时WAV，再对解码结果开窗，
//! 不依赖任何外部工具自身的seek参数。

use crate::audio::format::classify;
use crate::audio::native::NATIVE_BACKEND;
use crate::error::{self, AudioResult};
use crate::position::{Position, to_sample_range};
use crate::signal::{Dtype, Signal};
use crate::toolkit::AudioToolkit;
use std::path::Path;

/// 读取参数
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReadOptions {
    pub offset: Option<Position>,
    pub duration: Option<Position>,
    /// 单声道也返回 `[1, samples]`
    pub always_2d: bool,
    pub dtype: Dtype,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(mut self, offset: impl Into<Position>) -> Self {
        self.offset = Some(offset.into());
        self
    }

    pub fn duration(mut self, duration: impl Into<Position>) -> Self {
        self.duration = Some(duration.into());
        self
    }

    pub fn always_2d(mut self, always_2d: bool) -> Self {
        self.always_2d = always_2d;
        self
    }

    pub fn dtype(mut self, dtype: Dtype) -> Self {
        self.dtype = dtype;
        self
    }
}

impl AudioToolkit {
    /// 读取音频，返回 (信号, 采样率)
    pub fn read(
        &self,
        path: impl AsRef<Path>,
        options: &ReadOptions,
    ) -> AudioResult<(Signal, u32)> {
        let path = path.as_ref();
        let spec = classify(path)?;
        if std::fs::metadata(path)?.len() == 0 {
            return Err(error::broken_file(path, NATIVE_BACKEND, "file is empty"));
        }

        if spec.is_native() {
            return self.read_native(path, spec.header_exact, options);
        }

        // 临时文件在本函数返回（或展开）时删除
        let temp = self.transcode_to_wav(path, spec)?;
        self.read_native(&temp, true, options)
    }

    fn read_native(
        &self,
        path: &Path,
        header_exact: bool,
        options: &ReadOptions,
    ) -> AudioResult<(Signal, u32)> {
        let codec = self.codec();

        let decoded = if header_exact {
            let header = codec.probe(path)?;
            let total = match header.samples {
                Some(samples) => samples,
                None => codec.count_samples(path)?,
            };
            let range =
                to_sample_range(total, header.sampling_rate, options.offset, options.duration)?;
            codec.decode(path, range.start, Some(range.end))?
        } else {
            let decoded = codec.decode(path, 0, None)?;
            let range = to_sample_range(
                decoded.frames() as u64,
                decoded.sampling_rate,
                options.offset,
                options.duration,
            )?;
            decoded.window(range.start, range.end)
        };

        let signal = Signal::from_interleaved(
            &decoded.interleaved,
            decoded.channels as usize,
            options.always_2d,
            options.dtype,
        );
        Ok((signal, decoded.sampling_rate))
    }
}
