//! 元数据解析
//!
//! 原生格式直接读原生编解码器的头部；WAV/FLAC头部可信，
//! MP3/Ogg在精确模式下通过完整解码计数。外部格式按格式表的优先级
//! 选用第一个已安装的后端；精确模式下样本数和时长来自同一个
//! 临时WAV中间文件，保证 `duration == samples / sampling_rate`。
//!
//! 零字节文件是确定的终止状态：声道数、样本数为0，时长为0.0，不报错。

use crate::audio::format::{FormatSpec, classify};
use crate::audio::info::AudioInfo;
use crate::audio::native::NATIVE_BACKEND;
use crate::backend::{Backend, Capability, HeaderField};
use crate::error::{self, AudioResult};
use crate::toolkit::AudioToolkit;
use std::path::Path;

/// 分类后的输入文件；零字节文件为None
fn open(path: &Path) -> AudioResult<Option<&'static FormatSpec>> {
    let spec = classify(path)?;
    let len = std::fs::metadata(path)?.len();
    Ok((len > 0).then_some(spec))
}

impl AudioToolkit {
    /// 第一个可用探测后端读取的头部字段
    fn header_value(
        &self,
        path: &Path,
        spec: &FormatSpec,
        field: HeaderField,
    ) -> AudioResult<(Backend, Option<f64>)> {
        let backend = self.first_backend(path, spec.backends, Capability::Probe)?;
        let value = backend.probe_field(self.ctx(), path, field)?;
        Ok((backend, value))
    }

    /// 必须存在且为正数的头部字段
    fn required_header(
        &self,
        path: &Path,
        spec: &FormatSpec,
        field: HeaderField,
    ) -> AudioResult<f64> {
        match self.header_value(path, spec, field)? {
            (_, Some(value)) if value > 0.0 => Ok(value),
            (backend, value) => Err(error::broken_file(
                path,
                backend.name(),
                format!("invalid {field:?} reported: {value:?}"),
            )),
        }
    }

    /// 精确元数据
    fn exact_info(&self, path: &Path, spec: &FormatSpec) -> AudioResult<AudioInfo> {
        if spec.is_native() {
            let header = self.codec().probe(path)?;
            let samples = match header.samples {
                Some(samples) if spec.header_exact => samples,
                _ => self.codec().count_samples(path)?,
            };
            return Ok(header.with_samples(samples));
        }

        let temp = self.transcode_to_wav(path, spec)?;
        let header = self.codec().probe(&temp)?;
        let samples = match header.samples {
            Some(samples) => samples,
            None => self.codec().count_samples(&temp)?,
        };
        Ok(AudioInfo::new(
            header.channels,
            header.sampling_rate,
            samples,
            None,
        ))
    }

    /// 声道数
    pub fn channels(&self, path: impl AsRef<Path>) -> AudioResult<u16> {
        let path = path.as_ref();
        let Some(spec) = open(path)? else {
            return Ok(0);
        };
        if spec.is_native() {
            return Ok(self.codec().probe(path)?.channels);
        }
        Ok(self.required_header(path, spec, HeaderField::Channels)? as u16)
    }

    /// 采样率 (Hz)；零字节文件没有采样率，返回 `BrokenFile`
    pub fn sampling_rate(&self, path: impl AsRef<Path>) -> AudioResult<u32> {
        let path = path.as_ref();
        let Some(spec) = open(path)? else {
            return Err(error::broken_file(path, NATIVE_BACKEND, "file is empty"));
        };
        if spec.is_native() {
            return Ok(self.codec().probe(path)?.sampling_rate);
        }
        Ok(self.required_header(path, spec, HeaderField::SamplingRate)? as u32)
    }

    /// 精确样本数（每声道）
    pub fn samples(&self, path: impl AsRef<Path>) -> AudioResult<u64> {
        let path = path.as_ref();
        match open(path)? {
            None => Ok(0),
            Some(spec) => Ok(self.exact_info(path, spec)?.samples),
        }
    }

    /// 头部记录的样本数，可能不精确；头部缺失时退回精确计数
    pub fn samples_sloppy(&self, path: impl AsRef<Path>) -> AudioResult<u64> {
        let path = path.as_ref();
        let Some(spec) = open(path)? else {
            return Ok(0);
        };

        if spec.is_native() {
            return match self.codec().probe(path)?.samples {
                Some(samples) => Ok(samples),
                None => self.codec().count_samples(path),
            };
        }

        if let (_, Some(samples)) = self.header_value(path, spec, HeaderField::Samples)? {
            return Ok(samples.round_ties_even() as u64);
        }
        if let (_, Some(duration)) = self.header_value(path, spec, HeaderField::Duration)? {
            let rate = self.required_header(path, spec, HeaderField::SamplingRate)?;
            return Ok((duration * rate).round_ties_even() as u64);
        }
        Ok(self.exact_info(path, spec)?.samples)
    }

    /// 精确时长（秒）
    pub fn duration(&self, path: impl AsRef<Path>) -> AudioResult<f64> {
        let path = path.as_ref();
        match open(path)? {
            None => Ok(0.0),
            Some(spec) => Ok(self.exact_info(path, spec)?.duration_seconds()),
        }
    }

    /// 头部记录的时长，可能不精确；头部缺失时退回精确计算
    pub fn duration_sloppy(&self, path: impl AsRef<Path>) -> AudioResult<f64> {
        let path = path.as_ref();
        let Some(spec) = open(path)? else {
            return Ok(0.0);
        };

        if spec.is_native() {
            let header = self.codec().probe(path)?;
            return match header.samples {
                Some(samples) => Ok(header.with_samples(samples).duration_seconds()),
                None => Ok(self.exact_info(path, spec)?.duration_seconds()),
            };
        }

        if let (_, Some(duration)) = self.header_value(path, spec, HeaderField::Duration)? {
            return Ok(duration);
        }
        if let (_, Some(samples)) = self.header_value(path, spec, HeaderField::Samples)? {
            let rate = self.required_header(path, spec, HeaderField::SamplingRate)?;
            return Ok(samples / rate);
        }
        Ok(self.exact_info(path, spec)?.duration_seconds())
    }

    /// 位深；有损格式、外部格式和零字节文件为None
    pub fn bit_depth(&self, path: impl AsRef<Path>) -> AudioResult<Option<u16>> {
        let path = path.as_ref();
        match open(path)? {
            Some(spec) if spec.is_native() => Ok(self.codec().probe(path)?.bit_depth),
            _ => Ok(None),
        }
    }

    /// 是否包含视频流；原生格式和零字节文件为false
    pub fn has_video(&self, path: impl AsRef<Path>) -> AudioResult<bool> {
        let path = path.as_ref();
        match open(path)? {
            Some(spec) if !spec.is_native() => {
                let backend = self.first_backend(path, spec.backends, Capability::VideoProbe)?;
                backend.has_video(self.ctx(), path)
            }
            _ => Ok(false),
        }
    }

    /// 完整的精确元数据记录
    ///
    /// 外部格式的声道数取自解码后的中间文件，与 `read` 返回的一致。
    pub fn info(&self, path: impl AsRef<Path>) -> AudioResult<AudioInfo> {
        let path = path.as_ref();
        match open(path)? {
            None => Ok(AudioInfo::empty()),
            Some(spec) => self.exact_info(path, spec),
        }
    }

    /// 仅由头部字段组成的元数据记录
    ///
    /// 样本数来自 `samples_sloppy`，外部格式只需探测后端，不会转码。
    pub fn info_sloppy(&self, path: impl AsRef<Path>) -> AudioResult<AudioInfo> {
        let path = path.as_ref();
        if open(path)?.is_none() {
            return Ok(AudioInfo::empty());
        }
        Ok(AudioInfo::new(
            self.channels(path)?,
            self.sampling_rate(path)?,
            self.samples_sloppy(path)?,
            self.bit_depth(path)?,
        ))
    }
}
