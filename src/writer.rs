//! 写文件与格式转换
//!
//! WAV/FLAC由原生编码器直接写；MP3/Ogg先原生写临时WAV，
//! 再交给第一个已安装的外部编码器（sox > ffmpeg）。

use crate::audio::format::{FormatSpec, FormatTag, spec_for_path};
use crate::audio::native::EncodeRequest;
use crate::backend::{Capability, TranscodeTarget};
use crate::config::defaults;
use crate::error::{self, AudioResult};
use crate::position::Position;
use crate::reader::ReadOptions;
use crate::signal::Signal;
use crate::toolkit::AudioToolkit;
use std::path::{Path, PathBuf};
use tracing::info;

/// 写入参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    pub bit_depth: u16,
    /// 写入前按峰值绝对值归一化
    pub normalize: bool,
    /// 输出格式；None时由扩展名决定
    pub format: Option<FormatTag>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            bit_depth: defaults::BIT_DEPTH,
            normalize: false,
            format: None,
        }
    }
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bit_depth(mut self, bit_depth: u16) -> Self {
        self.bit_depth = bit_depth;
        self
    }

    pub fn normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn format(mut self, format: FormatTag) -> Self {
        self.format = Some(format);
        self
    }
}

/// `convert_to_wav` 参数
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    /// 输出路径；None时为输入路径换成 `.wav` 扩展名
    pub output: Option<PathBuf>,
    pub offset: Option<Position>,
    pub duration: Option<Position>,
    pub bit_depth: u16,
    pub normalize: bool,
    /// 为false时拒绝覆盖输入文件
    pub overwrite: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            output: None,
            offset: None,
            duration: None,
            bit_depth: defaults::BIT_DEPTH,
            normalize: false,
            overwrite: true,
        }
    }
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn offset(mut self, offset: impl Into<Position>) -> Self {
        self.offset = Some(offset.into());
        self
    }

    pub fn duration(mut self, duration: impl Into<Position>) -> Self {
        self.duration = Some(duration.into());
        self
    }

    pub fn bit_depth(mut self, bit_depth: u16) -> Self {
        self.bit_depth = bit_depth;
        self
    }

    pub fn normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// 校验写入参数，返回交错样本
fn validate(
    spec: &FormatSpec,
    signal: &Signal,
    sampling_rate: u32,
    options: &WriteOptions,
) -> AudioResult<Vec<f64>> {
    let Some(max_channels) = spec.max_channels else {
        return Err(error::invalid_argument(format!(
            "cannot write '{}' files, supported: wav, flac, mp3, ogg",
            spec.tag
        )));
    };
    if sampling_rate == 0 {
        return Err(error::invalid_argument("sampling rate must be positive"));
    }

    let channels = signal.channels();
    if channels == 0 {
        return Err(error::invalid_argument("signal has no channels"));
    }
    if channels > max_channels {
        let hint = if spec.tag == FormatTag::Wav {
            ""
        } else {
            " Consider using 'wav' instead."
        };
        return Err(error::invalid_argument(format!(
            "the maximum number of allowed channels for '{}' is {max_channels}.{hint}",
            spec.tag
        )));
    }

    // 外部编码格式的位深作用于中间WAV
    let depths = if spec.native_encode {
        spec.write_bit_depths
    } else {
        FormatTag::Wav.spec().write_bit_depths
    };
    if !depths.contains(&options.bit_depth) {
        let allowed: Vec<String> = depths.iter().map(u16::to_string).collect();
        return Err(error::invalid_argument(format!(
            "bit depth for '{}' has to be one of {}",
            spec.tag,
            allowed.join(", ")
        )));
    }

    let interleaved = signal.to_interleaved();
    if interleaved.iter().any(|s| !s.is_finite()) {
        return Err(error::invalid_argument("signal contains NaN or infinite values"));
    }
    Ok(interleaved)
}

/// 按峰值绝对值归一化；全零信号保持不变
fn normalize_peak(samples: &mut [f64]) {
    let peak = samples.iter().fold(0.0f64, |peak, s| peak.max(s.abs()));
    if peak > 0.0 {
        samples.iter_mut().for_each(|s| *s /= peak);
    }
}

impl AudioToolkit {
    /// 写音频文件
    pub fn write(
        &self,
        path: impl AsRef<Path>,
        signal: &Signal,
        sampling_rate: u32,
        options: &WriteOptions,
    ) -> AudioResult<()> {
        let path = path.as_ref();
        let spec = match options.format {
            Some(tag) => tag.spec(),
            None => spec_for_path(path),
        };

        let mut interleaved = validate(spec, signal, sampling_rate, options)?;
        if options.normalize {
            normalize_peak(&mut interleaved);
        }

        let request = EncodeRequest {
            format: spec.tag,
            sampling_rate,
            bit_depth: options.bit_depth,
            channels: signal.channels() as u16,
            interleaved: &interleaved,
        };

        if spec.native_encode {
            return self.codec().encode(path, &request);
        }

        let backend = self.first_backend(path, spec.backends, Capability::Transcode)?;
        let codec = spec.encoder_codec.ok_or_else(|| {
            error::invalid_argument(format!("no encoder configured for '{}'", spec.tag))
        })?;

        let temp = self.temp_wav()?;
        self.codec().encode(
            &temp,
            &EncodeRequest {
                format: FormatTag::Wav,
                ..request
            },
        )?;
        info!("编码 {} ({backend})", path.display());
        backend.transcode(self.ctx(), &temp, path, TranscodeTarget::Encode { codec })
    }

    /// 转换为WAV：严格等价于先 `read` 再 `write`
    pub fn convert_to_wav(
        &self,
        path: impl AsRef<Path>,
        options: &ConvertOptions,
    ) -> AudioResult<PathBuf> {
        let path = path.as_ref();
        let output = options
            .output
            .clone()
            .unwrap_or_else(|| path.with_extension(FormatTag::Wav.extension()));

        if !options.overwrite && same_file(path, &output)? {
            return Err(error::invalid_argument(format!(
                "'{}' would be overwritten, set overwrite or provide an output path",
                path.display()
            )));
        }

        let read_options = ReadOptions {
            offset: options.offset,
            duration: options.duration,
            ..ReadOptions::default()
        };
        let (signal, sampling_rate) = self.read(path, &read_options)?;

        let write_options = WriteOptions {
            bit_depth: options.bit_depth,
            normalize: options.normalize,
            format: Some(FormatTag::Wav),
        };
        self.write(&output, &signal, sampling_rate, &write_options)?;
        Ok(output)
    }
}

/// 输出是否指向输入本身（经符号链接与 `..` 解析）
fn same_file(input: &Path, output: &Path) -> AudioResult<bool> {
    if output == input {
        return Ok(true);
    }
    if !input.exists() || !output.exists() {
        return Ok(false);
    }
    Ok(std::fs::canonicalize(input)? == std::fs::canonicalize(output)?)
}
