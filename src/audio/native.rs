//! 原生编解码器
//!
//! 原生格式（WAV/FLAC/MP3/Ogg）不经过任何外部工具：
//! WAV优先用hound（更快、可精确seek），失败时回退到symphonia；
//! 其余格式统一用symphonia解码。编码见 [`super::encoder`]。

use super::encoder;
use super::format::{FormatTag, spec_for_path};
use super::info::StreamHeader;
use crate::error::{self, AudioResult};
use std::path::Path;
use tracing::warn;

/// 错误信息中使用的后端名称
pub const NATIVE_BACKEND: &str = "native";

/// 解码结果（交错排列，归一化到[-1.0, 1.0)）
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub sampling_rate: u32,
    pub channels: u16,
    pub interleaved: Vec<f64>,
}

impl DecodedAudio {
    /// 每声道帧数
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.interleaved.len() / self.channels as usize
        }
    }

    /// 截取 `[start, end)` 帧窗口（越界自动截断）
    pub fn window(mut self, start: u64, end: u64) -> Self {
        let channels = self.channels as usize;
        let frames = self.frames() as u64;
        let start = start.min(frames) as usize;
        let end = (end.min(frames) as usize).max(start);
        self.interleaved.truncate(end * channels);
        self.interleaved.drain(..start * channels);
        self
    }
}

/// 编码请求
#[derive(Debug, Clone, Copy)]
pub struct EncodeRequest<'a> {
    pub format: FormatTag,
    pub sampling_rate: u32,
    pub bit_depth: u16,
    pub channels: u16,
    /// 交错排列的样本
    pub interleaved: &'a [f64],
}

/// 原生编解码器接口
///
/// 只对格式表中 `native_decode` / `native_encode` 为真的格式调用。
pub trait NativeCodec: Send + Sync {
    /// 读取流头部（快速，不解码音频数据）
    fn probe(&self, path: &Path) -> AudioResult<StreamHeader>;

    /// 完整解码计数，返回精确的每声道样本数
    fn count_samples(&self, path: &Path) -> AudioResult<u64>;

    /// 解码 `[start, end)` 帧；`end` 为None时读到文件末尾
    fn decode(&self, path: &Path, start: u64, end: Option<u64>) -> AudioResult<DecodedAudio>;

    /// 写文件
    fn encode(&self, path: &Path, request: &EncodeRequest<'_>) -> AudioResult<()>;
}

/// 基于hound/symphonia/flacenc的默认实现
#[derive(Debug, Default, Clone, Copy)]
pub struct SoundCodec;

impl SoundCodec {
    fn is_wav(path: &Path) -> bool {
        spec_for_path(path).tag == FormatTag::Wav
    }
}

impl NativeCodec for SoundCodec {
    fn probe(&self, path: &Path) -> AudioResult<StreamHeader> {
        if Self::is_wav(path) {
            match probe_with_hound(path) {
                Ok(header) => return Ok(header),
                Err(e) => warn!("hound探测失败，使用symphonia后备: {}: {e}", path.display()),
            }
        }
        probe_with_symphonia(path)
    }

    fn count_samples(&self, path: &Path) -> AudioResult<u64> {
        if Self::is_wav(path)
            && let Ok(header) = probe_with_hound(path)
            && let Some(samples) = header.samples
        {
            return Ok(samples);
        }
        let (_, frames, _) = decode_with_symphonia(path, 0, None, false)?;
        Ok(frames)
    }

    fn decode(&self, path: &Path, start: u64, end: Option<u64>) -> AudioResult<DecodedAudio> {
        if Self::is_wav(path) {
            match decode_with_hound(path, start, end) {
                Ok(audio) => return Ok(audio),
                Err(e) => warn!("hound解码失败，使用symphonia后备: {}: {e}", path.display()),
            }
        }
        let (header, _, interleaved) = decode_with_symphonia(path, start, end, true)?;
        Ok(DecodedAudio {
            sampling_rate: header.sampling_rate,
            channels: header.channels,
            interleaved,
        })
    }

    fn encode(&self, path: &Path, request: &EncodeRequest<'_>) -> AudioResult<()> {
        let depths = request.format.spec().write_bit_depths;
        if !depths.is_empty() && !depths.contains(&request.bit_depth) {
            return Err(error::invalid_argument(format!(
                "bit depth {} is not supported for '{}' (expected one of {depths:?}) / 不支持的位深",
                request.bit_depth, request.format
            )));
        }
        match request.format {
            FormatTag::Wav => encoder::encode_wav(path, request),
            FormatTag::Flac => encoder::encode_flac(path, request),
            other => Err(error::invalid_argument(format!(
                "native encoder cannot write '{other}' / 原生编码器不支持该格式"
            ))),
        }
    }
}

// ==================== hound（WAV快速路径） ====================

fn probe_with_hound(path: &Path) -> Result<StreamHeader, hound::Error> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    Ok(StreamHeader {
        channels: spec.channels,
        sampling_rate: spec.sample_rate,
        samples: Some(reader.duration() as u64),
        bit_depth: Some(spec.bits_per_sample),
    })
}

fn decode_with_hound(
    path: &Path,
    start: u64,
    end: Option<u64>,
) -> Result<DecodedAudio, hound::Error> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let total = reader.duration() as u64;
    let start = start.min(total);
    let end = end.unwrap_or(total).clamp(start, total);

    reader.seek(start as u32)?;
    let count = ((end - start) * spec.channels as u64) as usize;

    let interleaved: Vec<f64> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .take(count)
            .map(|s| s.map(f64::from))
            .collect::<Result<_, _>>()?,
        (hound::SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .take(count)
            .map(|s| s.map(|v| v as f64 / 128.0))
            .collect::<Result<_, _>>()?,
        (hound::SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .take(count)
            .map(|s| s.map(|v| v as f64 / 32768.0))
            .collect::<Result<_, _>>()?,
        (hound::SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .take(count)
            .map(|s| s.map(|v| v as f64 / 8388608.0))
            .collect::<Result<_, _>>()?,
        (hound::SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .take(count)
            .map(|s| s.map(|v| v as f64 / 2147483648.0))
            .collect::<Result<_, _>>()?,
        _ => return Err(hound::Error::Unsupported),
    };

    Ok(DecodedAudio {
        sampling_rate: spec.sample_rate,
        channels: spec.channels,
        interleaved,
    })
}

// ==================== symphonia（通用路径） ====================

type SymphoniaStream = (
    Box<dyn symphonia::core::formats::FormatReader>,
    u32,
    symphonia::core::codecs::CodecParameters,
);

fn open_with_symphonia(path: &Path) -> AudioResult<SymphoniaStream> {
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;

    let file = std::fs::File::open(path)
        .map_err(|e| error::broken_file(path, NATIVE_BACKEND, e))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension() {
        hint.with_extension(&extension.to_string_lossy());
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| error::broken_file(path, NATIVE_BACKEND, format!("格式探测失败: {e}")))?;

    let format_reader = probed.format;
    let track = format_reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| error::broken_file(path, NATIVE_BACKEND, "未找到音频轨道"))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    Ok((format_reader, track_id, codec_params))
}

fn header_from_params(
    path: &Path,
    codec_params: &symphonia::core::codecs::CodecParameters,
) -> AudioResult<StreamHeader> {
    let sampling_rate = codec_params
        .sample_rate
        .ok_or_else(|| error::broken_file(path, NATIVE_BACKEND, "无法获取采样率信息"))?;
    let channels = codec_params
        .channels
        .map(|ch| ch.count())
        .ok_or_else(|| error::broken_file(path, NATIVE_BACKEND, "无法获取声道数信息"))?
        as u16;

    Ok(StreamHeader {
        channels,
        sampling_rate,
        samples: codec_params.n_frames,
        bit_depth: detect_bit_depth(codec_params),
    })
}

fn probe_with_symphonia(path: &Path) -> AudioResult<StreamHeader> {
    let (_, _, codec_params) = open_with_symphonia(path)?;
    header_from_params(path, &codec_params)
}

/// 解码 `[start, end)`；`collect` 为false时只计数不保存样本
///
/// 返回 (头部信息, 文件总帧数或解码停止处的帧数, 样本)
fn decode_with_symphonia(
    path: &Path,
    start: u64,
    end: Option<u64>,
    collect: bool,
) -> AudioResult<(StreamHeader, u64, Vec<f64>)> {
    use symphonia::core::audio::SampleBuffer;
    use symphonia::core::codecs::DecoderOptions;
    use symphonia::core::errors::Error as SymphoniaError;

    let (mut format_reader, track_id, codec_params) = open_with_symphonia(path)?;
    let header = header_from_params(path, &codec_params)?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| error::broken_file(path, NATIVE_BACKEND, format!("创建解码器失败: {e}")))?;

    let channels = header.channels as usize;
    let mut interleaved = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f64>> = None;
    let mut position = 0u64;

    loop {
        if end.is_some_and(|end| position >= end) {
            break;
        }

        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                return Err(error::broken_file(
                    path,
                    NATIVE_BACKEND,
                    format!("读取包失败: {e}"),
                ));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let audio_buf = match decoder.decode(&packet) {
            Ok(audio_buf) => audio_buf,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => {
                return Err(error::broken_file(
                    path,
                    NATIVE_BACKEND,
                    format!("解码失败: {e}"),
                ));
            }
        };

        let frames = audio_buf.frames() as u64;
        let buf_start = position;
        position += frames;

        if !collect {
            continue;
        }

        let lo = start.max(buf_start);
        let hi = end.map_or(position, |end| end.min(position));
        if lo >= hi {
            continue;
        }

        let needed = audio_buf.capacity() as u64;
        if sample_buf.as_ref().is_none_or(|b| (b.capacity() as u64) < needed) {
            sample_buf = Some(SampleBuffer::<f64>::new(needed, *audio_buf.spec()));
        }
        if let Some(buf) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(audio_buf);
            let samples = buf.samples();
            let from = ((lo - buf_start) as usize) * channels;
            let to = (((hi - buf_start) as usize) * channels).min(samples.len());
            interleaved.extend_from_slice(&samples[from.min(to)..to]);
        }
    }

    Ok((header, position, interleaved))
}

/// 检测位深度（有损编码返回None）
fn detect_bit_depth(codec_params: &symphonia::core::codecs::CodecParameters) -> Option<u16> {
    use symphonia::core::codecs::{
        CODEC_TYPE_AAC, CODEC_TYPE_MP1, CODEC_TYPE_MP2, CODEC_TYPE_MP3, CODEC_TYPE_OPUS,
        CODEC_TYPE_PCM_F32BE, CODEC_TYPE_PCM_F32LE, CODEC_TYPE_PCM_F64BE, CODEC_TYPE_PCM_F64LE,
        CODEC_TYPE_PCM_S16BE, CODEC_TYPE_PCM_S16LE, CODEC_TYPE_PCM_S24BE, CODEC_TYPE_PCM_S24LE,
        CODEC_TYPE_PCM_S32BE, CODEC_TYPE_PCM_S32LE, CODEC_TYPE_VORBIS,
    };

    let codec = codec_params.codec;
    if [
        CODEC_TYPE_MP1,
        CODEC_TYPE_MP2,
        CODEC_TYPE_MP3,
        CODEC_TYPE_AAC,
        CODEC_TYPE_VORBIS,
        CODEC_TYPE_OPUS,
    ]
    .contains(&codec)
    {
        return None;
    }

    if let Some(bits) = codec_params.bits_per_sample {
        return Some(bits as u16);
    }

    match codec {
        CODEC_TYPE_PCM_S16LE | CODEC_TYPE_PCM_S16BE => Some(16),
        CODEC_TYPE_PCM_S24LE | CODEC_TYPE_PCM_S24BE => Some(24),
        CODEC_TYPE_PCM_S32LE | CODEC_TYPE_PCM_S32BE | CODEC_TYPE_PCM_F32LE
        | CODEC_TYPE_PCM_F32BE => Some(32),
        CODEC_TYPE_PCM_F64LE | CODEC_TYPE_PCM_F64BE => Some(64),
        _ => None,
    }
}
