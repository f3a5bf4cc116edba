//! 原生编码：WAV (hound) 与 FLAC (flacenc)

use super::native::EncodeRequest;
use crate::config::defaults;
use crate::error::{AudioError, AudioResult};
use flacenc::bitsink::ByteSink;
use flacenc::component::BitRepr;
use flacenc::config::Encoder as EncoderConfig;
use flacenc::encode_with_fixed_block_size;
use flacenc::error::Verify;
use flacenc::source::MemSource;
use std::io;
use std::path::Path;

/// 浮点样本 → 定点整数（四舍五入并饱和）
#[inline]
pub fn quantize(sample: f64, bits: u16) -> i32 {
    let scale = (1i64 << (bits - 1)) as f64;
    (sample * scale).round().clamp(-scale, scale - 1.0) as i32
}

fn encode_error(detail: impl std::fmt::Display) -> AudioError {
    AudioError::Io(io::Error::other(detail.to_string()))
}

/// 写WAV文件
///
/// 32位写为IEEE浮点，8/16/24位写为整数PCM。
pub fn encode_wav(path: &Path, request: &EncodeRequest<'_>) -> AudioResult<()> {
    let float = request.bit_depth == 32;
    let spec = hound::WavSpec {
        channels: request.channels,
        sample_rate: request.sampling_rate,
        bits_per_sample: request.bit_depth,
        sample_format: if float {
            hound::SampleFormat::Float
        } else {
            hound::SampleFormat::Int
        },
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(encode_error)?;
    for &sample in request.interleaved {
        let written = match request.bit_depth {
            32 => writer.write_sample(sample as f32),
            8 => writer.write_sample(quantize(sample, 8) as i8),
            16 => writer.write_sample(quantize(sample, 16) as i16),
            bits => writer.write_sample(quantize(sample, bits)),
        };
        written.map_err(encode_error)?;
    }
    writer.finalize().map_err(encode_error)
}

/// 写FLAC文件
pub fn encode_flac(path: &Path, request: &EncodeRequest<'_>) -> AudioResult<()> {
    let bits = request.bit_depth;
    let ints: Vec<i32> = request
        .interleaved
        .iter()
        .map(|&sample| quantize(sample, bits))
        .collect();

    let config = EncoderConfig::default()
        .into_verified()
        .map_err(|e| encode_error(format!("FLAC配置无效: {e:?}")))?;
    let source = MemSource::from_samples(
        &ints,
        request.channels as usize,
        bits as usize,
        request.sampling_rate as usize,
    );
    let stream = encode_with_fixed_block_size(&config, source, defaults::FLAC_BLOCK_SIZE)
        .map_err(|e| encode_error(format!("FLAC编码失败: {e:?}")))?;

    let mut sink = ByteSink::new();
    stream
        .write(&mut sink)
        .map_err(|e| encode_error(format!("FLAC流写入失败: {e:?}")))?;
    std::fs::write(path, sink.into_inner())?;
    Ok(())
}
