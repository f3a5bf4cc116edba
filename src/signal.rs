//! 内存中的音频信号
//!
//! 数据按声道平面存储（channel-major）：`[channels, samples]`。
//! 单声道默认为一维，`always_2d` 时保留大小为1的声道轴。

use crate::error::{self, AudioResult};

/// 读取时的样本类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dtype {
    #[default]
    Float32,
    Float64,
    Int32,
    Int16,
}

/// 样本数据
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    F32(Vec<f32>),
    F64(Vec<f64>),
    I32(Vec<i32>),
    I16(Vec<i16>),
}

impl Samples {
    pub fn len(&self) -> usize {
        match self {
            Self::F32(v) => v.len(),
            Self::F64(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::I16(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtype(&self) -> Dtype {
        match self {
            Self::F32(_) => Dtype::Float32,
            Self::F64(_) => Dtype::Float64,
            Self::I32(_) => Dtype::Int32,
            Self::I16(_) => Dtype::Int16,
        }
    }

    /// 从归一化浮点转换；整数类型按满量程缩放并饱和
    pub fn from_f64(values: Vec<f64>, dtype: Dtype) -> Self {
        match dtype {
            Dtype::Float64 => Self::F64(values),
            Dtype::Float32 => Self::F32(values.into_iter().map(|v| v as f32).collect()),
            Dtype::Int32 => Self::I32(
                values
                    .into_iter()
                    .map(|v| (v * 2147483648.0).round().clamp(-2147483648.0, 2147483647.0) as i32)
                    .collect(),
            ),
            Dtype::Int16 => Self::I16(
                values
                    .into_iter()
                    .map(|v| (v * 32768.0).round().clamp(-32768.0, 32767.0) as i16)
                    .collect(),
            ),
        }
    }

    /// 转换为归一化浮点
    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            Self::F64(v) => v.clone(),
            Self::F32(v) => v.iter().map(|&s| f64::from(s)).collect(),
            Self::I32(v) => v.iter().map(|&s| s as f64 / 2147483648.0).collect(),
            Self::I16(v) => v.iter().map(|&s| s as f64 / 32768.0).collect(),
        }
    }
}

/// 一维或二维信号
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    channels: usize,
    frames: usize,
    two_dimensional: bool,
    data: Samples,
}

impl Signal {
    /// 一维单声道信号
    pub fn mono(samples: Vec<f64>) -> Self {
        Self {
            channels: 1,
            frames: samples.len(),
            two_dimensional: false,
            data: Samples::F64(samples),
        }
    }

    /// 由各声道数据组成二维信号；所有声道长度必须相同
    pub fn from_channels(channels: Vec<Vec<f64>>) -> AudioResult<Self> {
        let frames = channels.first().map_or(0, Vec::len);
        if channels.iter().any(|c| c.len() != frames) {
            return Err(error::invalid_argument(
                "all channels must have the same number of samples",
            ));
        }
        Ok(Self {
            channels: channels.len(),
            frames,
            two_dimensional: true,
            data: Samples::F64(channels.into_iter().flatten().collect()),
        })
    }

    /// 按形状构造：`[samples]` 或 `[channels, samples]`
    pub fn from_shape(shape: &[usize], data: Samples) -> AudioResult<Self> {
        let (channels, frames, two_dimensional) = match *shape {
            [frames] => (1, frames, false),
            [channels, frames] => (channels, frames, true),
            _ => {
                return Err(error::invalid_argument(format!(
                    "signal must be 1- or 2-dimensional, got shape {shape:?}"
                )));
            }
        };
        if channels * frames != data.len() {
            return Err(error::invalid_argument(format!(
                "shape {shape:?} does not match {} samples",
                data.len()
            )));
        }
        Ok(Self {
            channels,
            frames,
            two_dimensional,
            data,
        })
    }

    /// 由交错样本构造（解码器输出）
    pub(crate) fn from_interleaved(
        interleaved: &[f64],
        channels: usize,
        always_2d: bool,
        dtype: Dtype,
    ) -> Self {
        let channels = channels.max(1);
        let frames = interleaved.len() / channels;
        let mut planar = vec![0.0; frames * channels];
        for (frame, chunk) in interleaved.chunks_exact(channels).enumerate() {
            for (channel, &sample) in chunk.iter().enumerate() {
                planar[channel * frames + frame] = sample;
            }
        }
        Self {
            channels,
            frames,
            two_dimensional: always_2d || channels > 1,
            data: Samples::from_f64(planar, dtype),
        }
    }

    /// 转换为交错样本（编码器输入）
    pub(crate) fn to_interleaved(&self) -> Vec<f64> {
        let planar = self.data.to_f64();
        let mut interleaved = Vec::with_capacity(planar.len());
        for frame in 0..self.frames {
            for channel in 0..self.channels {
                interleaved.push(planar[channel * self.frames + frame]);
            }
        }
        interleaved
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// 每声道样本数
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn ndim(&self) -> usize {
        if self.two_dimensional { 2 } else { 1 }
    }

    pub fn shape(&self) -> Vec<usize> {
        if self.two_dimensional {
            vec![self.channels, self.frames]
        } else {
            vec![self.frames]
        }
    }

    pub fn dtype(&self) -> Dtype {
        self.data.dtype()
    }

    pub fn data(&self) -> &Samples {
        &self.data
    }

    pub fn into_data(self) -> Samples {
        self.data
    }

    /// 单个声道的归一化浮点样本
    pub fn channel(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.channels {
            return None;
        }
        let planar = self.data.to_f64();
        Some(planar[index * self.frames..(index + 1) * self.frames].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interleaved_round_trip() {
        let interleaved = [0.1, -0.1, 0.2, -0.2, 0.3, -0.3];
        let signal = Signal::from_interleaved(&interleaved, 2, false, Dtype::Float64);
        assert_eq!(signal.shape(), vec![2, 3]);
        assert_eq!(signal.channel(1).unwrap(), vec![-0.1, -0.2, -0.3]);
        assert_eq!(signal.to_interleaved(), interleaved.to_vec());
    }

    #[test]
    fn test_mono_shape_depends_on_always_2d() {
        let flat = Signal::from_interleaved(&[0.0; 4], 1, false, Dtype::Float32);
        assert_eq!(flat.shape(), vec![4]);
        assert_eq!(flat.ndim(), 1);

        let two_d = Signal::from_interleaved(&[0.0; 4], 1, true, Dtype::Float32);
        assert_eq!(two_d.shape(), vec![1, 4]);
    }

    #[test]
    fn test_from_shape_rejects_three_dimensions() {
        let err = Signal::from_shape(&[1, 2, 2], Samples::F64(vec![0.0; 4])).unwrap_err();
        assert!(matches!(err, crate::AudioError::InvalidArgument(_)));
        assert!(Signal::from_shape(&[2, 3], Samples::F64(vec![0.0; 5])).is_err());
    }

    #[test]
    fn test_integer_dtypes_saturate() {
        let samples = Samples::from_f64(vec![1.0, -1.0, 0.5], Dtype::Int16);
        assert_eq!(samples, Samples::I16(vec![32767, -32768, 16384]));
        assert_eq!(samples.to_f64()[2], 0.5);
    }

    #[test]
    fn test_from_channels_requires_equal_lengths() {
        assert!(Signal::from_channels(vec![vec![0.0; 3], vec![0.0; 2]]).is_err());
        let signal = Signal::from_channels(vec![vec![0.0; 3], vec![1.0; 3]]).unwrap();
        assert_eq!(signal.shape(), vec![2, 3]);
    }
}
