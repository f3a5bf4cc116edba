//! 音频元数据记录

use serde::Serialize;

/// 音频元数据
///
/// 原生格式下所有字段都是精确值；回退格式在精确模式下也保证
/// `duration_seconds() == samples / sampling_rate`。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AudioInfo {
    /// 声道数（空文件为0）
    pub channels: u16,
    /// 采样率 (Hz)，空文件为0
    pub sampling_rate: u32,
    /// 每声道样本数
    pub samples: u64,
    /// 源格式位深（有损格式或未知时为None）
    pub bit_depth: Option<u16>,
}

impl AudioInfo {
    /// 创建新的元数据记录
    pub fn new(channels: u16, sampling_rate: u32, samples: u64, bit_depth: Option<u16>) -> Self {
        Self {
            channels,
            sampling_rate,
            samples,
            bit_depth,
        }
    }

    /// 零字节文件的元数据
    pub fn empty() -> Self {
        Self::new(0, 0, 0, None)
    }

    /// 是否为空文件记录
    pub fn is_empty(&self) -> bool {
        self.sampling_rate == 0
    }

    /// 获取持续时长（秒）
    pub fn duration_seconds(&self) -> f64 {
        if self.sampling_rate == 0 {
            0.0
        } else {
            self.samples as f64 / self.sampling_rate as f64
        }
    }
}

/// 流头部信息（原生探测结果，样本数可能缺失或不精确）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamHeader {
    pub channels: u16,
    pub sampling_rate: u32,
    /// 头部记录的样本数
    pub samples: Option<u64>,
    pub bit_depth: Option<u16>,
}

impl StreamHeader {
    /// 用确定的样本数生成元数据记录
    pub fn with_samples(&self, samples: u64) -> AudioInfo {
        AudioInfo::new(self.channels, self.sampling_rate, samples, self.bit_depth)
    }
}
