//! 偏移/时长归一化
//!
//! 把任意单位的 offset/duration（可为负，表示从文件末尾起算）
//! 转换为绝对样本区间。读取、转换等所有调用点都经过这里，
//! 因此同一组 (offset, duration) 在任何路径上选中的样本完全一致。
//!
//! 规则：
//! - 数值（`f64`、`Duration`）表示秒，不带单位的字符串表示样本数
//! - 先在未取整的样本域内完成负值与夹紧运算，最后再对起点与长度
//!   使用四舍六入五成双（round half to even）取整
//! - `offset == 0` 等价于未指定；NaN等价于未指定；允许 ±inf
//! - 结果夹紧到 `[0, total]`，越界请求返回空区间而不是错误

use crate::error::{self, AudioResult};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// 位置单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Samples,
    Seconds,
    Milliseconds,
    Microseconds,
    Nanoseconds,
    Minutes,
    Hours,
    Days,
}

impl Unit {
    /// 换算为秒的比例 (乘数, 除数)；样本单位为None
    fn seconds_ratio(&self) -> Option<(f64, f64)> {
        match self {
            Self::Samples => None,
            Self::Seconds => Some((1.0, 1.0)),
            Self::Milliseconds => Some((1.0, 1e3)),
            Self::Microseconds => Some((1.0, 1e6)),
            Self::Nanoseconds => Some((1.0, 1e9)),
            Self::Minutes => Some((60.0, 1.0)),
            Self::Hours => Some((3600.0, 1.0)),
            Self::Days => Some((86400.0, 1.0)),
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            Self::Samples => "",
            Self::Seconds => "s",
            Self::Milliseconds => "ms",
            Self::Microseconds => "us",
            Self::Nanoseconds => "ns",
            Self::Minutes => "min",
            Self::Hours => "h",
            Self::Days => "d",
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        let unit = match suffix.to_lowercase().as_str() {
            "sample" | "samples" => Self::Samples,
            "s" | "sec" | "secs" | "second" | "seconds" => Self::Seconds,
            "ms" | "milli" | "millis" | "millisecond" | "milliseconds" => Self::Milliseconds,
            "us" | "µs" | "μs" | "micro" | "micros" | "microsecond" | "microseconds" => {
                Self::Microseconds
            }
            "ns" | "nano" | "nanos" | "nanosecond" | "nanoseconds" => Self::Nanoseconds,
            "m" | "min" | "mins" | "minute" | "minutes" => Self::Minutes,
            "h" | "hr" | "hrs" | "hour" | "hours" => Self::Hours,
            "d" | "day" | "days" => Self::Days,
            _ => return None,
        };
        Some(unit)
    }
}

/// 带单位的位置或时长
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    value: f64,
    unit: Unit,
}

impl Position {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// 以样本数表示
    pub fn samples(value: i64) -> Self {
        Self::new(value as f64, Unit::Samples)
    }

    /// 以秒表示
    pub fn seconds(value: f64) -> Self {
        Self::new(value, Unit::Seconds)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// NaN视为未指定
    pub fn is_absent(&self) -> bool {
        self.value.is_nan()
    }

    /// 换算为样本数（已取整，可为 ±inf）
    pub fn to_samples(&self, sampling_rate: u32) -> AudioResult<f64> {
        Ok(self.to_exact_samples(sampling_rate)?.round_ties_even())
    }

    /// 换算为未取整的样本数
    fn to_exact_samples(&self, sampling_rate: u32) -> AudioResult<f64> {
        match self.unit.seconds_ratio() {
            None => Ok(self.value),
            Some(_) if sampling_rate == 0 => Err(error::invalid_argument(format!(
                "cannot convert {self} to samples without a sampling rate"
            ))),
            Some((mul, div)) => Ok(self.value * mul * sampling_rate as f64 / div),
        }
    }
}

impl From<f64> for Position {
    fn from(seconds: f64) -> Self {
        Self::seconds(seconds)
    }
}

impl From<Duration> for Position {
    fn from(duration: Duration) -> Self {
        Self::seconds(duration.as_secs_f64())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

impl FromStr for Position {
    type Err = error::AudioError;

    /// `"4000"` → 4000个样本；`"0.5s"`、`"500 ms"`、`"-1min"` → 时间
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(value) = s.parse::<f64>() {
            return Ok(Self::new(value, Unit::Samples));
        }

        let split = s
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_alphabetic())
            .last()
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        let (number, suffix) = s.split_at(split);

        let unit = Unit::from_suffix(suffix).ok_or_else(|| {
            error::invalid_argument(format!("unknown unit '{suffix}' in '{s}'"))
        })?;
        let value = number
            .trim()
            .parse::<f64>()
            .map_err(|_| error::invalid_argument(format!("invalid value '{number}' in '{s}'")))?;
        Ok(Self::new(value, unit))
    }
}

/// 绝对样本区间 `[start, end)`，满足 `start <= end <= total`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleRange {
    pub start: u64,
    pub end: u64,
}

impl SampleRange {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// 整个文件
    pub fn full(total: u64) -> Self {
        Self {
            start: 0,
            end: total,
        }
    }
}

fn resolve(position: Option<Position>, sampling_rate: u32) -> AudioResult<Option<f64>> {
    match position {
        Some(p) if !p.is_absent() => p.to_exact_samples(sampling_rate).map(Some),
        _ => Ok(None),
    }
}

/// 把 offset/duration 归一化为样本区间
///
/// 负值从末尾起算：未指定offset时负duration表示最后|d|个样本，
/// 指定offset时负duration表示offset之前的|d|个样本。
/// 例：对 `[0, 1, 2]`，`duration=2, offset=-4` 得到 `[0]`。
pub fn to_sample_range(
    total_samples: u64,
    sampling_rate: u32,
    offset: Option<Position>,
    duration: Option<Position>,
) -> AudioResult<SampleRange> {
    let n = total_samples as f64;
    // 在换算之前判断，避免 -0.4 这类偏移被当作未指定
    let offset = offset.filter(|o| o.value() != 0.0);
    let offset = resolve(offset, sampling_rate)?;
    let duration = resolve(duration, sampling_rate)?;

    let (start, end) = match (offset, duration) {
        (_, Some(d)) if d == 0.0 => {
            let start = offset.map_or(0.0, |o| if o < 0.0 { n + o } else { o });
            (start, start)
        }
        (None, None) => (0.0, n),
        (None, Some(d)) if d < 0.0 => (n + d, n),
        (None, Some(d)) => (0.0, d),
        (Some(o), None) if o < 0.0 => (n + o, n),
        (Some(o), None) => (o, n),
        (Some(o), Some(d)) if o > 0.0 && d > 0.0 => (o, o + d),
        (Some(o), Some(d)) if o > 0.0 => {
            if o.is_infinite() && d.is_infinite() {
                (0.0, n)
            } else if o.is_infinite() {
                (n, n)
            } else if d.is_infinite() {
                (0.0, o)
            } else {
                (o + d, o)
            }
        }
        (Some(o), Some(d)) if d > 0.0 => {
            if o.is_infinite() && d.is_infinite() {
                (0.0, n)
            } else if o.is_infinite() {
                (0.0, 0.0)
            } else if d.is_infinite() {
                (n + o, n)
            } else {
                (n + o, n + o + d)
            }
        }
        (Some(o), Some(d)) => {
            if o.is_infinite() {
                (0.0, 0.0)
            } else if d.is_infinite() {
                (0.0, n + o)
            } else {
                (n + o + d, n + o)
            }
        }
    };

    let start = start.clamp(0.0, n);
    let end = end.clamp(start, n);
    let length = (end - start).round_ties_even();
    let start = start.round_ties_even();
    let end = (start + length).min(n);
    Ok(SampleRange {
        start: start as u64,
        end: end as u64,
    })
}
