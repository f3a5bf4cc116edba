//! ffmpeg / ffprobe：通用转码器
//!
//! 探测走ffprobe的JSON输出，转码走ffmpeg。

use super::{BackendContext, HeaderField, Tool, TranscodeTarget, run_tool};
use crate::error::{self, AudioResult};
use serde::Deserialize;
use std::ffi::OsString;
use std::path::Path;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
pub(super) struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    #[serde(default)]
    format: Option<ProbeFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    codec_type: Option<String>,
    #[serde(default)]
    sample_rate: Option<String>,
    #[serde(default)]
    channels: Option<u32>,
    #[serde(default)]
    duration_ts: Option<u64>,
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    time_base: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeFormat {
    #[serde(default)]
    duration: Option<String>,
}

impl ProbeOutput {
    fn audio_stream(&self) -> Option<&ProbeStream> {
        self.streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("audio"))
    }

    pub(super) fn has_video(&self) -> bool {
        self.streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some("video"))
    }

    fn sampling_rate(&self) -> Option<f64> {
        self.audio_stream()?.sample_rate.as_deref()?.parse().ok()
    }

    fn duration(&self) -> Option<f64> {
        let stream_duration = self
            .audio_stream()
            .and_then(|s| s.duration.as_deref())
            .and_then(|d| d.parse::<f64>().ok());
        stream_duration.or_else(|| {
            self.format
                .as_ref()?
                .duration
                .as_deref()?
                .parse::<f64>()
                .ok()
        })
    }

    /// 样本数：时间基等于 1/采样率 时直接用duration_ts，否则由时长换算
    fn samples(&self) -> Option<f64> {
        let rate = self.sampling_rate()?;
        let stream = self.audio_stream()?;
        if let (Some(ts), Some(time_base)) = (stream.duration_ts, stream.time_base.as_deref())
            && time_base == format!("1/{}", rate as u64)
        {
            return Some(ts as f64);
        }
        Some((self.duration()? * rate).round_ties_even())
    }

    pub(super) fn field(&self, field: HeaderField) -> Option<f64> {
        let value = match field {
            HeaderField::Channels => self.audio_stream()?.channels.map(f64::from),
            HeaderField::SamplingRate => self.sampling_rate(),
            HeaderField::Samples => self.samples(),
            HeaderField::Duration => self.duration(),
        }?;
        (value.is_finite() && value > 0.0).then_some(value)
    }
}

pub(super) fn probe_args(path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-v",
        "error",
        "-show_streams",
        "-show_format",
        "-of",
        "json",
    ]
    .map(OsString::from)
    .to_vec();
    args.push(path.as_os_str().to_owned());
    args
}

pub(super) fn transcode_args(
    input: &Path,
    output: &Path,
    target: TranscodeTarget,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-nostdin", "-v", "error", "-y", "-i"]
        .map(OsString::from)
        .to_vec();
    args.push(input.as_os_str().to_owned());
    args.push("-vn".into());

    let codec = match target {
        TranscodeTarget::IntermediateWav { sampling_rate } => {
            if let Some(rate) = sampling_rate {
                args.push("-ar".into());
                args.push(rate.to_string().into());
            }
            "pcm_f32le"
        }
        TranscodeTarget::Encode { codec } => codec,
    };
    args.push("-c:a".into());
    args.push(codec.into());
    args.push(output.as_os_str().to_owned());
    args
}

fn probe(ctx: BackendContext<'_>, path: &Path) -> AudioResult<ProbeOutput> {
    let output = run_tool(ctx, Tool::Ffprobe, path, probe_args(path))?;
    serde_json::from_slice(&output.stdout)
        .map_err(|e| error::broken_file(path, Tool::Ffprobe.name(), format!("invalid JSON: {e}")))
}

pub(super) fn probe_field(
    ctx: BackendContext<'_>,
    path: &Path,
    field: HeaderField,
) -> AudioResult<Option<f64>> {
    Ok(probe(ctx, path)?.field(field))
}

pub(super) fn has_video(ctx: BackendContext<'_>, path: &Path) -> AudioResult<bool> {
    Ok(probe(ctx, path)?.has_video())
}

pub(super) fn transcode(
    ctx: BackendContext<'_>,
    input: &Path,
    output: &Path,
    target: TranscodeTarget,
) -> AudioResult<()> {
    info!("ffmpeg转码: {} → {}", input.display(), output.display());
    run_tool(ctx, Tool::Ffmpeg, input, transcode_args(input, output, target))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPUS_JSON: &str = r#"{
        "streams": [
            {"codec_type": "audio", "sample_rate": "48000", "channels": 2,
             "duration_ts": 96000, "time_base": "1/48000", "duration": "2.000000"}
        ],
        "format": {"duration": "2.010000"}
    }"#;

    const VIDEO_JSON: &str = r#"{
        "streams": [
            {"codec_type": "video"},
            {"codec_type": "audio", "sample_rate": "44100", "channels": 1,
             "duration_ts": 1323000, "time_base": "1/44100"}
        ],
        "format": {"duration": "30.000000"}
    }"#;

    #[test]
    fn test_parse_audio_stream() {
        let probe: ProbeOutput = serde_json::from_str(OPUS_JSON).unwrap();
        assert_eq!(probe.field(HeaderField::Channels), Some(2.0));
        assert_eq!(probe.field(HeaderField::SamplingRate), Some(48000.0));
        assert_eq!(probe.field(HeaderField::Samples), Some(96000.0));
        assert_eq!(probe.field(HeaderField::Duration), Some(2.0));
        assert!(!probe.has_video());
    }

    #[test]
    fn test_container_duration_fallback() {
        let probe: ProbeOutput = serde_json::from_str(VIDEO_JSON).unwrap();
        assert!(probe.has_video());
        assert_eq!(probe.field(HeaderField::Duration), Some(30.0));
        assert_eq!(probe.field(HeaderField::Samples), Some(1_323_000.0));
    }

    #[test]
    fn test_samples_from_foreign_time_base() {
        let json = r#"{"streams": [{"codec_type": "audio", "sample_rate": "8000",
            "channels": 1, "duration_ts": 1000, "time_base": "1/1000", "duration": "1.0"}]}"#;
        let probe: ProbeOutput = serde_json::from_str(json).unwrap();
        assert_eq!(probe.field(HeaderField::Samples), Some(8000.0));
    }

    #[test]
    fn test_missing_audio_stream() {
        let probe: ProbeOutput = serde_json::from_str(r#"{"streams": []}"#).unwrap();
        assert_eq!(probe.field(HeaderField::Channels), None);
        assert_eq!(probe.field(HeaderField::Duration), None);
    }

    #[test]
    fn test_forced_sampling_rate() {
        let args = transcode_args(
            Path::new("in.opus"),
            Path::new("out.wav"),
            TranscodeTarget::IntermediateWav {
                sampling_rate: Some(44100),
            },
        );
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        let joined = args.join(" ");
        assert!(joined.contains("-ar 44100"));
        assert!(joined.ends_with("-c:a pcm_f32le out.wav"));
    }
}
