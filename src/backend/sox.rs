//! sox：纯音频流最快的探测与转码工具

use super::{BackendContext, HeaderField, Tool, TranscodeTarget, parse_number, run_tool};
use crate::config::defaults;
use crate::error::AudioResult;
use std::ffi::OsString;
use std::path::Path;
use tracing::info;

fn info_flag(field: HeaderField) -> &'static str {
    match field {
        HeaderField::Channels => "-c",
        HeaderField::SamplingRate => "-r",
        HeaderField::Samples => "-s",
        HeaderField::Duration => "-D",
    }
}

pub(super) fn probe_args(path: &Path, field: HeaderField) -> Vec<OsString> {
    vec![
        "--i".into(),
        info_flag(field).into(),
        path.as_os_str().to_owned(),
    ]
}

pub(super) fn transcode_args(
    input: &Path,
    output: &Path,
    target: TranscodeTarget,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-q".into(), input.as_os_str().to_owned()];
    if let TranscodeTarget::IntermediateWav { .. } = target {
        args.extend(
            [
                "-t".to_string(),
                "wav".to_string(),
                "-e".to_string(),
                "floating-point".to_string(),
                "-b".to_string(),
                defaults::INTERMEDIATE_BIT_DEPTH.to_string(),
            ]
            .map(OsString::from),
        );
    }
    args.push(output.as_os_str().to_owned());
    args
}

pub(super) fn probe_field(
    ctx: BackendContext<'_>,
    path: &Path,
    field: HeaderField,
) -> AudioResult<Option<f64>> {
    let output = run_tool(ctx, Tool::Sox, path, probe_args(path, field))?;
    let value = parse_number(path, Tool::Sox, &output.stdout_text())?;
    // sox对未知长度的流报告0个样本
    if matches!(field, HeaderField::Samples | HeaderField::Duration) && value == Some(0.0) {
        return Ok(None);
    }
    Ok(value)
}

pub(super) fn transcode(
    ctx: BackendContext<'_>,
    input: &Path,
    output: &Path,
    target: TranscodeTarget,
) -> AudioResult<()> {
    info!("sox转码: {} → {}", input.display(), output.display());
    run_tool(ctx, Tool::Sox, input, transcode_args(input, output, target))?;
    Ok(())
}
