//! mediainfo：只读元数据工具，对容器格式最准确

use super::{BackendContext, HeaderField, Tool, parse_number, run_tool};
use crate::error::{self, AudioResult};
use std::ffi::OsString;
use std::path::Path;

fn inform_args(path: &Path, template: &str) -> Vec<OsString> {
    vec![
        format!("--Inform={template}").into(),
        path.as_os_str().to_owned(),
    ]
}

fn query(ctx: BackendContext<'_>, path: &Path, template: &str) -> AudioResult<Option<f64>> {
    let output = run_tool(ctx, Tool::MediaInfo, path, inform_args(path, template))?;
    parse_number(path, Tool::MediaInfo, &output.stdout_text())
}

pub(super) fn probe_field(
    ctx: BackendContext<'_>,
    path: &Path,
    field: HeaderField,
) -> AudioResult<Option<f64>> {
    match field {
        // 多声道编码的原始声道数优先（如5.1下混为2时报告6）
        HeaderField::Channels => {
            if let Some(channels) = query(ctx, path, "Audio;%Channel(s)_Original%")? {
                return Ok(Some(channels));
            }
            match query(ctx, path, "Audio;%Channel(s)%")? {
                Some(channels) => Ok(Some(channels)),
                None => Err(error::broken_file(
                    path,
                    Tool::MediaInfo.name(),
                    "no channel count reported",
                )),
            }
        }
        HeaderField::SamplingRate => query(ctx, path, "Audio;%SamplingRate%"),
        HeaderField::Samples => query(ctx, path, "Audio;%SamplingCount%"),
        // mediainfo以毫秒报告时长
        HeaderField::Duration => {
            Ok(query(ctx, path, "Audio;%Duration%")?.map(|ms| ms / 1000.0))
        }
    }
}

pub(super) fn has_video(ctx: BackendContext<'_>, path: &Path) -> AudioResult<bool> {
    let output = run_tool(ctx, Tool::MediaInfo, path, inform_args(path, "Video;%Format%"))?;
    Ok(!output.stdout_text().trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inform_args() {
        let args = inform_args(Path::new("a.m4a"), "Audio;%Duration%");
        assert_eq!(args, vec!["--Inform=Audio;%Duration%", "a.m4a"]);
    }
}
