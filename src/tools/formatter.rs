//! 输出格式化模块
//!
//! 终端表格使用comfy-table，`--json` 输出使用serde_json。

use crate::audio::format::{FormatTag, spec_for_path};
use crate::audio::info::AudioInfo;
use crate::backend::{Capability, Tool};
use crate::toolkit::AudioToolkit;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::UTF8_FULL};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// 单个文件的元数据查询结果
#[derive(Debug, Clone, Serialize)]
pub struct InfoRecord {
    pub path: PathBuf,
    pub format: FormatTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<AudioInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InfoRecord {
    /// 查询单个文件，失败记录在 `error` 中
    ///
    /// `sloppy` 模式只读头部，外部格式不会被转码。
    pub fn query(toolkit: &AudioToolkit, path: &Path, sloppy: bool) -> Self {
        let result = if sloppy {
            toolkit.info_sloppy(path)
        } else {
            toolkit.info(path)
        };
        let (info, error) = match result {
            Ok(info) => (Some(info), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self {
            path: path.to_path_buf(),
            format: spec_for_path(path).tag,
            info,
            error,
        }
    }
}

/// 外部工具状态
#[derive(Debug, Clone, Serialize)]
pub struct ToolRecord {
    pub tool: Tool,
    pub program: PathBuf,
    pub installed: bool,
    pub capabilities: Vec<Capability>,
}

/// 时长格式化为 `m:ss.mmm`
pub fn format_duration(seconds: f64) -> String {
    let minutes = (seconds / 60.0).floor();
    let rest = seconds - minutes * 60.0;
    format!("{}:{:06.3}", minutes as u64, rest)
}

fn right(text: impl std::fmt::Display) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// 元数据表格
pub fn render_info_table(records: &[InfoRecord]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "File / 文件",
        "Format / 格式",
        "Channels / 声道",
        "Rate / 采样率",
        "Samples / 样本数",
        "Duration / 时长",
        "Bits / 位深",
    ]);

    for record in records {
        let name = record
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| record.path.display().to_string());

        match (&record.info, &record.error) {
            (Some(info), _) => {
                table.add_row(vec![
                    Cell::new(name),
                    Cell::new(record.format),
                    right(info.channels),
                    right(info.sampling_rate),
                    right(info.samples),
                    right(format_duration(info.duration_seconds())),
                    right(
                        info.bit_depth
                            .map_or_else(|| "-".to_string(), |b| b.to_string()),
                    ),
                ]);
            }
            (None, error) => {
                table.add_row(vec![
                    Cell::new(name),
                    Cell::new(record.format),
                    Cell::new(format!("[FAIL] {}", error.as_deref().unwrap_or("unknown"))),
                ]);
            }
        }
    }

    table.to_string()
}

/// 元数据JSON
pub fn render_info_json(records: &[InfoRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(records)
}

/// 外部工具表格
pub fn render_tools_table(records: &[ToolRecord]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Tool / 工具",
        "Program / 程序",
        "Installed / 已安装",
        "Capabilities / 能力",
    ]);

    for record in records {
        let capabilities: Vec<String> = record
            .capabilities
            .iter()
            .map(|c| format!("{c:?}"))
            .collect();
        table.add_row(vec![
            Cell::new(record.tool),
            Cell::new(record.program.display()),
            Cell::new(if record.installed { "yes" } else { "no" }),
            Cell::new(capabilities.join(", ")),
        ]);
    }

    table.to_string()
}
