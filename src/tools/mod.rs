//! 工具模块集合
//!
//! 包含CLI、文件扫描、格式化等工具模块，支持main.rs的流程控制。

pub mod cli;
pub mod formatter;
pub mod scanner;

// 重新导出主要的公共接口
pub use cli::{AppConfig, CliCommand, ConvertArgs, InfoArgs, parse_args};
pub use formatter::{InfoRecord, ToolRecord, render_info_json, render_info_table, render_tools_table};
pub use scanner::scan_audio_files;
