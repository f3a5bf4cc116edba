//! audiofile - 主程序入口
//!
//! 纯流程控制器，负责协调各个工具模块完成元数据查询和格式转换。

use anyhow::{Context, Result};
use audiofile::{
    AudioToolkit, ConvertOptions,
    backend::Tool,
    error::{AudioError, ErrorCategory},
    tools::{self, AppConfig, CliCommand, ConvertArgs, InfoArgs, InfoRecord, ToolRecord},
};
use std::process;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// 错误退出码定义
mod exit_codes {
    /// 通用错误
    pub const GENERAL_ERROR: i32 = 1;
    /// 参数错误
    pub const ARGUMENT_ERROR: i32 = 2;
    /// 解码失败
    pub const DECODING_ERROR: i32 = 3;
    /// 缺少外部工具
    pub const DEPENDENCY_ERROR: i32 = 4;
}

/// 获取错误建议文本
fn get_error_suggestion(category: ErrorCategory) -> &'static str {
    match category {
        ErrorCategory::Io => {
            "检查文件路径是否正确，文件是否存在且可读 / Check if file path is correct, file exists and is readable"
        }
        ErrorCategory::Dependency => {
            "安装所需的外部工具，或通过 AUDIOFILE_* 环境变量指定路径 / Install the required tool or point AUDIOFILE_* at it"
        }
        ErrorCategory::Decoding => {
            "文件可能损坏或使用不支持的音频编码 / File may be corrupted or use unsupported audio encoding"
        }
        ErrorCategory::Argument => {
            "检查命令行参数是否正确，使用 --help 查看完整用法 / Check command-line arguments, use --help to see full usage"
        }
    }
}

/// 错误处理和建议
fn handle_error(error: anyhow::Error) -> ! {
    eprintln!("[ERROR] 错误 / Error: {error:#}");

    let exit_code = match error.downcast_ref::<AudioError>() {
        Some(audio_error) => {
            let category = ErrorCategory::from_audio_error(audio_error);
            eprintln!("[INFO] 建议 / Suggestion: {}", get_error_suggestion(category));
            match category {
                ErrorCategory::Argument => exit_codes::ARGUMENT_ERROR,
                ErrorCategory::Decoding => exit_codes::DECODING_ERROR,
                ErrorCategory::Dependency => exit_codes::DEPENDENCY_ERROR,
                ErrorCategory::Io => exit_codes::GENERAL_ERROR,
            }
        }
        None => exit_codes::GENERAL_ERROR,
    };

    process::exit(exit_code);
}

/// 初始化日志：`RUST_LOG` 优先，否则 `-v` 打开debug
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "audiofile=debug" } else { "audiofile=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// info子命令：单个文件失败不影响其他文件
fn run_info(toolkit: &AudioToolkit, args: &InfoArgs) -> Result<()> {
    let files = tools::scan_audio_files(&args.inputs, args.recursive)?;
    debug!("找到 {} 个文件", files.len());

    let records: Vec<InfoRecord> = files
        .iter()
        .map(|path| InfoRecord::query(toolkit, path, args.sloppy))
        .collect();
    let failed = records.iter().filter(|r| r.error.is_some()).count();

    if args.json {
        println!("{}", tools::render_info_json(&records)?);
    } else {
        println!("{}", tools::render_info_table(&records));
    }

    if failed > 0 && failed == records.len() {
        anyhow::bail!("all {failed} files failed / 全部 {failed} 个文件处理失败");
    }
    Ok(())
}

/// convert子命令
fn run_convert(toolkit: &AudioToolkit, args: &ConvertArgs) -> Result<()> {
    let options = ConvertOptions {
        output: args.output.clone(),
        offset: args.offset,
        duration: args.duration,
        bit_depth: args.bit_depth,
        normalize: args.normalize,
        overwrite: args.overwrite,
    };
    let output = toolkit
        .convert_to_wav(&args.input, &options)
        .with_context(|| format!("converting {}", args.input.display()))?;
    info!("写入 {}", output.display());
    println!("{}", output.display());
    Ok(())
}

/// tools子命令
fn run_tools(toolkit: &AudioToolkit) {
    let records: Vec<ToolRecord> = Tool::ALL
        .into_iter()
        .map(|tool| ToolRecord {
            tool,
            program: toolkit.config().program(tool).to_path_buf(),
            installed: toolkit.has_tool(tool.name()),
            capabilities: toolkit.tool_capabilities(tool.name()),
        })
        .collect();
    println!("{}", tools::render_tools_table(&records));
}

/// 应用程序主逻辑
fn run(config: &AppConfig) -> Result<()> {
    let toolkit = audiofile::toolkit::global();
    match &config.command {
        CliCommand::Info(args) => run_info(toolkit, args),
        CliCommand::Convert(args) => run_convert(toolkit, args),
        CliCommand::Tools => {
            run_tools(toolkit);
            Ok(())
        }
    }
}

fn main() {
    let config = tools::parse_args();
    init_logging(config.verbose);

    if let Err(error) = run(&config) {
        handle_error(error);
    }
}
