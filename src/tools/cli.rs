//! 命令行接口模块
//!
//! 负责命令行参数解析和程序信息展示。

use crate::position::Position;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

/// 应用程序版本信息
const VERSION: &str = env!("CARGO_PKG_VERSION");
const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// `info` 子命令参数
#[derive(Debug, Clone, PartialEq)]
pub struct InfoArgs {
    pub inputs: Vec<PathBuf>,
    /// 使用头部记录的样本数/时长（更快，可能不精确）
    pub sloppy: bool,
    pub json: bool,
    pub recursive: bool,
}

/// `convert` 子命令参数
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertArgs {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub offset: Option<Position>,
    pub duration: Option<Position>,
    pub bit_depth: u16,
    pub normalize: bool,
    pub overwrite: bool,
}

/// 子命令
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    Info(InfoArgs),
    Convert(ConvertArgs),
    Tools,
}

/// 应用程序配置
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// 是否显示详细信息（debug日志）
    pub verbose: bool,
    pub command: CliCommand,
}

fn parse_position(value: &str) -> Result<Position, String> {
    value.parse::<Position>().map_err(|e| e.to_string())
}

/// 构建命令行定义
pub fn build_cli() -> Command {
    Command::new("audiofile")
        .version(VERSION)
        .about(DESCRIPTION)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("显示详细日志 / Show debug logs")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("info")
                .about("显示音频元数据 / Show audio metadata")
                .arg(
                    Arg::new("INPUT")
                        .help("音频文件或目录 / Audio files or directories")
                        .required(true)
                        .num_args(1..)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("sloppy")
                        .long("sloppy")
                        .help("使用头部记录的时长（更快，可能不精确） / Trust header durations")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("以JSON格式输出 / Print JSON")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("recursive")
                        .long("recursive")
                        .short('r')
                        .help("递归扫描子目录 / Recurse into subdirectories")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("convert")
                .about("转换为WAV / Convert to WAV")
                .arg(
                    Arg::new("INPUT")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_name("FILE")
                        .help("输出文件（默认替换扩展名为.wav） / Output file")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("offset")
                        .long("offset")
                        .value_name("POS")
                        .allow_hyphen_values(true)
                        .help("起始位置，如 0.5s、4000（样本）、-1s / Start position")
                        .value_parser(parse_position),
                )
                .arg(
                    Arg::new("duration")
                        .long("duration")
                        .value_name("POS")
                        .allow_hyphen_values(true)
                        .help("时长，如 2s、500ms、8000（样本） / Duration")
                        .value_parser(parse_position),
                )
                .arg(
                    Arg::new("bit-depth")
                        .long("bit-depth")
                        .short('b')
                        .default_value("16")
                        .value_parser(clap::value_parser!(u16)),
                )
                .arg(
                    Arg::new("normalize")
                        .long("normalize")
                        .help("按峰值归一化 / Peak normalize")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("no-overwrite")
                        .long("no-overwrite")
                        .help("拒绝覆盖输入文件 / Refuse to overwrite the input")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("tools").about("显示外部工具状态 / Show external tools"))
}

fn config_from_matches(matches: &ArgMatches) -> AppConfig {
    let verbose = matches.get_flag("verbose");
    let command = match matches.subcommand() {
        Some(("info", sub)) => CliCommand::Info(InfoArgs {
            inputs: sub
                .get_many::<PathBuf>("INPUT")
                .map(|values| values.cloned().collect())
                .unwrap_or_default(),
            sloppy: sub.get_flag("sloppy"),
            json: sub.get_flag("json"),
            recursive: sub.get_flag("recursive"),
        }),
        Some(("convert", sub)) => CliCommand::Convert(ConvertArgs {
            input: sub.get_one::<PathBuf>("INPUT").cloned().unwrap_or_default(),
            output: sub.get_one::<PathBuf>("output").cloned(),
            offset: sub.get_one::<Position>("offset").copied(),
            duration: sub.get_one::<Position>("duration").copied(),
            bit_depth: sub.get_one::<u16>("bit-depth").copied().unwrap_or(16),
            normalize: sub.get_flag("normalize"),
            overwrite: !sub.get_flag("no-overwrite"),
        }),
        _ => CliCommand::Tools,
    };
    AppConfig { verbose, command }
}

/// 解析进程命令行参数
pub fn parse_args() -> AppConfig {
    config_from_matches(&build_cli().get_matches())
}

/// 解析给定参数（测试用）
pub fn try_parse_from<I, T>(args: I) -> Result<AppConfig, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = build_cli().try_get_matches_from(args)?;
    Ok(config_from_matches(&matches))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_info() {
        let config = try_parse_from(["audiofile", "info", "a.wav", "b.flac", "--json"]).unwrap();
        assert!(!config.verbose);
        let CliCommand::Info(args) = config.command else {
            panic!("expected info");
        };
        assert_eq!(args.inputs.len(), 2);
        assert!(args.json);
        assert!(!args.sloppy);
    }

    #[test]
    fn test_parse_convert_positions() {
        let config = try_parse_from([
            "audiofile",
            "-v",
            "convert",
            "in.opus",
            "--offset",
            "-0.5s",
            "--duration",
            "4000",
            "--no-overwrite",
        ])
        .unwrap();
        assert!(config.verbose);
        let CliCommand::Convert(args) = config.command else {
            panic!("expected convert");
        };
        assert_eq!(args.offset, Some(Position::seconds(-0.5)));
        assert_eq!(args.duration, Some(Position::samples(4000)));
        assert_eq!(args.bit_depth, 16);
        assert!(!args.overwrite);
    }

    #[test]
    fn test_rejects_bad_unit() {
        assert!(try_parse_from(["audiofile", "convert", "a.mp3", "--offset", "3parsecs"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        build_cli().debug_assert();
    }
}
