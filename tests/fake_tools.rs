//! 脚本化的外部工具
//!
//! 模拟 sox / ffmpeg / ffprobe / mediainfo 的安装状态与输出，
//! 不依赖测试机器上真实安装的程序。

#![allow(dead_code)]

use audiofile::backend::{CommandRunner, ToolOutput};
use audiofile::config::ToolchainConfig;
use audiofile::AudioToolkit;
use std::collections::HashMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct FakeTools {
    installed: Vec<String>,
    /// 外部文件"解码"后的内容
    decoded: Option<PathBuf>,
    sox_info: HashMap<String, String>,
    ffprobe_json: Option<String>,
    mediainfo: HashMap<String, String>,
    broken: bool,
    calls: Arc<Mutex<Vec<String>>>,
    /// 版本查询（安装检测）记录，包括未安装的程序
    probes: Arc<Mutex<Vec<String>>>,
}

impl FakeTools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn installed(mut self, programs: &[&str]) -> Self {
        self.installed = programs.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn decodes_to(mut self, wav: impl Into<PathBuf>) -> Self {
        self.decoded = Some(wav.into());
        self
    }

    pub fn sox_info(mut self, flag: &str, stdout: &str) -> Self {
        self.sox_info.insert(flag.to_string(), stdout.to_string());
        self
    }

    pub fn ffprobe_json(mut self, json: &str) -> Self {
        self.ffprobe_json = Some(json.to_string());
        self
    }

    pub fn mediainfo(mut self, template: &str, stdout: &str) -> Self {
        self.mediainfo.insert(template.to_string(), stdout.to_string());
        self
    }

    /// 所有非版本查询都以非零状态退出
    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    /// 使用该执行器的工具箱（忽略环境变量中的路径覆盖）
    pub fn toolkit(&self) -> AudioToolkit {
        AudioToolkit::new()
            .with_config(ToolchainConfig::default())
            .with_runner(self.clone())
    }

    /// 已记录的调用（不含版本查询），格式为 "程序 参数..."
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn version_probes(&self) -> Vec<String> {
        self.probes.lock().unwrap().clone()
    }

    pub fn calls_to(&self, program: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.split(' ').next() == Some(program))
            .collect()
    }

    fn transcode(&self, input: &Path, output: &Path) -> io::Result<ToolOutput> {
        let is_wav = input.extension().is_some_and(|e| e == "wav");
        let source = if is_wav {
            input.to_path_buf()
        } else {
            match &self.decoded {
                Some(decoded) => decoded.clone(),
                None => return Ok(ToolOutput::failed(2, "no decoder for input")),
            }
        };
        std::fs::copy(source, output)?;
        Ok(ToolOutput::ok(""))
    }
}

impl CommandRunner for FakeTools {
    fn run(&self, program: &Path, args: &[OsString]) -> io::Result<ToolOutput> {
        let name = program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let is_version_query = matches!(
            args.as_slice(),
            [flag] if flag.eq_ignore_ascii_case("--version") || flag == "-version"
        );
        if is_version_query {
            self.probes.lock().unwrap().push(name.clone());
        }

        if !self.installed.contains(&name) {
            return Err(io::Error::from(io::ErrorKind::NotFound));
        }
        if is_version_query {
            return Ok(ToolOutput::ok(format!("{name} version fake")));
        }

        self.calls
            .lock()
            .unwrap()
            .push(format!("{name} {}", args.join(" ")));

        if self.broken {
            return Ok(ToolOutput::failed(
                1,
                format!("{name} FAIL formats: can't open input file"),
            ));
        }

        // "sox-custom" 等自定义路径按前缀识别
        match name.split('-').next().unwrap_or_default() {
            "sox" if args.first().map(String::as_str) == Some("--i") => Ok(ToolOutput::ok(
                self.sox_info.get(&args[1]).cloned().unwrap_or_default(),
            )),
            "sox" => {
                let input = PathBuf::from(&args[1]);
                let output = PathBuf::from(args.last().unwrap());
                self.transcode(&input, &output)
            }
            "ffmpeg" => {
                let position = args.iter().position(|a| a == "-i").unwrap();
                let input = PathBuf::from(&args[position + 1]);
                let output = PathBuf::from(args.last().unwrap());
                self.transcode(&input, &output)
            }
            "ffprobe" => Ok(ToolOutput::ok(
                self.ffprobe_json.clone().unwrap_or_else(|| "{}".to_string()),
            )),
            "mediainfo" => {
                let template = args[0].trim_start_matches("--Inform=");
                Ok(ToolOutput::ok(
                    self.mediainfo.get(template).cloned().unwrap_or_default(),
                ))
            }
            _ => Ok(ToolOutput::failed(1, "unexpected program")),
        }
    }
}
