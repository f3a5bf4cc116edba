//! 顶层门面
//!
//! [`AudioToolkit`] 持有所有协作者：原生编解码器、子进程执行器、
//! 工具路径配置和可用性缓存。元数据查询、读取、写入分别在
//! `resolver`、`reader`、`writer` 模块中以 `impl AudioToolkit` 的形式实现。

use crate::audio::format::FormatSpec;
use crate::audio::native::{NativeCodec, SoundCodec};
use crate::backend::{
    self, Backend, BackendContext, Capability, CommandRunner, SystemRunner, Tool,
    ToolAvailability, TranscodeTarget,
};
use crate::config::{ToolchainConfig, defaults};
use crate::error::{self, AudioResult};
use std::path::Path;
use std::sync::OnceLock;
use tempfile::TempPath;
use tracing::debug;

/// 音频文件工具箱
pub struct AudioToolkit {
    codec: Box<dyn NativeCodec>,
    runner: Box<dyn CommandRunner>,
    config: ToolchainConfig,
    availability: ToolAvailability,
}

impl Default for AudioToolkit {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioToolkit {
    /// 使用真实子进程和环境变量配置创建
    pub fn new() -> Self {
        Self {
            codec: Box::new(SoundCodec),
            runner: Box::new(SystemRunner),
            config: ToolchainConfig::from_env(),
            availability: ToolAvailability::new(),
        }
    }

    /// 替换子进程执行器（同时清空可用性缓存）
    pub fn with_runner(mut self, runner: impl CommandRunner + 'static) -> Self {
        self.runner = Box::new(runner);
        self.availability.reset();
        self
    }

    /// 替换原生编解码器
    pub fn with_codec(mut self, codec: impl NativeCodec + 'static) -> Self {
        self.codec = Box::new(codec);
        self
    }

    /// 替换工具路径配置（同时清空可用性缓存）
    pub fn with_config(mut self, config: ToolchainConfig) -> Self {
        self.config = config;
        self.availability.reset();
        self
    }

    pub fn config(&self) -> &ToolchainConfig {
        &self.config
    }

    /// 可用性缓存（测试可通过 `set` / `reset` 模拟工具缺失）
    pub fn availability(&self) -> &ToolAvailability {
        &self.availability
    }

    pub(crate) fn codec(&self) -> &dyn NativeCodec {
        self.codec.as_ref()
    }

    pub(crate) fn ctx(&self) -> BackendContext<'_> {
        BackendContext {
            runner: self.runner.as_ref(),
            config: &self.config,
        }
    }

    pub(crate) fn is_installed(&self, tool: Tool) -> bool {
        self.availability
            .is_installed(tool, &self.config, self.runner.as_ref())
    }

    /// 工具是否已安装；未知的工具名返回false
    pub fn has_tool(&self, name: &str) -> bool {
        Tool::from_name(name).is_some_and(|tool| self.is_installed(tool))
    }

    /// 已安装工具提供的能力；未知或未安装时为空
    pub fn tool_capabilities(&self, name: &str) -> Vec<Capability> {
        match Tool::from_name(name) {
            Some(tool) => self
                .availability
                .capabilities(tool, &self.config, self.runner.as_ref()),
            None => Vec::new(),
        }
    }

    /// 按优先级选出第一个可用后端；全部缺失时返回 `MissingDependency`
    pub(crate) fn first_backend(
        &self,
        path: &Path,
        backends: &[Backend],
        capability: Capability,
    ) -> AudioResult<Backend> {
        let candidates = backend::select(backends, capability, |tool| self.is_installed(tool));
        match candidates.first() {
            Some(&chosen) => {
                debug!("{:?} 使用后端 {chosen}: {}", capability, path.display());
                Ok(chosen)
            }
            None => Err(error::missing_dependency(
                path,
                &backend::expected_tools(backends, capability),
            )),
        }
    }

    /// 创建唯一命名的临时WAV文件，离开作用域（包括panic展开）时删除
    pub(crate) fn temp_wav(&self) -> AudioResult<TempPath> {
        let file = tempfile::Builder::new()
            .prefix(defaults::TEMP_PREFIX)
            .suffix(".wav")
            .tempfile()?;
        Ok(file.into_temp_path())
    }

    /// 把外部格式完整转码为临时32位浮点WAV
    pub(crate) fn transcode_to_wav(
        &self,
        path: &Path,
        spec: &FormatSpec,
    ) -> AudioResult<TempPath> {
        let backend = self.first_backend(path, spec.backends, Capability::Transcode)?;

        // ffmpeg默认把opus解码为48kHz，需要显式保持原始采样率
        let sampling_rate = if spec.force_sampling_rate && backend == Backend::Ffmpeg {
            Some(self.sampling_rate(path)?)
        } else {
            None
        };

        let temp = self.temp_wav()?;
        backend.transcode(
            self.ctx(),
            path,
            &temp,
            TranscodeTarget::IntermediateWav { sampling_rate },
        )?;
        Ok(temp)
    }
}

/// 进程级默认实例（供顶层自由函数使用）
pub fn global() -> &'static AudioToolkit {
    static TOOLKIT: OnceLock<AudioToolkit> = OnceLock::new();
    TOOLKIT.get_or_init(AudioToolkit::new)
}
