//! 外部工具可用性缓存
//!
//! 每个工具在进程生命周期内只探测一次（版本查询）。并发首次访问可能
//! 重复探测同一工具，结果相同，无害。

use super::runner::CommandRunner;
use super::{Capability, Tool};
use crate::config::ToolchainConfig;
use std::collections::HashMap;
use std::ffi::OsString;
use std::sync::RwLock;
use tracing::debug;

/// 工具安装状态缓存
#[derive(Debug, Default)]
pub struct ToolAvailability {
    cache: RwLock<HashMap<Tool, bool>>,
}

impl ToolAvailability {
    pub fn new() -> Self {
        Self::default()
    }

    /// 工具是否已安装（首次调用时探测并缓存）
    ///
    /// 能成功启动即视为已安装，不关心版本查询的退出码。
    pub fn is_installed(
        &self,
        tool: Tool,
        config: &ToolchainConfig,
        runner: &dyn CommandRunner,
    ) -> bool {
        if let Some(installed) = self.cached(tool) {
            return installed;
        }

        let args: Vec<OsString> = tool.version_args().iter().map(OsString::from).collect();
        let installed = runner.run(config.program(tool), &args).is_ok();
        debug!("探测 {tool}: {}", if installed { "已安装" } else { "未安装" });

        self.set(tool, installed);
        installed
    }

    /// 已安装工具提供的能力（未安装时为空）
    pub fn capabilities(
        &self,
        tool: Tool,
        config: &ToolchainConfig,
        runner: &dyn CommandRunner,
    ) -> Vec<Capability> {
        if self.is_installed(tool, config, runner) {
            tool.capabilities().to_vec()
        } else {
            Vec::new()
        }
    }

    /// 读取缓存，不触发探测
    pub fn cached(&self, tool: Tool) -> Option<bool> {
        let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
        cache.get(&tool).copied()
    }

    /// 覆盖某个工具的状态（测试用：模拟工具缺失）
    pub fn set(&self, tool: Tool, installed: bool) {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.insert(tool, installed);
    }

    /// 清空缓存，下次访问重新探测
    pub fn reset(&self) {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::runner::ToolOutput;
    use std::io;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 只认识sox的执行器，记录调用次数
    #[derive(Default)]
    struct OnlySox {
        calls: AtomicUsize,
    }

    impl CommandRunner for OnlySox {
        fn run(&self, program: &Path, _args: &[OsString]) -> io::Result<ToolOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if program == Path::new("sox") {
                Ok(ToolOutput::failed(1, "usage"))
            } else {
                Err(io::Error::from(io::ErrorKind::NotFound))
            }
        }
    }

    #[test]
    fn test_probes_once_per_tool() {
        let runner = OnlySox::default();
        let config = ToolchainConfig::default();
        let availability = ToolAvailability::new();

        assert!(availability.is_installed(Tool::Sox, &config, &runner));
        assert!(availability.is_installed(Tool::Sox, &config, &runner));
        assert!(!availability.is_installed(Tool::Ffmpeg, &config, &runner));
        assert!(!availability.is_installed(Tool::Ffmpeg, &config, &runner));
        assert_eq!(runner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_set_and_reset() {
        let runner = OnlySox::default();
        let config = ToolchainConfig::default();
        let availability = ToolAvailability::new();

        availability.set(Tool::Sox, false);
        assert!(!availability.is_installed(Tool::Sox, &config, &runner));
        assert!(availability.capabilities(Tool::Sox, &config, &runner).is_empty());
        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);

        availability.reset();
        assert_eq!(availability.cached(Tool::Sox), None);
        assert_eq!(
            availability.capabilities(Tool::Sox, &config, &runner),
            vec![Capability::Probe, Capability::Transcode]
        );
    }
}
