//! 音频测试固件生成器
//!
//! 所有固件写入独立的临时目录，测试结束自动删除。

#![allow(dead_code)]

use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn log(msg_zh: impl AsRef<str>, msg_en: impl AsRef<str>) {
    println!("{} / {}", msg_zh.as_ref(), msg_en.as_ref());
}

/// 确定性的伪随机噪声（线性同余），范围 [-0.5, 0.5)
pub fn noise(len: usize, seed: u64) -> Vec<f64> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 11) as f64 / (1u64 << 53) as f64) - 0.5
        })
        .collect()
}

pub struct AudioTestFixtures {
    dir: TempDir,
}

impl AudioTestFixtures {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("无法创建临时固件目录"),
        }
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// 获取固件路径
    pub fn get_path(&self, filename: &str) -> PathBuf {
        self.dir.path().join(filename)
    }

    /// 16位噪声WAV（交错写入）
    pub fn create_noise_wav(
        &self,
        filename: &str,
        sample_rate: u32,
        frames: usize,
        channels: u16,
    ) -> PathBuf {
        let path = self.get_path(filename);
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let samples = noise(frames * channels as usize, frames as u64);
        {
            let mut writer = WavWriter::create(&path, spec).expect("无法创建噪声文件");
            for sample in samples {
                writer
                    .write_sample((sample * 32768.0) as i16)
                    .expect("无法写入样本");
            }
            writer.finalize().expect("无法完成写入");
        }
        log(
            format!("  生成 {filename} ({frames} 帧, {channels} 声道)"),
            format!("  Generated {filename} ({frames} frames, {channels} channels)"),
        );
        path
    }

    /// 0字节文件
    pub fn create_empty_file(&self, filename: &str) -> PathBuf {
        let path = self.get_path(filename);
        File::create(&path).expect("无法创建空文件");
        path
    }

    /// 伪装文件（文本内容，音频扩展名）
    pub fn create_fake_audio(&self, filename: &str) -> PathBuf {
        let path = self.get_path(filename);
        let mut file = File::create(&path).expect("无法创建伪装文件");
        file.write_all(b"This is not a valid audio file!\n")
            .expect("写入失败");
        path
    }

    /// 任意内容的"外部格式"文件（内容由假工具决定）
    pub fn create_opaque(&self, filename: &str) -> PathBuf {
        let path = self.get_path(filename);
        std::fs::write(&path, b"opaque container bytes").expect("写入失败");
        path
    }
}

impl Default for AudioTestFixtures {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_generation() {
        let fixtures = AudioTestFixtures::new();
        let path = fixtures.create_noise_wav("noise.wav", 8000, 8000, 1);
        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.duration(), 8000);

        let empty = fixtures.create_empty_file("empty.wav");
        assert_eq!(std::fs::metadata(empty).unwrap().len(), 0);
    }

    #[test]
    fn test_noise_is_deterministic_and_bounded() {
        let a = noise(1000, 7);
        assert_eq!(a, noise(1000, 7));
        assert!(a.iter().all(|s| (-0.5..0.5).contains(s)));
    }
}
