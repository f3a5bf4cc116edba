//! 文件扫描模块
//!
//! 命令行给出的文件原样保留；目录按格式表中的扩展名筛选音频文件。

use crate::audio::format::{FormatTag, spec_for_path};
use crate::error::{AudioError, AudioResult};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 扩展名是否在格式表中
fn is_audio_file(path: &Path) -> bool {
    spec_for_path(path).tag != FormatTag::Other
}

/// 展开输入路径
///
/// `recursive` 为false时只扫描目录的第一层。结果按路径排序、去重。
pub fn scan_audio_files(inputs: &[PathBuf], recursive: bool) -> AudioResult<Vec<PathBuf>> {
    let mut audio_files = Vec::new();

    for input in inputs {
        if !input.exists() {
            return Err(AudioError::FileNotFound {
                path: input.clone(),
            });
        }
        if !input.is_dir() {
            audio_files.push(input.clone());
            continue;
        }

        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut found: Vec<PathBuf> = WalkDir::new(input)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_audio_file(e.path()))
            .map(|e| e.into_path())
            .collect();
        found.sort();
        audio_files.extend(found);
    }

    audio_files.dedup();
    Ok(audio_files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_scan_filters_and_recurses() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.wav"), b"").unwrap();
        fs::write(dir.path().join("a.m4a"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("c.opus"), b"").unwrap();

        let flat = scan_audio_files(&[dir.path().to_path_buf()], false).unwrap();
        let names: Vec<_> = flat
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.m4a", "b.wav"]);

        let deep = scan_audio_files(&[dir.path().to_path_buf()], true).unwrap();
        assert_eq!(deep.len(), 3);
    }

    #[test]
    fn test_explicit_files_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("clip.xyz");
        fs::write(&file, b"data").unwrap();
        assert_eq!(scan_audio_files(&[file.clone()], false).unwrap(), vec![file]);

        let missing = dir.path().join("missing.wav");
        assert!(matches!(
            scan_audio_files(&[missing], false),
            Err(AudioError::FileNotFound { .. })
        ));
    }
}
