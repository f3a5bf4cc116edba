//! 命令行工具模块集成测试
//!
//! 扫描 → 查询 → 格式化 的完整流程，外部工具全部缺失。

mod audio_test_fixtures;
mod fake_tools;

use audio_test_fixtures::AudioTestFixtures;
use audiofile::tools::{self, CliCommand, InfoRecord, ToolRecord};
use audiofile::{AudioError, FormatTag, Tool};
use fake_tools::FakeTools;

fn log(msg_zh: impl AsRef<str>, msg_en: impl AsRef<str>) {
    println!("{} / {}", msg_zh.as_ref(), msg_en.as_ref());
}

#[test]
fn test_scan_query_and_render() {
    let fixtures = AudioTestFixtures::new();
    fixtures.create_noise_wav("a_tone.wav", 8000, 8000, 1);
    fixtures.create_opaque("b_clip.m4a");
    fixtures.create_opaque("readme.txt");

    let files = tools::scan_audio_files(&[fixtures.dir().to_path_buf()], false).unwrap();
    assert_eq!(files.len(), 2);

    let toolkit = FakeTools::new().toolkit();
    let records: Vec<InfoRecord> = files
        .iter()
        .map(|path| InfoRecord::query(&toolkit, path, false))
        .collect();

    assert_eq!(records[0].format, FormatTag::Wav);
    assert_eq!(records[0].info.unwrap().samples, 8000);
    assert!(records[1].error.as_deref().unwrap().contains("ffmpeg"));

    let table = tools::render_info_table(&records);
    assert!(table.contains("a_tone.wav"));
    assert!(table.contains("0:01.000"));
    assert!(table.contains("[FAIL]"));

    let json: serde_json::Value =
        serde_json::from_str(&tools::render_info_json(&records).unwrap()).unwrap();
    assert_eq!(json[0]["format"], "wav");
    assert_eq!(json[0]["info"]["sampling_rate"], 8000);
    assert_eq!(json[0]["info"]["bit_depth"], 16);
    assert!(json[1].get("info").is_none());
    log("  扫描-查询-格式化流程通过", "  Scan-query-render pipeline passed");
}

#[test]
fn test_sloppy_info_only_needs_a_probe_tool() {
    let fixtures = AudioTestFixtures::new();
    let path = fixtures.create_opaque("clip.m4a");
    let fake = FakeTools::new()
        .installed(&["mediainfo"])
        .mediainfo("Audio;%Channel(s)_Original%", "\n")
        .mediainfo("Audio;%Channel(s)%", "2\n")
        .mediainfo("Audio;%SamplingRate%", "44100\n")
        .mediainfo("Audio;%Duration%", "1500\n");
    let toolkit = fake.toolkit();

    let sloppy = InfoRecord::query(&toolkit, &path, true);
    assert!(sloppy.error.is_none(), "error: {:?}", sloppy.error);
    let info = sloppy.info.unwrap();
    assert_eq!(info.channels, 2);
    assert_eq!(info.sampling_rate, 44100);
    assert_eq!(info.samples, 66150);
    assert_eq!(info.bit_depth, None);
    // 只探测头部，不转码
    assert!(fake.calls_to("ffmpeg").is_empty());
    assert!(fake.calls_to("sox").is_empty());

    // 精确模式需要解码器
    let exact = InfoRecord::query(&toolkit, &path, false);
    assert!(exact.info.is_none());
    assert!(exact.error.unwrap().contains("ffmpeg"));
    log("  sloppy模式仅使用探测工具", "  Sloppy mode uses probe tools only");
}

#[test]
fn test_sloppy_info_native_and_empty_files() {
    let fixtures = AudioTestFixtures::new();
    let wav = fixtures.create_noise_wav("tone.wav", 8000, 4000, 2);
    let empty = fixtures.create_empty_file("empty.flac");
    let toolkit = FakeTools::new().toolkit();

    let record = InfoRecord::query(&toolkit, &wav, true);
    assert_eq!(record.info, Some(toolkit.info(&wav).unwrap()));
    let record = InfoRecord::query(&toolkit, &empty, true);
    assert!(record.info.unwrap().is_empty());
}

#[test]
fn test_scan_missing_input() {
    let fixtures = AudioTestFixtures::new();
    let result = tools::scan_audio_files(&[fixtures.get_path("nowhere")], true);
    assert!(matches!(result, Err(AudioError::FileNotFound { .. })));
}

#[test]
fn test_tools_table_reports_installation() {
    let fake = FakeTools::new().installed(&["ffmpeg"]);
    let toolkit = fake.toolkit();
    let records: Vec<ToolRecord> = Tool::ALL
        .into_iter()
        .map(|tool| ToolRecord {
            tool,
            program: toolkit.config().program(tool).to_path_buf(),
            installed: toolkit.has_tool(tool.name()),
            capabilities: toolkit.tool_capabilities(tool.name()),
        })
        .collect();

    assert_eq!(records.iter().filter(|r| r.installed).count(), 1);
    let table = tools::render_tools_table(&records);
    assert!(table.contains("mediainfo"));
    assert!(table.contains("Transcode"));
}

#[test]
fn test_cli_convert_defaults() {
    let config = tools::cli::try_parse_from(["audiofile", "convert", "song.flac"]).unwrap();
    let CliCommand::Convert(args) = config.command else {
        panic!("应解析为convert / expected convert");
    };
    assert_eq!(args.bit_depth, 16);
    assert!(args.overwrite);
    assert!(args.output.is_none());
    assert!(args.offset.is_none());
}
