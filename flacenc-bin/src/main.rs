// Copyright 2022-2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Note that clippy attributes should be in sync with those declared in "lib.rs"
#![warn(clippy::all, clippy::nursery, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::multiple_crate_versions,
    clippy::must_use_candidate
)]
// Some from restriction lint-group
#![warn(
    clippy::clone_on_ref_ptr,
    clippy::create_dir,
    clippy::dbg_macro,
    clippy::empty_structs_with_brackets,
    clippy::exit,
    clippy::if_then_some_else_none,
    clippy::impl_trait_in_params,
    clippy::let_underscore_must_use,
    clippy::lossy_float_literal,
    clippy::multiple_inherent_impl,
    clippy::print_stdout,
    clippy::rc_buffer,
    clippy::rc_mutex,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::separated_literal_suffix,
    clippy::str_to_string,
    clippy::string_add,
    clippy::string_to_string,
    clippy::try_err,
    clippy::unnecessary_self_imports,
    clippy::wildcard_enum_match_arm
)]

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use clap::Parser;
use log::error;
use log::info;

use flacenc_lite::component::BitRepr;
use flacenc_lite::component::Stream;
use flacenc_lite::config;
use flacenc_lite::error::Verify;

mod display;
mod source;

use display::Progress;
use source::HoundSource;

/// FLAC encoder for 16-bit WAV files.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path for the output FLAC file.
    #[clap(short, long)]
    output: String,
    /// Path for the input audio file.
    source: String,
    /// If set, load config from the specified file.
    #[clap(short, long)]
    config: Option<String>,
    /// If set, overrides the compression level of the config.
    #[clap(short = 'l', long)]
    compression_level: Option<usize>,
    /// If set, dump the config used to the specified path.
    #[clap(long)]
    dump_config: Option<String>,
}

/// Exit codes of the encoder process.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ExitCode {
    #[allow(dead_code)]
    Normal = 0,
    InvalidConfig = -1,
    Source = -2,
    Encode = -3,
    Io = -4,
}

/// Serializes `Stream` to a file and returns the number of bits written.
fn write_stream<F: Write>(stream: &Stream, file: &mut F) -> Result<usize, std::io::Error> {
    let bits = stream.count_bits();
    let mut bv = flacenc_lite::bitsink::ByteSink::with_capacity(bits);
    stream
        .write(&mut bv)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.write_all(bv.as_slice())?;
    Ok(bits)
}

fn log_build_constants() {
    info!(
        target: "flacenc-bin::build_info::jsonl",
        "{{ version: \"{}\" }}",
        flacenc_lite::constant::build_info::CRATE_VERSION,
    );
}

/// Loads the encoder config from the optional TOML file.
fn load_config<P: AsRef<Path>>(
    path: Option<P>,
    compression_level: Option<usize>,
) -> Result<config::Encoder, ExitCode> {
    let mut encoder_config = match path {
        None => config::Encoder::default(),
        Some(path) => {
            let conf_str = std::fs::read_to_string(path.as_ref()).map_err(|e| {
                error!("Failed to read config file: {e}");
                ExitCode::InvalidConfig
            })?;
            toml::from_str(&conf_str).map_err(|e| {
                error!("Config file syntax error: {e}");
                ExitCode::InvalidConfig
            })?
        }
    };
    if let Some(level) = compression_level {
        encoder_config.compression_level = level;
    }
    encoder_config.verify().map_err(|e| {
        eprintln!("Error: {}", e.within("encoder_config"));
        ExitCode::InvalidConfig
    })?;
    Ok(encoder_config)
}

fn dump_config<P: AsRef<Path>>(encoder_config: &config::Encoder, path: P) -> Result<(), ExitCode> {
    let conf_str = toml::to_string(encoder_config).map_err(|e| {
        error!("Failed to serialize config: {e}");
        ExitCode::InvalidConfig
    })?;
    std::fs::write(path, conf_str).map_err(|e| {
        error!("Failed to write config: {e}");
        ExitCode::Io
    })
}

/// Encodes the WAV file at `source_path` into `output_path`.
#[allow(clippy::let_underscore_must_use)]
fn encode_file(
    encoder_config: &config::Encoder,
    source_path: &str,
    output_path: &str,
    io_info: &display::IoArgs,
) -> Result<(), ExitCode> {
    let source = HoundSource::from_path(source_path).map_err(|e| {
        eprintln!("Error: {e}");
        ExitCode::Source
    })?;
    let source_bytes = source.file_size();
    let source_duration_secs = Some(source.duration_as_secs());
    let encoder_start = Instant::now();

    let stream =
        flacenc_lite::encode_with_fixed_block_size(encoder_config, source).map_err(|e| {
            eprintln!("Error: {e}");
            ExitCode::Encode
        })?;

    let bits_written = File::create(output_path)
        .and_then(|mut file| write_stream(&stream, &mut file))
        .map_err(|e| {
            eprintln!("Error: {e}");
            ExitCode::Io
        })?;

    let encode_time = encoder_start.elapsed();
    let _ = display::show_progress(
        io_info,
        &Progress::Done {
            encode_time,
            bits_written,
            source_bytes,
            source_duration_secs,
        },
    );
    Ok(())
}

#[allow(clippy::let_underscore_must_use)]
fn main_body(args: Args) -> Result<(), ExitCode> {
    let io_info = display::IoArgs::new(&args.config, &args.source, &args.output);
    let _ = display::show_banner();
    log_build_constants();
    let encoder_config = load_config(args.config.as_ref(), args.compression_level)?;

    if let Some(path) = args.dump_config {
        dump_config(&encoder_config, path)?;
    }

    let _ = display::show_progress(&io_info, &Progress::Started);
    encode_file(&encoder_config, &args.source, &args.output, &io_info)
}

fn main() -> Result<(), i32> {
    env_logger::Builder::from_env("FLACENC_LOG")
        .format_timestamp(None)
        .init();
    main_body(Args::parse()).map_err(|code| code as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;
    use tempfile::tempdir;

    fn write_test_wav(path: &Path, channels: u16, bits_per_sample: u16) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 44100,
            bits_per_sample,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for t in 0..10000i32 {
            for ch in 0..i32::from(channels) {
                let v = ((t * (ch + 3)) % 400) - 200;
                if bits_per_sample == 16 {
                    writer.write_sample(v as i16).unwrap();
                } else {
                    writer.write_sample(v << 8).unwrap();
                }
            }
        }
        writer.finalize().unwrap();
    }

    #[rstest]
    fn encodes_wav_file(
        #[values(1, 2)] channels: u16,
        #[values(None, Some(0), Some(12))] level: Option<usize>,
    ) {
        let dir = tempdir().unwrap();
        let wav = dir.path().join("in.wav");
        let flac = dir.path().join("out.flac");
        write_test_wav(&wav, channels, 16);

        let config = load_config::<&str>(None, level).unwrap();
        let io = display::IoArgs::new::<&str, _, _>(&None, &wav, &flac);
        encode_file(&config, wav.to_str().unwrap(), flac.to_str().unwrap(), &io).unwrap();

        let bytes = std::fs::read(&flac).unwrap();
        assert_eq!(&bytes[..4], b"fLaC");
        assert!(bytes.len() < 10000 * 2 * channels as usize);
    }

    #[test]
    fn rejects_24bit_wav() {
        let dir = tempdir().unwrap();
        let wav = dir.path().join("in.wav");
        let flac = dir.path().join("out.flac");
        write_test_wav(&wav, 2, 24);

        let config = config::Encoder::default();
        let io = display::IoArgs::new::<&str, _, _>(&None, &wav, &flac);
        let result = encode_file(&config, wav.to_str().unwrap(), flac.to_str().unwrap(), &io);
        assert_eq!(result, Err(ExitCode::Source));
        assert!(!flac.exists());
    }

    #[test]
    fn config_file_is_loaded_and_dumped() {
        let dir = tempdir().unwrap();
        let conf = dir.path().join("conf.toml");
        std::fs::write(&conf, "compression_level = 3\nblock_size = 2048\n").unwrap();
        let config = load_config(Some(&conf), None).unwrap();
        assert_eq!(config.compression_level, 3);
        assert_eq!(config.block_size, Some(2048));

        let dumped = dir.path().join("dumped.toml");
        dump_config(&config, &dumped).unwrap();
        let reloaded = load_config(Some(&dumped), Some(7)).unwrap();
        assert_eq!(reloaded.block_size, Some(2048));
        assert_eq!(reloaded.compression_level, 7);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let dir = tempdir().unwrap();
        let conf = dir.path().join("conf.toml");
        std::fs::write(&conf, "compression_level = 13\n").unwrap();
        assert_eq!(
            load_config(Some(&conf), None).err(),
            Some(ExitCode::InvalidConfig)
        );
        std::fs::write(&conf, "compression_level = \"fast\"\n").unwrap();
        assert_eq!(
            load_config(Some(&conf), None).err(),
            Some(ExitCode::InvalidConfig)
        );
    }
}
