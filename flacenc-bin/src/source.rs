// Copyright 2023-2024 Google LLC
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

//! A module for signal sources for "flacenc-bin".

use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;

use flacenc_lite::error::SourceError;
use flacenc_lite::error::SourceErrorReason;
use flacenc_lite::source::FrameBuf;
use flacenc_lite::source::Source;

const BYTES_PER_SAMPLE: usize = 2;

/// `flacenc_lite::source::Source` based on `hound::WavReader`.
///
/// hound is only used for parsing the WAV header. After that, samples are
/// read in blocks from the `BufReader` obtained via `WavReader::into_inner`.
/// Only 16-bit integer WAVs are accepted.
#[allow(clippy::module_name_repetitions)]
pub struct HoundSource {
    spec: hound::WavSpec,
    duration: usize,
    reader: BufReader<File>,
    bytebuf: Vec<u8>,
    samplebuf: Vec<i16>,
    current_offset: usize,
    file_size: Option<usize>,
}

impl HoundSource {
    /// Constructs `HoundSource` from `path`.
    ///
    /// # Errors
    ///
    /// Returns `SourceError` with `SourceErrorReason::UnsupportedFormat` if
    /// the samples are not 16-bit integers, and `SourceErrorReason::IO` if
    /// the file cannot be opened or parsed.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let name = path.as_ref().to_string_lossy().to_string();
        let file_size = path.as_ref().metadata().ok().map(|x| x.len() as usize);
        let mut reader = hound::WavReader::open(path)
            .map_err(|e| SourceError::from_io_error(e).set_name(&name))?;
        let spec = reader.spec();
        if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(
                SourceError::by_reason(SourceErrorReason::UnsupportedFormat).set_name(&name),
            );
        }
        let duration = reader.duration() as usize;
        reader
            .seek(0)
            .map_err(|e| SourceError::from_io_error(e).set_name(&name))?;
        Ok(Self {
            spec,
            duration,
            reader: reader.into_inner(),
            bytebuf: Vec::new(),
            samplebuf: Vec::new(),
            current_offset: 0,
            file_size,
        })
    }

    pub const fn file_size(&self) -> Option<usize> {
        self.file_size
    }

    pub fn duration_as_secs(&self) -> f32 {
        self.duration as f32 / self.spec.sample_rate as f32
    }
}

impl Source for HoundSource {
    #[inline]
    fn channels(&self) -> usize {
        self.spec.channels as usize
    }

    #[inline]
    fn sample_rate(&self) -> usize {
        self.spec.sample_rate as usize
    }

    fn read_samples(&mut self, dest: &mut FrameBuf) -> Result<usize, SourceError> {
        let channels = self.channels();
        if dest.channels() != channels {
            return Err(SourceError::by_reason(SourceErrorReason::InvalidBuffer));
        }
        let to_read = std::cmp::min(self.duration - self.current_offset, dest.size());
        let to_read_bytes = to_read * BYTES_PER_SAMPLE * channels;

        self.bytebuf.clear();
        (&mut self.reader)
            .take(to_read_bytes as u64)
            .read_to_end(&mut self.bytebuf)
            .map_err(SourceError::from_io_error)?;

        self.samplebuf.clear();
        self.samplebuf.extend(
            self.bytebuf
                .chunks_exact(BYTES_PER_SAMPLE)
                .map(|b| i16::from_le_bytes([b[0], b[1]])),
        );
        dest.fill_from_interleaved(&self.samplebuf);

        let read = self.samplebuf.len() / channels;
        self.current_offset += read;
        Ok(read)
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.duration)
    }
}
