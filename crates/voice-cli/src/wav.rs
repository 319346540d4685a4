//! WAV decoding into a normalized mono waveform

use hound::{SampleFormat, WavReader};
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::debug;
use voice_features::{ExtractionError, Waveform};

/// Errors while loading audio
#[derive(Debug, Error)]
pub enum AudioLoadError {
    #[error("Failed to read WAV: {0}")]
    Wav(#[from] hound::Error),

    #[error("Only mono recordings are supported, got {0} channels")]
    NotMono(u16),

    #[error("Unsupported sample format: {bits}-bit {format:?}")]
    UnsupportedFormat { format: SampleFormat, bits: u16 },

    #[error(transparent)]
    Waveform(#[from] ExtractionError),
}

/// Read a mono WAV file from disk
pub fn read_waveform(path: &Path) -> Result<Waveform, AudioLoadError> {
    let reader = WavReader::open(path)?;
    decode(reader)
}

/// Decode mono integer or float PCM into [-1, 1] samples
pub fn decode<R: Read>(mut reader: WavReader<R>) -> Result<Waveform, AudioLoadError> {
    let spec = reader.spec();
    if spec.channels != 1 {
        return Err(AudioLoadError::NotMono(spec.channels));
    }
    debug!(
        sample_rate = spec.sample_rate,
        bits = spec.bits_per_sample,
        format = ?spec.sample_format,
        "Decoding WAV"
    );

    let waveform = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => {
            let samples = reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?;
            Waveform::from_f32(&samples, spec.sample_rate)?
        }
        (SampleFormat::Int, bits @ 8..=32) => {
            let samples = reader.samples::<i32>().collect::<Result<Vec<_>, _>>()?;
            Waveform::from_pcm_ints(&samples, bits, spec.sample_rate)?
        }
        (format, bits) => return Err(AudioLoadError::UnsupportedFormat { format, bits }),
    };
    Ok(waveform)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};
    use std::io::Cursor;

    fn encode<F: FnOnce(&mut WavWriter<&mut Cursor<Vec<u8>>>)>(spec: WavSpec, write: F) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            write(&mut writer);
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn spec(channels: u16, bits: u16, format: SampleFormat) -> WavSpec {
        WavSpec {
            channels,
            sample_rate: 16000,
            bits_per_sample: bits,
            sample_format: format,
        }
    }

    #[test]
    fn test_decode_i16() {
        let bytes = encode(spec(1, 16, SampleFormat::Int), |w| {
            for s in [0i16, 16384, -32768] {
                w.write_sample(s).unwrap();
            }
        });
        let wave = decode(WavReader::new(Cursor::new(bytes)).unwrap()).unwrap();
        assert_eq!(wave.sample_rate(), 16000);
        assert_eq!(wave.samples(), &[0.0, 0.5, -1.0]);
    }

    #[test]
    fn test_decode_f32() {
        let bytes = encode(spec(1, 32, SampleFormat::Float), |w| {
            for s in [0.25f32, -0.75] {
                w.write_sample(s).unwrap();
            }
        });
        let wave = decode(WavReader::new(Cursor::new(bytes)).unwrap()).unwrap();
        assert_eq!(wave.samples(), &[0.25, -0.75]);
    }

    #[test]
    fn test_stereo_rejected() {
        let bytes = encode(spec(2, 16, SampleFormat::Int), |w| {
            for s in [1i16, 2, 3, 4] {
                w.write_sample(s).unwrap();
            }
        });
        let err = decode(WavReader::new(Cursor::new(bytes)).unwrap()).unwrap_err();
        assert!(matches!(err, AudioLoadError::NotMono(2)));
    }

    #[test]
    fn test_empty_file_is_invalid_audio() {
        let bytes = encode(spec(1, 16, SampleFormat::Int), |_| {});
        let err = decode(WavReader::new(Cursor::new(bytes)).unwrap()).unwrap_err();
        assert!(matches!(
            err,
            AudioLoadError::Waveform(ExtractionError::InvalidAudio(_))
        ));
    }
}
