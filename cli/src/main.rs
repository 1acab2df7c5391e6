mod error;
mod export;
mod wav;

use clap::{Args, Parser, Subcommand, ValueEnum};
use error::CliError;
use export::{write_display, CsvSink, JsonSink, OutputFormat, XlsxSink};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tonepeak_core::{
    AudioSource, BitThreshold, DemodConfig, Demodulator, FrameLayout, ParityScheme, PeakOrder,
    ResultSink, ResultTable, ToneBurstModulator,
};
use wav::{write_wav, WavSource};

#[derive(Parser)]
#[command(name = "tonepeak")]
#[command(about = "Decode bits sent as acoustic tone bursts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a mono WAV capture into a result table (.csv, .json or .xlsx)
    Decode {
        /// Input WAV file
        #[arg(value_name = "INPUT.WAV")]
        input: PathBuf,

        /// Output table, format picked from the extension
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Parity bits reported by the sender, one per frame
        #[arg(short, long, default_value = "1,0,1,0,0,0,0,1")]
        expected_parity: String,

        /// Write the carrier-band spectrogram and constellation as JSON
        #[arg(long, value_name = "DISPLAY.JSON")]
        display: Option<PathBuf>,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Synthesize tone bursts for a bit string into a WAV file
    Synth {
        /// Bits to send, e.g. 10110010 or 1,0,1,1
        #[arg(value_name = "BITS")]
        bits: String,

        /// Output WAV file
        #[arg(value_name = "OUTPUT.WAV")]
        output: PathBuf,

        /// Sample rate in Hz
        #[arg(long, default_value_t = tonepeak_core::SAMPLE_RATE)]
        sample_rate: u32,

        /// Carrier for 0 bits in Hz
        #[arg(long, default_value_t = tonepeak_core::tone::TONE_LOW_HZ)]
        low_tone: f32,

        /// Carrier for 1 bits in Hz
        #[arg(long, default_value_t = tonepeak_core::tone::TONE_HIGH_HZ)]
        high_tone: f32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderArg {
    /// Frequency bin first, then time
    Freq,
    /// Time frame first, then frequency
    Time,
}

#[derive(Clone, Copy, ValueEnum)]
enum ParityArg {
    Even,
    Odd,
}

#[derive(Args)]
struct PipelineArgs {
    /// Capture duration in seconds (input is truncated or zero-padded)
    #[arg(long, default_value_t = tonepeak_core::CAPTURE_DURATION_SECS)]
    duration: f32,

    /// Band-pass low cutoff in Hz
    #[arg(long, default_value_t = tonepeak_core::LOW_CUT_HZ)]
    low_cut: f32,

    /// Band-pass high cutoff in Hz
    #[arg(long, default_value_t = tonepeak_core::HIGH_CUT_HZ)]
    high_cut: f32,

    /// Butterworth order
    #[arg(long, default_value_t = tonepeak_core::FILTER_ORDER)]
    order: usize,

    /// STFT window size in samples
    #[arg(long, default_value_t = tonepeak_core::WINDOW_SIZE)]
    window_size: usize,

    /// STFT hop size in samples
    #[arg(long, default_value_t = tonepeak_core::HOP_SIZE)]
    hop_size: usize,

    /// Peak neighborhood half-width in frequency bins
    #[arg(long, default_value_t = tonepeak_core::DIST_FREQ)]
    dist_freq: usize,

    /// Peak neighborhood half-width in time frames
    #[arg(long, default_value_t = tonepeak_core::DIST_TIME)]
    dist_time: usize,

    /// Magnitude a peak must exceed
    #[arg(long, default_value_t = tonepeak_core::PEAK_THRESHOLD)]
    thresh: f32,

    /// Multiplier on the max dB for the decibel mask
    #[arg(long, default_value_t = tonepeak_core::DB_MASK_THRESHOLD)]
    db_thresh: f32,

    /// Frequency-bin index above which a peak decodes as 1
    #[arg(long, default_value_t = tonepeak_core::THRESHOLD_BIN, conflicts_with = "threshold_hz")]
    threshold_bin: usize,

    /// Frequency in Hz above which a peak decodes as 1 (converted to a bin)
    #[arg(long)]
    threshold_hz: Option<f32>,

    /// Peak ordering before framing
    #[arg(long, value_enum, default_value_t = OrderArg::Freq)]
    peak_order: OrderArg,

    /// Bits per frame
    #[arg(long, default_value_t = tonepeak_core::FRAME_SIZE)]
    frame_size: usize,

    #[arg(long, value_enum, default_value_t = ParityArg::Even)]
    parity: ParityArg,
}

impl PipelineArgs {
    fn to_config(&self, sample_rate: u32) -> DemodConfig {
        DemodConfig {
            sample_rate,
            duration_secs: self.duration,
            low_cut_hz: self.low_cut,
            high_cut_hz: self.high_cut,
            order: self.order,
            window_size: self.window_size,
            hop_size: self.hop_size,
            dist_freq: self.dist_freq,
            dist_time: self.dist_time,
            thresh: self.thresh,
            db_thresh: self.db_thresh,
            bit_threshold: match self.threshold_hz {
                Some(hz) => BitThreshold::Hertz(hz),
                None => BitThreshold::Bin(self.threshold_bin),
            },
            peak_order: match self.peak_order {
                OrderArg::Freq => PeakOrder::FrequencyMajor,
                OrderArg::Time => PeakOrder::TimeMajor,
            },
            layout: FrameLayout {
                frame_size: self.frame_size,
                parity: match self.parity {
                    ParityArg::Even => ParityScheme::Even,
                    ParityArg::Odd => ParityScheme::Odd,
                },
            },
        }
    }
}

/// Parse "1,0,1" or "101" into bits
fn parse_bits(text: &str) -> Result<Vec<u8>, CliError> {
    text.chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .map(|c| match c {
            '0' => Ok(0),
            '1' => Ok(1),
            _ => Err(CliError::InvalidBits(text.to_string())),
        })
        .collect()
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Decode {
            input,
            output,
            expected_parity,
            display,
            pipeline,
        } => decode_command(&input, &output, &expected_parity, display.as_deref(), &pipeline),
        Commands::Synth {
            bits,
            output,
            sample_rate,
            low_tone,
            high_tone,
        } => synth_command(&bits, &output, sample_rate, low_tone, high_tone),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn decode_command(
    input_path: &PathBuf,
    output_path: &PathBuf,
    expected_parity: &str,
    display_path: Option<&Path>,
    pipeline: &PipelineArgs,
) -> Result<(), CliError> {
    let expected = parse_bits(expected_parity)?;
    let format = OutputFormat::from_path(output_path)?;

    let mut source = WavSource::open(input_path, pipeline.duration)?;
    let config = pipeline.to_config(source.sample_rate());
    let mut demod = Demodulator::new(config)?;

    let buffer = source.capture()?;
    let decoded = demod.demodulate(&buffer)?;

    if let Some(path) = display_path {
        write_display(path, &demod.display_view(&decoded))?;
        log::info!("Wrote display view to {}", path.display());
    }

    let frame_size = demod.config().layout.frame_size;
    let table = ResultTable::build(decoded.frames, &expected, frame_size)?;

    let mut sink: Box<dyn ResultSink> = match format {
        OutputFormat::Csv => Box::new(CsvSink::new(output_path.clone())),
        OutputFormat::Json => Box::new(JsonSink::new(output_path.clone())),
        OutputFormat::Xlsx => Box::new(XlsxSink::new(output_path.clone())),
    };
    sink.consume(&table)?;

    println!(
        "Decoded {} frames ({} parity matches)",
        table.len(),
        table.match_count()
    );
    println!("Wrote {}", output_path.display());
    Ok(())
}

fn synth_command(
    bits: &str,
    output_path: &PathBuf,
    sample_rate: u32,
    low_tone: f32,
    high_tone: f32,
) -> Result<(), CliError> {
    let bits = parse_bits(bits)?;
    let modulator = ToneBurstModulator::new()
        .with_sample_rate(sample_rate)
        .with_tones(low_tone, high_tone);
    let samples = modulator.modulate(&bits)?;
    println!("Encoded {} bits to {} audio samples", bits.len(), samples.len());

    write_wav(output_path, &samples, sample_rate)?;
    println!("Wrote {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bits() {
        assert_eq!(parse_bits("1,0,1").unwrap(), vec![1, 0, 1]);
        assert_eq!(parse_bits("10 11").unwrap(), vec![1, 0, 1, 1]);
        assert!(parse_bits("").unwrap().is_empty());
        assert!(matches!(parse_bits("1,2"), Err(CliError::InvalidBits(_))));
    }

    #[test]
    fn test_default_args_match_default_config() {
        let cli = Cli::parse_from(["tonepeak", "decode", "in.wav", "out.csv"]);
        let Commands::Decode { pipeline, expected_parity, .. } = cli.command else {
            panic!("expected decode command");
        };
        assert_eq!(pipeline.to_config(44000), DemodConfig::default());
        assert_eq!(parse_bits(&expected_parity).unwrap(), vec![1, 0, 1, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_threshold_hz_flag() {
        let cli = Cli::parse_from([
            "tonepeak",
            "decode",
            "in.wav",
            "out.json",
            "--threshold-hz",
            "5800",
            "--peak-order",
            "time",
        ]);
        let Commands::Decode { pipeline, .. } = cli.command else {
            panic!("expected decode command");
        };
        let config = pipeline.to_config(44000);
        assert_eq!(config.bit_threshold, BitThreshold::Hertz(5800.0));
        assert_eq!(config.peak_order, PeakOrder::TimeMajor);
        assert_eq!(config.threshold_bin(), 269);
    }
}
