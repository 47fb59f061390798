/// Audio analysis constants and helper functions
/// Shared between the audio-thread producers and the display-thread renderers

/// Frequency range of the RMS display
pub const MIN_FREQUENCY: f32 = 20.0;
pub const MAX_FREQUENCY: f32 = 20000.0;

/// Default dB floor for the transform data generator
pub const DEFAULT_FLOOR_DB: f32 = -48.0;
pub const MIN_FLOOR_DB: f32 = -96.0;
pub const MAX_FLOOR_DB: f32 = -12.0;

/// Number of pre-allocated slots in every ring queue
pub const QUEUE_CAPACITY: usize = 30;

/// Transform size is 2^11 = 2048 samples, 23.4Hz bins at 48kHz
pub const TRANSFORM_ORDER: usize = 11;
pub const TRANSFORM_SIZE: usize = 1 << TRANSFORM_ORDER;

/// Upper bound for the accumulator block size. Queue slots reserve this much so
/// a re-prepare with a larger host buffer never allocates on the audio thread.
pub const MAX_BLOCK_SIZE: usize = 8192;

/// Persistent spectrogram image size
pub const SPECTROGRAM_WIDTH: usize = 512;
pub const SPECTROGRAM_HEIGHT: usize = 512;

/// Exponent of the vertical frequency skew, < 1.0 favours low frequencies
pub const SPECTROGRAM_SKEW: f32 = 0.4;

/// Substitute maximum when a spectrogram frame is silent
pub const SPECTROGRAM_FALLBACK_MAX: f32 = 4.1;

/// Upper end of the spectrogram level scale. Normalised magnitudes are
/// stretched onto `[0, 3.9]` before colouring, anything from about a quarter of
/// the frame maximum up is drawn at full lightness.
pub const SPECTROGRAM_LEVEL_RANGE: f32 = 3.9;

/// Display timer rate
pub const TIMER_HZ: u32 = 30;

// === HELPER FUNCTIONS ===

/// Convert frequency to logarithmic position (0.0 to 1.0)
pub fn freq_to_log_position(freq: f32) -> f32 {
    libm::log10f(freq / MIN_FREQUENCY) / libm::log10f(MAX_FREQUENCY / MIN_FREQUENCY)
}

/// Convert logarithmic position (0.0 to 1.0) back to frequency
pub fn log_position_to_freq(position: f32) -> f32 {
    MIN_FREQUENCY * libm::powf(MAX_FREQUENCY / MIN_FREQUENCY, position)
}

/// Map a dB value from [floor_db, 0] onto [0, 1]
pub fn db_to_normalized(db: f32, floor_db: f32) -> f32 {
    if db.is_nan() || floor_db >= 0.0 {
        return 0.0;
    }
    ((db - floor_db) / -floor_db).clamp(0.0, 1.0)
}

/// Frequency grid lines of the RMS view
pub const FREQUENCY_MARKERS: &[f32] = &[
    20.0, 50.0, 100.0, 200.0, 500.0, 1000.0, 2000.0, 5000.0, 10000.0, 20000.0,
];

/// Gain grid lines of the RMS view, the plot spans -24..+24 dB
pub const GAIN_MARKERS: &[f32] = &[-24.0, -12.0, 0.0, 12.0, 24.0];
pub const GAIN_MIN_DB: f32 = -24.0;
pub const GAIN_MAX_DB: f32 = 24.0;
