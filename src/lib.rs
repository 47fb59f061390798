pub mod audio;
pub mod ui;

use crate::audio::analyzer::{create_analyzer_channels, AnalyzerInput};
use crate::audio::constants::{DEFAULT_FLOOR_DB, MAX_FLOOR_DB, MIN_FLOOR_DB};
use crate::ui::{DisplayDriver, DisplayTimer};
use atomic_float::AtomicF32;
use nih_plug::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// What the display shows
#[derive(Enum, Debug, PartialEq, Eq, Clone, Copy)]
pub enum VisualizationMode {
    #[name = "RMS"]
    Rms,
    Spectrogram,
}

impl VisualizationMode {
    /// Selector index as used by the mode switch: 0 is RMS, 1 is Spectrogram
    pub fn from_selection(selection: i32) -> Option<Self> {
        match selection {
            0 => Some(Self::Rms),
            1 => Some(Self::Spectrogram),
            _ => None,
        }
    }
}

pub struct SpectrumScope {
    params: Arc<ScopeParams>,

    /// Shared with the display so bins map onto the right frequencies
    sample_rate: Arc<AtomicF32>,
    max_buffer_size: usize,

    /// Audio thread only, never locked
    analyzer_input: AnalyzerInput,
    display: Arc<Mutex<DisplayDriver>>,

    /// Drains the analyzer queues while the plugin is active
    display_timer: Option<DisplayTimer>,
    /// Bumped by the timer whenever the display has something new to draw
    repaints: Arc<AtomicU64>,
}

#[derive(Params)]
pub struct ScopeParams {
    /// RMS paths or scrolling spectrogram
    #[id = "mode"]
    pub mode: EnumParam<VisualizationMode>,

    /// Level that maps onto the bottom of the RMS view
    #[id = "floor"]
    pub floor: FloatParam,
}

impl Default for SpectrumScope {
    fn default() -> Self {
        let sample_rate = Arc::new(AtomicF32::new(48000.0));
        let (analyzer_input, display) = create_analyzer_channels(sample_rate.clone());

        Self {
            params: Arc::new(ScopeParams::default()),
            sample_rate,
            max_buffer_size: 0,
            analyzer_input,
            display: Arc::new(Mutex::new(display)),
            display_timer: None,
            repaints: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl Default for ScopeParams {
    fn default() -> Self {
        Self {
            mode: EnumParam::new("Graph Type", VisualizationMode::Rms),
            floor: FloatParam::new(
                "Floor",
                DEFAULT_FLOOR_DB,
                FloatRange::Linear {
                    min: MIN_FLOOR_DB,
                    max: MAX_FLOOR_DB,
                },
            )
            .with_step_size(1.0)
            .with_unit(" dB"),
        }
    }
}

impl SpectrumScope {
    /// Handle for an editor. The display timer already ticks it, an editor
    /// only reads paths and images from it.
    pub fn display_driver(&self) -> Arc<Mutex<DisplayDriver>> {
        self.display.clone()
    }

    /// Counter an editor can watch to know when to redraw
    pub fn repaint_requests(&self) -> Arc<AtomicU64> {
        self.repaints.clone()
    }

    pub fn is_display_running(&self) -> bool {
        self.display_timer
            .as_ref()
            .is_some_and(DisplayTimer::is_running)
    }
}

impl Plugin for SpectrumScope {
    const NAME: &'static str = "Spectrum Scope";
    const VENDOR: &'static str = "Cmdv";
    const URL: &'static str = env!("CARGO_PKG_HOMEPAGE");
    const EMAIL: &'static str = "info@cmdv.me";

    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // The first layout is the default, mono inputs feed both displayed channels
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),

            aux_input_ports: &[],
            aux_output_ports: &[],

            names: PortNames::const_default(),
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            ..AudioIOLayout::const_default()
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;
    const MIDI_OUTPUT: MidiConfig = MidiConfig::None;

    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        nih_plug::nih_log!(
            "Plugin initialize called, sample_rate: {}, buffer_size: {}, channels: {:?}",
            buffer_config.sample_rate,
            buffer_config.max_buffer_size,
            audio_io_layout.main_input_channels
        );

        self.sample_rate
            .store(buffer_config.sample_rate, Ordering::Relaxed);
        self.max_buffer_size = buffer_config.max_buffer_size as usize;
        self.analyzer_input.prepare(self.max_buffer_size);

        // The editor may hold the lock during a tick, initialize() is not
        // real-time so waiting here is fine
        match self.display.lock() {
            Ok(mut display) => {
                display.apply_params(&self.params);
                display.prepare();
            }
            Err(_) => {
                nih_plug::nih_log!("Display driver lock poisoned, keeping stale display state");
            }
        }

        if self.display_timer.is_none() {
            match DisplayTimer::start(
                self.display.clone(),
                self.params.clone(),
                self.repaints.clone(),
            ) {
                Ok(timer) => self.display_timer = Some(timer),
                Err(err) => nih_plug::nih_log!("Could not start the display timer: {}", err),
            }
        }

        nih_plug::nih_log!(
            "Plugin initialized successfully, block size {}",
            self.analyzer_input.block_size()
        );
        true
    }

    fn reset(&mut self) {
        // Starts a new generation, the display discards blocks queued before it
        self.analyzer_input.prepare(self.max_buffer_size);
    }

    fn deactivate(&mut self) {
        if let Some(timer) = self.display_timer.take() {
            nih_plug::nih_log!("Plugin deactivated, stopping the display timer");
            drop(timer);
        }
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        // Analysis only, the audio passes through untouched
        self.analyzer_input.process_buffer(buffer);

        ProcessStatus::Normal
    }
}

impl ClapPlugin for SpectrumScope {
    const CLAP_ID: &'static str = "me.cmdv.spectrum-scope";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("RMS spectrum paths and a scrolling spectrogram");
    const CLAP_MANUAL_URL: Option<&'static str> = Some(Self::URL);
    const CLAP_SUPPORT_URL: Option<&'static str> = None;

    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Analyzer,
        ClapFeature::Stereo,
        ClapFeature::Mono,
    ];
}

impl Vst3Plugin for SpectrumScope {
    const VST3_CLASS_ID: [u8; 16] = *b"SpectrumScopeAnl";

    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Analyzer];
}

nih_export_clap!(SpectrumScope);
nih_export_vst3!(SpectrumScope);
