//! Integration tests for the audio engine.

use chirp_audio::{
    Adsr, AudioEngine, ManualDevice, ManualDeviceHandle, Pattern, SoundBank, SoundDef, Waveform,
};
use chirp_core::limits::MUSIC_CHANNELS;
use chirp_core::{AudioConfig, AudioError, FrameClock, NegotiatedFormat};

fn config(sample_rate: u32, channels: u16, buffer_size: u32) -> AudioConfig {
    AudioConfig {
        sample_rate,
        channels,
        buffer_size,
        ..Default::default()
    }
}

fn running_engine(config: &AudioConfig) -> (AudioEngine, ManualDeviceHandle) {
    let (device, handle) = ManualDevice::new();
    let mut engine = AudioEngine::initialize(config, device).unwrap();
    engine.start().unwrap();
    (engine, handle)
}

#[test]
fn one_second_sine_deactivates_exactly_at_duration() {
    let (mut engine, handle) = running_engine(&config(44100, 2, 1024));
    let mut bank = SoundBank::new();
    bank.insert(7, SoundDef::tone(Waveform::Sine, 440.0, 1.0, 1.0))
        .unwrap();
    engine.set_sound_bank(bank);
    engine.play_sound(0, 7);
    assert!(engine.synthesizer().is_active(0));

    let mut out = vec![0.0f32; 1024 * 2];
    let mut rendered = 0usize;
    for tick in 1..=44 {
        engine.tick(1024);
        rendered += 1024;

        let active = engine.synthesizer().is_active(0);
        assert_eq!(active, rendered < 44100, "tick {tick}, rendered {rendered}");
        if tick == 43 {
            assert!(active, "43 ticks only cover 44032 frames");
        }

        assert!(handle.pull(&mut out));
        assert!(out.iter().all(|s| s.is_finite()), "non-finite sample at tick {tick}");
        assert!(out.iter().all(|s| s.abs() <= 1.0));
    }

    let stats = engine.stats();
    assert_eq!(stats.ticks, 44);
    assert_eq!(stats.underruns, 0);
    assert_eq!(stats.dropped_samples, 0);
}

#[test]
fn consumer_starved_gets_silence() {
    let (mut engine, handle) = running_engine(&config(48000, 2, 256));
    engine.tick(64);

    let mut out = vec![0.5f32; 512];
    assert!(handle.pull(&mut out));
    assert!(out.iter().all(|&s| s == 0.0));

    let stats = engine.stats();
    assert_eq!(stats.underruns, 1);
    assert_eq!(stats.underrun_samples, 512 - 128);
}

#[test]
fn many_loud_voices_stay_bounded() {
    let (mut engine, handle) = running_engine(&config(44100, 2, 512));
    let mut bank = SoundBank::new();
    bank.insert(0, SoundDef::tone(Waveform::Square, 50.0, 1.0, 1.0))
        .unwrap();
    engine.set_sound_bank(bank);
    for channel in 0..engine.synthesizer().channel_count() {
        engine.play_sound(channel, 0);
    }

    engine.tick(512);
    let mut out = vec![0.0f32; 1024];
    handle.pull(&mut out);
    // Eight unit squares sum to 8.0, which the limiter maps to tanh(8).
    assert!(out.iter().all(|&s| s.abs() < 1.0 + f32::EPSILON));
    assert!((out[0] - 8.0f32.tanh()).abs() < 1e-6);
}

#[test]
fn nan_parameters_never_reach_the_device() {
    let (mut engine, handle) = running_engine(&config(44100, 1, 64));
    let mut bank = SoundBank::new();
    let broken_amplitude = SoundDef {
        waveform: Waveform::Square,
        frequency: 440.0,
        amplitude: f32::NAN,
        duration: 1.0,
        envelope: None,
    };
    let broken_sustain = SoundDef {
        envelope: Some(Adsr {
            attack: 0.0,
            decay: 0.001,
            sustain: f32::NAN,
            release: 0.0,
        }),
        amplitude: 0.5,
        ..broken_amplitude
    };
    bank.insert(0, broken_amplitude).unwrap();
    bank.insert(1, broken_sustain).unwrap();
    bank.insert(2, SoundDef::tone(Waveform::Square, 440.0, 0.25, 1.0))
        .unwrap();
    engine.set_sound_bank(bank);
    engine.play_sound(0, 0);
    engine.play_sound(1, 1);
    engine.play_sound(2, 2);

    // A NaN envelope sustain falls back to full level after the decay.
    engine.tick(64);
    let mut out = vec![0.0f32; 64];
    handle.pull(&mut out);
    assert!(out.iter().all(|s| s.is_finite()), "{out:?}");
    assert!((out[63].abs() - 0.75).abs() < 1e-6);
}

#[test]
fn music_and_sfx_mix_additively() {
    let (mut engine, handle) = running_engine(&config(1000, 1, 64));
    let mut bank = SoundBank::new();
    bank.insert(1, SoundDef::tone(Waveform::Square, 1.0, 0.25, 1.0))
        .unwrap();
    bank.insert(2, SoundDef::tone(Waveform::Square, 1.0, 0.5, 1.0))
        .unwrap();
    engine.set_sound_bank(bank);

    let mut step = [None; MUSIC_CHANNELS];
    step[0] = Some(2);
    engine.play_music(Pattern::new(1.0, vec![step]));
    engine.play_sound(0, 1);

    engine.tick(16);
    let mut out = vec![0.0f32; 16];
    handle.pull(&mut out);
    assert!(out.iter().all(|&s| (s - 0.75).abs() < 1e-6));
    assert!(engine.music().is_playing());
}

#[test]
fn negotiated_rate_drives_phase_math() {
    let forced = NegotiatedFormat {
        sample_rate: 1000,
        channels: 1,
        buffer_size: 100,
    };
    let (device, handle) = ManualDevice::with_format(forced);
    let mut engine = AudioEngine::initialize(&config(44100, 2, 1024), device).unwrap();
    engine.start().unwrap();

    let mut bank = SoundBank::new();
    // 250 Hz at 1 kHz: a square flips every 2 frames.
    bank.insert(0, SoundDef::tone(Waveform::Square, 250.0, 1.0, 1.0))
        .unwrap();
    engine.set_sound_bank(bank);
    engine.play_sound(0, 0);
    engine.tick(8);

    let mut out = vec![0.0f32; 8];
    handle.pull(&mut out);
    assert_eq!(out, vec![1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0, -1.0]);
}

#[test]
fn byte_callback_delivers_native_f32() {
    let (mut engine, handle) = running_engine(&config(44100, 1, 128));
    let mut bank = SoundBank::new();
    bank.insert(0, SoundDef::tone(Waveform::Square, 10.0, 0.5, 1.0))
        .unwrap();
    engine.set_sound_bank(bank);
    engine.play_sound(0, 0);
    engine.tick(4);

    let mut raw = vec![0u8; 4 * std::mem::size_of::<f32>()];
    assert!(handle.pull_bytes(&mut raw));
    for bytes in raw.chunks_exact(4) {
        let sample = f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        assert_eq!(sample, 0.5);
    }
}

#[test]
fn smooth_volume_ramps_within_block() {
    let cfg = AudioConfig {
        smooth_volume: true,
        ..config(44100, 1, 64)
    };
    let (mut engine, handle) = running_engine(&cfg);
    let mut bank = SoundBank::new();
    bank.insert(0, SoundDef::tone(Waveform::Square, 1.0, 1.0, 1.0))
        .unwrap();
    engine.set_sound_bank(bank);
    engine.play_sound(0, 0);
    engine.set_master_volume(0.0);
    engine.tick(4);

    let mut out = vec![0.0f32; 4];
    handle.pull(&mut out);
    assert_eq!(out, vec![0.75, 0.5, 0.25, 0.0]);
}

#[test]
fn paused_engine_keeps_queue() {
    let (mut engine, handle) = running_engine(&config(44100, 2, 256));
    engine.pause().unwrap();
    assert!(!engine.is_running());
    engine.tick(32);

    let mut out = vec![1.0f32; 64];
    assert!(!handle.pull(&mut out));
    assert_eq!(engine.buffered_samples(), 64);

    engine.start().unwrap();
    assert!(handle.pull(&mut out));
    assert_eq!(engine.buffered_samples(), 0);
}

#[test]
fn frame_clock_drives_a_second_of_audio() {
    let (mut engine, handle) = running_engine(&config(22050, 2, 512));
    let mut clock = FrameClock::new(engine.sample_rate(), 60);
    let mut out = Vec::new();
    let mut total = 0;
    for _ in 0..60 {
        let frames = clock.next_frames();
        total += frames;
        assert_eq!(engine.tick(frames), frames * 2);
        out.resize(frames * 2, 0.0);
        handle.pull(&mut out);
    }
    assert_eq!(total, 22050);
    assert_eq!(engine.stats().underruns, 0);
}

#[test]
fn invalid_config_is_rejected_before_device_open() {
    let (device, handle) = ManualDevice::new();
    let err = AudioEngine::initialize(&config(44100, 0, 1024), device).unwrap_err();
    assert!(matches!(err, AudioError::InvalidConfig(_)));
    assert!(!handle.is_open());
}

#[test]
fn config_file_loads() {
    let path = std::env::temp_dir().join(format!("chirp-config-{}.json", std::process::id()));
    std::fs::write(&path, br#"{ "sample_rate": 32000, "ring_multiplier": 6 }"#).unwrap();
    let loaded = AudioConfig::load(&path);
    std::fs::remove_file(&path).ok();

    let loaded = loaded.unwrap();
    assert_eq!(loaded.sample_rate, 32000);
    assert_eq!(loaded.effective_ring_multiplier(), 6);

    let (device, _) = ManualDevice::new();
    let engine = AudioEngine::initialize(&loaded, device).unwrap();
    assert_eq!(engine.ring_capacity(), 1024 * 2 * 6);
}

#[test]
fn missing_config_file_is_io_error() {
    let err = AudioConfig::load("/nonexistent/chirp/config.json").unwrap_err();
    assert!(matches!(err, AudioError::Io(_)));
}
