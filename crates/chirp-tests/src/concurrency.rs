//! Two-thread tests of the producer/consumer handoff.
//!
//! These are the tests to run under a thread sanitizer or Miri.

use chirp_audio::{AudioEngine, ManualDevice, RingBuffer, SoundBank, SoundDef, Waveform};
use chirp_core::AudioConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn spsc_never_tears_sample_pairs() {
    const PAIRS: u64 = 100_000;
    let (mut producer, mut consumer) = RingBuffer::<u64>::new(1023).split();

    let writer = thread::spawn(move || {
        let mut pending: Vec<u64> = Vec::new();
        let mut next = 1u64;
        while next <= PAIRS || !pending.is_empty() {
            while pending.len() < 64 && next <= PAIRS {
                pending.push(next);
                pending.push(!next);
                next += 1;
            }
            let written = producer.write(&pending);
            pending.drain(..written);
            if written == 0 {
                thread::yield_now();
            }
        }
    });

    let mut expected = 1u64;
    let mut carry: Option<u64> = None;
    let mut out = [0u64; 37];
    while expected <= PAIRS {
        let n = consumer.read(&mut out);
        for &value in &out[..n] {
            match carry.take() {
                None => {
                    assert_eq!(value, expected);
                    carry = Some(value);
                }
                Some(first) => {
                    assert_eq!(value, !first, "torn pair at {first}");
                    expected += 1;
                }
            }
        }
        if n == 0 {
            thread::yield_now();
        }
    }

    writer.join().unwrap();
}

#[test]
fn engine_feeds_a_device_thread() {
    let config = AudioConfig {
        sample_rate: 48000,
        channels: 2,
        buffer_size: 128,
        ..Default::default()
    };
    let (device, handle) = ManualDevice::new();
    let mut engine = AudioEngine::initialize(&config, device).unwrap();

    let mut bank = SoundBank::new();
    bank.insert(0, SoundDef::tone(Waveform::Sawtooth, 330.0, 0.9, 10.0))
        .unwrap();
    bank.insert(1, SoundDef::tone(Waveform::Noise, 0.0, 0.9, 10.0))
        .unwrap();
    engine.set_sound_bank(bank);
    engine.play_sound(0, 0);
    engine.play_sound(1, 1);
    engine.start().unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let device_thread = {
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut period = vec![0.0f32; 128 * 2];
            let mut pulls = 0u32;
            while !done.load(Ordering::Acquire) {
                handle.pull(&mut period);
                assert!(period.iter().all(|s| s.is_finite() && s.abs() < 1.0 + 1e-6));
                pulls += 1;
                thread::yield_now();
            }
            pulls
        })
    };

    for _ in 0..500 {
        engine.tick(128);
        thread::yield_now();
    }
    done.store(true, Ordering::Release);

    let pulls = device_thread.join().unwrap();
    assert!(pulls > 0);

    let stats = engine.stats();
    assert_eq!(stats.ticks, 500);
    assert!(stats.callbacks >= u64::from(pulls) - 1);
    engine.shutdown();
}
