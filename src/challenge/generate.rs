use super::{
    Challenge, ChallengeBody, CogTask, EmbedParams, Flash, PathParams, Probe, Pulse,
    StandaloneParams,
};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use std::f64::consts::{FRAC_PI_3, FRAC_PI_4};

/// Pre-curated probe pool: prime multiples of 0.05 Hz, so no element is an
/// integer multiple of another and probe responses never share harmonics.
pub const PROBE_POOL: [f64; 18] = [
    0.35, 0.55, 0.65, 0.85, 0.95, 1.15, 1.45, 1.55, 1.85, 2.05, 2.15, 2.35, 2.65, 2.95, 3.05,
    3.35, 3.55, 3.65,
];

/// Lissajous frequency pairs with small rational ratios, slow enough to track.
pub const PATH_PAIRS: [(f64, f64); 7] = [
    (0.10, 0.15),
    (0.15, 0.20),
    (0.09, 0.15),
    (0.12, 0.15),
    (0.10, 0.14),
    (0.15, 0.18),
    (0.12, 0.21),
];

pub const COG_COLORS: [&str; 3] = ["#e74c3c", "#2ecc71", "#3498db"];

pub const PULSE_MIN_GAP_MS: f64 = 2_800.0;
const COG_FLASH_COUNT: usize = 8;

/// Hover horizon the embed pulse schedule is spread over. Pulses landing
/// beyond the hover time a visitor accumulates simply never fire.
const EMBED_HOVER_HORIZON_MS: f64 = 12_000.0;
const EMBED_PULSE_MIN_GAP_MS: f64 = 1_500.0;

/// 128-bit id from the OS RNG, hex encoded. Also used for session ids.
pub fn random_id() -> String {
    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn pick_probes<R: Rng>(rng: &mut R, amp_x: impl Fn(&mut R) -> f64, amp_y: impl Fn(&mut R) -> f64) -> Vec<Probe> {
    let mut pool = PROBE_POOL;
    pool.shuffle(rng);
    let mut freqs: Vec<f64> = pool[..5].to_vec();
    freqs.sort_by(f64::total_cmp);
    freqs
        .into_iter()
        .map(|freq_hz| Probe {
            freq_hz,
            amp_x: amp_x(rng),
            amp_y: amp_y(rng),
            phase_offset: FRAC_PI_3 + rng.gen_range(-0.3..0.3),
        })
        .collect()
}

/// Bucketed pulse schedule: pulse `i` lands inside its own slice of
/// `[min_gap, horizon)` with jitter limited to 60% of the bucket width.
fn pulse_schedule<R: Rng>(
    rng: &mut R,
    count: usize,
    min_gap_ms: f64,
    horizon_ms: f64,
    amp: impl Fn(&mut R) -> f64,
) -> Vec<Pulse> {
    let bucket = (horizon_ms - min_gap_ms) / count as f64;
    (0..count)
        .map(|i| {
            let at_ms = min_gap_ms + i as f64 * bucket + rng.gen_range(0.0..0.6 * bucket);
            let sign = if i % 3 == 2 { -1.0 } else { 1.0 };
            Pulse {
                at_ms,
                amp_x: sign * amp(rng),
                amp_y: 0.0,
            }
        })
        .collect()
}

fn cog_task<R: Rng>(rng: &mut R, dualtask_ms: f64) -> CogTask {
    let mut colors = COG_COLORS;
    colors.shuffle(rng);
    let target_color = colors[0].to_string();
    let distractors = [colors[1].to_string(), colors[2].to_string()];

    let target_count = rng.gen_range(2..=5);
    let mut flashes: Vec<Flash> = Vec::with_capacity(COG_FLASH_COUNT);
    for i in 0..COG_FLASH_COUNT {
        let (color, is_target) = if i < target_count {
            (target_color.clone(), true)
        } else {
            (distractors[rng.gen_range(0..2)].clone(), false)
        };
        flashes.push(Flash {
            at_ms: 0.0,
            color,
            is_target,
        });
    }
    flashes.shuffle(rng);

    let cog_gap = dualtask_ms / (COG_FLASH_COUNT + 1) as f64;
    for (i, flash) in flashes.iter_mut().enumerate() {
        flash.at_ms = cog_gap * (i + 1) as f64 + rng.gen_range(-0.15..0.15) * cog_gap;
    }

    CogTask {
        target_color,
        distractor_colors: distractors,
        target_count,
        flashes,
    }
}

pub fn new_standalone(now_ms: u64, ttl_ms: u64) -> Challenge {
    let rng = &mut rand::thread_rng();

    let tracking_ms = rng.gen_range(18_000.0..22_000.0);
    let dualtask_ms = rng.gen_range(10_000.0..14_000.0);
    let (freq_x, freq_y) = PATH_PAIRS[rng.gen_range(0..PATH_PAIRS.len())];

    let probes = pick_probes(
        rng,
        |r| r.gen_range(3..=7) as f64,
        |r| r.gen_range(1..=3) as f64,
    );
    let pulse_count = rng.gen_range(4..8);
    let pulses = pulse_schedule(rng, pulse_count, PULSE_MIN_GAP_MS, tracking_ms, |r| {
        r.gen_range(18..=26) as f64
    });
    let cog = cog_task(rng, dualtask_ms);

    Challenge {
        id: random_id(),
        issued_at_ms: now_ms,
        expires_at_ms: now_ms + ttl_ms,
        used: false,
        used_at_ms: None,
        body: ChallengeBody::Standalone(StandaloneParams {
            free_move_ms: 5_000.0,
            tracking_ms,
            dualtask_ms,
            path: PathParams {
                freq_x,
                freq_y,
                phase: FRAC_PI_4 + rng.gen_range(-0.5..0.5),
                padding: 0.30,
            },
            probes,
            pulses,
            pulse_hold_ms: rng.gen_range(500.0..700.0),
            pulse_return_ms: 200.0,
            cog,
        }),
    }
}

/// Embed challenges use sub-perceptual amplitudes (peak probe sum around
/// 1.0-1.75 px) and index their pulses on cumulative hover time.
pub fn new_embed(now_ms: u64, ttl_ms: u64) -> Challenge {
    let rng = &mut rand::thread_rng();

    let probes = pick_probes(
        rng,
        |r| r.gen_range(0.15..0.35),
        |r| r.gen_range(0.05..0.15),
    );
    let pulse_count = rng.gen_range(4..6);
    let pulses = pulse_schedule(
        rng,
        pulse_count,
        EMBED_PULSE_MIN_GAP_MS,
        EMBED_HOVER_HORIZON_MS,
        |r| r.gen_range(1.0..2.0),
    );

    Challenge {
        id: random_id(),
        issued_at_ms: now_ms,
        expires_at_ms: now_ms + ttl_ms,
        used: false,
        used_at_ms: None,
        body: ChallengeBody::Embed(EmbedParams {
            probes,
            pulses,
            pulse_hold_ms: rng.gen_range(400.0..600.0),
            pulse_return_ms: 150.0,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Mode;

    #[test]
    fn probe_pool_is_pairwise_non_harmonic() {
        for (i, a) in PROBE_POOL.iter().enumerate() {
            for b in PROBE_POOL.iter().skip(i + 1) {
                let ratio = b / a;
                assert!(
                    (ratio - ratio.round()).abs() > 1e-9,
                    "{a} and {b} are harmonically related"
                );
            }
        }
    }

    #[test]
    fn standalone_probes_are_ascending_and_from_the_pool() {
        for _ in 0..50 {
            let ch = new_standalone(0, 180_000);
            let probes = ch.probes();
            assert_eq!(probes.len(), 5);
            for pair in probes.windows(2) {
                assert!(pair[0].freq_hz < pair[1].freq_hz);
            }
            for p in probes {
                assert!(PROBE_POOL.contains(&p.freq_hz));
                assert!((3.0..=7.0).contains(&p.amp_x));
                assert!((1.0..=3.0).contains(&p.amp_y));
            }
        }
    }

    #[test]
    fn pulse_offsets_stay_in_their_buckets() {
        for _ in 0..50 {
            let ch = new_standalone(0, 180_000);
            let ChallengeBody::Standalone(params) = &ch.body else {
                panic!("expected standalone body");
            };
            let count = params.pulses.len();
            assert!((4..8).contains(&count));
            let bucket = (params.tracking_ms - PULSE_MIN_GAP_MS) / count as f64;
            for (i, pulse) in params.pulses.iter().enumerate() {
                let lo = PULSE_MIN_GAP_MS + i as f64 * bucket;
                assert!(pulse.at_ms >= lo && pulse.at_ms < lo + 0.6 * bucket + 1e-9);
                assert!(pulse.at_ms < params.tracking_ms);
                let expect_sign = if i % 3 == 2 { -1.0 } else { 1.0 };
                assert_eq!(pulse.amp_x.signum(), expect_sign);
                assert!((18.0..=26.0).contains(&pulse.amp_x.abs()));
            }
        }
    }

    #[test]
    fn cognitive_schedule_has_eight_flashes_with_matching_target_count() {
        for _ in 0..50 {
            let ch = new_standalone(0, 180_000);
            let ChallengeBody::Standalone(params) = &ch.body else {
                panic!("expected standalone body");
            };
            let cog = &params.cog;
            assert_eq!(cog.flashes.len(), 8);
            assert!((2..=5).contains(&cog.target_count));
            let targets = cog.flashes.iter().filter(|f| f.is_target).count();
            assert_eq!(targets, cog.target_count);
            for f in &cog.flashes {
                if f.is_target {
                    assert_eq!(f.color, cog.target_color);
                } else {
                    assert!(cog.distractor_colors.contains(&f.color));
                }
                assert!(f.at_ms > 0.0 && f.at_ms < params.dualtask_ms);
            }
        }
    }

    #[test]
    fn embed_amplitudes_are_sub_perceptual() {
        for _ in 0..50 {
            let ch = new_embed(0, 360_000);
            assert_eq!(ch.mode(), Mode::Embed);
            let peak_sum: f64 = ch.probes().iter().map(|p| p.amp_x).sum();
            assert!(peak_sum < 1.75 + 1e-9, "peak probe sum {peak_sum}");
            for p in ch.pulses() {
                assert!((1.0..=2.0).contains(&p.amp_x.abs()));
            }
            assert!((4..6).contains(&ch.pulses().len()));
        }
    }

    #[test]
    fn ids_are_128_bit_hex_and_unique() {
        let a = new_standalone(0, 1);
        let b = new_standalone(0, 1);
        assert_eq!(a.id.len(), 32);
        assert!(a.id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a.id, b.id);
    }
}
