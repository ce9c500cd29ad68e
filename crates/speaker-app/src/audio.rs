//! PCM conditioning between the A2DP sink and the I2S output.
//!
//! The sink delivers interleaved 16-bit little-endian stereo frames. The
//! speaker has a single driver, so both channels are averaged before the
//! AVRC volume is applied.

use crate::remote::MAX_VOLUME;

/// Bytes in one interleaved 16-bit stereo frame
pub const FRAME_BYTES: usize = 4;

/// Scale `pcm` by `volume` (0..=127) and, when `mono` is set, replace both
/// channels with their average, in place
///
/// Trailing bytes that do not form a whole frame are left untouched.
pub fn condition_pcm(pcm: &mut [u8], volume: u8, mono: bool) {
    let gain = i32::from(volume.min(MAX_VOLUME));
    let full = i32::from(MAX_VOLUME);
    for frame in pcm.chunks_exact_mut(FRAME_BYTES) {
        let mut left = i32::from(i16::from_le_bytes([frame[0], frame[1]]));
        let mut right = i32::from(i16::from_le_bytes([frame[2], frame[3]]));
        if mono {
            let mixed = (left + right) / 2;
            left = mixed;
            right = mixed;
        }
        // |sample * gain / full| never exceeds |sample|
        let left = (left * gain / full) as i16;
        let right = (right * gain / full) as i16;
        frame[..2].copy_from_slice(&left.to_le_bytes());
        frame[2..].copy_from_slice(&right.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn frames(samples: &[(i16, i16)]) -> Vec<u8> {
        samples
            .iter()
            .flat_map(|&(l, r)| {
                let mut frame = [0u8; FRAME_BYTES];
                frame[..2].copy_from_slice(&l.to_le_bytes());
                frame[2..].copy_from_slice(&r.to_le_bytes());
                frame
            })
            .collect()
    }

    #[test]
    fn full_volume_mono_averages_channels() {
        let mut pcm = frames(&[(1000, 3000), (-2000, 2000), (i16::MAX, i16::MAX)]);
        condition_pcm(&mut pcm, MAX_VOLUME, true);
        assert_eq!(
            pcm,
            frames(&[(2000, 2000), (0, 0), (i16::MAX, i16::MAX)])
        );
    }

    #[test]
    fn extremes_do_not_overflow() {
        let mut pcm = frames(&[(i16::MIN, i16::MIN), (i16::MIN, i16::MAX)]);
        condition_pcm(&mut pcm, MAX_VOLUME, true);
        assert_eq!(pcm, frames(&[(i16::MIN, i16::MIN), (0, 0)]));
    }

    #[test]
    fn stereo_is_kept_when_not_downmixing() {
        let mut pcm = frames(&[(1000, -1000)]);
        condition_pcm(&mut pcm, MAX_VOLUME, false);
        assert_eq!(pcm, frames(&[(1000, -1000)]));
    }

    #[test]
    fn volume_scales_samples() {
        let mut pcm = frames(&[(1270, -1270)]);
        condition_pcm(&mut pcm, 64, false);
        assert_eq!(pcm, frames(&[(640, -640)]));

        let mut silent = frames(&[(1270, 30_000)]);
        condition_pcm(&mut silent, 0, true);
        assert_eq!(silent, frames(&[(0, 0)]));
    }

    #[test]
    fn partial_trailing_frame_is_untouched() {
        let mut pcm = frames(&[(100, 300)]);
        pcm.extend_from_slice(&[0xAB, 0xCD]);
        condition_pcm(&mut pcm, MAX_VOLUME, true);
        assert_eq!(&pcm[..FRAME_BYTES], frames(&[(200, 200)]).as_slice());
        assert_eq!(&pcm[FRAME_BYTES..], &[0xAB, 0xCD]);
    }
}
