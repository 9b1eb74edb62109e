//! Level token codec
//!
//! A token is the unpadded URL-safe base64 of
//! `"{width}x{height}:{tiles}"`, optionally followed by `"|{params}"` where
//! `params` is itself base64url-encoded JSON. In `tiles`, any run of more than
//! two empty tiles is written as `.` followed by the decimal run length.
//!
//! Decoding is strict about the `{width}x{height}:` header and lenient about
//! everything after it: unknown characters and short tile bodies become empty
//! tiles, and a corrupt parameter block reads as no parameters. Game clients
//! decode tokens with the same rules, so neither side may be stricter.

use std::iter;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::error::{LevelError, Result};
use crate::level::Level;
use crate::params::GameParams;
use crate::tile::{EMPTY_CHAR, char_for_id, id_for_char};

/// Most cells (`width * height`) a level may hold
pub const MAX_CELLS: usize = 1 << 24;

/// URL-safe base64: no padding on encode, padding optional on decode
pub(crate) const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Encode a row-major grid and its parameters into a token.
///
/// Width is taken from the first row. Ids outside the alphabet encode as the
/// empty tile; short rows are padded with empty tiles and long rows truncated.
/// Grids over [`MAX_CELLS`] still encode but will not decode; [`Level`]
/// refuses to build them.
pub fn encode(grid: &[Vec<u8>], params: &GameParams) -> String {
    let width = grid.first().map_or(0, Vec::len);
    let height = grid.len();

    let mut flat = String::with_capacity(width * height);
    for row in grid {
        for col in 0..width {
            flat.push(row.get(col).map_or(EMPTY_CHAR, |&id| char_for_id(id)));
        }
    }

    let mut payload = format!("{width}x{height}:{}", compress_empty_runs(&flat));
    if let Some(block) = params.encode_block() {
        payload.push('|');
        payload.push_str(&block);
    }

    TOKEN_ENGINE.encode(payload)
}

/// Decode a token back into a level.
///
/// Fails only when the token is not base64url or its payload lacks a valid
/// `{width}x{height}:` header.
pub fn decode(token: &str) -> Result<Level> {
    let bytes = TOKEN_ENGINE
        .decode(token.trim())
        .map_err(|e| LevelError::InvalidEncoding(e.to_string()))?;
    let payload = String::from_utf8_lossy(&bytes);

    let (core, params) = match payload.split_once('|') {
        Some((core, block)) => (core, GameParams::decode_block(block)),
        None => (&payload[..], GameParams::default()),
    };

    let (dims, data) = core.split_once(':').ok_or_else(|| {
        LevelError::MalformedPayload("missing ':' between dimensions and tiles".into())
    })?;
    let (width, height) = parse_dimensions(dims)?;

    let expanded = expand_empty_runs(data, width * height);
    let mut chars = expanded.chars();
    let mut grid = Vec::with_capacity(height);
    for _ in 0..height {
        let mut row = Vec::with_capacity(width);
        for _ in 0..width {
            row.push(chars.next().map_or(0, id_for_char));
        }
        grid.push(row);
    }

    Ok(Level {
        width,
        height,
        grid,
        params,
    })
}

fn parse_dimensions(dims: &str) -> Result<(usize, usize)> {
    let malformed = || LevelError::MalformedPayload(format!("invalid dimensions '{dims}'"));
    let (w, h) = dims.split_once('x').ok_or_else(malformed)?;
    let width: usize = w.parse().map_err(|_| malformed())?;
    let height: usize = h.parse().map_err(|_| malformed())?;
    check_dimensions(width, height)?;
    Ok((width, height))
}

/// Reject shapes whose cell count overflows or exceeds [`MAX_CELLS`].
///
/// A zero edge counts as one so `0xN` cannot allocate N empty rows.
pub fn check_dimensions(width: usize, height: usize) -> Result<()> {
    match width.max(1).checked_mul(height.max(1)) {
        Some(cells) if cells <= MAX_CELLS => Ok(()),
        _ => Err(LevelError::TooLarge {
            width,
            height,
            max: MAX_CELLS,
        }),
    }
}

/// Replace every run of more than two empty tiles with `.` and its length
pub fn compress_empty_runs(tiles: &str) -> String {
    let mut out = String::with_capacity(tiles.len());
    let mut run = 0usize;
    for c in tiles.chars() {
        if c == EMPTY_CHAR {
            run += 1;
            continue;
        }
        push_run(&mut out, run);
        run = 0;
        out.push(c);
    }
    push_run(&mut out, run);
    out
}

fn push_run(out: &mut String, run: usize) {
    if run > 2 {
        out.push(EMPTY_CHAR);
        out.push_str(&run.to_string());
    } else {
        out.extend(iter::repeat_n(EMPTY_CHAR, run));
    }
}

/// Expand `.` + digits back into empty runs, producing at most `limit` chars.
///
/// Characters past `limit` could never land in the grid, so expansion stops
/// there rather than honouring an arbitrarily large count.
pub fn expand_empty_runs(data: &str, limit: usize) -> String {
    let mut out = String::with_capacity(limit.min(data.len().saturating_mul(4)));
    let mut produced = 0usize;
    let mut chars = data.chars().peekable();

    while produced < limit {
        let Some(c) = chars.next() else { break };

        if c == EMPTY_CHAR && chars.peek().is_some_and(char::is_ascii_digit) {
            let mut count = 0usize;
            while let Some(digit) = chars.peek().and_then(|d| d.to_digit(10)) {
                count = count.saturating_mul(10).saturating_add(digit as usize);
                chars.next();
            }
            let n = count.min(limit - produced);
            out.extend(iter::repeat_n(EMPTY_CHAR, n));
            produced += n;
        } else {
            out.push(c);
            produced += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload_of(token: &str) -> String {
        String::from_utf8(TOKEN_ENGINE.decode(token).unwrap()).unwrap()
    }

    fn token_of(payload: &str) -> String {
        TOKEN_ENGINE.encode(payload)
    }

    fn patterned_grid(width: usize, height: usize, seed: usize) -> Vec<Vec<u8>> {
        (0..height)
            .map(|r| {
                (0..width)
                    .map(|c| {
                        let v = (r * 31 + c * 17 + seed * 7) % 23;
                        // Bias towards empty so long runs show up
                        if v < 8 { v as u8 } else { 0 }
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_end_to_end_example() {
        let grid = vec![vec![1, 0, 0], vec![0, 0, 2]];
        let token = encode(&grid, &GameParams::default());

        assert_eq!(payload_of(&token), "3x2:G.4R");
        assert_eq!(token, "M3gyOkcuNFI");

        let level = decode(&token).unwrap();
        assert_eq!(level.width, 3);
        assert_eq!(level.height, 2);
        assert_eq!(level.grid, grid);
        assert!(level.params.is_empty());
    }

    #[test]
    fn test_empty_run_threshold() {
        assert_eq!(payload_of(&encode(&[vec![0, 0]], &GameParams::default())), "2x1:..");
        assert_eq!(payload_of(&encode(&[vec![0, 0, 0]], &GameParams::default())), "3x1:.3");

        assert_eq!(decode(&token_of("2x1:..")).unwrap().grid, vec![vec![0, 0]]);
        assert_eq!(decode(&token_of("3x1:.3")).unwrap().grid, vec![vec![0, 0, 0]]);
    }

    #[test]
    fn test_no_cross_symbol_compression() {
        assert_eq!(compress_empty_runs("GG..RR"), "GG..RR");
        assert_eq!(compress_empty_runs("G....R"), "G.4R");
        assert_eq!(compress_empty_runs("...G..."), ".3G.3");
        assert_eq!(compress_empty_runs("GGGGGG"), "GGGGGG");
        assert_eq!(compress_empty_runs(""), "");
    }

    #[test]
    fn test_runs_span_row_boundaries() {
        let grid = vec![vec![1, 0], vec![0, 0], vec![0, 2]];
        assert_eq!(payload_of(&encode(&grid, &GameParams::default())), "2x3:G.4R");
    }

    #[test]
    fn test_multi_digit_runs() {
        let grid = vec![vec![0; 150]];
        let token = encode(&grid, &GameParams::default());
        assert_eq!(payload_of(&token), "150x1:.150");
        assert_eq!(decode(&token).unwrap().grid, grid);
    }

    #[test]
    fn test_round_trip_across_sizes_and_params() {
        let param_sets = [
            GameParams::default(),
            GameParams::new(Some(4.0), None, None),
            GameParams::new(None, Some(0.35), None),
            GameParams::new(None, None, Some(0.1)),
            GameParams::new(Some(10.0), Some(0.015625), Some(0.9)),
            GameParams::new(Some(-2.0), Some(1e-7), Some(123456.789)),
        ];
        let sizes = [(1, 1), (1, 200), (200, 1), (7, 3), (32, 18), (200, 200)];

        for (i, &(w, h)) in sizes.iter().enumerate() {
            for (j, params) in param_sets.iter().enumerate() {
                let grid = patterned_grid(w, h, i * 10 + j);
                let level = decode(&encode(&grid, params)).unwrap();
                assert_eq!((level.width, level.height), (w, h));
                assert_eq!(level.grid, grid, "grid mismatch at {w}x{h}");
                assert_eq!(&level.params, params, "params mismatch at {w}x{h}");
            }
        }
    }

    #[test]
    fn test_every_tile_round_trips() {
        let grid = vec![(0..8).collect::<Vec<u8>>(), (0..8).rev().collect()];
        let token = encode(&grid, &GameParams::default());
        assert_eq!(payload_of(&token), "8x2:.GRYIFSWWSFIYRG.");
        assert_eq!(decode(&token).unwrap().grid, grid);
    }

    #[test]
    fn test_encode_is_deterministic_and_url_safe() {
        let grid = patterned_grid(40, 25, 3);
        let params = GameParams::new(Some(6.0), Some(0.5), Some(0.25));
        let a = encode(&grid, &params);
        let b = encode(&grid, &params);
        assert_eq!(a, b);
        assert!(
            a.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_out_of_range_ids_encode_as_empty() {
        let grid = vec![vec![8, 1, 255]];
        let token = encode(&grid, &GameParams::default());
        assert_eq!(payload_of(&token), "3x1:.G.");
        assert_eq!(decode(&token).unwrap().grid, vec![vec![0, 1, 0]]);
    }

    #[test]
    fn test_ragged_rows_follow_first_row_width() {
        let grid = vec![vec![1, 1, 1], vec![2], vec![3, 3, 3, 3]];
        let token = encode(&grid, &GameParams::default());
        assert_eq!(payload_of(&token), "3x3:GGGR..YYY");
    }

    #[test]
    fn test_truncated_body_pads_with_empty() {
        let level = decode(&token_of("4x2:GR")).unwrap();
        assert_eq!(level.grid, vec![vec![1, 2, 0, 0], vec![0, 0, 0, 0]]);

        let level = decode(&token_of("2x2:")).unwrap();
        assert_eq!(level.grid, vec![vec![0, 0], vec![0, 0]]);
    }

    #[test]
    fn test_excess_body_is_ignored() {
        let level = decode(&token_of("2x1:GRWWW.99999999999999999999999")).unwrap();
        assert_eq!(level.grid, vec![vec![1, 2]]);
    }

    #[test]
    fn test_unknown_characters_become_empty() {
        let level = decode(&token_of("4x1:GxéR")).unwrap();
        assert_eq!(level.grid, vec![vec![1, 0, 0, 2]]);
    }

    #[test]
    fn test_invalid_utf8_bytes_become_empty() {
        let token = TOKEN_ENGINE.encode(b"4x1:G\xFFR");
        let level = decode(&token).unwrap();
        assert_eq!(level.grid, vec![vec![1, 0, 2, 0]]);

        let token = TOKEN_ENGINE.encode(b"3x1:\xC3\x28W");
        assert_eq!(decode(&token).unwrap().grid, vec![vec![0, 0, 7]]);
    }

    #[test]
    fn test_pathological_run_markers() {
        // A '.' not followed by a digit is a literal empty tile; '-' and stray
        // digits are unknown characters
        let level = decode(&token_of("5x1:.-3G")).unwrap();
        assert_eq!(level.grid, vec![vec![0, 0, 0, 1, 0]]);

        // Zero-length runs expand to nothing
        let level = decode(&token_of("2x1:.0GR")).unwrap();
        assert_eq!(level.grid, vec![vec![1, 2]]);

        // Runs longer than the grid are clipped
        let level = decode(&token_of("3x1:.1000000")).unwrap();
        assert_eq!(level.grid, vec![vec![0, 0, 0]]);
    }

    #[test]
    fn test_structural_failures() {
        let err = decode(&token_of("not-a-level")).unwrap_err();
        assert!(matches!(err, LevelError::MalformedPayload(_)));
        assert!(err.is_structural());
        assert_eq!(token_of("not-a-level"), "bm90LWEtbGV2ZWw");

        for payload in ["3:GGG", "ax2:GG", "3x:GGG", "-1x2:", "3x2x1:G", "x:"] {
            let err = decode(&token_of(payload)).unwrap_err();
            assert!(matches!(err, LevelError::MalformedPayload(_)), "{payload}");
        }

        assert!(matches!(
            decode("!!not base64!!").unwrap_err(),
            LevelError::InvalidEncoding(_)
        ));
    }

    #[test]
    fn test_oversized_dimensions_rejected() {
        let err = decode(&token_of("100000x100000:")).unwrap_err();
        assert!(matches!(err, LevelError::TooLarge { .. }));
        assert!(err.is_structural());

        let huge = format!("{}x{}:", usize::MAX, 2);
        assert!(matches!(
            decode(&token_of(&huge)).unwrap_err(),
            LevelError::TooLarge { .. }
        ));
        assert!(matches!(
            decode(&token_of(&format!("{}x1:", MAX_CELLS + 1))).unwrap_err(),
            LevelError::TooLarge { .. }
        ));
    }

    #[test]
    fn test_long_narrow_levels_round_trip() {
        let wide = vec![vec![1u8; 3000]];
        let level = decode(&encode(&wide, &GameParams::default())).unwrap();
        assert_eq!((level.width, level.height), (3000, 1));
        assert_eq!(level.grid, wide);

        let tall = vec![vec![2u8]; 5000];
        let level = decode(&encode(&tall, &GameParams::default())).unwrap();
        assert_eq!((level.width, level.height), (1, 5000));
        assert_eq!(level.grid, tall);

        assert!(check_dimensions(MAX_CELLS, 1).is_ok());
        assert!(check_dimensions(4096, 4096).is_ok());
        assert!(check_dimensions(0, MAX_CELLS).is_ok());
        assert!(check_dimensions(0, usize::MAX).is_err());
        assert!(decode(&token_of("0x99999999999:")).is_err());
    }

    #[test]
    fn test_params_section() {
        let grid = vec![vec![0, 1]];
        let token = encode(&grid, &GameParams::default());
        assert!(!payload_of(&token).contains('|'));

        let params = GameParams::new(Some(3.0), None, Some(0.2));
        let payload = payload_of(&encode(&grid, &params));
        let (core, block) = payload.split_once('|').unwrap();
        assert_eq!(core, "2x1:.G");
        assert_eq!(
            payload_of(block),
            r#"{"maxEnemies":3,"coinSpawnChance":0.2}"#
        );
    }

    #[test]
    fn test_corrupt_params_do_not_fail_decode() {
        let level = decode(&token_of("2x1:GR|@@@")).unwrap();
        assert_eq!(level.grid, vec![vec![1, 2]]);
        assert!(level.params.is_empty());

        let block = token_of("{\"maxEnemies\":");
        let level = decode(&token_of(&format!("2x1:GR|{block}"))).unwrap();
        assert!(level.params.is_empty());
    }

    #[test]
    fn test_padded_tokens_accepted() {
        assert_eq!(decode("M3gxOi4uLg==").unwrap().grid, vec![vec![0, 0, 0]]);
        assert_eq!(decode("M3gxOi4uLg").unwrap().grid, vec![vec![0, 0, 0]]);
    }
}
