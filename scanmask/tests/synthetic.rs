//! End-to-end masking tests on synthetic casing phantoms

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scanmask::image_proc::density::enhance;
use scanmask::{apply_mask, create_mask, Frame, MaskError, MaskParams, SeedPoint};

const BACKGROUND: u16 = 0;
const CASING: u16 = 50000;
const SPECIMEN: u16 = 20000;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn in_square(r: usize, c: usize, lo: usize, hi: usize) -> bool {
    (lo..hi).contains(&r) && (lo..hi).contains(&c)
}

/// 100x100 slice: bright 80x80 casing around a dark 40x40 specimen
fn create_phantom(noise: Option<u64>) -> Array2<u16> {
    let mut frame = Array2::from_shape_fn((100, 100), |(r, c)| {
        if in_square(r, c, 30, 70) {
            SPECIMEN
        } else if in_square(r, c, 10, 90) {
            CASING
        } else {
            BACKGROUND
        }
    });

    if let Some(seed) = noise {
        let mut rng = StdRng::seed_from_u64(seed);
        for pixel in frame.iter_mut() {
            let jitter: i32 = rng.random_range(-500..=500);
            *pixel = (*pixel as i32 + jitter).clamp(0, 65535) as u16;
        }
    }

    frame
}

fn phantom_params() -> MaskParams {
    let mut params = MaskParams::default();
    params.intensity.low = 0.0;
    params.intensity.high = Some(65535.0);
    params.density.cycles = 1;
    params.density.diff_multiplier = 0.0;
    params.downsample_factor = 1;
    params.clusters.clusters = 2;
    params.clusters.seed = Some(2024);
    params.min_component_size = 100;
    params
}

#[test]
fn test_mask_keeps_only_specimen() {
    init_logging();
    let image = create_phantom(None);
    let mask = create_mask(
        image.view(),
        &Frame::default(),
        SeedPoint::new(50, 50),
        true,
        &phantom_params(),
    )
    .unwrap();

    assert!(mask.iter().all(|&v| v == 0 || v == 1));

    let masked = apply_mask(image.view(), mask.view()).unwrap();
    for ((r, c), &v) in masked.indexed_iter() {
        if in_square(r, c, 30, 70) {
            assert_eq!(v, image[[r, c]], "specimen pixel ({r}, {c}) changed");
        } else {
            assert_eq!(v, 0, "pixel ({r}, {c}) outside the specimen survived");
        }
    }
}

#[test]
fn test_mask_with_sensor_noise() {
    init_logging();
    let image = create_phantom(Some(7));
    let mask = create_mask(
        image.view(),
        &Frame::default(),
        SeedPoint::new(50, 50),
        true,
        &phantom_params(),
    )
    .unwrap();

    let selected = mask.iter().filter(|&&v| v == 1).count();
    assert_eq!(selected, 40 * 40);
    assert_eq!(mask[[30, 30]], 1);
    assert_eq!(mask[[69, 69]], 1);
    assert_eq!(mask[[29, 50]], 0);
}

#[test]
fn test_mask_with_downsampling() {
    init_logging();
    let image = create_phantom(None);
    let mut params = phantom_params();
    params.downsample_factor = 2;
    params.min_component_size = 50;

    let mask = create_mask(
        image.view(),
        &Frame::default(),
        SeedPoint::new(50, 50),
        true,
        &params,
    )
    .unwrap();

    assert_eq!(mask.dim(), image.dim());
    assert_eq!(mask[[50, 50]], 1);
    assert_eq!(mask[[20, 20]], 0);
    assert_eq!(mask[[5, 5]], 0);

    let selected = mask.iter().filter(|&&v| v == 1).count();
    assert!(
        (30 * 30..=46 * 46).contains(&selected),
        "selected {selected} pixels"
    );
}

#[test]
fn test_frame_limits_mask() {
    init_logging();
    let image = create_phantom(None);
    let mask = create_mask(
        image.view(),
        &Frame::uniform(35),
        SeedPoint::new(50, 50),
        true,
        &phantom_params(),
    )
    .unwrap();

    assert_eq!(mask.iter().filter(|&&v| v == 1).count(), 30 * 30);
    assert_eq!(mask[[35, 35]], 1);
    assert_eq!(mask[[34, 50]], 0);
}

#[test]
fn test_seed_on_outline_is_rejected() {
    init_logging();
    let image = create_phantom(None);
    let result = create_mask(
        image.view(),
        &Frame::default(),
        SeedPoint::new(30, 50),
        true,
        &phantom_params(),
    );
    assert_eq!(result, Err(MaskError::SeedOnBarrier { row: 30, col: 50 }));
}

#[test]
fn test_seed_outside_image_is_rejected() {
    init_logging();
    let image = create_phantom(None);
    let result = create_mask(
        image.view(),
        &Frame::default(),
        SeedPoint::new(50, 150),
        true,
        &phantom_params(),
    );
    assert!(matches!(result, Err(MaskError::SeedOutOfBounds { .. })));
}

#[test]
fn test_apply_mask_all_ones_and_all_zeros() {
    let image = create_phantom(Some(3));
    let ones = Array2::from_elem(image.dim(), 1u8);
    let zeros = Array2::<u8>::zeros(image.dim());

    assert_eq!(apply_mask(image.view(), ones.view()).unwrap(), image);
    assert!(apply_mask(image.view(), zeros.view())
        .unwrap()
        .iter()
        .all(|&v| v == 0));
}

#[test]
fn test_density_cycles_stay_in_range_and_keep_order() {
    let mut rng = StdRng::seed_from_u64(99);
    let image = Array2::from_shape_fn((48, 48), |_| rng.random_range(0..=255u8));

    let mut config = phantom_params().density;
    config.cycles = 3;
    config.small_kernel = 3;
    config.large_kernel = 15;
    let out = enhance(image.view(), &config).unwrap();

    // diff_multiplier 0 leaves only monotone renormalization
    let mut pairs: Vec<(u8, u8)> = image.iter().copied().zip(out.iter().copied()).collect();
    pairs.sort();
    assert!(pairs.windows(2).all(|w| w[0].1 <= w[1].1));
    assert_eq!(out.iter().copied().max(), Some(255));
}
