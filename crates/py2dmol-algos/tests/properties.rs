use py2dmol_algos::{
    best_view, center, kabsch, rmsd, superpose, svd3, AlignError, AlignmentSubset, Rotation3,
    TrajectoryAligner,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::{FRAC_PI_2, PI};

fn random_cloud(rng: &mut StdRng, n: usize, spread: [f64; 3]) -> Vec<[f64; 3]> {
    (0..n)
        .map(|_| {
            [
                rng.random_range(-1.0..1.0) * spread[0],
                rng.random_range(-1.0..1.0) * spread[1],
                rng.random_range(-1.0..1.0) * spread[2],
            ]
        })
        .collect()
}

fn random_rotation(rng: &mut StdRng, max_angle: f64) -> Rotation3 {
    let axis = [
        rng.random_range(-1.0..1.0),
        rng.random_range(-1.0..1.0),
        rng.random_range(-1.0..1.0),
    ];
    Rotation3::from_axis_angle(axis, rng.random_range(0.0..max_angle))
}

fn shifted(points: &[[f64; 3]], shift: [f64; 3]) -> Vec<[f64; 3]> {
    points
        .iter()
        .map(|p| [p[0] + shift[0], p[1] + shift[1], p[2] + shift[2]])
        .collect()
}

fn det(m: &[[f64; 3]; 3]) -> f64 {
    Rotation3::from_rows(*m).determinant()
}

fn product(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    Rotation3::from_rows(*a).then(&Rotation3::from_rows(*b)).m
}

#[test]
fn rotation_is_always_orthonormal_and_proper() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for &n in &[2usize, 5, 50, 500] {
        for _ in 0..250 {
            let (a, _) = center(&random_cloud(&mut rng, n, [10.0, 10.0, 10.0]));
            let (b, _) = center(&random_cloud(&mut rng, n, [10.0, 10.0, 10.0]));
            let r = kabsch(&a, &b).unwrap();
            assert!(
                r.orthonormality_error() < 1e-9,
                "N={n}: |RᵀR − I| = {}",
                r.orthonormality_error()
            );
            assert!(
                (r.determinant() - 1.0).abs() < 1e-9,
                "N={n}: det(R) = {}",
                r.determinant()
            );
        }
    }
}

#[test]
fn known_rotation_is_recovered() {
    let mut rng = StdRng::seed_from_u64(7);
    let r0 = Rotation3::from_axis_angle([0.0, 0.0, 1.0], FRAC_PI_2);
    let (a, _) = center(&random_cloud(&mut rng, 20, [5.0, 3.0, 2.0]));
    let b = r0.apply_all(&a);

    let r = kabsch(&a, &b).unwrap();
    assert!(r.max_abs_diff(&r0) < 1e-6, "recovered {:?}", r.m);
    assert!(rmsd(&r.apply_all(&a), &b).unwrap() < 1e-6);
}

#[test]
fn flipped_planar_triangle_gives_proper_rotation() {
    let triangle = [[1.0, 0.0, 0.0], [-0.5, 0.8, 0.0], [-0.5, -0.8, 0.0]];
    let (a, _) = center(&triangle);
    let b: Vec<[f64; 3]> = a.iter().map(|p| [-p[0], p[1], p[2]]).collect();

    let r = kabsch(&a, &b).unwrap();
    assert!((r.determinant() - 1.0).abs() < 1e-9, "det(R) = {}", r.determinant());
    // In-plane mirror is reachable by a half turn out of the plane
    assert!(rmsd(&r.apply_all(&a), &b).unwrap() < 1e-9);
}

#[test]
fn mirrored_cloud_never_yields_reflection() {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..50 {
        let (a, _) = center(&random_cloud(&mut rng, 12, [4.0, 3.0, 2.0]));
        let b: Vec<[f64; 3]> = a.iter().map(|p| [p[0], -p[1], p[2]]).collect();

        let mut h = [[0.0f64; 3]; 3];
        for (p, q) in a.iter().zip(b.iter()) {
            for j in 0..3 {
                for k in 0..3 {
                    h[j][k] += p[j] * q[k];
                }
            }
        }
        let svd = svd3(&h);
        assert!(det(&product(&svd.u, &svd.vt)) < 0.0);

        let r = kabsch(&a, &b).unwrap();
        assert!((r.determinant() - 1.0).abs() < 1e-9);
    }
}

#[test]
fn best_view_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(2024);
    let base = random_cloud(&mut rng, 60, [6.0, 3.0, 1.0]);
    let input = shifted(&random_rotation(&mut rng, PI).apply_all(&base), [12.0, -4.0, 30.0]);

    let once = best_view(&input).unwrap();
    let twice = best_view(&once.coords).unwrap();

    assert!(
        twice.rotation.max_abs_diff(&Rotation3::identity()) < 1e-8,
        "second pass rotation {:?}",
        twice.rotation.m
    );
    assert!(rmsd(&once.coords, &twice.coords).unwrap() < 1e-8);
}

#[test]
fn trajectory_jitter_is_removed() {
    let mut rng = StdRng::seed_from_u64(31337);
    let f0 = random_cloud(&mut rng, 40, [8.0, 5.0, 3.0]);
    let aligner = TrajectoryAligner::new(f0.clone()).unwrap();

    for _ in 0..25 {
        let jitter = random_rotation(&mut rng, 0.2);
        let shift = [
            rng.random_range(-2.0..2.0),
            rng.random_range(-2.0..2.0),
            rng.random_range(-2.0..2.0),
        ];
        let frame = shifted(&jitter.apply_all(&f0), shift);
        let aligned = aligner.align(&frame).unwrap();
        let deviation = rmsd(&aligned, &f0).unwrap();
        assert!(deviation < 1e-5, "RMSD to reference {deviation}");
    }
}

#[test]
fn shape_mismatch_is_reported() {
    let a = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    let b = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
    assert_eq!(kabsch(&a, &b), Err(AlignError::ShapeMismatch(3, 4)));
    assert!(matches!(superpose(&a, &b), Err(AlignError::ShapeMismatch(3, 4))));
}

#[test]
fn empty_and_single_point_give_identity() {
    assert_eq!(kabsch(&[], &[]).unwrap(), Rotation3::identity());
    assert_eq!(kabsch(&[[0.0; 3]], &[[0.0; 3]]).unwrap(), Rotation3::identity());
}

#[test]
fn subset_alignment_moves_every_point_rigidly() {
    let mut rng = StdRng::seed_from_u64(8);
    let reference = random_cloud(&mut rng, 10, [5.0, 5.0, 5.0]);
    let spin = random_rotation(&mut rng, PI);
    let mut frame = shifted(&spin.apply_all(&reference), [3.0, 1.0, -6.0]);
    // Disturb everything outside the subset so a full fit would differ
    for &i in &[1usize, 3, 5, 6, 7, 8, 9] {
        frame[i][0] += rng.random_range(-2.0..2.0);
        frame[i][2] += rng.random_range(-2.0..2.0);
    }

    let subset_idx = [0usize, 2, 4];
    let aligner =
        TrajectoryAligner::with_subset(reference.clone(), AlignmentSubset::from_indices(&subset_idx)).unwrap();
    let result = aligner.align_with_result(&frame).unwrap();
    assert_eq!(result.aligned.len(), 10);

    // Subset lands on the reference subset
    let ref_sub: Vec<[f64; 3]> = subset_idx.iter().map(|&i| reference[i]).collect();
    let out_sub: Vec<[f64; 3]> = subset_idx.iter().map(|&i| result.aligned[i]).collect();
    assert!(rmsd(&out_sub, &ref_sub).unwrap() < 1e-9);
    assert!(result.rmsd < 1e-9);

    // Same rotation as a direct fit on the subset alone
    let frame_sub: Vec<[f64; 3]> = subset_idx.iter().map(|&i| frame[i]).collect();
    let direct = superpose(&frame_sub, &ref_sub).unwrap();
    assert!(direct.rotation.max_abs_diff(&result.rotation) < 1e-9);

    // Every point, inside or outside the subset, follows p · R + t
    for (p, out) in frame.iter().zip(result.aligned.iter()) {
        let q = result.rotation.apply(*p);
        for k in 0..3 {
            let expected = q[k] + [result.translation.x, result.translation.y, result.translation.z][k];
            assert!((expected - out[k]).abs() < 1e-9);
        }
    }
}

#[test]
fn independent_aligners_run_concurrently() {
    let mut rng = StdRng::seed_from_u64(5);
    let jobs: Vec<(Vec<[f64; 3]>, Vec<Vec<[f64; 3]>>)> = (0..4)
        .map(|_| {
            let reference = random_cloud(&mut rng, 25, [6.0, 4.0, 2.0]);
            let frames = (0..10)
                .map(|_| random_rotation(&mut rng, PI).apply_all(&reference))
                .collect();
            (reference, frames)
        })
        .collect();

    std::thread::scope(|scope| {
        for (reference, frames) in &jobs {
            scope.spawn(move || {
                let aligner = TrajectoryAligner::new(reference.clone()).unwrap();
                for frame in frames {
                    let aligned = aligner.align(frame).unwrap();
                    assert!(rmsd(&aligned, reference).unwrap() < 1e-8);
                }
            });
        }
    });
}
