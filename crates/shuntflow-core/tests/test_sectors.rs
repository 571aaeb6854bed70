use approx::assert_relative_eq;

use shuntflow_core::consts::RRT_SENTINEL;
use shuntflow_core::sectors::{
    sector_angle, sector_index, summarize, summarize_bin, SectorAccumulator, SectorBin,
};

#[test]
fn test_sector_index_quadrants() {
    assert_eq!(sector_index(1.0, 0.0, 0.0, 0.0, 36), Some(0));
    assert_eq!(sector_index(0.0, 1.0, 0.0, 0.0, 36), Some(9));
    assert_eq!(sector_index(-1.0, 0.0, 0.0, 0.0, 36), Some(18));
    assert_eq!(sector_index(0.0, -1.0, 0.0, 0.0, 36), Some(27));
    assert_eq!(sector_index(1.0, -0.001, 0.0, 0.0, 36), Some(35));
    assert_eq!(sector_index(5.0, 5.0, 0.0, 0.0, 4), Some(0));
}

#[test]
fn test_sector_index_drops_non_finite() {
    assert_eq!(sector_index(f64::NAN, 0.0, 0.0, 0.0, 36), None);
    assert_eq!(sector_index(1.0, 0.0, 0.0, 0.0, 0), None);
}

#[test]
fn test_accumulator_length_is_sector_count() {
    for n in [1, 7, 36, 360] {
        let acc = SectorAccumulator::new(n);
        assert_eq!(acc.bins().len(), n);
        assert_eq!(acc.sector_count(), n);
    }
    assert_eq!(SectorAccumulator::new(0).sector_count(), 1);
}

#[test]
fn test_out_of_range_record_is_dropped() {
    let mut acc = SectorAccumulator::new(4);
    assert!(!acc.record(4, 10.0, 1.0, 0));
    assert!(acc.record(3, 10.0, 1.0, 0));
    assert_eq!(acc.total_count(), 1);
    assert_eq!(acc.bins().len(), 4);
}

#[test]
fn test_merge_keeps_first_max_frame() {
    let mut acc = SectorAccumulator::new(2);
    acc.record(0, 50.0, 1.0, 3);
    let mut partial = vec![SectorBin::default(); 2];
    partial[0].record(50.0, -1.0, 9);
    partial[1].record(20.0, -1.0, 9);
    acc.merge(&partial);

    let bin = acc.bin(0).unwrap();
    assert_eq!(bin.count, 2);
    assert_eq!(bin.max_frame, 3);
    assert_relative_eq!(bin.sum_signed_wss, 0.0);
    assert_eq!(acc.bin(1).unwrap().max_frame, 9);
}

#[test]
fn test_empty_bins_report_angle_only() {
    let results = summarize(&SectorAccumulator::new(36));
    assert_eq!(results.len(), 36);
    for (i, r) in results.iter().enumerate() {
        assert_relative_eq!(r.angle, i as f64 * 10.0);
        assert_eq!(r.tawss, 0.0);
        assert_eq!(r.osi, 0.0);
        assert_eq!(r.rrt, 0.0);
        assert_eq!(r.max_wss, 0.0);
        assert_eq!(r.max_frame, 0);
    }
    assert_relative_eq!(sector_angle(3, 8), 135.0);
}

#[test]
fn test_osi_and_rrt_bounds() {
    let mut acc = SectorAccumulator::new(8);
    let samples = [
        (0, 30.0, 1.0),
        (0, 10.0, -1.0),
        (1, 90.0, -1.0),
        (2, 40.0, 1.0),
        (2, 40.0, -1.0),
        (3, 0.004, 1.0),
        (4, 0.5, 1.0),
        (4, 0.4, -1.0),
    ];
    for (i, (sector, stress, dir)) in samples.iter().enumerate() {
        acc.record(*sector, *stress, *dir, i as u64);
    }

    for r in summarize(&acc) {
        assert!((0.0..=0.5).contains(&r.osi), "osi {} out of range", r.osi);
        assert!(r.rrt >= 0.0);
        let den = (1.0 - 2.0 * r.osi) * r.tawss;
        if r.tawss > 0.0 {
            assert_eq!(r.rrt == RRT_SENTINEL, den <= 0.01, "sector {}", r.angle);
        }
    }

    let r0 = summarize_bin(0.0, acc.bin(0).unwrap());
    assert_relative_eq!(r0.tawss, 20.0);
    assert_relative_eq!(r0.osi, 0.25);
    assert_relative_eq!(r0.rrt, 0.1, epsilon = 1e-12);
    assert_eq!(r0.max_frame, 0);

    let r2 = summarize_bin(90.0, acc.bin(2).unwrap());
    assert_relative_eq!(r2.osi, 0.5);
    assert_eq!(r2.rrt, RRT_SENTINEL);

    let r3 = summarize_bin(135.0, acc.bin(3).unwrap());
    assert_eq!(r3.osi, 0.0);
    assert_eq!(r3.rrt, RRT_SENTINEL);
}
