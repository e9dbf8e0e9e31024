//! Position quality categories

/// Map an estimated 95% horizontal position accuracy (meters) to a NACp
/// category.
///
/// Non-positive and NaN accuracies, and anything at or beyond 555.6 m
/// (0.3 NM), map to 0 (unknown).
pub fn nacp_from_horizontal_accuracy_m(accuracy_m: f64) -> u8 {
    const STEPS: [(f64, u8); 6] = [
        (3.0, 11),
        (10.0, 10),
        (30.0, 9),
        (92.6, 8),
        (185.2, 7),
        (555.6, 6),
    ];

    if accuracy_m.is_nan() || accuracy_m <= 0.0 {
        return 0;
    }
    STEPS
        .iter()
        .find(|(limit, _)| accuracy_m < *limit)
        .map_or(0, |&(_, nacp)| nacp)
}
