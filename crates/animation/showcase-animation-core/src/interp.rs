//! Interpolation helpers shared by timelines and loops.

/// Linear interpolation of scalars. Exact at both endpoints.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

#[inline]
pub fn lerp_vec3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
    ]
}

#[inline]
pub fn lerp_vec4(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    [
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
        lerp_f32(a[3], b[3], t),
    ]
}

/// Normalized position of `x` inside `[start, end]`, clamped to `[0, 1]`.
/// A degenerate interval maps everything at or past `start` to 1.
#[inline]
pub fn inverse_lerp_clamped(start: f32, end: f32, x: f32) -> f32 {
    let span = end - start;
    if span <= 0.0 {
        return if x >= start { 1.0 } else { 0.0 };
    }
    ((x - start) / span).clamp(0.0, 1.0)
}
