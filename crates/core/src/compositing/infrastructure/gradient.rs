use tiny_skia::{Color, GradientStop, Point, RadialGradient, Shader, SpreadMode, Transform};

/// Black at the given opacity.
pub(crate) fn black(alpha: f32) -> Color {
    Color::from_rgba(0.0, 0.0, 0.0, alpha.clamp(0.0, 1.0)).unwrap_or(Color::BLACK)
}

/// Concentric two-circle radial gradient: `inner_color` up to
/// `inner_radius`, blending to `outer_color` at `outer_radius`, padded
/// beyond both.
///
/// Expressed as a single-circle gradient of `outer_radius` whose first stop
/// sits at `inner_radius / outer_radius`.
pub(crate) fn concentric(
    center: (f64, f64),
    inner_radius: f64,
    outer_radius: f64,
    inner_color: Color,
    outer_color: Color,
) -> Shader<'static> {
    if !(outer_radius > 0.0 && outer_radius.is_finite()) || inner_radius >= outer_radius {
        return Shader::SolidColor(outer_color);
    }

    let first_stop = (inner_radius / outer_radius).clamp(0.0, 1.0) as f32;
    let c = Point::from_xy(center.0 as f32, center.1 as f32);
    RadialGradient::new(
        c,
        c,
        outer_radius as f32,
        vec![
            GradientStop::new(first_stop, inner_color),
            GradientStop::new(1.0, outer_color),
        ],
        SpreadMode::Pad,
        Transform::identity(),
    )
    .unwrap_or(Shader::SolidColor(outer_color))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_black_alpha() {
        let c = black(0.35);
        assert_eq!((c.red(), c.green(), c.blue()), (0.0, 0.0, 0.0));
        assert!((c.alpha() - 0.35).abs() < 1e-6);
    }

    #[test]
    fn test_black_alpha_clamped() {
        assert_eq!(black(2.0).alpha(), 1.0);
        assert_eq!(black(-1.0).alpha(), 0.0);
    }

    #[test]
    fn test_degenerate_radii_fall_back_to_solid() {
        let outer = black(0.15);
        let s = concentric((0.0, 0.0), 10.0, 0.0, black(0.6), outer);
        assert!(matches!(s, Shader::SolidColor(c) if c == outer));

        let s = concentric((0.0, 0.0), 20.0, 10.0, black(0.6), outer);
        assert!(matches!(s, Shader::SolidColor(_)));
    }

    #[test]
    fn test_valid_radii_produce_gradient() {
        let s = concentric((50.0, 50.0), 10.0, 40.0, black(0.6), black(0.15));
        assert!(!matches!(s, Shader::SolidColor(_)));
    }
}
