use crate::shared::config::CutoutConfig;
use crate::shared::region::TargetBox;

/// Places the cutout on a surface of the given pixel size.
pub fn target_box(config: &CutoutConfig, surface_width: u32, surface_height: u32) -> TargetBox {
    let sw = surface_width as f64;
    let sh = surface_height as f64;
    TargetBox::new(config.x * sw, config.y * sh, config.w * sw, config.h * sh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_defaults_on_square_surface() {
        let b = target_box(&CutoutConfig::default(), 1000, 1000);
        assert_relative_eq!(b.x, 720.0, epsilon = 1e-9);
        assert_relative_eq!(b.y, 240.0, epsilon = 1e-9);
        assert_relative_eq!(b.width, 230.0, epsilon = 1e-9);
        assert_relative_eq!(b.height, 230.0, epsilon = 1e-9);
    }

    #[rstest]
    #[case(640, 480)]
    #[case(1920, 1080)]
    #[case(1, 1)]
    fn test_scales_linearly_with_surface(#[case] w: u32, #[case] h: u32) {
        let config = CutoutConfig::from_query("x=0.1&y=0.2&w=0.3&h=0.4");
        let single = target_box(&config, w, h);
        let double = target_box(&config, w * 2, h * 2);
        assert_relative_eq!(double.x, single.x * 2.0, epsilon = 1e-9);
        assert_relative_eq!(double.y, single.y * 2.0, epsilon = 1e-9);
        assert_relative_eq!(double.width, single.width * 2.0, epsilon = 1e-9);
        assert_relative_eq!(double.height, single.height * 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_repeated_calls_are_stable() {
        let config = CutoutConfig::default();
        let first = target_box(&config, 800, 600);
        for _ in 0..100 {
            assert_eq!(target_box(&config, 800, 600), first);
        }
    }

    #[test]
    fn test_zero_surface_gives_empty_box() {
        let b = target_box(&CutoutConfig::default(), 0, 0);
        assert!(b.is_empty());
    }
}
