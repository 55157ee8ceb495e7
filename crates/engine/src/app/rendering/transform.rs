use crate::app::Vec2;

/// Values this close to an integer pixel are treated as that pixel before
/// truncation, so `world_to_screen(screen_to_world(p)) == p` survives f32 noise.
const SUBPIXEL_SNAP_PX: f64 = 1e-3;

/// Maps a physics-space point (Y up) to a screen pixel (Y down, origin top-left).
///
/// `scroll` is the world point shown at the bottom-left corner of the
/// viewport. Pixel coordinates truncate toward zero.
pub fn world_to_screen(world: Vec2, scroll: Vec2, zoom: f32, viewport_height: u32) -> (i32, i32) {
    let zoom = f64::from(zoom);
    let x = (f64::from(world.x) - f64::from(scroll.x)) * zoom;
    let y = f64::from(viewport_height) - (f64::from(world.y) - f64::from(scroll.y)) * zoom;
    (truncate_px(x), truncate_px(y))
}

/// Inverse of [`world_to_screen`]; the result is not rounded.
pub fn screen_to_world(screen: (i32, i32), scroll: Vec2, zoom: f32, viewport_height: u32) -> Vec2 {
    let zoom = f64::from(zoom);
    let x = f64::from(scroll.x) + f64::from(screen.0) / zoom;
    let y = f64::from(scroll.y) + (f64::from(viewport_height) - f64::from(screen.1)) / zoom;
    Vec2::new(x as f32, y as f32)
}

fn truncate_px(value: f64) -> i32 {
    let nearest = value.round();
    let snapped = if (value - nearest).abs() < SUBPIXEL_SNAP_PX {
        nearest
    } else {
        value.trunc()
    };
    snapped as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT_HEIGHT: u32 = 480;

    #[test]
    fn world_origin_maps_to_bottom_left_at_zero_scroll() {
        let (x, y) = world_to_screen(Vec2::ZERO, Vec2::ZERO, 1.0, VIEWPORT_HEIGHT);
        assert_eq!((x, y), (0, 480));
    }

    #[test]
    fn y_axis_is_inverted() {
        let low = world_to_screen(Vec2::new(0.0, 10.0), Vec2::ZERO, 1.0, VIEWPORT_HEIGHT);
        let high = world_to_screen(Vec2::new(0.0, 100.0), Vec2::ZERO, 1.0, VIEWPORT_HEIGHT);
        assert_eq!(low.1, 470);
        assert_eq!(high.1, 380);
        assert!(high.1 < low.1);
    }

    #[test]
    fn scroll_and_zoom_shift_and_scale_the_mapping() {
        let scroll = Vec2::new(100.0, 20.0);
        let (x, y) = world_to_screen(Vec2::new(150.0, 70.0), scroll, 2.0, VIEWPORT_HEIGHT);
        assert_eq!(x, 100);
        assert_eq!(y, 380);
    }

    #[test]
    fn fractional_pixels_truncate_toward_zero() {
        let (x, _) = world_to_screen(Vec2::new(10.7, 0.0), Vec2::ZERO, 1.0, VIEWPORT_HEIGHT);
        assert_eq!(x, 10);

        let (x, _) = world_to_screen(Vec2::new(-3.7, 0.0), Vec2::ZERO, 1.0, VIEWPORT_HEIGHT);
        assert_eq!(x, -3);

        let (_, y) = world_to_screen(Vec2::new(0.0, 0.4), Vec2::ZERO, 1.0, VIEWPORT_HEIGHT);
        assert_eq!(y, 479);
    }

    #[test]
    fn screen_to_world_is_not_rounded() {
        let world = screen_to_world((3, 480), Vec2::ZERO, 2.0, VIEWPORT_HEIGHT);
        assert_eq!(world, Vec2::new(1.5, 0.0));

        let world = screen_to_world((0, 0), Vec2::new(10.0, 5.0), 4.0, VIEWPORT_HEIGHT);
        assert_eq!(world, Vec2::new(10.0, 125.0));
    }

    #[test]
    fn integer_screen_points_round_trip() {
        let scrolls = [
            Vec2::ZERO,
            Vec2::new(12.3, 45.6),
            Vec2::new(1400.0, 0.0),
            Vec2::new(333.33, 7.77),
        ];
        let zooms = [0.5_f32, 1.0, 1.5, 2.75, 3.0];

        for scroll in scrolls {
            for zoom in zooms {
                for sx in (-20..=620).step_by(7) {
                    for sy in (-20..=500).step_by(11) {
                        let world = screen_to_world((sx, sy), scroll, zoom, VIEWPORT_HEIGHT);
                        let back = world_to_screen(world, scroll, zoom, VIEWPORT_HEIGHT);
                        assert_eq!(
                            back,
                            (sx, sy),
                            "round trip failed for {:?} at scroll {:?} zoom {}",
                            (sx, sy),
                            scroll,
                            zoom
                        );
                    }
                }
            }
        }
    }
}
