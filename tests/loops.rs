use retained_canvas::loops::{BoundedWhile, MAX_ITERATIONS};
use retained_canvas::prelude::*;

#[test]
fn runaway_while_stops_at_the_bound() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut looped = BoundedWhile::new(0u64, |_: &u64| true, |n: &mut u64| *n += 1);
    assert_eq!(looped.by_ref().count(), MAX_ITERATIONS);
    assert!(looped.hit_bound());
    assert_eq!(looped.into_context(), MAX_ITERATIONS as u64);
}

#[test]
fn for_each_rows_draw_in_order() {
    let rows = for_each(ForRange::new(4.0), |row| {
        rectangle()
            .key(row.index as u64)
            .prop("y", row.index * 10.0)
            .prop("width", 10)
            .prop("height", 10)
            .prop("fill", "blue")
    });
    let mut surface =
        CanvasSurface::render(SurfaceConfig::new().width(10.0).height(40.0), rows).unwrap();
    surface.draw().unwrap();

    for y in [5, 15, 25, 35] {
        assert_eq!(surface.canvas().pixel(5, y), Some(Color::BLUE));
    }
}
