use std::cell::Cell;
use std::rc::Rc;

use resvg::tiny_skia::Transform;
use retained_canvas::prelude::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn surface(description: impl Into<Element>) -> CanvasSurface {
    CanvasSurface::render(SurfaceConfig::new().width(40.0).height(40.0), description).unwrap()
}

fn square(x: i32, size: i32, fill: &str) -> NodeElement {
    rectangle()
        .prop("x", x)
        .prop("y", x)
        .prop("width", size)
        .prop("height", size)
        .prop("fill", fill)
}

#[test]
fn later_siblings_paint_over_earlier_ones() {
    let mut surface = surface(fragment([square(0, 30, "red"), square(10, 30, "blue")]));
    surface.draw().unwrap();

    let canvas = surface.canvas();
    assert_eq!(canvas.pixel(5, 5), Some(Color::RED));
    assert_eq!(canvas.pixel(20, 20), Some(Color::BLUE));
    assert_eq!(canvas.pixel(35, 35), Some(Color::BLUE));
}

#[test]
fn reordering_siblings_changes_paint_order() {
    let mut surface = surface(fragment([
        square(0, 30, "red").key("red"),
        square(10, 30, "blue").key("blue"),
    ]));
    surface.draw().unwrap();
    assert_eq!(surface.canvas().pixel(20, 20), Some(Color::BLUE));

    surface.update(fragment([
        square(10, 30, "blue").key("blue"),
        square(0, 30, "red").key("red"),
    ]));
    surface.draw().unwrap();
    assert_eq!(surface.canvas().pixel(20, 20), Some(Color::RED));
}

#[test]
fn saves_and_restores_balance_over_a_pass() {
    let mut surface = surface(fragment([
        translate(5.0, 5.0).child(rotate(0.5).child(square(0, 4, "red"))),
        scale(2.0, 2.0).restore().child(square(0, 4, "blue")),
        opacity(0.5).child(square(0, 4, "red").restore()),
        rectangle().restore().prop("width", 1).prop("height", 1),
    ]));
    surface.draw().unwrap();

    let canvas = surface.canvas();
    assert_eq!(canvas.save_count(), canvas.restore_count());
    assert_eq!(canvas.save_depth(), 0);
    assert_eq!(canvas.transform(), Transform::identity());
}

#[test]
fn unknown_kinds_are_skipped_by_default() {
    init_logging();
    let scene = || node("Mystery").child(square(0, 40, "red"));

    let mut skipped = surface(scene());
    skipped.draw().unwrap();
    assert_eq!(skipped.canvas().pixel(20, 20), Some(Color::TRANSPARENT));

    let mut drawn = surface(scene()).with_registry(
        RendererRegistry::defaults().with_unknown_kind_policy(UnknownKindPolicy::DrawChildren),
    );
    drawn.draw().unwrap();
    assert_eq!(drawn.canvas().pixel(20, 20), Some(Color::RED));
}

#[test]
fn failing_node_does_not_stop_its_siblings() {
    init_logging();
    let mut surface = surface(fragment([
        square(0, 40, "not a colour").child(square(0, 40, "red")),
        square(20, 20, "blue"),
    ]));
    surface.draw().unwrap();

    let canvas = surface.canvas();
    assert_eq!(canvas.pixel(5, 5), Some(Color::TRANSPARENT));
    assert_eq!(canvas.pixel(30, 30), Some(Color::BLUE));
    assert_eq!(canvas.save_depth(), 0);
}

#[test]
fn custom_renderer_wraps_its_children() {
    let order = Rc::new(Cell::new(0));
    let before = order.clone();
    let after = order.clone();
    let registry = register_renderers([(
        "Frame",
        Renderer::new()
            .before(move |ctx, _| {
                before.set(before.get() + 1);
                ctx.canvas.save();
                ctx.canvas.translate(20.0, 20.0);
                Ok(())
            })
            .after(move |ctx, _| {
                after.set(after.get() * 10);
                ctx.canvas.restore();
                Ok(())
            }),
    )]);

    let mut surface = surface(node("Frame").child(square(0, 10, "blue"))).with_registry(registry);
    surface.draw().unwrap();

    assert_eq!(order.get(), 10);
    assert_eq!(surface.canvas().pixel(25, 25), Some(Color::BLUE));
    assert_eq!(surface.canvas().pixel(5, 5), Some(Color::TRANSPARENT));
}

#[test]
fn zero_font_size_text_draws_nothing_and_siblings_still_paint() {
    let mut surface = surface(fragment([
        text("hi").prop("fontSize", 0).prop("fill", "black"),
        square(20, 20, "red"),
    ]));
    surface.draw().unwrap();

    let canvas = surface.canvas();
    assert_eq!(canvas.pixel(5, 5), Some(Color::TRANSPARENT));
    assert_eq!(canvas.pixel(30, 30), Some(Color::RED));
}
