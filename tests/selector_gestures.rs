use egui::{Key, Modifiers, Rect, pos2, vec2};
use roi_profiler::{
    DisplaySurface, Extent, PointerEvent, PointerLocation, RenderPrimitive, ShapeKind, ShapeStyle,
    ShapeSelector, SurfaceHandle, geometry::render_shape,
};

/// Surface with an identity data-to-pixel mapping, so event coordinates can
/// be written once.
fn identity_surface() -> SurfaceHandle {
    let bounds = Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 100.0));
    DisplaySurface::new(bounds, bounds, 100.0).into_handle()
}

fn press(surface: &SurfaceHandle, x: f32, y: f32, modifiers: Modifiers) -> PointerEvent {
    PointerEvent::Press {
        location: PointerLocation::from_data(&surface.read(), pos2(x, y)),
        modifiers,
    }
}

fn drag(surface: &SurfaceHandle, x: f32, y: f32, modifiers: Modifiers) -> PointerEvent {
    PointerEvent::Move {
        location: PointerLocation::from_data(&surface.read(), pos2(x, y)),
        modifiers,
    }
}

fn release(surface: &SurfaceHandle, x: f32, y: f32) -> PointerEvent {
    PointerEvent::Release {
        location: PointerLocation::from_data(&surface.read(), pos2(x, y)),
        modifiers: Modifiers::NONE,
    }
}

fn line_selector(surface: &SurfaceHandle, x: [f32; 2], y: [f32; 2]) -> ShapeSelector {
    ShapeSelector::new(
        ShapeKind::Line,
        surface.clone(),
        ShapeStyle::default(),
        Some(x),
        Some(y),
    )
}

#[test]
fn dragging_on_empty_surface_draws_new_line() {
    let surface = identity_surface();
    let mut selector = ShapeSelector::new(
        ShapeKind::Line,
        surface.clone(),
        ShapeStyle::default(),
        None,
        None,
    );
    assert!(!selector.is_visible());

    selector.handle_event(&press(&surface, 10.0, 10.0, Modifiers::NONE));
    assert!(selector.is_visible());
    selector.handle_event(&drag(&surface, 30.0, 20.0, Modifiers::NONE));
    let result = selector
        .handle_event(&release(&surface, 30.0, 20.0))
        .expect("drag should finish with a selection");

    assert_eq!(selector.x(), [10.0, 30.0]);
    assert_eq!(selector.y(), [10.0, 20.0]);
    assert_eq!(result.start.data, pos2(10.0, 10.0));
    assert_eq!(result.end.data, pos2(30.0, 20.0));
}

#[test]
fn square_modifier_equalizes_pixel_extent() {
    let surface = identity_surface();
    let mut selector = ShapeSelector::new(
        ShapeKind::Rectangle,
        surface.clone(),
        ShapeStyle::default(),
        None,
        None,
    );

    selector.handle_event(&press(&surface, 10.0, 10.0, Modifiers::SHIFT));
    selector.handle_event(&drag(&surface, 30.0, 20.0, Modifiers::SHIFT));

    // Pixel deltas are 20 x 10, so dy is stretched to match dx.
    let x = selector.x();
    let y = selector.y();
    assert!((x[0] - 10.0).abs() < 1e-3 && (x[1] - 30.0).abs() < 1e-3);
    assert!((y[0] - 10.0).abs() < 1e-3 && (y[1] - 30.0).abs() < 1e-3);
}

#[test]
fn square_modifier_with_zero_horizontal_delta_is_a_no_op() {
    let surface = identity_surface();
    let mut selector = ShapeSelector::new(
        ShapeKind::Rectangle,
        surface.clone(),
        ShapeStyle::default(),
        None,
        None,
    );

    selector.handle_event(&press(&surface, 10.0, 10.0, Modifiers::SHIFT));
    selector.handle_event(&drag(&surface, 10.0, 30.0, Modifiers::SHIFT));

    assert_eq!(selector.extent(), Extent::ZERO);
}

#[test]
fn center_modifier_grows_shape_around_press_point() {
    let surface = identity_surface();
    let mut selector = ShapeSelector::new(
        ShapeKind::Rectangle,
        surface.clone(),
        ShapeStyle::default(),
        None,
        None,
    );

    selector.handle_event(&press(&surface, 10.0, 10.0, Modifiers::CTRL));
    selector.handle_event(&drag(&surface, 30.0, 20.0, Modifiers::CTRL));

    assert_eq!(selector.x(), [-10.0, 30.0]);
    assert_eq!(selector.y(), [0.0, 20.0]);
}

#[test]
fn dragging_end_handle_moves_only_second_point() {
    let surface = identity_surface();
    let mut selector = line_selector(&surface, [10.0, 50.0], [10.0, 30.0]);

    selector.handle_event(&press(&surface, 50.0, 30.0, Modifiers::NONE));
    selector.handle_event(&drag(&surface, 40.0, 40.0, Modifiers::NONE));

    assert_eq!(selector.x(), [10.0, 40.0]);
    assert_eq!(selector.y(), [10.0, 40.0]);
}

#[test]
fn dragging_initial_handle_pins_the_end_point() {
    let surface = identity_surface();
    let mut selector = line_selector(&surface, [10.0, 50.0], [10.0, 30.0]);

    selector.handle_event(&press(&surface, 10.0, 10.0, Modifiers::NONE));
    selector.handle_event(&drag(&surface, 0.0, 0.0, Modifiers::NONE));

    // The defining points are exchanged so the dragged one comes second.
    assert_eq!(selector.x(), [50.0, 0.0]);
    assert_eq!(selector.y(), [30.0, 0.0]);
}

#[test]
fn center_handle_translates_whole_shape() {
    let surface = identity_surface();
    let mut selector = line_selector(&surface, [10.0, 50.0], [10.0, 30.0]);

    // Center is at (30, 20); anywhere within twice the handle radius works.
    selector.handle_event(&press(&surface, 32.0, 21.0, Modifiers::NONE));
    selector.handle_event(&drag(&surface, 42.0, 26.0, Modifiers::NONE));

    assert_eq!(selector.x(), [20.0, 60.0]);
    assert_eq!(selector.y(), [15.0, 35.0]);
}

#[test]
fn move_modifier_translates_from_anywhere() {
    let surface = identity_surface();
    let mut selector = line_selector(&surface, [10.0, 50.0], [10.0, 30.0]);

    selector.handle_event(&press(&surface, 70.0, 70.0, Modifiers::ALT));
    selector.handle_event(&drag(&surface, 80.0, 75.0, Modifiers::ALT));

    assert_eq!(selector.x(), [20.0, 60.0]);
    assert_eq!(selector.y(), [15.0, 35.0]);
}

#[test]
fn press_far_from_any_handle_starts_a_new_shape() {
    let surface = identity_surface();
    let mut selector = line_selector(&surface, [10.0, 50.0], [10.0, 30.0]);

    selector.handle_event(&press(&surface, 80.0, 80.0, Modifiers::NONE));
    selector.handle_event(&drag(&surface, 90.0, 90.0, Modifiers::NONE));

    assert_eq!(selector.x(), [80.0, 90.0]);
    assert_eq!(selector.y(), [80.0, 90.0]);
}

#[test]
fn ellipsoid_initial_handle_drag_translates_the_shape() {
    let surface = identity_surface();
    let mut selector = ShapeSelector::new(
        ShapeKind::Ellipsoid,
        surface.clone(),
        ShapeStyle::default(),
        Some([20.0, 60.0]),
        Some([20.0, 50.0]),
    );

    // The first point is the ellipse center; dragging it must not resize.
    selector.handle_event(&press(&surface, 20.0, 20.0, Modifiers::NONE));
    selector.handle_event(&drag(&surface, 22.0, 23.0, Modifiers::NONE));

    assert_eq!(selector.x(), [22.0, 62.0]);
    assert_eq!(selector.y(), [23.0, 53.0]);
}

#[test]
fn escape_hides_the_shape() {
    let surface = identity_surface();
    let mut selector = line_selector(&surface, [10.0, 30.0], [10.0, 20.0]);
    assert!(selector.is_visible());

    selector.handle_event(&PointerEvent::Key {
        key: Key::Escape,
        pressed: true,
        modifiers: Modifiers::NONE,
    });
    assert!(!selector.is_visible());
}

#[test]
fn inactive_selector_ignores_input() {
    let surface = identity_surface();
    let mut selector = line_selector(&surface, [10.0, 30.0], [10.0, 20.0]);
    selector.set_active(false);

    selector.handle_event(&press(&surface, 30.0, 20.0, Modifiers::NONE));
    selector.handle_event(&drag(&surface, 50.0, 50.0, Modifiers::NONE));
    let result = selector.handle_event(&release(&surface, 50.0, 50.0));

    assert!(result.is_none());
    assert_eq!(selector.x(), [10.0, 30.0]);
    assert_eq!(selector.y(), [10.0, 20.0]);
}

#[test]
fn rectangle_is_normalized_and_clipped_to_the_surface() {
    let surface = identity_surface();
    let extent = Extent::new(30.0, 10.0, 120.0, 20.0);
    let primitive = render_shape(ShapeKind::Rectangle, extent, &surface.read());

    let RenderPrimitive::Rect(rect) = primitive else {
        panic!("rectangle must render as a rect");
    };
    assert_eq!(rect.min, pos2(10.0, 20.0));
    assert_eq!(rect.max, pos2(30.0, 100.0));
}

#[test]
fn circle_radius_is_measured_in_inch_space() {
    // Non-square mapping: x is stretched 2x relative to y on screen.
    let data = Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 100.0));
    let pixels = Rect::from_min_max(pos2(0.0, 0.0), pos2(200.0, 100.0));
    let surface = DisplaySurface::new(pixels, data, 100.0).into_handle();

    let horizontal = render_shape(
        ShapeKind::Circle,
        Extent::new(50.0, 60.0, 50.0, 50.0),
        &surface.read(),
    );
    let vertical = render_shape(
        ShapeKind::Circle,
        Extent::new(50.0, 50.0, 50.0, 60.0),
        &surface.read(),
    );
    let (RenderPrimitive::Circle { radius: rh, .. }, RenderPrimitive::Circle { radius: rv, .. }) =
        (horizontal, vertical)
    else {
        panic!("circles must render as circles");
    };
    // Equal data distances give different screen radii; the circle follows
    // the screen, staying round.
    assert!((rh - 0.2).abs() < 1e-6);
    assert!((rv - 0.1).abs() < 1e-6);
}

#[test]
fn disposing_removes_the_overlay() {
    let surface = identity_surface();
    let mut selector = line_selector(&surface, [10.0, 30.0], [10.0, 20.0]);
    assert_eq!(surface.read().shape_count(), 1);

    selector.dispose();
    assert_eq!(surface.read().shape_count(), 0);
}

#[test]
fn ellipse_renders_center_first() {
    let surface = identity_surface();
    let primitive = render_shape(
        ShapeKind::Ellipsoid,
        Extent::new(20.0, 30.0, 20.0, 25.0),
        &surface.read(),
    );
    let RenderPrimitive::Ellipse { center, radius } = primitive else {
        panic!("ellipsoid must render as an ellipse");
    };
    assert_eq!(center, pos2(20.0, 20.0));
    assert_eq!(radius, vec2(10.0, 5.0));
}
