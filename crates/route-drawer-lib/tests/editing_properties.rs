//! End-to-end editing properties checked through the public editor API

use route_drawer_lib::geomath::{self, Coordinate};
use route_drawer_lib::waypoint::distance_from_start_km;
use route_drawer_lib::{Located, NewWaypoint, RouteEditor};

fn assert_consistent(editor: &RouteEditor) {
    let route = editor.route();
    let expected = geomath::polyline_length(route.points());
    assert!(
        (route.distance() - expected).abs() < 1e-6,
        "route distance {} != polyline length {}",
        route.distance(),
        expected
    );

    for w in editor.waypoints() {
        if route.len() >= 2 {
            assert!(w.is_attached(), "waypoint {} left detached", w.id());
        }
        let fresh = distance_from_start_km(w.coordinate(), w.nearest_point_index, route.points());
        assert!(
            (w.distance_from_start - fresh).abs() < 1e-9,
            "waypoint {} distance {} != fresh {}",
            w.id(),
            w.distance_from_start,
            fresh
        );
    }
}

#[test]
fn distances_stay_consistent_over_mixed_edits() {
    let mut editor = RouteEditor::default();
    let mut ids = Vec::new();

    for i in 0..8 {
        let lat = 35.60 + i as f64 * 0.01;
        let lng = 139.60 + (i % 3) as f64 * 0.01;
        ids.push(editor.add_point(Coordinate::new(lat, lng)));
        assert_consistent(&editor);
        if i == 1 {
            editor.place_waypoint(Coordinate::new(35.605, 139.61), NewWaypoint::new("Early", Coordinate::default()));
            assert_consistent(&editor);
        }
    }

    editor.add_waypoint(NewWaypoint::new("Late", Coordinate::new(35.67, 139.61)).anchored_at(6));
    assert_consistent(&editor);

    editor.insert_point(2, Coordinate::new(35.62, 139.70));
    assert_consistent(&editor);

    editor.insert_point_on_line(Coordinate::new(35.645, 139.615));
    assert_consistent(&editor);

    editor.move_point(ids[4], Coordinate::new(35.64, 139.55));
    assert_consistent(&editor);

    editor.delete_point(ids[0]);
    assert_consistent(&editor);

    editor.delete_points([ids[5], ids[6]]);
    assert_consistent(&editor);

    editor.begin_point_drag(ids[3]);
    for step in 0..5 {
        editor.drag_to(Coordinate::new(35.63, 139.62 + step as f64 * 0.002));
        assert_consistent(&editor);
    }
    editor.end_drag();
    assert_consistent(&editor);

    while editor.undo() {
        assert_consistent(&editor);
    }
    while editor.redo() {
        assert_consistent(&editor);
    }
}

#[test]
fn undo_redo_inverse_law() {
    let mut editor = RouteEditor::default();
    let commits = 6;
    for i in 0..commits {
        editor.add_point(Coordinate::new(10.0 + i as f64 * 0.1, 20.0));
    }
    let final_state = editor.state().clone();

    for _ in 0..commits {
        assert!(editor.can_undo());
        assert!(editor.undo());
    }
    assert!(!editor.can_undo());
    assert!(editor.route().is_empty());
    assert!(editor.waypoints().is_empty());

    for _ in 0..commits {
        assert!(editor.can_redo());
        assert!(editor.redo());
    }
    assert!(!editor.can_redo());
    assert_eq!(editor.state(), &final_state);
}

#[test]
fn new_edit_after_undo_discards_redo() {
    let mut editor = RouteEditor::default();
    editor.add_point(Coordinate::new(0.0, 0.0));
    editor.add_point(Coordinate::new(0.0, 1.0));
    editor.undo();
    assert!(editor.can_redo());

    editor.add_point(Coordinate::new(5.0, 5.0));
    assert!(!editor.can_redo());
    assert!(!editor.redo());
    assert_eq!(editor.route().points()[1].lat, 5.0);
}

#[test]
fn click_insertion_between_collinear_points() {
    let mut editor = RouteEditor::default();
    for lng in [0.0, 1.0, 2.0] {
        editor.add_point(Coordinate::new(0.0, lng));
    }

    assert_eq!(editor.route().find_closest_segment_index(Coordinate::new(0.0, 0.5)), 1);
    assert_eq!(editor.route().find_closest_segment_index(Coordinate::new(0.0, 1.5)), 2);

    let id = editor.insert_point_on_line(Coordinate::new(0.0, 1.5));
    assert_eq!(editor.route().index_of(id), Some(2));
}

#[test]
fn waypoint_at_route_end_measures_full_length() {
    let mut editor = RouteEditor::default();
    editor.add_point(Coordinate::new(35.6762, 139.6503));
    editor.add_point(Coordinate::new(35.6595, 139.7005));
    editor.add_point(Coordinate::new(35.6311, 139.7394));
    editor.add_waypoint(NewWaypoint::new("Finish", Coordinate::new(35.6311, 139.7394)).anchored_at(2));

    let d = editor.waypoints()[0].distance_from_start;
    assert!((d - 9.63).abs() < 0.1, "expected ~9.63 km, got {}", d);
}

#[test]
fn drag_produces_single_undo_step() {
    let mut editor = RouteEditor::default();
    editor.add_point(Coordinate::new(0.0, 0.0));
    let id = editor.add_point(Coordinate::new(0.0, 1.0));
    let entries = editor.history().len();

    editor.begin_point_drag(id);
    for i in 1..=30 {
        editor.drag_to(Coordinate::new(i as f64 * 0.01, 1.0));
    }
    assert!(editor.end_drag());
    assert!(!editor.end_drag());
    assert_eq!(editor.history().len(), entries + 1);

    editor.undo();
    assert_eq!(editor.route().points()[1].lat, 0.0);
    editor.redo();
    assert!((editor.route().points()[1].lat - 0.3).abs() < 1e-9);
}

#[test]
fn clear_cannot_be_undone() {
    let mut editor = RouteEditor::default();
    editor.add_point(Coordinate::new(0.0, 0.0));
    editor.add_point(Coordinate::new(0.0, 1.0));
    editor.clear_route();

    assert!(!editor.undo());
    assert!(!editor.redo());
    assert!(editor.route().is_empty());
}
