mod common;

use choropleth::draw::geometry::Point;
use choropleth::render::DrawCommand;
use choropleth::{
    BackendError, ChoroplethMap, LodTier, MapEvent, MemoryStore, RegionDatum, RenderBackend, RenderStatus,
    ViewportTransform,
};
use common::{drain, planar_options, recording_map, row_topology, row_topology_at, screen_of};

fn selections(events: &[MapEvent]) -> Vec<Option<String>> {
    events
        .iter()
        .filter_map(|e| match e {
            MapEvent::Select(code) => Some(code.clone()),
            _ => None,
        })
        .collect()
}

fn loaded_map(store: &MemoryStore, data: Vec<RegionDatum>) -> choropleth::ChoroplethMap<choropleth::RecordingBackend> {
    let mut map = recording_map(planar_options());
    let requests = map.render(data, 400, 200);
    map.load_from_store(store, &requests);
    map
}

fn two_square_map() -> choropleth::ChoroplethMap<choropleth::RecordingBackend> {
    let mut store = MemoryStore::new();
    store.insert("90", row_topology(&["900A", "900B"]));
    loaded_map(&store, vec![RegionDatum::new("900A", 10.0), RegionDatum::new("900B", 30.0)])
}

#[test]
fn test_group_total_from_two_fine_regions() {
    let map = two_square_map();

    let aggregation = map.aggregation();
    assert_eq!(aggregation.len(), 1);
    let group = aggregation.get("900").unwrap();
    assert_eq!(group.total_value, 40.0);
    assert_eq!(group.members.len(), 2);
    assert_eq!(map.scene().fine.len(), 2);
    assert_eq!(map.summary().groups, 1);
}

#[test]
fn test_click_selects_but_drag_does_not() {
    let mut map = two_square_map();
    let events = map.subscribe();
    let inside = screen_of(&map, Point::new(0.5, 0.5));

    map.pointer_down(inside);
    map.pointer_move(Point::new(inside.x + 1.0, inside.y));
    map.pointer_up(Point::new(inside.x + 1.0, inside.y), 0.0);
    assert_eq!(selections(&drain(&events)), vec![Some("900".to_string())]);
    assert_eq!(map.interaction().selected_group.as_deref(), Some("900"));

    let mut map = two_square_map();
    let events = map.subscribe();
    let inside = screen_of(&map, Point::new(0.5, 0.5));
    let before = map.transform();

    map.pointer_down(inside);
    map.pointer_move(Point::new(inside.x + 20.0, inside.y));
    map.pointer_up(Point::new(inside.x + 20.0, inside.y), 0.0);
    let received = drain(&events);
    assert!(selections(&received).is_empty());
    assert!(map.interaction().selected_group.is_none());
    // Dragged 1:1
    assert_eq!(map.transform().translate_x, before.translate_x + 20.0);
}

#[test]
fn test_scale_clamps_and_reset_decelerates() {
    let mut map = two_square_map();
    map.set_transform(ViewportTransform::new(0.0, 0.0, 50.0));
    assert_eq!(map.transform().scale, 25.0);

    map.reset_view(1000.0);
    let mut scales = vec![map.transform().scale];
    for step in 1..=10 {
        map.frame(1000.0 + 75.0 * step as f64);
        scales.push(map.transform().scale);
    }

    assert_eq!(*scales.last().unwrap(), 1.0);
    let drops: Vec<f64> = scales.windows(2).map(|w| w[0] - w[1]).collect();
    assert!(drops.iter().all(|&d| d > 0.0), "scale must fall every step: {:?}", scales);
    assert!(drops.windows(2).all(|w| w[1] < w[0]), "steps must shrink: {:?}", drops);
    assert!(!map.viewport().is_animating());
}

#[test]
fn test_missing_subdivision_leaves_others_rendered() {
    let mut store = MemoryStore::new();
    store.insert("41", row_topology(&["41001", "41002"]));
    let mut map = loaded_map(
        &store,
        vec![
            RegionDatum::new("06001", 5.0),
            RegionDatum::new("06002", 7.0),
            RegionDatum::new("41001", 1.0),
            RegionDatum::new("41002", 2.0),
        ],
    );

    let coverage = map.coverage();
    assert_eq!(coverage.missing, vec!["06".to_string()]);
    assert_eq!(coverage.loaded, vec!["41".to_string()]);
    assert!(coverage.pending.is_empty());

    map.frame(0.0);
    let backend = map.backend().unwrap();
    assert_eq!(backend.filled_codes(), vec!["410"]);

    // Zoom into the fine tier around the canvas center
    map.wheel(Point::new(200.0, 100.0), -1000.0);
    assert_eq!(map.lod(), LodTier::Fine);
    map.frame(16.0);
    let codes = map.backend().unwrap().filled_codes();
    assert!(codes.contains(&"41001") && codes.contains(&"41002"));
    assert!(codes.iter().all(|c| !c.starts_with("06")));
}

#[test]
fn test_hover_reports_group_in_overview() {
    let mut map = two_square_map();
    let events = map.subscribe();

    map.pointer_move(screen_of(&map, Point::new(1.5, 0.5)));
    map.pointer_move(screen_of(&map, Point::new(1.6, 0.5)));
    map.pointer_leave();

    assert_eq!(
        drain(&events),
        vec![MapEvent::Hover(Some("900".to_string())), MapEvent::Hover(None)]
    );
}

#[test]
fn test_wheel_keeps_point_under_cursor() {
    let mut map = two_square_map();
    let cursor = Point::new(123.0, 77.0);
    let before = map.transform().invert(cursor);

    map.wheel(cursor, -300.0);
    let after = map.transform().invert(cursor);
    assert!(map.transform().scale > 1.0);
    approx::assert_relative_eq!(before.x, after.x, epsilon = 1e-9);
    approx::assert_relative_eq!(before.y, after.y, epsilon = 1e-9);
}

#[test]
fn test_stale_fetch_after_new_dataset_is_dropped() {
    let mut map = recording_map(planar_options());
    let first = map.render(vec![RegionDatum::new("06001", 1.0)], 400, 200);
    let second = map.render(vec![RegionDatum::new("41001", 1.0)], 400, 200);

    assert!(!map.complete_fetch(&first[0], Ok(Some(row_topology(&["06001"])))));
    assert!(map.complete_fetch(&second[0], Ok(Some(row_topology(&["41001"])))));
    let codes: Vec<&str> = map.scene().fine.tessellations.iter().map(|t| t.code.as_str()).collect();
    assert_eq!(codes, vec!["41001"]);
}

#[test]
fn test_frame_only_when_dirty() {
    let mut map = two_square_map();
    assert!(map.frame(0.0).is_some());
    assert!(map.frame(16.0).is_none());
    assert_eq!(map.backend().unwrap().frame_count(), 1);

    let last = map.backend().unwrap().last_frame();
    assert!(matches!(last.first(), Some(DrawCommand::Begin { width: 400, height: 200, .. })));
    assert!(matches!(last.last(), Some(DrawCommand::End)));
}

#[test]
fn test_backend_unavailable_reported_once() {
    let mut map: ChoroplethMap<choropleth::RecordingBackend> =
        ChoroplethMap::new(planar_options(), || Err(BackendError::Unavailable("no webgl".to_string())));
    let events = map.subscribe();

    assert_eq!(map.status(), &RenderStatus::Failed("rendering backend unavailable: no webgl".to_string()));
    assert!(map.frame(0.0).is_none());
    let received = drain(&events);
    assert_eq!(received.len(), 1);
    assert!(matches!(received[0], MapEvent::StatusChanged(RenderStatus::Failed(_))));

    // Data and input are still tracked without a surface
    let mut store = MemoryStore::new();
    store.insert("90", row_topology(&["900A"]));
    let requests = map.render(vec![RegionDatum::new("900A", 3.0)], 100, 100);
    map.load_from_store(&store, &requests);
    assert_eq!(map.aggregation().len(), 1);
}

/// Fails every frame after the first
#[derive(Default)]
struct FlakyBackend {
    frames: usize,
}

impl RenderBackend for FlakyBackend {
    fn begin_frame(&mut self, _width: u32, _height: u32, _clear: [f32; 4]) -> Result<(), BackendError> {
        self.frames += 1;
        if self.frames > 1 {
            return Err(BackendError::SurfaceLost("context lost".to_string()));
        }
        Ok(())
    }

    fn set_transform(&mut self, _matrix: [f32; 9]) {}

    fn fill_triangles(&mut self, _code: &str, _vertices: &[f32], _color: [f32; 4]) {}

    fn stroke_lines(&mut self, _segments: &[f32], _color: [f32; 4], _width: f32) {}

    fn end_frame(&mut self) -> Result<(), BackendError> {
        Ok(())
    }
}

#[test]
fn test_lost_surface_stops_rendering() {
    let mut map = ChoroplethMap::new(planar_options(), || Ok(FlakyBackend::default()));
    let events = map.subscribe();

    assert!(map.frame(0.0).is_some());
    map.set_transform(ViewportTransform::new(5.0, 0.0, 2.0));
    assert!(map.frame(16.0).is_none());
    assert!(matches!(map.status(), RenderStatus::Failed(_)));

    map.set_transform(ViewportTransform::new(9.0, 0.0, 2.0));
    assert!(map.frame(32.0).is_none());
    let failures = drain(&events)
        .into_iter()
        .filter(|e| matches!(e, MapEvent::StatusChanged(_)))
        .count();
    assert_eq!(failures, 1);
}

#[test]
fn test_every_hit_survives_a_cull_around_it() {
    let map = two_square_map();
    let fine = &map.scene().fine;
    for i in 0..20 {
        for j in 0..10 {
            let p = map.project(Point::new(i as f64 * 0.1 + 0.05, j as f64 * 0.1 + 0.05));
            let Some(hit) = fine.index.hit_test(p, &fine.tessellations) else { continue };
            let around = choropleth::Bounds::new(p.x - 0.5, p.y - 0.5, p.x + 0.5, p.y + 0.5);
            assert!(fine.index.cull(&around).iter().any(|e| e.code == hit.code));
        }
    }
}

fn two_state_data() -> Vec<RegionDatum> {
    vec![
        RegionDatum::new("06001", 5.0),
        RegionDatum::new("06002", 7.0),
        RegionDatum::new("41001", 1.0),
        RegionDatum::new("41002", 2.0),
    ]
}

#[test]
fn test_partial_load_draws_what_arrived() {
    let mut map = recording_map(planar_options());
    let requests = map.render(two_state_data(), 400, 200);
    let oregon = requests.iter().find(|r| r.subdivision == "41").unwrap();
    assert!(map.complete_fetch(oregon, Ok(Some(row_topology(&["41001", "41002"])))));

    assert!(map.frame(0.0).is_some());
    let codes = map.backend().unwrap().filled_codes();
    assert_eq!(codes, vec!["410"]);
    assert!(codes.iter().all(|c| !c.starts_with("06")));

    let coverage = map.coverage();
    assert_eq!(coverage.pending, vec!["06".to_string()]);
    assert_eq!(coverage.loaded, vec!["41".to_string()]);
    assert!(coverage.missing.is_empty());
}

#[test]
fn test_late_subdivision_keeps_zoomed_view_in_place() {
    let mut map = recording_map(planar_options());
    let requests = map.render(two_state_data(), 400, 200);
    let oregon = requests.iter().find(|r| r.subdivision == "41").unwrap();
    let california = requests.iter().find(|r| r.subdivision == "06").unwrap();
    map.complete_fetch(oregon, Ok(Some(row_topology(&["41001", "41002"]))));

    map.wheel(Point::new(200.0, 100.0), -300.0);
    let anchor = Point::new(0.25, 0.75);
    let before = screen_of(&map, anchor);
    let events = map.subscribe();

    map.complete_fetch(california, Ok(Some(row_topology_at(&["06001", "06002"], 10.0))));
    let after = screen_of(&map, anchor);
    approx::assert_abs_diff_eq!(before.x, after.x, epsilon = 1e-6);
    approx::assert_abs_diff_eq!(before.y, after.y, epsilon = 1e-6);
    assert!(drain(&events).iter().any(|e| matches!(e, MapEvent::TransformChanged(_))));
}

#[test]
fn test_late_subdivision_at_overview_shows_everything() {
    let mut map = recording_map(planar_options());
    let requests = map.render(two_state_data(), 400, 200);
    let oregon = requests.iter().find(|r| r.subdivision == "41").unwrap();
    let california = requests.iter().find(|r| r.subdivision == "06").unwrap();
    map.complete_fetch(oregon, Ok(Some(row_topology(&["41001", "41002"]))));
    map.complete_fetch(california, Ok(Some(row_topology_at(&["06001", "06002"], 10.0))));

    assert_eq!(map.transform(), map.viewport().home());
    for corner in [Point::new(0.0, 0.0), Point::new(12.0, 1.0)] {
        let p = screen_of(&map, corner);
        assert!((0.0..=400.0).contains(&p.x) && (0.0..=200.0).contains(&p.y), "{:?} off screen", p);
    }
}

#[test]
fn test_jitter_below_click_threshold_keeps_view() {
    let mut map = two_square_map();
    let inside = screen_of(&map, Point::new(0.5, 0.5));
    let before = map.transform();
    let events = map.subscribe();

    map.pointer_down(inside);
    map.pointer_move(Point::new(inside.x + 2.0, inside.y));
    map.pointer_move(Point::new(inside.x + 1.0, inside.y));
    assert_eq!(map.transform(), before);
    map.pointer_up(Point::new(inside.x + 1.0, inside.y), 0.0);

    let received = drain(&events);
    assert!(!received.iter().any(|e| matches!(e, MapEvent::TransformChanged(_))));
    assert_eq!(selections(&received), vec![Some("900".to_string())]);
}

#[test]
fn test_huge_wheel_delta_stops_at_max_scale() {
    let mut map = two_square_map();
    map.wheel(Point::new(10.0, 10.0), -1e6);
    assert_eq!(map.transform().scale, 25.0);
    assert!(map.transform().translate_x.is_finite() && map.transform().translate_y.is_finite());

    map.wheel(Point::new(10.0, 10.0), 1e6);
    assert_eq!(map.transform().scale, 1.0);
}
