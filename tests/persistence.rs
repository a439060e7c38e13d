// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

use pointlabel::io::serialization;
use pointlabel::util::geometry::{corners_to_yolo, to_normalized};
use pointlabel::{AnnotationStore, ImageSize, Point};
use serde_json::json;

fn populated_store(size: ImageSize) -> AnnotationStore {
    let mut store = AnnotationStore::new();
    store.add_keypoint_px(123.0, 456.0, size).unwrap();
    store.add_keypoint(0.1, 0.7).unwrap();
    store
        .add_polyline_px(&[(10.0, 10.0), (200.0, 35.0), (117.0, 300.0)], size)
        .unwrap();
    store
        .add_smooth_curve(
            vec![
                Point::new(0.11, 0.21),
                Point::new(0.33, 0.17),
                Point::new(0.52, 0.49),
                Point::new(0.29, 0.61),
            ],
            0.4,
        )
        .unwrap();
    store
        .add_bbox_from_drag((57.0, 81.0), (391.0, 277.0), size)
        .unwrap();
    store
}

#[test]
fn round_trip_preserves_values_and_ids() {
    let size = ImageSize::new(800, 600).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("annotations").join("frame_annotations.json");

    let mut store = populated_store(size);
    // Leave a gap in the keypoint ids.
    store.add_keypoint(0.9, 0.9).unwrap();
    store.remove(pointlabel::AnnotationKind::Keypoint, 2);

    serialization::save(&path, &store, "frame.png").unwrap();
    let loaded = serialization::load(&path, size).unwrap();

    assert_eq!(loaded.image_filename.as_deref(), Some("frame.png"));
    assert_eq!(loaded.migrated, 0);
    assert_eq!(loaded.store.keypoints(), store.keypoints());
    assert_eq!(loaded.store.polylines(), store.polylines());
    assert_eq!(loaded.store.smooth_curves(), store.smooth_curves());
    assert_eq!(loaded.store.bboxes(), store.bboxes());

    let ids: Vec<u32> = loaded.store.keypoints().iter().map(|k| k.id).collect();
    assert_eq!(ids, [1, 3]);

    // New entities continue after the largest loaded id.
    let mut reloaded = loaded.store;
    assert_eq!(reloaded.add_keypoint(0.5, 0.5).unwrap(), 4);
}

#[test]
fn saved_file_uses_current_schema() {
    let size = ImageSize::new(640, 480).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame_annotations.json");
    serialization::save(&path, &populated_store(size), "frame.jpg").unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("{\n  \"image_filename\""));
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    for key in ["keypoints", "curves", "smooth_curves", "bboxes"] {
        assert!(value[key].is_array(), "missing {}", key);
    }
    assert!(value["bboxes"][0].get("x1").is_none());
    assert!(value["curves"][0].get("points").is_none());
    assert_eq!(value["curves"][0]["normalized_points"].as_array().unwrap().len(), 3);
}

#[test]
fn legacy_record_matches_current_record() {
    let size = ImageSize::new(800, 600).unwrap();

    let legacy = json!({
        "image": "frame.png",
        "keypoints": [
            {"id": 1, "x": 123, "y": 456},
            {"id": 2, "x": 799, "y": 1}
        ],
        "curves": [
            {"id": 1, "points": [{"x": 10, "y": 10}, {"x": 200, "y": 35}, {"x": 117, "y": 300}]}
        ],
        "smooth_curves": [
            {"id": 1, "smoothness": 0.4,
             "points": [{"x": 50, "y": 60}, {"x": 300, "y": 90}, {"x": 420, "y": 380}, {"x": 55, "y": 62}]}
        ],
        "bboxes": [
            {"id": 1, "x1": 57, "y1": 81, "x2": 391, "y2": 277}
        ]
    });

    let norm = |x: f64, y: f64| {
        let p = to_normalized(x, y, size);
        json!({"x_norm": p.x_norm, "y_norm": p.y_norm})
    };
    let k1 = to_normalized(123.0, 456.0, size);
    let k2 = to_normalized(799.0, 1.0, size);
    let b = corners_to_yolo(57.0, 81.0, 391.0, 277.0, size);
    let current = json!({
        "image_filename": "frame.png",
        "keypoints": [
            {"id": 1, "x_norm": k1.x_norm, "y_norm": k1.y_norm},
            {"id": 2, "x_norm": k2.x_norm, "y_norm": k2.y_norm}
        ],
        "curves": [
            {"id": 1, "normalized_points": [norm(10.0, 10.0), norm(200.0, 35.0), norm(117.0, 300.0)]}
        ],
        "smooth_curves": [
            {"id": 1, "smoothness": 0.4,
             "normalized_points": [norm(50.0, 60.0), norm(300.0, 90.0), norm(420.0, 380.0), norm(55.0, 62.0)]}
        ],
        "bboxes": [
            {"id": 1, "x_center": b.x_center, "y_center": b.y_center, "width": b.width, "height": b.height}
        ]
    });

    let from_legacy = serialization::decode(&legacy.to_string(), size).unwrap();
    let from_current = serialization::decode(&current.to_string(), size).unwrap();

    assert_eq!(from_legacy.migrated, 5);
    assert_eq!(from_current.migrated, 0);
    assert_eq!(from_legacy.image_filename, from_current.image_filename);
    assert_eq!(from_legacy.store.keypoints(), from_current.store.keypoints());
    assert_eq!(from_legacy.store.polylines(), from_current.store.polylines());
    assert_eq!(from_legacy.store.smooth_curves(), from_current.store.smooth_curves());
    assert_eq!(from_legacy.store.bboxes(), from_current.store.bboxes());
}

#[test]
fn mixed_record_migrates_per_entry() {
    let size = ImageSize::new(800, 600).unwrap();
    let record = json!({
        "keypoints": [
            {"id": 1, "x_norm": 0.5, "y_norm": 0.5},
            {"id": 2, "x": 200, "y": 150}
        ]
    });
    let loaded = serialization::decode(&record.to_string(), size).unwrap();
    assert_eq!(loaded.migrated, 1);
    let kps = loaded.store.keypoints();
    assert_eq!((kps[0].x_norm, kps[0].y_norm), (0.5, 0.5));
    assert_eq!((kps[1].x_norm, kps[1].y_norm), (0.25, 0.25));
}
